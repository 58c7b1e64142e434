use super::schemas;
use crate::engine;

use engine::ErrorCategory;
use jokebox_rs_models::JokeId;
use std::collections::HashMap;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{reject, reply, Rejection, Reply};

pub async fn add_joke(
    api: Arc<engine::Api>,
    body: schemas::JokeRequest,
) -> Result<impl Reply, Rejection> {
    info!("Handling: add_joke");

    match api.add_joke(body.joke).await {
        Ok(joke) => Ok(reply::with_status(reply::json(&joke), StatusCode::OK)),
        Err(e) => Err(reject::custom(EngineError::new(e))),
    }
}

pub async fn delete_joke(joke_id: JokeId, api: Arc<engine::Api>) -> Result<impl Reply, Rejection> {
    info!("Handling: delete_joke");

    match api.delete_joke(joke_id).await {
        Ok(_) => Ok(reply::with_status(reply::reply(), StatusCode::OK)),
        Err(e) => Err(reject::custom(EngineError::new(e))),
    }
}

pub async fn get_joke(joke_id: JokeId, api: Arc<engine::Api>) -> Result<impl Reply, Rejection> {
    info!("Handling: get_joke");

    match api.get_joke(joke_id).await {
        Ok(Some(joke)) => Ok(reply::with_status(reply::json(&joke), StatusCode::OK)),
        Ok(None) => Err(reject::custom(EngineError::new(
            engine::Error::joke_not_found(joke_id),
        ))),
        Err(e) => Err(reject::custom(EngineError::new(e))),
    }
}

pub async fn get_random_joke(api: Arc<engine::Api>) -> Result<impl Reply, Rejection> {
    info!("Handling: get_random_joke");

    match api.get_random_joke().await {
        Ok(joke) => Ok(reply::with_status(reply::json(&joke), StatusCode::OK)),
        Err(e) => Err(reject::custom(EngineError::new(e))),
    }
}

pub async fn list_jokes(
    query: HashMap<String, String>,
    api: Arc<engine::Api>,
) -> Result<impl Reply, Rejection> {
    info!("Handling: list_jokes");

    match api.list_jokes(&query).await {
        Ok(listing) => Ok(reply::with_status(reply::json(&listing), StatusCode::OK)),
        Err(e) => Err(reject::custom(EngineError::new(e))),
    }
}

pub async fn update_joke(
    joke_id: JokeId,
    api: Arc<engine::Api>,
    body: schemas::JokeRequest,
) -> Result<impl Reply, Rejection> {
    info!("Handling: update_joke");

    match api.update_joke(joke_id, body.joke).await {
        Ok(joke) => Ok(reply::with_status(reply::json(&joke), StatusCode::OK)),
        Err(e) => Err(reject::custom(EngineError::new(e))),
    }
}

fn get_http_code(error: &engine::Error) -> StatusCode {
    match error.classify() {
        ErrorCategory::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Not-found errors render with an empty body, everything else as an
/// `ErrorResponse`.
pub async fn handle_engine_error(err: Rejection) -> Result<reply::Response, Rejection> {
    if let Some(e) = err.find::<EngineError>() {
        if e.status_code == StatusCode::NOT_FOUND {
            debug!("Rendering not found: {}", e.error);
            Ok(reply::with_status(reply::reply(), e.status_code).into_response())
        } else {
            let json = reply::json(&schemas::ErrorResponse {
                error_message: e.error.message.clone(),
            });
            Ok(reply::with_status(json, e.status_code).into_response())
        }
    } else {
        Err(err)
    }
}

#[derive(Debug)]
struct EngineError {
    pub error: engine::Error,
    pub status_code: StatusCode,
}

impl EngineError {
    fn new(error: engine::Error) -> EngineError {
        let status_code = get_http_code(&error);
        EngineError { error, status_code }
    }
}

impl reject::Reject for EngineError {}
