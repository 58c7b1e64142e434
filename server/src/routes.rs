use super::engine_handlers;
use super::health_handlers;
use super::logging;
use super::page_handlers;
use super::schemas;
use crate::engine;

use http::StatusCode;
use jokebox_rs_models::JokeId;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

pub fn build_routes(
    api: Arc<engine::Api>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let index = warp::path::end()
        .and(warp::get())
        .and_then(page_handlers::index);

    let ping = warp::path!("ping")
        .and(warp::get())
        .and_then(health_handlers::ping);

    let version = warp::path!("version")
        .and(warp::get())
        .and_then(health_handlers::version);

    let add_joke = warp::path!("joke")
        .and(warp::post())
        .and(with_engine_api(Arc::clone(&api)))
        .and(with_json_from_body::<schemas::JokeRequest>())
        .and_then(engine_handlers::add_joke);

    let get_random_joke = warp::path!("joke" / "random")
        .and(warp::get())
        .and(with_engine_api(Arc::clone(&api)))
        .and_then(engine_handlers::get_random_joke);

    let get_joke = warp::path!("joke" / JokeId)
        .and(warp::get())
        .and(with_engine_api(Arc::clone(&api)))
        .and_then(engine_handlers::get_joke);

    let update_joke = warp::path!("joke" / JokeId)
        .and(warp::put())
        .and(with_engine_api(Arc::clone(&api)))
        .and(with_json_from_body::<schemas::JokeRequest>())
        .and_then(engine_handlers::update_joke);

    let delete_joke = warp::path!("joke" / JokeId)
        .and(warp::delete())
        .and(with_engine_api(Arc::clone(&api)))
        .and_then(engine_handlers::delete_joke);

    let list_jokes = warp::path!("jokes")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_engine_api(Arc::clone(&api)))
        .and_then(engine_handlers::list_jokes);

    index
        .or(ping)
        .or(version)
        .or(add_joke)
        .or(get_random_joke)
        .or(get_joke)
        .or(update_joke)
        .or(delete_joke)
        .or(list_jokes)
        .recover(engine_handlers::handle_engine_error)
        .recover(handle_invalid_body)
        .recover(handle_not_found)
        .recover(handle_method_not_allowed)
        .recover(unhandled)
        .with(logging::log_incoming_request())
}

fn with_engine_api(
    api: Arc<engine::Api>,
) -> impl Filter<Extract = (Arc<engine::Api>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&api))
}

/// Content-Type is not checked; any body that parses as `T` is accepted.
fn with_json_from_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: Send + serde::de::DeserializeOwned,
{
    warp::body::bytes().and_then(|body: Bytes| async move {
        serde_json::from_slice::<T>(&body)
            .map_err(|e| warp::reject::custom(InvalidBody(e.to_string())))
    })
}

#[derive(Debug)]
struct InvalidBody(String);

impl warp::reject::Reject for InvalidBody {}

async fn handle_invalid_body(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(InvalidBody(e)) = err.find::<InvalidBody>() {
        debug!("Rejecting request body: {}", e);
        let json = warp::reply::json(&schemas::ErrorResponse {
            error_message: "Request body must be a JSON object with a string \"joke\" field."
                .to_owned(),
        });
        Ok(warp::reply::with_status(json, StatusCode::BAD_REQUEST))
    } else {
        Err(err)
    }
}

async fn handle_method_not_allowed(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(_) = err.find::<warp::reject::MethodNotAllowed>() {
        Ok(warp::reply::with_status(
            warp::reply::reply(),
            StatusCode::METHOD_NOT_ALLOWED,
        ))
    } else {
        Err(err)
    }
}

async fn handle_not_found(err: Rejection) -> Result<impl Reply, Rejection> {
    if err.is_not_found() {
        Ok(warp::reply::with_status(
            warp::reply::reply(),
            StatusCode::NOT_FOUND,
        ))
    } else {
        Err(err)
    }
}

async fn unhandled(err: Rejection) -> Result<impl Reply, Infallible> {
    error!("Unhandled rejection {:?}", err);
    Ok(warp::reply::with_status(
        warp::reply::reply(),
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jokebox_rs_models::Joke;
    use jokebox_rs_storage::{self as storage, sqlite::SqliteJokeStore, JokeStore, PageQuery};
    use serde_json::{json, Value};
    use warp::http::Response;

    fn logging_init() {
        if std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var("RUST_LOG", "info");
        }
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn test_api() -> Arc<engine::Api> {
        let store = SqliteJokeStore::open_in_memory().unwrap();
        Arc::new(engine::Api::new(Arc::new(store)))
    }

    struct BrokenStore;

    impl JokeStore for BrokenStore {
        fn create(&self, _text: &str) -> storage::Result<Joke> {
            Err(storage::Error::Lock("broken".to_owned()))
        }
        fn find_by_id(&self, _id: JokeId) -> storage::Result<Option<Joke>> {
            Err(storage::Error::Lock("broken".to_owned()))
        }
        fn find_all(&self) -> storage::Result<Vec<Joke>> {
            Err(storage::Error::Lock("broken".to_owned()))
        }
        fn find_page(&self, _query: PageQuery) -> storage::Result<Vec<Joke>> {
            Err(storage::Error::Lock("broken".to_owned()))
        }
        fn update(&self, _joke: &Joke) -> storage::Result<Joke> {
            Err(storage::Error::Lock("broken".to_owned()))
        }
        fn delete(&self, _joke: &Joke) -> storage::Result<()> {
            Err(storage::Error::Lock("broken".to_owned()))
        }
    }

    fn body_json(resp: &Response<Bytes>) -> Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    async fn add(api: &Arc<engine::Api>, text: &str) -> Value {
        let resp = warp::test::request()
            .method("POST")
            .path("/joke")
            .json(&json!({ "joke": text }))
            .reply(&build_routes(Arc::clone(api)))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(&resp)
    }

    #[tokio::test]
    async fn add_then_get_round_trips() {
        logging_init();
        let api = test_api();

        let added = add(&api, "Why did the chicken cross the road?").await;
        assert_eq!(added["joke"], "Why did the chicken cross the road?");

        let resp = warp::test::request()
            .path(&format!("/joke/{}", added["id"]))
            .reply(&build_routes(Arc::clone(&api)))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(&resp), added);
    }

    #[tokio::test]
    async fn add_with_missing_text_is_bad_request() {
        logging_init();
        let api = test_api();
        let routes = build_routes(Arc::clone(&api));

        for body in vec![json!({}), json!({ "joke": "" }), json!({ "joke": null })] {
            let resp = warp::test::request()
                .method("POST")
                .path("/joke")
                .json(&body)
                .reply(&routes)
                .await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(&resp)["error_message"], "Missing joke text.");
        }

        let resp = warp::test::request()
            .path("/jokes?limit=10")
            .reply(&routes)
            .await;
        assert_eq!(body_json(&resp), json!([]));
    }

    #[tokio::test]
    async fn add_with_malformed_body_is_bad_request() {
        logging_init();
        let routes = build_routes(test_api());

        let resp = warp::test::request()
            .method("POST")
            .path("/joke")
            .body("not json")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = warp::test::request()
            .method("POST")
            .path("/joke")
            .json(&json!({ "joke": 5 }))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn body_is_parsed_whatever_the_content_type() {
        logging_init();
        let api = test_api();
        let routes = build_routes(Arc::clone(&api));

        let resp = warp::test::request()
            .method("POST")
            .path("/joke")
            .header("content-type", "text/plain")
            .body(r#"{"joke":"plain"}"#)
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(&resp), json!({ "id": 1, "joke": "plain" }));

        let resp = warp::test::request()
            .method("POST")
            .path("/joke")
            .header("content-type", "text/plain")
            .body("joke=x")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&resp)["error_message"],
            "Request body must be a JSON object with a string \"joke\" field."
        );
    }

    #[tokio::test]
    async fn update_with_form_body_is_bad_request_not_method_not_allowed() {
        logging_init();
        let api = test_api();
        let routes = build_routes(Arc::clone(&api));
        add(&api, "draft").await;

        let resp = warp::test::request()
            .method("PUT")
            .path("/joke/1")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("joke=x")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = warp::test::request()
            .method("PUT")
            .path("/joke/1")
            .header("content-type", "text/plain")
            .body("")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = warp::test::request().path("/joke/1").reply(&routes).await;
        assert_eq!(body_json(&resp), json!({ "id": 1, "joke": "draft" }));
    }

    #[tokio::test]
    async fn storage_failure_is_internal_error_with_message() {
        logging_init();
        let api = Arc::new(engine::Api::new(Arc::new(BrokenStore)));
        let routes = build_routes(api);

        let resp = warp::test::request()
            .path("/joke/random")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(&resp),
            json!({ "error_message": "Unable to shuffle jokes." })
        );

        let resp = warp::test::request()
            .path("/jokes?limit=1")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&resp)["error_message"], "Unable to load jokes.");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_with_empty_body() {
        logging_init();
        let routes = build_routes(test_api());

        let get = warp::test::request()
            .path("/joke/42")
            .reply(&routes)
            .await;
        let put = warp::test::request()
            .method("PUT")
            .path("/joke/42")
            .json(&json!({ "joke": "new" }))
            .reply(&routes)
            .await;
        let delete = warp::test::request()
            .method("DELETE")
            .path("/joke/42")
            .reply(&routes)
            .await;

        for resp in &[get, put, delete] {
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            assert!(resp.body().is_empty());
        }
    }

    #[tokio::test]
    async fn update_then_delete() {
        logging_init();
        let api = test_api();
        let routes = build_routes(Arc::clone(&api));
        add(&api, "draft").await;

        let resp = warp::test::request()
            .method("PUT")
            .path("/joke/1")
            .json(&json!({ "joke": "final" }))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(&resp), json!({ "id": 1, "joke": "final" }));

        let resp = warp::test::request()
            .method("PUT")
            .path("/joke/1")
            .json(&json!({}))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = warp::test::request()
            .method("DELETE")
            .path("/joke/1")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.body().is_empty());

        let resp = warp::test::request().path("/joke/1").reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_supports_both_query_contracts() {
        logging_init();
        let api = test_api();
        let routes = build_routes(Arc::clone(&api));
        for text in &["one", "two", "three", "four", "five"] {
            add(&api, text).await;
        }

        let resp = warp::test::request()
            .path("/jokes?limit=2&offset=1")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(&resp),
            json!([{ "id": 2, "joke": "two" }, { "id": 3, "joke": "three" }])
        );

        let resp = warp::test::request()
            .path("/jokes?page=2&itemsPerPage=2")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(&resp),
            json!({
                "meta": { "page": 2, "itemsPerPage": 2, "total": 2 },
                "jokes": [{ "id": 3, "joke": "three" }, { "id": 4, "joke": "four" }]
            })
        );
    }

    #[tokio::test]
    async fn list_with_invalid_query_is_bad_request() {
        logging_init();
        let routes = build_routes(test_api());

        let resp = warp::test::request().path("/jokes").reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&resp)["error_message"],
            "Missing or invalid \"limit\" query parameter."
        );

        let resp = warp::test::request()
            .path("/jokes?page=0&itemsPerPage=0")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&resp)["error_message"],
            "Missing or invalid \"page\" query parameter.\n\
             Missing or invalid \"itemsPerPage\" query parameter."
        );
    }

    #[tokio::test]
    async fn random_joke() {
        logging_init();
        let api = test_api();
        let routes = build_routes(Arc::clone(&api));

        let resp = warp::test::request()
            .path("/joke/random")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        add(&api, "only one").await;
        let resp = warp::test::request()
            .path("/joke/random")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(&resp), json!({ "id": 1, "joke": "only one" }));
    }

    #[tokio::test]
    async fn unknown_routes_and_methods() {
        logging_init();
        let routes = build_routes(test_api());

        let resp = warp::test::request()
            .path("/joke/not-a-number")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = warp::test::request()
            .method("DELETE")
            .path("/jokes")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn index_and_health() {
        logging_init();
        let routes = build_routes(test_api());

        let resp = warp::test::request().path("/").reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page = std::str::from_utf8(resp.body()).unwrap();
        assert!(page.contains("Jokebox"));
        assert!(page.contains(r#"{"error_message": "..."}"#));

        let resp = warp::test::request().path("/ping").reply(&routes).await;
        assert_eq!(body_json(&resp), json!("pong"));
    }
}
