use crate as engine;
use engine::{
    pagination::{JokeListing, ListRequest},
    ErrorCode,
};
use jokebox_rs_models::{Joke, JokeId};
use jokebox_rs_storage::{self as storage, JokeStore};
use rand::seq::SliceRandom;
use std::{collections::HashMap, sync::Arc};
use tokio::task;

pub struct Api {
    jokes: Arc<dyn JokeStore>,
}

impl Api {
    pub fn new(jokes: Arc<dyn JokeStore>) -> Api {
        Api { jokes }
    }

    pub async fn add_joke(&self, text: Option<String>) -> engine::Result<Joke> {
        let text = validate_joke_text(text)?;
        self.with_store("Unable to save joke.", move |jokes| jokes.create(&text))
            .await
    }

    pub async fn get_joke(&self, joke_id: JokeId) -> engine::Result<Option<Joke>> {
        self.with_store("Unable to load joke.", move |jokes| jokes.find_by_id(joke_id))
            .await
    }

    pub async fn get_random_joke(&self) -> engine::Result<Joke> {
        let mut all = self
            .with_store("Unable to shuffle jokes.", |jokes| jokes.find_all())
            .await?;
        all.shuffle(&mut rand::thread_rng());
        all.into_iter()
            .next()
            .ok_or_else(|| engine::Error::new(ErrorCode::CollectionEmpty, None))
    }

    pub async fn list_jokes(&self, query: &HashMap<String, String>) -> engine::Result<JokeListing> {
        let request = ListRequest::from_query(query)?;
        let page_query = request.page_query();
        let jokes = self
            .with_store("Unable to load jokes.", move |jokes| {
                jokes.find_page(page_query)
            })
            .await?;
        Ok(request.into_listing(jokes))
    }

    pub async fn update_joke(&self, joke_id: JokeId, text: Option<String>) -> engine::Result<Joke> {
        let text = validate_joke_text(text)?;
        let updated = self
            .with_store("Unable to update joke.", move |jokes| {
                match jokes.find_by_id(joke_id)? {
                    Some(mut joke) => {
                        joke.joke = text;
                        jokes.update(&joke).map(Some)
                    }
                    None => Ok(None),
                }
            })
            .await?;
        updated.ok_or_else(|| engine::Error::joke_not_found(joke_id))
    }

    pub async fn delete_joke(&self, joke_id: JokeId) -> engine::Result<()> {
        let deleted = self
            .with_store("Unable to delete joke.", move |jokes| {
                match jokes.find_by_id(joke_id)? {
                    Some(joke) => jokes.delete(&joke).map(|_| true),
                    None => Ok(false),
                }
            })
            .await?;
        if deleted {
            Ok(())
        } else {
            Err(engine::Error::joke_not_found(joke_id))
        }
    }

    /// Runs a blocking store call on the blocking pool.
    /// `failure_message` names the operation if the store call fails.
    async fn with_store<T, F>(&self, failure_message: &str, op: F) -> engine::Result<T>
    where
        F: FnOnce(&dyn JokeStore) -> storage::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let jokes = Arc::clone(&self.jokes);
        match task::spawn_blocking(move || op(jokes.as_ref())).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if let storage::Error::Missing(_) = e {
                    info!("Joke vanished during operation: {}", e);
                } else {
                    error!("{} {}", failure_message, e);
                }
                Err(engine::Error::from_storage(e, failure_message))
            }
            Err(e) => {
                error!("Storage task failed: {}", e);
                Err(engine::Error::with_message(
                    ErrorCode::TaskFailed,
                    failure_message.to_owned(),
                    Some(e.into()),
                ))
            }
        }
    }
}

fn validate_joke_text(text: Option<String>) -> engine::Result<String> {
    match text {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(engine::Error::new(ErrorCode::JokeTextMissing, None)),
    }
}
