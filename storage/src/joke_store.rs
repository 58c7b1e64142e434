use crate as storage;
use jokebox_rs_models::{Joke, JokeId};

/// Window over the jokes table, always ordered by ascending id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub limit: u32,
    pub offset: u64,
}

/// Persistence gateway over the jokes table.
///
/// Calls are blocking; async callers are expected to run them on a blocking pool.
pub trait JokeStore: Send + Sync {
    /// Inserts a new joke and returns it with its store-assigned id.
    fn create(&self, text: &str) -> storage::Result<Joke>;

    /// Absence is `Ok(None)`, never an error.
    fn find_by_id(&self, id: JokeId) -> storage::Result<Option<Joke>>;

    /// Every joke, in no guaranteed order.
    fn find_all(&self) -> storage::Result<Vec<Joke>>;

    /// Up to `query.limit` jokes starting at `query.offset`, ascending by id.
    fn find_page(&self, query: PageQuery) -> storage::Result<Vec<Joke>>;

    /// Persists the text of an existing joke.
    /// Returns `Err(Missing)` if the row is gone.
    fn update(&self, joke: &Joke) -> storage::Result<Joke>;

    /// Returns `Err(Missing)` if the row is gone.
    fn delete(&self, joke: &Joke) -> storage::Result<()>;
}
