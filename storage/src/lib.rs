#[macro_use]
extern crate log;

mod joke_store;
pub use self::joke_store::{JokeStore, PageQuery};

pub mod sqlite;

mod error;
pub use error::Error;
pub use error::Result;
