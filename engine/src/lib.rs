#[macro_use]
extern crate log;

pub mod api;
pub use self::api::Api;

mod error;
pub use self::error::*;

pub mod pagination;
