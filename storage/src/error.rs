use jokebox_rs_models::JokeId;
use std::error;
use std::fmt::{self, Display};
use std::result;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    InvalidData(String),
    Lock(String),
    Missing(JokeId),
    Sqlite(rusqlite::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidData(ref e) => write!(f, "invalid persisted joke data: {}", e),
            Error::Lock(ref e) => Display::fmt(e, f),
            Error::Missing(id) => write!(f, "joke {} no longer exists", id),
            Error::Sqlite(ref e) => Display::fmt(e, f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::InvalidData(_) => None,
            Error::Lock(_) => None,
            Error::Missing(_) => None,
            Error::Sqlite(ref e) => Some(e),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        Error::Sqlite(value)
    }
}
