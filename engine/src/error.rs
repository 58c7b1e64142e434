use jokebox_rs_models::JokeId;
use jokebox_rs_storage as storage;
use std::error;
use std::fmt::{self, Display};
use std::result;
use tokio::task::JoinError;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub source: Option<ErrorSource>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    CollectionEmpty,
    JokeNotFound,
    JokeTextMissing,
    PaginationInvalid,
    StorageGeneric,
    TaskFailed,
}

impl Error {
    pub fn new(code: ErrorCode, source: Option<ErrorSource>) -> Error {
        let message = match code {
            ErrorCode::CollectionEmpty => "There are no jokes yet.",
            ErrorCode::JokeNotFound => "Joke not found.",
            ErrorCode::JokeTextMissing => "Missing joke text.",
            ErrorCode::PaginationInvalid => "Invalid pagination query parameters.",
            ErrorCode::StorageGeneric => "Storage operation failed.",
            ErrorCode::TaskFailed => "Storage task did not complete.",
        };
        Error::with_message(code, message.to_owned(), source)
    }

    pub fn with_message(code: ErrorCode, message: String, source: Option<ErrorSource>) -> Error {
        Error {
            code,
            message,
            source,
        }
    }

    pub fn joke_not_found(id: JokeId) -> Error {
        Error::with_message(
            ErrorCode::JokeNotFound,
            format!("Joke {} not found.", id),
            None,
        )
    }

    /// Wraps a storage failure with a message naming the operation that failed.
    /// A row that vanished mid-operation is reported as not found.
    pub fn from_storage(e: storage::Error, message: &str) -> Error {
        match e {
            storage::Error::Missing(id) => Error::with_message(
                ErrorCode::JokeNotFound,
                format!("Joke {} not found.", id),
                Some(e.into()),
            ),
            _ => Error::with_message(
                ErrorCode::StorageGeneric,
                message.to_owned(),
                Some(e.into()),
            ),
        }
    }

    pub fn classify(&self) -> ErrorCategory {
        match self.code {
            ErrorCode::JokeTextMissing | ErrorCode::PaginationInvalid => ErrorCategory::BadRequest,
            ErrorCode::CollectionEmpty | ErrorCode::JokeNotFound => ErrorCategory::NotFound,
            ErrorCode::StorageGeneric | ErrorCode::TaskFailed => ErrorCategory::Internal,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format!(
            "code={:?}, message={}, source={:?}",
            self.code, self.message, self.source
        ))
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.source {
            Some(ref e) => Some(e),
            None => None,
        }
    }
}

impl From<storage::Error> for Error {
    fn from(e: storage::Error) -> Self {
        Error::from_storage(e, "Storage operation failed.")
    }
}

#[derive(Debug)]
pub enum ErrorSource {
    Storage(storage::Error),
    Task(JoinError),
}

impl Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorSource::Storage(ref e) => Display::fmt(e, f),
            ErrorSource::Task(ref e) => Display::fmt(e, f),
        }
    }
}

impl error::Error for ErrorSource {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ErrorSource::Storage(e) => Some(e),
            ErrorSource::Task(e) => Some(e),
        }
    }
}

impl From<storage::Error> for ErrorSource {
    fn from(e: storage::Error) -> Self {
        ErrorSource::Storage(e)
    }
}

impl From<JoinError> for ErrorSource {
    fn from(e: JoinError) -> Self {
        ErrorSource::Task(e)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    BadRequest,
    NotFound,
    Internal,
}
