use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Row id assigned by the store. Always positive once persisted.
pub type JokeId = i64;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Joke {
    pub id: JokeId,
    pub joke: String,
}

impl Joke {
    pub fn new(id: JokeId, joke: String) -> Joke {
        Joke { id, joke }
    }
}

impl TryFrom<&Row<'_>> for Joke {
    type Error = String;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        let id: JokeId = row
            .get("id")
            .map_err(|e| format!("Failed to read column 'id': {}", e))?;
        if id < 1 {
            return Err(format!("Non-positive joke id {}", id));
        }

        let joke: Option<String> = row
            .get("joke")
            .map_err(|e| format!("Failed to read column 'joke': {}", e))?;
        match joke {
            Some(joke) => Ok(Joke { id, joke }),
            None => Err(format!("Missing field 'joke' for id {}", id)),
        }
    }
}
