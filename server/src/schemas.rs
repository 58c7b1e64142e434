use serde::{Deserialize, Serialize};

// ###################
// # Request schemas #
// ###################

/// Body of add and update requests. A missing or null `joke` is left for
/// the engine to reject.
#[derive(Deserialize)]
pub struct JokeRequest {
    pub joke: Option<String>,
}

// ####################
// # Response schemas #
// ####################

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error_message: String,
}
