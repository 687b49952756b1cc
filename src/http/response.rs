//! Response payloads.

use serde::{Deserialize, Serialize};

/// Body of a successful `GET /api/data` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataResponse {
    /// Fixed greeting.
    pub message: String,

    /// The count this request alone produced.
    pub count: u64,
}

impl DataResponse {
    pub const MESSAGE: &'static str = "Hello from the backend!";

    pub fn new(count: u64) -> Self {
        Self {
            message: Self::MESSAGE.to_string(),
            count,
        }
    }
}
