//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to begin a calibration capture
#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub motion: String,
}

/// Response for intent actions
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
