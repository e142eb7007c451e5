//! Client for the remote signal-processing service
//!
//! The service is a black box behind six HTTP endpoints. This module is the
//! sole transport-fault recovery boundary: every operation resolves to a
//! [`ServiceReply`], never to an error the caller must handle.

mod http;

pub use http::{HttpSignalService, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};

use crate::session::Motion;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reply shape shared by every service endpoint.
///
/// Actions answer success/error; the status query additionally reports
/// predictions during inference and waiting when nothing is queued.
/// Unknown extra fields on the wire are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServiceReply {
    /// Action accepted, or a queued calibration capture landed
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Domain rejection with an operator-facing message
    Error { message: String },

    /// A live inference result
    Prediction {
        prediction: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },

    /// Nothing queued yet
    Waiting,
}

impl ServiceReply {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceReply::Success { .. } => "success",
            ServiceReply::Error { .. } => "error",
            ServiceReply::Prediction { .. } => "prediction",
            ServiceReply::Waiting => "waiting",
        }
    }
}

/// Client seam for the signal-processing service.
///
/// Implementations must normalize transport faults internally: actions
/// degrade to an error reply, the status query degrades to waiting.
#[async_trait]
pub trait SignalService: Send + Sync {
    /// POST /record - begin a calibration capture for one motion
    async fn request_recording(&self, motion: &Motion) -> ServiceReply;

    /// POST /stop-recording - end the active capture
    async fn request_stop_recording(&self) -> ServiceReply;

    /// POST /train - build the model from stored calibration data
    async fn request_training(&self) -> ServiceReply;

    /// POST /start-inference - begin live prediction streaming
    async fn request_start_inference(&self) -> ServiceReply;

    /// POST /stop-inference - end live prediction streaming
    async fn request_stop_inference(&self) -> ServiceReply;

    /// GET /status - drain one queued result, or waiting when none
    async fn query_status(&self) -> ServiceReply;
}

#[async_trait]
impl<T: SignalService + ?Sized> SignalService for Arc<T> {
    async fn request_recording(&self, motion: &Motion) -> ServiceReply {
        (**self).request_recording(motion).await
    }

    async fn request_stop_recording(&self) -> ServiceReply {
        (**self).request_stop_recording().await
    }

    async fn request_training(&self) -> ServiceReply {
        (**self).request_training().await
    }

    async fn request_start_inference(&self) -> ServiceReply {
        (**self).request_start_inference().await
    }

    async fn request_stop_inference(&self) -> ServiceReply {
        (**self).request_stop_inference().await
    }

    async fn query_status(&self) -> ServiceReply {
        (**self).query_status().await
    }
}
