//! HTTP API for the operator console

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::SessionHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub handle: SessionHandle,
}

impl AppState {
    pub fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }
}
