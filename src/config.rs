//! Process configuration from environment variables

use crate::remote::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::session::state::{DEFAULT_POLL_INTERVAL, DEFAULT_RECORD_SECS};
use crate::session::{Motion, SessionContext};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("NEURODRIVE_MOTIONS must name at least one motion")]
    EmptyMotionSet,
    #[error("NEURODRIVE_RECORD_SECS must be at least 1")]
    ZeroRecordWindow,
    #[error("NEURODRIVE_POLL_MS must be at least 1")]
    ZeroPollInterval,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the signal-processing service
    pub service_url: String,
    /// Port the console listens on
    pub port: u16,
    /// The motion set the operator calibrates, in display order
    pub motions: Vec<Motion>,
    /// Length of one calibration capture window, in seconds
    pub record_secs: u32,
    /// Cadence of the status poller
    pub poll_interval: Duration,
    /// Per-request timeout for service calls
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let service_url = std::env::var("NEURODRIVE_SERVICE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let port = std::env::var("NEURODRIVE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let motions = match std::env::var("NEURODRIVE_MOTIONS") {
            Ok(raw) => parse_motions(&raw),
            Err(_) => SessionContext::default().motions,
        };
        if motions.is_empty() {
            return Err(ConfigError::EmptyMotionSet);
        }

        let record_secs: u32 = std::env::var("NEURODRIVE_RECORD_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RECORD_SECS);
        if record_secs == 0 {
            return Err(ConfigError::ZeroRecordWindow);
        }

        let poll_ms: u64 = std::env::var("NEURODRIVE_POLL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL.as_millis() as u64);
        if poll_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        let request_timeout = std::env::var("NEURODRIVE_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);

        Ok(Self {
            service_url,
            port,
            motions,
            record_secs,
            poll_interval: Duration::from_millis(poll_ms),
            request_timeout,
        })
    }
}

fn parse_motions(raw: &str) -> Vec<Motion> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(Motion::from)
        .collect()
}
