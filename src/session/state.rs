//! Session state types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

// ============================================================================
// Motion - a calibratable motion class
// ============================================================================

/// Identifier for one motion class the operator can calibrate (e.g. "GO").
///
/// The valid set is fixed per session via [`SessionContext::motions`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Motion(String);

impl Motion {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Motion {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

/// A prediction surfaced by the service during live inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Classifier confidence in [0, 1], when the service reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

// ============================================================================
// Workflow - the mutually exclusive session activities
// ============================================================================

/// The active workflow. Exactly one value at any instant; Recording,
/// Training and Inferring are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Workflow {
    /// No workflow active, ready for any intent
    #[default]
    Idle,

    /// Calibration capture for one motion, bounded by the countdown
    Recording {
        motion: Motion,
        /// Seconds left in the capture window; counts down from the
        /// configured duration and is only meaningful in this variant
        remaining_secs: u32,
    },

    /// Model build request in flight (single-shot, not polled)
    Training,

    /// Live prediction streaming
    Inferring,
}

impl Workflow {
    /// Short label for logging
    pub fn name(&self) -> &'static str {
        match self {
            Workflow::Idle => "idle",
            Workflow::Recording { .. } => "recording",
            Workflow::Training => "training",
            Workflow::Inferring => "inferring",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Workflow::Idle)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// The one owned session value; everything presented to the operator is
/// derived from it. Mutated only by applying [`transition`].
///
/// [`transition`]: crate::session::transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionState {
    pub workflow: Workflow,

    /// Motions with at least one successful calibration capture this
    /// session. Grows monotonically; only a process restart clears it.
    pub calibrated_motions: BTreeSet<Motion>,

    /// True once a training request succeeded and no calibration capture
    /// has landed since
    pub model_trained: bool,

    /// Set only while Inferring; cleared on every exit from Inferring
    pub last_prediction: Option<Prediction>,

    /// Operator-facing message from the most recent failure; cleared when
    /// a new start-direction intent is accepted
    pub last_error: Option<String>,
}

impl SessionState {
    /// Whether every configured motion has calibration data
    pub fn has_calibrated_all(&self, ctx: &SessionContext) -> bool {
        ctx.motions.iter().all(|m| self.calibrated_motions.contains(m))
    }

    /// Whether inference may start right now
    pub fn inference_ready(&self, ctx: &SessionContext) -> bool {
        self.workflow.is_idle() && self.has_calibrated_all(ctx) && self.model_trained
    }
}

// ============================================================================
// Session Context
// ============================================================================

pub const DEFAULT_RECORD_SECS: u32 = 15;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Context for a session (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// The fixed motion set the operator calibrates, in display order
    pub motions: Vec<Motion>,
    /// Length of one calibration capture window
    pub record_secs: u32,
    /// Cadence of the status poller
    pub poll_interval: Duration,
}

impl SessionContext {
    pub fn new(motions: Vec<Motion>, record_secs: u32, poll_interval: Duration) -> Self {
        Self {
            motions,
            record_secs,
            poll_interval,
        }
    }

    pub fn knows_motion(&self, motion: &Motion) -> bool {
        self.motions.contains(motion)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            motions: vec![Motion::from("GO"), Motion::from("STOP")],
            record_secs: DEFAULT_RECORD_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
