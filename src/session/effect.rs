//! Effects produced by session transitions

use crate::session::state::Motion;

/// Effects to be executed by the runtime after a transition.
///
/// The remote-call effects are awaited inline by the runtime's event loop
/// and resolve into follow-up events, so no queued intent can interleave
/// with an in-flight call. Timer and poller effects spawn or cancel the
/// background tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// POST /record for one motion; resolves to `RecordStartResolved`
    RequestRecording { motion: Motion },

    /// POST /stop-recording; the reply is logged, never routed back
    RequestStopRecording,

    /// POST /train; resolves to `TrainResolved`
    RequestTraining,

    /// POST /start-inference; resolves to `InferenceStartResolved`
    RequestStartInference,

    /// POST /stop-inference; the reply is logged, never routed back
    RequestStopInference,

    /// Start (or restart) the countdown for one capture window
    StartTimer { secs: u32 },

    /// Cancel the countdown; stale ticks are discarded by generation stamp
    CancelTimer,

    /// Start the status poller at the configured interval
    StartPoller,

    /// Stop the status poller; in-flight queries are discarded
    StopPoller,
}

impl Effect {
    pub fn request_recording(motion: Motion) -> Self {
        Effect::RequestRecording { motion }
    }

    pub fn start_timer(secs: u32) -> Self {
        Effect::StartTimer { secs }
    }
}
