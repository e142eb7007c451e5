//! Events that drive session transitions

use crate::remote::ServiceReply;
use crate::session::state::Motion;

/// Everything that can mutate the session flows through this one vocabulary:
/// operator intents, remote-call resolutions, and the two background feeds
/// (countdown timer, status poller).
///
/// Timer and poller events carry the generation stamp of the task that sent
/// them; the runtime drops events whose stamp no longer matches the live
/// task, so work that was canceled can never touch state.
#[derive(Debug, Clone)]
pub enum Event {
    // Operator intents
    BeginRecording { motion: Motion },
    EndRecording,
    Train,
    ToggleInference,

    // Remote-call resolutions for the start-direction actions
    RecordStartResolved { motion: Motion, reply: ServiceReply },
    TrainResolved { reply: ServiceReply },
    InferenceStartResolved { reply: ServiceReply },

    // Countdown timer feed
    TimerTick { generation: u64, remaining_secs: u32 },
    TimerElapsed { generation: u64 },

    // Status poller feed
    StatusPolled { generation: u64, reply: ServiceReply },
}

impl Event {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Event::BeginRecording { .. } => "begin_recording",
            Event::EndRecording => "end_recording",
            Event::Train => "train",
            Event::ToggleInference => "toggle_inference",
            Event::RecordStartResolved { .. } => "record_start_resolved",
            Event::TrainResolved { .. } => "train_resolved",
            Event::InferenceStartResolved { .. } => "inference_start_resolved",
            Event::TimerTick { .. } => "timer_tick",
            Event::TimerElapsed { .. } => "timer_elapsed",
            Event::StatusPolled { .. } => "status_polled",
        }
    }
}
