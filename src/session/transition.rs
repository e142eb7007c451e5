//! Pure session transition function
//!
//! Given the current state, the session context and one event, produces the
//! next state plus the effects the runtime must execute. No I/O happens
//! here; remote calls, the countdown timer and the status poller are all
//! expressed as [`Effect`] values.

use super::{Effect, Event, SessionContext, SessionState};
use crate::remote::ServiceReply;
use crate::session::state::{Motion, Prediction, Workflow};
use thiserror::Error;

/// Result of a session transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// A background event outlived the activity that produced it. The
    /// runtime drops these without touching state.
    #[error("stale {event} event in {workflow} workflow")]
    Stale {
        event: &'static str,
        workflow: &'static str,
    },
}

/// Pure transition function.
///
/// Intents never fail: a guard violation returns the same workflow with
/// `last_error` set and no effects, so the rejection surfaces to the
/// operator without any remote call. Background events that no longer
/// apply return [`TransitionError::Stale`].
pub fn transition(
    state: &SessionState,
    ctx: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&state.workflow, event) {
        // ============================================================
        // Calibration recording
        // ============================================================

        // Idle + BeginRecording with an unknown motion -> local rejection
        (Workflow::Idle, Event::BeginRecording { motion }) if !ctx.knows_motion(&motion) => {
            Ok(reject(state, format!("Unknown motion: {motion}")))
        }

        // Idle + BeginRecording -> Recording, call the service.
        // Timer and poller start only once the service accepts.
        (Workflow::Idle, Event::BeginRecording { motion }) => {
            let mut next = state.clone();
            next.workflow = Workflow::Recording {
                motion: motion.clone(),
                remaining_secs: ctx.record_secs,
            };
            next.last_error = None;
            Ok(TransitionResult::new(next).with_effect(Effect::request_recording(motion)))
        }

        (Workflow::Recording { .. }, Event::BeginRecording { .. }) => {
            Ok(reject(state, "Recording already in progress"))
        }

        // Service accepted the capture -> arm the countdown and the poller
        (
            Workflow::Recording { motion, .. },
            Event::RecordStartResolved {
                motion: started,
                reply,
            },
        ) if *motion == started => match reply {
            ServiceReply::Success { .. } => Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::start_timer(ctx.record_secs))
                .with_effect(Effect::StartPoller)),
            ServiceReply::Error { message } => Ok(revert_to_idle(state, message)),
            other => Ok(revert_to_idle(state, unexpected_reply(&other))),
        },

        // Countdown feed
        (Workflow::Recording { motion, .. }, Event::TimerTick { remaining_secs, .. }) => {
            let mut next = state.clone();
            next.workflow = Workflow::Recording {
                motion: motion.clone(),
                remaining_secs,
            };
            Ok(TransitionResult::new(next))
        }

        // Window over (expiry) or operator stop: tell the service, tear
        // down the background tasks. Expiry without a poll success leaves
        // the motion uncalibrated.
        (Workflow::Recording { .. }, Event::TimerElapsed { .. })
        | (Workflow::Recording { .. }, Event::EndRecording) => {
            let mut next = state.clone();
            next.workflow = Workflow::Idle;
            Ok(TransitionResult::new(next).with_effects([
                Effect::CancelTimer,
                Effect::StopPoller,
                Effect::RequestStopRecording,
            ]))
        }

        // Poll results while recording. A success marks the motion
        // calibrated but the countdown keeps running: the timer stays the
        // sole terminator, so termination never races. New capture data
        // invalidates any previously trained model.
        (Workflow::Recording { motion, .. }, Event::StatusPolled { reply, .. }) => match reply {
            ServiceReply::Success { .. } => {
                let mut next = state.clone();
                next.calibrated_motions.insert(motion.clone());
                next.model_trained = false;
                Ok(TransitionResult::new(next))
            }
            ServiceReply::Error { message } => {
                let mut next = state.clone();
                next.workflow = Workflow::Idle;
                next.last_error = Some(message);
                // The service already ended its side; no stop call
                Ok(TransitionResult::new(next)
                    .with_effects([Effect::CancelTimer, Effect::StopPoller]))
            }
            ServiceReply::Prediction { .. } | ServiceReply::Waiting => {
                Ok(TransitionResult::new(state.clone()))
            }
        },

        // ============================================================
        // Training
        // ============================================================

        (Workflow::Idle, Event::Train) if !state.has_calibrated_all(ctx) => Ok(reject(
            state,
            format!("Cannot train yet: {} not calibrated", missing_motions(state, ctx)),
        )),

        (Workflow::Idle, Event::Train) => {
            let mut next = state.clone();
            next.workflow = Workflow::Training;
            next.last_error = None;
            Ok(TransitionResult::new(next).with_effect(Effect::RequestTraining))
        }

        (Workflow::Training, Event::TrainResolved { reply }) => {
            let mut next = state.clone();
            next.workflow = Workflow::Idle;
            match reply {
                ServiceReply::Success { .. } => next.model_trained = true,
                ServiceReply::Error { message } => next.last_error = Some(message),
                other => next.last_error = Some(unexpected_reply(&other)),
            }
            Ok(TransitionResult::new(next))
        }

        (Workflow::Recording { .. }, Event::Train) => {
            Ok(reject(state, "Cannot train while recording"))
        }
        (Workflow::Training, Event::Train) => Ok(reject(state, "Training already in progress")),
        (Workflow::Training, Event::BeginRecording { .. }) => {
            Ok(reject(state, "Training in progress"))
        }

        // ============================================================
        // Live inference
        // ============================================================

        (Workflow::Idle, Event::ToggleInference) if !state.has_calibrated_all(ctx) => Ok(reject(
            state,
            format!(
                "Cannot start inference: {} not calibrated",
                missing_motions(state, ctx)
            ),
        )),

        (Workflow::Idle, Event::ToggleInference) if !state.model_trained => {
            Ok(reject(state, "Cannot start inference: model not trained"))
        }

        (Workflow::Idle, Event::ToggleInference) => {
            let mut next = state.clone();
            next.workflow = Workflow::Inferring;
            next.last_error = None;
            Ok(TransitionResult::new(next).with_effect(Effect::RequestStartInference))
        }

        // Service accepted -> start streaming status
        (Workflow::Inferring, Event::InferenceStartResolved { reply }) => match reply {
            ServiceReply::Success { .. } => {
                Ok(TransitionResult::new(state.clone()).with_effect(Effect::StartPoller))
            }
            ServiceReply::Error { message } => Ok(revert_to_idle(state, message)),
            other => Ok(revert_to_idle(state, unexpected_reply(&other))),
        },

        // Toggle while inferring -> stop
        (Workflow::Inferring, Event::ToggleInference) => {
            let mut next = state.clone();
            next.workflow = Workflow::Idle;
            next.last_error = None;
            next.last_prediction = None;
            Ok(TransitionResult::new(next)
                .with_effects([Effect::StopPoller, Effect::RequestStopInference]))
        }

        (Workflow::Inferring, Event::StatusPolled { reply, .. }) => match reply {
            ServiceReply::Prediction {
                prediction,
                confidence,
            } => {
                let mut next = state.clone();
                next.last_prediction = Some(Prediction {
                    label: prediction,
                    confidence,
                });
                Ok(TransitionResult::new(next))
            }
            ServiceReply::Error { message } => {
                let mut next = state.clone();
                next.workflow = Workflow::Idle;
                next.last_error = Some(message);
                next.last_prediction = None;
                Ok(TransitionResult::new(next).with_effect(Effect::StopPoller))
            }
            ServiceReply::Success { .. } | ServiceReply::Waiting => {
                Ok(TransitionResult::new(state.clone()))
            }
        },

        (Workflow::Recording { .. }, Event::ToggleInference) => {
            Ok(reject(state, "Cannot toggle inference while recording"))
        }
        (Workflow::Training, Event::ToggleInference) => {
            Ok(reject(state, "Cannot toggle inference while training"))
        }
        (Workflow::Inferring, Event::BeginRecording { .. }) => {
            Ok(reject(state, "Stop inference before recording"))
        }
        (Workflow::Inferring, Event::Train) => Ok(reject(state, "Stop inference before training")),

        // ============================================================
        // Idempotent stop and stale events
        // ============================================================

        // Stopping when nothing is being recorded is a no-op: no remote
        // call, no error, nothing cleared.
        (_, Event::EndRecording) => Ok(TransitionResult::new(state.clone())),

        // Anything else is a background event that no longer applies
        (workflow, event) => Err(TransitionError::Stale {
            event: event.kind(),
            workflow: workflow.name(),
        }),
    }
}

/// Guard rejection: same workflow, message surfaced, no effects
fn reject(state: &SessionState, message: impl Into<String>) -> TransitionResult {
    let mut next = state.clone();
    next.last_error = Some(message.into());
    TransitionResult::new(next)
}

/// A start-direction call failed before any background work was armed
fn revert_to_idle(state: &SessionState, message: String) -> TransitionResult {
    let mut next = state.clone();
    next.workflow = Workflow::Idle;
    next.last_error = Some(message);
    next.last_prediction = None;
    TransitionResult::new(next)
}

fn unexpected_reply(reply: &ServiceReply) -> String {
    format!("Unexpected {} reply from service", reply.kind())
}

fn missing_motions(state: &SessionState, ctx: &SessionContext) -> String {
    ctx.motions
        .iter()
        .filter(|m| !state.calibrated_motions.contains(*m))
        .map(Motion::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
