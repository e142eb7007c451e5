//! Property-based tests for session invariants
//!
//! Folds arbitrary event sequences from the initial state and asserts the
//! structural invariants hold after every applied transition.

use super::state::{Motion, Workflow};
use super::transition::transition;
use super::{Effect, Event, SessionContext, SessionState};
use crate::remote::ServiceReply;
use proptest::prelude::*;

fn arb_motion() -> impl Strategy<Value = Motion> {
    prop_oneof![
        3 => Just(Motion::from("GO")),
        3 => Just(Motion::from("STOP")),
        1 => Just(Motion::from("JUMP")),
    ]
}

fn arb_message() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,24}"
}

fn arb_reply() -> impl Strategy<Value = ServiceReply> {
    prop_oneof![
        proptest::option::of(arb_message())
            .prop_map(|message| ServiceReply::Success { message }),
        arb_message().prop_map(|message| ServiceReply::Error { message }),
        ("[A-Z]{2,6}", proptest::option::of(0.0f64..=1.0)).prop_map(
            |(prediction, confidence)| ServiceReply::Prediction {
                prediction,
                confidence,
            }
        ),
        Just(ServiceReply::Waiting),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_motion().prop_map(|motion| Event::BeginRecording { motion }),
        Just(Event::EndRecording),
        Just(Event::Train),
        Just(Event::ToggleInference),
        (arb_motion(), arb_reply()).prop_map(|(motion, reply)| Event::RecordStartResolved {
            motion,
            reply
        }),
        arb_reply().prop_map(|reply| Event::TrainResolved { reply }),
        arb_reply().prop_map(|reply| Event::InferenceStartResolved { reply }),
        (0u64..4, 0u32..20).prop_map(|(generation, remaining_secs)| Event::TimerTick {
            generation,
            remaining_secs
        }),
        (0u64..4).prop_map(|generation| Event::TimerElapsed { generation }),
        (0u64..4, arb_reply()).prop_map(|(generation, reply)| Event::StatusPolled {
            generation,
            reply
        }),
    ]
}

/// The structural invariants every reachable state must satisfy
fn invariants_hold(state: &SessionState, ctx: &SessionContext) -> bool {
    let calibrated_known = state
        .calibrated_motions
        .iter()
        .all(|m| ctx.knows_motion(m));
    let prediction_scoped =
        state.last_prediction.is_none() || matches!(state.workflow, Workflow::Inferring);
    let inference_guarded = !matches!(state.workflow, Workflow::Inferring)
        || (state.has_calibrated_all(ctx) && state.model_trained);
    calibrated_known && prediction_scoped && inference_guarded
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Invariants survive any event sequence, and calibration coverage
    /// only ever grows within a session.
    #[test]
    fn prop_event_sequences_preserve_invariants(
        events in prop::collection::vec(arb_event(), 0..48)
    ) {
        let ctx = SessionContext::default();
        let mut state = SessionState::default();
        prop_assert!(invariants_hold(&state, &ctx));

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                prop_assert!(
                    result.new_state.calibrated_motions.is_superset(&state.calibrated_motions)
                );
                prop_assert!(invariants_hold(&result.new_state, &ctx));
                state = result.new_state;
            }
        }
    }

    /// Operator intents never produce a transition error, whatever state
    /// the session is in; rejections surface through `last_error`.
    #[test]
    fn prop_intents_never_error(
        events in prop::collection::vec(arb_event(), 0..32),
        motion in arb_motion(),
    ) {
        let ctx = SessionContext::default();
        let mut state = SessionState::default();

        for event in events {
            let intents = [
                Event::BeginRecording { motion: motion.clone() },
                Event::EndRecording,
                Event::Train,
                Event::ToggleInference,
            ];
            for intent in intents {
                prop_assert!(transition(&state, &ctx, intent).is_ok());
            }

            if let Ok(result) = transition(&state, &ctx, event) {
                state = result.new_state;
            }
        }
    }

    /// Toggling inference before the guards are satisfied never reaches
    /// the service: no effects, workflow untouched, rejection surfaced.
    #[test]
    fn prop_unready_inference_toggle_makes_no_call(
        events in prop::collection::vec(arb_event(), 0..32)
    ) {
        let ctx = SessionContext::default();
        let mut state = SessionState::default();

        for event in events {
            if state.workflow.is_idle() && !state.inference_ready(&ctx) {
                let result = transition(&state, &ctx, Event::ToggleInference).unwrap();
                prop_assert!(result.effects.is_empty());
                prop_assert!(result.new_state.workflow.is_idle());
                prop_assert!(result.new_state.last_error.is_some());
            }

            if let Ok(result) = transition(&state, &ctx, event) {
                state = result.new_state;
            }
        }
    }

    /// Every effect a transition emits is consistent with the workflow it
    /// lands in: work starts only for the active workflow, teardown only
    /// on the way back to Idle.
    #[test]
    fn prop_effects_match_destination(
        events in prop::collection::vec(arb_event(), 0..48)
    ) {
        let ctx = SessionContext::default();
        let mut state = SessionState::default();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                let workflow = &result.new_state.workflow;
                for effect in &result.effects {
                    match effect {
                        Effect::RequestRecording { .. } | Effect::StartTimer { .. } => {
                            // Explicit message: the default stringified condition
                            // contains `{ .. }`, which is an invalid format string.
                            prop_assert!(
                                matches!(workflow, Workflow::Recording { .. }),
                                "assertion failed: matches!(workflow, Workflow::Recording {{ .. }})"
                            );
                        }
                        Effect::StartPoller => {
                            prop_assert!(
                                matches!(
                                    workflow,
                                    Workflow::Recording { .. } | Workflow::Inferring
                                ),
                                "assertion failed: matches!(workflow, Workflow::Recording {{ .. }} | Workflow::Inferring)"
                            );
                        }
                        Effect::RequestTraining => {
                            prop_assert!(matches!(workflow, Workflow::Training));
                        }
                        Effect::RequestStartInference => {
                            prop_assert!(matches!(workflow, Workflow::Inferring));
                        }
                        Effect::RequestStopRecording
                        | Effect::RequestStopInference
                        | Effect::CancelTimer
                        | Effect::StopPoller => {
                            prop_assert!(workflow.is_idle());
                        }
                    }
                }
                state = result.new_state;
            }
        }
    }
}
