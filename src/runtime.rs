//! Runtime for executing the session
//!
//! Owns the one [`SessionState`], consumes the single event queue, applies
//! the pure transition function and executes its effects. Every mutation
//! funnels through that queue, so no two transitions ever interleave.

mod executor;


use crate::remote::SignalService;
use crate::session::{Event, Motion, SessionContext, SessionState};
use executor::SessionRuntime;
use tokio::sync::{mpsc, watch};

const EVENT_QUEUE_DEPTH: usize = 32;

/// Spawn the session runtime. The returned handle is the only way in
/// (intents) and out (state snapshots and subscriptions).
pub fn spawn_session<C>(ctx: SessionContext, service: C) -> SessionHandle
where
    C: SignalService + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (state_tx, state_rx) = watch::channel(SessionState::default());
    let runtime = SessionRuntime::new(ctx, service, event_rx, event_tx.clone(), state_tx);
    tokio::spawn(runtime.run());
    SessionHandle { event_tx, state_rx }
}

/// Handle to the running session
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: mpsc::Sender<Event>,
    state_rx: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub async fn begin_recording(&self, motion: Motion) -> Result<(), String> {
        self.send(Event::BeginRecording { motion }).await
    }

    pub async fn end_recording(&self) -> Result<(), String> {
        self.send(Event::EndRecording).await
    }

    pub async fn train(&self) -> Result<(), String> {
        self.send(Event::Train).await
    }

    pub async fn toggle_inference(&self) -> Result<(), String> {
        self.send(Event::ToggleInference).await
    }

    /// Snapshot of the current session state
    pub fn session(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state updates; one value per applied transition, and
    /// slow consumers observe the latest state rather than a backlog
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    async fn send(&self, event: Event) -> Result<(), String> {
        self.event_tx
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }
}
