//! Session runtime executor
//!
//! Pulls events off the queue one at a time, applies [`transition`] and
//! executes the returned effects. Remote calls made by an effect are awaited
//! inline and their resolution events are processed before anything else in
//! the queue, so an intent and its resolution can never interleave with
//! another intent.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::remote::{ServiceReply, SignalService};
use crate::session::{transition, Effect, Event, SessionContext, SessionState};

/// Generic session runtime that can work with any signal service implementation
pub struct SessionRuntime<C: SignalService + 'static> {
    ctx: SessionContext,
    state: SessionState,
    service: Arc<C>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    state_tx: watch::Sender<SessionState>,
    /// Token to cancel the running countdown task
    timer: Option<CancellationToken>,
    /// Token to cancel the running poller task
    poller: Option<CancellationToken>,
    // Generation stamps advance on every task start and stop. Events from a
    // task that was since replaced or canceled carry an old stamp and are
    // dropped before they can touch state.
    timer_generation: u64,
    poller_generation: u64,
}

impl<C: SignalService + 'static> SessionRuntime<C> {
    pub fn new(
        ctx: SessionContext,
        service: C,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        state_tx: watch::Sender<SessionState>,
    ) -> Self {
        Self {
            ctx,
            state: SessionState::default(),
            service: Arc::new(service),
            event_rx,
            event_tx,
            state_tx,
            timer: None,
            poller: None,
            timer_generation: 0,
            poller_generation: 0,
        }
    }

    pub async fn run(mut self) {
        info!("Starting session runtime");

        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event).await;
        }

        info!("Session runtime stopped");
    }

    async fn process_event(&mut self, event: Event) {
        // Process events in a loop to handle chained effects
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            if self.is_stale(&current_event) {
                debug!(
                    event = current_event.kind(),
                    "Dropping stale background event"
                );
                continue;
            }

            debug!(event = current_event.kind(), "Processing event");

            // Pure state transition
            let result = match transition(&self.state, &self.ctx, current_event) {
                Ok(r) => r,
                Err(e) => {
                    debug!(error = %e, "Event no longer applies");
                    continue;
                }
            };

            // Update state and publish the new snapshot to watchers
            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state.workflow.name() != self.state.workflow.name() {
                info!(
                    from = old_state.workflow.name(),
                    to = self.state.workflow.name(),
                    "Workflow changed"
                );
            }
            self.state_tx.send_replace(self.state.clone());

            // Execute effects and collect generated events
            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }
    }

    /// Whether a background event was sent by a task that has since been
    /// stopped or replaced. Intents and resolutions are never stale.
    fn is_stale(&self, event: &Event) -> bool {
        match event {
            Event::TimerTick { generation, .. } | Event::TimerElapsed { generation } => {
                *generation != self.timer_generation
            }
            Event::StatusPolled { generation, .. } => *generation != self.poller_generation,
            _ => false,
        }
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::RequestRecording { motion } => {
                let reply = self.service.request_recording(&motion).await;
                Some(Event::RecordStartResolved { motion, reply })
            }

            Effect::RequestStopRecording => {
                // The capture window already closed locally; nothing to roll back
                if let ServiceReply::Error { message } =
                    self.service.request_stop_recording().await
                {
                    warn!(message = %message, "Stop recording request failed");
                }
                None
            }

            Effect::RequestTraining => {
                let reply = self.service.request_training().await;
                Some(Event::TrainResolved { reply })
            }

            Effect::RequestStartInference => {
                let reply = self.service.request_start_inference().await;
                Some(Event::InferenceStartResolved { reply })
            }

            Effect::RequestStopInference => {
                if let ServiceReply::Error { message } = self.service.request_stop_inference().await
                {
                    warn!(message = %message, "Stop inference request failed");
                }
                None
            }

            Effect::StartTimer { secs } => {
                self.start_timer(secs);
                None
            }

            Effect::CancelTimer => {
                self.stop_timer();
                None
            }

            Effect::StartPoller => {
                self.start_poller();
                None
            }

            Effect::StopPoller => {
                self.stop_poller();
                None
            }
        }
    }

    fn start_timer(&mut self, secs: u32) {
        self.stop_timer();
        self.timer_generation += 1;
        let token = CancellationToken::new();
        self.timer = Some(token.clone());
        tokio::spawn(run_timer(
            self.timer_generation,
            secs,
            token,
            self.event_tx.clone(),
        ));
    }

    fn stop_timer(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
            self.timer_generation += 1;
        }
    }

    fn start_poller(&mut self) {
        self.stop_poller();
        self.poller_generation += 1;
        let token = CancellationToken::new();
        self.poller = Some(token.clone());
        tokio::spawn(run_poller(
            self.poller_generation,
            self.ctx.poll_interval,
            Arc::clone(&self.service),
            token,
            self.event_tx.clone(),
        ));
    }

    fn stop_poller(&mut self) {
        if let Some(token) = self.poller.take() {
            token.cancel();
            self.poller_generation += 1;
        }
    }
}

/// Countdown task. Emits one tick per second carrying the seconds remaining,
/// then a single elapsed event, and exits. Cancellation wins any race with a
/// due tick.
async fn run_timer(
    generation: u64,
    secs: u32,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<Event>,
) {
    let period = Duration::from_secs(1);
    let mut ticks = interval_at(Instant::now() + period, period);
    let mut remaining = secs;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            _ = ticks.tick() => {}
        }

        remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            let _ = event_tx.send(Event::TimerElapsed { generation }).await;
            return;
        }
        let tick = Event::TimerTick {
            generation,
            remaining_secs: remaining,
        };
        if event_tx.send(tick).await.is_err() {
            return;
        }
    }
}

/// Status polling task. At most one query is ever in flight: a query that
/// outlasts its interval skips the missed ticks instead of stacking them up.
async fn run_poller<C: SignalService>(
    generation: u64,
    interval: Duration,
    service: Arc<C>,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<Event>,
) {
    let mut ticks = interval_at(Instant::now() + interval, interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            _ = ticks.tick() => {}
        }

        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            reply = service.query_status() => reply,
        };
        // The token may have been canceled while the query was in flight
        if cancel.is_cancelled() {
            return;
        }

        debug!(reply = reply.kind(), "Status poll completed");
        if event_tx
            .send(Event::StatusPolled { generation, reply })
            .await
            .is_err()
        {
            return;
        }
    }
}
