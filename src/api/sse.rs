//! Server-Sent Events support

use crate::session::SessionState;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::Value;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

/// Convert the session watch channel to an SSE stream.
///
/// The stream opens with the current state, then yields one event per
/// applied transition. A slow client observes the latest state rather than
/// a backlog; intermediate snapshots it missed are gone.
pub fn sse_stream(
    state_rx: watch::Receiver<SessionState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = WatchStream::new(state_rx).map(|state| Ok(state_to_event(&state)));

    Sse::new(updates).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn state_to_event(state: &SessionState) -> Event {
    let data = serde_json::to_value(state).unwrap_or(Value::Null);
    Event::default().event("session").data(data.to_string())
}
