//! Server-Sent Events (SSE) broadcaster
//!
//! Streams session events to the connected viewer page. A fresh snapshot is
//! sent first so a client that connects (or reconnects) mid-journey can
//! render the current phase before live events resume.

use crate::api::AppContext;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use keepsake_common::events::ViewerEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// GET /session/:id/events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
    Path(id): Path<uuid::Uuid>,
) -> crate::error::Result<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let session = ctx.engine.session(id).await?;
    session.state.touch().await;
    debug!("New SSE client connected to session {}", id);

    // Subscribe before snapshotting so no event falls in the gap
    let rx = session.state.subscribe_events();
    let initial = ViewerEvent::InitialState {
        snapshot: session.snapshot().await,
        timestamp: chrono::Utc::now(),
    };

    let live = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => encode(&event),
            Err(e) => {
                // Lagged or closed receiver
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });
    let stream = stream::iter(encode(&initial)).chain(live);

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

fn encode(event: &ViewerEvent) -> Option<Result<Event, Infallible>> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Ok(Event::default().event(event.event_type()).data(json))),
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            None
        }
    }
}
