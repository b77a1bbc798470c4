// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-sent event stream of fleet changes for the admin map.

use crate::middleware::auth::{require_role, Role};
use crate::AppState;
use axum::{
    extract::State,
    middleware,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::{Stream, StreamExt};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/live", get(live_events))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role))
}

/// One subscription per client; it ends when the client disconnects.
async fn live_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    tracing::info!(
        subscribers = state.live.subscriber_count() + 1,
        "Live subscriber connected"
    );
    let events = state
        .live
        .subscribe()
        .map(|event| Event::default().event(event.name()).json_data(&event));
    Sse::new(events).keep_alive(KeepAlive::default())
}
