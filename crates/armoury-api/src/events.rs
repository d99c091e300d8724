//! `GET /events`: server-sent change feed.
//!
//! Emits one `ledger` event per change on the ledger's bus. Events carry no
//! diff; clients re-fetch whatever they display.

use std::{convert::Infallible, sync::Arc};

use armoury_core::{ledger::Ledger, store::LedgerStore};
use axum::{
  extract::State,
  response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{Stream, StreamExt as _, wrappers::BroadcastStream};

/// Name of the SSE event sent for every change.
pub const CHANGE_EVENT: &str = "ledger";

pub async fn stream<S: LedgerStore>(
  State(ledger): State<Arc<Ledger<S>>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
  // A lagged receiver yields an error item; it still means "re-fetch".
  let changes = BroadcastStream::new(ledger.bus().receiver())
    .map(|_| Ok(Event::default().event(CHANGE_EVENT).data("changed")));
  Sse::new(changes).keep_alive(KeepAlive::default())
}
