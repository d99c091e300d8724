//! Handlers for `/aggregates` and `/stats`.

use std::sync::Arc;

use armoury_core::{
  aggregate::DashboardStats, ledger::Ledger, store::LedgerStore, views::AggregateRows,
};
use axum::{Json, extract::State};
use chrono::{Local, Utc};

use crate::error::ApiError;

/// `GET /aggregates`: the store's view rows, uninterpreted.
pub async fn aggregates<S: LedgerStore>(
  State(ledger): State<Arc<Ledger<S>>>,
) -> Result<Json<AggregateRows>, ApiError> {
  Ok(Json(ledger.fetch_aggregates().await?))
}

/// `GET /stats`: dashboard figures; "today" is the server's local day.
pub async fn dashboard<S: LedgerStore>(
  State(ledger): State<Arc<Ledger<S>>>,
) -> Result<Json<DashboardStats>, ApiError> {
  Ok(Json(ledger.stats(Utc::now(), &Local).await?))
}
