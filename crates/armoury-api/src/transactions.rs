//! Handlers for `/transactions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/transactions` | Optional `?q=` filter over name, army number, butt number |
//! | `POST` | `/transactions` | Issue. Body: [`NewIssue`]; returns 201 + the open record |
//! | `GET`  | `/transactions/:id` | 404 if not found |
//! | `POST` | `/transactions/:id/return` | Body: `{"signature_storeman":"..."}` |

use std::sync::Arc;

use armoury_core::{
  ledger::Ledger,
  store::LedgerStore,
  transaction::{NewIssue, Transaction},
};
use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

fn bad_body(rejection: JsonRejection) -> ApiError {
  ApiError::BadRequest(rejection.body_text())
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Case-insensitive on name; literal on army and butt numbers.
  pub q: Option<String>,
}

/// `GET /transactions[?q=<text>]`
pub async fn list<S: LedgerStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
  let records = ledger.list(params.q.as_deref()).await?;
  Ok(Json(records))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /transactions/:id`
pub async fn get_one<S: LedgerStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, ApiError> {
  Ok(Json(ledger.get(id).await?))
}

// ─── Issue ────────────────────────────────────────────────────────────────────

/// `POST /transactions`: returns 201 + the stored open [`Transaction`].
pub async fn issue<S: LedgerStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  body: Result<Json<NewIssue>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body.map_err(bad_body)?;
  let tx = ledger.issue(body).await?;
  Ok((StatusCode::CREATED, Json(tx)))
}

// ─── Return ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReturnBody {
  pub signature_storeman: String,
}

/// `POST /transactions/:id/return`: closes the record as of now.
pub async fn return_one<S: LedgerStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  Path(id): Path<Uuid>,
  body: Result<Json<ReturnBody>, JsonRejection>,
) -> Result<Json<Transaction>, ApiError> {
  let Json(body) = body.map_err(bad_body)?;
  let tx = ledger.return_weapon(id, &body.signature_storeman).await?;
  Ok(Json(tx))
}
