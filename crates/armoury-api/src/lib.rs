//! JSON REST API for the Armoury ledger.
//!
//! Exposes an axum [`Router`] backed by a [`Ledger`] over any
//! [`armoury_core::store::LedgerStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", armoury_api::api_router(ledger.clone()))
//! ```

pub mod error;
pub mod events;
pub mod stats;
pub mod transactions;

use std::sync::Arc;

use armoury_core::{ledger::Ledger, store::LedgerStore};
use axum::{
  Router,
  routing::{get, post},
};

pub use error::ApiError;

/// Build a fully-materialised API router for `ledger`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(ledger: Arc<Ledger<S>>) -> Router<()>
where
  S: LedgerStore + 'static,
{
  Router::new()
    // Transactions
    .route(
      "/transactions",
      get(transactions::list::<S>).post(transactions::issue::<S>),
    )
    .route("/transactions/{id}", get(transactions::get_one::<S>))
    .route("/transactions/{id}/return", post(transactions::return_one::<S>))
    // Statistics
    .route("/aggregates", get(stats::aggregates::<S>))
    .route("/stats", get(stats::dashboard::<S>))
    // Change feed
    .route("/events", get(events::stream::<S>))
    .with_state(ledger)
}
