//! The `LedgerStore` trait and the List filter.
//!
//! The trait is implemented by storage backends (e.g. `armoury-store-sqlite`).
//! Higher layers go through [`crate::ledger::Ledger`], never a concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  transaction::{IssueRecord, Transaction},
  views::AggregateRows,
};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Client-side filter for [`Ledger::list`](crate::ledger::Ledger::list).
///
/// Matches a case-insensitive substring of the holder's name, or a literal
/// substring of the army number or butt number. The text is used as given;
/// whitespace only decides whether the filter is blank.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
  needle:  String,
  lowered: String,
}

impl ListFilter {
  pub fn new(text: &str) -> Self {
    Self { needle: text.to_owned(), lowered: text.to_lowercase() }
  }

  pub fn is_empty(&self) -> bool { self.needle.trim().is_empty() }

  pub fn matches(&self, tx: &Transaction) -> bool {
    self.is_empty()
      || tx.holder.name.to_lowercase().contains(&self.lowered)
      || tx.holder.army_number.contains(&self.needle)
      || tx.weapon.butt_number.contains(&self.needle)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the durable ledger store.
///
/// Records are only ever inserted open and closed once; nothing is deleted.
/// The store assigns `id` and `serial_number`.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// All records, ordered by `serial_number` descending.
  fn list_transactions(
    &self,
  ) -> impl Future<Output = Result<Vec<Transaction>, Self::Error>> + Send + '_;

  /// A single record. Returns `None` if not found.
  fn get_transaction(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Transaction>, Self::Error>> + Send + '_;

  /// Insert a new open record.
  ///
  /// Must fail with [`crate::Error::AlreadyIssued`] (after conversion) if the
  /// butt number already has an open record.
  fn insert_transaction(
    &self,
    record: IssueRecord,
  ) -> impl Future<Output = Result<Transaction, Self::Error>> + Send + '_;

  /// Close an open record, atomically with respect to other closes.
  ///
  /// Must fail with `NotFound` if `id` does not exist and `AlreadyReturned`
  /// if it is already closed; a losing concurrent close sees the latter.
  fn close_transaction(
    &self,
    id: Uuid,
    date_in: DateTime<Utc>,
    signature_storeman: String,
  ) -> impl Future<Output = Result<Transaction, Self::Error>> + Send + '_;

  /// Read every pre-aggregated view in full.
  fn fetch_aggregates(
    &self,
  ) -> impl Future<Output = Result<AggregateRows, Self::Error>> + Send + '_;
}
