//! The ledger access layer: List, Issue, Return and FetchAggregates.
//!
//! [`Ledger`] is what the API and any other front end hold. It validates
//! input before it reaches the store, bounds every read with a timeout,
//! retries transient read failures, and publishes a change event after each
//! successful write.
//!
//! Writes are awaited to completion: a dropped write may still commit in the
//! store, so the store bounds its own lock waits instead.

use std::{future::Future, time::Duration};

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  aggregate::{self, DashboardStats},
  notify::{ChangeBus, ChangeSubscription},
  retry::RetryPolicy,
  store::{LedgerStore, ListFilter},
  transaction::{NewIssue, Transaction},
  views::AggregateRows,
};

/// Tuning knobs for a [`Ledger`].
#[derive(Debug, Clone)]
pub struct LedgerConfig {
  /// Upper bound on a single store read. Writes are not cut short.
  pub timeout:      Duration,
  /// Applied to reads only; writes are attempted once.
  pub retry:        RetryPolicy,
  pub bus_capacity: usize,
}

impl Default for LedgerConfig {
  fn default() -> Self {
    Self {
      timeout:      Duration::from_secs(10),
      retry:        RetryPolicy::default(),
      bus_capacity: 64,
    }
  }
}

/// The transaction ledger over a [`LedgerStore`].
pub struct Ledger<S> {
  store:  S,
  bus:    ChangeBus,
  config: LedgerConfig,
}

impl<S: LedgerStore> Ledger<S> {
  pub fn new(store: S) -> Self { Self::with_config(store, LedgerConfig::default()) }

  pub fn with_config(store: S, config: LedgerConfig) -> Self {
    Self { store, bus: ChangeBus::new(config.bus_capacity), config }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn bus(&self) -> &ChangeBus { &self.bus }

  /// Register interest in ledger changes. Every subscriber shares the one
  /// bus owned by this ledger.
  pub fn subscribe(&self) -> ChangeSubscription { self.bus.subscribe() }

  /// Await a read, reporting `StoreUnavailable` once the timeout elapses.
  async fn call<T, F>(&self, fut: F) -> Result<T>
  where
    F: Future<Output = Result<T, S::Error>>,
  {
    match tokio::time::timeout(self.config.timeout, fut).await {
      Ok(result) => result.map_err(Into::into),
      Err(_) => Err(Error::StoreUnavailable(format!(
        "no response within {:?}",
        self.config.timeout
      ))),
    }
  }

  /// Await a write to its real outcome.
  async fn write<T, F>(&self, fut: F) -> Result<T>
  where
    F: Future<Output = Result<T, S::Error>>,
  {
    fut.await.map_err(Into::into)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// All records, newest serial first, optionally narrowed by `filter`.
  pub async fn list(&self, filter: Option<&str>) -> Result<Vec<Transaction>> {
    let mut records = self
      .config
      .retry
      .run("list", move || self.call(self.store.list_transactions()))
      .await?;

    records.sort_by(|a, b| b.serial_number.cmp(&a.serial_number));
    if let Some(filter) = filter.map(ListFilter::new).filter(|f| !f.is_empty()) {
      records.retain(|tx| filter.matches(tx));
    }

    tracing::debug!(count = records.len(), "listed transactions");
    Ok(records)
  }

  pub async fn get(&self, id: Uuid) -> Result<Transaction> {
    self
      .config
      .retry
      .run("get", move || self.call(self.store.get_transaction(id)))
      .await?
      .ok_or(Error::NotFound(id))
  }

  /// The pre-aggregated view rows, verbatim.
  pub async fn fetch_aggregates(&self) -> Result<AggregateRows> {
    self
      .config
      .retry
      .run("fetch_aggregates", move || self.call(self.store.fetch_aggregates()))
      .await
  }

  /// A fresh snapshot run through [`aggregate::summarize`].
  pub async fn stats<Tz: TimeZone>(
    &self,
    now: DateTime<Utc>,
    tz: &Tz,
  ) -> Result<DashboardStats> {
    let records = self.list(None).await?;
    let aggregates = self.fetch_aggregates().await?;
    Ok(aggregate::summarize(&records, &aggregates, now, tz))
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Create an open record. `date_out` defaults to now.
  ///
  /// Fails with [`Error::Validation`] before touching the store if a
  /// required field is blank, and with [`Error::AlreadyIssued`] if the butt
  /// number is already out.
  pub async fn issue(&self, input: NewIssue) -> Result<Transaction> {
    let record = input.validate(Utc::now()).inspect_err(|e| {
      tracing::warn!(error = %e, "issue rejected");
    })?;

    let tx = self.write(self.store.insert_transaction(record)).await?;
    tracing::info!(
      id = %tx.id,
      serial_number = tx.serial_number,
      butt_number = %tx.weapon.butt_number,
      army_number = %tx.holder.army_number,
      "weapon issued"
    );
    self.bus.notify();
    Ok(tx)
  }

  /// Close record `id` now, signed by `storeman`.
  ///
  /// A record is closed at most once: a second return fails with
  /// [`Error::AlreadyReturned`] and leaves the first `date_in` in place.
  pub async fn return_weapon(&self, id: Uuid, storeman: &str) -> Result<Transaction> {
    let storeman = storeman.trim();
    if storeman.is_empty() {
      return Err(Error::Validation("signature_storeman is required".into()));
    }

    let tx = self
      .write(self.store.close_transaction(id, Utc::now(), storeman.to_owned()))
      .await
      .inspect_err(|e| tracing::warn!(%id, error = %e, "return rejected"))?;
    tracing::info!(
      %id,
      butt_number = %tx.weapon.butt_number,
      storeman,
      "weapon returned"
    );
    self.bus.notify();
    Ok(tx)
  }
}
