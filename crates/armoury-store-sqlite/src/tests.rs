//! Integration tests for `SqliteStore` against an in-memory database.

use std::{
  path::{Path, PathBuf},
  sync::mpsc,
  thread,
  time::Duration,
};

use armoury_core::{
  Error as CoreError,
  ledger::{Ledger, LedgerConfig},
  retry::RetryPolicy,
  store::LedgerStore,
  transaction::{IssueRecord, NewIssue},
};
use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Timelike, Utc};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap() }

fn issue(butt: &str, date_out: DateTime<Utc>) -> IssueRecord {
  NewIssue {
    army_number: "123".into(),
    rank: "PVT".into(),
    name: "Doe".into(),
    weapon_type: "Rifle".into(),
    butt_number: butt.into(),
    register_number: "R1".into(),
    magazine: Some("2x30".into()),
    bayonet_complete: Some(true),
    date_out: Some(date_out),
    ..NewIssue::default()
  }
  .validate(date_out)
  .unwrap()
}

fn core(err: Error) -> CoreError { err.into() }

// ─── Insert / read ───────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_transaction() {
  let s = store().await;

  let tx = s.insert_transaction(issue("B2", t0())).await.unwrap();
  assert!(tx.is_open());
  assert_eq!(tx.serial_number, 1);
  assert_eq!(tx.date_out(), t0());
  assert_eq!(tx.magazine.as_deref(), Some("2x30"));
  assert_eq!(tx.bayonet_complete, Some(true));

  let fetched = s.get_transaction(tx.id).await.unwrap().unwrap();
  assert_eq!(fetched, tx);
}

#[tokio::test]
async fn get_transaction_missing_returns_none() {
  let s = store().await;
  assert!(s.get_transaction(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_is_ordered_by_serial_descending() {
  let s = store().await;
  for butt in ["A1", "A2", "A3"] {
    s.insert_transaction(issue(butt, t0())).await.unwrap();
  }

  let all = s.list_transactions().await.unwrap();
  let serials: Vec<_> = all.iter().map(|t| t.serial_number).collect();
  assert_eq!(serials, [3, 2, 1]);
  assert_eq!(all[0].weapon.butt_number, "A3");
}

#[tokio::test]
async fn second_open_record_for_same_weapon_is_refused() {
  let s = store().await;
  s.insert_transaction(issue("B2", t0())).await.unwrap();

  let err = s.insert_transaction(issue("B2", t0())).await.unwrap_err();
  assert!(matches!(core(err), CoreError::AlreadyIssued(b) if b == "B2"));
  assert_eq!(s.list_transactions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn weapon_can_be_reissued_after_return() {
  let s = store().await;
  let first = s.insert_transaction(issue("B2", t0())).await.unwrap();
  s.close_transaction(first.id, t0() + TimeDelta::hours(1), "Sgt Lee".into())
    .await
    .unwrap();

  let second = s
    .insert_transaction(issue("B2", t0() + TimeDelta::hours(2)))
    .await
    .unwrap();
  assert_eq!(second.serial_number, 2);
}

// ─── Return ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn close_sets_date_in_and_storeman() {
  let s = store().await;
  let tx = s.insert_transaction(issue("B2", t0())).await.unwrap();
  let back = t0() + TimeDelta::hours(3);

  let closed = s.close_transaction(tx.id, back, "Sgt Lee".into()).await.unwrap();
  assert!(!closed.is_open());
  assert_eq!(closed.date_in(), Some(back));
  assert_eq!(closed.state.signature_storeman(), Some("Sgt Lee"));
  assert_eq!(closed.date_out(), t0());
}

#[tokio::test]
async fn second_close_is_already_returned_and_changes_nothing() {
  let s = store().await;
  let tx = s.insert_transaction(issue("B2", t0())).await.unwrap();
  let back = t0() + TimeDelta::hours(3);
  s.close_transaction(tx.id, back, "Sgt Lee".into()).await.unwrap();

  let err = s
    .close_transaction(tx.id, back + TimeDelta::hours(1), "Sgt Kim".into())
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::AlreadyReturned(id) if id == tx.id));

  let stored = s.get_transaction(tx.id).await.unwrap().unwrap();
  assert_eq!(stored.date_in(), Some(back));
  assert_eq!(stored.state.signature_storeman(), Some("Sgt Lee"));
}

#[tokio::test]
async fn close_missing_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.close_transaction(id, t0(), "Sgt Lee".into()).await.unwrap_err();
  assert!(matches!(core(err), CoreError::NotFound(e) if e == id));
}

#[tokio::test]
async fn close_before_issue_time_is_rejected() {
  let s = store().await;
  let tx = s.insert_transaction(issue("B2", t0())).await.unwrap();
  let err = s
    .close_transaction(tx.id, t0() - TimeDelta::minutes(5), "Sgt Lee".into())
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::Validation(_)));
  assert!(s.get_transaction(tx.id).await.unwrap().unwrap().is_open());
}

#[tokio::test]
async fn racing_returns_have_exactly_one_winner() {
  let s = store().await;
  let tx = s.insert_transaction(issue("B2", t0())).await.unwrap();
  let back = t0() + TimeDelta::hours(1);

  let (a, b) = tokio::join!(
    s.close_transaction(tx.id, back, "Sgt Lee".into()),
    s.close_transaction(tx.id, back, "Sgt Kim".into()),
  );
  assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
}

// ─── Aggregate views ─────────────────────────────────────────────────────────

#[tokio::test]
async fn aggregates_reflect_rows() {
  let s = store().await;

  // Tuesday 2026-03-10 09:30 UTC.
  let a = s.insert_transaction(issue("A1", t0())).await.unwrap();
  s.insert_transaction(issue("A2", t0())).await.unwrap();
  let mut pistol = issue("P1", t0() + TimeDelta::hours(1));
  pistol.weapon.weapon_type = "Pistol".into();
  pistol.holder.army_number = "456".into();
  s.insert_transaction(pistol).await.unwrap();
  s.close_transaction(a.id, t0() + TimeDelta::days(1), "Sgt Lee".into())
    .await
    .unwrap();

  let agg = s.fetch_aggregates().await.unwrap();

  let days: Vec<_> = agg.daily.iter().map(|d| (d.day.day(), d.issued, d.returned)).collect();
  assert_eq!(days, [(10, 3, 0), (11, 0, 1)]);

  let mut dist: Vec<_> = agg
    .weapon_types
    .iter()
    .map(|w| (w.weapon_type.as_str(), w.issued_count))
    .collect();
  dist.sort();
  assert_eq!(dist, [("Pistol", 1), ("Rifle", 1)]);

  let weekday = t0().weekday().num_days_from_sunday() as u8;
  let nine = agg
    .heatmap
    .iter()
    .find(|c| c.day_of_week == weekday && u32::from(c.hour_of_day) == t0().hour())
    .unwrap();
  assert_eq!(nine.issue_count, 2);

  assert_eq!(agg.top_users[0].army_number, "123");
  assert_eq!(agg.top_users[0].transaction_count, 2);
  assert_eq!(agg.storeman_activity.len(), 1);
  assert_eq!(agg.storeman_activity[0].storeman, "Sgt Lee");
  assert_eq!(agg.storeman_activity[0].return_count, 1);
}

#[tokio::test]
async fn empty_store_has_empty_aggregates() {
  let s = store().await;
  let agg = s.fetch_aggregates().await.unwrap();
  assert!(agg.daily.is_empty());
  assert!(agg.heatmap.is_empty());
  assert!(agg.top_users.is_empty());
}

// ─── Through the ledger ──────────────────────────────────────────────────────

#[tokio::test]
async fn ledger_issue_list_return_scenario() {
  let ledger = Ledger::new(store().await);
  let input = NewIssue {
    army_number: "123".into(),
    rank: "PVT".into(),
    name: "Doe".into(),
    weapon_type: "Rifle".into(),
    butt_number: "B2".into(),
    register_number: "R1".into(),
    ..NewIssue::default()
  };
  ledger.issue(input).await.unwrap();

  let all = ledger.list(None).await.unwrap();
  assert_eq!(all.len(), 1);
  assert!(all[0].is_open());
  assert_eq!(all[0].date_in(), None);

  let closed = ledger.return_weapon(all[0].id, "Sgt Lee").await.unwrap();
  assert_eq!(closed.state.signature_storeman(), Some("Sgt Lee"));
  assert!(closed.date_in().unwrap() >= closed.date_out());
  assert!(matches!(
    ledger.return_weapon(all[0].id, "Sgt Lee").await,
    Err(CoreError::AlreadyReturned(_))
  ));
}

#[tokio::test]
async fn overdue_scenario_through_stats() {
  let ledger = Ledger::new(store().await);
  let input = NewIssue {
    army_number: "123".into(),
    rank: "PVT".into(),
    name: "Doe".into(),
    weapon_type: "Rifle".into(),
    butt_number: "A1".into(),
    register_number: "R1".into(),
    date_out: Some(Utc::now() - TimeDelta::hours(25)),
    ..NewIssue::default()
  };
  ledger.issue(input).await.unwrap();

  let stats = ledger.stats(Utc::now(), &Utc).await.unwrap();
  assert_eq!(stats.overdue_arms, 1);
  assert_eq!(stats.total_issued, 1);
  assert_eq!(stats.weapon_distribution[0].issued_count, 1);
}

// ─── Lock contention on a file-backed store ──────────────────────────────────

struct TempDb(PathBuf);

impl TempDb {
  fn new() -> Self {
    Self(std::env::temp_dir().join(format!("armoury-{}.db", Uuid::new_v4())))
  }
}

impl Drop for TempDb {
  fn drop(&mut self) {
    for suffix in ["", "-wal", "-shm"] {
      let _ = std::fs::remove_file(format!("{}{suffix}", self.0.display()));
    }
  }
}

/// Hold the write lock from a second connection for `hold`; returns once the
/// lock is taken.
fn hold_write_lock(path: &Path, hold: Duration) -> thread::JoinHandle<()> {
  let path = path.to_path_buf();
  let (locked, wait) = mpsc::channel();
  let handle = thread::spawn(move || {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch("BEGIN IMMEDIATE").unwrap();
    locked.send(()).unwrap();
    thread::sleep(hold);
    conn.execute_batch("COMMIT").unwrap();
  });
  wait.recv().unwrap();
  handle
}

async fn contended_ledger(db: &TempDb, busy: Duration) -> Ledger<SqliteStore> {
  let store = SqliteStore::open(&db.0).await.unwrap();
  store.set_busy_timeout(busy).await.unwrap();
  Ledger::with_config(
    store,
    LedgerConfig {
      timeout: Duration::from_millis(500),
      retry: RetryPolicy::never(),
      ..LedgerConfig::default()
    },
  )
}

fn doe_input() -> NewIssue {
  NewIssue {
    army_number: "123".into(),
    rank: "PVT".into(),
    name: "Doe".into(),
    weapon_type: "Rifle".into(),
    butt_number: "B2".into(),
    register_number: "R1".into(),
    ..NewIssue::default()
  }
}

#[tokio::test]
async fn issue_refused_by_busy_store_leaves_nothing_behind() {
  let db = TempDb::new();
  let ledger = contended_ledger(&db, Duration::from_millis(100)).await;
  let mut changes = ledger.subscribe();

  let holder = hold_write_lock(&db.0, Duration::from_millis(1500));
  let result = ledger.issue(doe_input()).await;
  holder.join().unwrap();

  assert!(matches!(result, Err(CoreError::StoreUnavailable(_))), "{result:?}");
  assert!(ledger.list(None).await.unwrap().is_empty());
  assert_eq!(changes.try_changed(), None);
}

#[tokio::test]
async fn issue_slower_than_read_timeout_still_reports_success() {
  let db = TempDb::new();
  let ledger = contended_ledger(&db, Duration::from_secs(5)).await;
  let mut changes = ledger.subscribe();

  // Longer than the 500 ms read timeout, shorter than the busy timeout.
  let holder = hold_write_lock(&db.0, Duration::from_millis(900));
  let tx = ledger.issue(doe_input()).await.unwrap();
  holder.join().unwrap();

  assert!(tx.is_open());
  assert_eq!(ledger.list(None).await.unwrap().len(), 1);
  assert!(changes.try_changed().is_some());
}
