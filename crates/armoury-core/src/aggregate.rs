//! Dashboard statistics derived from a ledger snapshot.
//!
//! Every function here is pure: the same records, view rows, `now` and
//! timezone always give the same output. Nothing is cached between calls.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  transaction::{
    DAILY_SERIES_DAYS, MAINTENANCE_THRESHOLD, RecordStatus, TOP_N, Transaction,
  },
  views::{
    AggregateRows, DailyCount, HeatmapCell, StoremanActivity, UserActivity,
    WeaponTypeCount,
  },
};

/// Issue counts bucketed by weekday (0 = Sunday) then hour of day.
pub type Heatmap = [[u32; 24]; 7];

/// A weapon whose total issue count reached [`MAINTENANCE_THRESHOLD`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceDue {
  pub butt_number: String,
  pub issue_count: usize,
}

/// A recent record with its derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
  pub transaction: Transaction,
  pub status:      RecordStatus,
}

/// Everything the dashboard shows, computed in one pass over a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
  pub as_of:               DateTime<Utc>,
  pub total_issued:        usize,
  /// Heuristic, not an inventory count: see [`arms_in_store`].
  pub arms_in_store:       usize,
  pub returns_today:       usize,
  pub overdue_arms:        usize,
  pub daily_series:        Vec<DailyCount>,
  pub weapon_distribution: Vec<WeaponTypeCount>,
  pub heatmap:             Heatmap,
  pub top_users:           Vec<UserActivity>,
  pub storeman_activity:   Vec<StoremanActivity>,
  pub maintenance_due:     Vec<MaintenanceDue>,
  pub recent_activity:     Vec<RecentActivity>,
}

/// Compute every dashboard figure. "Today" is the calendar day of `now` in
/// `tz`.
pub fn summarize<Tz: TimeZone>(
  records: &[Transaction],
  aggregates: &AggregateRows,
  now: DateTime<Utc>,
  tz: &Tz,
) -> DashboardStats {
  DashboardStats {
    as_of:               now,
    total_issued:        total_issued(records),
    arms_in_store:       arms_in_store(records),
    returns_today:       returns_today(records, now, tz),
    overdue_arms:        overdue_arms(records, now),
    daily_series:        daily_series(&aggregates.daily),
    weapon_distribution: weapon_distribution(&aggregates.weapon_types),
    heatmap:             heatmap(&aggregates.heatmap),
    top_users:           top_users(&aggregates.top_users),
    storeman_activity:   storeman_activity(&aggregates.storeman_activity),
    maintenance_due:     maintenance_due(records),
    recent_activity:     recent_activity(records, now),
  }
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// Open records.
pub fn total_issued(records: &[Transaction]) -> usize {
  records.iter().filter(|tx| tx.is_open()).count()
}

/// `max(0, distinct butt numbers − open records)`.
///
/// Treats every butt number ever seen as the fleet size, so weapons that
/// were written off still count and weapons never issued do not.
pub fn arms_in_store(records: &[Transaction]) -> usize {
  let fleet: HashSet<&str> = records
    .iter()
    .map(|tx| tx.weapon.butt_number.as_str())
    .collect();
  fleet.len().saturating_sub(total_issued(records))
}

/// Closed records whose `date_in` falls on today's date in `tz`.
pub fn returns_today<Tz: TimeZone>(
  records: &[Transaction],
  now: DateTime<Utc>,
  tz: &Tz,
) -> usize {
  let today = now.with_timezone(tz).date_naive();
  records
    .iter()
    .filter_map(Transaction::date_in)
    .filter(|date_in| date_in.with_timezone(tz).date_naive() == today)
    .count()
}

pub fn overdue_arms(records: &[Transaction], now: DateTime<Utc>) -> usize {
  records.iter().filter(|tx| tx.is_overdue(now)).count()
}

// ─── View interpretation ─────────────────────────────────────────────────────

/// The most recent [`DAILY_SERIES_DAYS`] days present, oldest first.
pub fn daily_series(rows: &[DailyCount]) -> Vec<DailyCount> {
  let mut rows = rows.to_vec();
  rows.sort_by_key(|r| r.day);
  let skip = rows.len().saturating_sub(DAILY_SERIES_DAYS);
  rows.split_off(skip)
}

/// Issued counts per weapon type, largest first.
pub fn weapon_distribution(rows: &[WeaponTypeCount]) -> Vec<WeaponTypeCount> {
  let mut rows: Vec<_> = rows.iter().filter(|r| r.issued_count > 0).cloned().collect();
  rows.sort_by(|a, b| {
    b.issued_count
      .cmp(&a.issued_count)
      .then_with(|| a.weapon_type.cmp(&b.weapon_type))
  });
  rows
}

/// Dense weekday × hour grid; absent buckets are zero and out-of-range ones
/// are dropped.
pub fn heatmap(cells: &[HeatmapCell]) -> Heatmap {
  let mut grid = [[0_u32; 24]; 7];
  for cell in cells {
    let (day, hour) = (usize::from(cell.day_of_week), usize::from(cell.hour_of_day));
    if day < 7 && hour < 24 {
      grid[day][hour] += cell.issue_count;
    }
  }
  grid
}

pub fn top_users(rows: &[UserActivity]) -> Vec<UserActivity> {
  let mut rows = rows.to_vec();
  rows.sort_by(|a, b| {
    b.transaction_count
      .cmp(&a.transaction_count)
      .then_with(|| a.army_number.cmp(&b.army_number))
  });
  rows.truncate(TOP_N);
  rows
}

pub fn storeman_activity(rows: &[StoremanActivity]) -> Vec<StoremanActivity> {
  let mut rows = rows.to_vec();
  rows.sort_by(|a, b| {
    b.return_count
      .cmp(&a.return_count)
      .then_with(|| a.storeman.cmp(&b.storeman))
  });
  rows.truncate(TOP_N);
  rows
}

// ─── Record scans ────────────────────────────────────────────────────────────

/// Butt numbers with at least [`MAINTENANCE_THRESHOLD`] historical issues,
/// open or closed, highest count first.
pub fn maintenance_due(records: &[Transaction]) -> Vec<MaintenanceDue> {
  let mut counts: HashMap<&str, usize> = HashMap::new();
  for tx in records {
    *counts.entry(tx.weapon.butt_number.as_str()).or_default() += 1;
  }

  let mut due: Vec<MaintenanceDue> = counts
    .into_iter()
    .filter(|&(_, n)| n >= MAINTENANCE_THRESHOLD)
    .map(|(butt, n)| MaintenanceDue { butt_number: butt.to_owned(), issue_count: n })
    .collect();
  due.sort_by(|a, b| {
    b.issue_count
      .cmp(&a.issue_count)
      .then_with(|| a.butt_number.cmp(&b.butt_number))
  });
  due.truncate(TOP_N);
  due
}

/// The [`TOP_N`] most recently issued records.
pub fn recent_activity(records: &[Transaction], now: DateTime<Utc>) -> Vec<RecentActivity> {
  let mut recent: Vec<&Transaction> = records.iter().collect();
  recent.sort_by(|a, b| {
    b.date_out()
      .cmp(&a.date_out())
      .then_with(|| b.serial_number.cmp(&a.serial_number))
  });
  recent
    .into_iter()
    .take(TOP_N)
    .map(|tx| RecentActivity { transaction: tx.clone(), status: tx.status(now) })
    .collect()
}
