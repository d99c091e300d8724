//! Rows of the store's pre-aggregated read-only views.
//!
//! These are returned verbatim by
//! [`LedgerStore::fetch_aggregates`](crate::store::LedgerStore::fetch_aggregates);
//! interpretation (ordering, truncation, densifying) happens in
//! [`crate::aggregate`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the `daily_summary` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
  pub day:      NaiveDate,
  pub issued:   u32,
  pub returned: u32,
}

/// One row of the `weapon_distribution` view: currently issued records per
/// weapon type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponTypeCount {
  pub weapon_type:  String,
  pub issued_count: u32,
}

/// One bucket of the `activity_heatmap` view. Buckets with no issues are
/// absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
  /// 0 = Sunday … 6 = Saturday.
  pub day_of_week: u8,
  /// 0–23.
  pub hour_of_day: u8,
  pub issue_count: u32,
}

/// One row of the `top_users` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivity {
  pub army_number:       String,
  pub rank:              String,
  pub name:              String,
  pub transaction_count: u32,
}

/// One row of the `storeman_activity` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoremanActivity {
  pub storeman:     String,
  pub return_count: u32,
}

/// Everything [`LedgerStore::fetch_aggregates`](crate::store::LedgerStore::fetch_aggregates)
/// returns, one field per view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRows {
  pub daily:             Vec<DailyCount>,
  pub weapon_types:      Vec<WeaponTypeCount>,
  pub heatmap:           Vec<HeatmapCell>,
  pub top_users:         Vec<UserActivity>,
  pub storeman_activity: Vec<StoremanActivity>,
}
