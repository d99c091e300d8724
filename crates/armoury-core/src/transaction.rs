//! Transaction records: one row per weapon issue event.
//!
//! A record is created open by an issue and closed exactly once by a return.
//! Whether a weapon is out or in store is derived from [`TransactionState`]
//! alone; there is no separate status column that could disagree with it.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Thresholds ──────────────────────────────────────────────────────────────

/// An open record older than this is overdue.
pub const OVERDUE_AFTER: TimeDelta = TimeDelta::hours(24);

/// Total historical issues at which a weapon is flagged for maintenance.
pub const MAINTENANCE_THRESHOLD: usize = 10;

/// Number of days in the daily issued/returned series.
pub const DAILY_SERIES_DAYS: usize = 7;

/// Length of every "top" list (users, storemen, maintenance, recent).
pub const TOP_N: usize = 5;

// ─── Identity ────────────────────────────────────────────────────────────────

/// The person a weapon is issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
  pub army_number: String,
  pub rank:        String,
  pub name:        String,
}

/// The physical weapon instance. `butt_number` is the de-facto weapon
/// identifier and repeats across historical records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
  pub weapon_type: String,
  pub butt_number: String,
}

// ─── State ───────────────────────────────────────────────────────────────────

/// Whether the weapon on this record is still out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionState {
  Open {
    date_out: DateTime<Utc>,
  },
  Closed {
    date_out:           DateTime<Utc>,
    date_in:            DateTime<Utc>,
    /// The storeman who processed the return.
    signature_storeman: String,
  },
}

impl TransactionState {
  /// Rebuild a state from the nullable columns a store persists.
  ///
  /// `date_in` and `signature_storeman` must be both present or both absent,
  /// and `date_in` may not precede `date_out`.
  pub fn from_columns(
    date_out: DateTime<Utc>,
    date_in: Option<DateTime<Utc>>,
    signature_storeman: Option<String>,
  ) -> Result<Self> {
    match (date_in, signature_storeman) {
      (None, None) => Ok(Self::Open { date_out }),
      (Some(date_in), Some(signature_storeman)) if date_in >= date_out => {
        Ok(Self::Closed { date_out, date_in, signature_storeman })
      }
      (Some(_), Some(_)) => Err(Error::Validation(
        "return timestamp precedes issue timestamp".into(),
      )),
      _ => Err(Error::Validation(
        "return timestamp and storeman signature must be set together".into(),
      )),
    }
  }

  pub fn is_open(&self) -> bool { matches!(self, Self::Open { .. }) }

  pub fn date_out(&self) -> DateTime<Utc> {
    match self {
      Self::Open { date_out } | Self::Closed { date_out, .. } => *date_out,
    }
  }

  pub fn date_in(&self) -> Option<DateTime<Utc>> {
    match self {
      Self::Open { .. } => None,
      Self::Closed { date_in, .. } => Some(*date_in),
    }
  }

  pub fn signature_storeman(&self) -> Option<&str> {
    match self {
      Self::Open { .. } => None,
      Self::Closed { signature_storeman, .. } => Some(signature_storeman),
    }
  }
}

/// Per-row status shown in the recent-activity list.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordStatus {
  Issued,
  Overdue,
  Returned,
}

// ─── Transaction ─────────────────────────────────────────────────────────────

/// A single issue/return record as held by the ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
  pub id:               Uuid,
  /// Store-assigned, monotonically increasing; used for display ordering.
  pub serial_number:    i64,
  #[serde(flatten)]
  pub holder:           Holder,
  #[serde(flatten)]
  pub weapon:           Weapon,
  pub register_number:  String,
  pub magazine:         Option<String>,
  pub bayonet_complete: Option<bool>,
  pub remarks:          Option<String>,
  #[serde(flatten)]
  pub state:            TransactionState,
}

impl Transaction {
  pub fn is_open(&self) -> bool { self.state.is_open() }

  pub fn date_out(&self) -> DateTime<Utc> { self.state.date_out() }

  pub fn date_in(&self) -> Option<DateTime<Utc>> { self.state.date_in() }

  /// An open record whose `date_out` is at least [`OVERDUE_AFTER`] before
  /// `now`. Computed at read time, never stored.
  pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
    self.is_open() && now - self.date_out() >= OVERDUE_AFTER
  }

  pub fn status(&self, now: DateTime<Utc>) -> RecordStatus {
    if !self.is_open() {
      RecordStatus::Returned
    } else if self.is_overdue(now) {
      RecordStatus::Overdue
    } else {
      RecordStatus::Issued
    }
  }

  /// Close this record: the only state transition a record ever makes.
  ///
  /// Fails with [`Error::AlreadyReturned`] on a closed record, and with
  /// [`Error::Validation`] if the storeman is blank or `at` precedes the
  /// issue time.
  pub fn close(mut self, at: DateTime<Utc>, storeman: &str) -> Result<Self> {
    let date_out = match &self.state {
      TransactionState::Closed { .. } => {
        return Err(Error::AlreadyReturned(self.id));
      }
      TransactionState::Open { date_out } => *date_out,
    };

    let storeman = storeman.trim();
    if storeman.is_empty() {
      return Err(Error::Validation("signature_storeman is required".into()));
    }
    if at < date_out {
      return Err(Error::Validation(
        "return timestamp precedes issue timestamp".into(),
      ));
    }

    self.state = TransactionState::Closed {
      date_out,
      date_in: at,
      signature_storeman: storeman.to_owned(),
    };
    Ok(self)
  }
}

// ─── Issue input ─────────────────────────────────────────────────────────────

/// Input to [`crate::ledger::Ledger::issue`], as supplied by a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewIssue {
  pub army_number:      String,
  pub rank:             String,
  pub name:             String,
  pub weapon_type:      String,
  pub butt_number:      String,
  pub register_number:  String,
  #[serde(default)]
  pub magazine:         Option<String>,
  #[serde(default)]
  pub bayonet_complete: Option<bool>,
  #[serde(default)]
  pub remarks:          Option<String>,
  /// Defaults to the time of the issue call.
  #[serde(default)]
  pub date_out:         Option<DateTime<Utc>>,
}

/// A validated issue, ready to be inserted by a
/// [`LedgerStore`](crate::store::LedgerStore). Build one with
/// [`NewIssue::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
  pub holder:           Holder,
  pub weapon:           Weapon,
  pub register_number:  String,
  pub magazine:         Option<String>,
  pub bayonet_complete: Option<bool>,
  pub remarks:          Option<String>,
  pub date_out:         DateTime<Utc>,
}

fn required(field: &'static str, value: String) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  Ok(trimmed.to_owned())
}

fn optional(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

impl NewIssue {
  /// Trim every field, reject blank required fields and a `date_out` later
  /// than `now`.
  pub fn validate(self, now: DateTime<Utc>) -> Result<IssueRecord> {
    let date_out = self.date_out.unwrap_or(now);
    if date_out > now {
      return Err(Error::Validation("date_out is in the future".into()));
    }

    Ok(IssueRecord {
      holder: Holder {
        army_number: required("army_number", self.army_number)?,
        rank:        required("rank", self.rank)?,
        name:        required("name", self.name)?,
      },
      weapon: Weapon {
        weapon_type: required("weapon_type", self.weapon_type)?,
        butt_number: required("butt_number", self.butt_number)?,
      },
      register_number: required("register_number", self.register_number)?,
      magazine: optional(self.magazine),
      bayonet_complete: self.bayonet_complete,
      remarks: optional(self.remarks),
      date_out,
    })
  }
}

impl IssueRecord {
  /// Materialise the open record a store creates for this issue.
  pub fn into_transaction(self, id: Uuid, serial_number: i64) -> Transaction {
    Transaction {
      id,
      serial_number,
      holder: self.holder,
      weapon: self.weapon,
      register_number: self.register_number,
      magazine: self.magazine,
      bayonet_complete: self.bayonet_complete,
      remarks: self.remarks,
      state: TransactionState::Open { date_out: self.date_out },
    }
  }
}
