//! Encoding and decoding helpers between ledger types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with millisecond precision
//! and a `Z` suffix, so that string comparison orders them chronologically
//! and SQLite's own date functions can read them. UUIDs are stored as
//! hyphenated lowercase strings.

use armoury_core::{
  transaction::{Holder, Transaction, TransactionState, Weapon},
  views::DailyCount,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

/// Column list shared by every `SELECT` that reads whole records.
pub const COLUMNS: &str = "serial_number, id, army_number, rank, name, \
                           weapon_type, butt_number, register_number, \
                           magazine, bayonet_complete, remarks, \
                           date_out, date_in, signature_storeman";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_day(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `transactions` row, in [`COLUMNS`] order.
pub struct RawTransaction {
  pub serial_number:      i64,
  pub id:                 String,
  pub army_number:        String,
  pub rank:               String,
  pub name:               String,
  pub weapon_type:        String,
  pub butt_number:        String,
  pub register_number:    String,
  pub magazine:           Option<String>,
  pub bayonet_complete:   Option<bool>,
  pub remarks:            Option<String>,
  pub date_out:           String,
  pub date_in:            Option<String>,
  pub signature_storeman: Option<String>,
}

impl RawTransaction {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      serial_number:      row.get(0)?,
      id:                 row.get(1)?,
      army_number:        row.get(2)?,
      rank:               row.get(3)?,
      name:               row.get(4)?,
      weapon_type:        row.get(5)?,
      butt_number:        row.get(6)?,
      register_number:    row.get(7)?,
      magazine:           row.get(8)?,
      bayonet_complete:   row.get(9)?,
      remarks:            row.get(10)?,
      date_out:           row.get(11)?,
      date_in:            row.get(12)?,
      signature_storeman: row.get(13)?,
    })
  }

  pub fn into_transaction(self) -> Result<Transaction> {
    let date_out = decode_dt(&self.date_out)?;
    let date_in = self.date_in.as_deref().map(decode_dt).transpose()?;
    let state =
      TransactionState::from_columns(date_out, date_in, self.signature_storeman)
        .map_err(|e| {
          armoury_core::Error::Corrupt(format!("transaction {}: {e}", self.id))
        })?;

    Ok(Transaction {
      id: decode_uuid(&self.id)?,
      serial_number: self.serial_number,
      holder: Holder {
        army_number: self.army_number,
        rank:        self.rank,
        name:        self.name,
      },
      weapon: Weapon {
        weapon_type: self.weapon_type,
        butt_number: self.butt_number,
      },
      register_number: self.register_number,
      magazine: self.magazine,
      bayonet_complete: self.bayonet_complete,
      remarks: self.remarks,
      state,
    })
  }
}

/// Raw `daily_summary` row; `day` is SQLite's `YYYY-MM-DD`.
pub struct RawDailyCount {
  pub day:      String,
  pub issued:   u32,
  pub returned: u32,
}

impl RawDailyCount {
  pub fn into_daily_count(self) -> Result<DailyCount> {
    Ok(DailyCount {
      day:      decode_day(&self.day)?,
      issued:   self.issued,
      returned: self.returned,
    })
  }
}
