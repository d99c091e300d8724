//! [`SqliteStore`]: the SQLite implementation of [`LedgerStore`].

use std::{path::Path, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, ffi};
use uuid::Uuid;

use armoury_core::{
  store::LedgerStore,
  transaction::{IssueRecord, Transaction},
  views::{AggregateRows, HeatmapCell, StoremanActivity, UserActivity, WeaponTypeCount},
};

use crate::{
  Result,
  encode::{COLUMNS, RawDailyCount, RawTransaction, encode_dt, encode_uuid},
  error::Error,
  schema::SCHEMA,
};

type CoreError = armoury_core::Error;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ledger store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// How long a statement waits on another connection's lock before failing
  /// with `SQLITE_BUSY`. Keep it below the ledger's read timeout so a write
  /// always returns a definite outcome.
  pub async fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(timeout)?;
        Ok(())
      })
      .await?;
    tracing::debug!(?timeout, "busy timeout set");
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("ledger schema ready");
    Ok(())
  }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = Error;

  async fn list_transactions(&self) -> Result<Vec<Transaction>> {
    let raws: Vec<RawTransaction> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COLUMNS} FROM transactions ORDER BY serial_number DESC"
        ))?;
        let rows = stmt
          .query_map([], RawTransaction::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTransaction::into_transaction).collect()
  }

  async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTransaction> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COLUMNS} FROM transactions WHERE id = ?1"),
              rusqlite::params![id_str],
              RawTransaction::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTransaction::into_transaction).transpose()
  }

  async fn insert_transaction(&self, record: IssueRecord) -> Result<Transaction> {
    let butt_number = record.weapon.butt_number.clone();
    let id_str      = encode_uuid(Uuid::new_v4());
    let date_out    = encode_dt(record.date_out);

    // `None` means the partial unique index refused a second open record.
    let raw: Option<RawTransaction> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO transactions (
             id, army_number, rank, name, weapon_type, butt_number,
             register_number, magazine, bayonet_complete, remarks, date_out
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            id_str,
            record.holder.army_number,
            record.holder.rank,
            record.holder.name,
            record.weapon.weapon_type,
            record.weapon.butt_number,
            record.register_number,
            record.magazine,
            record.bayonet_complete,
            record.remarks,
            date_out,
          ],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => return Ok(None),
          Err(e) => return Err(e.into()),
        }

        let serial = conn.last_insert_rowid();
        let raw = conn.query_row(
          &format!("SELECT {COLUMNS} FROM transactions WHERE serial_number = ?1"),
          rusqlite::params![serial],
          RawTransaction::from_row,
        )?;
        Ok(Some(raw))
      })
      .await?;

    match raw {
      Some(raw) => raw.into_transaction(),
      None => Err(CoreError::AlreadyIssued(butt_number).into()),
    }
  }

  async fn close_transaction(
    &self,
    id: Uuid,
    date_in: DateTime<Utc>,
    signature_storeman: String,
  ) -> Result<Transaction> {
    let id_str      = encode_uuid(id);
    let date_in_str = encode_dt(date_in);
    let storeman    = signature_storeman.clone();

    // The guarded UPDATE is the compare-and-set: of two racing returns only
    // one sees `date_in IS NULL`.
    let (changed, raw): (usize, Option<RawTransaction>) = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE transactions
              SET date_in = ?2, signature_storeman = ?3
            WHERE id = ?1 AND date_in IS NULL AND date_out <= ?2",
          rusqlite::params![id_str, date_in_str, storeman],
        )?;
        let raw = conn
          .query_row(
            &format!("SELECT {COLUMNS} FROM transactions WHERE id = ?1"),
            rusqlite::params![id_str],
            RawTransaction::from_row,
          )
          .optional()?;
        Ok((changed, raw))
      })
      .await?;

    let tx = raw.ok_or(CoreError::NotFound(id))?.into_transaction()?;
    if changed == 1 {
      return Ok(tx);
    }

    // Refused: replay the transition on the stored row to report why.
    match tx.close(date_in, &signature_storeman) {
      Err(e) => Err(e.into()),
      Ok(_) => Err(CoreError::AlreadyReturned(id).into()),
    }
  }

  async fn fetch_aggregates(&self) -> Result<AggregateRows> {
    let (daily, weapon_types, heatmap, top_users, storeman_activity) = self
      .conn
      .call(|conn| {
        let daily = conn
          .prepare("SELECT day, issued, returned FROM daily_summary ORDER BY day")?
          .query_map([], |row| {
            Ok(RawDailyCount {
              day:      row.get(0)?,
              issued:   row.get(1)?,
              returned: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let weapon_types = conn
          .prepare("SELECT weapon_type, issued_count FROM weapon_distribution")?
          .query_map([], |row| {
            Ok(WeaponTypeCount {
              weapon_type:  row.get(0)?,
              issued_count: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let heatmap = conn
          .prepare("SELECT day_of_week, hour_of_day, issue_count FROM activity_heatmap")?
          .query_map([], |row| {
            Ok(HeatmapCell {
              day_of_week: row.get(0)?,
              hour_of_day: row.get(1)?,
              issue_count: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let top_users = conn
          .prepare(
            "SELECT army_number, rank, name, transaction_count FROM top_users
             ORDER BY transaction_count DESC, army_number",
          )?
          .query_map([], |row| {
            Ok(UserActivity {
              army_number:       row.get(0)?,
              rank:              row.get(1)?,
              name:              row.get(2)?,
              transaction_count: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let storeman_activity = conn
          .prepare(
            "SELECT storeman, return_count FROM storeman_activity
             ORDER BY return_count DESC, storeman",
          )?
          .query_map([], |row| {
            Ok(StoremanActivity {
              storeman:     row.get(0)?,
              return_count: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((daily, weapon_types, heatmap, top_users, storeman_activity))
      })
      .await?;

    Ok(AggregateRows {
      daily: daily
        .into_iter()
        .map(RawDailyCount::into_daily_count)
        .collect::<Result<_>>()?,
      weapon_types,
      heatmap,
      top_users,
      storeman_activity,
    })
  }
}
