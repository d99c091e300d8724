//! Plain-text rendering of ledger records and dashboard figures.

use std::fmt::Write as _;

use armoury_core::{aggregate::DashboardStats, transaction::Transaction};
use chrono::{DateTime, Local, Utc};

fn local(dt: DateTime<Utc>) -> String {
  dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// One line per record: serial, status, weapon, holder, dates.
pub fn transaction_line(tx: &Transaction, now: DateTime<Utc>) -> String {
  let returned = match (tx.date_in(), tx.state.signature_storeman()) {
    (Some(at), Some(by)) => format!("  in {} ({by})", local(at)),
    _ => String::new(),
  };
  format!(
    "#{:<5} {:<8} {} {:<10} {} {} {:<12} out {}{}  [{}]",
    tx.serial_number,
    tx.status(now),
    tx.weapon.weapon_type,
    tx.weapon.butt_number,
    tx.holder.army_number,
    tx.holder.rank,
    tx.holder.name,
    local(tx.date_out()),
    returned,
    tx.id,
  )
}

pub fn stats_report(stats: &DashboardStats) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "as of          {}", local(stats.as_of));
  let _ = writeln!(out, "total issued   {}", stats.total_issued);
  let _ = writeln!(out, "arms in store  {}", stats.arms_in_store);
  let _ = writeln!(out, "returns today  {}", stats.returns_today);
  let _ = writeln!(out, "overdue arms   {}", stats.overdue_arms);

  if !stats.daily_series.is_empty() {
    let _ = writeln!(out, "\ndaily (issued / returned)");
    for d in &stats.daily_series {
      let _ = writeln!(out, "  {}  {:>4} / {:<4}", d.day, d.issued, d.returned);
    }
  }
  if !stats.weapon_distribution.is_empty() {
    let _ = writeln!(out, "\nout by weapon type");
    for w in &stats.weapon_distribution {
      let _ = writeln!(out, "  {:<16} {}", w.weapon_type, w.issued_count);
    }
  }
  if !stats.top_users.is_empty() {
    let _ = writeln!(out, "\ntop users");
    for u in &stats.top_users {
      let _ = writeln!(
        out,
        "  {} {} {:<16} {}",
        u.army_number, u.rank, u.name, u.transaction_count
      );
    }
  }
  if !stats.storeman_activity.is_empty() {
    let _ = writeln!(out, "\nstoreman returns");
    for s in &stats.storeman_activity {
      let _ = writeln!(out, "  {:<16} {}", s.storeman, s.return_count);
    }
  }
  if !stats.maintenance_due.is_empty() {
    let _ = writeln!(out, "\nmaintenance due");
    for m in &stats.maintenance_due {
      let _ = writeln!(out, "  {:<16} {} issues", m.butt_number, m.issue_count);
    }
  }
  if !stats.recent_activity.is_empty() {
    let _ = writeln!(out, "\nrecent");
    for r in &stats.recent_activity {
      let _ = writeln!(out, "  {}", transaction_line(&r.transaction, stats.as_of));
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use armoury_core::transaction::NewIssue;
  use chrono::TimeDelta;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn open_and_closed_lines() {
    let now = Utc::now();
    let tx = NewIssue {
      army_number: "123".into(),
      rank: "PVT".into(),
      name: "Doe".into(),
      weapon_type: "Rifle".into(),
      butt_number: "B2".into(),
      register_number: "R1".into(),
      date_out: Some(now - TimeDelta::hours(30)),
      ..NewIssue::default()
    }
    .validate(now)
    .unwrap()
    .into_transaction(Uuid::new_v4(), 7);

    let open = transaction_line(&tx, now);
    assert!(open.starts_with("#7"));
    assert!(open.contains("overdue"));
    assert!(!open.contains(" in "));

    let closed = tx.close(now, "Sgt Lee").unwrap();
    let line = transaction_line(&closed, now);
    assert!(line.contains("returned"));
    assert!(line.contains("(Sgt Lee)"));
  }
}
