//! SQL schema for the Armoury SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per issue event. A row is inserted open (date_in NULL) and closed
-- exactly once; rows are never deleted.
CREATE TABLE IF NOT EXISTS transactions (
    serial_number      INTEGER PRIMARY KEY AUTOINCREMENT,
    id                 TEXT NOT NULL UNIQUE,
    army_number        TEXT NOT NULL,
    rank               TEXT NOT NULL,
    name               TEXT NOT NULL,
    weapon_type        TEXT NOT NULL,
    butt_number        TEXT NOT NULL,
    register_number    TEXT NOT NULL,
    magazine           TEXT,
    bayonet_complete   INTEGER,          -- 0 | 1 | NULL
    remarks            TEXT,
    date_out           TEXT NOT NULL,    -- RFC 3339 UTC, millisecond precision
    date_in            TEXT,             -- NULL while the weapon is out
    signature_storeman TEXT,             -- set together with date_in
    CHECK (date_in IS NULL OR date_in >= date_out),
    CHECK ((date_in IS NULL) = (signature_storeman IS NULL))
);

-- At most one open record per weapon.
CREATE UNIQUE INDEX IF NOT EXISTS transactions_open_butt_idx
    ON transactions(butt_number) WHERE date_in IS NULL;

CREATE INDEX IF NOT EXISTS transactions_date_out_idx ON transactions(date_out);
CREATE INDEX IF NOT EXISTS transactions_date_in_idx  ON transactions(date_in);

CREATE TRIGGER IF NOT EXISTS transactions_closed_immutable
BEFORE UPDATE ON transactions WHEN OLD.date_in IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'closed transactions are immutable');
END;

CREATE TRIGGER IF NOT EXISTS transactions_no_delete
BEFORE DELETE ON transactions
BEGIN
    SELECT RAISE(ABORT, 'transactions are never deleted');
END;

-- ── Aggregate views (UTC buckets) ─────────────────────────────────────────

CREATE VIEW IF NOT EXISTS daily_summary AS
SELECT day, SUM(issued) AS issued, SUM(returned) AS returned
FROM (
    SELECT date(date_out) AS day, 1 AS issued, 0 AS returned FROM transactions
    UNION ALL
    SELECT date(date_in), 0, 1 FROM transactions WHERE date_in IS NOT NULL
)
GROUP BY day;

CREATE VIEW IF NOT EXISTS weapon_distribution AS
SELECT weapon_type, COUNT(*) AS issued_count
FROM transactions
WHERE date_in IS NULL
GROUP BY weapon_type;

CREATE VIEW IF NOT EXISTS activity_heatmap AS
SELECT CAST(strftime('%w', date_out) AS INTEGER) AS day_of_week,
       CAST(strftime('%H', date_out) AS INTEGER) AS hour_of_day,
       COUNT(*)                                   AS issue_count
FROM transactions
GROUP BY day_of_week, hour_of_day;

CREATE VIEW IF NOT EXISTS top_users AS
SELECT army_number, MAX(rank) AS rank, MAX(name) AS name,
       COUNT(*) AS transaction_count
FROM transactions
GROUP BY army_number;

CREATE VIEW IF NOT EXISTS storeman_activity AS
SELECT signature_storeman AS storeman, COUNT(*) AS return_count
FROM transactions
WHERE signature_storeman IS NOT NULL
GROUP BY signature_storeman;

PRAGMA user_version = 1;
";
