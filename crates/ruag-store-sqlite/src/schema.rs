//! SQL schema for the RUAG SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Registration cards. Upserted on re-registration.
CREATE TABLE IF NOT EXISTS profiles (
    person_id   TEXT PRIMARY KEY,   -- 8-digit national id
    full_name   TEXT NOT NULL,
    area        TEXT NOT NULL,
    photo_ref   TEXT,
    updated_at  TEXT NOT NULL
);

-- One row per person per local day. Only check_out_time and note are ever
-- updated; rows are never deleted here.
CREATE TABLE IF NOT EXISTS attendance_records (
    id               TEXT PRIMARY KEY,
    person_id        TEXT NOT NULL,
    full_name        TEXT NOT NULL,
    area             TEXT NOT NULL,
    photo_ref        TEXT,
    calendar_date    TEXT NOT NULL,   -- YYYY-MM-DD, site-local
    check_in_time    TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    check_in_status  TEXT NOT NULL,
    check_out_time   TEXT,
    note             TEXT,
    UNIQUE (person_id, calendar_date),
    CHECK  (check_in_status IN ('ON_TIME', 'LATE'))
);

-- Write-once badges.
CREATE TABLE IF NOT EXISTS achievement_unlocks (
    person_id       TEXT NOT NULL,
    achievement_id  TEXT NOT NULL,
    unlocked_at     TEXT NOT NULL,
    UNIQUE (person_id, achievement_id)
);

CREATE INDEX IF NOT EXISTS records_date_idx   ON attendance_records(calendar_date);
CREATE INDEX IF NOT EXISTS records_person_idx ON attendance_records(person_id, calendar_date);

PRAGMA user_version = 1;
";
