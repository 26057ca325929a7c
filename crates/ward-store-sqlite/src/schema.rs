//! SQL schema for the Ward SQLite directory.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id    TEXT PRIMARY KEY,
    role          TEXT NOT NULL,   -- 'owner' | 'state' | 'county' | 'campaign' | 'vendor'
    password_hash TEXT,            -- argon2 PHC string; NULL disables login
    created_at    TEXT NOT NULL
);

-- At most one profile per subject. Columns a role does not use stay NULL;
-- vendor states live in vendor_states.
CREATE TABLE IF NOT EXISTS profiles (
    subject_id  TEXT PRIMARY KEY REFERENCES subjects(subject_id),
    role        TEXT NOT NULL,
    state       TEXT,
    county      TEXT,
    office_type TEXT,
    district_id TEXT
);

CREATE TABLE IF NOT EXISTS vendor_states (
    subject_id TEXT NOT NULL REFERENCES subjects(subject_id),
    state      TEXT NOT NULL,
    PRIMARY KEY (subject_id, state)
);

-- Reference data: campaign districts and the counties they lie in.
CREATE TABLE IF NOT EXISTS districts (
    district_id TEXT PRIMARY KEY,
    state       TEXT NOT NULL,
    county      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS counties (
    state  TEXT NOT NULL,
    county TEXT NOT NULL,
    PRIMARY KEY (state, county)
);

CREATE INDEX IF NOT EXISTS profiles_state_idx ON profiles(state);

PRAGMA user_version = 1;
";
