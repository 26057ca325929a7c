//! [`SqliteDirectory`], the SQLite implementation of [`ProfileDirectory`].

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;
use ward_core::{
  directory::ProfileDirectory,
  profile::{AccountProfile, County, StateCode},
  role::Role,
  subject::Subject,
};

use crate::{
  Error, Result,
  encode::{RawAccount, RawProfile, encode_dt, encode_profile, encode_role, encode_uuid},
  schema::SCHEMA,
};

// ─── Account ─────────────────────────────────────────────────────────────────

/// A stored subject: identity, role and login credentials.
#[derive(Debug, Clone)]
pub struct Account {
  pub subject_id:    Uuid,
  pub role:          Role,
  /// argon2 PHC string; `None` if the account cannot log in.
  pub password_hash: Option<String>,
  pub created_at:    DateTime<Utc>,
}

impl Account {
  /// The authenticated subject for this account.
  pub fn subject(&self) -> Subject { Subject::new(self.subject_id, self.role) }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Ward profile directory backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteDirectory {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDirectory {
  /// Open (or create) a directory at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory directory, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  /// Create and persist a new subject with the given role.
  pub async fn add_subject(
    &self,
    role: Role,
    password_hash: Option<String>,
  ) -> Result<Account> {
    self.add_subject_with_id(Uuid::new_v4(), role, password_hash).await
  }

  /// Create and persist a subject with a caller-supplied UUID.
  pub async fn add_subject_with_id(
    &self,
    subject_id: Uuid,
    role: Role,
    password_hash: Option<String>,
  ) -> Result<Account> {
    let account = Account {
      subject_id,
      role,
      password_hash,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(account.subject_id);
    let role_str = encode_role(role);
    let hash     = account.password_hash.clone();
    let at_str   = encode_dt(account.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (subject_id, role, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, role_str, hash, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(subject = %account.subject_id, %role, "created subject");
    Ok(account)
  }

  /// Retrieve an account by UUID. Returns `None` if not found.
  pub async fn get_subject(&self, subject_id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(subject_id);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT subject_id, role, password_hash, created_at
               FROM subjects WHERE subject_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawAccount {
                  subject_id:    row.get(0)?,
                  role:          row.get(1)?,
                  password_hash: row.get(2)?,
                  created_at:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  /// The subject and password hash to verify a login against. `None` if the
  /// subject does not exist or has no password set.
  pub async fn credentials(&self, subject_id: Uuid) -> Result<Option<(Subject, String)>> {
    let account = self.get_subject(subject_id).await?;
    Ok(account.and_then(|a| {
      let subject = a.subject();
      a.password_hash.map(|hash| (subject, hash))
    }))
  }

  /// Attach `profile` to `subject_id`, replacing any existing profile.
  ///
  /// The profile variant must match the subject's role.
  pub async fn set_profile(
    &self,
    subject_id: Uuid,
    profile: &AccountProfile,
  ) -> Result<()> {
    let account = self
      .get_subject(subject_id)
      .await?
      .ok_or(Error::SubjectNotFound(subject_id))?;
    if account.role != profile.role() {
      return Err(Error::RoleMismatch {
        subject_id,
        role: account.role,
        profile: profile.role(),
      });
    }

    let id_str = encode_uuid(subject_id);
    let cols   = encode_profile(profile);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM vendor_states WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "INSERT OR REPLACE INTO profiles
             (subject_id, role, state, county, office_type, district_id)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            cols.role,
            cols.state,
            cols.county,
            cols.office_type,
            cols.district_id,
          ],
        )?;
        for state in &cols.vendor_states {
          tx.execute(
            "INSERT INTO vendor_states (subject_id, state) VALUES (?1, ?2)",
            rusqlite::params![id_str, state],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reference data ────────────────────────────────────────────────────────

  /// Record the county a campaign district lies in. Also registers the
  /// county under its state.
  pub async fn add_district(
    &self,
    district_id: &str,
    state: &StateCode,
    county: &County,
  ) -> Result<()> {
    let district = district_id.to_owned();
    let state    = state.to_string();
    let county   = county.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO districts (district_id, state, county)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![district, state, county],
        )?;
        conn.execute(
          "INSERT OR IGNORE INTO counties (state, county) VALUES (?1, ?2)",
          rusqlite::params![state, county],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Register a county under `state`. Idempotent.
  pub async fn add_county(&self, state: &StateCode, county: &County) -> Result<()> {
    let state  = state.to_string();
    let county = county.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO counties (state, county) VALUES (?1, ?2)",
          rusqlite::params![state, county],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_profile(&self, subject_id: Uuid) -> Result<Option<AccountProfile>> {
    let id_str = encode_uuid(subject_id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT role, state, county, office_type, district_id
             FROM profiles WHERE subject_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawProfile {
                role:          row.get(0)?,
                state:         row.get(1)?,
                county:        row.get(2)?,
                office_type:   row.get(3)?,
                district_id:   row.get(4)?,
                vendor_states: Vec::new(),
              })
            },
          )
          .optional()?;

        let Some(mut raw) = row else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT state FROM vendor_states WHERE subject_id = ?1 ORDER BY state",
        )?;
        raw.vendor_states = stmt
          .query_map(rusqlite::params![id_str], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(|r| r.into_profile(subject_id)).transpose()
  }
}

// ─── ProfileDirectory impl ───────────────────────────────────────────────────

impl ProfileDirectory for SqliteDirectory {
  type Error = Error;

  async fn resolve_profile(&self, subject_id: Uuid) -> Result<Option<AccountProfile>> {
    self.load_profile(subject_id).await
  }

  async fn resolve_county_from_district(&self, district_id: &str) -> Result<Option<County>> {
    let district = district_id.to_owned();

    let county: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT county FROM districts WHERE district_id = ?1",
              rusqlite::params![district],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(county.map(County::new))
  }

  async fn all_states_across_profiles(&self) -> Result<BTreeSet<StateCode>> {
    let raw: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT state FROM profiles
           WHERE role IN ('state', 'county', 'campaign') AND state IS NOT NULL",
        )?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    raw
      .iter()
      .map(|s| StateCode::parse(s).map_err(Error::from))
      .collect()
  }

  async fn all_counties_in_state(&self, state: &StateCode) -> Result<BTreeSet<County>> {
    let state_str = state.to_string();

    let raw: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT county FROM counties WHERE state = ?1
           UNION
           SELECT county FROM profiles
           WHERE role = 'county' AND state = ?1 AND county IS NOT NULL",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![state_str], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raw.into_iter().map(County::new).collect())
  }
}
