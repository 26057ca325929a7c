//! Time-bounded cache for accessible-set enumeration.
//!
//! Only Owner enumeration is cached: it is an aggregate read over every
//! profile in the directory and the answer is the same for every Owner.
//!
//! # Staleness
//!
//! Entries are refreshed only when their TTL runs out or when a caller
//! invalidates them explicitly. Writes to the directory do **not**
//! invalidate anything, so a state or county added after an entry was
//! filled stays invisible to Owner enumeration for up to one TTL.

use std::{
  collections::{BTreeSet, HashMap},
  sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
  time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  profile::{County, StateCode},
  role::AccessLevel,
};

/// Default time-to-live: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

// ─── Keys and values ─────────────────────────────────────────────────────────

/// Which set an entry holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "set", content = "state", rename_all = "snake_case")]
pub enum SetKind {
  States,
  /// Counties, optionally narrowed to one state.
  Counties(Option<StateCode>),
}

/// Cache key. Owner entries carry no subject id since they are shared by
/// every Owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
  pub level:      AccessLevel,
  pub subject_id: Option<Uuid>,
  pub set:        SetKind,
}

impl CacheKey {
  /// The shared key for an Owner enumeration.
  pub fn owner(set: SetKind) -> Self {
    Self { level: AccessLevel::Owner, subject_id: None, set }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedSet {
  States(BTreeSet<StateCode>),
  Counties(BTreeSet<County>),
}

impl CachedSet {
  pub fn len(&self) -> usize {
    match self {
      CachedSet::States(s) => s.len(),
      CachedSet::Counties(c) => c.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[derive(Debug, Clone)]
struct Entry {
  value:      CachedSet,
  created_at: DateTime<Utc>,
}

/// Summary of one live entry, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
  pub key:        CacheKey,
  pub size:       usize,
  pub created_at: DateTime<Utc>,
  pub expires_at: Option<DateTime<Utc>>,
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Process-wide cache of accessible sets, shared through `Arc`.
///
/// Concurrent misses may recompute the same entry more than once; the last
/// writer wins. The result is deterministic for a given directory state so
/// the duplicate work is harmless.
#[derive(Debug)]
pub struct AccessibleSetCache {
  ttl:     Duration,
  entries: RwLock<HashMap<CacheKey, Entry>>,
}

impl Default for AccessibleSetCache {
  fn default() -> Self { Self::new(DEFAULT_TTL) }
}

impl AccessibleSetCache {
  pub fn new(ttl: Duration) -> Self {
    Self { ttl, entries: RwLock::new(HashMap::new()) }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  /// A fresh entry for `key`, if any.
  pub fn get(&self, key: &CacheKey) -> Option<CachedSet> {
    self.get_at(key, Utc::now())
  }

  pub fn insert(&self, key: CacheKey, value: CachedSet) {
    self.insert_at(key, value, Utc::now());
  }

  pub(crate) fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<CachedSet> {
    let entries = self.read();
    let entry = entries.get(key)?;
    if self.is_expired(entry, now) {
      return None;
    }
    Some(entry.value.clone())
  }

  pub(crate) fn insert_at(&self, key: CacheKey, value: CachedSet, now: DateTime<Utc>) {
    self.write().insert(key, Entry { value, created_at: now });
  }

  /// Drop one entry. Returns `true` if it was present.
  pub fn invalidate(&self, key: &CacheKey) -> bool {
    self.write().remove(key).is_some()
  }

  /// Drop every entry.
  pub fn invalidate_all(&self) {
    self.write().clear();
  }

  /// Number of stored entries, fresh or not.
  pub fn len(&self) -> usize { self.read().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Summaries of the entries that are still fresh.
  pub fn entries(&self) -> Vec<EntryInfo> {
    let now = Utc::now();
    let ttl = TimeDelta::from_std(self.ttl).ok();
    self
      .read()
      .iter()
      .filter(|(_, entry)| !self.is_expired(entry, now))
      .map(|(key, entry)| EntryInfo {
        key:        key.clone(),
        size:       entry.value.len(),
        created_at: entry.created_at,
        expires_at: ttl.and_then(|ttl| entry.created_at.checked_add_signed(ttl)),
      })
      .collect()
  }

  fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
    // A clock that went backwards leaves the entry fresh.
    now
      .signed_duration_since(entry.created_at)
      .to_std()
      .is_ok_and(|age| age >= self.ttl)
  }

  // Entries are plain values, so a panic while holding the lock cannot leave
  // them half-written; recover from poisoning instead of propagating it.
  fn read(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, Entry>> {
    self.entries.read().unwrap_or_else(|e| e.into_inner())
  }

  fn write(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, Entry>> {
    self.entries.write().unwrap_or_else(|e| e.into_inner())
  }
}
