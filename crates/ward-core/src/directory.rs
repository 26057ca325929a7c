//! The `ProfileDirectory` trait, the engine's only view of stored data.
//!
//! The trait is implemented by storage backends (e.g. `ward-store-sqlite`).
//! The engine treats every call as a plain dependency: no retries, no
//! timeouts. Callers own both.

use std::{collections::BTreeSet, future::Future};

use uuid::Uuid;

use crate::profile::{AccountProfile, County, StateCode};

/// Read-only lookups over account profiles and the county reference data.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ProfileDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The profile attached to `subject_id`, or `None` if the subject has
  /// none (or does not exist).
  fn resolve_profile(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<AccountProfile>, Self::Error>> + Send + '_;

  /// The county a campaign district lies in. `None` if unknown.
  fn resolve_county_from_district<'a>(
    &'a self,
    district_id: &'a str,
  ) -> impl Future<Output = Result<Option<County>, Self::Error>> + Send + 'a;

  /// Every state referenced by a State, County or Campaign profile.
  ///
  /// An aggregate read; only Owner enumeration calls it.
  fn all_states_across_profiles(
    &self,
  ) -> impl Future<Output = Result<BTreeSet<StateCode>, Self::Error>> + Send + '_;

  /// Every county known within `state`.
  fn all_counties_in_state<'a>(
    &'a self,
    state: &'a StateCode,
  ) -> impl Future<Output = Result<BTreeSet<County>, Self::Error>> + Send + 'a;
}
