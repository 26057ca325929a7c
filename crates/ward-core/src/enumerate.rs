//! Accessible-set enumeration, for scoping list queries and filling pickers.
//!
//! For every role except Owner the sets come straight from the subject's
//! own profile. Owner sets are aggregate reads over the whole directory and
//! are served from an [`AccessibleSetCache`].

use std::{collections::BTreeSet, sync::Arc};

use tracing::debug;

use crate::{
  Error, Result,
  cache::{AccessibleSetCache, CacheKey, CachedSet, SetKind},
  directory::ProfileDirectory,
  engine::own_profile,
  profile::{AccountProfile, County, StateCode},
  role::AccessLevel,
  subject::Subject,
};

/// Enumerates the states and counties a subject may see.
pub struct Enumerator<D> {
  directory: Arc<D>,
  cache:     Arc<AccessibleSetCache>,
}

impl<D> Clone for Enumerator<D> {
  fn clone(&self) -> Self {
    Self {
      directory: Arc::clone(&self.directory),
      cache:     Arc::clone(&self.cache),
    }
  }
}

impl<D> Enumerator<D>
where
  D: ProfileDirectory,
{
  pub fn new(directory: Arc<D>, cache: Arc<AccessibleSetCache>) -> Self {
    Self { directory, cache }
  }

  pub fn directory(&self) -> &Arc<D> { &self.directory }

  pub fn cache(&self) -> &Arc<AccessibleSetCache> { &self.cache }

  /// Every state `subject` may see. Empty for an unauthenticated subject or
  /// one without a profile.
  pub async fn accessible_states(&self, subject: &Subject) -> Result<BTreeSet<StateCode>> {
    match subject.access_level() {
      AccessLevel::None => Ok(BTreeSet::new()),
      AccessLevel::Owner => self.owner_states().await,
      _ => Ok(
        own_profile(self.directory.as_ref(), subject)
          .await?
          .map(|p| p.states())
          .unwrap_or_default(),
      ),
    }
  }

  /// Every county `subject` may see, optionally narrowed to `state`.
  ///
  /// County officers see their own county. Every other located role sees
  /// all counties of its accessible states, without the finer county rule
  /// applied by [`crate::engine::can_access_county`].
  pub async fn accessible_counties(
    &self,
    subject: &Subject,
    state: Option<&StateCode>,
  ) -> Result<BTreeSet<County>> {
    let profile = match subject.access_level() {
      AccessLevel::None => return Ok(BTreeSet::new()),
      AccessLevel::Owner => return self.owner_counties(state).await,
      _ => own_profile(self.directory.as_ref(), subject).await?,
    };

    let Some(profile) = profile else {
      return Ok(BTreeSet::new());
    };

    if let AccountProfile::County { state: own, county } = &profile {
      let visible = state.is_none_or(|s| s == own);
      return Ok(if visible { BTreeSet::from([county.clone()]) } else { BTreeSet::new() });
    }

    let states = profile
      .states()
      .into_iter()
      .filter(|s| state.is_none_or(|wanted| wanted == s));
    self.counties_of(states).await
  }

  // ─── Owner (cached) ─────────────────────────────────────────────────────────

  async fn owner_states(&self) -> Result<BTreeSet<StateCode>> {
    let key = CacheKey::owner(SetKind::States);
    if let Some(CachedSet::States(states)) = self.cache.get(&key) {
      return Ok(states);
    }

    let states = self
      .directory
      .all_states_across_profiles()
      .await
      .map_err(Error::resolution)?;
    debug!(count = states.len(), "refreshed owner state set");
    self.cache.insert(key, CachedSet::States(states.clone()));
    Ok(states)
  }

  async fn owner_counties(&self, state: Option<&StateCode>) -> Result<BTreeSet<County>> {
    let key = CacheKey::owner(SetKind::Counties(state.cloned()));
    if let Some(CachedSet::Counties(counties)) = self.cache.get(&key) {
      return Ok(counties);
    }

    let counties = match state {
      Some(s) => self.counties_of([s.clone()]).await?,
      None => {
        let states = self.owner_states().await?;
        self.counties_of(states).await?
      }
    };
    debug!(
      state = state.map(StateCode::as_str),
      count = counties.len(),
      "refreshed owner county set"
    );
    self.cache.insert(key, CachedSet::Counties(counties.clone()));
    Ok(counties)
  }

  async fn counties_of(
    &self,
    states: impl IntoIterator<Item = StateCode>,
  ) -> Result<BTreeSet<County>> {
    let mut counties = BTreeSet::new();
    for state in states {
      counties.extend(
        self
          .directory
          .all_counties_in_state(&state)
          .await
          .map_err(Error::resolution)?,
      );
    }
    Ok(counties)
  }
}
