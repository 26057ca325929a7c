//! The policy gate: the entry points request pipelines call.
//!
//! - [`Gate::check`] evaluates a declarative [`Requirement`].
//! - [`Gate::require_access`] runs a handler only after `check` passes.
//! - [`Gate::object_permission`] checks an already-loaded object by the
//!   [`ObjectScope`] it reports.
//!
//! Web frameworks bind these to their own middleware mechanism; see the
//! `ward-http` crate for axum.

use std::{future::Future, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result, Rule,
  cache::AccessibleSetCache,
  directory::ProfileDirectory,
  engine,
  enumerate::Enumerator,
  profile::{County, StateCode},
  resource::ResourceDescriptor,
  role::Role,
  subject::Subject,
};

// ─── Requirement ─────────────────────────────────────────────────────────────

/// What a route or handler demands of the subject. Every field is optional;
/// an empty requirement admits any authenticated subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
  pub minimum_tier:         Option<Role>,
  pub required_state:       Option<StateCode>,
  /// Needs `required_state`; a county on its own denies.
  pub required_county:      Option<County>,
  pub required_campaign_id: Option<Uuid>,
  pub required_vendor_id:   Option<Uuid>,
}

impl Requirement {
  pub fn new() -> Self { Self::default() }

  pub fn minimum_tier(mut self, role: Role) -> Self {
    self.minimum_tier = Some(role);
    self
  }

  pub fn state(mut self, state: StateCode) -> Self {
    self.required_state = Some(state);
    self
  }

  pub fn county(mut self, state: StateCode, county: County) -> Self {
    self.required_state = Some(state);
    self.required_county = Some(county);
    self
  }

  pub fn campaign(mut self, campaign_id: Uuid) -> Self {
    self.required_campaign_id = Some(campaign_id);
    self
  }

  pub fn vendor(mut self, vendor_id: Uuid) -> Self {
    self.required_vendor_id = Some(vendor_id);
    self
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

// ─── Object scopes ───────────────────────────────────────────────────────────

/// What an already-loaded object is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectScope {
  State(StateCode),
  County(StateCode, County),
  Campaign(Uuid),
  Vendor(Uuid),
  /// Owned by a single subject, e.g. a user's own settings.
  OwnedBy(Uuid),
  /// Nothing recognisable; only Owner gets through.
  Unknown,
}

/// Implemented by domain objects that can be checked with
/// [`Gate::object_permission`].
pub trait ProtectedObject {
  fn scope(&self) -> ObjectScope;
}

impl ProtectedObject for ObjectScope {
  fn scope(&self) -> ObjectScope { self.clone() }
}

impl ProtectedObject for ResourceDescriptor {
  fn scope(&self) -> ObjectScope {
    match self {
      ResourceDescriptor::State { state } => ObjectScope::State(state.clone()),
      ResourceDescriptor::County { state, county } => {
        ObjectScope::County(state.clone(), county.clone())
      }
      ResourceDescriptor::Campaign { campaign_id } => ObjectScope::Campaign(*campaign_id),
      ResourceDescriptor::Vendor { vendor_id } => ObjectScope::Vendor(*vendor_id),
    }
  }
}

// ─── Gate ────────────────────────────────────────────────────────────────────

/// Framework-independent access gate over a [`ProfileDirectory`].
pub struct Gate<D> {
  directory:  Arc<D>,
  enumerator: Enumerator<D>,
}

impl<D> Clone for Gate<D> {
  fn clone(&self) -> Self {
    Self {
      directory:  Arc::clone(&self.directory),
      enumerator: self.enumerator.clone(),
    }
  }
}

impl<D> Gate<D>
where
  D: ProfileDirectory,
{
  pub fn new(directory: Arc<D>, cache: Arc<AccessibleSetCache>) -> Self {
    let enumerator = Enumerator::new(Arc::clone(&directory), cache);
    Self { directory, enumerator }
  }

  pub fn directory(&self) -> &D { &self.directory }

  pub fn enumerator(&self) -> &Enumerator<D> { &self.enumerator }

  /// Decide a single resource; see [`engine::decide`].
  pub async fn decide(&self, subject: &Subject, resource: &ResourceDescriptor) -> Result<()> {
    engine::decide(self.directory.as_ref(), subject, resource).await
  }

  /// Evaluate `requirement` for `subject`.
  ///
  /// Order: authentication, minimum tier, state, county, campaign, vendor.
  /// The first failing step decides the error.
  pub async fn check(&self, subject: &Subject, requirement: &Requirement) -> Result<()> {
    if !subject.is_authenticated {
      return Err(Error::Unauthenticated);
    }

    if let Some(required) = requirement.minimum_tier
      && !subject.role.satisfies(required)
    {
      return self.deny(subject, Rule::Tier { required });
    }

    let dir = self.directory.as_ref();

    // A county is meaningless without its state.
    if requirement.required_state.is_none() && requirement.required_county.is_some() {
      return self.deny(subject, Rule::County);
    }

    if let Some(state) = &requirement.required_state {
      if !engine::can_access_state(dir, subject, state).await? {
        return self.deny(subject, Rule::State);
      }
      if let Some(county) = &requirement.required_county
        && !engine::can_access_county(dir, subject, state, county).await?
      {
        return self.deny(subject, Rule::County);
      }
    }

    if let Some(campaign_id) = requirement.required_campaign_id
      && !engine::can_access_campaign_data(dir, subject, campaign_id).await?
    {
      return self.deny(subject, Rule::Campaign);
    }

    if let Some(vendor_id) = requirement.required_vendor_id
      && !engine::can_access_vendor_data(dir, subject, vendor_id).await?
    {
      return self.deny(subject, Rule::Vendor);
    }

    Ok(())
  }

  /// Run `handler` only if `subject` meets `requirement`. On denial the
  /// handler is never called.
  pub async fn require_access<F, Fut, T>(
    &self,
    subject: &Subject,
    requirement: &Requirement,
    handler: F,
  ) -> Result<T>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
  {
    self.check(subject, requirement).await?;
    Ok(handler().await)
  }

  /// Check access to an already-loaded object.
  pub async fn object_permission<O>(&self, subject: &Subject, object: &O) -> Result<()>
  where
    O: ProtectedObject + ?Sized,
  {
    if !subject.is_authenticated {
      return Err(Error::Unauthenticated);
    }

    let resource = match object.scope() {
      ObjectScope::State(state) => ResourceDescriptor::State { state },
      ObjectScope::County(state, county) => ResourceDescriptor::County { state, county },
      ObjectScope::Campaign(campaign_id) => ResourceDescriptor::Campaign { campaign_id },
      ObjectScope::Vendor(vendor_id) => ResourceDescriptor::Vendor { vendor_id },
      ObjectScope::OwnedBy(owner) => {
        if subject.subject_id == owner || subject.is_owner() {
          return Ok(());
        }
        return self.deny(subject, Rule::Object);
      }
      ObjectScope::Unknown => {
        if subject.is_owner() {
          return Ok(());
        }
        return self.deny(subject, Rule::Object);
      }
    };
    self.decide(subject, &resource).await
  }

  fn deny(&self, subject: &Subject, rule: Rule) -> Result<()> {
    debug!(
      subject = %subject.subject_id,
      role = %subject.role,
      %rule,
      "gate denied"
    );
    Err(Error::Forbidden(rule))
  }
}
