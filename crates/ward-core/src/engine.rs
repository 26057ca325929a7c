//! The access decision engine.
//!
//! One decision function per resource kind, all with the same shape: Owner
//! is allowed unconditionally, everyone else must match on their own
//! profile, and anything that cannot be resolved is denied. The functions
//! hold no state and can be called concurrently without coordination.
//!
//! `Ok(false)` is a denial. `Err(Error::Resolution(_))` means a directory
//! lookup failed; callers must treat it as a denial as well.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  directory::ProfileDirectory,
  profile::{AccountProfile, County, OfficeType, StateCode},
  resource::ResourceDescriptor,
  role::AccessLevel,
  subject::Subject,
};

// ─── Profile helpers ─────────────────────────────────────────────────────────

/// The subject's own profile, or `None` if it is unauthenticated, has no
/// profile, or has a profile that does not belong to its role.
pub(crate) async fn own_profile<D>(
  dir: &D,
  subject: &Subject,
) -> Result<Option<AccountProfile>>
where
  D: ProfileDirectory,
{
  if !subject.is_authenticated {
    return Ok(None);
  }

  let profile = dir
    .resolve_profile(subject.subject_id)
    .await
    .map_err(Error::resolution)?;

  match profile {
    Some(p) if p.role() != subject.role => {
      warn!(
        subject = %subject.subject_id,
        role = %subject.role,
        profile_role = %p.role(),
        "profile does not match subject role; ignoring it"
      );
      Ok(None)
    }
    other => Ok(other),
  }
}

/// The county a campaign has a claim on: only county-office campaigns with
/// a resolvable district have one.
async fn campaign_county<D>(
  dir: &D,
  office_type: OfficeType,
  district_id: Option<&str>,
) -> Result<Option<County>>
where
  D: ProfileDirectory,
{
  if office_type != OfficeType::County {
    return Ok(None);
  }
  let Some(district_id) = district_id else {
    return Ok(None);
  };
  dir
    .resolve_county_from_district(district_id)
    .await
    .map_err(Error::resolution)
}

// ─── Decisions ───────────────────────────────────────────────────────────────

/// Whether `subject` may see data scoped to `state`.
pub async fn can_access_state<D>(
  dir: &D,
  subject: &Subject,
  state: &StateCode,
) -> Result<bool>
where
  D: ProfileDirectory,
{
  match subject.access_level() {
    AccessLevel::None => return Ok(false),
    AccessLevel::Owner => return Ok(true),
    _ => {}
  }

  let allowed = match own_profile(dir, subject).await? {
    Some(AccountProfile::Vendor { states_served }) => states_served.contains(state),
    // County officers and campaigns see state-level aggregates of their own
    // state.
    Some(profile) => profile.home_state() == Some(state),
    None => false,
  };
  Ok(allowed)
}

/// Whether `subject` may see data scoped to `county` within `state`.
pub async fn can_access_county<D>(
  dir: &D,
  subject: &Subject,
  state: &StateCode,
  county: &County,
) -> Result<bool>
where
  D: ProfileDirectory,
{
  match subject.access_level() {
    AccessLevel::None => return Ok(false),
    AccessLevel::Owner => return Ok(true),
    _ => {}
  }

  let allowed = match own_profile(dir, subject).await? {
    Some(AccountProfile::State { state: own }) => own == *state,
    Some(AccountProfile::County { state: own, county: own_county }) => {
      own == *state && own_county == *county
    }
    Some(AccountProfile::Campaign { state: own, office_type, district_id }) => {
      own == *state
        && campaign_county(dir, office_type, district_id.as_deref())
          .await?
          .is_some_and(|c| c == *county)
    }
    // Vendors are not narrowed below the state.
    Some(AccountProfile::Vendor { states_served }) => states_served.contains(state),
    Some(AccountProfile::Owner) | None => false,
  };
  Ok(allowed)
}

/// Whether `subject` may see the data of the campaign owned by
/// `campaign_id`.
///
/// A subject always reaches its own record, without any lookup.
pub async fn can_access_campaign_data<D>(
  dir: &D,
  subject: &Subject,
  campaign_id: Uuid,
) -> Result<bool>
where
  D: ProfileDirectory,
{
  if !subject.is_authenticated {
    return Ok(false);
  }
  if subject.subject_id == campaign_id || subject.is_owner() {
    return Ok(true);
  }

  let target = dir
    .resolve_profile(campaign_id)
    .await
    .map_err(Error::resolution)?;
  let Some(AccountProfile::Campaign { state: target_state, office_type, district_id }) =
    target
  else {
    debug!(%campaign_id, "target is not a campaign; denying");
    return Ok(false);
  };

  let allowed = match own_profile(dir, subject).await? {
    Some(AccountProfile::State { state }) => state == target_state,
    Some(AccountProfile::County { state, county }) => {
      state == target_state
        && campaign_county(dir, office_type, district_id.as_deref())
          .await?
          .is_some_and(|c| c == county)
    }
    Some(AccountProfile::Vendor { states_served }) => {
      states_served.contains(&target_state)
    }
    Some(AccountProfile::Campaign { .. } | AccountProfile::Owner) | None => false,
  };
  Ok(allowed)
}

/// Whether `subject` may see the data of the vendor owned by `vendor_id`.
pub async fn can_access_vendor_data<D>(
  dir: &D,
  subject: &Subject,
  vendor_id: Uuid,
) -> Result<bool>
where
  D: ProfileDirectory,
{
  if !subject.is_authenticated {
    return Ok(false);
  }
  if subject.subject_id == vendor_id || subject.is_owner() {
    return Ok(true);
  }

  let target = dir
    .resolve_profile(vendor_id)
    .await
    .map_err(Error::resolution)?;
  let Some(AccountProfile::Vendor { states_served }) = target else {
    debug!(%vendor_id, "target is not a vendor; denying");
    return Ok(false);
  };

  let allowed = match own_profile(dir, subject).await? {
    Some(AccountProfile::Vendor { .. } | AccountProfile::Owner) | None => false,
    Some(profile) => profile
      .home_state()
      .is_some_and(|state| states_served.contains(state)),
  };
  Ok(allowed)
}

/// Decide a single access.
///
/// Returns `Err(Unauthenticated)` for an unauthenticated subject whatever
/// the resource, `Err(Forbidden(rule))` on a denial, and passes directory
/// failures through as `Err(Resolution(_))`.
pub async fn decide<D>(
  dir: &D,
  subject: &Subject,
  resource: &ResourceDescriptor,
) -> Result<()>
where
  D: ProfileDirectory,
{
  if !subject.is_authenticated {
    return Err(Error::Unauthenticated);
  }

  let outcome = match resource {
    ResourceDescriptor::State { state } => can_access_state(dir, subject, state).await,
    ResourceDescriptor::County { state, county } => {
      can_access_county(dir, subject, state, county).await
    }
    ResourceDescriptor::Campaign { campaign_id } => {
      can_access_campaign_data(dir, subject, *campaign_id).await
    }
    ResourceDescriptor::Vendor { vendor_id } => {
      can_access_vendor_data(dir, subject, *vendor_id).await
    }
  };

  match outcome {
    Ok(allowed) => {
      debug!(
        subject = %subject.subject_id,
        role = %subject.role,
        %resource,
        allowed,
        "access decision"
      );
      if allowed {
        Ok(())
      } else {
        Err(Error::Forbidden(resource.rule()))
      }
    }
    Err(e) => {
      warn!(
        subject = %subject.subject_id,
        %resource,
        error = %e,
        "access denied: directory lookup failed"
      );
      Err(e)
    }
  }
}
