//! Account profiles: the location attributes attached to a subject's role.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, role::Role};

// ─── Location values ─────────────────────────────────────────────────────────

/// A two-letter state or territory code, always upper-case.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct StateCode(String);

impl StateCode {
  pub fn parse(s: &str) -> Result<Self, Error> {
    let trimmed = s.trim();
    if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
      return Err(Error::InvalidStateCode(s.to_owned()));
    }
    Ok(Self(trimmed.to_ascii_uppercase()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for StateCode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl TryFrom<String> for StateCode {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { Self::parse(&s) }
}

impl From<StateCode> for String {
  fn from(code: StateCode) -> Self { code.0 }
}

impl fmt::Display for StateCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A county name. Compared exactly after trimming surrounding whitespace.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub struct County(String);

impl County {
  pub fn new(name: impl Into<String>) -> Self {
    let name = name.into();
    let trimmed = name.trim();
    if trimmed.len() == name.len() {
      Self(name)
    } else {
      Self(trimmed.to_owned())
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for County {
  fn from(s: String) -> Self { Self::new(s) }
}

impl From<&str> for County {
  fn from(s: &str) -> Self { Self::new(s) }
}

impl From<County> for String {
  fn from(county: County) -> Self { county.0 }
}

impl fmt::Display for County {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Office type ─────────────────────────────────────────────────────────────

/// The level of office a campaign runs for. Only [`OfficeType::County`]
/// gives a campaign a county-level claim.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OfficeType {
  Federal,
  State,
  County,
  Municipal,
}

impl OfficeType {
  pub fn parse(s: &str) -> Result<Self, Error> {
    OfficeType::from_str(s).map_err(|_| Error::UnknownOfficeType(s.to_owned()))
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The attribute tuple attached to a subject, one variant per role.
///
/// Campaign and vendor identities are the owning subject's id and are not
/// repeated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum AccountProfile {
  /// Matches everything; carries no location.
  Owner,
  State {
    state: StateCode,
  },
  County {
    state:  StateCode,
    county: County,
  },
  Campaign {
    state:       StateCode,
    office_type: OfficeType,
    /// Resolvable to a county through the directory when `office_type` is
    /// [`OfficeType::County`].
    district_id: Option<String>,
  },
  Vendor {
    states_served: BTreeSet<StateCode>,
  },
}

impl AccountProfile {
  /// The role this profile variant belongs to.
  pub fn role(&self) -> Role {
    match self {
      AccountProfile::Owner => Role::Owner,
      AccountProfile::State { .. } => Role::State,
      AccountProfile::County { .. } => Role::County,
      AccountProfile::Campaign { .. } => Role::Campaign,
      AccountProfile::Vendor { .. } => Role::Vendor,
    }
  }

  /// The single home state of a State, County or Campaign profile.
  pub fn home_state(&self) -> Option<&StateCode> {
    match self {
      AccountProfile::State { state }
      | AccountProfile::County { state, .. }
      | AccountProfile::Campaign { state, .. } => Some(state),
      AccountProfile::Owner | AccountProfile::Vendor { .. } => None,
    }
  }

  /// Every state this profile is located in. Empty for Owner, which is not
  /// located anywhere.
  pub fn states(&self) -> BTreeSet<StateCode> {
    match self {
      AccountProfile::Vendor { states_served } => states_served.clone(),
      other => other.home_state().cloned().into_iter().collect(),
    }
  }
}
