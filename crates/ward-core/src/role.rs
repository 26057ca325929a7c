//! The five-tier role hierarchy.
//!
//! Tiers are totally ordered for the "minimum required tier" check only:
//! Owner is the most privileged (tier 0), Vendor the least. Campaign and
//! Vendor are both leaf tiers; their relative order matters only for that
//! one comparison. Location-based decisions never consult the order, see
//! [`crate::engine`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::Error;

/// The role attached to a subject.
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
pub enum Role {
  Owner,
  State,
  County,
  Campaign,
  Vendor,
}

impl Role {
  /// All roles, most privileged first.
  pub const ORDER: [Role; 5] = [
    Role::Owner,
    Role::State,
    Role::County,
    Role::Campaign,
    Role::Vendor,
  ];

  /// Position in [`Role::ORDER`]; lower is more privileged.
  pub fn tier(self) -> usize {
    match self {
      Role::Owner => 0,
      Role::State => 1,
      Role::County => 2,
      Role::Campaign => 3,
      Role::Vendor => 4,
    }
  }

  /// `true` if this role is at least as privileged as `minimum`.
  pub fn satisfies(self, minimum: Role) -> bool { self.tier() <= minimum.tier() }

  /// Parse the lowercase textual form, as stored and serialised.
  pub fn parse(s: &str) -> Result<Self, Error> {
    Role::from_str(s).map_err(|_| Error::UnknownRole(s.to_owned()))
  }
}

/// The effective access level of a subject: its role when authenticated,
/// [`AccessLevel::None`] otherwise.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccessLevel {
  None,
  Owner,
  State,
  County,
  Campaign,
  Vendor,
}

impl From<Role> for AccessLevel {
  fn from(role: Role) -> Self {
    match role {
      Role::Owner => AccessLevel::Owner,
      Role::State => AccessLevel::State,
      Role::County => AccessLevel::County,
      Role::Campaign => AccessLevel::Campaign,
      Role::Vendor => AccessLevel::Vendor,
    }
  }
}
