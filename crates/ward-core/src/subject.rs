//! Subject: the authenticated actor a decision is made for.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::{AccessLevel, Role};

/// An actor asking for access. Always passed explicitly; there is no
/// ambient "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:       Uuid,
  pub role:             Role,
  pub is_authenticated: bool,
}

impl Subject {
  /// An authenticated subject with the given role.
  pub fn new(subject_id: Uuid, role: Role) -> Self {
    Self { subject_id, role, is_authenticated: true }
  }

  /// The subject used when no credentials were presented.
  pub fn anonymous() -> Self {
    Self {
      subject_id:       Uuid::nil(),
      role:             Role::Vendor,
      is_authenticated: false,
    }
  }

  /// [`AccessLevel::None`] for an unauthenticated subject regardless of
  /// role.
  pub fn access_level(&self) -> AccessLevel {
    if self.is_authenticated {
      self.role.into()
    } else {
      AccessLevel::None
    }
  }

  pub fn is_owner(&self) -> bool {
    self.access_level() == AccessLevel::Owner
  }
}
