//! Resource descriptors: the object of an access check.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Rule,
  profile::{County, StateCode},
};

/// Where a requested resource sits in the organisational hierarchy.
///
/// Campaign and vendor resources are identified by their owning subject;
/// the engine resolves them to profiles through the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceDescriptor {
  State { state: StateCode },
  County { state: StateCode, county: County },
  Campaign { campaign_id: Uuid },
  Vendor { vendor_id: Uuid },
}

impl ResourceDescriptor {
  /// The rule reported when access to this resource is denied.
  pub fn rule(&self) -> Rule {
    match self {
      ResourceDescriptor::State { .. } => Rule::State,
      ResourceDescriptor::County { .. } => Rule::County,
      ResourceDescriptor::Campaign { .. } => Rule::Campaign,
      ResourceDescriptor::Vendor { .. } => Rule::Vendor,
    }
  }
}

impl fmt::Display for ResourceDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResourceDescriptor::State { state } => write!(f, "state/{state}"),
      ResourceDescriptor::County { state, county } => {
        write!(f, "county/{state}/{county}")
      }
      ResourceDescriptor::Campaign { campaign_id } => {
        write!(f, "campaign/{campaign_id}")
      }
      ResourceDescriptor::Vendor { vendor_id } => write!(f, "vendor/{vendor_id}"),
    }
  }
}
