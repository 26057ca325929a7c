//! Error types for `ward-core`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::role::Role;

/// The rule a subject failed, carried by [`Error::Forbidden`] for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
  /// The subject's tier is below the required minimum.
  Tier { required: Role },
  State,
  County,
  Campaign,
  Vendor,
  /// Object-level check on a resource with no recognised shape.
  Object,
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Rule::Tier { required } => write!(f, "requires {required} tier or higher"),
      Rule::State => f.write_str("no access to this state"),
      Rule::County => f.write_str("no access to this county"),
      Rule::Campaign => f.write_str("no access to this campaign"),
      Rule::Vendor => f.write_str("no access to this vendor"),
      Rule::Object => f.write_str("no access to this object"),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("authentication required")]
  Unauthenticated,

  #[error("forbidden: {0}")]
  Forbidden(Rule),

  /// A directory lookup failed. Always treated as a denial.
  #[error("profile resolution failed: {0}")]
  Resolution(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("invalid state code: {0:?}")]
  InvalidStateCode(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown office type: {0:?}")]
  UnknownOfficeType(String),
}

impl Error {
  /// Wrap a directory error.
  pub fn resolution<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Resolution(Box::new(err))
  }

  /// `true` for every error that must be reported as "permission denied".
  pub fn is_denial(&self) -> bool {
    matches!(
      self,
      Error::Unauthenticated | Error::Forbidden(_) | Error::Resolution(_)
    )
  }

  /// The failed rule, if this is a [`Error::Forbidden`].
  pub fn rule(&self) -> Option<Rule> {
    match self {
      Error::Forbidden(rule) => Some(*rule),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
