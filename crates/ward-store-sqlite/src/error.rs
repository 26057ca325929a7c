//! Error type for `ward-store-sqlite`.

use thiserror::Error;
use ward_core::role::Role;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] ward_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("subject not found: {0}")]
  SubjectNotFound(uuid::Uuid),

  #[error("subject {subject_id} has role {role} but the profile is for {profile}")]
  RoleMismatch {
    subject_id: uuid::Uuid,
    role:       Role,
    profile:    Role,
  },

  /// A stored row does not describe a valid profile.
  #[error("corrupt profile row for {0}: {1}")]
  CorruptProfile(uuid::Uuid, String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
