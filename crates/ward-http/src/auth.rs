//! HTTP Basic authentication and the [`CurrentSubject`] extractor.
//!
//! The username is the subject's UUID; the password is checked against the
//! argon2 hash stored for that subject. A request that fails to
//! authenticate is not rejected here. It simply carries no subject, and the
//! guard or handler rejects it with 401. Only a failing credential store
//! stops the request, with a 500.

use std::convert::Infallible;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, header, request::Parts},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use tracing::{debug, warn};
use uuid::Uuid;
use ward_core::subject::Subject;
use ward_store_sqlite::SqliteDirectory;

use crate::{AppState, error::Error};

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

fn verify_password(password: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    warn!("stored password hash is not a valid PHC string");
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Basic credentials ───────────────────────────────────────────────────────

/// `(username, password)` from an `Authorization: Basic` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let encoded = value.strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded.trim()).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (user, pass) = creds.split_once(':')?;
  Some((user.to_owned(), pass.to_owned()))
}

/// Resolve the subject behind the request's Basic credentials.
///
/// `Ok(None)` for absent, malformed or wrong credentials; `Err` only when
/// the store itself fails.
pub async fn verify_basic(
  store: &SqliteDirectory,
  headers: &HeaderMap,
) -> Result<Option<Subject>, Error> {
  let Some((user, password)) = basic_credentials(headers) else {
    return Ok(None);
  };
  let Ok(subject_id) = Uuid::parse_str(&user) else {
    debug!("basic auth username is not a subject id");
    return Ok(None);
  };
  let Some((subject, hash)) = store.credentials(subject_id).await? else {
    debug!(subject = %subject_id, "no credentials stored for subject");
    return Ok(None);
  };
  if !verify_password(&password, &hash) {
    debug!(subject = %subject_id, "password rejected");
    return Ok(None);
  }
  Ok(Some(subject))
}

/// Apply the outcome of [`verify_basic`] to `req`. A store failure becomes
/// the response; the request must not go on as anonymous.
fn attach_subject(
  req: &mut Request,
  outcome: Result<Option<Subject>, Error>,
) -> Result<(), Response> {
  match outcome {
    Ok(Some(subject)) => {
      req.extensions_mut().insert(subject);
      Ok(())
    }
    Ok(None) => Ok(()),
    Err(e) => {
      warn!(error = %e, "credential lookup failed");
      Err(e.into_response())
    }
  }
}

/// Middleware attaching the authenticated [`Subject`] to the request
/// extensions.
pub async fn authenticate(
  State(state): State<AppState>,
  mut req: Request,
  next: Next,
) -> Response {
  let outcome = verify_basic(&state.store, req.headers()).await;
  if let Err(resp) = attach_subject(&mut req, outcome) {
    return resp;
  }
  next.run(req).await
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The request's subject; [`Subject::anonymous`] when none was attached.
#[derive(Debug, Clone, Copy)]
pub struct CurrentSubject(pub Subject);

impl CurrentSubject {
  pub(crate) fn from_extensions(extensions: &axum::http::Extensions) -> Self {
    CurrentSubject(
      extensions
        .get::<Subject>()
        .copied()
        .unwrap_or_else(Subject::anonymous),
    )
  }
}

impl<S> FromRequestParts<S> for CurrentSubject
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(Self::from_extensions(&parts.extensions))
  }
}
