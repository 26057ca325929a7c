//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Access(#[from] ward_core::Error),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[from] ward_store_sqlite::Error),
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
  (status, Json(json!({ "error": message.into() }))).into_response()
}

/// The 401 challenge sent for requests without a valid subject.
pub fn unauthorized() -> Response {
  let mut res = json_error(StatusCode::UNAUTHORIZED, "authentication required");
  res.headers_mut().insert(
    header::WWW_AUTHENTICATE,
    HeaderValue::from_static("Basic realm=\"ward\""),
  );
  res
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    use ward_core::Error as Core;

    match self {
      Error::Access(Core::Unauthenticated) => unauthorized(),
      Error::Access(Core::Forbidden(rule)) => {
        json_error(StatusCode::FORBIDDEN, rule.to_string())
      }
      // Never an allow: a lookup that failed denies.
      Error::Access(Core::Resolution(e)) => {
        tracing::warn!(error = %e, "access could not be resolved; denying");
        json_error(StatusCode::FORBIDDEN, "access could not be resolved")
      }
      Error::Access(
        e @ (Core::InvalidStateCode(_) | Core::UnknownRole(_) | Core::UnknownOfficeType(_)),
      ) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
      Error::NotFound(what) => json_error(StatusCode::NOT_FOUND, format!("{what} not found")),
      Error::Store(e) => {
        tracing::error!(error = %e, "store error");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
      }
    }
  }
}
