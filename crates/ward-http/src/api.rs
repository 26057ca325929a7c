//! JSON handlers.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/v1/decide` | Body: `{"resource":{"kind":"state","state":"CA"}}` |
//! | `GET`    | `/v1/accessible/states` | ETag / `If-None-Match` |
//! | `GET`    | `/v1/accessible/counties` | Optional `?state=CA`; ETag |
//! | `GET`    | `/v1/states/{state}` | Requires state access |
//! | `GET`    | `/v1/counties/{state}/{county}` | Requires county access |
//! | `GET`    | `/v1/campaigns/{id}` | Requires campaign access |
//! | `GET`    | `/v1/vendors/{id}` | Requires vendor access |
//! | `GET`    | `/v1/admin/cache` | Owner only |
//! | `DELETE` | `/v1/admin/cache` | Owner only |
//! | `GET`    | `/healthz` | No auth |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;
use ward_core::{
  directory::ProfileDirectory,
  gate::{ObjectScope, Requirement},
  profile::{AccountProfile, County, StateCode},
  resource::ResourceDescriptor,
};

use crate::{
  AppState,
  auth::CurrentSubject,
  error::Error,
  etag::{compute_etag, if_none_match},
};

fn require_authenticated(subject: &ward_core::subject::Subject) -> Result<(), Error> {
  if subject.is_authenticated {
    Ok(())
  } else {
    Err(ward_core::Error::Unauthenticated.into())
  }
}

/// A JSON body tagged with `etag`, or a bare `304` if the client already
/// has it.
fn with_etag(headers: &HeaderMap, etag: String, body: Value) -> Response {
  if if_none_match(headers, &etag) {
    return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
  }
  ([(header::ETAG, etag)], Json(body)).into_response()
}

// ─── Decide ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DecideBody {
  pub resource: ResourceDescriptor,
}

#[derive(Debug, Serialize)]
pub struct Decision {
  pub allowed: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason:  Option<String>,
}

/// `POST /v1/decide`
///
/// A denial is an answer, not an error: it comes back as `200` with
/// `allowed: false`.
pub async fn decide(
  State(state): State<AppState>,
  CurrentSubject(subject): CurrentSubject,
  Json(body): Json<DecideBody>,
) -> Result<Json<Decision>, Error> {
  match state.gate.decide(&subject, &body.resource).await {
    Ok(()) => Ok(Json(Decision { allowed: true, reason: None })),
    Err(ward_core::Error::Forbidden(rule)) => Ok(Json(Decision {
      allowed: false,
      reason:  Some(rule.to_string()),
    })),
    Err(e) => Err(e.into()),
  }
}

// ─── Accessible sets ─────────────────────────────────────────────────────────

/// `GET /v1/accessible/states`
pub async fn accessible_states(
  State(state): State<AppState>,
  CurrentSubject(subject): CurrentSubject,
  headers: HeaderMap,
) -> Result<Response, Error> {
  require_authenticated(&subject)?;
  let states = state.gate.enumerator().accessible_states(&subject).await?;
  let etag = compute_etag(states.iter().map(StateCode::as_str));
  Ok(with_etag(&headers, etag, json!({ "states": states })))
}

#[derive(Debug, Deserialize)]
pub struct CountyParams {
  pub state: Option<String>,
}

/// `GET /v1/accessible/counties[?state=<code>]`
pub async fn accessible_counties(
  State(state): State<AppState>,
  CurrentSubject(subject): CurrentSubject,
  Query(params): Query<CountyParams>,
  headers: HeaderMap,
) -> Result<Response, Error> {
  require_authenticated(&subject)?;
  let filter = params.state.as_deref().map(StateCode::parse).transpose()?;
  let counties = state
    .gate
    .enumerator()
    .accessible_counties(&subject, filter.as_ref())
    .await?;
  let etag = compute_etag(counties.iter().map(County::as_str));
  Ok(with_etag(&headers, etag, json!({ "counties": counties })))
}

// ─── Scoped resources ────────────────────────────────────────────────────────

/// `GET /v1/states/{state}`
pub async fn state_summary(
  State(state): State<AppState>,
  CurrentSubject(subject): CurrentSubject,
  Path(code): Path<String>,
) -> Result<Json<Value>, Error> {
  let code = StateCode::parse(&code)?;
  state
    .gate
    .check(&subject, &Requirement::new().state(code.clone()))
    .await?;

  let counties = state
    .gate
    .enumerator()
    .accessible_counties(&subject, Some(&code))
    .await?;
  Ok(Json(json!({ "state": code, "counties": counties })))
}

/// `GET /v1/counties/{state}/{county}`
pub async fn county_summary(
  State(state): State<AppState>,
  CurrentSubject(subject): CurrentSubject,
  Path((code, county)): Path<(String, String)>,
) -> Result<Json<Value>, Error> {
  let code = StateCode::parse(&code)?;
  let county = County::new(county);
  state
    .gate
    .check(&subject, &Requirement::new().county(code.clone(), county.clone()))
    .await?;
  Ok(Json(json!({ "state": code, "county": county })))
}

/// `GET /v1/campaigns/{id}`: the campaign's profile.
///
/// `404` unless `id` holds a campaign profile, even for subjects the gate
/// lets through on owner or self access.
pub async fn campaign_profile(
  State(state): State<AppState>,
  CurrentSubject(subject): CurrentSubject,
  Path(id): Path<Uuid>,
) -> Result<Json<AccountProfile>, Error> {
  let store = state.store.clone();
  let profile = state
    .gate
    .require_access(&subject, &Requirement::new().campaign(id), || async move {
      store.resolve_profile(id).await
    })
    .await??;
  match profile {
    Some(p @ AccountProfile::Campaign { .. }) => Ok(Json(p)),
    _ => Err(Error::NotFound(format!("campaign {id}"))),
  }
}

/// `GET /v1/vendors/{id}`: the vendor's profile. `404` unless `id` holds a
/// vendor profile.
pub async fn vendor_profile(
  State(state): State<AppState>,
  CurrentSubject(subject): CurrentSubject,
  Path(id): Path<Uuid>,
) -> Result<Json<AccountProfile>, Error> {
  state
    .gate
    .object_permission(&subject, &ObjectScope::Vendor(id))
    .await?;
  match state.store.resolve_profile(id).await? {
    Some(p @ AccountProfile::Vendor { .. }) => Ok(Json(p)),
    _ => Err(Error::NotFound(format!("vendor {id}"))),
  }
}

// ─── Admin ───────────────────────────────────────────────────────────────────

/// `GET /v1/admin/cache`
pub async fn cache_entries(State(state): State<AppState>) -> Json<Value> {
  let cache = state.gate.enumerator().cache();
  Json(json!({
    "ttl_secs": cache.ttl().as_secs(),
    "entries":  cache.entries(),
  }))
}

/// `DELETE /v1/admin/cache`
pub async fn invalidate_cache(
  State(state): State<AppState>,
  CurrentSubject(subject): CurrentSubject,
) -> Json<Value> {
  let cache = state.gate.enumerator().cache();
  let dropped = cache.len();
  cache.invalidate_all();
  info!(subject = %subject.subject_id, dropped, "accessible-set cache invalidated");
  Json(json!({ "invalidated": dropped }))
}

/// `GET /healthz`
pub async fn healthz() -> &'static str { "ok" }
