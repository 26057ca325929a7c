//! Router tests against an in-memory directory.

use std::{collections::BTreeSet, path::PathBuf};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;
use ward_core::profile::{AccountProfile, County, OfficeType, StateCode};
use ward_store_sqlite::SqliteDirectory;

use crate::{AppState, ServerConfig, auth::hash_password, router};

const PASSWORD: &str = "secret";

struct Fixture {
  state:    AppState,
  owner:    Uuid,
  ca:       Uuid,
  la:       Uuid,
  campaign: Uuid,
  vendor:   Uuid,
}

fn st(code: &str) -> StateCode { StateCode::parse(code).unwrap() }

async fn fixture() -> Fixture {
  let store = SqliteDirectory::open_in_memory().await.unwrap();
  let hash = hash_password(PASSWORD).unwrap();

  for (state, county) in [
    ("CA", "Los Angeles"),
    ("CA", "Orange"),
    ("TX", "Travis"),
    ("TX", "Harris"),
  ] {
    store.add_county(&st(state), &County::new(county)).await.unwrap();
  }
  store
    .add_district("ca-la-34", &st("CA"), &County::new("Los Angeles"))
    .await
    .unwrap();

  let mut ids = Vec::new();
  for profile in [
    AccountProfile::Owner,
    AccountProfile::State { state: st("CA") },
    AccountProfile::County { state: st("CA"), county: County::new("Los Angeles") },
    AccountProfile::Campaign {
      state:       st("CA"),
      office_type: OfficeType::County,
      district_id: Some("ca-la-34".into()),
    },
    AccountProfile::Vendor { states_served: BTreeSet::from([st("CA"), st("TX")]) },
  ] {
    let account = store
      .add_subject(profile.role(), Some(hash.clone()))
      .await
      .unwrap();
    store.set_profile(account.subject_id, &profile).await.unwrap();
    ids.push(account.subject_id);
  }

  let config = ServerConfig {
    host:           "127.0.0.1".to_string(),
    port:           8080,
    store_path:     PathBuf::from(":memory:"),
    cache_ttl_secs: 3600,
  };

  Fixture {
    state:    AppState::new(store, config),
    owner:    ids[0],
    ca:       ids[1],
    la:       ids[2],
    campaign: ids[3],
    vendor:   ids[4],
  }
}

fn basic(id: Uuid, pass: &str) -> String {
  format!("Basic {}", B64.encode(format!("{id}:{pass}")))
}

async fn send(
  state: &AppState,
  method: &str,
  uri: &str,
  headers: Vec<(header::HeaderName, String)>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  router(state.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap()
}

async fn get_as(state: &AppState, id: Uuid, uri: &str) -> Response {
  send(state, "GET", uri, vec![(header::AUTHORIZATION, basic(id, PASSWORD))], None).await
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

// ── Auth ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn healthz_needs_no_credentials() {
  let f = fixture().await;
  let resp = send(&f.state, "GET", "/healthz", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_credentials_return_401() {
  let f = fixture().await;
  let resp = send(&f.state, "GET", "/v1/accessible/states", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(
    resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
    "Basic realm=\"ward\""
  );
}

#[tokio::test]
async fn wrong_password_returns_401() {
  let f = fixture().await;
  let resp = send(
    &f.state,
    "GET",
    "/v1/states/CA",
    vec![(header::AUTHORIZATION, basic(f.ca, "wrong"))],
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ── Decide ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn decide_reports_allowed_and_denied() {
  let f = fixture().await;
  let auth = vec![(header::AUTHORIZATION, basic(f.la, PASSWORD))];

  let resp = send(
    &f.state,
    "POST",
    "/v1/decide",
    auth.clone(),
    Some(json!({ "resource": { "kind": "county", "state": "CA", "county": "Los Angeles" } })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await, json!({ "allowed": true }));

  let resp = send(
    &f.state,
    "POST",
    "/v1/decide",
    auth,
    Some(json!({ "resource": { "kind": "county", "state": "CA", "county": "Orange" } })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["allowed"], json!(false));
  assert_eq!(body["reason"], json!("no access to this county"));
}

#[tokio::test]
async fn decide_without_credentials_is_401() {
  let f = fixture().await;
  let resp = send(
    &f.state,
    "POST",
    "/v1/decide",
    vec![],
    Some(json!({ "resource": { "kind": "state", "state": "CA" } })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ── Accessible sets ──────────────────────────────────────────────────────────

#[tokio::test]
async fn accessible_states_with_etag() {
  let f = fixture().await;
  let resp = get_as(&f.state, f.vendor, "/v1/accessible/states").await;
  assert_eq!(resp.status(), StatusCode::OK);
  let etag = resp
    .headers()
    .get(header::ETAG)
    .unwrap()
    .to_str()
    .unwrap()
    .to_string();
  assert_eq!(json_body(resp).await, json!({ "states": ["CA", "TX"] }));

  let resp = send(
    &f.state,
    "GET",
    "/v1/accessible/states",
    vec![
      (header::AUTHORIZATION, basic(f.vendor, PASSWORD)),
      (header::IF_NONE_MATCH, etag),
    ],
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn accessible_counties_per_role() {
  let f = fixture().await;

  let resp = get_as(&f.state, f.la, "/v1/accessible/counties").await;
  assert_eq!(json_body(resp).await, json!({ "counties": ["Los Angeles"] }));

  let resp = get_as(&f.state, f.ca, "/v1/accessible/counties").await;
  assert_eq!(json_body(resp).await, json!({ "counties": ["Los Angeles", "Orange"] }));

  let resp = get_as(&f.state, f.vendor, "/v1/accessible/counties?state=TX").await;
  assert_eq!(json_body(resp).await, json!({ "counties": ["Harris", "Travis"] }));

  let resp = get_as(&f.state, f.ca, "/v1/accessible/counties?state=TEXAS").await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Scoped resources ─────────────────────────────────────────────────────────

#[tokio::test]
async fn state_route_is_guarded() {
  let f = fixture().await;

  let resp = get_as(&f.state, f.ca, "/v1/states/CA").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["state"], json!("CA"));

  let resp = get_as(&f.state, f.ca, "/v1/states/TX").await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  assert_eq!(json_body(resp).await, json!({ "error": "no access to this state" }));
}

#[tokio::test]
async fn county_route_is_guarded() {
  let f = fixture().await;

  let resp = get_as(&f.state, f.la, "/v1/counties/CA/Los%20Angeles").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    json_body(resp).await,
    json!({ "state": "CA", "county": "Los Angeles" })
  );

  let resp = get_as(&f.state, f.la, "/v1/counties/CA/Orange").await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  // The campaign's district lies in Los Angeles.
  let resp = get_as(&f.state, f.campaign, "/v1/counties/CA/Los%20Angeles").await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn campaign_route_runs_handler_only_when_allowed() {
  let f = fixture().await;
  let uri = format!("/v1/campaigns/{}", f.campaign);

  let resp = get_as(&f.state, f.la, &uri).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["district_id"], json!("ca-la-34"));

  // Vendors reach campaigns in the states they serve.
  let resp = get_as(&f.state, f.vendor, &uri).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = get_as(&f.state, f.owner, &format!("/v1/campaigns/{}", Uuid::new_v4())).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = get_as(&f.state, f.ca, &format!("/v1/campaigns/{}", f.vendor)).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn vendor_route_checks_object_scope() {
  let f = fixture().await;
  let uri = format!("/v1/vendors/{}", f.vendor);

  let resp = get_as(&f.state, f.campaign, &uri).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["states_served"], json!(["CA", "TX"]));

  let resp = get_as(&f.state, f.vendor, &uri).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn campaign_route_serves_only_campaign_profiles() {
  let f = fixture().await;

  // Owner passes the gate for any id, but a vendor is not a campaign.
  let resp = get_as(&f.state, f.owner, &format!("/v1/campaigns/{}", f.vendor)).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  // Self access on a non-campaign account.
  let resp = get_as(&f.state, f.ca, &format!("/v1/campaigns/{}", f.ca)).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = get_as(&f.state, f.campaign, &format!("/v1/campaigns/{}", f.campaign)).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["role"], json!("campaign"));
}

#[tokio::test]
async fn vendor_route_serves_only_vendor_profiles() {
  let f = fixture().await;

  let resp = get_as(&f.state, f.owner, &format!("/v1/vendors/{}", f.campaign)).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = get_as(&f.state, f.campaign, &format!("/v1/vendors/{}", f.campaign)).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = get_as(&f.state, f.owner, &format!("/v1/vendors/{}", f.vendor)).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["role"], json!("vendor"));
}

// ── Admin ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_cache_is_owner_only() {
  let f = fixture().await;

  let resp = get_as(&f.state, f.ca, "/v1/admin/cache").await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  assert_eq!(
    json_body(resp).await,
    json!({ "error": "requires owner tier or higher" })
  );

  let resp = send(&f.state, "GET", "/v1/admin/cache", vec![], None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = get_as(&f.state, f.owner, "/v1/admin/cache").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["ttl_secs"], json!(3600));
}

#[tokio::test]
async fn owner_enumeration_is_cached_until_invalidated() {
  let f = fixture().await;

  let resp = get_as(&f.state, f.owner, "/v1/accessible/states").await;
  assert_eq!(json_body(resp).await, json!({ "states": ["CA"] }));

  // A new state account stays invisible while the entry is fresh.
  let account = f.state.store.add_subject(ward_core::role::Role::State, None).await.unwrap();
  f.state
    .store
    .set_profile(account.subject_id, &AccountProfile::State { state: st("WA") })
    .await
    .unwrap();
  let resp = get_as(&f.state, f.owner, "/v1/accessible/states").await;
  assert_eq!(json_body(resp).await, json!({ "states": ["CA"] }));

  let resp = get_as(&f.state, f.owner, "/v1/admin/cache").await;
  assert_eq!(json_body(resp).await["entries"].as_array().unwrap().len(), 1);

  let resp = send(
    &f.state,
    "DELETE",
    "/v1/admin/cache",
    vec![(header::AUTHORIZATION, basic(f.owner, PASSWORD))],
    None,
  )
  .await;
  assert_eq!(json_body(resp).await, json!({ "invalidated": 1 }));

  let resp = get_as(&f.state, f.owner, "/v1/accessible/states").await;
  assert_eq!(json_body(resp).await, json!({ "states": ["CA", "WA"] }));
}
