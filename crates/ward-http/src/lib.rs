//! axum bindings and JSON service for Ward.
//!
//! Exposes an axum [`Router`] that authenticates requests with HTTP Basic
//! credentials stored in a [`SqliteDirectory`] and answers access questions
//! through a [`Gate`].
//!
//! The building blocks are usable on their own:
//!
//! ```rust,ignore
//! Router::new()
//!   .route("/reports", get(reports))
//!   .route_layer(RequireAccess::new(gate, Requirement::new().minimum_tier(Role::State)))
//!   .layer(middleware::from_fn_with_state(state, auth::authenticate))
//! ```

pub mod api;
pub mod auth;
pub mod error;
pub mod etag;
pub mod guard;

pub use auth::CurrentSubject;
pub use error::Error;
pub use guard::RequireAccess;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router, middleware,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use ward_core::{
  cache::{AccessibleSetCache, DEFAULT_TTL},
  gate::{Gate, Requirement},
  role::Role,
};
use ward_store_sqlite::SqliteDirectory;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  /// Lifetime of cached Owner enumerations.
  #[serde(default = "default_cache_ttl_secs")]
  pub cache_ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 { DEFAULT_TTL.as_secs() }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
  pub gate:   Gate<SqliteDirectory>,
  pub store:  Arc<SqliteDirectory>,
  pub config: Arc<ServerConfig>,
}

impl AppState {
  pub fn new(store: SqliteDirectory, config: ServerConfig) -> Self {
    let store = Arc::new(store);
    let cache = Arc::new(AccessibleSetCache::new(Duration::from_secs(
      config.cache_ttl_secs,
    )));
    Self {
      gate: Gate::new(Arc::clone(&store), cache),
      store,
      config: Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the Ward [`Router`].
///
/// Every `/v1` route sees the subject attached by [`auth::authenticate`];
/// `/healthz` is served without it.
pub fn router(state: AppState) -> Router {
  let admin = Router::new()
    .route(
      "/v1/admin/cache",
      get(api::cache_entries).delete(api::invalidate_cache),
    )
    .route_layer(RequireAccess::new(
      state.gate.clone(),
      Requirement::new().minimum_tier(Role::Owner),
    ));

  Router::new()
    .route("/v1/decide",                    post(api::decide))
    .route("/v1/accessible/states",         get(api::accessible_states))
    .route("/v1/accessible/counties",       get(api::accessible_counties))
    .route("/v1/states/{state}",            get(api::state_summary))
    .route("/v1/counties/{state}/{county}", get(api::county_summary))
    .route("/v1/campaigns/{id}",            get(api::campaign_profile))
    .route("/v1/vendors/{id}",              get(api::vendor_profile))
    .merge(admin)
    .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate))
    .route("/healthz", get(api::healthz))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
