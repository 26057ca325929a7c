//! [`RequireAccess`]: a route layer enforcing a [`Requirement`].
//!
//! ```rust,ignore
//! Router::new()
//!   .route("/admin/cache", get(entries))
//!   .route_layer(RequireAccess::new(gate, Requirement::new().minimum_tier(Role::Owner)))
//! ```
//!
//! The subject is read from the request extensions, where
//! [`crate::auth::authenticate`] puts it. On a failed check the inner
//! service is never called.

use std::{
  future::Future,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll},
};

use axum::{
  body::Body,
  http::Request,
  response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use ward_core::{
  directory::ProfileDirectory,
  gate::{Gate, Requirement},
};

use crate::{auth::CurrentSubject, error::Error};

pub struct RequireAccess<D> {
  gate:        Gate<D>,
  requirement: Arc<Requirement>,
}

impl<D> Clone for RequireAccess<D> {
  fn clone(&self) -> Self {
    Self {
      gate:        self.gate.clone(),
      requirement: Arc::clone(&self.requirement),
    }
  }
}

impl<D> RequireAccess<D>
where
  D: ProfileDirectory,
{
  pub fn new(gate: Gate<D>, requirement: Requirement) -> Self {
    Self { gate, requirement: Arc::new(requirement) }
  }
}

impl<S, D> Layer<S> for RequireAccess<D> {
  type Service = RequireAccessService<S, D>;

  fn layer(&self, inner: S) -> Self::Service {
    RequireAccessService {
      inner,
      gate: self.gate.clone(),
      requirement: Arc::clone(&self.requirement),
    }
  }
}

/// Service produced by [`RequireAccess`].
pub struct RequireAccessService<S, D> {
  inner:       S,
  gate:        Gate<D>,
  requirement: Arc<Requirement>,
}

impl<S: Clone, D> Clone for RequireAccessService<S, D> {
  fn clone(&self) -> Self {
    Self {
      inner:       self.inner.clone(),
      gate:        self.gate.clone(),
      requirement: Arc::clone(&self.requirement),
    }
  }
}

impl<S, D> Service<Request<Body>> for RequireAccessService<S, D>
where
  S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
  S::Future: Send,
  D: ProfileDirectory + 'static,
{
  type Response = Response;
  type Error = S::Error;
  type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

  fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
    self.inner.poll_ready(cx)
  }

  fn call(&mut self, req: Request<Body>) -> Self::Future {
    // Take the service that was polled ready and leave a fresh clone behind.
    let clone = self.inner.clone();
    let mut inner = std::mem::replace(&mut self.inner, clone);
    let gate = self.gate.clone();
    let requirement = Arc::clone(&self.requirement);
    let CurrentSubject(subject) = CurrentSubject::from_extensions(req.extensions());

    Box::pin(async move {
      if let Err(e) = gate.check(&subject, &requirement).await {
        return Ok(Error::from(e).into_response());
      }
      tracing::debug!(subject = %subject.subject_id, uri = %req.uri(), "guard passed");
      inner.call(req).await
    })
  }
}
