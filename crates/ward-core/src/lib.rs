//! Core types and decision logic for the Ward access-control engine.
//!
//! This crate has no HTTP or database dependencies.
//! Account profiles are read through the [`directory::ProfileDirectory`]
//! trait; storage backends and web adapters live in their own crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod cache;
pub mod directory;
pub mod engine;
pub mod enumerate;
pub mod error;
pub mod gate;
pub mod profile;
pub mod resource;
pub mod role;
pub mod subject;

pub use error::{Error, Result, Rule};

#[cfg(test)]
mod fixture;
