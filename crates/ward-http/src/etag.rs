//! ETags for accessible-set responses.
//!
//! An ETag is the SHA-256 of the sorted set members, so the same set yields
//! the same tag whatever order it was built in.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};

/// Compute a strong, quoted ETag over `items`.
pub fn compute_etag<I, T>(items: I) -> String
where
  I: IntoIterator<Item = T>,
  T: AsRef<str>,
{
  let mut items: Vec<T> = items.into_iter().collect();
  items.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));

  let mut hasher = Sha256::new();
  for item in &items {
    hasher.update(item.as_ref().as_bytes());
    // Separator so ["AB", "C"] and ["A", "BC"] differ.
    hasher.update([0u8]);
  }
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

fn strip_etag(tag: &str) -> &str {
  let tag = tag.trim();
  let tag = tag.strip_prefix("W/").unwrap_or(tag);
  tag.trim_matches('"')
}

/// Whether the request's `If-None-Match` header matches `etag`.
///
/// Accepts `*`, comma-separated lists, weak tags and tags without quotes.
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  let wanted = strip_etag(etag);
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .any(|candidate| candidate.trim() == "*" || strip_etag(candidate) == wanted)
}
