//! Bearer-token extractor and token helpers.
//!
//! Tokens are opaque random strings handed to the client once. Only their
//! SHA-256 digest is stored, so a leaked database does not leak credentials.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use practicum_core::{Error, store::IdentityProvider, subject::Subject};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{AppState, Backend, error::ApiError};

/// The authenticated subject making the request.
pub struct Actor(pub Subject);

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// Hex SHA-256 of a token, the form it is stored and looked up in.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// 32 bytes from the OS RNG, base64url without padding.
pub fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// Mint a token for `subject_id`, store its hash and return the plaintext.
pub async fn issue_token<S>(store: &S, subject_id: Uuid) -> Result<String, S::Error>
where
  S: IdentityProvider,
{
  let token = generate_token();
  store.issue_token(subject_id, hash_token(&token)).await?;
  tracing::info!(subject = %subject_id, "issued access token");
  Ok(token)
}

impl<S> FromRequestParts<AppState<S>> for Actor
where
  S: Backend,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(Error::Unauthenticated)?;
    let subject = state.portal.authenticate(&hash_token(token)).await?;
    Ok(Actor(subject))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn bearer_prefix_is_required() {
    assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
    assert_eq!(bearer_token(&headers("Basic abc")), None);
    assert_eq!(bearer_token(&headers("Bearer   ")), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
  }

  #[test]
  fn hash_is_hex_sha256() {
    assert_eq!(
      hash_token("abc"),
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }

  #[test]
  fn generated_tokens_are_distinct_and_url_safe() {
    let a = generate_token();
    let b = generate_token();
    assert_ne!(a, b);
    assert_eq!(a.len(), 43);
    assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
  }
}
