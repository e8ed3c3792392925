// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Invocation authentication middleware.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require `Authorization: Bearer <invoke token>` on crosspost routes.
pub async fn require_invoke_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match presented {
        Some(token) if token_matches(token, &state.config.invoke_token) => {
            Ok(next.run(request).await)
        }
        Some(_) => {
            tracing::warn!("Blocked invocation with wrong invoke token");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Blocked invocation without bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Compare digests so neither content nor length leaks through timing.
fn token_matches(presented: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.as_slice().ct_eq(b.as_slice()).into()
}
