// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (invocation auth, security headers).

pub mod invoke_auth;
pub mod security;

pub use invoke_auth::require_invoke_token;
