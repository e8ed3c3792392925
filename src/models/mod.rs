// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod connection;
pub mod invocation;
pub mod outcome;
pub mod post;

pub use connection::{
    CreatorInfo, PostCounter, PostingPreferences, TenantConnection, TokenGrant,
    DEFAULT_MAX_VIDEO_DURATION_SECS, PRIVACY_PUBLIC, PRIVACY_SELF_ONLY,
};
pub use invocation::{Action, CrosspostCommand, InvocationEnvelope};
pub use outcome::{
    ConnectionReport, InvocationResponse, MediaType, PublishOutcome, PublishReceipt,
    PublishResult,
};
pub use post::{ImageRef, PostPayload, PublishRequest};
