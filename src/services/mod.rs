// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod capability;
pub mod media;
pub mod post_text;
pub mod publish;
pub mod rate_limit;
pub mod tiktok;
pub mod token;

pub use capability::CapabilityProbe;
pub use media::ResolvedMedia;
pub use publish::PublishService;
pub use rate_limit::RateLimiter;
pub use tiktok::TikTokClient;
pub use token::TokenManager;
