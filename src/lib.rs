// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! TikTok cross-post connector.
//!
//! This crate publishes queued posts of a multi-tenant creator platform to
//! TikTok: token refresh, capability probing, daily quotas, video and
//! photo-carousel uploads via PULL_FROM_URL.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::SettingsStore;
use services::PublishService;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn SettingsStore>,
    pub publisher: PublishService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn SettingsStore>) -> Self {
        let publisher = PublishService::new(&config, store.clone());
        Self {
            config,
            store,
            publisher,
        }
    }
}
