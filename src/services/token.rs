// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access-token lifecycle: proactive refresh with per-tenant serialization.

use crate::db::SettingsStore;
use crate::error::AppError;
use crate::models::{TenantConnection, TokenGrant};
use crate::services::tiktok::TikTokClient;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Lifetime assumed when the grant response omits `expires_in` (24 hours).
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Refresh error TikTok returns once a refresh token has been rotated away.
const INVALID_GRANT: &str = "invalid_grant";

/// Shared refresh locks, keyed by tenant ID.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// True when a token expiring at `expires_at_ms` must be refreshed at `now`.
pub fn needs_refresh(expires_at_ms: i64, now: DateTime<Utc>) -> bool {
    now.timestamp_millis() + TOKEN_REFRESH_MARGIN_SECS * 1000 >= expires_at_ms
}

fn usable_token(conn: &TenantConnection, now: DateTime<Utc>) -> Option<String> {
    if conn.is_connected() && !needs_refresh(conn.expires_at, now) {
        conn.access_token.clone()
    } else {
        None
    }
}

/// Hands out valid access tokens, refreshing them through TikTok when they
/// are about to expire.
#[derive(Clone)]
pub struct TokenManager {
    client: TikTokClient,
    store: Arc<dyn SettingsStore>,
    refresh_locks: RefreshLocks,
}

impl TokenManager {
    pub fn new(client: TikTokClient, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            client,
            store,
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    /// Return an access token valid for at least the refresh margin.
    ///
    /// `conn` is updated in place when a refresh (ours or a concurrent
    /// one) produced new tokens.
    pub async fn get_valid_access_token(
        &self,
        tenant_id: &str,
        conn: &mut TenantConnection,
    ) -> Result<String, AppError> {
        if let Some(token) = usable_token(conn, Utc::now()) {
            return Ok(token);
        }

        let lock = self
            .refresh_locks
            .entry(tenant_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;

        // Another task may have refreshed while we were waiting.
        if let Some(stored) = self.store.get_connection(tenant_id).await? {
            if let Some(token) = usable_token(&stored, Utc::now()) {
                tracing::debug!(tenant_id, "Using token refreshed by another task");
                adopt_tokens(conn, &stored);
                return Ok(token);
            }
            if stored.refresh_token.is_some() {
                adopt_tokens(conn, &stored);
            }
        }

        let refresh_token = conn
            .refresh_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Auth("No refresh token available".to_string()))?;

        tracing::info!(tenant_id, "Access token expiring, refreshing");

        let response = self.client.refresh_token(&refresh_token).await?;

        let Some(access_token) = response.access_token.filter(|t| !t.is_empty()) else {
            if response.error.as_deref() == Some(INVALID_GRANT) {
                tracing::info!(
                    tenant_id,
                    "Refresh token already rotated, re-reading stored tokens"
                );
                return self.fetch_from_store(tenant_id, conn).await;
            }
            return Err(AppError::Auth(
                response
                    .error_description
                    .filter(|d| !d.is_empty())
                    .or(response.error)
                    .unwrap_or_else(|| "Failed to refresh token".to_string()),
            ));
        };

        let now = Utc::now();
        let lifetime = response
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        let grant = TokenGrant {
            access_token: access_token.clone(),
            refresh_token: response
                .refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or(refresh_token),
            expires_at: expiry_from_lifetime(now, lifetime),
            updated_at: format_utc_rfc3339(now),
        };

        self.store.update_tokens(tenant_id, &grant).await?;
        grant.apply_to(conn);

        tracing::info!(tenant_id, expires_in = lifetime, "Token refreshed");
        Ok(access_token)
    }

    /// Use whatever the winning refresher stored, if it is still valid.
    async fn fetch_from_store(
        &self,
        tenant_id: &str,
        conn: &mut TenantConnection,
    ) -> Result<String, AppError> {
        let stored = self
            .store
            .get_connection(tenant_id)
            .await?
            .ok_or_else(|| AppError::Auth("Refresh token rejected".to_string()))?;

        let token = usable_token(&stored, Utc::now())
            .ok_or_else(|| AppError::Auth("Refresh token rejected".to_string()))?;

        adopt_tokens(conn, &stored);
        Ok(token)
    }
}

fn adopt_tokens(conn: &mut TenantConnection, stored: &TenantConnection) {
    conn.access_token = stored.access_token.clone();
    conn.refresh_token = stored.refresh_token.clone();
    conn.expires_at = stored.expires_at;
}

/// Absolute expiry in epoch ms for a grant lasting `lifetime_secs`.
fn expiry_from_lifetime(now: DateTime<Utc>, lifetime_secs: i64) -> i64 {
    now.timestamp_millis()
        .saturating_add(lifetime_secs.saturating_mul(1000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_needs_refresh_inside_margin() {
        let now = Utc::now();
        let in_four_min = (now + Duration::minutes(4)).timestamp_millis();
        let in_ten_min = (now + Duration::minutes(10)).timestamp_millis();

        assert!(needs_refresh(in_four_min, now));
        assert!(!needs_refresh(in_ten_min, now));
        assert!(needs_refresh(0, now));
    }

    #[test]
    fn test_usable_token_requires_token_and_expiry() {
        let now = Utc::now();
        let mut conn = TenantConnection {
            access_token: Some("act.1".into()),
            expires_at: (now + Duration::hours(1)).timestamp_millis(),
            ..Default::default()
        };
        assert_eq!(usable_token(&conn, now).as_deref(), Some("act.1"));

        conn.expires_at = (now + Duration::seconds(30)).timestamp_millis();
        assert!(usable_token(&conn, now).is_none());

        conn.expires_at = (now + Duration::hours(1)).timestamp_millis();
        conn.access_token = None;
        assert!(usable_token(&conn, now).is_none());
    }

    #[test]
    fn test_expiry_from_lifetime_saturates() {
        let now = Utc::now();
        assert_eq!(
            expiry_from_lifetime(now, 3600),
            now.timestamp_millis() + 3_600_000
        );
        assert_eq!(expiry_from_lifetime(now, i64::MAX), i64::MAX);
    }
}
