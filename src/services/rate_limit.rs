// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-tenant daily post quota with lazy UTC-day rollover.

use crate::db::SettingsStore;
use crate::error::AppError;
use crate::models::{PostCounter, TenantConnection};
use crate::time_utils::format_utc_rfc3339;
use chrono::Utc;
use std::sync::Arc;

/// Compute the counter after reserving one post for `today`.
///
/// A counter stamped with another day counts as zero.
pub fn reserve_slot(
    conn: &TenantConnection,
    today: &str,
    limit: u32,
) -> Result<PostCounter, AppError> {
    let current = if conn.posts_last_reset == today {
        conn.posts_today
    } else {
        0
    };

    if current >= limit {
        return Err(AppError::RateLimited {
            posts_today: current,
            limit,
        });
    }

    Ok(PostCounter {
        posts_today: current + 1,
        posts_last_reset: today.to_string(),
        updated_at: format_utc_rfc3339(Utc::now()),
    })
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn SettingsStore>,
    daily_limit: u32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn SettingsStore>, daily_limit: u32) -> Self {
        Self { store, daily_limit }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Reserve one post for `today` and persist the counter.
    ///
    /// The reservation stands even if the counter write fails; that is
    /// logged and the publish goes ahead.
    pub async fn check_and_increment(
        &self,
        tenant_id: &str,
        conn: &mut TenantConnection,
        today: &str,
    ) -> Result<PostCounter, AppError> {
        if conn.posts_last_reset != today {
            tracing::debug!(
                tenant_id,
                last_reset = %conn.posts_last_reset,
                "New day, resetting post counter"
            );
        }

        let counter = reserve_slot(conn, today, self.daily_limit).inspect_err(|_| {
            tracing::info!(tenant_id, limit = self.daily_limit, "Daily post limit reached");
        })?;

        if let Err(e) = self.store.update_post_counter(tenant_id, &counter).await {
            tracing::warn!(tenant_id, error = %e, "Failed to persist post counter");
        }
        counter.apply_to(conn);

        Ok(counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemorySettingsStore;

    fn conn(posts_today: u32, last_reset: &str) -> TenantConnection {
        TenantConnection {
            tenant_id: "t1".into(),
            posts_today,
            posts_last_reset: last_reset.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_same_day_increments() {
        let counter = reserve_slot(&conn(3, "2026-10-18"), "2026-10-18", 10).unwrap();
        assert_eq!(counter.posts_today, 4);
        assert_eq!(counter.posts_last_reset, "2026-10-18");
    }

    #[test]
    fn test_new_day_resets_before_check() {
        // Yesterday's full counter does not block today
        let counter = reserve_slot(&conn(10, "2026-10-17"), "2026-10-18", 10).unwrap();
        assert_eq!(counter.posts_today, 1);
    }

    #[test]
    fn test_never_reset_counts_as_zero() {
        let counter = reserve_slot(&conn(7, ""), "2026-10-18", 10).unwrap();
        assert_eq!(counter.posts_today, 1);
    }

    #[test]
    fn test_limit_reached() {
        let err = reserve_slot(&conn(10, "2026-10-18"), "2026-10-18", 10).unwrap_err();
        match err {
            AppError::RateLimited { posts_today, limit } => {
                assert_eq!(posts_today, 10);
                assert_eq!(limit, 10);
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_and_increment_persists_counter() {
        let store = Arc::new(InMemorySettingsStore::new());
        store.put_connection("t1", conn(2, "2026-10-18"));
        let limiter = RateLimiter::new(store.clone(), 10);

        let mut c = conn(2, "2026-10-18");
        limiter
            .check_and_increment("t1", &mut c, "2026-10-18")
            .await
            .unwrap();

        assert_eq!(c.posts_today, 3);
        let stored = store.get_connection("t1").await.unwrap().unwrap();
        assert_eq!(stored.posts_today, 3);
        assert_eq!(stored.posts_last_reset, "2026-10-18");
    }

    #[tokio::test]
    async fn test_rejection_leaves_counter_untouched() {
        let store = Arc::new(InMemorySettingsStore::new());
        store.put_connection("t1", conn(10, "2026-10-18"));
        let limiter = RateLimiter::new(store.clone(), 10);

        let mut c = conn(10, "2026-10-18");
        assert!(limiter
            .check_and_increment("t1", &mut c, "2026-10-18")
            .await
            .is_err());

        let stored = store.get_connection("t1").await.unwrap().unwrap();
        assert_eq!(stored.posts_today, 10);
    }
}
