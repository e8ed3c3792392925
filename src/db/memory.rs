// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local settings store used by tests and local development.

use crate::db::{receipt_id, SettingsStore};
use crate::error::AppError;
use crate::models::{CreatorInfo, PostCounter, PublishReceipt, TenantConnection, TokenGrant};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory [`SettingsStore`] backed by concurrent maps.
#[derive(Clone, Default)]
pub struct InMemorySettingsStore {
    connections: Arc<DashMap<String, TenantConnection>>,
    receipts: Arc<DashMap<String, PublishReceipt>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a full connection record (account linking).
    pub fn put_connection(&self, tenant_id: &str, mut conn: TenantConnection) {
        conn.tenant_id = tenant_id.to_string();
        self.connections.insert(tenant_id.to_string(), conn);
    }

    /// Remove a tenant's record (disconnect).
    pub fn remove_connection(&self, tenant_id: &str) {
        self.connections.remove(tenant_id);
    }

    fn update_existing<F>(&self, tenant_id: &str, what: &str, apply: F)
    where
        F: FnOnce(&mut TenantConnection),
    {
        match self.connections.get_mut(tenant_id) {
            Some(mut conn) => apply(&mut conn),
            None => {
                tracing::warn!(tenant_id, what, "Connection not found, dropping update");
            }
        }
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get_connection(&self, tenant_id: &str) -> Result<Option<TenantConnection>, AppError> {
        Ok(self.connections.get(tenant_id).map(|c| c.clone()))
    }

    async fn update_tokens(&self, tenant_id: &str, grant: &TokenGrant) -> Result<(), AppError> {
        self.update_existing(tenant_id, "tokens", |conn| grant.apply_to(conn));
        Ok(())
    }

    async fn update_post_counter(
        &self,
        tenant_id: &str,
        counter: &PostCounter,
    ) -> Result<(), AppError> {
        self.update_existing(tenant_id, "post_counter", |conn| counter.apply_to(conn));
        Ok(())
    }

    async fn update_creator_info(
        &self,
        tenant_id: &str,
        info: &CreatorInfo,
    ) -> Result<(), AppError> {
        self.update_existing(tenant_id, "creator_info", |conn| {
            conn.creator_info = info.clone()
        });
        Ok(())
    }

    async fn find_receipt(
        &self,
        tenant_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<PublishReceipt>, AppError> {
        Ok(self
            .receipts
            .get(&receipt_id(tenant_id, idempotency_key))
            .map(|r| r.clone()))
    }

    async fn save_receipt(&self, receipt: &PublishReceipt) -> Result<(), AppError> {
        self.receipts.insert(
            receipt_id(&receipt.tenant_id, &receipt.idempotency_key),
            receipt.clone(),
        );
        Ok(())
    }
}
