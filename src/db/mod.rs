// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Settings store: per-tenant connection records and publish receipts.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::InMemorySettingsStore;

use crate::error::AppError;
use crate::models::{CreatorInfo, PostCounter, PublishReceipt, TenantConnection, TokenGrant};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Collection names as constants.
pub mod collections {
    /// Connection records (keyed by tenant_id)
    pub const TIKTOK_SETTINGS: &str = "tiktok_settings";
    pub const PUBLISH_RECEIPTS: &str = "tiktok_publish_receipts";
}

/// Read-modify-write access to tenant connection state.
///
/// Each `update_*` touches only its own field group, so token refreshes,
/// counter bumps and capability caching never clobber each other. Updates
/// for a tenant whose record no longer exists are dropped.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_connection(&self, tenant_id: &str) -> Result<Option<TenantConnection>, AppError>;

    async fn update_tokens(&self, tenant_id: &str, grant: &TokenGrant) -> Result<(), AppError>;

    async fn update_post_counter(
        &self,
        tenant_id: &str,
        counter: &PostCounter,
    ) -> Result<(), AppError>;

    async fn update_creator_info(&self, tenant_id: &str, info: &CreatorInfo)
        -> Result<(), AppError>;

    async fn find_receipt(
        &self,
        tenant_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<PublishReceipt>, AppError>;

    async fn save_receipt(&self, receipt: &PublishReceipt) -> Result<(), AppError>;
}

/// Document ID for a receipt, scoped to the tenant.
pub fn receipt_id(tenant_id: &str, idempotency_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tenant_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(idempotency_key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_id_is_tenant_scoped() {
        assert_ne!(receipt_id("tenant-a", "post-1"), receipt_id("tenant-b", "post-1"));
        assert_eq!(receipt_id("tenant-a", "post-1"), receipt_id("tenant-a", "post-1"));
        // Separator keeps ("ab", "c") and ("a", "bc") apart
        assert_ne!(receipt_id("ab", "c"), receipt_id("a", "bc"));
        assert_eq!(receipt_id("t", "k").len(), 64);
    }
}
