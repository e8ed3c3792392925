// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - TikTok connection records (tokens, daily counter, creator info)
//! - Publish receipts (idempotency)

use crate::db::{collections, receipt_id, SettingsStore};
use crate::error::AppError;
use crate::models::{CreatorInfo, PostCounter, PublishReceipt, TenantConnection, TokenGrant};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator takes no credentials; skip the ADC lookup entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Store a full connection record (account linking, tests).
    pub async fn set_connection(
        &self,
        tenant_id: &str,
        conn: &TenantConnection,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TIKTOK_SETTINGS)
            .document_id(tenant_id)
            .object(conn)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a connection record (disconnect).
    pub async fn delete_connection(&self, tenant_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TIKTOK_SETTINGS)
            .document_id(tenant_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write only `fields` of `patch` onto the tenant's record.
    ///
    /// Skipped when the record is gone so a late write never resurrects a
    /// disconnected tenant.
    async fn patch_connection<T>(
        &self,
        tenant_id: &str,
        fields: &[&str],
        patch: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        if self.get_connection(tenant_id).await?.is_none() {
            tracing::warn!(
                tenant_id,
                fields = ?fields,
                "Connection not found, dropping update"
            );
            return Ok(());
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields.iter().copied())
            .in_col(collections::TIKTOK_SETTINGS)
            .document_id(tenant_id)
            .object(patch)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FirestoreDb {
    async fn get_connection(&self, tenant_id: &str) -> Result<Option<TenantConnection>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TIKTOK_SETTINGS)
            .obj()
            .one(tenant_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_tokens(&self, tenant_id: &str, grant: &TokenGrant) -> Result<(), AppError> {
        self.patch_connection(tenant_id, &TokenGrant::FIELDS, grant)
            .await
    }

    async fn update_post_counter(
        &self,
        tenant_id: &str,
        counter: &PostCounter,
    ) -> Result<(), AppError> {
        self.patch_connection(tenant_id, &PostCounter::FIELDS, counter)
            .await
    }

    async fn update_creator_info(
        &self,
        tenant_id: &str,
        info: &CreatorInfo,
    ) -> Result<(), AppError> {
        self.patch_connection(tenant_id, &CreatorInfo::FIELDS, info)
            .await
    }

    async fn find_receipt(
        &self,
        tenant_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<PublishReceipt>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PUBLISH_RECEIPTS)
            .obj()
            .one(&receipt_id(tenant_id, idempotency_key))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn save_receipt(&self, receipt: &PublishReceipt) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PUBLISH_RECEIPTS)
            .document_id(receipt_id(&receipt.tenant_id, &receipt.idempotency_key))
            .object(receipt)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
