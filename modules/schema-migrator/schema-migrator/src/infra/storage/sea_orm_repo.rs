use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use schema_migrator_sdk::TenantConnectionConfig;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait, sea_query::OnConflict};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::domain::ports::{ConfigCipher, ConfigError, TenantConfigProvider};

use super::entity::{self, Entity as ConfigEntity};

/// Tenant configs in the application database, sealed with a [`ConfigCipher`].
pub struct SeaOrmConfigStore {
    db: DatabaseConnection,
    cipher: Arc<dyn ConfigCipher>,
}

impl SeaOrmConfigStore {
    #[must_use]
    pub fn new(db: DatabaseConnection, cipher: Arc<dyn ConfigCipher>) -> Self {
        Self { db, cipher }
    }
}

fn storage(e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Storage(e.to_string())
}

#[async_trait]
impl TenantConfigProvider for SeaOrmConfigStore {
    async fn store(
        &self,
        tenant_id: Uuid,
        config: &TenantConnectionConfig,
    ) -> Result<(), ConfigError> {
        let mut plaintext = serde_json::to_vec(config).map_err(storage)?;
        let sealed = self.cipher.seal(&plaintext);
        plaintext.zeroize();

        let active_model = entity::ActiveModel {
            tenant_id: ActiveValue::Set(tenant_id),
            ciphertext: ActiveValue::Set(sealed.map_err(storage)?),
            updated_at: ActiveValue::Set(Utc::now()),
        };

        ConfigEntity::insert(active_model)
            .on_conflict(
                OnConflict::column(entity::Column::TenantId)
                    .update_columns([entity::Column::Ciphertext, entity::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(storage)?;

        tracing::debug!(%tenant_id, "Stored tenant connection config");
        Ok(())
    }

    async fn load(&self, tenant_id: Uuid) -> Result<TenantConnectionConfig, ConfigError> {
        let row = ConfigEntity::find_by_id(tenant_id)
            .one(&self.db)
            .await
            .map_err(storage)?
            .ok_or(ConfigError::Missing(tenant_id))?;

        let mut plaintext = self
            .cipher
            .open(&row.ciphertext)
            .map_err(|e| ConfigError::Corrupt(e.to_string()))?;
        let parsed = serde_json::from_slice::<TenantConnectionConfig>(&plaintext)
            .map_err(|e| ConfigError::Corrupt(e.to_string()));
        plaintext.zeroize();
        parsed
    }
}
