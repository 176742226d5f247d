//! Wiring for the schema migrator: storage, cipher, driver, service and routes.

use std::sync::Arc;

use anyhow::Context as _;
use schema_migrator_sdk::SchemaMigratorClientV1;
use sea_orm_migration::MigratorTrait;
use tenant_db::DbHandle;
use tracing::{info, warn};

use crate::api::rest::routes;
use crate::config::SchemaMigratorConfig;
use crate::domain::ports::AuthnResolver;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::authn::StaticTokenResolver;
use crate::infra::crypto::ChaChaConfigCipher;
use crate::infra::driver::SeaOrmDriver;
use crate::infra::storage::SeaOrmConfigStore;
use crate::infra::storage::migrations::Migrator;
use crate::local_client::SchemaMigratorLocalClient;

/// Schema migrator module.
///
/// Owns the service built over the application database and exposes it as
/// an axum router and as an in-process [`SchemaMigratorClientV1`].
#[derive(Clone)]
pub struct SchemaMigratorModule {
    service: Arc<Service>,
    authn: Arc<dyn AuthnResolver>,
}

impl SchemaMigratorModule {
    /// Run the module's migrations on `db` and build the service.
    ///
    /// # Errors
    /// Fails if the migrations fail or the encryption key is unusable.
    pub async fn init(db: &DbHandle, cfg: &SchemaMigratorConfig) -> anyhow::Result<Self> {
        info!("Initializing schema_migrator module");

        Migrator::up(db.sea(), None)
            .await
            .context("schema_migrator migrations failed")?;

        let cipher = ChaChaConfigCipher::from_base64_key(&cfg.encryption_key)
            .context("schema_migrator.encryption_key")?;
        let store = Arc::new(SeaOrmConfigStore::new(db.sea().clone(), Arc::new(cipher)));
        let driver = Arc::new(SeaOrmDriver::new(
            &cfg.tenant_sqlite_dir,
            cfg.connect_timeout,
            cfg.max_connections,
        ));
        let service = Arc::new(Service::new(
            store,
            driver,
            &ServiceConfig {
                default_string_length: cfg.default_string_length,
            },
        ));

        if cfg.tokens.is_empty() {
            warn!("No static tokens configured; every API request will be rejected");
        }
        let authn = Arc::new(StaticTokenResolver::new(cfg.tokens.clone()));

        info!(
            tenant_sqlite_dir = %cfg.tenant_sqlite_dir.display(),
            tokens = cfg.tokens.len(),
            "schema_migrator module initialized"
        );
        Ok(Self { service, authn })
    }

    #[must_use]
    pub fn router(&self) -> axum::Router {
        routes::router(Arc::clone(&self.service), Arc::clone(&self.authn))
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn SchemaMigratorClientV1> {
        Arc::new(SchemaMigratorLocalClient::new(Arc::clone(&self.service)))
    }
}
