use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use coursemart_config::{CorsConfig, JwtConfig, RegistrationConfig, StorageConfig};
use coursemart_core::{FileStorage, LocalFileStorage};
use coursemart_db::{PgContentRepository, PgEntitlementLookup, PgIdentityDirectory, init_db_pool};
use coursemart_delivery::{ContentDelivery, ContentRepository, EntitlementLookup, IdentityDirectory};

/// Environment-driven settings the handlers read.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub registration: RegistrationConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            cors: CorsConfig::from_env(),
            storage: StorageConfig::from_env(),
            registration: RegistrationConfig::from_env(),
        }
    }
}

/// The collaborators behind the delivery path.
#[derive(Clone)]
pub struct Ports {
    pub identities: Arc<dyn IdentityDirectory>,
    pub entitlements: Arc<dyn EntitlementLookup>,
    pub content: Arc<dyn ContentRepository>,
    pub storage: Arc<dyn FileStorage>,
}

impl Ports {
    /// Postgres repositories plus blobs on the local disk.
    pub fn postgres(db: &PgPool, storage: &StorageConfig) -> Self {
        Self {
            identities: Arc::new(PgIdentityDirectory::new(db.clone())),
            entitlements: Arc::new(PgEntitlementLookup::new(db.clone())),
            content: Arc::new(PgContentRepository::new(db.clone())),
            storage: Arc::new(LocalFileStorage::with_max_size(
                storage.base_dir.clone(),
                storage.max_upload_bytes,
            )),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub storage_config: StorageConfig,
    pub registration_config: RegistrationConfig,
    pub identities: Arc<dyn IdentityDirectory>,
    pub content: Arc<dyn ContentRepository>,
    pub storage: Arc<dyn FileStorage>,
    pub delivery: Arc<ContentDelivery>,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig, ports: Ports) -> Self {
        let delivery = ContentDelivery::new(
            ports.content.clone(),
            ports.entitlements,
            ports.storage.clone(),
        )
        .with_chunk_size(config.storage.chunk_size);

        Self {
            db,
            jwt_config: config.jwt,
            cors_config: config.cors,
            storage_config: config.storage,
            registration_config: config.registration,
            identities: ports.identities,
            content: ports.content,
            storage: ports.storage,
            delivery: Arc::new(delivery),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("jwt_config", &"[redacted]")
            .field("cors_config", &self.cors_config)
            .field("storage_config", &self.storage_config)
            .field("chunk_size", &self.delivery.chunk_size())
            .finish_non_exhaustive()
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = init_db_pool(&database_url)
        .await
        .context("failed to connect to database")?;

    let config = AppConfig::from_env();
    let ports = Ports::postgres(&db, &config.storage);

    Ok(AppState::new(db, config, ports))
}
