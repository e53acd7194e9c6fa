//! Shared application state.
//!
//! One `CoreState` is built at startup and shared by every request handler.
//! The services inside it all hold the same store handles, so a write made
//! through the lifecycle engine is immediately visible to the feed and the
//! listings.

use std::sync::Arc;

use crate::accounts::AccountService;
use crate::appointment::AppointmentLifecycle;
use crate::config::{AppConfig, StoreKind};
use crate::crypto::{CryptoError, PasswordHasher, TokenSigner};
use crate::db::{AccountStore, AppointmentStore, DatabaseError, MemoryStore, SqliteStore};
use crate::listing::AppointmentListing;
use crate::notifications::NotificationFeed;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Credential setup failed: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Cannot create data directory: {0}")]
    Io(#[from] std::io::Error),
}

// ═══════════════════════════════════════════════════════════
// CoreState: shared by every API handler
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub lifecycle: AppointmentLifecycle,
    pub feed: NotificationFeed,
    pub listing: AppointmentListing,
    pub accounts: AccountService,
}

impl CoreState {
    /// Wire services over the given stores.
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        accounts: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        signer: TokenSigner,
    ) -> Self {
        Self {
            lifecycle: AppointmentLifecycle::new(appointments.clone()),
            feed: NotificationFeed::new(appointments.clone()),
            listing: AppointmentListing::new(appointments),
            accounts: AccountService::new(accounts, hasher, Arc::new(signer)),
        }
    }

    /// Build from runtime configuration, opening (and migrating) the SQLite
    /// database when that store is selected.
    pub fn open(config: &AppConfig) -> Result<Self, CoreError> {
        let signer = TokenSigner::new(config.token_secret.as_bytes(), config.token_ttl)?;
        let hasher = PasswordHasher::default();

        match config.store {
            StoreKind::Memory => {
                tracing::warn!("Using in-memory store; data is lost on shutdown");
                let store = Arc::new(MemoryStore::new());
                Ok(Self::new(store.clone(), store, hasher, signer))
            }
            StoreKind::Sqlite => {
                if let Some(parent) = config.db_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let store = Arc::new(SqliteStore::open(&config.db_path)?);
                tracing::info!(path = %config.db_path.display(), "SQLite store opened");
                Ok(Self::new(store.clone(), store, hasher, signer))
            }
        }
    }

    /// Fully in-memory state with a cheap password hasher.
    pub fn in_memory(secret: &[u8]) -> Result<Self, CoreError> {
        let signer = TokenSigner::new(secret, chrono::Duration::hours(1))?;
        let store = Arc::new(MemoryStore::new());
        Ok(Self::new(store.clone(), store, PasswordHasher::new(1_000), signer))
    }
}
