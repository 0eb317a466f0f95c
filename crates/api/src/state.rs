use std::sync::Arc;

use pms_core::allocator::SlotAllocator;
use pms_core::lifecycle::RequestLifecycle;
use pms_db::PgParkingStore;
use pms_events::EmailNotifier;

use crate::config::ServerConfig;

/// The request lifecycle as wired for production.
pub type ParkingLifecycle = RequestLifecycle<PgParkingStore, EmailNotifier>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pms_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Parking request lifecycle over the same pool.
    pub lifecycle: Arc<ParkingLifecycle>,
}

impl AppState {
    pub fn new(pool: pms_db::DbPool, config: ServerConfig, notifier: EmailNotifier) -> Self {
        let lifecycle = RequestLifecycle::new(
            PgParkingStore::new(pool.clone()),
            notifier,
            SlotAllocator::new(config.allocation_policy),
        );
        Self {
            pool,
            config: Arc::new(config),
            lifecycle: Arc::new(lifecycle),
        }
    }
}
