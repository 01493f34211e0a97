//! Application state shared by every handler

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{JwtConfig, JwtService, RateLimiter};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::orders::{OrderService, OrderStore, PgOrderStore, PricingConfig};
use crate::realtime::RealtimeHub;

/// Cloned into every request; all fields are cheap handles
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtService>,
    /// Listing/settings/dashboard cache
    pub cache: TtlCache,
    pub realtime: RealtimeHub,
    pub orders: OrderService,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// State backed by the PostgreSQL order store
    pub fn new(pool: PgPool, config: Config, realtime: RealtimeHub) -> Self {
        let store: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(pool.clone()));
        Self::with_order_store(pool, config, realtime, store)
    }

    pub fn with_order_store(
        pool: PgPool,
        config: Config,
        realtime: RealtimeHub,
        store: Arc<dyn OrderStore>,
    ) -> Self {
        let jwt = Arc::new(JwtService::with_config(JwtConfig::from(&config)));
        let cache = TtlCache::new(Duration::from_secs(config.cache_ttl_secs));
        let orders = OrderService::new(store, PricingConfig::from(&config), realtime.clone());
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            cache,
            realtime,
            orders,
            rate_limiter: RateLimiter::new(),
        }
    }

    /// Public URL for a stored upload
    pub fn upload_url(&self, filename: &str) -> String {
        format!(
            "{}/uploads/{filename}",
            self.config.public_base_url.trim_end_matches('/')
        )
    }
}
