//! Wiring from configuration to ready-to-use handler services.
//!
//! The session repository handed to handlers is always the cache-aside
//! decorator; with caching disabled (or the cache unreachable at startup) it
//! wraps the no-op cache instead of Redis.

use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::adapters::cache::{
    CachedSessionRepository, NoopSessionCache, RedisSessionCache, RedisStore,
};
use crate::adapters::postgres::PostgresSessionRepository;
use crate::application::handlers::session::{
    ResumeReport, ResumeSessionsHandler, SessionServices,
};
use crate::config::{AppConfig, CacheConfig, DatabaseConfig, StartupConfig};
use crate::domain::foundation::{DomainError, SystemClock, UuidGenerator};
use crate::ports::{ConnectionService, EventPublisher, SessionCache, SessionRepository};

/// Open the PostgreSQL pool.
pub async fn connect_database(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| DomainError::database("connect", e))
}

/// Pick the cache backend.
///
/// A Redis connection failure is logged and degrades to the no-op cache;
/// the gateway keeps serving from the store.
pub async fn connect_cache(config: &CacheConfig) -> Arc<dyn SessionCache> {
    if !config.enabled {
        tracing::info!("Session cache disabled");
        return Arc::new(NoopSessionCache::new());
    }

    match RedisStore::connect(config.url.expose_secret(), config.connect_timeout()).await {
        Ok(store) => {
            tracing::info!(prefix = %config.key_prefix, "Session cache connected");
            Arc::new(RedisSessionCache::new(
                Arc::new(store),
                config.keys(),
                config.ttls(),
            ))
        }
        Err(err) => {
            tracing::warn!(error = %err, "Session cache unavailable, running without it");
            Arc::new(NoopSessionCache::new())
        }
    }
}

/// Wrap a durable store in the cache-aside decorator.
pub fn cached_repository(
    store: Arc<dyn SessionRepository>,
    cache: Arc<dyn SessionCache>,
    config: &CacheConfig,
) -> Arc<dyn SessionRepository> {
    Arc::new(CachedSessionRepository::new(store, cache).with_warm_timeout(config.warm_timeout()))
}

/// Everything a transport layer needs to build handlers.
#[derive(Clone)]
pub struct Gateway {
    pub services: SessionServices,
    /// Raw cache access for pairing codes
    pub cache: Arc<dyn SessionCache>,
    pub startup: StartupConfig,
}

impl Gateway {
    /// Connect to the store and cache described by `config`.
    pub async fn from_config(
        config: &AppConfig,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, DomainError> {
        let pool = connect_database(&config.database).await?;
        let store = PostgresSessionRepository::new(pool);
        if config.database.run_migrations {
            store.migrate().await?;
        }

        let cache = connect_cache(&config.cache).await;
        Ok(Self::assemble(Arc::new(store), cache, publisher, config))
    }

    /// Build from already constructed adapters.
    pub fn assemble(
        store: Arc<dyn SessionRepository>,
        cache: Arc<dyn SessionCache>,
        publisher: Arc<dyn EventPublisher>,
        config: &AppConfig,
    ) -> Self {
        let repository = cached_repository(store, Arc::clone(&cache), &config.cache);
        let services = SessionServices::new(
            repository,
            publisher,
            Arc::new(UuidGenerator),
            Arc::new(SystemClock),
        );
        Self {
            services,
            cache,
            startup: config.startup.clone(),
        }
    }

    /// Kick off the background resume pass if enabled.
    pub fn start_resume(
        &self,
        connections: Arc<dyn ConnectionService>,
    ) -> Option<JoinHandle<ResumeReport>> {
        if !self.startup.resume_enabled {
            return None;
        }
        let handler = ResumeSessionsHandler::new(self.services.clone(), connections)
            .with_concurrency(self.startup.resume_concurrency);
        Some(Arc::new(handler).spawn(self.startup.resume_timeout()))
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("startup", &self.startup)
            .finish_non_exhaustive()
    }
}
