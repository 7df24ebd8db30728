//! Cache-aside decorator over a `SessionRepository`.
//!
//! Reads try the cache first and fall through to the wrapped store on a miss
//! or on any cache error. Writes go to the store first; the cache is updated
//! only after the store succeeded, and cache failures are logged, never
//! returned. The store stays the source of truth.
//!
//! A device-keyed entry must never outlive the pairing it describes: when an
//! update moves a session to another device (or drops it), the entry for the
//! old device is removed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{DomainError, SessionId};
use crate::domain::session::{ApiKey, DeviceIdentifier, Session, SessionName};
use crate::ports::{
    CacheError, PairingCodeFormat, SessionCache, SessionListQuery, SessionPage,
    SessionRepository,
};

use super::warmup::WarmupTasks;

/// Default deadline for a background warm-up pass.
pub const DEFAULT_WARM_TIMEOUT: Duration = Duration::from_secs(10);

/// `SessionRepository` that keeps a `SessionCache` aligned with a durable store.
pub struct CachedSessionRepository<R: ?Sized, C: ?Sized> {
    inner: Arc<R>,
    cache: Arc<C>,
    warmup: WarmupTasks,
    warm_timeout: Duration,
}

impl<R, C> CachedSessionRepository<R, C>
where
    R: SessionRepository + ?Sized,
    C: SessionCache + ?Sized + 'static,
{
    pub fn new(inner: Arc<R>, cache: Arc<C>) -> Self {
        Self {
            inner,
            cache,
            warmup: WarmupTasks::new(),
            warm_timeout: DEFAULT_WARM_TIMEOUT,
        }
    }

    pub fn with_warm_timeout(mut self, timeout: Duration) -> Self {
        self.warm_timeout = timeout;
        self
    }

    pub fn inner(&self) -> &Arc<R> {
        &self.inner
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Background warm-up tasks started by `get_all`.
    pub fn warmup_tasks(&self) -> &WarmupTasks {
        &self.warmup
    }

    /// Cache a session under its id and name keys.
    async fn populate(&self, session: &Session) {
        log_cache_failure(self.cache.set_session(session).await, session.id());
        log_cache_failure(self.cache.set_session_by_name(session).await, session.id());
    }

    /// Cache everything derived from a freshly written session.
    async fn refresh(&self, session: &Session) {
        self.populate(session).await;
        log_cache_failure(
            self.cache.set_status(session.id(), session.status()).await,
            session.id(),
        );
        if let Some(device) = session.device_identifier() {
            log_cache_failure(
                self.cache.set_device_identifier(session.id(), device).await,
                session.id(),
            );
            log_cache_failure(
                self.cache.set_session_by_device(device, session).await,
                session.id(),
            );
        }
        if session.pairing_code().is_none() {
            for format in PairingCodeFormat::ALL {
                log_cache_failure(
                    self.cache.delete_pairing_code(session.id(), format).await,
                    session.id(),
                );
            }
        }
    }
}

fn log_cache_failure(result: Result<(), CacheError>, id: &SessionId) {
    if let Err(e) = result {
        tracing::warn!(
            session_id = %id,
            operation = e.operation(),
            key = e.key(),
            error = %e,
            "Session cache write failed"
        );
    }
}

/// Logs a cache read outcome and turns it into "use this hit, or go to the store".
fn cache_hit(result: Result<Option<Session>, CacheError>, lookup: &str) -> Option<Session> {
    match result {
        Ok(Some(session)) => {
            tracing::debug!(session_id = %session.id(), lookup, "Session cache hit");
            Some(session)
        }
        Ok(None) => {
            tracing::debug!(lookup, "Session cache miss");
            None
        }
        Err(e) => {
            tracing::warn!(
                lookup,
                operation = e.operation(),
                key = e.key(),
                error = %e,
                "Session cache read failed, falling back to store"
            );
            None
        }
    }
}

#[async_trait]
impl<R, C> SessionRepository for CachedSessionRepository<R, C>
where
    R: SessionRepository + ?Sized,
    C: SessionCache + ?Sized + 'static,
{
    async fn create(&self, session: &Session) -> Result<(), DomainError> {
        self.inner.create(session).await?;
        self.populate(session).await;
        Ok(())
    }

    async fn create_with_generated_id(&self, session: &Session) -> Result<SessionId, DomainError> {
        let id = self.inner.create_with_generated_id(session).await?;
        match self.inner.get_by_id(&id).await {
            Ok(Some(stored)) => self.populate(&stored).await,
            Ok(None) => {
                tracing::warn!(session_id = %id, "Created session not readable for caching")
            }
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Failed to re-read created session")
            }
        }
        Ok(id)
    }

    async fn get_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        if let Some(session) = cache_hit(self.cache.get_session(id).await, "id") {
            return Ok(Some(session));
        }
        let found = self.inner.get_by_id(id).await?;
        if let Some(session) = &found {
            log_cache_failure(self.cache.set_session(session).await, session.id());
        }
        Ok(found)
    }

    async fn get_by_name(&self, name: &SessionName) -> Result<Option<Session>, DomainError> {
        if let Some(session) = cache_hit(self.cache.get_session_by_name(name).await, "name") {
            return Ok(Some(session));
        }
        let found = self.inner.get_by_name(name).await?;
        if let Some(session) = &found {
            self.populate(session).await;
        }
        Ok(found)
    }

    async fn get_by_api_key(&self, key: &ApiKey) -> Result<Option<Session>, DomainError> {
        self.inner.get_by_api_key(key).await
    }

    async fn get_by_device_identifier(
        &self,
        device: &DeviceIdentifier,
    ) -> Result<Option<Session>, DomainError> {
        if let Some(session) = cache_hit(self.cache.get_session_by_device(device).await, "device")
        {
            return Ok(Some(session));
        }
        let found = self.inner.get_by_device_identifier(device).await?;
        if let Some(session) = &found {
            log_cache_failure(
                self.cache.set_session_by_device(device, session).await,
                session.id(),
            );
            log_cache_failure(self.cache.set_session(session).await, session.id());
        }
        Ok(found)
    }

    async fn get_all(&self) -> Result<Vec<Session>, DomainError> {
        let sessions = self.inner.get_all().await?;

        if !sessions.is_empty() {
            let cache = Arc::clone(&self.cache);
            let batch = sessions.clone();
            self.warmup.spawn("get_all", self.warm_timeout, async move {
                let mut failed = 0usize;
                for session in &batch {
                    if let Err(e) = cache.set_session(session).await {
                        failed += 1;
                        tracing::debug!(session_id = %session.id(), error = %e, "Warm-up write failed");
                    }
                }
                if failed > 0 {
                    tracing::warn!(
                        failed,
                        total = batch.len(),
                        "Session cache warm-up finished with failures"
                    );
                } else {
                    tracing::debug!(total = batch.len(), "Session cache warmed");
                }
            });
        }

        Ok(sessions)
    }

    async fn list(&self, query: &SessionListQuery) -> Result<SessionPage, DomainError> {
        self.inner.list(query).await
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        let previous_device = self
            .inner
            .get_by_id(session.id())
            .await?
            .and_then(|stored| stored.device_identifier().cloned());
        self.inner.update(session).await?;

        if let Some(old) = previous_device {
            if session.device_identifier() != Some(&old) {
                log_cache_failure(self.cache.delete_session_by_device(&old).await, session.id());
                tracing::debug!(session_id = %session.id(), device = %old, "Dropped stale device entry");
            }
        }
        if session.device_identifier().is_none() {
            log_cache_failure(
                self.cache.delete_device_identifier(session.id()).await,
                session.id(),
            );
        }
        self.refresh(session).await;
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), DomainError> {
        let existing = self.inner.get_by_id(id).await?;
        self.inner.delete(id).await?;

        log_cache_failure(self.cache.delete_session(id).await, id);
        if let Some(session) = existing {
            log_cache_failure(self.cache.delete_session_by_name(session.name()).await, id);
            if let Some(device) = session.device_identifier() {
                log_cache_failure(self.cache.delete_session_by_device(device).await, id);
            }
        }
        Ok(())
    }

    async fn exists(&self, id: &SessionId) -> Result<bool, DomainError> {
        if let Ok(Some(_)) = self.cache.get_session(id).await {
            return Ok(true);
        }
        self.inner.exists(id).await
    }

    async fn get_active(&self) -> Result<Vec<Session>, DomainError> {
        self.inner.get_active().await
    }

    async fn get_inactive(&self) -> Result<Vec<Session>, DomainError> {
        self.inner.get_inactive().await
    }

    async fn clear_session_cache(&self, id: &SessionId) {
        match self.cache.get_device_identifier(id).await {
            Ok(Some(device)) => {
                log_cache_failure(self.cache.delete_session_by_device(&device).await, id)
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(session_id = %id, error = %e, "Could not read cached device"),
        }
        log_cache_failure(self.cache.delete_session(id).await, id);
        log_cache_failure(self.cache.delete_device_identifier(id).await, id);
        log_cache_failure(self.cache.delete_status(id).await, id);
        for format in PairingCodeFormat::ALL {
            log_cache_failure(self.cache.delete_pairing_code(id, format).await, id);
        }
        tracing::debug!(session_id = %id, "Session cache cleared");
    }
}

impl<R: ?Sized, C: ?Sized> std::fmt::Debug for CachedSessionRepository<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedSessionRepository")
            .field("warm_timeout", &self.warm_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::{InMemorySessionCache, NoopSessionCache};
    use crate::adapters::memory::InMemorySessionRepository;
    use crate::domain::foundation::{
        Clock, ErrorCode, ManualClock, SystemClock, UuidGenerator,
    };
    use crate::domain::session::{NewSession, SessionFactory, SessionStatus};

    fn factory() -> SessionFactory {
        SessionFactory::new(
            Arc::new(UuidGenerator),
            Arc::new(ManualClock::new(SystemClock.now())),
        )
    }

    fn session(name: &str) -> Session {
        factory().create(NewSession::named(SessionName::new(name).unwrap()))
    }

    fn cached() -> (
        Arc<InMemorySessionRepository>,
        Arc<InMemorySessionCache>,
        CachedSessionRepository<InMemorySessionRepository, InMemorySessionCache>,
    ) {
        let store = Arc::new(InMemorySessionRepository::new());
        let cache = Arc::new(InMemorySessionCache::in_memory());
        let repo = CachedSessionRepository::new(Arc::clone(&store), Arc::clone(&cache));
        (store, cache, repo)
    }

    #[tokio::test]
    async fn create_writes_store_then_cache() {
        let (store, cache, repo) = cached();
        let s = session("alice");

        repo.create(&s).await.unwrap();

        assert!(store.get_by_id(s.id()).await.unwrap().is_some());
        assert_eq!(cache.get_session(s.id()).await.unwrap(), Some(s.clone()));
        assert!(cache.get_session_by_name(s.name()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_store_write_leaves_cache_untouched() {
        let (store, cache, repo) = cached();
        let s = session("alice");
        store.fail_next_write(DomainError::new(ErrorCode::DatabaseError, "down"));

        assert!(repo.create(&s).await.is_err());
        assert_eq!(cache.get_session(s.id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_by_id_miss_reads_store_and_populates() {
        let (store, cache, repo) = cached();
        let s = session("alice");
        store.create(&s).await.unwrap();

        let found = repo.get_by_id(s.id()).await.unwrap();

        assert_eq!(found, Some(s.clone()));
        assert_eq!(cache.get_session(s.id()).await.unwrap(), Some(s));
    }

    #[tokio::test]
    async fn get_by_id_hit_skips_store() {
        let (store, cache, repo) = cached();
        let s = session("alice");
        cache.set_session(&s).await.unwrap();

        assert_eq!(repo.get_by_id(s.id()).await.unwrap(), Some(s));
        assert_eq!(store.read_count(), 0);
    }

    #[tokio::test]
    async fn cache_outage_falls_back_to_store() {
        let (store, cache, repo) = cached();
        let s = session("alice");
        store.create(&s).await.unwrap();
        cache.store().set_unavailable(true);

        assert_eq!(repo.get_by_id(s.id()).await.unwrap(), Some(s.clone()));
        assert_eq!(repo.get_by_name(s.name()).await.unwrap(), Some(s));
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let (store, _cache, repo) = cached();
        store.fail_next_read(DomainError::new(ErrorCode::DatabaseError, "down"));

        let s = session("alice");
        let err = repo.get_by_id(s.id()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[tokio::test]
    async fn get_by_name_populates_both_keys() {
        let (store, cache, repo) = cached();
        let s = session("alice");
        store.create(&s).await.unwrap();

        repo.get_by_name(s.name()).await.unwrap();

        assert!(cache.get_session(s.id()).await.unwrap().is_some());
        assert!(cache.get_session_by_name(s.name()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_refreshes_status_and_device_keys() {
        let (_store, cache, repo) = cached();
        let mut s = session("alice");
        repo.create(&s).await.unwrap();

        s.connect(&SystemClock).unwrap();
        let device = DeviceIdentifier::new("5511@s.whatsapp.net").unwrap();
        s.mark_authenticated(device.clone(), &SystemClock).unwrap();
        repo.update(&s).await.unwrap();

        assert_eq!(
            cache.get_status(s.id()).await.unwrap(),
            Some(SessionStatus::Connected)
        );
        assert_eq!(cache.get_device_identifier(s.id()).await.unwrap(), Some(device.clone()));
        assert_eq!(
            cache.get_session_by_device(&device).await.unwrap().map(|c| c.status()),
            Some(SessionStatus::Connected)
        );
    }

    #[tokio::test]
    async fn device_change_drops_the_old_device_entry() {
        let (store, cache, repo) = cached();
        let mut s = session("alice");
        repo.create(&s).await.unwrap();
        let old = DeviceIdentifier::new("old@dev").unwrap();
        let new = DeviceIdentifier::new("new@dev").unwrap();

        s.set_device_identifier(old.as_str(), &SystemClock).unwrap();
        repo.update(&s).await.unwrap();
        assert!(repo.get_by_device_identifier(&old).await.unwrap().is_some());

        s.set_device_identifier(new.as_str(), &SystemClock).unwrap();
        repo.update(&s).await.unwrap();

        assert_eq!(store.get_by_device_identifier(&old).await.unwrap(), None);
        assert_eq!(cache.get_session_by_device(&old).await.unwrap(), None);
        assert_eq!(repo.get_by_device_identifier(&old).await.unwrap(), None);
        assert_eq!(
            repo.get_by_device_identifier(&new).await.unwrap().map(|c| *c.id()),
            Some(*s.id())
        );
    }

    #[tokio::test]
    async fn device_lookups_match_the_noop_backend_after_a_move() {
        let store = Arc::new(InMemorySessionRepository::new());
        let live = CachedSessionRepository::new(
            Arc::clone(&store),
            Arc::new(InMemorySessionCache::in_memory()),
        );
        let noop = CachedSessionRepository::new(Arc::clone(&store), Arc::new(NoopSessionCache));
        let mut s = session("alice");
        live.create(&s).await.unwrap();
        let old = DeviceIdentifier::new("old@dev").unwrap();

        s.set_device_identifier(old.as_str(), &SystemClock).unwrap();
        live.update(&s).await.unwrap();
        live.get_by_device_identifier(&old).await.unwrap();
        s.set_device_identifier("new@dev", &SystemClock).unwrap();
        live.update(&s).await.unwrap();

        assert_eq!(
            live.get_by_device_identifier(&old).await.unwrap(),
            noop.get_by_device_identifier(&old).await.unwrap()
        );
    }

    #[tokio::test]
    async fn update_of_a_missing_session_leaves_cache_untouched() {
        let (_store, cache, repo) = cached();
        let s = session("ghost");

        let err = repo.update(&s).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::SessionNotFound);
        assert_eq!(cache.get_session(s.id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_id_and_name_keys() {
        let (store, cache, repo) = cached();
        let s = session("alice");
        repo.create(&s).await.unwrap();

        repo.delete(s.id()).await.unwrap();

        assert!(store.get_by_id(s.id()).await.unwrap().is_none());
        assert_eq!(cache.get_session(s.id()).await.unwrap(), None);
        assert_eq!(cache.get_session_by_name(s.name()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_of_unknown_session_is_not_found() {
        let (_store, _cache, repo) = cached();
        let err = repo.delete(session("ghost").id()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn delete_survives_cache_outage() {
        let (store, cache, repo) = cached();
        let s = session("alice");
        repo.create(&s).await.unwrap();
        cache.store().set_unavailable(true);

        repo.delete(s.id()).await.unwrap();

        assert!(store.get_by_id(s.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn exists_trusts_a_cache_hit() {
        let (_store, cache, repo) = cached();
        let s = session("alice");
        cache.set_session(&s).await.unwrap();

        assert!(repo.exists(s.id()).await.unwrap());
    }

    #[tokio::test]
    async fn exists_falls_through_on_miss() {
        let (store, _cache, repo) = cached();
        let s = session("alice");
        store.create(&s).await.unwrap();

        assert!(repo.exists(s.id()).await.unwrap());
        assert!(!repo.exists(session("bob").id()).await.unwrap());
    }

    #[tokio::test]
    async fn get_all_warms_cache_in_background() {
        let (store, cache, repo) = cached();
        let a = session("alice");
        let b = session("bob");
        store.create(&a).await.unwrap();
        store.create(&b).await.unwrap();

        let all = repo.get_all().await.unwrap();
        repo.warmup_tasks().wait_idle().await;

        assert_eq!(all.len(), 2);
        assert!(cache.get_session(a.id()).await.unwrap().is_some());
        assert!(cache.get_session(b.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_warm_up_is_invisible_to_get_all() {
        let (store, cache, repo) = cached();
        let a = session("alice");
        let b = session("bob");
        store.create(&a).await.unwrap();
        store.create(&b).await.unwrap();
        cache.store().set_unavailable(true);

        let all = repo.get_all().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), repo.warmup_tasks().wait_idle())
            .await
            .expect("warm-up tasks finish");

        assert_eq!(all.len(), 2);
        cache.store().set_unavailable(false);
        assert_eq!(cache.get_session(a.id()).await.unwrap(), None);
        assert_eq!(repo.get_by_id(b.id()).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn create_with_generated_id_caches_under_new_id() {
        let (_store, cache, repo) = cached();
        let s = session("alice");

        let id = repo.create_with_generated_id(&s).await.unwrap();

        assert_ne!(&id, s.id());
        let cached = cache.get_session(&id).await.unwrap().unwrap();
        assert_eq!(cached.name(), s.name());
        assert_eq!(repo.get_by_id(&id).await.unwrap().map(|s| *s.id()), Some(id));
    }

    #[tokio::test]
    async fn clear_session_cache_sweeps_every_key_class() {
        let (_store, cache, repo) = cached();
        let s = session("alice");
        let device = DeviceIdentifier::new("5511@s.whatsapp.net").unwrap();
        cache.set_session(&s).await.unwrap();
        cache.set_session_by_device(&device, &s).await.unwrap();
        cache.set_device_identifier(s.id(), &device).await.unwrap();
        cache.set_status(s.id(), SessionStatus::Connected).await.unwrap();
        for format in PairingCodeFormat::ALL {
            cache.set_pairing_code(s.id(), format, "code").await.unwrap();
        }

        repo.clear_session_cache(s.id()).await;

        assert_eq!(cache.get_session(s.id()).await.unwrap(), None);
        assert_eq!(cache.get_session_by_device(&device).await.unwrap(), None);
        assert_eq!(cache.get_device_identifier(s.id()).await.unwrap(), None);
        assert_eq!(cache.get_status(s.id()).await.unwrap(), None);
        for format in PairingCodeFormat::ALL {
            assert_eq!(cache.get_pairing_code(s.id(), format).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn noop_backend_gives_identical_results() {
        let store = Arc::new(InMemorySessionRepository::new());
        let live = CachedSessionRepository::new(
            Arc::clone(&store),
            Arc::new(InMemorySessionCache::in_memory()),
        );
        let noop = CachedSessionRepository::new(Arc::clone(&store), Arc::new(NoopSessionCache));
        let s = session("alice");
        store.create(&s).await.unwrap();
        let missing = factory().create(NewSession::named(SessionName::new("bob").unwrap()));

        for _ in 0..2 {
            assert_eq!(
                live.get_by_id(s.id()).await.unwrap(),
                noop.get_by_id(s.id()).await.unwrap()
            );
            assert_eq!(
                live.get_by_id(missing.id()).await.unwrap(),
                noop.get_by_id(missing.id()).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn works_behind_trait_objects() {
        let store: Arc<dyn SessionRepository> = Arc::new(InMemorySessionRepository::new());
        let cache: Arc<dyn SessionCache> = Arc::new(NoopSessionCache);
        let repo: Arc<dyn SessionRepository> = Arc::new(CachedSessionRepository::new(store, cache));
        let s = session("alice");

        repo.create(&s).await.unwrap();

        assert!(repo.exists(s.id()).await.unwrap());
    }
}
