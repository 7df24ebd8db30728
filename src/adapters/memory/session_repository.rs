//! In-memory implementation of SessionRepository.
//!
//! Mirrors the durable store's contract (unique name and api key, not-found
//! on update/delete, ordering of listings) so the decorator and handlers can
//! be exercised without a database. Failures can be injected per call.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, IdGenerator, SessionId, UuidGenerator};
use crate::domain::session::{ApiKey, DeviceIdentifier, Session, SessionName};
use crate::ports::{SessionListQuery, SessionPage, SessionRepository};

pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<SessionId, Session>>,
    ids: Arc<dyn IdGenerator>,
    reads: AtomicUsize,
    fail_next_read: Mutex<Option<DomainError>>,
    fail_next_write: Mutex<Option<DomainError>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(UuidGenerator))
    }

    /// Ids for `create_with_generated_id` come from `ids`.
    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ids,
            reads: AtomicUsize::new(0),
            fail_next_read: Mutex::new(None),
            fail_next_write: Mutex::new(None),
        }
    }

    /// The next read operation returns `err`.
    pub fn fail_next_read(&self, err: DomainError) {
        *lock(&self.fail_next_read) = Some(err);
    }

    /// The next write operation returns `err` without changing anything.
    pub fn fail_next_write(&self, err: DomainError) {
        *lock(&self.fail_next_write) = Some(err);
    }

    /// Number of read operations served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn begin_read(&self) -> Result<(), DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match lock(&self.fail_next_read).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn begin_write(&self) -> Result<(), DomainError> {
        match lock(&self.fail_next_write).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn find<P>(&self, predicate: P) -> Result<Option<Session>, DomainError>
    where
        P: Fn(&Session) -> bool + Send,
    {
        self.begin_read()?;
        let sessions = self.sessions.read().await;
        Ok(sessions.values().find(|s| predicate(*s)).cloned())
    }

    async fn filtered<P>(&self, predicate: P) -> Result<Vec<Session>, DomainError>
    where
        P: Fn(&Session) -> bool + Send,
    {
        self.begin_read()?;
        let sessions = self.sessions.read().await;
        let mut matching: Vec<Session> = sessions
            .values()
            .filter(|s| predicate(*s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.created_at()
                .cmp(b.created_at())
                .then_with(|| a.name().as_str().cmp(b.name().as_str()))
        });
        Ok(matching)
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Persisted copy: no staged events, no tombstone.
fn stored(session: &Session) -> Session {
    Session::reconstitute(session.to_record())
}

fn ensure_unique(
    sessions: &HashMap<SessionId, Session>,
    candidate: &Session,
    id: &SessionId,
) -> Result<(), DomainError> {
    for other in sessions.values().filter(|s| s.id() != id) {
        if other.name() == candidate.name() {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Session name '{}' is already taken", candidate.name()),
            ));
        }
        if other.api_key() == candidate.api_key() {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                "API key is already assigned to another session",
            ));
        }
    }
    Ok(())
}

fn not_found(id: &SessionId) -> DomainError {
    DomainError::new(ErrorCode::SessionNotFound, format!("Session not found: {}", id))
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: &Session) -> Result<(), DomainError> {
        self.begin_write()?;
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Session {} already exists", session.id()),
            ));
        }
        ensure_unique(&sessions, session, session.id())?;
        sessions.insert(*session.id(), stored(session));
        Ok(())
    }

    async fn create_with_generated_id(&self, session: &Session) -> Result<SessionId, DomainError> {
        self.begin_write()?;
        let id = SessionId::generate(self.ids.as_ref());
        let mut record = session.to_record();
        record.id = id;
        let session = Session::reconstitute(record);

        let mut sessions = self.sessions.write().await;
        ensure_unique(&sessions, &session, &id)?;
        sessions.insert(id, session);
        Ok(id)
    }

    async fn get_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        self.begin_read()?;
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn get_by_name(&self, name: &SessionName) -> Result<Option<Session>, DomainError> {
        self.find(|s| s.name() == name).await
    }

    async fn get_by_api_key(&self, key: &ApiKey) -> Result<Option<Session>, DomainError> {
        self.find(|s| s.api_key() == key).await
    }

    async fn get_by_device_identifier(
        &self,
        device: &DeviceIdentifier,
    ) -> Result<Option<Session>, DomainError> {
        self.find(|s| s.device_identifier() == Some(device)).await
    }

    async fn get_all(&self) -> Result<Vec<Session>, DomainError> {
        self.filtered(|_| true).await
    }

    async fn list(&self, query: &SessionListQuery) -> Result<SessionPage, DomainError> {
        let status = query.status;
        let mut matching = self
            .filtered(|s| status.map_or(true, |wanted| s.status() == wanted))
            .await?;
        matching.reverse();

        let total = matching.len() as u64;
        let sessions = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok(SessionPage { sessions, total })
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        self.begin_write()?;
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(session.id()) {
            return Err(not_found(session.id()));
        }
        ensure_unique(&sessions, session, session.id())?;
        sessions.insert(*session.id(), stored(session));
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), DomainError> {
        self.begin_write()?;
        match self.sessions.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(not_found(id)),
        }
    }

    async fn exists(&self, id: &SessionId) -> Result<bool, DomainError> {
        self.begin_read()?;
        Ok(self.sessions.read().await.contains_key(id))
    }

    async fn get_active(&self) -> Result<Vec<Session>, DomainError> {
        self.filtered(|s| s.status().is_active()).await
    }

    async fn get_inactive(&self) -> Result<Vec<Session>, DomainError> {
        self.filtered(|s| !s.status().is_active()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Clock, ManualClock, SystemClock};
    use crate::domain::session::{NewSession, SessionFactory, SessionStatus};

    struct Fixture {
        factory: SessionFactory,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(SystemClock.now()));
            Self {
                factory: SessionFactory::new(Arc::new(UuidGenerator), clock.clone()),
                clock,
            }
        }

        fn session(&self, name: &str) -> Session {
            self.clock.advance_secs(1);
            self.factory
                .create(NewSession::named(SessionName::new(name).unwrap()))
        }
    }

    #[tokio::test]
    async fn create_then_get_by_every_key() {
        let fx = Fixture::new();
        let repo = InMemorySessionRepository::new();
        let s = fx.session("alice");

        repo.create(&s).await.unwrap();

        assert_eq!(repo.get_by_id(s.id()).await.unwrap(), Some(s.clone()));
        assert_eq!(repo.get_by_name(s.name()).await.unwrap(), Some(s.clone()));
        assert_eq!(repo.get_by_api_key(s.api_key()).await.unwrap(), Some(s.clone()));
        assert!(repo.exists(s.id()).await.unwrap());
    }

    #[tokio::test]
    async fn stored_copy_has_no_pending_events() {
        let fx = Fixture::new();
        let repo = InMemorySessionRepository::new();
        let s = fx.session("alice");
        assert!(!s.pending_events().is_empty());

        repo.create(&s).await.unwrap();

        let loaded = repo.get_by_id(s.id()).await.unwrap().unwrap();
        assert!(loaded.pending_events().is_empty());
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let fx = Fixture::new();
        let repo = InMemorySessionRepository::new();
        repo.create(&fx.session("alice")).await.unwrap();

        let err = repo.create(&fx.session("alice")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_session_are_not_found() {
        let fx = Fixture::new();
        let repo = InMemorySessionRepository::new();
        let s = fx.session("alice");

        assert_eq!(repo.update(&s).await.unwrap_err().code, ErrorCode::SessionNotFound);
        assert_eq!(repo.delete(s.id()).await.unwrap_err().code, ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn generated_id_differs_from_aggregate_id() {
        let fx = Fixture::new();
        let repo = InMemorySessionRepository::new();
        let s = fx.session("alice");

        let id = repo.create_with_generated_id(&s).await.unwrap();

        assert_ne!(&id, s.id());
        assert_eq!(repo.get_by_id(&id).await.unwrap().unwrap().name(), s.name());
        assert!(repo.get_by_id(s.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_pages_newest_first_with_total() {
        let fx = Fixture::new();
        let repo = InMemorySessionRepository::new();
        for name in ["alpha", "bravo", "charlie"] {
            repo.create(&fx.session(name)).await.unwrap();
        }

        let page = repo.list(&SessionListQuery::new(2, 0)).await.unwrap();
        assert_eq!(page.total, 3);
        let names: Vec<_> = page.sessions.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["charlie", "bravo"]);

        let rest = repo.list(&SessionListQuery::new(2, 2)).await.unwrap();
        assert_eq!(rest.sessions.len(), 1);
    }

    #[tokio::test]
    async fn list_filters_by_status_and_active_split() {
        let fx = Fixture::new();
        let repo = InMemorySessionRepository::new();
        let idle = fx.session("idle");
        let mut busy = fx.session("busy");
        busy.connect(&SystemClock).unwrap();
        repo.create(&idle).await.unwrap();
        repo.create(&busy).await.unwrap();

        let page = repo
            .list(&SessionListQuery::default().with_status(SessionStatus::Connecting))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.sessions[0].id(), busy.id());

        assert_eq!(repo.get_active().await.unwrap().len(), 1);
        assert_eq!(repo.get_inactive().await.unwrap()[0].id(), idle.id());
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let fx = Fixture::new();
        let repo = InMemorySessionRepository::new();
        let s = fx.session("alice");
        repo.fail_next_write(DomainError::new(ErrorCode::DatabaseError, "down"));

        assert!(repo.create(&s).await.is_err());
        assert!(repo.create(&s).await.is_ok());

        repo.fail_next_read(DomainError::new(ErrorCode::DatabaseError, "down"));
        assert!(repo.get_by_id(s.id()).await.is_err());
        assert!(repo.get_by_id(s.id()).await.is_ok());
    }
}
