//! Shared fixtures for the handler tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::adapters::events::InMemoryEventBus;
use crate::adapters::memory::InMemorySessionRepository;
use crate::domain::foundation::{
    Clock, DomainError, ErrorCode, ManualClock, SessionId, SystemClock, UuidGenerator,
};
use crate::domain::session::{NewSession, Session, SessionName};
use crate::ports::{ConnectionService, SessionRepository};

use super::SessionServices;

pub struct Harness {
    pub services: SessionServices,
    pub repository: Arc<InMemorySessionRepository>,
    pub bus: Arc<InMemoryEventBus>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        let repository = Arc::new(InMemorySessionRepository::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let clock = Arc::new(ManualClock::new(SystemClock.now()));
        let services = SessionServices::new(
            repository.clone(),
            bus.clone(),
            Arc::new(UuidGenerator),
            clock.clone(),
        );
        Self {
            services,
            repository,
            bus,
            clock,
        }
    }

    /// Store a fresh Disconnected session and forget its creation event.
    pub async fn seed(&self, name: &str) -> Session {
        let mut session = self
            .services
            .factory()
            .create(NewSession::named(SessionName::new(name).unwrap()));
        session.clear_events();
        self.repository.create(&session).await.unwrap();
        session
    }

    /// Store a session that went through connect and authentication.
    pub async fn seed_connected(&self, name: &str, device: &str) -> Session {
        let mut session = self.seed(name).await;
        session.connect(self.clock.as_ref()).unwrap();
        session
            .mark_authenticated(
                crate::domain::session::DeviceIdentifier::new(device).unwrap(),
                self.clock.as_ref(),
            )
            .unwrap();
        session.clear_events();
        self.repository.update(&session).await.unwrap();
        session
    }

    pub async fn stored(&self, id: &SessionId) -> Option<Session> {
        self.repository.get_by_id(id).await.unwrap()
    }

    pub fn now(&self) -> crate::domain::foundation::Timestamp {
        self.clock.now()
    }
}

/// Records calls and fails on demand.
#[derive(Default)]
pub struct StubConnectionService {
    pub connected: Mutex<HashSet<SessionId>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_connect: AtomicBool,
    pub fail_disconnect: AtomicBool,
}

impl StubConnectionService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn unavailable(what: &str) -> DomainError {
        DomainError::new(
            ErrorCode::ExternalServiceError,
            format!("{} failed: service unavailable", what),
        )
    }
}

#[async_trait]
impl ConnectionService for StubConnectionService {
    async fn connect(&self, id: &SessionId) -> Result<(), DomainError> {
        self.record(format!("connect:{}", id));
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(Self::unavailable("connect"));
        }
        self.connected.lock().unwrap().insert(*id);
        Ok(())
    }

    async fn disconnect(&self, id: &SessionId) -> Result<(), DomainError> {
        self.record(format!("disconnect:{}", id));
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(Self::unavailable("disconnect"));
        }
        self.connected.lock().unwrap().remove(id);
        Ok(())
    }

    async fn pairing_code(&self, id: &SessionId) -> Result<Option<String>, DomainError> {
        self.record(format!("pairing_code:{}", id));
        Ok(Some(format!("2@{}", id)))
    }

    async fn pair_with_phone(&self, id: &SessionId, phone: &str) -> Result<String, DomainError> {
        self.record(format!("pair_with_phone:{}:{}", id, phone));
        Ok("ABCD-EFGH".to_string())
    }

    async fn is_connected(&self, id: &SessionId) -> Result<bool, DomainError> {
        Ok(self.connected.lock().unwrap().contains(id))
    }
}
