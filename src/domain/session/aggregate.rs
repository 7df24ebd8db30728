//! Session aggregate entity.
//!
//! A session tracks one external device-pairing context: its connection
//! status, the device it is paired with, and its per-session configuration.
//!
//! # Event staging
//!
//! Every successful mutation stages exactly one `SessionEvent`. A rejected
//! mutation leaves the aggregate untouched and stages nothing. Callers drain
//! the staged events with `take_events()` only after the repository write
//! succeeded.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::foundation::{
    Clock, DomainError, ErrorCode, IdGenerator, SessionId, StateMachine, Timestamp,
};

use super::{
    ApiKey, ConfigurationField, DeviceIdentifier, PairingCode, ProxyConfiguration,
    SessionEvent, SessionName, SessionStatus, WebhookEndpoint,
};

/// Session aggregate.
///
/// # Invariants
///
/// - `id` never changes
/// - `status` only moves along the `SessionStatus` transition table
/// - a deleted (tombstoned) session rejects every further mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    name: SessionName,
    status: SessionStatus,
    device_identifier: Option<DeviceIdentifier>,
    pairing_code: Option<PairingCode>,
    proxy: Option<ProxyConfiguration>,
    webhook: Option<WebhookEndpoint>,
    api_key: ApiKey,
    last_error: Option<String>,
    connected_at: Option<Timestamp>,
    #[serde(default)]
    deleted_at: Option<Timestamp>,
    created_at: Timestamp,
    updated_at: Timestamp,
    #[serde(skip)]
    pending_events: Vec<SessionEvent>,
}

/// Persisted form of a session, used to rebuild the aggregate.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: SessionId,
    pub name: SessionName,
    pub status: SessionStatus,
    pub device_identifier: Option<DeviceIdentifier>,
    pub pairing_code: Option<PairingCode>,
    pub proxy: Option<ProxyConfiguration>,
    pub webhook: Option<WebhookEndpoint>,
    pub api_key: ApiKey,
    pub last_error: Option<String>,
    pub connected_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub name: SessionName,
    pub api_key: Option<ApiKey>,
    pub webhook: Option<WebhookEndpoint>,
    pub proxy: Option<ProxyConfiguration>,
}

impl NewSession {
    pub fn named(name: SessionName) -> Self {
        Self {
            name,
            api_key: None,
            webhook: None,
            proxy: None,
        }
    }
}

/// Builds new sessions from injected id and time sources.
#[derive(Clone)]
pub struct SessionFactory {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl SessionFactory {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    /// Creates a Disconnected session with a generated id.
    pub fn create(&self, draft: NewSession) -> Session {
        let id = SessionId::generate(self.ids.as_ref());
        self.create_with_id(id, draft)
    }

    /// Creates a Disconnected session with a caller-supplied id.
    pub fn create_with_id(&self, id: SessionId, draft: NewSession) -> Session {
        let now = self.clock.now();
        let api_key = draft
            .api_key
            .unwrap_or_else(|| ApiKey::generate(self.ids.as_ref()));

        let mut session = Session {
            id,
            name: draft.name,
            status: SessionStatus::Disconnected,
            device_identifier: None,
            pairing_code: None,
            proxy: draft.proxy,
            webhook: draft.webhook,
            api_key,
            last_error: None,
            connected_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            pending_events: Vec::new(),
        };
        session.stage(SessionEvent::Created {
            session_id: id,
            name: session.name.clone(),
            occurred_at: now,
        });
        session
    }

    pub fn ids(&self) -> &Arc<dyn IdGenerator> {
        &self.ids
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl Session {
    /// Reconstitute a session from persistence (no validation, no events).
    pub fn reconstitute(record: SessionRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            status: record.status,
            device_identifier: record.device_identifier,
            pairing_code: record.pairing_code,
            proxy: record.proxy,
            webhook: record.webhook,
            api_key: record.api_key,
            last_error: record.last_error,
            connected_at: record.connected_at,
            deleted_at: None,
            created_at: record.created_at,
            updated_at: record.updated_at,
            pending_events: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn name(&self) -> &SessionName {
        &self.name
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn device_identifier(&self) -> Option<&DeviceIdentifier> {
        self.device_identifier.as_ref()
    }

    pub fn pairing_code(&self) -> Option<&PairingCode> {
        self.pairing_code.as_ref()
    }

    pub fn proxy(&self) -> Option<&ProxyConfiguration> {
        self.proxy.as_ref()
    }

    pub fn webhook(&self) -> Option<&WebhookEndpoint> {
        self.webhook.as_ref()
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn connected_at(&self) -> Option<&Timestamp> {
        self.connected_at.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// A session is authenticated once a device has been paired with it.
    pub fn is_authenticated(&self) -> bool {
        self.device_identifier.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the persisted form of this session.
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            device_identifier: self.device_identifier.clone(),
            pairing_code: self.pairing_code.clone(),
            proxy: self.proxy.clone(),
            webhook: self.webhook.clone(),
            api_key: self.api_key.clone(),
            last_error: self.last_error.clone(),
            connected_at: self.connected_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Staged events
    // ─────────────────────────────────────────────────────────────────────────

    /// Events staged since the last drain.
    pub fn pending_events(&self) -> &[SessionEvent] {
        &self.pending_events
    }

    /// Drains the staged events.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Discards the staged events.
    pub fn clear_events(&mut self) {
        self.pending_events.clear();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a connection attempt.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Disconnected or Error
    /// - `SessionDeleted` if tombstoned
    pub fn connect(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;
        self.transition_to(SessionStatus::Connecting)?;

        let now = clock.now();
        self.last_error = None;
        self.updated_at = now;
        self.stage(SessionEvent::Connected {
            session_id: self.id,
            occurred_at: now,
        });
        Ok(())
    }

    /// Record that the device finished pairing.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Connecting
    pub fn mark_authenticated(
        &mut self,
        device: DeviceIdentifier,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;
        self.transition_to(SessionStatus::Connected)?;

        let now = clock.now();
        self.device_identifier = Some(device.clone());
        self.pairing_code = None;
        self.connected_at = Some(now);
        self.updated_at = now;
        self.stage(SessionEvent::Authenticated {
            session_id: self.id,
            device_identifier: device,
            occurred_at: now,
        });
        Ok(())
    }

    /// Disconnect the session.
    ///
    /// Returns `Ok(false)` without touching anything when the session is
    /// already Disconnected.
    pub fn disconnect(
        &mut self,
        reason: Option<String>,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        self.ensure_not_deleted()?;
        if self.status == SessionStatus::Disconnected {
            return Ok(false);
        }
        self.transition_to(SessionStatus::Disconnected)?;

        let now = clock.now();
        self.pairing_code = None;
        self.connected_at = None;
        self.updated_at = now;
        self.stage(SessionEvent::Disconnected {
            session_id: self.id,
            reason,
            occurred_at: now,
        });
        Ok(true)
    }

    /// Record a connection failure.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Connecting or Connected
    pub fn set_error(
        &mut self,
        message: impl Into<String>,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;
        self.transition_to(SessionStatus::Error)?;

        let message = message.into();
        let now = clock.now();
        self.last_error = Some(message.clone());
        self.pairing_code = None;
        self.connected_at = None;
        self.updated_at = now;
        self.stage(SessionEvent::Error {
            session_id: self.id,
            message,
            occurred_at: now,
        });
        Ok(())
    }

    /// Store a fresh pairing code.
    ///
    /// Blank input and an unchanged code are no-ops returning `Ok(false)`.
    ///
    /// # Errors
    ///
    /// - `BusinessRuleViolation` once connected and authenticated
    /// - `ValidationFailed` if the code is too long
    pub fn set_pairing_code(&mut self, code: &str, clock: &dyn Clock) -> Result<bool, DomainError> {
        self.ensure_not_deleted()?;
        if code.trim().is_empty() {
            return Ok(false);
        }
        if self.status == SessionStatus::Connected && self.is_authenticated() {
            return Err(DomainError::business_rule(
                "Pairing code cannot be set on an authenticated session",
            ));
        }
        if self.pairing_code.as_ref().map(PairingCode::as_str) == Some(code) {
            return Ok(false);
        }
        let code = PairingCode::new(code)?;

        let now = clock.now();
        self.pairing_code = Some(code);
        self.updated_at = now;
        self.stage(SessionEvent::PairingCodeIssued {
            session_id: self.id,
            occurred_at: now,
        });
        Ok(true)
    }

    /// Assign the device identifier outside of the pairing flow.
    ///
    /// Blank input and an unchanged identifier are no-ops returning `Ok(false)`.
    ///
    /// # Errors
    ///
    /// - `BusinessRuleViolation` when replacing the device of a connected session
    pub fn set_device_identifier(
        &mut self,
        device: &str,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        self.ensure_not_deleted()?;
        if device.trim().is_empty() {
            return Ok(false);
        }
        let device = DeviceIdentifier::new(device)?;
        if self.device_identifier.as_ref() == Some(&device) {
            return Ok(false);
        }
        if self.status == SessionStatus::Connected && self.is_authenticated() {
            return Err(DomainError::business_rule(
                "Device identifier cannot change while the session is connected",
            ));
        }

        self.device_identifier = Some(device);
        self.touch_configuration(ConfigurationField::DeviceIdentifier, clock);
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace or remove the outbound proxy.
    ///
    /// # Errors
    ///
    /// - `BusinessRuleViolation` while Connected
    pub fn update_proxy(
        &mut self,
        proxy: Option<ProxyConfiguration>,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;
        self.ensure_not_connected("Proxy cannot be changed while the session is connected")?;

        self.proxy = proxy;
        self.touch_configuration(ConfigurationField::Proxy, clock);
        Ok(())
    }

    /// Replace or remove the webhook endpoint.
    pub fn update_webhook(
        &mut self,
        webhook: Option<WebhookEndpoint>,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;

        self.webhook = webhook;
        self.touch_configuration(ConfigurationField::Webhook, clock);
        Ok(())
    }

    /// Swap in a new API key.
    ///
    /// # Errors
    ///
    /// - `BusinessRuleViolation` while Connected
    pub fn regenerate_api_key(&mut self, key: ApiKey, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;
        self.ensure_not_connected("API key cannot be regenerated while the session is connected")?;

        self.api_key = key;
        self.touch_configuration(ConfigurationField::ApiKey, clock);
        Ok(())
    }

    /// Tombstone the session ahead of physical removal.
    ///
    /// # Errors
    ///
    /// - `BusinessRuleViolation` unless Disconnected
    /// - `SessionDeleted` if already tombstoned
    pub fn delete(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;
        if self.status != SessionStatus::Disconnected {
            return Err(DomainError::business_rule(format!(
                "Deletion not allowed for {} session",
                self.status.as_str()
            ))
            .with_detail("current", self.status.to_string())
            .with_detail("required", SessionStatus::Disconnected.to_string()));
        }

        let now = clock.now();
        self.deleted_at = Some(now);
        self.updated_at = now;
        self.stage(SessionEvent::Deleted {
            session_id: self.id,
            name: self.name.clone(),
            occurred_at: now,
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn transition_to(&mut self, target: SessionStatus) -> Result<(), DomainError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| DomainError::invalid_transition(self.status, target))?;
        Ok(())
    }

    fn ensure_not_deleted(&self) -> Result<(), DomainError> {
        if self.is_deleted() {
            return Err(DomainError::new(
                ErrorCode::SessionDeleted,
                format!("Session {} has been deleted", self.id),
            ));
        }
        Ok(())
    }

    fn ensure_not_connected(&self, message: &str) -> Result<(), DomainError> {
        if self.status == SessionStatus::Connected {
            return Err(DomainError::business_rule(message)
                .with_detail("current", self.status.to_string()));
        }
        Ok(())
    }

    fn touch_configuration(&mut self, field: ConfigurationField, clock: &dyn Clock) {
        let now = clock.now();
        self.updated_at = now;
        self.stage(SessionEvent::ConfigurationChanged {
            session_id: self.id,
            field,
            occurred_at: now,
        });
    }

    fn stage(&mut self, event: SessionEvent) {
        self.pending_events.push(event);
    }
}

/// Staged events are transient and excluded from equality.
impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.status == other.status
            && self.device_identifier == other.device_identifier
            && self.pairing_code == other.pairing_code
            && self.proxy == other.proxy
            && self.webhook == other.webhook
            && self.api_key == other.api_key
            && self.last_error == other.last_error
            && self.connected_at == other.connected_at
            && self.deleted_at == other.deleted_at
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
    }
}

impl Eq for Session {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ManualClock, SequentialIdGenerator, SystemClock};
    use proptest::prelude::*;

    fn factory() -> SessionFactory {
        SessionFactory::new(
            Arc::new(SequentialIdGenerator::default()),
            Arc::new(ManualClock::new(SystemClock.now())),
        )
    }

    fn new_session(name: &str) -> Session {
        factory().create(NewSession::named(SessionName::new(name).unwrap()))
    }

    fn device() -> DeviceIdentifier {
        DeviceIdentifier::new("5511999999999@s.whatsapp.net").unwrap()
    }

    fn session_in(status: SessionStatus) -> Session {
        let mut record = new_session("alice").to_record();
        record.status = status;
        if status == SessionStatus::Connected {
            record.device_identifier = Some(device());
        }
        Session::reconstitute(record)
    }

    /// Drives the aggregate toward `target` with the mutator that owns it.
    fn request(session: &mut Session, target: SessionStatus) -> Result<(), DomainError> {
        let clock = SystemClock;
        match target {
            SessionStatus::Connecting => session.connect(&clock),
            SessionStatus::Connected => session.mark_authenticated(device(), &clock),
            SessionStatus::Disconnected => session.disconnect(None, &clock).map(|_| ()),
            SessionStatus::Error => session.set_error("boom", &clock),
        }
    }

    // Construction

    #[test]
    fn new_session_is_disconnected_and_stages_created() {
        let session = new_session("alice");
        assert_eq!(session.status(), SessionStatus::Disconnected);
        assert!(!session.is_authenticated());
        assert_eq!(session.pending_events().len(), 1);
        assert_eq!(session.pending_events()[0].event_type(), "session.created");
    }

    #[test]
    fn factory_generates_api_key_when_missing() {
        let session = new_session("alice");
        assert!(session.api_key().as_str().starts_with("sk_"));
    }

    #[test]
    fn factory_uses_supplied_id_and_clock() {
        let clock = Arc::new(ManualClock::new(SystemClock.now()));
        let factory = SessionFactory::new(Arc::new(SequentialIdGenerator::default()), clock.clone());
        let id = SessionId::generate(&SequentialIdGenerator::starting_at(41));

        let session =
            factory.create_with_id(id, NewSession::named(SessionName::new("alice").unwrap()));

        assert_eq!(session.id(), &id);
        assert_eq!(session.created_at(), &clock.now());
    }

    #[test]
    fn reconstitute_stages_nothing() {
        let session = Session::reconstitute(new_session("alice").to_record());
        assert!(session.pending_events().is_empty());
    }

    // State machine

    #[test]
    fn transitions_outside_the_table_are_rejected_without_side_effects() {
        for current in SessionStatus::ALL {
            for target in SessionStatus::ALL {
                if current.can_transition_to(&target) {
                    continue;
                }
                if current == SessionStatus::Disconnected && target == SessionStatus::Disconnected {
                    continue;
                }
                let mut session = session_in(current);
                let before = session.clone();

                let err = request(&mut session, target).unwrap_err();

                assert_eq!(err.code, ErrorCode::InvalidStateTransition, "{current:?} -> {target:?}");
                assert_eq!(session, before);
                assert!(session.pending_events().is_empty());
            }
        }
    }

    #[test]
    fn transitions_in_the_table_stage_exactly_one_event() {
        for current in SessionStatus::ALL {
            for target in current.valid_transitions() {
                let mut session = session_in(current);
                request(&mut session, target).unwrap();
                assert_eq!(session.status(), target);
                assert_eq!(session.pending_events().len(), 1, "{current:?} -> {target:?}");
            }
        }
    }

    #[test]
    fn connect_stages_connected_event() {
        let mut session = new_session("alice");
        session.clear_events();

        session.connect(&SystemClock).unwrap();

        assert_eq!(session.status(), SessionStatus::Connecting);
        let events = session.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "session.connected");
        assert!(session.pending_events().is_empty());
    }

    #[test]
    fn authentication_records_device_and_clears_pairing_code() {
        let mut session = session_in(SessionStatus::Connecting);
        session.set_pairing_code("2@qr-payload", &SystemClock).unwrap();
        session.clear_events();

        session.mark_authenticated(device(), &SystemClock).unwrap();

        assert_eq!(session.status(), SessionStatus::Connected);
        assert_eq!(session.device_identifier(), Some(&device()));
        assert!(session.pairing_code().is_none());
        assert!(session.connected_at().is_some());
        assert!(matches!(
            session.pending_events()[0],
            SessionEvent::Authenticated { .. }
        ));
    }

    #[test]
    fn disconnect_when_already_disconnected_is_a_silent_no_op() {
        let mut session = session_in(SessionStatus::Disconnected);
        let before = session.clone();

        let changed = session.disconnect(Some("again".into()), &SystemClock).unwrap();

        assert!(!changed);
        assert_eq!(session, before);
        assert!(session.pending_events().is_empty());
    }

    #[test]
    fn disconnect_keeps_device_for_resume() {
        let mut session = session_in(SessionStatus::Connected);
        assert!(session.disconnect(Some("logout".into()), &SystemClock).unwrap());
        assert_eq!(session.status(), SessionStatus::Disconnected);
        assert!(session.device_identifier().is_some());
        assert!(session.connected_at().is_none());
    }

    #[test]
    fn set_error_records_message() {
        let mut session = session_in(SessionStatus::Connecting);
        session.set_error("stream closed", &SystemClock).unwrap();
        assert_eq!(session.status(), SessionStatus::Error);
        assert_eq!(session.last_error(), Some("stream closed"));
    }

    #[test]
    fn connect_after_error_clears_last_error() {
        let mut session = session_in(SessionStatus::Connecting);
        session.set_error("stream closed", &SystemClock).unwrap();
        session.connect(&SystemClock).unwrap();
        assert!(session.last_error().is_none());
    }

    // Setters

    #[test]
    fn blank_setters_are_no_ops() {
        let mut session = session_in(SessionStatus::Connecting);
        assert!(!session.set_pairing_code("   ", &SystemClock).unwrap());
        assert!(!session.set_device_identifier("", &SystemClock).unwrap());
        assert!(session.pending_events().is_empty());
    }

    #[test]
    fn repeated_pairing_code_is_idempotent() {
        let mut session = session_in(SessionStatus::Connecting);
        assert!(session.set_pairing_code("2@abc", &SystemClock).unwrap());
        assert!(!session.set_pairing_code("2@abc", &SystemClock).unwrap());
        assert_eq!(session.pending_events().len(), 1);
    }

    #[test]
    fn pairing_code_rejected_once_authenticated() {
        let mut session = session_in(SessionStatus::Connected);
        let err = session.set_pairing_code("2@abc", &SystemClock).unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRuleViolation);
        assert!(session.pending_events().is_empty());
    }

    #[test]
    fn device_identifier_cannot_be_swapped_while_connected() {
        let mut session = session_in(SessionStatus::Connected);
        assert!(session.set_device_identifier("other@s.whatsapp.net", &SystemClock).is_err());
        assert!(!session
            .set_device_identifier(device().as_str(), &SystemClock)
            .unwrap());
    }

    #[test]
    fn proxy_and_api_key_locked_while_connected() {
        let mut session = session_in(SessionStatus::Connected);
        let proxy = ProxyConfiguration::parse("http://proxy.local:8080").unwrap();
        let key = ApiKey::new("abcdefghijklmnopqrstuvwxyz").unwrap();

        assert!(session.update_proxy(Some(proxy), &SystemClock).is_err());
        assert!(session.regenerate_api_key(key, &SystemClock).is_err());
        assert!(session.proxy().is_none());
        assert!(session.pending_events().is_empty());
    }

    #[test]
    fn configuration_changes_stage_field() {
        let mut session = session_in(SessionStatus::Disconnected);
        let proxy = ProxyConfiguration::parse("socks5://proxy.local:1080").unwrap();

        session.update_proxy(Some(proxy.clone()), &SystemClock).unwrap();

        assert_eq!(session.proxy(), Some(&proxy));
        assert!(matches!(
            session.pending_events()[0],
            SessionEvent::ConfigurationChanged {
                field: ConfigurationField::Proxy,
                ..
            }
        ));
    }

    #[test]
    fn webhook_can_change_while_connected() {
        let mut session = session_in(SessionStatus::Connected);
        let hook = WebhookEndpoint::new("https://hooks.example.com").unwrap();
        session.update_webhook(Some(hook), &SystemClock).unwrap();
        assert!(session.webhook().is_some());
    }

    // Deletion

    #[test]
    fn delete_requires_disconnected() {
        let mut session = session_in(SessionStatus::Connected);
        let err = session.delete(&SystemClock).unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRuleViolation);
        assert!(err.message.contains("connected"));
        assert!(!session.is_deleted());
    }

    #[test]
    fn delete_tombstones_and_blocks_further_mutation() {
        let mut session = session_in(SessionStatus::Disconnected);
        session.delete(&SystemClock).unwrap();

        assert!(session.is_deleted());
        assert_eq!(session.pending_events()[0].event_type(), "session.deleted");

        let err = session.connect(&SystemClock).unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionDeleted);
        assert_eq!(session.pending_events().len(), 1);
    }

    // Serialization

    #[test]
    fn json_round_trip_drops_pending_events_but_keeps_state() {
        let session = new_session("alice");
        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, session);
        assert!(restored.pending_events().is_empty());
    }

    proptest! {
        #[test]
        fn arbitrary_status_requests_never_stage_more_than_one_event(
            current in 0usize..4,
            target in 0usize..4,
        ) {
            let current = SessionStatus::ALL[current];
            let target = SessionStatus::ALL[target];
            let mut session = session_in(current);

            let outcome = request(&mut session, target);

            prop_assert!(session.pending_events().len() <= 1);
            if outcome.is_err() {
                prop_assert_eq!(session.status(), current);
                prop_assert!(session.pending_events().is_empty());
            }
        }
    }
}
