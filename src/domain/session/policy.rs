//! Session policy service.
//!
//! Pure predicates evaluated by the command handlers before they call an
//! aggregate mutator. They cover rules the transition table cannot express on
//! its own and never touch the aggregate or any I/O.

use crate::domain::foundation::DomainError;

use super::{Session, SessionStatus};

/// Stateless business rules over a `Session`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPolicy;

impl SessionPolicy {
    /// A connect request is accepted from Disconnected, Error, or while a
    /// previous attempt is still Connecting.
    pub fn can_connect(&self, session: &Session) -> bool {
        matches!(
            session.status(),
            SessionStatus::Disconnected | SessionStatus::Error | SessionStatus::Connecting
        )
    }

    pub fn can_disconnect(&self, session: &Session) -> bool {
        matches!(
            session.status(),
            SessionStatus::Connected | SessionStatus::Connecting
        )
    }

    pub fn can_delete(&self, session: &Session) -> bool {
        session.status() == SessionStatus::Disconnected
    }

    pub fn can_regenerate_api_key(&self, session: &Session) -> bool {
        session.status() != SessionStatus::Connected
    }

    pub fn can_set_proxy(&self, session: &Session) -> bool {
        session.status() != SessionStatus::Connected
    }

    /// A Connected session must carry a device identifier.
    pub fn validate_device_connection(&self, session: &Session) -> Result<(), DomainError> {
        if session.status() == SessionStatus::Connected && !session.is_authenticated() {
            return Err(DomainError::business_rule(
                "Connected session has no device identifier",
            )
            .with_detail("current", session.status().to_string()));
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Guard variants used by the handlers
    // ─────────────────────────────────────────────────────────────────────────

    pub fn ensure_can_connect(&self, session: &Session) -> Result<(), DomainError> {
        self.ensure(
            self.can_connect(session),
            session,
            "connect",
            "Disconnected or Error",
        )
    }

    pub fn ensure_can_disconnect(&self, session: &Session) -> Result<(), DomainError> {
        self.ensure(
            self.can_disconnect(session),
            session,
            "disconnect",
            "Connected or Connecting",
        )
    }

    pub fn ensure_can_delete(&self, session: &Session) -> Result<(), DomainError> {
        if self.can_delete(session) {
            return Ok(());
        }
        Err(DomainError::business_rule(format!(
            "Session deletion not allowed for {} session",
            session.status().as_str()
        ))
        .with_detail("current", session.status().to_string())
        .with_detail("required", SessionStatus::Disconnected.to_string()))
    }

    pub fn ensure_can_regenerate_api_key(&self, session: &Session) -> Result<(), DomainError> {
        self.ensure(
            self.can_regenerate_api_key(session),
            session,
            "regenerate the API key of",
            "not Connected",
        )
    }

    pub fn ensure_can_set_proxy(&self, session: &Session) -> Result<(), DomainError> {
        self.ensure(
            self.can_set_proxy(session),
            session,
            "change the proxy of",
            "not Connected",
        )
    }

    fn ensure(
        &self,
        allowed: bool,
        session: &Session,
        action: &str,
        required: &str,
    ) -> Result<(), DomainError> {
        if allowed {
            return Ok(());
        }
        Err(DomainError::business_rule(format!(
            "Cannot {} session: status is {} but must be {}",
            action,
            session.status(),
            required
        ))
        .with_detail("current", session.status().to_string())
        .with_detail("required", required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ErrorCode, SequentialIdGenerator, SessionId, SystemClock};
    use crate::domain::foundation::Clock;
    use crate::domain::session::{ApiKey, DeviceIdentifier, SessionName, SessionRecord};

    fn session(status: SessionStatus, device: Option<&str>) -> Session {
        let now = SystemClock.now();
        Session::reconstitute(SessionRecord {
            id: SessionId::generate(&SequentialIdGenerator::default()),
            name: SessionName::new("alice").unwrap(),
            status,
            device_identifier: device.map(|d| DeviceIdentifier::new(d).unwrap()),
            pairing_code: None,
            proxy: None,
            webhook: None,
            api_key: ApiKey::new("sk_0123456789abcdef").unwrap(),
            last_error: None,
            connected_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    #[test]
    fn connect_allowed_from_disconnected_error_and_connecting() {
        let policy = SessionPolicy;
        assert!(policy.can_connect(&session(SessionStatus::Disconnected, None)));
        assert!(policy.can_connect(&session(SessionStatus::Error, None)));
        assert!(policy.can_connect(&session(SessionStatus::Connecting, None)));
        assert!(!policy.can_connect(&session(SessionStatus::Connected, Some("dev"))));
    }

    #[test]
    fn disconnect_requires_live_connection() {
        let policy = SessionPolicy;
        assert!(policy.can_disconnect(&session(SessionStatus::Connected, Some("dev"))));
        assert!(policy.can_disconnect(&session(SessionStatus::Connecting, None)));
        assert!(!policy.can_disconnect(&session(SessionStatus::Disconnected, None)));
        assert!(!policy.can_disconnect(&session(SessionStatus::Error, None)));
    }

    #[test]
    fn delete_only_when_disconnected() {
        let policy = SessionPolicy;
        for status in SessionStatus::ALL {
            let s = session(status, Some("dev"));
            assert_eq!(policy.can_delete(&s), status == SessionStatus::Disconnected);
        }
    }

    #[test]
    fn ensure_can_delete_names_connected_state() {
        let err = SessionPolicy
            .ensure_can_delete(&session(SessionStatus::Connected, Some("dev")))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRuleViolation);
        assert!(err.message.contains("deletion not allowed for connected session"));
        assert_eq!(err.detail("current"), Some("Connected"));
    }

    #[test]
    fn configuration_locked_only_while_connected() {
        let policy = SessionPolicy;
        for status in SessionStatus::ALL {
            let s = session(status, Some("dev"));
            let unlocked = status != SessionStatus::Connected;
            assert_eq!(policy.can_set_proxy(&s), unlocked);
            assert_eq!(policy.can_regenerate_api_key(&s), unlocked);
            assert_eq!(policy.ensure_can_set_proxy(&s).is_ok(), unlocked);
        }
    }

    #[test]
    fn connected_without_device_fails_validation() {
        let policy = SessionPolicy;
        assert!(policy
            .validate_device_connection(&session(SessionStatus::Connected, None))
            .is_err());
        assert!(policy
            .validate_device_connection(&session(SessionStatus::Connected, Some("dev")))
            .is_ok());
        assert!(policy
            .validate_device_connection(&session(SessionStatus::Disconnected, None))
            .is_ok());
    }

    #[test]
    fn ensure_can_connect_rejects_connected() {
        let err = SessionPolicy
            .ensure_can_connect(&session(SessionStatus::Connected, Some("dev")))
            .unwrap_err();
        assert!(err.message.contains("Connected"));
    }
}
