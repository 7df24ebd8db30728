//! ListSessionsHandler - Query handler for paging through sessions.

use crate::domain::session::{SessionError, SessionStatus};
use crate::ports::{SessionListQuery, SessionPage, DEFAULT_PAGE_SIZE};

use super::SessionServices;

#[derive(Debug, Clone, Default)]
pub struct ListSessionsQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Lowercase status name, e.g. `connected`.
    pub status: Option<String>,
}

pub struct ListSessionsHandler {
    services: SessionServices,
}

impl ListSessionsHandler {
    pub fn new(services: SessionServices) -> Self {
        Self { services }
    }

    pub async fn handle(&self, query: ListSessionsQuery) -> Result<SessionPage, SessionError> {
        let mut list = SessionListQuery::new(
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.offset.unwrap_or(0),
        );
        if let Some(status) = query.status {
            list = list.with_status(status.parse::<SessionStatus>()?);
        }
        Ok(self.services.repository.list(&list).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::session::test_support::Harness;

    #[tokio::test]
    async fn pages_newest_first_with_total() {
        let h = Harness::new();
        for name in ["alpha", "bravo", "charlie"] {
            h.seed(name).await;
            h.clock.advance_secs(1);
        }
        let handler = ListSessionsHandler::new(h.services.clone());

        let page = handler
            .handle(ListSessionsQuery {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        let names: Vec<_> = page.sessions.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["charlie", "bravo"]);
    }

    #[tokio::test]
    async fn filters_by_status() {
        let h = Harness::new();
        h.seed("alpha").await;
        h.seed_connected("bravo", "dev-1").await;
        let handler = ListSessionsHandler::new(h.services.clone());

        let page = handler
            .handle(ListSessionsQuery {
                status: Some("connected".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.sessions[0].name().as_str(), "bravo");
    }

    #[tokio::test]
    async fn unknown_status_is_a_validation_error() {
        let h = Harness::new();
        let err = ListSessionsHandler::new(h.services.clone())
            .handle(ListSessionsQuery {
                status: Some("sleeping".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Validation { .. }));
    }
}
