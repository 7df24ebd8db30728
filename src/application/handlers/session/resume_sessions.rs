//! ResumeSessionsHandler - Reconnects live sessions after a restart.
//!
//! Sessions that were Connected or Connecting when the process stopped and
//! that have a paired device are handed back to the connection service.
//! Runs as a background task under one overall deadline; individual
//! failures are logged and recorded on the session, never propagated.

use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::domain::foundation::CommandMetadata;
use crate::domain::session::{Session, SessionError};
use crate::ports::ConnectionService;

use super::SessionServices;

/// How many sessions are dialled at once.
pub const DEFAULT_RESUME_CONCURRENCY: usize = 8;

/// Outcome of a resume pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumeReport {
    pub attempted: usize,
    pub resumed: usize,
    pub failed: usize,
    /// The deadline hit before every session was handled.
    pub timed_out: bool,
}

#[derive(Default)]
struct Progress {
    attempted: AtomicUsize,
    resumed: AtomicUsize,
    failed: AtomicUsize,
}

impl Progress {
    fn report(&self, timed_out: bool) -> ResumeReport {
        ResumeReport {
            attempted: self.attempted.load(Ordering::SeqCst),
            resumed: self.resumed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            timed_out,
        }
    }
}

pub struct ResumeSessionsHandler {
    services: SessionServices,
    connections: Arc<dyn ConnectionService>,
    concurrency: usize,
}

impl ResumeSessionsHandler {
    pub fn new(services: SessionServices, connections: Arc<dyn ConnectionService>) -> Self {
        Self {
            services,
            connections,
            concurrency: DEFAULT_RESUME_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Start the pass on the runtime. The caller is never blocked by it.
    pub fn spawn(self: Arc<Self>, deadline: Duration) -> JoinHandle<ResumeReport> {
        tokio::spawn(async move { self.run_with_deadline(deadline).await })
    }

    /// Run one pass, stopping at `deadline`.
    pub async fn run_with_deadline(&self, deadline: Duration) -> ResumeReport {
        let progress = Progress::default();
        let timed_out = tokio::time::timeout(deadline, self.resume_all(&progress))
            .await
            .is_err();

        let report = progress.report(timed_out);
        if timed_out {
            tracing::warn!(
                deadline_secs = deadline.as_secs(),
                attempted = report.attempted,
                resumed = report.resumed,
                "Session resume hit its deadline"
            );
        } else {
            tracing::info!(
                attempted = report.attempted,
                resumed = report.resumed,
                failed = report.failed,
                "Session resume finished"
            );
        }
        report
    }

    async fn resume_all(&self, progress: &Progress) {
        let candidates = match self.services.repository.get_active().await {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::error!(error = %err, "Could not load sessions to resume");
                return;
            }
        };

        stream::iter(
            candidates
                .into_iter()
                .filter(Session::is_authenticated),
        )
        .for_each_concurrent(self.concurrency, |session| async move {
            progress.attempted.fetch_add(1, Ordering::SeqCst);
            match self.resume_one(session).await {
                Ok(()) => {
                    progress.resumed.fetch_add(1, Ordering::SeqCst);
                }
                Err(_) => {
                    progress.failed.fetch_add(1, Ordering::SeqCst);
                }
            }
        })
        .await;
    }

    async fn resume_one(&self, mut session: Session) -> Result<(), SessionError> {
        let id = *session.id();
        let Err(err) = self.connections.connect(&id).await else {
            tracing::debug!(session_id = %id, "Session resumed");
            return Ok(());
        };

        tracing::warn!(session_id = %id, error = %err, "Failed to resume session");
        let recorded = match session.set_error(err.message.clone(), self.services.clock.as_ref()) {
            Ok(()) => self
                .services
                .save(&mut session, &CommandMetadata::new().with_source("resume"))
                .await
                .map(|_| ()),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = recorded {
            tracing::warn!(session_id = %id, error = %e, "Could not record resume failure");
        }
        Err(SessionError::external(err.message))
    }
}
