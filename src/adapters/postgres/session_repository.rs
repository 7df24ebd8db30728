//! PostgreSQL implementation of SessionRepository.
//!
//! Persists Session aggregates to the `sessions` table. Unique violations on
//! name or api key surface as `Conflict`; every other driver error is a
//! `DatabaseError` carrying the sqlx error as its source.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{
    DomainError, ErrorCode, IdGenerator, SessionId, Timestamp, UuidGenerator,
};
use crate::domain::session::{
    ApiKey, DeviceIdentifier, PairingCode, ProxyConfiguration, Session, SessionName,
    SessionRecord, SessionStatus, WebhookEndpoint,
};
use crate::ports::{SessionListQuery, SessionPage, SessionRepository};

use std::sync::Arc;

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, status, device_identifier, pairing_code, proxy, webhook,
           api_key, last_error, connected_at, created_at, updated_at
    FROM sessions
"#;

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
    ids: Arc<dyn IdGenerator>,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_id_generator(pool, Arc::new(UuidGenerator))
    }

    /// Ids for `create_with_generated_id` come from `ids`.
    pub fn with_id_generator(pool: PgPool, ids: Arc<dyn IdGenerator>) -> Self {
        Self { pool, ids }
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), DomainError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::database("run migrations", e))
    }

    async fn insert(&self, id: &SessionId, session: &Session) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, name, status, device_identifier, pairing_code, proxy, webhook,
                api_key, last_error, connected_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(id.as_uuid())
        .bind(session.name().as_str())
        .bind(session.status().as_str())
        .bind(session.device_identifier().map(|d| d.as_str()))
        .bind(session.pairing_code().map(|c| c.as_str()))
        .bind(session.proxy().map(|p| p.to_string()))
        .bind(session.webhook().map(|w| w.as_str()))
        .bind(session.api_key().as_str())
        .bind(session.last_error())
        .bind(session.connected_at().map(|t| *t.as_datetime()))
        .bind(session.created_at().as_datetime())
        .bind(session.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("insert session", e))?;

        Ok(())
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Session>, DomainError> {
        let sql = format!("{} WHERE {} = $1", SELECT_COLUMNS, clause);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("fetch session", e))?;

        row.map(row_to_session).transpose()
    }

    async fn fetch_many(&self, sql: &str, operation: &str) -> Result<Vec<Session>, DomainError> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(operation, e))?;

        rows.into_iter().map(row_to_session).collect()
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), DomainError> {
        self.insert(session.id(), session).await
    }

    async fn create_with_generated_id(&self, session: &Session) -> Result<SessionId, DomainError> {
        let id = SessionId::generate(self.ids.as_ref());
        self.insert(&id, session).await?;
        Ok(id)
    }

    async fn get_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let sql = format!("{} WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("fetch session", e))?;

        row.map(row_to_session).transpose()
    }

    async fn get_by_name(&self, name: &SessionName) -> Result<Option<Session>, DomainError> {
        self.fetch_one_where("name", name.as_str()).await
    }

    async fn get_by_api_key(&self, key: &ApiKey) -> Result<Option<Session>, DomainError> {
        self.fetch_one_where("api_key", key.as_str()).await
    }

    async fn get_by_device_identifier(
        &self,
        device: &DeviceIdentifier,
    ) -> Result<Option<Session>, DomainError> {
        self.fetch_one_where("device_identifier", device.as_str())
            .await
    }

    async fn get_all(&self) -> Result<Vec<Session>, DomainError> {
        let sql = format!("{} ORDER BY created_at ASC", SELECT_COLUMNS);
        self.fetch_many(&sql, "fetch all sessions").await
    }

    async fn list(&self, query: &SessionListQuery) -> Result<SessionPage, DomainError> {
        let status = query.status.map(|s| s.as_str());

        let sql = format!(
            "{} WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(status)
            .bind(i64::from(query.limit))
            .bind(i64::from(query.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database("list sessions", e))?;

        let total: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE ($1::text IS NULL OR status = $1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::database("count sessions", e))?;

        let sessions = rows
            .into_iter()
            .map(row_to_session)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SessionPage {
            sessions,
            total: total.0.max(0) as u64,
        })
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                name = $2,
                status = $3,
                device_identifier = $4,
                pairing_code = $5,
                proxy = $6,
                webhook = $7,
                api_key = $8,
                last_error = $9,
                connected_at = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.name().as_str())
        .bind(session.status().as_str())
        .bind(session.device_identifier().map(|d| d.as_str()))
        .bind(session.pairing_code().map(|c| c.as_str()))
        .bind(session.proxy().map(|p| p.to_string()))
        .bind(session.webhook().map(|w| w.as_str()))
        .bind(session.api_key().as_str())
        .bind(session.last_error())
        .bind(session.connected_at().map(|t| *t.as_datetime()))
        .bind(session.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("update session", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            ));
        }

        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("delete session", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", id),
            ));
        }

        Ok(())
    }

    async fn exists(&self, id: &SessionId) -> Result<bool, DomainError> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM sessions WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::database("check session existence", e))?;

        Ok(result.0)
    }

    async fn get_active(&self) -> Result<Vec<Session>, DomainError> {
        let sql = format!(
            "{} WHERE status IN ('connected', 'connecting') ORDER BY created_at ASC",
            SELECT_COLUMNS
        );
        self.fetch_many(&sql, "fetch active sessions").await
    }

    async fn get_inactive(&self) -> Result<Vec<Session>, DomainError> {
        let sql = format!(
            "{} WHERE status IN ('disconnected', 'error') ORDER BY created_at ASC",
            SELECT_COLUMNS
        );
        self.fetch_many(&sql, "fetch inactive sessions").await
    }
}

impl std::fmt::Debug for PostgresSessionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSessionRepository").finish_non_exhaustive()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn map_write_error(operation: &str, err: sqlx::Error) -> DomainError {
    if is_unique_violation(&err) {
        return DomainError::new(
            ErrorCode::Conflict,
            "Session name or API key is already taken",
        )
        .with_detail("operation", operation)
        .with_source(err);
    }
    DomainError::database(operation, err)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(&format!("read column {}", name), e))
}

fn corrupt(column: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} in sessions row: {}", column, err),
    )
    .with_detail("column", column)
}

fn row_to_session(row: PgRow) -> Result<Session, DomainError> {
    let id: uuid::Uuid = column(&row, "id")?;
    let name: String = column(&row, "name")?;
    let status: String = column(&row, "status")?;
    let device: Option<String> = column(&row, "device_identifier")?;
    let pairing_code: Option<String> = column(&row, "pairing_code")?;
    let proxy: Option<String> = column(&row, "proxy")?;
    let webhook: Option<String> = column(&row, "webhook")?;
    let api_key: String = column(&row, "api_key")?;
    let last_error: Option<String> = column(&row, "last_error")?;
    let connected_at: Option<chrono::DateTime<chrono::Utc>> = column(&row, "connected_at")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = column(&row, "updated_at")?;

    Ok(Session::reconstitute(SessionRecord {
        id: SessionId::from_uuid(id),
        name: SessionName::new(name).map_err(|e| corrupt("name", e))?,
        status: status
            .parse::<SessionStatus>()
            .map_err(|e| corrupt("status", e))?,
        device_identifier: device
            .map(DeviceIdentifier::new)
            .transpose()
            .map_err(|e| corrupt("device_identifier", e))?,
        pairing_code: pairing_code
            .map(PairingCode::new)
            .transpose()
            .map_err(|e| corrupt("pairing_code", e))?,
        proxy: proxy
            .as_deref()
            .map(ProxyConfiguration::parse)
            .transpose()
            .map_err(|e| corrupt("proxy", e))?,
        webhook: webhook
            .map(WebhookEndpoint::new)
            .transpose()
            .map_err(|e| corrupt("webhook", e))?,
        api_key: ApiKey::new(api_key).map_err(|e| corrupt("api_key", e))?,
        last_error,
        connected_at: connected_at.map(Timestamp::from_datetime),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    }))
}
