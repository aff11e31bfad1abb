//! Database service: session lifecycle and JSON fetches.

use crate::{DomainError, ServiceError, ServiceResult};
use credential_crypto::{CredentialCodec, CredentialCryptoError};
use pg_gateway::{
    compile_query, ConnectionParameters, GatewayClient, QuerySpec, RelationalGateway,
};
use session_key_issuer::SessionKeyIssuer;
use session_store::SessionStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, error, info, warn};

/// Upper bound on releasing a connection once its operation has finished
/// or run out of time.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Deadline used when the configured timeout does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Capabilities and limits for a [`DatabaseService`].
pub struct ServiceOptions {
    pub gateway: Arc<dyn RelationalGateway>,
    pub store: Arc<dyn SessionStore>,
    pub codec: Arc<dyn CredentialCodec>,
    pub key_issuer: SessionKeyIssuer,
    pub operation_timeout: Duration,
}

/// Caller-facing operations over credential sessions.
///
/// Every operation opens its own connection and closes it before returning,
/// whatever the outcome. Operations share nothing but the session store.
pub struct DatabaseService {
    gateway: Arc<dyn RelationalGateway>,
    store: Arc<dyn SessionStore>,
    codec: Arc<dyn CredentialCodec>,
    key_issuer: SessionKeyIssuer,
    operation_timeout: Duration,
}

impl DatabaseService {
    pub fn new(options: ServiceOptions) -> Self {
        Self {
            gateway: options.gateway,
            store: options.store,
            codec: options.codec,
            key_issuer: options.key_issuer,
            operation_timeout: options.operation_timeout,
        }
    }

    /// Connect and immediately disconnect. Nothing is stored.
    ///
    /// Unlike the session operations, a failure to close is reported.
    pub async fn test_connection(&self, params: &ConnectionParameters) -> ServiceResult<()> {
        params.validate()?;
        let deadline = self.deadline();

        let client = self.connect(params, deadline).await?;
        client
            .close()
            .await
            .map_err(|e| {
                error!(error = %e, "failed to close test connection");
                ServiceError::Gateway(e)
            })?;

        info!(host = %params.host, database = %params.database_name, "test connection succeeded");
        Ok(())
    }

    /// Verify `params`, then store them encrypted under `secret` for
    /// `session_duration`. Returns the new session key.
    pub async fn open_session(
        &self,
        params: &ConnectionParameters,
        secret: &str,
        session_duration: &str,
    ) -> ServiceResult<String> {
        params.validate()?;
        require_secret(secret)?;
        let ttl = parse_session_duration(session_duration)?;
        let deadline = self.deadline();

        let client = self.connect(params, deadline).await?;
        self.release(client).await;

        let session_key = self
            .bounded(deadline, "session key issue", self.key_issuer.issue_key())
            .await?;
        debug!("issued session key");

        let payload = serde_json::to_vec(params)?;
        let ciphertext = self.codec.encrypt(&payload, secret)?;
        debug!("encrypted connection parameters");

        self.bounded(
            deadline,
            "session store write",
            self.store.put(&session_key, ciphertext.as_bytes(), ttl),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "failed to store session");
            e
        })?;

        info!(session_key = %session_key, ttl = ?ttl, "opened session");
        Ok(session_key)
    }

    /// Names of the tables in the default schema of the session's database.
    pub async fn list_tables(&self, session_key: &str, secret: &str) -> ServiceResult<Vec<String>> {
        let deadline = self.deadline();
        let params = self.load_session(session_key, secret, deadline).await?;

        let client = self.connect(&params, deadline).await?;
        let listed = self
            .bounded(deadline, "list tables", client.list_tables())
            .await;
        self.release(client).await;

        let tables = listed?;
        debug!(count = tables.len(), "listed tables");
        Ok(tables.into_iter().map(|t| t.table_name).collect())
    }

    /// Run the query described by `spec` and wrap the returned rows in one
    /// JSON array.
    pub async fn fetch_as_json(
        &self,
        session_key: &str,
        secret: &str,
        spec: &QuerySpec,
    ) -> ServiceResult<String> {
        spec.validate()?;
        let deadline = self.deadline();
        let params = self.load_session(session_key, secret, deadline).await?;

        let sql = compile_query(spec);
        debug!(table = %spec.table_name, sql = %sql, "compiled query");

        let client = self.connect(&params, deadline).await?;
        let fetched = self
            .bounded(deadline, "query", client.execute_query(&sql))
            .await;
        self.release(client).await;

        let rows = fetched?;
        debug!(rows = rows.len(), "fetched rows");
        Ok(render_json_array(&rows))
    }

    /// Delete a session. Closing an unknown or expired session succeeds.
    pub async fn close_session(&self, session_key: &str) -> ServiceResult<()> {
        require_session_key(session_key)?;
        let deadline = self.deadline();

        self.bounded(deadline, "session store delete", self.store.delete(session_key))
            .await?;

        info!(session_key = %session_key, "closed session");
        Ok(())
    }

    fn deadline(&self) -> Instant {
        deadline_after(Instant::now(), self.operation_timeout)
    }

    async fn bounded<T, E, F>(&self, deadline: Instant, step: &'static str, fut: F) -> ServiceResult<T>
    where
        F: Future<Output = Result<T, E>>,
        ServiceError: From<E>,
    {
        match timeout_at(deadline, fut).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => {
                warn!(step, timeout = ?self.operation_timeout, "operation deadline exceeded");
                Err(ServiceError::Timeout {
                    step,
                    timeout: self.operation_timeout,
                })
            }
        }
    }

    async fn connect(
        &self,
        params: &ConnectionParameters,
        deadline: Instant,
    ) -> ServiceResult<Box<dyn GatewayClient>> {
        match self
            .bounded(deadline, "connect", self.gateway.connect(params))
            .await
        {
            Ok(client) => {
                debug!(host = %params.host, "connected");
                Ok(client)
            }
            Err(ServiceError::Domain(kind)) => {
                info!(host = %params.host, reason = %kind, "connection rejected");
                Err(ServiceError::Domain(kind))
            }
            Err(e) => {
                error!(host = %params.host, error = %e, "failed to connect");
                Err(e)
            }
        }
    }

    /// Close `client`, logging rather than returning any failure.
    ///
    /// Runs on its own grace period so a connection is still released after
    /// the operation deadline has passed.
    async fn release(&self, client: Box<dyn GatewayClient>) {
        match timeout(CLOSE_GRACE, client.close()).await {
            Ok(Ok(())) => debug!("closed connection"),
            Ok(Err(e)) => warn!(error = %e, "failed to close connection"),
            Err(_) => warn!(grace = ?CLOSE_GRACE, "closing connection timed out"),
        }
    }

    async fn load_session(
        &self,
        session_key: &str,
        secret: &str,
        deadline: Instant,
    ) -> ServiceResult<ConnectionParameters> {
        require_session_key(session_key)?;
        require_secret(secret)?;

        let stored = match self
            .bounded(deadline, "session store read", self.store.get(session_key))
            .await
        {
            Ok(stored) => stored,
            Err(ServiceError::Store(e)) if e.is_not_found() => {
                info!(session_key = %session_key, "session expired");
                return Err(DomainError::SessionExpired.into());
            }
            Err(e) => {
                error!(session_key = %session_key, error = %e, "failed to read session");
                return Err(e);
            }
        };

        let ciphertext = String::from_utf8(stored)
            .map_err(|e| CredentialCryptoError::Malformed(e.to_string()))?;
        let plaintext = self.codec.decrypt(&ciphertext, secret).map_err(|e| {
            error!(session_key = %session_key, error = %e, "failed to decrypt session");
            e
        })?;
        let params: ConnectionParameters = serde_json::from_slice(&plaintext)?;

        debug!(session_key = %session_key, "loaded session");
        Ok(params)
    }
}

/// Parse a session TTL such as `90s`, `30m`, `1h` or `1h30m`.
///
/// Zero and unparsable durations are rejected.
pub fn parse_session_duration(input: &str) -> ServiceResult<Duration> {
    let invalid = |reason: String| ServiceError::InvalidSessionDuration {
        input: input.to_string(),
        reason,
    };

    let duration = humantime::parse_duration(input.trim()).map_err(|e| invalid(e.to_string()))?;
    if duration.is_zero() {
        return Err(invalid("duration must be positive".to_string()));
    }
    Ok(duration)
}

/// Wrap row fragments in a JSON array: `[ r1,\nr2\n ]`, or `[ ]` when empty.
pub fn render_json_array(rows: &[String]) -> String {
    if rows.is_empty() {
        return "[ ]".to_string();
    }
    format!("[ {}\n ]", rows.join(",\n"))
}

fn require_secret(secret: &str) -> ServiceResult<()> {
    if secret.is_empty() {
        return Err(ServiceError::InvalidInput("secret is required".to_string()));
    }
    Ok(())
}

fn require_session_key(session_key: &str) -> ServiceResult<()> {
    if session_key.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "sessionKey is required".to_string(),
        ));
    }
    Ok(())
}

fn deadline_after(now: Instant, timeout: Duration) -> Instant {
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
