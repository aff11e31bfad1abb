//! Service wiring and command dispatch.

use crate::output::Reply;
use crate::{query_spec, Commands};
use anyhow::Context;
use credential_crypto::ChaChaCredentialCodec;
use pg2json_config_and_utils::Config;
use pg2json_core::{DatabaseService, ServiceError, ServiceOptions};
use pg_gateway::{ConnectionParameters, PostgresGateway};
use serde_json::json;
use session_key_issuer::{BcryptHasher, SessionKeyIssuer};
use session_store::{MemorySessionStore, RedisSessionStore, SessionStore};
use std::sync::Arc;
use tracing::{error, info};

const CONNECTED_MESSAGE: &str = "We have successfully established a connection with your database.";
const SESSION_CLOSED_MESSAGE: &str = "Session closed.";

/// Run one command. Service failures become a [`Reply`]; only setup
/// failures (Redis unreachable, bad config) are returned as errors.
pub async fn run(config: &Config, command: Commands) -> anyhow::Result<Reply> {
    let operation = command_name(&command);
    let store = session_store(config, &command).await?;
    let service = build_service(config, store);

    let outcome = dispatch(&service, command).await;
    Ok(match outcome {
        Ok(reply) => {
            info!(operation, "command succeeded");
            reply
        }
        Err(err) if err.is_client_error() => {
            info!(operation, error = %err, "command rejected");
            Reply::failure(&err, config.send_details_on_internal_error)
        }
        Err(err) => {
            error!(operation, error = ?err, "command failed");
            Reply::failure(&err, config.send_details_on_internal_error)
        }
    })
}

fn build_service(config: &Config, store: Arc<dyn SessionStore>) -> DatabaseService {
    DatabaseService::new(ServiceOptions {
        gateway: Arc::new(PostgresGateway::new(config.connect_timeout())),
        store,
        codec: Arc::new(ChaChaCredentialCodec::new()),
        key_issuer: SessionKeyIssuer::new(Arc::new(BcryptHasher::new(config.session_key_cost))),
        operation_timeout: config.operation_timeout(),
    })
}

/// test-connection never touches the session store, so it runs without Redis.
async fn session_store(config: &Config, command: &Commands) -> anyhow::Result<Arc<dyn SessionStore>> {
    if matches!(command, Commands::TestConnection(_)) {
        return Ok(Arc::new(MemorySessionStore::new()));
    }

    let store = tokio::time::timeout(
        config.operation_timeout(),
        RedisSessionStore::connect(&config.redis_url),
    )
    .await
    .context("timed out connecting to the session store")?
    .context("failed to connect to the session store")?;

    Ok(Arc::new(store))
}

async fn dispatch(service: &DatabaseService, command: Commands) -> Result<Reply, ServiceError> {
    match command {
        Commands::TestConnection(connection) => {
            service
                .test_connection(&ConnectionParameters::from(connection))
                .await?;
            Ok(Reply::message(CONNECTED_MESSAGE))
        }
        Commands::OpenSession {
            connection,
            secret,
            duration,
        } => {
            let session_key = service
                .open_session(&ConnectionParameters::from(connection), &secret.value, &duration)
                .await?;
            Ok(Reply::ok(json!({ "sessionKey": session_key })))
        }
        Commands::ListTables(session) => {
            let tables = service
                .list_tables(&session.session_key, &session.secret.value)
                .await?;
            Ok(Reply::ok(json!({ "tables": tables })))
        }
        Commands::GetJson {
            session,
            table,
            fields,
            where_clause,
            limit,
        } => {
            let spec = query_spec(table, fields, where_clause, limit);
            let result = service
                .fetch_as_json(&session.session_key, &session.secret.value, &spec)
                .await?;
            Ok(Reply::ok(json!({ "result": result })))
        }
        Commands::CloseSession { session_key } => {
            service.close_session(&session_key).await?;
            Ok(Reply::message(SESSION_CLOSED_MESSAGE))
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::TestConnection(_) => "test-connection",
        Commands::OpenSession { .. } => "open-session",
        Commands::ListTables(_) => "list-tables",
        Commands::GetJson { .. } => "get-json",
        Commands::CloseSession { .. } => "close-session",
    }
}
