//! tokio-postgres implementation of the gateway.

use crate::rows::{default_schema_tables, json_fragments, JsonText};
use crate::{
    classify, ConnectFailure, ConnectionParameters, GatewayClient, GatewayError, GatewayResult,
    RelationalGateway, TableDescriptor,
};
use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::config::SslMode;
use tokio_postgres::{Client, Config, NoTls};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, info, warn};

/// Driver-level connect timeout used when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const APPLICATION_NAME: &str = "pg2json";

const LIST_TABLES_SQL: &str = "SELECT schemaname, tablename FROM pg_catalog.pg_tables";

/// Connects to PostgreSQL with tokio-postgres.
#[derive(Debug, Clone)]
pub struct PostgresGateway {
    connect_timeout: Duration,
}

impl PostgresGateway {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    fn build_config(&self, params: &ConnectionParameters) -> Config {
        let mut config = Config::new();
        config
            .host(&params.host)
            .port(params.port)
            .user(&params.username)
            .password(&params.password)
            .dbname(&params.database_name)
            .application_name(APPLICATION_NAME)
            .connect_timeout(self.connect_timeout)
            .ssl_mode(if params.ssl_mode_enabled {
                SslMode::Require
            } else {
                SslMode::Disable
            });
        config
    }
}

impl Default for PostgresGateway {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl RelationalGateway for PostgresGateway {
    async fn connect(
        &self,
        params: &ConnectionParameters,
    ) -> GatewayResult<Box<dyn GatewayClient>> {
        let config = self.build_config(params);
        debug!(
            host = %params.host,
            port = params.port,
            database = %params.database_name,
            ssl = params.ssl_mode_enabled,
            "connecting to postgresql"
        );

        let (client, connection) = if params.ssl_mode_enabled {
            let (client, connection) = config
                .connect(tls_connector()?)
                .await
                .map_err(connect_error)?;
            (client, spawn_connection(connection))
        } else {
            let (client, connection) = config.connect(NoTls).await.map_err(connect_error)?;
            (client, spawn_connection(connection))
        };

        info!(host = %params.host, database = %params.database_name, "connected to postgresql");
        Ok(Box::new(PostgresClient { client, connection }))
    }
}

/// A live tokio-postgres connection plus the task driving it.
pub struct PostgresClient {
    client: Client,
    connection: JoinHandle<()>,
}

#[async_trait]
impl GatewayClient for PostgresClient {
    async fn list_tables(&self) -> GatewayResult<Vec<TableDescriptor>> {
        let rows = self
            .client
            .query(LIST_TABLES_SQL, &[])
            .await
            .map_err(|e| GatewayError::Query(format!("select table names: {e}")))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let schema_name: String = row
                .try_get("schemaname")
                .map_err(|e| GatewayError::Query(e.to_string()))?;
            let table_name: String = row
                .try_get("tablename")
                .map_err(|e| GatewayError::Query(e.to_string()))?;
            tables.push(TableDescriptor {
                schema_name,
                table_name,
            });
        }
        let tables = default_schema_tables(tables);

        Ok(tables)
    }

    async fn execute_query(&self, sql: &str) -> GatewayResult<Vec<String>> {
        let rows = self
            .client
            .query(sql, &[])
            .await
            .map_err(|e| GatewayError::Query(format!("run query: {e}")))?;

        let result = json_fragments(rows.iter().map(|row| row.try_get::<_, Option<JsonText>>(0)));
        debug!(rows = result.len(), "query returned rows");

        Ok(result)
    }

    async fn close(self: Box<Self>) -> GatewayResult<()> {
        let PostgresClient { client, connection } = *self;

        // Dropping the client sends Terminate; the connection task then ends.
        drop(client);
        connection
            .await
            .map_err(|e| GatewayError::Close(e.to_string()))?;

        info!("closed postgresql connection");
        Ok(())
    }
}

fn connect_error(err: tokio_postgres::Error) -> GatewayError {
    let failure = ConnectFailure::from_postgres(&err);
    match classify(&failure) {
        Some(kind) => {
            info!(%kind, "postgresql rejected connection");
            GatewayError::Classified(kind)
        }
        None => GatewayError::Connect(failure.message),
    }
}

fn spawn_connection<F>(connection: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            warn!(error = %e, "postgresql connection ended with error");
        }
    })
}

/// TLS for `sslmode=require`: the channel is encrypted but the server
/// certificate is not checked against any root or host name.
fn tls_connector() -> GatewayResult<MakeRustlsConnect> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| GatewayError::Tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(EncryptOnlyVerifier { provider }))
        .with_no_client_auth();

    Ok(MakeRustlsConnect::new(config))
}

/// Accepts any server certificate. Handshake signatures are still verified.
#[derive(Debug)]
struct EncryptOnlyVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for EncryptOnlyVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
