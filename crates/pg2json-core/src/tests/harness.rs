//! Test harness for DatabaseService scenarios.
//!
//! Provides:
//! - FakeGateway: scripted relational engine that counts connects and closes
//! - TestHarness: a DatabaseService over FakeGateway, MemorySessionStore,
//!   the real ChaCha codec and a cheap bcrypt hasher

use crate::{DatabaseService, ServiceOptions};
use async_trait::async_trait;
use credential_crypto::ChaChaCredentialCodec;
use parking_lot::Mutex;
use pg_gateway::{
    ConnectionErrorKind, ConnectionParameters, GatewayClient, GatewayError, GatewayResult,
    RelationalGateway, TableDescriptor,
};
use session_key_issuer::{BcryptHasher, SessionKeyIssuer};
use session_store::MemorySessionStore;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const SECRET: &str = "correct horse battery staple";

/// How the fake engine answers a connect attempt.
#[derive(Debug, Clone)]
pub enum ConnectBehavior {
    Accept,
    Reject(ConnectionErrorKind),
    Fail(String),
    Stall(Duration),
}

/// Counters shared between the gateway and every client it hands out.
#[derive(Default)]
pub struct GatewayLedger {
    pub connect_attempts: AtomicUsize,
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
    pub last_params: Mutex<Option<ConnectionParameters>>,
}

impl GatewayLedger {
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    /// Every successful connect was closed exactly once.
    pub fn assert_released(&self) {
        assert_eq!(
            self.connects(),
            self.closes(),
            "every opened connection must be closed"
        );
    }
}

#[derive(Clone, Default)]
struct Script {
    tables: Vec<TableDescriptor>,
    rows: Vec<String>,
    query_error: Option<String>,
    query_stall: Option<Duration>,
    close_error: bool,
}

/// Scripted [`RelationalGateway`].
pub struct FakeGateway {
    connect: Mutex<ConnectBehavior>,
    script: Mutex<Script>,
    ledger: Arc<GatewayLedger>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            connect: Mutex::new(ConnectBehavior::Accept),
            script: Mutex::new(Script::default()),
            ledger: Arc::new(GatewayLedger::default()),
        }
    }

    pub fn ledger(&self) -> &GatewayLedger {
        &self.ledger
    }

    pub fn set_connect(&self, behavior: ConnectBehavior) {
        *self.connect.lock() = behavior;
    }

    /// Tables the engine reports, across every schema.
    pub fn set_tables(&self, tables: &[(&str, &str)]) {
        self.script.lock().tables = tables
            .iter()
            .map(|(schema, table)| TableDescriptor {
                schema_name: schema.to_string(),
                table_name: table.to_string(),
            })
            .collect();
    }

    pub fn set_rows(&self, rows: &[&str]) {
        self.script.lock().rows = rows.iter().map(|r| r.to_string()).collect();
    }

    pub fn fail_queries(&self, message: &str) {
        self.script.lock().query_error = Some(message.to_string());
    }

    pub fn stall_queries(&self, duration: Duration) {
        self.script.lock().query_stall = Some(duration);
    }

    pub fn fail_close(&self) {
        self.script.lock().close_error = true;
    }
}

#[async_trait]
impl RelationalGateway for FakeGateway {
    async fn connect(
        &self,
        params: &ConnectionParameters,
    ) -> GatewayResult<Box<dyn GatewayClient>> {
        self.ledger.connect_attempts.fetch_add(1, Ordering::SeqCst);
        *self.ledger.last_params.lock() = Some(params.clone());

        let behavior = self.connect.lock().clone();
        match behavior {
            ConnectBehavior::Accept => {}
            ConnectBehavior::Reject(kind) => return Err(GatewayError::Classified(kind)),
            ConnectBehavior::Fail(message) => return Err(GatewayError::Connect(message)),
            ConnectBehavior::Stall(duration) => tokio::time::sleep(duration).await,
        }

        self.ledger.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeClient {
            script: self.script.lock().clone(),
            ledger: self.ledger.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct FakeClient {
    script: Script,
    ledger: Arc<GatewayLedger>,
    closed: AtomicBool,
}

impl FakeClient {
    async fn stall(&self) {
        if let Some(duration) = self.script.query_stall {
            tokio::time::sleep(duration).await;
        }
    }
}

#[async_trait]
impl GatewayClient for FakeClient {
    async fn list_tables(&self) -> GatewayResult<Vec<TableDescriptor>> {
        self.stall().await;
        if let Some(message) = &self.script.query_error {
            return Err(GatewayError::Query(message.clone()));
        }
        Ok(self
            .script
            .tables
            .iter()
            .filter(|t| t.is_default_schema())
            .cloned()
            .collect())
    }

    async fn execute_query(&self, sql: &str) -> GatewayResult<Vec<String>> {
        self.ledger.queries.lock().push(sql.to_string());
        self.stall().await;
        if let Some(message) = &self.script.query_error {
            return Err(GatewayError::Query(message.clone()));
        }
        Ok(self.script.rows.clone())
    }

    async fn close(self: Box<Self>) -> GatewayResult<()> {
        assert!(!self.closed.swap(true, Ordering::SeqCst), "closed twice");
        self.ledger.closes.fetch_add(1, Ordering::SeqCst);
        if self.script.close_error {
            return Err(GatewayError::Close("connection reset by peer".to_string()));
        }
        Ok(())
    }
}

/// A DatabaseService wired to fakes.
pub struct TestHarness {
    pub gateway: Arc<FakeGateway>,
    pub store: Arc<MemorySessionStore>,
    pub service: DatabaseService,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(operation_timeout: Duration) -> Self {
        let gateway = Arc::new(FakeGateway::new());
        let store = Arc::new(MemorySessionStore::new());
        let service = DatabaseService::new(ServiceOptions {
            gateway: gateway.clone(),
            store: store.clone(),
            codec: Arc::new(ChaChaCredentialCodec::new()),
            key_issuer: SessionKeyIssuer::new(Arc::new(BcryptHasher::new(4))),
            operation_timeout,
        });

        Self {
            gateway,
            store,
            service,
        }
    }

    pub fn ledger(&self) -> &GatewayLedger {
        self.gateway.ledger()
    }

    /// Open a one-hour session with [`params`] and [`SECRET`].
    pub async fn open(&self) -> String {
        self.service
            .open_session(&params(), SECRET, "1h")
            .await
            .expect("open session")
    }
}

pub fn params() -> ConnectionParameters {
    ConnectionParameters {
        host: "db.internal".to_string(),
        port: 5432,
        username: "reporter".to_string(),
        password: "pa55w0rd!".to_string(),
        database_name: "shop".to_string(),
        ssl_mode_enabled: true,
    }
}
