//! Gateway capability traits.

use crate::{ConnectionParameters, GatewayResult, TableDescriptor};
use async_trait::async_trait;

/// Opens connections to a relational engine.
#[async_trait]
pub trait RelationalGateway: Send + Sync {
    /// Open a fresh connection.
    ///
    /// Recognised failures come back as
    /// [`crate::GatewayError::Classified`]; everything else as
    /// [`crate::GatewayError::Connect`].
    async fn connect(&self, params: &ConnectionParameters)
        -> GatewayResult<Box<dyn GatewayClient>>;
}

/// A live connection returned by [`RelationalGateway::connect`].
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Tables in the default schema.
    async fn list_tables(&self) -> GatewayResult<Vec<TableDescriptor>>;

    /// Run `sql` and return the first column of every row as JSON text,
    /// in the order the engine returned them.
    ///
    /// Rows whose value cannot be read are skipped; a failure of the
    /// statement itself aborts the call.
    async fn execute_query(&self, sql: &str) -> GatewayResult<Vec<String>>;

    /// Close the connection.
    async fn close(self: Box<Self>) -> GatewayResult<()>;
}
