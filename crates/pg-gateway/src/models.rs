//! Model types shared by the gateway and its callers.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema whose tables are exposed to callers.
pub const DEFAULT_SCHEMA: &str = "public";

/// Everything needed to open a PostgreSQL connection.
///
/// Serialized as camelCase JSON; that JSON is what gets encrypted into a
/// session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionParameters {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database_name: String,
    #[serde(default)]
    pub ssl_mode_enabled: bool,
}

impl ConnectionParameters {
    /// Check that every required field is present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::missing("host"));
        }
        if self.port == 0 {
            return Err(ValidationError::missing("port"));
        }
        if self.username.is_empty() {
            return Err(ValidationError::missing("username"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::missing("password"));
        }
        if self.database_name.is_empty() {
            return Err(ValidationError::missing("databaseName"));
        }
        Ok(())
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database_name", &self.database_name)
            .field("ssl_mode_enabled", &self.ssl_mode_enabled)
            .finish()
    }
}

/// A table as reported by `pg_catalog.pg_tables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub schema_name: String,
    pub table_name: String,
}

impl TableDescriptor {
    pub fn is_default_schema(&self) -> bool {
        self.schema_name == DEFAULT_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ConnectionParameters {
        ConnectionParameters {
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            database_name: "shop".to_string(),
            ssl_mode_enabled: false,
        }
    }

    #[test]
    fn test_valid_parameters() {
        assert!(params().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let mut p = params();
        p.host = "  ".to_string();
        assert_eq!(p.validate().unwrap_err().field, "host");

        let mut p = params();
        p.port = 0;
        assert_eq!(p.validate().unwrap_err().field, "port");

        let mut p = params();
        p.password.clear();
        assert_eq!(p.validate().unwrap_err().field, "password");

        let mut p = params();
        p.database_name.clear();
        assert_eq!(p.validate().unwrap_err().field, "databaseName");
    }

    #[test]
    fn test_json_shape_is_camel_case() {
        let json = serde_json::to_value(params()).unwrap();

        assert_eq!(json["databaseName"], "shop");
        assert_eq!(json["sslModeEnabled"], false);
        assert_eq!(json["port"], 5432);
    }

    #[test]
    fn test_ssl_mode_defaults_to_false() {
        let json = r#"{"host":"h","port":1,"username":"u","password":"p","databaseName":"d"}"#;
        let p: ConnectionParameters = serde_json::from_str(json).unwrap();
        assert!(!p.ssl_mode_enabled);
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", params());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("password: \"postgres\""));
    }
}
