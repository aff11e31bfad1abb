//! Scenario tests for DatabaseService.
//!
//! - `harness.rs`    - fake relational engine and service wiring
//! - `connection.rs` - test_connection outcomes and classification
//! - `sessions.rs`   - open, use, expire and close sessions
//! - `fetch.rs`      - query compilation and JSON assembly
//! - `release.rs`    - connections are closed on every path, deadlines

pub(crate) mod harness;
