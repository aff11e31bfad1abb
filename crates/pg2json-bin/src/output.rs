//! JSON replies and exit codes.

use pg2json_core::ServiceError;
use serde_json::{json, Value};
use std::io::Write;
use std::process::ExitCode;

/// Exit code for errors the caller can fix.
pub const EXIT_CLIENT_ERROR: u8 = 2;

/// Exit code for internal failures.
pub const EXIT_INTERNAL_ERROR: u8 = 1;

/// What a command prints on stdout, and how the process exits.
#[derive(Debug, PartialEq)]
pub struct Reply {
    body: Value,
    code: u8,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self { body, code: 0 }
    }

    pub fn message(text: &str) -> Self {
        Self::ok(json!({ "message": text }))
    }

    /// Render a service failure. The full error is logged by the caller;
    /// internal detail only reaches stdout when `send_details` is set.
    pub fn failure(err: &ServiceError, send_details: bool) -> Self {
        let code = if err.is_client_error() {
            EXIT_CLIENT_ERROR
        } else {
            EXIT_INTERNAL_ERROR
        };
        Self {
            body: json!({ "message": err.public_message(send_details) }),
            code,
        }
    }

    #[cfg(test)]
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn print(&self) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &self.body)?;
        writeln!(stdout)
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code)
    }

    #[cfg(test)]
    pub fn code(&self) -> u8 {
        self.code
    }
}
