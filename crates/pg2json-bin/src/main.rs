//! pg2json - open encrypted PostgreSQL sessions and read tables as JSON.

mod app;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use pg2json_config_and_utils::{init_logging, Config, Paths};
use pg_gateway::{ConnectionParameters, QuerySpec};

/// pg2json command-line interface.
#[derive(Parser, Debug)]
#[command(name = "pg2json")]
#[command(about = "Read PostgreSQL tables as JSON through short-lived encrypted sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and logs. Defaults to ~/.pg2json
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the database accepts these credentials
    TestConnection(ConnectionArgs),

    /// Verify credentials and store them encrypted as a new session
    OpenSession {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[command(flatten)]
        secret: SecretArg,

        /// Session lifetime, e.g. 30m, 1h, 1h30m
        #[arg(long)]
        duration: String,
    },

    /// List tables in the public schema
    ListTables(SessionArgs),

    /// Fetch rows of a table as a JSON array
    GetJson {
        #[command(flatten)]
        session: SessionArgs,

        /// Table to read
        #[arg(long)]
        table: String,

        /// Column to include; repeat for several. All columns when omitted
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Raw SQL predicate appended as WHERE
        #[arg(long = "where")]
        where_clause: Option<String>,

        /// Maximum number of rows
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Delete a session before it expires
    CloseSession {
        /// Session key returned by open-session
        #[arg(long)]
        session_key: String,
    },
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Database host
    #[arg(long)]
    host: String,

    /// Database port
    #[arg(long, default_value_t = 5432)]
    port: u16,

    /// Database user
    #[arg(long)]
    username: String,

    /// Database password
    #[arg(long, env = "PG2JSON_DB_PASSWORD", hide_env_values = true)]
    password: String,

    /// Database name
    #[arg(long = "database")]
    database_name: String,

    /// Require TLS
    #[arg(long)]
    ssl: bool,
}

impl From<ConnectionArgs> for ConnectionParameters {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            username: args.username,
            password: args.password,
            database_name: args.database_name,
            ssl_mode_enabled: args.ssl,
        }
    }
}

#[derive(Args, Debug)]
struct SecretArg {
    /// Secret the session is encrypted under
    #[arg(long = "secret", env = "PG2JSON_SESSION_SECRET", hide_env_values = true)]
    value: String,
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Session key returned by open-session
    #[arg(long)]
    session_key: String,

    #[command(flatten)]
    secret: SecretArg,
}

fn query_spec(
    table: String,
    fields: Vec<String>,
    where_clause: Option<String>,
    limit: Option<u32>,
) -> QuerySpec {
    QuerySpec {
        table_name: table,
        fields,
        where_clause,
        limit,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let config = Config::load(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level, &paths.log_file(), cli.verbose)?;

    let reply = app::run(&config, cli.command).await?;
    reply.print()?;
    Ok(reply.exit_code())
}
