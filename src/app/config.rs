// Command-line and environment configuration
use clap::Parser;

use crate::app::storage::StorageConfig;

#[derive(Clone, Debug, Parser)]
#[command(name = "todo-web", version, about = "Server-rendered to-do task tracker")]
pub struct Config {
    #[arg(long, env = "TODO_HOST", help = "Host to bind", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "TODO_PORT", help = "Port to bind", default_value_t = 3000)]
    pub port: u16,

    #[arg(
        long,
        env = "TODO_DATABASE",
        help = "Path of the SQLite database file",
        default_value = "database.db"
    )]
    pub database: String,

    #[arg(
        long,
        env = "TODO_POOL_SIZE",
        help = "Maximum number of pooled database connections",
        default_value_t = 8
    )]
    pub pool_size: u32,

    #[arg(
        long,
        env = "TODO_BUSY_TIMEOUT_MS",
        help = "How long a connection waits on a locked database, in milliseconds",
        default_value_t = 5_000
    )]
    pub busy_timeout_ms: u32,
}

impl Config {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            pool_size: self.pool_size,
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Config::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "todo-web",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--database",
            "/tmp/tasks.db",
            "--pool-size",
            "2",
            "--busy-timeout-ms",
            "100",
        ])
        .unwrap();
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
        assert_eq!(config.database, "/tmp/tasks.db");
        let storage = config.storage();
        assert_eq!(storage.pool_size, 2);
        assert_eq!(storage.busy_timeout_ms, 100);
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(Config::try_parse_from(["todo-web", "--port", "http"]).is_err());
    }
}
