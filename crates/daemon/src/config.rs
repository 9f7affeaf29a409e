// Daemon configuration
//
// Layered: built-in defaults < sendq.toml (or the file named by SENDQ_CONFIG)
// < SENDQ_* environment variables (`__` separates nested keys, e.g.
// SENDQ_RPC__PORT=9600).

use config::{Config, ConfigError, Environment, File};
use sendq_core::domain::QueueSettings;
use sendq_core::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_DB_PATH: &str = "~/.sendq/state.db";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9531;
const DEFAULT_TRANSPORT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 15_000;

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    /// Used only when no persisted settings exist (first run, corrupt record)
    #[serde(default)]
    pub queue: QueueSettings,
    /// How long shutdown waits for an in-flight send
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_host")]
    pub host: String,
    #[serde(default = "default_rpc_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Daily-rolling JSON log files are written here when set
    #[serde(default)]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Command,
    Http,
    #[default]
    Log,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,
    /// Program for the `command` transport
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_env_allowlist")]
    pub env_allowlist: Vec<String>,
    /// Chat API root for the `http` transport
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_transport_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_database_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_rpc_host() -> String {
    DEFAULT_RPC_HOST.to_string()
}

fn default_rpc_port() -> u16 {
    DEFAULT_RPC_PORT
}

fn default_env_allowlist() -> Vec<String> {
    vec!["PATH".to_string(), "HOME".to_string(), "USER".to_string()]
}

fn default_transport_timeout_ms() -> u64 {
    DEFAULT_TRANSPORT_TIMEOUT_MS
}

fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: default_rpc_host(),
            port: default_rpc_port(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            command: None,
            args: Vec::new(),
            env_allowlist: default_env_allowlist(),
            base_url: None,
            token: None,
            timeout_ms: default_transport_timeout_ms(),
        }
    }
}

impl DaemonConfig {
    /// Load from `SENDQ_CONFIG` (or `./sendq.toml` if present) plus environment
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var("SENDQ_CONFIG").ok().map(PathBuf::from);
        Self::from_sources(explicit.as_deref(), true)
    }

    /// Build from an optional explicit file, optionally layering the environment on top
    pub fn from_sources(file: Option<&Path>, with_env: bool) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("database_path", DEFAULT_DB_PATH)?
            .set_default("rpc.host", DEFAULT_RPC_HOST)?
            .set_default("rpc.port", DEFAULT_RPC_PORT)?
            .set_default("transport.timeout_ms", DEFAULT_TRANSPORT_TIMEOUT_MS)?
            .set_default("shutdown_grace_ms", DEFAULT_SHUTDOWN_GRACE_MS)?;

        builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("sendq").required(false)),
        };

        if with_env {
            builder = builder.add_source(
                Environment::with_prefix("SENDQ")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("transport.args")
                    .with_list_parse_key("transport.env_allowlist"),
            );
        }

        builder.build()?.try_deserialize()
    }

    /// Reject combinations that would only fail later at send time
    pub fn validate(&self) -> Result<(), AppError> {
        match self.transport.kind {
            TransportKind::Command if self.transport.command.is_none() => {
                return Err(AppError::Config(
                    "transport.kind = command requires transport.command".to_string(),
                ));
            }
            TransportKind::Http if self.transport.base_url.is_none() => {
                return Err(AppError::Config(
                    "transport.kind = http requires transport.base_url".to_string(),
                ));
            }
            _ => {}
        }

        self.queue
            .validate()
            .map_err(|e| AppError::Config(format!("queue: {}", e)))?;
        Ok(())
    }

    /// Database path with `~` expanded
    pub fn resolved_database_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.database_path).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let file = write_toml("");
        let config = DaemonConfig::from_sources(Some(file.path()), false).unwrap();

        assert_eq!(config.rpc.host, "127.0.0.1");
        assert_eq!(config.rpc.port, 9531);
        assert_eq!(config.transport.kind, TransportKind::Log);
        assert_eq!(config.transport.timeout_ms, 10_000);
        assert_eq!(config.shutdown_grace_ms, 15_000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.queue, QueueSettings::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides() {
        let file = write_toml(
            r#"
            database_path = "/tmp/sendq-test.db"
            shutdown_grace_ms = 500

            [rpc]
            port = 9600

            [logging]
            format = "json"

            [transport]
            kind = "http"
            base_url = "https://chat.example/api"
            token = "t0ken"

            [queue]
            delay_ms = 750
            max_queue_size = 5
            "#,
        );
        let config = DaemonConfig::from_sources(Some(file.path()), false).unwrap();

        assert_eq!(config.resolved_database_path(), PathBuf::from("/tmp/sendq-test.db"));
        assert_eq!(config.rpc.port, 9600);
        assert_eq!(config.rpc.host, "127.0.0.1");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.transport.kind, TransportKind::Http);
        assert_eq!(config.transport.token.as_deref(), Some("t0ken"));
        assert_eq!(config.queue.delay_ms, 750);
        assert_eq!(config.queue.max_queue_size, 5);
        assert!(config.queue.auto_send);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_command_transport_requires_program() {
        let file = write_toml("[transport]\nkind = \"command\"\n");
        let config = DaemonConfig::from_sources(Some(file.path()), false).unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("transport.command"));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let file = write_toml("[queue]\nmax_queue_size = 0\n");
        let config = DaemonConfig::from_sources(Some(file.path()), false).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let missing = Path::new("/nonexistent/sendq.toml");
        assert!(DaemonConfig::from_sources(Some(missing), false).is_err());
    }

    #[test]
    fn test_tilde_is_expanded() {
        let file = write_toml("");
        let config = DaemonConfig::from_sources(Some(file.path()), false).unwrap();
        assert!(!config.resolved_database_path().starts_with("~"));
    }
}
