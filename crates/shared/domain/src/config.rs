use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub vault: VaultConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub runtime: RuntimeConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
    /// Seconds open connections get to drain after a shutdown signal.
    pub shutdown_grace_seconds: u64,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// `SurrealDB` connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DatabaseCredentials>,
}

/// `SurrealDB` root credentials (not needed for unauthenticated engines like mem://).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

/// Record encryption settings.
///
/// Without a `salt` the `secret` is used as the raw 32-byte AES-256 key. With a `salt` the key
/// is derived from the secret with HKDF-SHA256.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub secret: String,
    pub salt: Option<String>,
}

/// Command session tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capacity of every session's outbound queue.
    pub outbound_capacity: usize,
    /// Total delivery attempts per broadcast recipient.
    pub broadcast_attempts: u32,
    /// Pause between broadcast attempts, multiplied by the attempt number.
    pub broadcast_backoff_ms: u64,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Extra directives (e.g. `keeper_session=debug,surrealdb=warn`).
    pub filter: Option<String>,
    pub console: bool,
    /// Enables rolling file output when set.
    pub directory: Option<PathBuf>,
    pub json: bool,
    pub max_files: usize,
}

/// Async runtime sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// `0` picks the detected parallelism.
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 50051,
            ssl: None,
            shutdown_grace_seconds: 5,
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mem://".to_owned(),
            namespace: "keeper".to_owned(),
            database: "vault".to_owned(),
            credentials: None,
        }
    }
}

impl Default for DatabaseCredentials {
    fn default() -> Self {
        Self { username: "root".to_owned(), password: "root".to_owned() }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { secret: "thisis32byteencryptionkey1234567".to_owned(), salt: None }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { outbound_capacity: 100, broadcast_attempts: 3, broadcast_backoff_ms: 50 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            filter: None,
            console: true,
            directory: None,
            json: false,
            max_files: 10,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { worker_threads: 0, stack_size: 3 * 1024 * 1024, thread_name: "keeper-worker".to_owned() }
    }
}
