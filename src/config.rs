//! Configuration management for the expense gateway.
//!
//! Values come from environment variables, optionally seeded from `.env` files.
//! Everything is read once at startup into a [`GatewayConfig`] which is then
//! passed explicitly to the components that need it; nothing below the CLI
//! layer touches the process environment.
//!
//! The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the local data directory
//! 3. `.env` in the working directory
//! 4. Application defaults (where applicable)

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{Res, error::GatewayError};

pub const APP_DIR: &str = "expgate";

pub const SERVER_ADDRESS: &str = "SERVER_ADDRESS";
pub const DESTINATIONS_DIR: &str = "EXPGATE_DESTINATIONS_DIR";
pub const TENANT_ACCOUNT: &str = "EXPGATE_TENANT_ACCOUNT";
pub const CONNECT_TIMEOUT_SECS: &str = "EXPGATE_CONNECT_TIMEOUT_SECS";
pub const REQUEST_TIMEOUT_SECS: &str = "EXPGATE_REQUEST_TIMEOUT_SECS";
/// Idle time after which a browser session and its cached token are dropped.
pub const SESSION_TIMEOUT_SECS: &str = "EXPGATE_SESSION_TIMEOUT_SECS";

/// Host and port of the on-premise connectivity proxy, provided by the platform.
pub const ON_PREMISE_PROXY_HOST: &str = "HC_OP_HTTP_PROXY_HOST";
pub const ON_PREMISE_PROXY_PORT: &str = "HC_OP_HTTP_PROXY_PORT";

/// Host and port of the internet proxy, only needed when running outside the platform.
pub const INTERNET_PROXY_HOST: &str = "HTTP_PROXY_HOST";
pub const INTERNET_PROXY_PORT: &str = "HTTP_PROXY_PORT";

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 30 * 60;

/// Loads environment variables from `.env` files.
///
/// Creates the local data directory if it doesn't exist, then reads
/// `.env` from it and afterwards `.env` from the working directory. Both
/// files are optional. A variable is only taken from the first place that
/// defines it, so the process environment wins over the data directory,
/// which wins over the working directory.
///
/// # Directory Structure
///
/// The data directory `.env` is looked up in:
/// - Linux: `~/.local/share/expgate/.env`
/// - macOS: `~/Library/Application Support/expgate/.env`
/// - Windows: `%LOCALAPPDATA%/expgate/.env`
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or the working
/// directory cannot be determined. Missing `.env` files are not an error.
///
/// # Example
///
/// ```
/// use expgate::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Res<()> {
    let data_dir = app_data_dir();
    async_fs::create_dir_all(&data_dir).await?;

    let cwd = env::current_dir()?;
    load_env_files(&[data_dir.join(".env"), cwd.join(".env")]);
    Ok(())
}

/// Loads the given `.env` files in order and returns how many were found.
/// Earlier files take precedence since existing variables are kept.
fn load_env_files(paths: &[PathBuf]) -> usize {
    paths
        .iter()
        .filter(|path| load_env_file(path.as_path()))
        .count()
}

fn load_env_file(path: &Path) -> bool {
    match dotenv::from_path(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded .env");
            true
        }
        Err(e) => {
            if path.exists() {
                tracing::warn!(path = %path.display(), error = %e, "could not load .env");
            }
            false
        }
    }
}

/// Returns the platform-specific local data directory of the gateway.
///
/// This is where `build.rs` puts `.env.example` and the sample destination
/// files. Falls back to `./expgate` when the platform has no data directory.
///
/// # Example
///
/// ```
/// let dir = expgate::config::app_data_dir(); // e.g., "/home/jdoe/.local/share/expgate"
/// ```
pub fn app_data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Raw, unvalidated proxy address. The port stays a string so a malformed
/// value only fails the request that needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyAddress {
    pub host: Option<String>,
    pub port: Option<String>,
}

impl ProxyAddress {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        ProxyAddress {
            host: Some(host.into()),
            port: Some(port.into()),
        }
    }

    fn from_env(host_var: &str, port_var: &str) -> Self {
        ProxyAddress {
            host: non_empty_var(host_var),
            port: non_empty_var(port_var),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub on_premise: ProxyAddress,
    pub internet: ProxyAddress,
}

impl ProxySettings {
    pub fn from_env() -> Self {
        ProxySettings {
            on_premise: ProxyAddress::from_env(ON_PREMISE_PROXY_HOST, ON_PREMISE_PROXY_PORT),
            internet: ProxyAddress::from_env(INTERNET_PROXY_HOST, INTERNET_PROXY_PORT),
        }
    }
}

/// Settings of one gateway process, read once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub server_addr: String,
    pub destinations_dir: PathBuf,
    /// Sent as the consumer account header on on-premise routes.
    pub tenant_account: Option<String>,
    pub proxy: ProxySettings,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Sessions idle for longer than this are dropped with their token.
    pub session_timeout: Duration,
}

impl GatewayConfig {
    /// Builds the configuration from the process environment.
    ///
    /// Call [`load_env`] first so `.env` files are taken into account. Unset
    /// values fall back to their defaults: `127.0.0.1:8080`, the data
    /// directory's `destinations/`, 10s connect and 30s request timeouts,
    /// and a 30 minute session timeout. Proxy ports are kept raw and only
    /// validated when a request needs them.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] when a timeout variable is set but is
    /// not a whole number of seconds.
    ///
    /// # Example
    ///
    /// ```
    /// use expgate::config::GatewayConfig;
    ///
    /// let config = GatewayConfig::from_env().unwrap();
    /// println!("listening on {}", config.server_addr);
    /// ```
    pub fn from_env() -> Res<Self> {
        Ok(GatewayConfig {
            server_addr: server_addr(),
            destinations_dir: destinations_dir(),
            tenant_account: non_empty_var(TENANT_ACCOUNT),
            proxy: ProxySettings::from_env(),
            connect_timeout: secs_var(CONNECT_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS)?,
            request_timeout: secs_var(REQUEST_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS)?,
            session_timeout: secs_var(SESSION_TIMEOUT_SECS, DEFAULT_SESSION_TIMEOUT_SECS)?,
        })
    }
}

/// Returns the address the gateway listens on.
///
/// Reads the `SERVER_ADDRESS` environment variable and falls back to
/// `127.0.0.1:8080` when it is unset or blank. The value is not validated
/// here; [`start_api_server`](crate::server::start_api_server) rejects
/// addresses that do not parse.
///
/// # Example
///
/// ```
/// let addr = expgate::config::server_addr(); // e.g., "127.0.0.1:8080"
/// ```
pub fn server_addr() -> String {
    non_empty_var(SERVER_ADDRESS).unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string())
}

/// Returns the directory holding one properties file per destination.
///
/// Reads `EXPGATE_DESTINATIONS_DIR`, falling back to `destinations/` inside
/// [`app_data_dir`]. The directory does not have to exist; lookups in a
/// missing directory report the destination as not found.
///
/// # Example
///
/// ```
/// let dir = expgate::config::destinations_dir(); // e.g., "/home/jdoe/.local/share/expgate/destinations"
/// ```
pub fn destinations_dir() -> PathBuf {
    match non_empty_var(DESTINATIONS_DIR) {
        Some(dir) => PathBuf::from(dir),
        None => app_data_dir().join("destinations"),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn secs_var(name: &str, default: u64) -> Res<Duration> {
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| GatewayError::Config(format!("{} must be a number of seconds: {}", name, e))),
        None => Ok(Duration::from_secs(default)),
    }
}
