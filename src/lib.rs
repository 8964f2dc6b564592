//! Concur Expense Gateway Library
//!
//! This library authenticates against the Concur API with a token exchange,
//! fetches expense entries and hands them to a browser session as JSON. Token
//! reuse is scoped to the browser session; endpoint credentials and proxy
//! routing come from injected collaborators.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints (expense listing, health)
//! - `concur` - Concur client: token exchange, expense fetching, transport
//! - `config` - Configuration management and environment variables
//! - `connectivity` - Destination resolution, proxy selection, tenant context
//! - `error` - Error taxonomy
//! - `management` - Session storage
//! - `server` - Router and listener
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//! - `xml` - XML to JSON transcoding
//!
//! # Example
//!
//! ```
//! use expgate::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> expgate::Res<()> {
//!     config::load_env().await?;
//!     let config = config::GatewayConfig::from_env()?;
//!     server::start_api_server(&config.server_addr, server::AppState::from_config(&config)).await
//! }
//! ```

pub mod api;
pub mod concur;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod management;
pub mod server;
pub mod types;
pub mod utils;
pub mod xml;

/// A convenient Result type alias for operations that may fail.
///
/// Every fallible operation in the gateway reports a
/// [`GatewayError`](error::GatewayError), which keeps configuration problems
/// distinguishable from transport failures at the handler boundary.
pub type Res<T> = std::result::Result<T, error::GatewayError>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching expense entries...");
/// info!("Loaded {} destinations", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for the CLI entry points; request handling never calls it.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
