//! Error taxonomy for the gateway.
//!
//! Every failure a request can hit falls into one of three groups: configuration
//! problems (unknown destination, missing property, bad proxy settings), transport
//! problems (connection, non-success status, unreadable body) and malformed payloads.
//! The HTTP boundary collapses all of them into a generic server error, so the
//! variants here mainly exist to produce useful log lines and to let the handler
//! recognise the few cases it reacts to (see [`GatewayError::is_unauthorized`]).

use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Destination [ {0} ] not found. Hint: Make sure to have the destination configured.")]
    DestinationNotFound(String),

    #[error("Destination [ {destination} ] has no property {property}")]
    MissingProperty {
        destination: String,
        property: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid proxy port {value:?}: {source}")]
    ProxyPort {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed XML: {0}")]
    Xml(String),
}

impl GatewayError {
    /// True for failures caused by destination or proxy configuration rather
    /// than by the remote system.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GatewayError::DestinationNotFound(_)
                | GatewayError::MissingProperty { .. }
                | GatewayError::Config(_)
                | GatewayError::ProxyPort { .. }
        )
    }

    /// True when the remote endpoint rejected the credentials (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Status { status: 401, .. })
    }
}

impl From<quick_xml::Error> for GatewayError {
    fn from(e: quick_xml::Error) -> Self {
        GatewayError::Xml(e.to_string())
    }
}
