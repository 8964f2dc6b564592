use std::collections::HashMap;

use serde::Deserialize;

use crate::{Res, error::GatewayError};

/// Value of the `ProxyType` destination property that routes through the
/// on-premise connectivity tunnel.
pub const ON_PREMISE_PROXY: &str = "OnPremise";

/// Bearer credential cached per session, stored with its scheme prefix so it
/// can be sent as the `Authorization` header as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub const SCHEME: &'static str = "OAuth";

    pub fn oauth(credential: &str) -> Self {
        SessionToken(format!("{} {}", Self::SCHEME, credential))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The credential without its scheme prefix.
    pub fn credential(&self) -> &str {
        self.0
            .strip_prefix(Self::SCHEME)
            .map(str::trim_start)
            .unwrap_or(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.credential().trim().is_empty()
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        SessionToken(value)
    }
}

/// How a destination is reached, taken from its `ProxyType` property.
///
/// `OnPremise` routes through the platform's connectivity proxy and requires
/// the consumer account header. `Internet` goes through the internet proxy
/// when one is configured, or directly otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyType {
    OnPremise,
    Internet,
}

impl ProxyType {
    /// Maps a raw `ProxyType` property value to a routing kind.
    ///
    /// Only the exact, case-sensitive value `OnPremise` selects on-premise
    /// routing. Any other value, and a missing property, means internet.
    ///
    /// # Example
    ///
    /// ```
    /// use expgate::types::ProxyType;
    ///
    /// assert_eq!(ProxyType::parse(Some("OnPremise")), ProxyType::OnPremise);
    /// assert_eq!(ProxyType::parse(Some("onpremise")), ProxyType::Internet);
    /// assert_eq!(ProxyType::parse(None), ProxyType::Internet);
    /// ```
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(ON_PREMISE_PROXY) => ProxyType::OnPremise,
            _ => ProxyType::Internet,
        }
    }
}

/// A validated HTTP proxy address an outbound request is routed through.
///
/// Built by [`ProxySelector`](crate::connectivity::ProxySelector) once the
/// configured port has parsed; a request without an endpoint connects
/// directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
}

impl ProxyEndpoint {
    /// Returns the proxy as an `http://host:port` URL, the form reqwest expects.
    ///
    /// # Example
    ///
    /// ```
    /// use expgate::types::ProxyEndpoint;
    ///
    /// let proxy = ProxyEndpoint { host: "localhost".into(), port: 20003 };
    /// assert_eq!(proxy.url(), "http://localhost:20003");
    /// ```
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Read-only key/value configuration of one named destination.
#[derive(Debug, Clone, Default)]
pub struct DestinationProperties {
    name: String,
    values: HashMap<String, String>,
}

impl DestinationProperties {
    pub fn new(name: impl Into<String>, values: HashMap<String, String>) -> Self {
        DestinationProperties {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Res<&str> {
        self.get(key).ok_or_else(|| GatewayError::MissingProperty {
            destination: self.name.clone(),
            property: key.to_string(),
        })
    }

    pub fn proxy_type(&self) -> ProxyType {
        ProxyType::parse(self.get("ProxyType"))
    }
}

/// A fully prepared outbound GET: target, headers and the proxy to route through.
///
/// Requests are assembled by the Concur client and handed to a
/// [`Transport`](crate::concur::Transport), which sends them as they are.
/// Headers keep their insertion order and may repeat.
///
/// # Example
///
/// ```
/// use expgate::types::OutboundRequest;
///
/// let request = OutboundRequest::new("https://api.concur.test/v3.0/expense/entries", None)
///     .header("Accept", "application/xml")
///     .header("Authorization", "OAuth abc123");
///
/// assert_eq!(request.header_value("authorization"), Some("OAuth abc123"));
/// assert!(request.proxy.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub proxy: Option<ProxyEndpoint>,
}

impl OutboundRequest {
    pub fn new(url: impl Into<String>, proxy: Option<ProxyEndpoint>) -> Self {
        OutboundRequest {
            url: url.into(),
            headers: Vec::new(),
            proxy,
        }
    }

    /// Appends a header, builder style.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// First value of the named header, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// JSON body returned by the Concur token endpoint.
///
/// Only `Access_Token.Token` is required; other fields are ignored.
///
/// # Example
///
/// ```
/// use expgate::types::AuthTokenResponse;
///
/// let body = r#"{"Access_Token":{"Token":"abc123","Expiration_date":"9/30/2027 4:02:36 PM"}}"#;
/// let response: AuthTokenResponse = serde_json::from_str(body).unwrap();
/// assert_eq!(response.access_token.token, "abc123");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokenResponse {
    #[serde(rename = "Access_Token")]
    pub access_token: AccessToken,
}

/// The `Access_Token` object of [`AuthTokenResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "Token")]
    pub token: String,
    /// Reported by Concur but not used; tokens live as long as the session.
    #[serde(rename = "Expiration_date", default)]
    pub expiration_date: Option<String>,
}
