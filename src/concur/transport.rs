use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use tracing::{debug, trace};

use crate::{Res, error::GatewayError, types::OutboundRequest};

/// Performs outbound GET requests and returns the full response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &OutboundRequest) -> Res<Vec<u8>>;
}

/// [`Transport`] backed by reqwest.
///
/// A client is built per request so each call gets the proxy its destination
/// asked for. Environment proxy variables are ignored; routing is decided by
/// the proxy selector only.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        HttpTransport {
            connect_timeout,
            request_timeout,
        }
    }

    fn client(&self, request: &OutboundRequest) -> Res<Client> {
        let transport_err = |source: reqwest::Error| GatewayError::Transport {
            url: request.url.clone(),
            source,
        };

        let mut builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout);

        builder = match &request.proxy {
            Some(proxy) => builder.proxy(Proxy::all(proxy.url()).map_err(transport_err)?),
            None => builder.no_proxy(),
        };

        builder.build().map_err(transport_err)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &OutboundRequest) -> Res<Vec<u8>> {
        let transport_err = |source: reqwest::Error| GatewayError::Transport {
            url: request.url.clone(),
            source,
        };

        let client = self.client(request)?;
        let mut builder = client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(url = %request.url, proxied = request.proxy.is_some(), "sending request");
        let mut response = builder.send().await.map_err(transport_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(transport_err)? {
            body.extend_from_slice(&chunk);
        }
        trace!(url = %request.url, bytes = body.len(), "response drained");

        Ok(body)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        HttpTransport::new(Duration::from_secs(10), Duration::from_secs(30))
    }
}
