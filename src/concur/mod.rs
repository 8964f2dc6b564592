//! # Concur Module
//!
//! Client side of the Concur integration. [`ConcurClient`] bundles the
//! collaborators every outbound call needs (destination resolver, proxy
//! selector, tenant context, transport) and exposes the two operations the
//! gateway performs:
//!
//! - [`ConcurClient::obtain_token`] - Basic-authenticated token exchange
//!   against the `concur-auth` destination
//! - [`ConcurClient::fetch_expenses`] - expense entries from the `concur-api`
//!   destination, transcoded from XML to JSON
//!
//! Neither operation caches anything; token reuse is the request handler's job.

use std::sync::Arc;

use tracing::debug;

use crate::{
    Res,
    connectivity::{DestinationResolver, ProxySelector, TenantContext},
    error::GatewayError,
    types::{DestinationProperties, OutboundRequest, ProxyType},
};

pub mod auth;
pub mod expenses;
pub mod transport;

pub use transport::{HttpTransport, Transport};

pub const API_DESTINATION: &str = "concur-api";
pub const AUTH_DESTINATION: &str = "concur-auth";

/// Header propagating the consumer account through the on-premise proxy.
pub const CONSUMER_ACCOUNT_HEADER: &str = "SAP-Connectivity-ConsumerAccount";

#[derive(Clone)]
pub struct ConcurClient {
    destinations: Arc<dyn DestinationResolver>,
    proxies: Arc<ProxySelector>,
    tenant: Arc<dyn TenantContext>,
    transport: Arc<dyn Transport>,
}

impl ConcurClient {
    pub fn new(
        destinations: Arc<dyn DestinationResolver>,
        proxies: Arc<ProxySelector>,
        tenant: Arc<dyn TenantContext>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        ConcurClient {
            destinations,
            proxies,
            tenant,
            transport,
        }
    }

    async fn destination(&self, name: &str) -> Res<DestinationProperties> {
        debug!(destination = name, "getting destination properties");
        self.destinations.get_properties(name).await
    }

    /// Starts a GET to `url` routed for the destination's proxy type, with the
    /// consumer account header already set when going on-premise.
    fn prepare(&self, destination: &DestinationProperties, url: String) -> Res<OutboundRequest> {
        let proxy_type = destination.proxy_type();
        let proxy = self.proxies.select_proxy(proxy_type)?;
        let request = OutboundRequest::new(url, proxy);

        if proxy_type != ProxyType::OnPremise {
            return Ok(request);
        }

        let account = self.tenant.account_id().ok_or_else(|| {
            GatewayError::Config(format!(
                "destination [ {} ] routes on-premise but no tenant account is configured",
                destination.name()
            ))
        })?;
        Ok(request.header(CONSUMER_ACCOUNT_HEADER, account))
    }
}
