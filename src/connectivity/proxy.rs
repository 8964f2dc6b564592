use tracing::debug;

use crate::{
    Res,
    config::{ProxyAddress, ProxySettings},
    error::GatewayError,
    types::{ProxyEndpoint, ProxyType},
};

/// Picks the forward proxy for a destination's proxy type.
#[derive(Debug, Clone, Default)]
pub struct ProxySelector {
    settings: ProxySettings,
}

impl ProxySelector {
    pub fn new(settings: ProxySettings) -> Self {
        ProxySelector { settings }
    }

    /// Returns the proxy to route through, or `None` for a direct connection.
    ///
    /// On-premise destinations always need the connectivity proxy. Internet
    /// destinations go direct unless a proxy host is configured. A configured
    /// but malformed port fails here, before any connection is attempted.
    pub fn select_proxy(&self, proxy_type: ProxyType) -> Res<Option<ProxyEndpoint>> {
        match proxy_type {
            ProxyType::OnPremise => {
                debug!("configuring on-premise proxy");
                let address = &self.settings.on_premise;
                if address.host.is_none() {
                    return Err(GatewayError::Config(
                        "on-premise proxy host is not configured".into(),
                    ));
                }
                endpoint(address).map(Some)
            }
            ProxyType::Internet => {
                if self.settings.internet.host.is_none() {
                    debug!("no internet proxy configured, connecting directly");
                    return Ok(None);
                }
                debug!("configuring internet proxy");
                endpoint(&self.settings.internet).map(Some)
            }
        }
    }
}

fn endpoint(address: &ProxyAddress) -> Res<ProxyEndpoint> {
    let host = address.host.clone().unwrap_or_default();
    let raw_port = address.port.clone().unwrap_or_default();
    let port = raw_port
        .trim()
        .parse::<u16>()
        .map_err(|source| GatewayError::ProxyPort {
            value: raw_port.clone(),
            source,
        })?;
    Ok(ProxyEndpoint { host, port })
}
