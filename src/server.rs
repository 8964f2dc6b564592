use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{Router, routing::get};
use tracing::info;

use crate::{
    Res, api,
    concur::{ConcurClient, HttpTransport},
    config::GatewayConfig,
    connectivity::{FileDestinations, ProxySelector, StaticTenant},
    error::GatewayError,
    management::{MemorySessionStore, SessionStore},
};

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: ConcurClient,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(client: ConcurClient, sessions: Arc<dyn SessionStore>) -> Self {
        AppState { client, sessions }
    }

    /// Wires the production collaborators from configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let client = ConcurClient::new(
            Arc::new(FileDestinations::new(&config.destinations_dir)),
            Arc::new(ProxySelector::new(config.proxy.clone())),
            Arc::new(StaticTenant::new(config.tenant_account.clone())),
            Arc::new(HttpTransport::new(
                config.connect_timeout,
                config.request_timeout,
            )),
        );
        let sessions = MemorySessionStore::with_idle_timeout(config.session_timeout);
        AppState::new(client, Arc::new(sessions))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::expenses))
        .route("/expenses", get(api::expenses))
        .route("/health", get(api::health))
        .with_state(state)
}

pub async fn start_api_server(addr: &str, state: AppState) -> Res<()> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| GatewayError::Config(format!("invalid server address {:?}: {}", addr, e)))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "expense gateway listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
