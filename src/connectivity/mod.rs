//! # Connectivity Module
//!
//! Everything the gateway needs to know before it can open a connection:
//!
//! - [`DestinationResolver`] - named endpoint configuration (URL, credentials,
//!   consumer key, proxy type), in memory or backed by properties files
//! - [`ProxySelector`] - forward proxy choice per proxy type
//! - [`TenantContext`] - consumer account for on-premise routing
//!
//! All three are injected at startup; none of them reads process-wide state.

mod destination;
mod proxy;
mod tenant;

pub use destination::{DestinationResolver, FileDestinations, StaticDestinations, parse_properties};
pub use proxy::ProxySelector;
pub use tenant::{StaticTenant, TenantContext};
