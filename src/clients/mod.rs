//! Clients - HTTP Clients for External APIs
//!
//! This module contains the fleet host JSON-RPC client and the typed
//! gateway used by the matching and odometer services.

pub mod geotab_client;
pub mod host_api;
pub mod host_gateway;

// Re-export main types for convenience
pub use geotab_client::{GeotabClient, SessionCredentials};
pub use host_api::{HostApi, OfflineHostApi};
pub use host_gateway::HostGateway;
