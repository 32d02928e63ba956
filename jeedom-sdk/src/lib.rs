//! Shared wire types and the JSON-RPC client for the Jeedom API.
//!
//! The [`objects`] module is always available. The HTTP client lives in
//! [`client`] and is gated behind the `client` feature.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;

pub use objects::ApiKey;
