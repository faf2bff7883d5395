//! Platform REST API surface
//!
//! - `transport` - raw authenticated HTTP exchange
//! - `status` - pure classification of responses
//! - `client` - typed operations used by the controllers
//! - `types` - wire records

pub mod client;
pub mod status;
pub mod transport;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use client::PlatformClient;
pub use transport::{ApiRequest, HttpTransport, RawResponse, Transport, TransportError};
