pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod resource;
pub mod retry;

// Re-export for main.rs
pub use crate::config::ProviderConfig;
pub use crate::controller::Context;
pub use crate::error::ProviderError;
