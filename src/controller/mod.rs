//! Resource lifecycle drivers
//!
//! Each module drives one Platform resource through create, read, update
//! and delete against a shared [`Context`]:
//! - `cluster` - registration, credentials push and the delete state machine
//! - `token` - cluster token issue and replacement planning
//! - `drift` - credentials drift detection on read
//! - `policies` - autoscaler policies merge engine
//! - `evictor` - evictor advanced config translation
//! - `sso` - SSO connections with activation polling

pub mod cluster;
pub mod drift;
pub mod evictor;
pub mod policies;
pub mod sso;
pub mod token;

use crate::api::{HttpTransport, PlatformClient};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use std::sync::Arc;

/// Shared state handed to every resource operation
#[derive(Clone)]
pub struct Context {
    pub client: PlatformClient,
    pub config: ProviderConfig,
}

impl Context {
    pub fn new(client: PlatformClient, config: ProviderConfig) -> Self {
        Context { client, config }
    }

    /// Context talking HTTP to `config.api_url`
    pub fn from_config(config: ProviderConfig) -> Self {
        let transport = HttpTransport::new(config.api_url.as_str(), config.api_token.as_str());
        Context {
            client: PlatformClient::new(Arc::new(transport)),
            config,
        }
    }

    /// Context backed by an in-memory transport with millisecond timings
    #[cfg(test)]
    pub fn new_mock(transport: Arc<crate::api::mock::MockTransport>) -> Self {
        use crate::retry::Backoff;
        use std::time::Duration;

        let config = ProviderConfig {
            delete_timeout: Duration::from_secs(5),
            update_timeout: Duration::from_secs(2),
            sso_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(1),
            write_backoff: Backoff::Exponential {
                initial: Duration::from_millis(1),
                factor: 2.0,
                max: Duration::from_millis(10),
            },
            ..ProviderConfig::default()
        };
        Context {
            client: PlatformClient::new(transport),
            config,
        }
    }
}

/// Platform id of a resource that must already exist
pub(crate) fn require_id<'a>(
    id: &'a Option<String>,
    resource: &str,
) -> Result<&'a str, ProviderError> {
    id.as_deref().filter(|id| !id.is_empty()).ok_or_else(|| {
        ProviderError::validation(format!("{} has no id; create it first", resource))
    })
}
