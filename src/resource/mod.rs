//! Declared-state records owned and persisted by the caller

pub mod cluster;
pub mod evictor;
pub mod policies;
pub mod sso;

pub use cluster::{
    AksSpec, ClusterProvider, ClusterRegistration, EksSpec, GkeSpec, ProviderKind,
    CREDENTIALS_DRIFT_SENTINEL,
};
pub use evictor::{EvictionRuleSpec, MatchExpressionSpec, NodeSelectorSpec, PodSelectorSpec};
pub use policies::AutoscalerSettings;
pub use sso::{SsoConnectionSpec, SsoConnector};
