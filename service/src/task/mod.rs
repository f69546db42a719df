//! Background [`Task`]s definitions.

mod background;
pub mod reconcile_trust_metrics;

pub use common::Handler as Task;

pub use self::{
    background::{Background, Failure},
    reconcile_trust_metrics::ReconcileTrustMetrics,
};
