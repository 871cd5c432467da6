//! HTTP middleware for CredHub Core

pub mod metrics;

pub use metrics::ObservabilityLayer;
