//! Domain models

pub mod common;
pub mod credential;
pub mod graph;
pub mod identity_provider;
pub mod service_provider;

pub use common::*;
pub use credential::*;
pub use graph::*;
pub use identity_provider::*;
pub use service_provider::*;
