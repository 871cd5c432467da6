//! CredHub Core - Credential Registry Backend
//!
//! This crate provides the REST API for managing credentials, identity
//! providers and service providers. MySQL is the authoritative store and
//! every write is mirrored into an Elasticsearch index for free-text search.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod openapi;
pub mod repository;
pub mod search;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
