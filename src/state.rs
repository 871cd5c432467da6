//! Application state traits for dependency injection
//!
//! Handlers are generic over [`HasServices`] so the same router runs
//! against the production `AppState` and the in-memory test state.

use crate::config::Config;
use crate::domain::{Credential, IdentityProvider, ServiceProvider};
use crate::repository::{
    CredentialRepository, IdentityProviderRepository, ServiceProviderRepository,
};
use crate::search::SearchRepository;
use crate::service::{CredentialService, IdentityProviderService, ServiceProviderService};

/// Trait for application state that provides access to all services.
pub trait HasServices: Clone + Send + Sync + 'static {
    /// The credential repository type
    type CredentialRepo: CredentialRepository + 'static;
    /// The identity provider repository type
    type IdentityProviderRepo: IdentityProviderRepository + 'static;
    /// The service provider repository type
    type ServiceProviderRepo: ServiceProviderRepository + 'static;
    /// Search index for credentials
    type CredentialSearch: SearchRepository<Credential> + 'static;
    /// Search index for identity providers
    type IdentityProviderSearch: SearchRepository<IdentityProvider> + 'static;
    /// Search index for service providers
    type ServiceProviderSearch: SearchRepository<ServiceProvider> + 'static;

    /// Get the application configuration
    fn config(&self) -> &Config;

    fn credential_service(
        &self,
    ) -> &CredentialService<Self::CredentialRepo, Self::CredentialSearch>;

    fn identity_provider_service(
        &self,
    ) -> &IdentityProviderService<Self::IdentityProviderRepo, Self::IdentityProviderSearch>;

    fn service_provider_service(
        &self,
    ) -> &ServiceProviderService<Self::ServiceProviderRepo, Self::ServiceProviderSearch>;

    /// Check readiness of the primary store and the search index
    fn check_ready(&self) -> impl std::future::Future<Output = (bool, bool)> + Send;
}
