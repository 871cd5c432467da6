//! Business logic layer
//!
//! Each service writes the primary store first and then mirrors the stored
//! result into the search index. The two writes are sequential and not
//! transactional: an index failure is reported after the primary write has
//! already happened.

pub mod credential;
pub mod identity_provider;
pub mod service_provider;

pub use credential::CredentialService;
pub use identity_provider::IdentityProviderService;
pub use service_provider::ServiceProviderService;
