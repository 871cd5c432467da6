//! Data access layer (Repository pattern)

pub mod credential;
pub mod identity_provider;
pub mod service_provider;

pub use credential::CredentialRepository;
pub use identity_provider::IdentityProviderRepository;
pub use service_provider::ServiceProviderRepository;

use crate::error::AppError;

/// Map constraint violations to client errors, everything else stays a
/// database error.
pub(crate) fn map_constraint_violation(err: sqlx::Error, entity: &str) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::Conflict(format!(
                "{} conflicts with an existing relationship",
                entity
            ));
        }
        if db.is_foreign_key_violation() {
            return AppError::BadRequest(format!(
                "{} references a record that does not exist",
                entity
            ));
        }
    }
    AppError::Database(err)
}
