//! Credential domain model

use super::identity_provider::IdentityProvider;
use super::service_provider::ServiceProvider;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Credential entity
///
/// `service_providers` is `None` when the relationship was not loaded and
/// `Some` when it was. Saving a credential with `Some` replaces the linked
/// set; saving with `None` leaves the links alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct Credential {
    pub id: Option<i64>,
    #[validate(length(max = 255))]
    pub profile: Option<String>,
    pub enabled: Option<bool>,
    #[validate(length(max = 255))]
    pub username: Option<String>,
    #[validate(length(max = 255))]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_provider: Option<IdentityProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(no_recursion)]
    pub service_providers: Option<Vec<ServiceProvider>>,
}

impl Credential {
    pub const ENTITY_NAME: &'static str = "credential";
    pub const SORTABLE_FIELDS: &'static [&'static str] =
        &["id", "profile", "enabled", "username"];

    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    /// Scalar-only copy, as embedded in a service provider
    pub fn summary(&self) -> Self {
        Self {
            identity_provider: None,
            service_providers: None,
            ..self.clone()
        }
    }

    /// Ids of the loaded service providers, `None` if not loaded
    pub fn service_provider_ids(&self) -> Option<Vec<i64>> {
        self.service_providers
            .as_ref()
            .map(|sps| sps.iter().filter_map(|sp| sp.id).collect())
    }
}

/// Equal only when both sides carry the same store-assigned id
impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

// Password is left out on purpose; this is what ends up in the logs.
impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Credential{{id={:?}, profile={:?}, enabled={:?}, username={:?}}}",
            self.id, self.profile, self.enabled, self.username
        )
    }
}

/// Partial update payload; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct CredentialPatch {
    pub id: Option<i64>,
    #[validate(length(max = 255))]
    pub profile: Option<String>,
    pub enabled: Option<bool>,
    #[validate(length(max = 255))]
    pub username: Option<String>,
    #[validate(length(max = 255))]
    pub password: Option<String>,
}

impl CredentialPatch {
    pub fn apply_to(&self, existing: &mut Credential) {
        if let Some(profile) = &self.profile {
            existing.profile = Some(profile.clone());
        }
        if let Some(enabled) = self.enabled {
            existing.enabled = Some(enabled);
        }
        if let Some(username) = &self.username {
            existing.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            existing.password = Some(password.clone());
        }
    }
}
