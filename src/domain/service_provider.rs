//! Service provider domain model

use super::credential::Credential;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Service provider, owned by at most one credential
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct ServiceProvider {
    pub id: Option<i64>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(no_recursion)]
    pub credential: Option<Box<Credential>>,
}

impl ServiceProvider {
    pub const ENTITY_NAME: &'static str = "serviceProvider";
    pub const SORTABLE_FIELDS: &'static [&'static str] = &["id", "name"];

    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn credential_id(&self) -> Option<i64> {
        self.credential.as_ref().and_then(|c| c.id)
    }

    /// Copy without the back-reference, as embedded in a credential
    pub fn summary(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            credential: None,
        }
    }
}

/// Equal only when both sides carry the same store-assigned id
impl PartialEq for ServiceProvider {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

impl std::fmt::Display for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ServiceProvider{{id={:?}, name={:?}}}",
            self.id, self.name
        )
    }
}

/// Partial update payload; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct ServiceProviderPatch {
    pub id: Option<i64>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
}

impl ServiceProviderPatch {
    pub fn apply_to(&self, existing: &mut ServiceProvider) {
        if let Some(name) = &self.name {
            existing.name = Some(name.clone());
        }
    }
}
