//! Identity provider domain model

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Identity provider referenced by at most one credential
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct IdentityProvider {
    pub id: Option<i64>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
}

impl IdentityProvider {
    pub const ENTITY_NAME: &'static str = "identityProvider";
    pub const SORTABLE_FIELDS: &'static [&'static str] = &["id", "name"];

    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }
}

/// Equal only when both sides carry the same store-assigned id
impl PartialEq for IdentityProvider {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

impl std::fmt::Display for IdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IdentityProvider{{id={:?}, name={:?}}}",
            self.id, self.name
        )
    }
}

/// Partial update payload; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct IdentityProviderPatch {
    pub id: Option<i64>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
}

impl IdentityProviderPatch {
    pub fn apply_to(&self, existing: &mut IdentityProvider) {
        if let Some(name) = &self.name {
            existing.name = Some(name.clone());
        }
    }
}
