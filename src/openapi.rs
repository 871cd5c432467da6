//! OpenAPI 3.0 documentation assembly
//!
//! Aggregates the handler path annotations and domain schemas into a single
//! OpenAPI document. Swagger UI is served in non-production environments.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CredHub Core API",
        version = "0.1.0",
        description = "Credential, identity provider and service provider registry"
    ),
    tags(
        (name = "Credentials", description = "Credentials and their service provider links"),
        (name = "IdentityProviders", description = "Identity providers"),
        (name = "ServiceProviders", description = "Service providers"),
    ),
    paths(
        crate::api::credential::create,
        crate::api::credential::update,
        crate::api::credential::partial_update,
        crate::api::credential::list,
        crate::api::credential::get,
        crate::api::credential::delete,
        crate::api::credential::search,
        crate::api::identity_provider::create,
        crate::api::identity_provider::update,
        crate::api::identity_provider::partial_update,
        crate::api::identity_provider::list,
        crate::api::identity_provider::get,
        crate::api::identity_provider::delete,
        crate::api::identity_provider::search,
        crate::api::service_provider::create,
        crate::api::service_provider::update,
        crate::api::service_provider::partial_update,
        crate::api::service_provider::list,
        crate::api::service_provider::get,
        crate::api::service_provider::delete,
        crate::api::service_provider::search,
    ),
    components(
        schemas(
            crate::api::PaginationMeta,
            crate::domain::Credential,
            crate::domain::CredentialPatch,
            crate::domain::IdentityProvider,
            crate::domain::IdentityProviderPatch,
            crate::domain::ServiceProvider,
            crate::domain::ServiceProviderPatch,
        )
    ),
)]
pub struct ApiDoc;

impl ApiDoc {
    pub fn build() -> utoipa::openapi::OpenApi {
        Self::openapi()
    }
}
