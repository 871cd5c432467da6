//! Identity provider API handlers

use crate::api::{
    check_update_id, created_headers, entity_alert_headers, not_found, total_count_headers,
    ListQuery, PaginatedResponse, SearchQuery, SuccessResponse,
};
use crate::domain::{IdentityProvider, IdentityProviderPatch};
use crate::error::{AppError, Result};
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

const ENTITY: &str = IdentityProvider::ENTITY_NAME;

#[utoipa::path(
    post,
    path = "/api/identity-providers",
    tag = "IdentityProviders",
    request_body = IdentityProvider,
    responses(
        (status = 201, description = "Identity provider created"),
        (status = 400, description = "Request carried an id (idexists)")
    )
)]
pub async fn create<S: HasServices>(
    State(state): State<S>,
    Json(identity_provider): Json<IdentityProvider>,
) -> Result<impl IntoResponse> {
    if identity_provider.id.is_some() {
        return Err(AppError::bad_request_alert(
            "A new identityProvider cannot already have an ID",
            ENTITY,
            "idexists",
        ));
    }

    identity_provider.validate()?;
    let saved = state.identity_provider_service().save(identity_provider).await?;
    let id = saved.id.unwrap_or_default();
    let headers = created_headers(
        &state.config().app_name,
        ENTITY,
        &format!("/api/identity-providers/{}", id),
        id,
    );
    Ok((StatusCode::CREATED, headers, Json(SuccessResponse::new(saved))))
}

#[utoipa::path(
    put,
    path = "/api/identity-providers/{id}",
    tag = "IdentityProviders",
    request_body = IdentityProvider,
    params(
        ("id" = i64, Path, description = "Identity provider ID")
    ),
    responses(
        (status = 200, description = "Identity provider replaced"),
        (status = 400, description = "Missing or mismatched id"),
        (status = 404, description = "Identity provider not found")
    )
)]
pub async fn update<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
    Json(identity_provider): Json<IdentityProvider>,
) -> Result<impl IntoResponse> {
    check_update_id(id, identity_provider.id, ENTITY)?;
    identity_provider.validate()?;
    if !state.identity_provider_service().exists(id).await? {
        return Err(not_found(ENTITY, id));
    }

    let saved = state.identity_provider_service().save(identity_provider).await?;
    let headers =
        entity_alert_headers(&state.config().app_name, ENTITY, "updated", &id.to_string());
    Ok((headers, Json(SuccessResponse::new(saved))))
}

#[utoipa::path(
    patch,
    path = "/api/identity-providers/{id}",
    tag = "IdentityProviders",
    request_body(content = IdentityProviderPatch, content_type = "application/merge-patch+json"),
    params(
        ("id" = i64, Path, description = "Identity provider ID")
    ),
    responses(
        (status = 200, description = "Supplied fields updated"),
        (status = 400, description = "Missing or mismatched id"),
        (status = 404, description = "Identity provider not found")
    )
)]
pub async fn partial_update<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
    Json(patch): Json<IdentityProviderPatch>,
) -> Result<impl IntoResponse> {
    check_update_id(id, patch.id, ENTITY)?;
    patch.validate()?;
    if !state.identity_provider_service().exists(id).await? {
        return Err(not_found(ENTITY, id));
    }

    let saved = state
        .identity_provider_service()
        .partial_update(patch)
        .await?
        .ok_or_else(|| not_found(ENTITY, id))?;
    let headers =
        entity_alert_headers(&state.config().app_name, ENTITY, "updated", &id.to_string());
    Ok((headers, Json(SuccessResponse::new(saved))))
}

#[utoipa::path(
    get,
    path = "/api/identity-providers",
    tag = "IdentityProviders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("per_page" = Option<i64>, Query, description = "Page size, at most 100"),
        ("sort" = Option<String>, Query, description = "field[,asc|desc]")
    ),
    responses(
        (status = 200, description = "Page of identity providers")
    )
)]
pub async fn list<S: HasServices>(
    State(state): State<S>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let request = query.page_request(IdentityProvider::SORTABLE_FIELDS)?;
    let page = state.identity_provider_service().find_all(&request).await?;

    Ok((
        total_count_headers(page.total),
        Json(PaginatedResponse::from(page)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/identity-providers/{id}",
    tag = "IdentityProviders",
    params(
        ("id" = i64, Path, description = "Identity provider ID")
    ),
    responses(
        (status = 200, description = "Identity provider"),
        (status = 404, description = "Identity provider not found")
    )
)]
pub async fn get<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let identity_provider = state
        .identity_provider_service()
        .find_one(id)
        .await?
        .ok_or_else(|| not_found(ENTITY, id))?;
    Ok(Json(SuccessResponse::new(identity_provider)))
}

#[utoipa::path(
    delete,
    path = "/api/identity-providers/{id}",
    tag = "IdentityProviders",
    params(
        ("id" = i64, Path, description = "Identity provider ID")
    ),
    responses(
        (status = 204, description = "Identity provider deleted")
    )
)]
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.identity_provider_service().delete(id).await?;
    let headers =
        entity_alert_headers(&state.config().app_name, ENTITY, "deleted", &id.to_string());
    Ok((StatusCode::NO_CONTENT, headers))
}

#[utoipa::path(
    get,
    path = "/api/_search/identity-providers",
    tag = "IdentityProviders",
    params(
        ("query" = String, Query, description = "Query string forwarded to the search index"),
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("per_page" = Option<i64>, Query, description = "Page size, at most 100"),
        ("sort" = Option<String>, Query, description = "field[,asc|desc]")
    ),
    responses(
        (status = 200, description = "Matching identity providers"),
        (status = 502, description = "Search index unavailable")
    )
)]
pub async fn search<S: HasServices>(
    State(state): State<S>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let request = query.page_request(IdentityProvider::SORTABLE_FIELDS)?;
    let page = state
        .identity_provider_service()
        .search(&query.query, &request)
        .await?;

    Ok((
        total_count_headers(page.total),
        Json(PaginatedResponse::from(page)),
    ))
}
