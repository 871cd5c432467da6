//! Service provider API handlers

use crate::api::{
    check_update_id, created_headers, entity_alert_headers, not_found, total_count_headers,
    ListQuery, PaginatedResponse, SearchQuery, SuccessResponse,
};
use crate::domain::{ServiceProvider, ServiceProviderPatch};
use crate::error::{AppError, Result};
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

const ENTITY: &str = ServiceProvider::ENTITY_NAME;

#[utoipa::path(
    post,
    path = "/api/service-providers",
    tag = "ServiceProviders",
    request_body = ServiceProvider,
    responses(
        (status = 201, description = "Service provider created"),
        (status = 400, description = "Request carried an id (idexists) or references an unknown credential")
    )
)]
pub async fn create<S: HasServices>(
    State(state): State<S>,
    Json(service_provider): Json<ServiceProvider>,
) -> Result<impl IntoResponse> {
    if service_provider.id.is_some() {
        return Err(AppError::bad_request_alert(
            "A new serviceProvider cannot already have an ID",
            ENTITY,
            "idexists",
        ));
    }

    service_provider.validate()?;
    let saved = state.service_provider_service().save(service_provider).await?;
    let id = saved.id.unwrap_or_default();
    let headers = created_headers(
        &state.config().app_name,
        ENTITY,
        &format!("/api/service-providers/{}", id),
        id,
    );
    Ok((StatusCode::CREATED, headers, Json(SuccessResponse::new(saved))))
}

#[utoipa::path(
    put,
    path = "/api/service-providers/{id}",
    tag = "ServiceProviders",
    request_body = ServiceProvider,
    params(
        ("id" = i64, Path, description = "Service provider ID")
    ),
    responses(
        (status = 200, description = "Service provider replaced"),
        (status = 400, description = "Missing or mismatched id"),
        (status = 404, description = "Service provider not found")
    )
)]
pub async fn update<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
    Json(service_provider): Json<ServiceProvider>,
) -> Result<impl IntoResponse> {
    check_update_id(id, service_provider.id, ENTITY)?;
    service_provider.validate()?;
    if !state.service_provider_service().exists(id).await? {
        return Err(not_found(ENTITY, id));
    }

    let saved = state.service_provider_service().save(service_provider).await?;
    let headers =
        entity_alert_headers(&state.config().app_name, ENTITY, "updated", &id.to_string());
    Ok((headers, Json(SuccessResponse::new(saved))))
}

#[utoipa::path(
    patch,
    path = "/api/service-providers/{id}",
    tag = "ServiceProviders",
    request_body(content = ServiceProviderPatch, content_type = "application/merge-patch+json"),
    params(
        ("id" = i64, Path, description = "Service provider ID")
    ),
    responses(
        (status = 200, description = "Supplied fields updated"),
        (status = 400, description = "Missing or mismatched id"),
        (status = 404, description = "Service provider not found")
    )
)]
pub async fn partial_update<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
    Json(patch): Json<ServiceProviderPatch>,
) -> Result<impl IntoResponse> {
    check_update_id(id, patch.id, ENTITY)?;
    patch.validate()?;
    if !state.service_provider_service().exists(id).await? {
        return Err(not_found(ENTITY, id));
    }

    let saved = state
        .service_provider_service()
        .partial_update(patch)
        .await?
        .ok_or_else(|| not_found(ENTITY, id))?;
    let headers =
        entity_alert_headers(&state.config().app_name, ENTITY, "updated", &id.to_string());
    Ok((headers, Json(SuccessResponse::new(saved))))
}

#[utoipa::path(
    get,
    path = "/api/service-providers",
    tag = "ServiceProviders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("per_page" = Option<i64>, Query, description = "Page size, at most 100"),
        ("sort" = Option<String>, Query, description = "field[,asc|desc]"),
        ("eagerload" = Option<bool>, Query, description = "Include the owning credential")
    ),
    responses(
        (status = 200, description = "Page of service providers")
    )
)]
pub async fn list<S: HasServices>(
    State(state): State<S>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let request = query.page_request(ServiceProvider::SORTABLE_FIELDS)?;
    let page = if query.eagerload {
        state
            .service_provider_service()
            .find_all_with_eager_relationships(&request)
            .await?
    } else {
        state.service_provider_service().find_all(&request).await?
    };

    Ok((
        total_count_headers(page.total),
        Json(PaginatedResponse::from(page)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/service-providers/{id}",
    tag = "ServiceProviders",
    params(
        ("id" = i64, Path, description = "Service provider ID")
    ),
    responses(
        (status = 200, description = "Service provider with its owning credential"),
        (status = 404, description = "Service provider not found")
    )
)]
pub async fn get<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let service_provider = state
        .service_provider_service()
        .find_one(id)
        .await?
        .ok_or_else(|| not_found(ENTITY, id))?;
    Ok(Json(SuccessResponse::new(service_provider)))
}

#[utoipa::path(
    delete,
    path = "/api/service-providers/{id}",
    tag = "ServiceProviders",
    params(
        ("id" = i64, Path, description = "Service provider ID")
    ),
    responses(
        (status = 204, description = "Service provider deleted")
    )
)]
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.service_provider_service().delete(id).await?;
    let headers =
        entity_alert_headers(&state.config().app_name, ENTITY, "deleted", &id.to_string());
    Ok((StatusCode::NO_CONTENT, headers))
}

#[utoipa::path(
    get,
    path = "/api/_search/service-providers",
    tag = "ServiceProviders",
    params(
        ("query" = String, Query, description = "Query string forwarded to the search index"),
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("per_page" = Option<i64>, Query, description = "Page size, at most 100"),
        ("sort" = Option<String>, Query, description = "field[,asc|desc]")
    ),
    responses(
        (status = 200, description = "Matching service providers"),
        (status = 502, description = "Search index unavailable")
    )
)]
pub async fn search<S: HasServices>(
    State(state): State<S>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let request = query.page_request(ServiceProvider::SORTABLE_FIELDS)?;
    let page = state
        .service_provider_service()
        .search(&query.query, &request)
        .await?;

    Ok((
        total_count_headers(page.total),
        Json(PaginatedResponse::from(page)),
    ))
}
