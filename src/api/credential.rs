//! Credential API handlers

use crate::api::{
    check_update_id, created_headers, entity_alert_headers, not_found, total_count_headers,
    ListQuery, PaginatedResponse, SearchQuery, SuccessResponse,
};
use crate::domain::{Credential, CredentialPatch};
use crate::error::{AppError, Result};
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

const ENTITY: &str = Credential::ENTITY_NAME;

#[utoipa::path(
    post,
    path = "/api/credentials",
    tag = "Credentials",
    request_body = Credential,
    responses(
        (status = 201, description = "Credential created"),
        (status = 400, description = "Request carried an id (idexists)"),
        (status = 409, description = "Identity provider already bound to another credential")
    )
)]
pub async fn create<S: HasServices>(
    State(state): State<S>,
    Json(credential): Json<Credential>,
) -> Result<impl IntoResponse> {
    if credential.id.is_some() {
        return Err(AppError::bad_request_alert(
            "A new credential cannot already have an ID",
            ENTITY,
            "idexists",
        ));
    }

    credential.validate()?;
    let saved = state.credential_service().save(credential).await?;
    let id = saved.id.unwrap_or_default();
    let headers = created_headers(
        &state.config().app_name,
        ENTITY,
        &format!("/api/credentials/{}", id),
        id,
    );
    Ok((StatusCode::CREATED, headers, Json(SuccessResponse::new(saved))))
}

#[utoipa::path(
    put,
    path = "/api/credentials/{id}",
    tag = "Credentials",
    request_body = Credential,
    params(
        ("id" = i64, Path, description = "Credential ID")
    ),
    responses(
        (status = 200, description = "Credential replaced"),
        (status = 400, description = "Missing or mismatched id"),
        (status = 404, description = "Credential not found")
    )
)]
pub async fn update<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
    Json(credential): Json<Credential>,
) -> Result<impl IntoResponse> {
    check_update_id(id, credential.id, ENTITY)?;
    credential.validate()?;
    if !state.credential_service().exists(id).await? {
        return Err(not_found(ENTITY, id));
    }

    let saved = state.credential_service().save(credential).await?;
    let headers =
        entity_alert_headers(&state.config().app_name, ENTITY, "updated", &id.to_string());
    Ok((headers, Json(SuccessResponse::new(saved))))
}

#[utoipa::path(
    patch,
    path = "/api/credentials/{id}",
    tag = "Credentials",
    request_body(content = CredentialPatch, content_type = "application/merge-patch+json"),
    params(
        ("id" = i64, Path, description = "Credential ID")
    ),
    responses(
        (status = 200, description = "Supplied fields updated"),
        (status = 400, description = "Missing or mismatched id"),
        (status = 404, description = "Credential not found")
    )
)]
pub async fn partial_update<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
    Json(patch): Json<CredentialPatch>,
) -> Result<impl IntoResponse> {
    check_update_id(id, patch.id, ENTITY)?;
    patch.validate()?;
    if !state.credential_service().exists(id).await? {
        return Err(not_found(ENTITY, id));
    }

    let saved = state
        .credential_service()
        .partial_update(patch)
        .await?
        .ok_or_else(|| not_found(ENTITY, id))?;
    let headers =
        entity_alert_headers(&state.config().app_name, ENTITY, "updated", &id.to_string());
    Ok((headers, Json(SuccessResponse::new(saved))))
}

#[utoipa::path(
    get,
    path = "/api/credentials",
    tag = "Credentials",
    params(
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("per_page" = Option<i64>, Query, description = "Page size, at most 100"),
        ("sort" = Option<String>, Query, description = "field[,asc|desc]"),
        ("eagerload" = Option<bool>, Query, description = "Include service providers")
    ),
    responses(
        (status = 200, description = "Page of credentials")
    )
)]
pub async fn list<S: HasServices>(
    State(state): State<S>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let request = query.page_request(Credential::SORTABLE_FIELDS)?;
    let page = if query.eagerload {
        state
            .credential_service()
            .find_all_with_eager_relationships(&request)
            .await?
    } else {
        state.credential_service().find_all(&request).await?
    };

    Ok((
        total_count_headers(page.total),
        Json(PaginatedResponse::from(page)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/credentials/{id}",
    tag = "Credentials",
    params(
        ("id" = i64, Path, description = "Credential ID")
    ),
    responses(
        (status = 200, description = "Credential with its identity and service providers"),
        (status = 404, description = "Credential not found")
    )
)]
pub async fn get<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let credential = state
        .credential_service()
        .find_one(id)
        .await?
        .ok_or_else(|| not_found(ENTITY, id))?;
    Ok(Json(SuccessResponse::new(credential)))
}

#[utoipa::path(
    delete,
    path = "/api/credentials/{id}",
    tag = "Credentials",
    params(
        ("id" = i64, Path, description = "Credential ID")
    ),
    responses(
        (status = 204, description = "Credential deleted")
    )
)]
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.credential_service().delete(id).await?;
    let headers =
        entity_alert_headers(&state.config().app_name, ENTITY, "deleted", &id.to_string());
    Ok((StatusCode::NO_CONTENT, headers))
}

#[utoipa::path(
    get,
    path = "/api/_search/credentials",
    tag = "Credentials",
    params(
        ("query" = String, Query, description = "Query string forwarded to the search index"),
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("per_page" = Option<i64>, Query, description = "Page size, at most 100"),
        ("sort" = Option<String>, Query, description = "field[,asc|desc]")
    ),
    responses(
        (status = 200, description = "Matching credentials"),
        (status = 502, description = "Search index unavailable")
    )
)]
pub async fn search<S: HasServices>(
    State(state): State<S>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let request = query.page_request(Credential::SORTABLE_FIELDS)?;
    let page = state
        .credential_service()
        .search(&query.query, &request)
        .await?;

    Ok((
        total_count_headers(page.total),
        Json(PaginatedResponse::from(page)),
    ))
}
