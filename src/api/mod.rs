//! REST API shared utilities (response types, pagination, alert headers)

pub mod credential;
pub mod health;
pub mod identity_provider;
pub mod metrics;
pub mod service_provider;

use crate::domain::{Page, PageRequest, Sort};
use crate::error::{AppError, Result};
use axum::http::{header::LOCATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum allowed per_page value for pagination
pub(crate) const MAX_PER_PAGE: i64 = 100;

/// Elasticsearch `index.max_result_window` default; `from + size` may not exceed it
pub(crate) const MAX_SEARCH_WINDOW: i64 = 10_000;

/// Header carrying the total row count on list and search responses
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// List query parameters
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page", deserialize_with = "deserialize_page")]
    pub page: i64,
    #[serde(
        default = "default_per_page",
        deserialize_with = "deserialize_per_page",
        alias = "size"
    )]
    pub per_page: i64,
    /// `field` or `field,asc|desc`
    pub sort: Option<String>,
    /// Load relationships along with the listed entities
    #[serde(default)]
    pub eagerload: bool,
}

impl ListQuery {
    pub fn page_request(&self, sortable: &[&str]) -> Result<PageRequest> {
        page_request(self.page, self.per_page, self.sort.as_deref(), sortable)
    }
}

/// Search query parameters
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "default_page", deserialize_with = "deserialize_page")]
    pub page: i64,
    #[serde(
        default = "default_per_page",
        deserialize_with = "deserialize_per_page",
        alias = "size"
    )]
    pub per_page: i64,
    pub sort: Option<String>,
}

impl SearchQuery {
    pub fn page_request(&self, sortable: &[&str]) -> Result<PageRequest> {
        if self.query.trim().is_empty() {
            return Err(AppError::BadRequest("query must not be empty".to_string()));
        }
        let request = page_request(self.page, self.per_page, self.sort.as_deref(), sortable)?;
        if request.offset() + request.per_page > MAX_SEARCH_WINDOW {
            return Err(AppError::BadRequest(format!(
                "search results are limited to the first {} hits",
                MAX_SEARCH_WINDOW
            )));
        }
        Ok(request)
    }
}

fn page_request(
    page: i64,
    per_page: i64,
    sort: Option<&str>,
    sortable: &[&str],
) -> Result<PageRequest> {
    if (page - 1)
        .checked_mul(per_page)
        .and_then(|offset| offset.checked_add(per_page))
        .is_none()
    {
        return Err(AppError::BadRequest(format!("page {} is out of range", page)));
    }
    let request = PageRequest::new(page, per_page);
    match sort {
        Some(raw) => {
            let sort: Sort = raw.parse()?;
            sort.ensure_allowed(sortable)?;
            Ok(request.with_sort(sort))
        }
        None => Ok(request),
    }
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_per_page() -> i64 {
    20
}

/// Reject page values less than 1
pub(crate) fn deserialize_page<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    if value < 1 {
        return Err(serde::de::Error::custom(
            "page must be a positive integer (>= 1)",
        ));
    }
    Ok(value)
}

/// Reject per_page values less than 1, clamp to MAX_PER_PAGE
pub(crate) fn deserialize_per_page<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    if value < 1 {
        return Err(serde::de::Error::custom(
            "per_page must be a positive integer (>= 1)",
        ));
    }
    Ok(value.min(MAX_PER_PAGE))
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = (total as f64 / per_page as f64).ceil() as i64;
        Self {
            data,
            pagination: PaginationMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }
}

impl<T: Serialize> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self::new(page.content, page.page, page.per_page, page.total)
    }
}

/// Success response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Entity mutation notification headers, e.g.
/// `x-credhub-alert: credhub.credential.created` and `x-credhub-params: 7`
pub fn entity_alert_headers(app_name: &str, entity: &str, action: &str, param: &str) -> HeaderMap {
    let prefix = app_name.to_ascii_lowercase();
    let mut headers = HeaderMap::new();
    insert_header(
        &mut headers,
        format!("x-{}-alert", prefix),
        format!("{}.{}.{}", app_name, entity, action),
    );
    insert_header(&mut headers, format!("x-{}-params", prefix), param.to_string());
    headers
}

/// Alert headers plus `Location` for a newly created entity
pub fn created_headers(app_name: &str, entity: &str, location: &str, id: i64) -> HeaderMap {
    let mut headers = entity_alert_headers(app_name, entity, "created", &id.to_string());
    insert_header(&mut headers, LOCATION.as_str().to_string(), location.to_string());
    headers
}

pub fn total_count_headers(total: i64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(total));
    headers
}

// Names come from configuration; invalid ones are skipped
fn insert_header(headers: &mut HeaderMap, name: String, value: String) {
    if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
        headers.insert(name, value);
    }
}

/// Validate the body id of an update against the path id
pub(crate) fn check_update_id(path_id: i64, body_id: Option<i64>, entity: &str) -> Result<()> {
    match body_id {
        None => Err(AppError::bad_request_alert("Invalid id", entity, "idnull")),
        Some(id) if id != path_id => {
            Err(AppError::bad_request_alert("Invalid ID", entity, "idinvalid"))
        }
        Some(_) => Ok(()),
    }
}

pub(crate) fn not_found(entity: &str, id: i64) -> AppError {
    AppError::NotFound(format!("{} {} not found (idnotfound)", entity, id))
}
