//! Paging and ordering types shared by the stores

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Ordering requested by the caller, e.g. `username,desc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Reject fields outside the entity's sortable column list
    pub fn ensure_allowed(&self, allowed: &[&str]) -> Result<()> {
        if allowed.contains(&self.field.as_str()) {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "Cannot sort by '{}'",
                self.field
            )))
        }
    }
}

impl std::str::FromStr for Sort {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let field = parts.next().unwrap_or_default();
        if field.is_empty() {
            return Err(AppError::BadRequest("Sort field is empty".to_string()));
        }
        let direction = match parts.next() {
            None | Some("") => SortDirection::Asc,
            Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(d) => {
                return Err(AppError::BadRequest(format!(
                    "Unknown sort direction '{}'",
                    d
                )))
            }
        };
        if parts.next().is_some() {
            return Err(AppError::BadRequest(format!("Malformed sort '{}'", s)));
        }
        Ok(Sort::new(field, direction))
    }
}

/// Page request (1-based page number)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
    pub sort: Option<Sort>,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Build an `ORDER BY` clause over a whitelisted column set, always
    /// ending with the primary key so paging is stable.
    pub fn order_by(&self, alias: &str, allowed: &[&str]) -> Result<String> {
        match &self.sort {
            Some(sort) => {
                sort.ensure_allowed(allowed)?;
                if sort.field == "id" {
                    Ok(format!("{alias}.id {}", sort.direction.as_sql()))
                } else {
                    Ok(format!(
                        "{alias}.{} {}, {alias}.id ASC",
                        sort.field,
                        sort.direction.as_sql()
                    ))
                }
            }
            None => Ok(format!("{alias}.id ASC")),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total: i64) -> Self {
        Self {
            content,
            page: request.page,
            per_page: request.per_page,
            total,
        }
    }

    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
