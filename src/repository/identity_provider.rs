//! Identity provider repository

use super::map_constraint_violation;
use crate::domain::{IdentityProvider, Page, PageRequest};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};

#[derive(Debug, Clone, FromRow)]
struct IdentityProviderRow {
    id: i64,
    name: Option<String>,
}

impl From<IdentityProviderRow> for IdentityProvider {
    fn from(row: IdentityProviderRow) -> Self {
        IdentityProvider {
            id: Some(row.id),
            name: row.name,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProviderRepository: Send + Sync {
    /// Insert when `id` is `None`, otherwise overwrite the stored row
    async fn save(&self, identity_provider: &IdentityProvider) -> Result<IdentityProvider>;
    async fn find_by_id(&self, id: i64) -> Result<Option<IdentityProvider>>;
    async fn exists_by_id(&self, id: i64) -> Result<bool>;
    async fn find_all(&self, page: &PageRequest) -> Result<Page<IdentityProvider>>;
    async fn delete_by_id(&self, id: i64) -> Result<()>;
}

pub struct IdentityProviderRepositoryImpl {
    pool: MySqlPool,
}

impl IdentityProviderRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProviderRepository for IdentityProviderRepositoryImpl {
    async fn save(&self, identity_provider: &IdentityProvider) -> Result<IdentityProvider> {
        let id = match identity_provider.id {
            None => {
                let result = sqlx::query("INSERT INTO identity_providers (name) VALUES (?)")
                    .bind(&identity_provider.name)
                    .execute(&self.pool)
                    .await?;
                result.last_insert_id() as i64
            }
            Some(id) => {
                sqlx::query("UPDATE identity_providers SET name = ? WHERE id = ?")
                    .bind(&identity_provider.name)
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| map_constraint_violation(e, "IdentityProvider"))?;
                id
            }
        };

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("IdentityProvider {} not found", id)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<IdentityProvider>> {
        let row = sqlx::query_as::<_, IdentityProviderRow>(
            "SELECT id, name FROM identity_providers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM identity_providers WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<IdentityProvider>> {
        let order_by = page.order_by("ip", IdentityProvider::SORTABLE_FIELDS)?;
        let rows = sqlx::query_as::<_, IdentityProviderRow>(&format!(
            "SELECT ip.id, ip.name FROM identity_providers ip ORDER BY {} LIMIT ? OFFSET ?",
            order_by
        ))
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM identity_providers")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        // credentials.identity_provider_id is ON DELETE SET NULL
        sqlx::query("DELETE FROM identity_providers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
