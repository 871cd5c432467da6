//! Service provider repository

use super::map_constraint_violation;
use crate::domain::{Credential, Page, PageRequest, RelationshipGraph, ServiceProvider};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};

#[derive(Debug, Clone, FromRow)]
struct ServiceProviderRow {
    id: i64,
    name: Option<String>,
    credential_id: Option<i64>,
}

impl From<ServiceProviderRow> for ServiceProvider {
    fn from(row: ServiceProviderRow) -> Self {
        ServiceProvider {
            id: Some(row.id),
            name: row.name,
            credential: row.credential_id.map(|id| Box::new(Credential::with_id(id))),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct ServiceProviderJoinRow {
    #[sqlx(flatten)]
    service_provider: ServiceProviderRow,
    credential_profile: Option<String>,
    credential_enabled: Option<bool>,
    credential_username: Option<String>,
    credential_password: Option<String>,
}

fn assemble_service_providers(rows: Vec<ServiceProviderJoinRow>) -> Vec<ServiceProvider> {
    let mut graph = RelationshipGraph::new();

    for row in rows {
        let sp_id = row.service_provider.id;
        let credential_id = row.service_provider.credential_id;
        graph.insert_service_provider(&row.service_provider.into());

        if let Some(credential_id) = credential_id {
            if !graph.contains_credential(credential_id) {
                graph.insert_credential(&Credential {
                    id: Some(credential_id),
                    profile: row.credential_profile,
                    enabled: row.credential_enabled,
                    username: row.credential_username,
                    password: row.credential_password,
                    ..Default::default()
                });
            }
            graph.set_credential(sp_id, Some(credential_id));
        }
    }

    graph.service_providers()
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceProviderRepository: Send + Sync {
    /// Insert when `id` is `None`, otherwise overwrite the stored row,
    /// including the owning credential reference
    async fn save(&self, service_provider: &ServiceProvider) -> Result<ServiceProvider>;
    async fn find_by_id(&self, id: i64) -> Result<Option<ServiceProvider>>;
    async fn exists_by_id(&self, id: i64) -> Result<bool>;
    async fn find_all(&self, page: &PageRequest) -> Result<Page<ServiceProvider>>;
    async fn find_all_with_eager_relationships(
        &self,
        page: &PageRequest,
    ) -> Result<Page<ServiceProvider>>;
    async fn find_one_with_eager_relationships(&self, id: i64)
        -> Result<Option<ServiceProvider>>;
    async fn delete_by_id(&self, id: i64) -> Result<()>;
}

pub struct ServiceProviderRepositoryImpl {
    pool: MySqlPool,
}

impl ServiceProviderRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM service_providers")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

#[async_trait]
impl ServiceProviderRepository for ServiceProviderRepositoryImpl {
    async fn save(&self, service_provider: &ServiceProvider) -> Result<ServiceProvider> {
        let id = match service_provider.id {
            None => {
                let result = sqlx::query(
                    "INSERT INTO service_providers (name, credential_id) VALUES (?, ?)",
                )
                .bind(&service_provider.name)
                .bind(service_provider.credential_id())
                .execute(&self.pool)
                .await
                .map_err(|e| map_constraint_violation(e, "ServiceProvider"))?;
                result.last_insert_id() as i64
            }
            Some(id) => {
                sqlx::query("UPDATE service_providers SET name = ?, credential_id = ? WHERE id = ?")
                    .bind(&service_provider.name)
                    .bind(service_provider.credential_id())
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| map_constraint_violation(e, "ServiceProvider"))?;
                id
            }
        };

        self.find_one_with_eager_relationships(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("ServiceProvider {} not found", id)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ServiceProvider>> {
        let row = sqlx::query_as::<_, ServiceProviderRow>(
            "SELECT id, name, credential_id FROM service_providers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM service_providers WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<ServiceProvider>> {
        let order_by = page.order_by("sp", ServiceProvider::SORTABLE_FIELDS)?;
        let rows = sqlx::query_as::<_, ServiceProviderRow>(&format!(
            r#"
            SELECT sp.id, sp.name, sp.credential_id
            FROM service_providers sp
            ORDER BY {}
            LIMIT ? OFFSET ?
            "#,
            order_by
        ))
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;
        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }

    async fn find_all_with_eager_relationships(
        &self,
        page: &PageRequest,
    ) -> Result<Page<ServiceProvider>> {
        let order_by = page.order_by("sp", ServiceProvider::SORTABLE_FIELDS)?;
        let rows = sqlx::query_as::<_, ServiceProviderJoinRow>(&format!(
            r#"
            SELECT sp.id, sp.name, sp.credential_id,
                   c.profile AS credential_profile, c.enabled AS credential_enabled,
                   c.username AS credential_username, c.password AS credential_password
            FROM service_providers sp
            LEFT JOIN credentials c ON c.id = sp.credential_id
            ORDER BY {}
            LIMIT ? OFFSET ?
            "#,
            order_by
        ))
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;
        Ok(Page::new(assemble_service_providers(rows), page, total))
    }

    async fn find_one_with_eager_relationships(
        &self,
        id: i64,
    ) -> Result<Option<ServiceProvider>> {
        let rows = sqlx::query_as::<_, ServiceProviderJoinRow>(
            r#"
            SELECT sp.id, sp.name, sp.credential_id,
                   c.profile AS credential_profile, c.enabled AS credential_enabled,
                   c.username AS credential_username, c.password AS credential_password
            FROM service_providers sp
            LEFT JOIN credentials c ON c.id = sp.credential_id
            WHERE sp.id = ?
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble_service_providers(rows).into_iter().next())
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM service_providers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
