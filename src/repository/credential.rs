//! Credential repository

use super::map_constraint_violation;
use crate::domain::{
    Credential, IdentityProvider, LinkChange, Page, PageRequest, RelationshipGraph,
    ServiceProvider,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};
use std::collections::BTreeMap;

const CREDENTIAL_COLUMNS: &str = r#"
    c.id, c.profile, c.enabled, c.username, c.password,
    c.identity_provider_id, ip.name AS identity_provider_name
"#;

#[derive(Debug, Clone, FromRow)]
struct CredentialRow {
    id: i64,
    profile: Option<String>,
    enabled: Option<bool>,
    username: Option<String>,
    password: Option<String>,
    identity_provider_id: Option<i64>,
    identity_provider_name: Option<String>,
}

impl From<CredentialRow> for Credential {
    fn from(row: CredentialRow) -> Self {
        Credential {
            id: Some(row.id),
            profile: row.profile,
            enabled: row.enabled,
            username: row.username,
            password: row.password,
            identity_provider: row.identity_provider_id.map(|id| IdentityProvider {
                id: Some(id),
                name: row.identity_provider_name,
            }),
            service_providers: None,
        }
    }
}

/// One credential x service provider row of the eager join
#[derive(Debug, Clone, FromRow)]
struct CredentialJoinRow {
    #[sqlx(flatten)]
    credential: CredentialRow,
    service_provider_id: Option<i64>,
    service_provider_name: Option<String>,
}

/// Fold join rows into distinct credentials, keeping first-seen order
fn assemble_credentials(rows: Vec<CredentialJoinRow>) -> Vec<Credential> {
    let mut graph = RelationshipGraph::new();
    let mut identity_providers = BTreeMap::new();

    for row in rows {
        let credential_id = row.credential.id;
        let credential: Credential = row.credential.into();
        if let Some(ip) = &credential.identity_provider {
            identity_providers.insert(credential_id, ip.clone());
        }
        graph.insert_credential(&credential);

        if let Some(sp_id) = row.service_provider_id {
            graph.insert_service_provider(&ServiceProvider {
                id: Some(sp_id),
                name: row.service_provider_name,
                credential: None,
            });
            graph.add_service_provider(credential_id, sp_id);
        }
    }

    graph
        .credentials()
        .into_iter()
        .map(|mut credential| {
            credential.identity_provider = credential
                .id
                .and_then(|id| identity_providers.remove(&id));
            credential
        })
        .collect()
}

/// Diff between the persisted links of a credential and the requested set
fn link_change(credential_id: i64, current: Vec<i64>, requested: Vec<i64>) -> LinkChange {
    let mut graph = RelationshipGraph::new();
    graph.set_service_providers(credential_id, current);
    graph.set_service_providers(credential_id, requested)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Insert when `id` is `None`, otherwise overwrite the stored row.
    /// A loaded `service_providers` set replaces the persisted links in the
    /// same transaction.
    async fn save(&self, credential: &Credential) -> Result<Credential>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Credential>>;
    async fn exists_by_id(&self, id: i64) -> Result<bool>;
    async fn find_all(&self, page: &PageRequest) -> Result<Page<Credential>>;
    async fn find_all_with_eager_relationships(
        &self,
        page: &PageRequest,
    ) -> Result<Page<Credential>>;
    async fn find_one_with_eager_relationships(&self, id: i64) -> Result<Option<Credential>>;
    async fn delete_by_id(&self, id: i64) -> Result<()>;
}

pub struct CredentialRepositoryImpl {
    pool: MySqlPool,
}

impl CredentialRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credentials")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

#[async_trait]
impl CredentialRepository for CredentialRepositoryImpl {
    async fn save(&self, credential: &Credential) -> Result<Credential> {
        let identity_provider_id = credential.identity_provider.as_ref().and_then(|ip| ip.id);
        let mut tx = self.pool.begin().await?;

        let id = match credential.id {
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO credentials (profile, enabled, username, password, identity_provider_id)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&credential.profile)
                .bind(credential.enabled)
                .bind(&credential.username)
                .bind(&credential.password)
                .bind(identity_provider_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_constraint_violation(e, "Credential"))?;
                result.last_insert_id() as i64
            }
            Some(id) => {
                let found: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM credentials WHERE id = ? FOR UPDATE")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;
                if found == 0 {
                    return Err(AppError::NotFound(format!("Credential {} not found", id)));
                }

                sqlx::query(
                    r#"
                    UPDATE credentials
                    SET profile = ?, enabled = ?, username = ?, password = ?, identity_provider_id = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&credential.profile)
                .bind(credential.enabled)
                .bind(&credential.username)
                .bind(&credential.password)
                .bind(identity_provider_id)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_constraint_violation(e, "Credential"))?;
                id
            }
        };

        if let Some(requested) = credential.service_provider_ids() {
            let current: Vec<i64> = sqlx::query_scalar(
                "SELECT id FROM service_providers WHERE credential_id = ? FOR UPDATE",
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

            let change = link_change(id, current, requested);
            for sp_id in &change.unlinked {
                sqlx::query(
                    "UPDATE service_providers SET credential_id = NULL WHERE id = ? AND credential_id = ?",
                )
                .bind(sp_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            }
            for sp_id in &change.linked {
                let result =
                    sqlx::query("UPDATE service_providers SET credential_id = ? WHERE id = ?")
                        .bind(id)
                        .bind(sp_id)
                        .execute(&mut *tx)
                        .await?;
                if result.rows_affected() == 0 {
                    return Err(AppError::BadRequest(format!(
                        "ServiceProvider {} does not exist",
                        sp_id
                    )));
                }
            }
            if !change.is_empty() {
                tracing::debug!(
                    credential_id = id,
                    unlinked = ?change.unlinked,
                    linked = ?change.linked,
                    "Relinked service providers"
                );
            }
        }

        tx.commit().await?;

        let saved = if credential.service_providers.is_some() {
            self.find_one_with_eager_relationships(id).await?
        } else {
            self.find_by_id(id).await?
        };
        saved.ok_or_else(|| AppError::NotFound(format!("Credential {} not found", id)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            r#"
            SELECT {}
            FROM credentials c
            LEFT JOIN identity_providers ip ON ip.id = c.identity_provider_id
            WHERE c.id = ?
            "#,
            CREDENTIAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credentials WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Credential>> {
        let order_by = page.order_by("c", Credential::SORTABLE_FIELDS)?;
        let rows = sqlx::query_as::<_, CredentialRow>(&format!(
            r#"
            SELECT {}
            FROM credentials c
            LEFT JOIN identity_providers ip ON ip.id = c.identity_provider_id
            ORDER BY {}
            LIMIT ? OFFSET ?
            "#,
            CREDENTIAL_COLUMNS, order_by
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
    ) -> Result<Page<Credential>> {
        // Page over the roots first so LIMIT never cuts a credential's
        // service providers in half.
        let order_by = page.order_by("c", Credential::SORTABLE_FIELDS)?;
        let rows = sqlx::query_as::<_, CredentialJoinRow>(&format!(
            r#"
            SELECT {columns},
                   sp.id AS service_provider_id, sp.name AS service_provider_name
            FROM (
                SELECT c.* FROM credentials c ORDER BY {order_by} LIMIT ? OFFSET ?
            ) c
            LEFT JOIN identity_providers ip ON ip.id = c.identity_provider_id
            LEFT JOIN service_providers sp ON sp.credential_id = c.id
            ORDER BY {order_by}, sp.id ASC
            "#,
            columns = CREDENTIAL_COLUMNS,
            order_by = order_by
        ))
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;
        Ok(Page::new(assemble_credentials(rows), page, total))
    }

    async fn find_one_with_eager_relationships(&self, id: i64) -> Result<Option<Credential>> {
        let rows = sqlx::query_as::<_, CredentialJoinRow>(&format!(
            r#"
            SELECT {},
                   sp.id AS service_provider_id, sp.name AS service_provider_name
            FROM credentials c
            LEFT JOIN identity_providers ip ON ip.id = c.identity_provider_id
            LEFT JOIN service_providers sp ON sp.credential_id = c.id
            WHERE c.id = ?
            ORDER BY sp.id ASC
            "#,
            CREDENTIAL_COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble_credentials(rows).into_iter().next())
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        // service_providers.credential_id is ON DELETE SET NULL
        sqlx::query("DELETE FROM credentials WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
