//! API integration tests infrastructure
//!
//! In-memory stand-ins for the MySQL repositories and the search index, so
//! the production router can be exercised without external services.
//!
//! The three repositories share one [`MemoryDb`], which mirrors the
//! foreign keys of the real schema: deleting a credential or an identity
//! provider nulls the referencing column instead of cascading.

pub mod http;

use async_trait::async_trait;
use credhub_core::domain::{
    Credential, IdentityProvider, Page, PageRequest, ServiceProvider, SortDirection,
};
use credhub_core::error::{AppError, Result};
use credhub_core::repository::{
    CredentialRepository, IdentityProviderRepository, ServiceProviderRepository,
};
use credhub_core::search::{Document, SearchRepository};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

// ============================================================================
// Shared in-memory tables
// ============================================================================

#[derive(Debug, Clone)]
struct CredentialRecord {
    credential: Credential,
    identity_provider_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct ServiceProviderRecord {
    name: Option<String>,
    credential_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct MemoryDb {
    last_id: i64,
    identity_providers: BTreeMap<i64, IdentityProvider>,
    credentials: BTreeMap<i64, CredentialRecord>,
    service_providers: BTreeMap<i64, ServiceProviderRecord>,
}

impl MemoryDb {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn credential(&self, id: i64) -> Option<Credential> {
        let record = self.credentials.get(&id)?;
        let mut credential = record.credential.clone();
        credential.identity_provider = record
            .identity_provider_id
            .and_then(|ip| self.identity_providers.get(&ip).cloned());
        Some(credential)
    }

    fn credential_eager(&self, id: i64) -> Option<Credential> {
        let mut credential = self.credential(id)?;
        credential.service_providers = Some(
            self.service_providers
                .iter()
                .filter(|(_, sp)| sp.credential_id == Some(id))
                .map(|(sp_id, sp)| ServiceProvider {
                    id: Some(*sp_id),
                    name: sp.name.clone(),
                    credential: None,
                })
                .collect(),
        );
        Some(credential)
    }

    fn service_provider(&self, id: i64) -> Option<ServiceProvider> {
        let record = self.service_providers.get(&id)?;
        Some(ServiceProvider {
            id: Some(id),
            name: record.name.clone(),
            credential: record.credential_id.map(|c| Box::new(Credential::with_id(c))),
        })
    }

    fn service_provider_eager(&self, id: i64) -> Option<ServiceProvider> {
        let mut service_provider = self.service_provider(id)?;
        service_provider.credential = self.service_providers[&id]
            .credential_id
            .and_then(|c| self.credentials.get(&c))
            .map(|record| Box::new(record.credential.summary()));
        Some(service_provider)
    }
}

/// Apply paging (and an optional `id` direction) over rows already in id order
fn paginate<T>(mut rows: Vec<T>, page: &PageRequest) -> Page<T> {
    if matches!(&page.sort, Some(sort) if sort.direction == SortDirection::Desc) {
        rows.reverse();
    }
    let total = rows.len() as i64;
    let content = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.per_page as usize)
        .collect();
    Page::new(content, page, total)
}

/// Handle to one in-memory database with a repository per table
#[derive(Clone, Default)]
pub struct TestDatabase {
    db: Arc<RwLock<MemoryDb>>,
}

impl TestDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credential_repo(&self) -> TestCredentialRepository {
        TestCredentialRepository {
            db: self.db.clone(),
        }
    }

    pub fn identity_provider_repo(&self) -> TestIdentityProviderRepository {
        TestIdentityProviderRepository {
            db: self.db.clone(),
        }
    }

    pub fn service_provider_repo(&self) -> TestServiceProviderRepository {
        TestServiceProviderRepository {
            db: self.db.clone(),
        }
    }

    /// Raw link column of a service provider row
    pub async fn credential_id_of(&self, service_provider_id: i64) -> Option<i64> {
        self.db
            .read()
            .await
            .service_providers
            .get(&service_provider_id)
            .and_then(|sp| sp.credential_id)
    }

    pub async fn credential_count(&self) -> usize {
        self.db.read().await.credentials.len()
    }
}

// ============================================================================
// Test Repository Implementations
// ============================================================================

pub struct TestCredentialRepository {
    db: Arc<RwLock<MemoryDb>>,
}

#[async_trait]
impl CredentialRepository for TestCredentialRepository {
    async fn save(&self, credential: &Credential) -> Result<Credential> {
        let mut db = self.db.write().await;

        // Every check runs before the first mutation, like a rolled back transaction
        let identity_provider_id = credential.identity_provider.as_ref().and_then(|ip| ip.id);
        if let Some(ip_id) = identity_provider_id {
            if !db.identity_providers.contains_key(&ip_id) {
                return Err(AppError::BadRequest(
                    "Credential references a missing row".to_string(),
                ));
            }
            let taken = db.credentials.iter().any(|(id, record)| {
                record.identity_provider_id == Some(ip_id) && Some(*id) != credential.id
            });
            if taken {
                return Err(AppError::Conflict(
                    "Credential violates a unique constraint".to_string(),
                ));
            }
        }
        if let Some(id) = credential.id {
            if !db.credentials.contains_key(&id) {
                return Err(AppError::NotFound(format!("Credential {} not found", id)));
            }
        }
        let requested = credential.service_provider_ids();
        if let Some(missing) = requested
            .iter()
            .flatten()
            .find(|sp| !db.service_providers.contains_key(*sp))
        {
            return Err(AppError::BadRequest(format!(
                "ServiceProvider {} does not exist",
                missing
            )));
        }

        let id = match credential.id {
            Some(id) => id,
            None => db.next_id(),
        };
        let mut stored = credential.summary();
        stored.id = Some(id);
        db.credentials.insert(
            id,
            CredentialRecord {
                credential: stored,
                identity_provider_id,
            },
        );

        if let Some(requested) = requested {
            for (sp_id, sp) in db.service_providers.iter_mut() {
                if requested.contains(sp_id) {
                    sp.credential_id = Some(id);
                } else if sp.credential_id == Some(id) {
                    sp.credential_id = None;
                }
            }
        }

        let saved = if credential.service_providers.is_some() {
            db.credential_eager(id)
        } else {
            db.credential(id)
        };
        saved.ok_or_else(|| AppError::NotFound(format!("Credential {} not found", id)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Credential>> {
        Ok(self.db.read().await.credential(id))
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.db.read().await.credentials.contains_key(&id))
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Credential>> {
        let db = self.db.read().await;
        let rows = db.credentials.keys().filter_map(|id| db.credential(*id)).collect();
        Ok(paginate(rows, page))
    }

    async fn find_all_with_eager_relationships(
        &self,
        page: &PageRequest,
    ) -> Result<Page<Credential>> {
        let db = self.db.read().await;
        let rows = db
            .credentials
            .keys()
            .filter_map(|id| db.credential_eager(*id))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn find_one_with_eager_relationships(&self, id: i64) -> Result<Option<Credential>> {
        Ok(self.db.read().await.credential_eager(id))
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let mut db = self.db.write().await;
        db.credentials.remove(&id);
        for sp in db.service_providers.values_mut() {
            if sp.credential_id == Some(id) {
                sp.credential_id = None;
            }
        }
        Ok(())
    }
}

pub struct TestIdentityProviderRepository {
    db: Arc<RwLock<MemoryDb>>,
}

#[async_trait]
impl IdentityProviderRepository for TestIdentityProviderRepository {
    async fn save(&self, identity_provider: &IdentityProvider) -> Result<IdentityProvider> {
        let mut db = self.db.write().await;
        let id = match identity_provider.id {
            Some(id) => id,
            None => db.next_id(),
        };
        if identity_provider.id.is_some() && !db.identity_providers.contains_key(&id) {
            return Err(AppError::NotFound(format!(
                "IdentityProvider {} not found",
                id
            )));
        }
        let stored = IdentityProvider {
            id: Some(id),
            name: identity_provider.name.clone(),
        };
        db.identity_providers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<IdentityProvider>> {
        Ok(self.db.read().await.identity_providers.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.db.read().await.identity_providers.contains_key(&id))
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<IdentityProvider>> {
        let db = self.db.read().await;
        Ok(paginate(db.identity_providers.values().cloned().collect(), page))
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let mut db = self.db.write().await;
        db.identity_providers.remove(&id);
        for record in db.credentials.values_mut() {
            if record.identity_provider_id == Some(id) {
                record.identity_provider_id = None;
            }
        }
        Ok(())
    }
}

pub struct TestServiceProviderRepository {
    db: Arc<RwLock<MemoryDb>>,
}

#[async_trait]
impl ServiceProviderRepository for TestServiceProviderRepository {
    async fn save(&self, service_provider: &ServiceProvider) -> Result<ServiceProvider> {
        let mut db = self.db.write().await;
        let credential_id = service_provider.credential_id();
        if let Some(cid) = credential_id {
            if !db.credentials.contains_key(&cid) {
                return Err(AppError::BadRequest(
                    "ServiceProvider references a missing row".to_string(),
                ));
            }
        }
        let id = match service_provider.id {
            Some(id) => id,
            None => db.next_id(),
        };
        if service_provider.id.is_some() && !db.service_providers.contains_key(&id) {
            return Err(AppError::NotFound(format!(
                "ServiceProvider {} not found",
                id
            )));
        }
        db.service_providers.insert(
            id,
            ServiceProviderRecord {
                name: service_provider.name.clone(),
                credential_id,
            },
        );
        db.service_provider_eager(id)
            .ok_or_else(|| AppError::NotFound(format!("ServiceProvider {} not found", id)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ServiceProvider>> {
        Ok(self.db.read().await.service_provider(id))
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.db.read().await.service_providers.contains_key(&id))
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<ServiceProvider>> {
        let db = self.db.read().await;
        let rows = db
            .service_providers
            .keys()
            .filter_map(|id| db.service_provider(*id))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn find_all_with_eager_relationships(
        &self,
        page: &PageRequest,
    ) -> Result<Page<ServiceProvider>> {
        let db = self.db.read().await;
        let rows = db
            .service_providers
            .keys()
            .filter_map(|id| db.service_provider_eager(*id))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn find_one_with_eager_relationships(
        &self,
        id: i64,
    ) -> Result<Option<ServiceProvider>> {
        Ok(self.db.read().await.service_provider_eager(id))
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.db.write().await.service_providers.remove(&id);
        Ok(())
    }
}

// ============================================================================
// Test Search Index
// ============================================================================

/// Records indexed documents; a query matches documents whose JSON contains
/// it (case-insensitive), and `*` matches everything
pub struct TestSearchRepository<T> {
    documents: RwLock<BTreeMap<i64, T>>,
    failing: AtomicBool,
}

impl<T: Document + Clone> TestSearchRepository<T> {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent index call fail like an unreachable cluster
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn get(&self, id: i64) -> Option<T> {
        self.documents.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Search("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Document + Clone> SearchRepository<T> for TestSearchRepository<T> {
    async fn save(&self, entity: &T) -> Result<()> {
        self.check_available()?;
        if let Some(id) = entity.document_id() {
            self.documents.write().await.insert(id, entity.clone());
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.check_available()?;
        self.documents.write().await.remove(&id);
        Ok(())
    }

    async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<T>> {
        self.check_available()?;
        let needle = query.to_lowercase();
        let hits: Vec<T> = self
            .documents
            .read()
            .await
            .values()
            .filter(|doc| {
                needle == "*"
                    || serde_json::to_string(doc)
                        .map(|json| json.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .cloned()
            .collect();
        let total = hits.len() as i64;
        Ok(Page::new(hits, page, total))
    }
}
