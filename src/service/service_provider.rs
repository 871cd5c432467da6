//! Service provider business logic

use crate::domain::{Page, PageRequest, ServiceProvider, ServiceProviderPatch};
use crate::error::Result;
use crate::repository::ServiceProviderRepository;
use crate::search::SearchRepository;
use std::sync::Arc;
use tracing::{debug, error};

pub struct ServiceProviderService<
    R: ServiceProviderRepository,
    S: SearchRepository<ServiceProvider>,
> {
    repo: Arc<R>,
    search: Arc<S>,
}

impl<R: ServiceProviderRepository, S: SearchRepository<ServiceProvider>>
    ServiceProviderService<R, S>
{
    pub fn new(repo: Arc<R>, search: Arc<S>) -> Self {
        Self { repo, search }
    }

    /// Persists the owning credential reference along with the name
    pub async fn save(&self, service_provider: ServiceProvider) -> Result<ServiceProvider> {
        debug!("Request to save ServiceProvider : {}", service_provider);
        let saved = self.repo.save(&service_provider).await?;
        self.index(&saved).await?;
        Ok(saved)
    }

    pub async fn partial_update(
        &self,
        patch: ServiceProviderPatch,
    ) -> Result<Option<ServiceProvider>> {
        debug!("Request to partially update ServiceProvider : {:?}", patch.id);
        let Some(id) = patch.id else {
            return Ok(None);
        };
        // Plain load keeps the credential reference so the save below
        // leaves the link as it is
        let Some(mut existing) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };

        patch.apply_to(&mut existing);
        let saved = self.repo.save(&existing).await?;
        self.index(&saved).await?;
        Ok(Some(saved))
    }

    pub async fn find_all(&self, page: &PageRequest) -> Result<Page<ServiceProvider>> {
        debug!("Request to get all ServiceProviders");
        self.repo.find_all(page).await
    }

    pub async fn find_all_with_eager_relationships(
        &self,
        page: &PageRequest,
    ) -> Result<Page<ServiceProvider>> {
        debug!("Request to get all ServiceProviders with eager relationships");
        self.repo.find_all_with_eager_relationships(page).await
    }

    pub async fn find_one(&self, id: i64) -> Result<Option<ServiceProvider>> {
        debug!("Request to get ServiceProvider : {}", id);
        self.repo.find_one_with_eager_relationships(id).await
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        self.repo.exists_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        debug!("Request to delete ServiceProvider : {}", id);
        self.repo.delete_by_id(id).await?;
        self.search.delete_by_id(id).await.inspect_err(|e| {
            error!(
                service_provider_id = id,
                "Failed to remove ServiceProvider from index: {}", e
            )
        })
    }

    pub async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<ServiceProvider>> {
        debug!("Request to search ServiceProviders for query {}", query);
        self.search.search(query, page).await
    }

    async fn index(&self, service_provider: &ServiceProvider) -> Result<()> {
        self.search.save(service_provider).await.inspect_err(|e| {
            error!(
                service_provider_id = ?service_provider.id,
                "Failed to index ServiceProvider: {}", e
            )
        })
    }
}
