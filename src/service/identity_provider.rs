//! Identity provider business logic

use crate::domain::{IdentityProvider, IdentityProviderPatch, Page, PageRequest};
use crate::error::Result;
use crate::repository::IdentityProviderRepository;
use crate::search::SearchRepository;
use std::sync::Arc;
use tracing::{debug, error};

pub struct IdentityProviderService<
    R: IdentityProviderRepository,
    S: SearchRepository<IdentityProvider>,
> {
    repo: Arc<R>,
    search: Arc<S>,
}

impl<R: IdentityProviderRepository, S: SearchRepository<IdentityProvider>>
    IdentityProviderService<R, S>
{
    pub fn new(repo: Arc<R>, search: Arc<S>) -> Self {
        Self { repo, search }
    }

    pub async fn save(&self, identity_provider: IdentityProvider) -> Result<IdentityProvider> {
        debug!("Request to save IdentityProvider : {}", identity_provider);
        let saved = self.repo.save(&identity_provider).await?;
        self.index(&saved).await?;
        Ok(saved)
    }

    pub async fn partial_update(
        &self,
        patch: IdentityProviderPatch,
    ) -> Result<Option<IdentityProvider>> {
        debug!("Request to partially update IdentityProvider : {:?}", patch.id);
        let Some(id) = patch.id else {
            return Ok(None);
        };
        let Some(mut existing) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };

        patch.apply_to(&mut existing);
        let saved = self.repo.save(&existing).await?;
        self.index(&saved).await?;
        Ok(Some(saved))
    }

    pub async fn find_all(&self, page: &PageRequest) -> Result<Page<IdentityProvider>> {
        debug!("Request to get all IdentityProviders");
        self.repo.find_all(page).await
    }

    pub async fn find_one(&self, id: i64) -> Result<Option<IdentityProvider>> {
        debug!("Request to get IdentityProvider : {}", id);
        self.repo.find_by_id(id).await
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        self.repo.exists_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        debug!("Request to delete IdentityProvider : {}", id);
        self.repo.delete_by_id(id).await?;
        self.search.delete_by_id(id).await.inspect_err(|e| {
            error!(
                identity_provider_id = id,
                "Failed to remove IdentityProvider from index: {}", e
            )
        })
    }

    pub async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<IdentityProvider>> {
        debug!("Request to search IdentityProviders for query {}", query);
        self.search.search(query, page).await
    }

    async fn index(&self, identity_provider: &IdentityProvider) -> Result<()> {
        self.search.save(identity_provider).await.inspect_err(|e| {
            error!(
                identity_provider_id = ?identity_provider.id,
                "Failed to index IdentityProvider: {}", e
            )
        })
    }
}
