//! Credential business logic

use crate::domain::{Credential, CredentialPatch, Page, PageRequest};
use crate::error::Result;
use crate::repository::CredentialRepository;
use crate::search::SearchRepository;
use std::sync::Arc;
use tracing::{debug, error};

pub struct CredentialService<R: CredentialRepository, S: SearchRepository<Credential>> {
    repo: Arc<R>,
    search: Arc<S>,
}

impl<R: CredentialRepository, S: SearchRepository<Credential>> CredentialService<R, S> {
    pub fn new(repo: Arc<R>, search: Arc<S>) -> Self {
        Self { repo, search }
    }

    /// Persist, then mirror the stored result into the index
    pub async fn save(&self, credential: Credential) -> Result<Credential> {
        debug!("Request to save Credential : {}", credential);
        let saved = self.repo.save(&credential).await?;
        self.index(&saved).await?;
        Ok(saved)
    }

    /// Merge the supplied fields into the stored credential.
    /// Returns `None` without writing anything when the id is unknown.
    pub async fn partial_update(&self, patch: CredentialPatch) -> Result<Option<Credential>> {
        debug!("Request to partially update Credential : {:?}", patch.id);
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

    pub async fn find_all(&self, page: &PageRequest) -> Result<Page<Credential>> {
        debug!("Request to get all Credentials");
        self.repo.find_all(page).await
    }

    pub async fn find_all_with_eager_relationships(
        &self,
        page: &PageRequest,
    ) -> Result<Page<Credential>> {
        debug!("Request to get all Credentials with eager relationships");
        self.repo.find_all_with_eager_relationships(page).await
    }

    /// Loads the identity provider and the linked service providers
    pub async fn find_one(&self, id: i64) -> Result<Option<Credential>> {
        debug!("Request to get Credential : {}", id);
        self.repo.find_one_with_eager_relationships(id).await
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        self.repo.exists_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        debug!("Request to delete Credential : {}", id);
        self.repo.delete_by_id(id).await?;
        self.search
            .delete_by_id(id)
            .await
            .inspect_err(|e| error!(credential_id = id, "Failed to remove Credential from index: {}", e))
    }

    pub async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<Credential>> {
        debug!("Request to search for a page of Credentials for query {}", query);
        self.search.search(query, page).await
    }

    async fn index(&self, credential: &Credential) -> Result<()> {
        self.search
            .save(credential)
            .await
            .inspect_err(|e| error!(credential_id = ?credential.id, "Failed to index Credential: {}", e))
    }
}
