//! Secondary search index
//!
//! The index mirrors what the primary store returned after each write and
//! is never authoritative.

pub mod elasticsearch;

pub use elasticsearch::{ElasticsearchClient, ElasticsearchSearchRepository};

use crate::domain::{Credential, IdentityProvider, Page, PageRequest, ServiceProvider};
use crate::error::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Entity that can be stored in the search index
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Index the documents of this type live in
    const INDEX_NAME: &'static str;
    /// Label used in logs and metrics
    const ENTITY_NAME: &'static str;
    /// String fields that are dynamically mapped as `text`; sorting goes
    /// through their `.keyword` subfield
    const KEYWORD_FIELDS: &'static [&'static str];

    fn document_id(&self) -> Option<i64>;
}

impl Document for Credential {
    const INDEX_NAME: &'static str = "credential";
    const ENTITY_NAME: &'static str = Credential::ENTITY_NAME;
    const KEYWORD_FIELDS: &'static [&'static str] = &["profile", "username", "password"];

    fn document_id(&self) -> Option<i64> {
        self.id
    }
}

impl Document for IdentityProvider {
    const INDEX_NAME: &'static str = "identityprovider";
    const ENTITY_NAME: &'static str = IdentityProvider::ENTITY_NAME;
    const KEYWORD_FIELDS: &'static [&'static str] = &["name"];

    fn document_id(&self) -> Option<i64> {
        self.id
    }
}

impl Document for ServiceProvider {
    const INDEX_NAME: &'static str = "serviceprovider";
    const ENTITY_NAME: &'static str = ServiceProvider::ENTITY_NAME;
    const KEYWORD_FIELDS: &'static [&'static str] = &["name"];

    fn document_id(&self) -> Option<i64> {
        self.id
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchRepository<T: Document>: Send + Sync {
    /// Upsert the document under its id
    async fn save(&self, entity: &T) -> Result<()>;
    /// Remove the document; a missing document is not an error
    async fn delete_by_id(&self, id: i64) -> Result<()>;
    /// Run an opaque query string; `total` is the number of hits returned
    /// for this page
    async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<T>>;
}
