//! Credential / service provider relationship graph
//!
//! Entities live in id-keyed tables and links are kept in two maps (forward
//! set per credential, back-reference per service provider). Every mutation
//! updates both maps in the same call, so after any operation a service
//! provider points at a credential iff that credential lists it.

use super::credential::Credential;
use super::service_provider::ServiceProvider;
use std::collections::{BTreeMap, BTreeSet};

/// Service provider ids detached from / attached to a credential by a
/// relationship replacement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkChange {
    pub unlinked: Vec<i64>,
    pub linked: Vec<i64>,
}

impl LinkChange {
    pub fn is_empty(&self) -> bool {
        self.unlinked.is_empty() && self.linked.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    credentials: BTreeMap<i64, Credential>,
    credential_order: Vec<i64>,
    service_providers: BTreeMap<i64, ServiceProvider>,
    service_provider_order: Vec<i64>,
    /// credential id -> linked service provider ids
    owned: BTreeMap<i64, BTreeSet<i64>>,
    /// service provider id -> owning credential id
    owner: BTreeMap<i64, i64>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a credential's scalar fields. Relationship fields are ignored;
    /// links are managed through the link operations. Returns `false` for
    /// unsaved credentials.
    pub fn insert_credential(&mut self, credential: &Credential) -> bool {
        let Some(id) = credential.id else {
            return false;
        };
        if self.credentials.insert(id, credential.summary()).is_none() {
            self.credential_order.push(id);
        }
        self.owned.entry(id).or_default();
        true
    }

    /// Store a service provider's scalar fields, see [`Self::insert_credential`]
    pub fn insert_service_provider(&mut self, service_provider: &ServiceProvider) -> bool {
        let Some(id) = service_provider.id else {
            return false;
        };
        if self
            .service_providers
            .insert(id, service_provider.summary())
            .is_none()
        {
            self.service_provider_order.push(id);
        }
        true
    }

    pub fn contains_credential(&self, credential_id: i64) -> bool {
        self.credentials.contains_key(&credential_id)
    }

    /// Replace the full service provider set of a credential.
    ///
    /// Back-references of every previously linked provider are cleared
    /// first; then every provider in the new set is detached from whatever
    /// credential held it and attached here.
    pub fn set_service_providers(
        &mut self,
        credential_id: i64,
        service_provider_ids: impl IntoIterator<Item = i64>,
    ) -> LinkChange {
        let next: BTreeSet<i64> = service_provider_ids.into_iter().collect();
        let previous = self.owned.remove(&credential_id).unwrap_or_default();

        for sp in &previous {
            self.owner.remove(sp);
        }
        for sp in &next {
            self.detach(*sp);
            self.owner.insert(*sp, credential_id);
        }

        let change = LinkChange {
            unlinked: previous.difference(&next).copied().collect(),
            linked: next.difference(&previous).copied().collect(),
        };
        self.owned.insert(credential_id, next);
        change
    }

    pub fn add_service_provider(&mut self, credential_id: i64, service_provider_id: i64) {
        self.detach(service_provider_id);
        self.owned
            .entry(credential_id)
            .or_default()
            .insert(service_provider_id);
        self.owner.insert(service_provider_id, credential_id);
    }

    /// No-op when the provider is not linked to this credential
    pub fn remove_service_provider(&mut self, credential_id: i64, service_provider_id: i64) {
        if self.owner.get(&service_provider_id) == Some(&credential_id) {
            self.detach(service_provider_id);
        }
    }

    /// Service provider side of the link; same resulting graph as the
    /// credential-side operations.
    pub fn set_credential(&mut self, service_provider_id: i64, credential_id: Option<i64>) {
        match credential_id {
            Some(credential_id) => self.add_service_provider(credential_id, service_provider_id),
            None => self.detach(service_provider_id),
        }
    }

    pub fn credential_of(&self, service_provider_id: i64) -> Option<i64> {
        self.owner.get(&service_provider_id).copied()
    }

    pub fn service_providers_of(&self, credential_id: i64) -> Vec<i64> {
        self.owned
            .get(&credential_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn detach(&mut self, service_provider_id: i64) {
        if let Some(previous) = self.owner.remove(&service_provider_id) {
            if let Some(set) = self.owned.get_mut(&previous) {
                set.remove(&service_provider_id);
            }
        }
    }

    /// Credential with its linked service providers filled in. Providers
    /// not present in the table are emitted as id-only references.
    pub fn materialize_credential(&self, credential_id: i64) -> Option<Credential> {
        let mut credential = self.credentials.get(&credential_id)?.clone();
        credential.service_providers = Some(
            self.service_providers_of(credential_id)
                .into_iter()
                .map(|sp| {
                    self.service_providers
                        .get(&sp)
                        .cloned()
                        .unwrap_or_else(|| ServiceProvider::with_id(sp))
                })
                .collect(),
        );
        Some(credential)
    }

    /// Service provider with its owning credential filled in
    pub fn materialize_service_provider(&self, service_provider_id: i64) -> Option<ServiceProvider> {
        let mut service_provider = self.service_providers.get(&service_provider_id)?.clone();
        service_provider.credential = self.credential_of(service_provider_id).map(|c| {
            Box::new(
                self.credentials
                    .get(&c)
                    .cloned()
                    .unwrap_or_else(|| Credential::with_id(c)),
            )
        });
        Some(service_provider)
    }

    /// All credentials in insertion order
    pub fn credentials(&self) -> Vec<Credential> {
        self.credential_order
            .iter()
            .filter_map(|id| self.materialize_credential(*id))
            .collect()
    }

    /// All service providers in insertion order
    pub fn service_providers(&self) -> Vec<ServiceProvider> {
        self.service_provider_order
            .iter()
            .filter_map(|id| self.materialize_service_provider(*id))
            .collect()
    }
}
