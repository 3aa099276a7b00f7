//! # Credential Store
//!
//! The canonical table of credential records, keyed by id, plus the
//! category name table. This is the only owner of credential data; the
//! indices in [`crate::index`] hold ids derived from it.

use std::collections::BTreeMap;

use sbt_core::{CategoryId, CredentialId};

use crate::credential::Credential;
use crate::error::{RegistryError, RegistryResult};

/// Credential records in id order, and the id allocator.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    records: BTreeMap<CredentialId, Credential>,
    next_id: CredentialId,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// An empty store whose first allocation is id 1.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: CredentialId::FIRST,
        }
    }

    /// Rebuild a store from persisted records and counter.
    pub(crate) fn from_parts(
        records: BTreeMap<CredentialId, Credential>,
        next_id: CredentialId,
    ) -> Self {
        Self { records, next_id }
    }

    /// The id the next issuance will receive.
    pub fn next_id(&self) -> CredentialId {
        self.next_id
    }

    /// Number of ids ever allocated, including burned ones.
    pub fn total_issued(&self) -> u64 {
        self.next_id.get().saturating_sub(CredentialId::FIRST.get())
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record.
    pub fn get(&self, id: CredentialId) -> RegistryResult<&Credential> {
        self.records.get(&id).ok_or(RegistryError::NotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: CredentialId) -> RegistryResult<&mut Credential> {
        self.records.get_mut(&id).ok_or(RegistryError::NotFound(id))
    }

    /// Whether a record with this id is stored.
    pub fn contains(&self, id: CredentialId) -> bool {
        self.records.contains_key(&id)
    }

    /// Records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Credential> + Clone {
        self.records.values()
    }

    /// Reserve the next id without inserting anything.
    ///
    /// Fails only once the `u64` id space is used up.
    pub(crate) fn peek_allocation(&self) -> RegistryResult<(CredentialId, CredentialId)> {
        let id = self.next_id;
        let following = id.checked_next().ok_or(RegistryError::IdSpaceExhausted)?;
        Ok((id, following))
    }

    /// Insert a record built from [`Self::peek_allocation`] and advance the
    /// allocator.
    pub(crate) fn insert_allocated(&mut self, credential: Credential, following: CredentialId) {
        self.next_id = following;
        self.records.insert(credential.id, credential);
    }

    pub(crate) fn remove(&mut self, id: CredentialId) -> RegistryResult<Credential> {
        self.records.remove(&id).ok_or(RegistryError::NotFound(id))
    }

    pub(crate) fn records(&self) -> &BTreeMap<CredentialId, Credential> {
        &self.records
    }
}

/// Category id → display name.
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    names: BTreeMap<CategoryId, String>,
}

impl CategoryTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_names(names: BTreeMap<CategoryId, String>) -> Self {
        Self { names }
    }

    /// The category's name.
    pub fn name(&self, id: CategoryId) -> RegistryResult<&str> {
        self.names
            .get(&id)
            .map(String::as_str)
            .ok_or(RegistryError::CategoryNotFound(id))
    }

    /// Set or overwrite a name. Validation happens in the registry.
    pub(crate) fn set(&mut self, id: CategoryId, name: String) {
        self.names.insert(id, name);
    }

    /// All named categories in id order.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub(crate) fn names(&self) -> &BTreeMap<CategoryId, String> {
        &self.names
    }
}
