//! # Multi-Index Engine
//!
//! Secondary indices over the credential store. Four are keyed id sets
//! (status, holder, issuer, category); the fifth is a predicate scan over
//! `issued_at`.
//!
//! ## Ordering
//!
//! Every family yields ids in ascending id order. Ids are allocated
//! monotonically, so id order is issuance order.
//!
//! ## Pagination
//!
//! `page(offset, limit)` never fails: an offset at or past the end, or a
//! zero limit, yields an empty page. Concatenating `page(0, k)`,
//! `page(k, k)`, … reproduces the full family for any `k > 0`.
//!
//! ## Consistency
//!
//! The indices hold ids only and are never a source of truth. The registry
//! calls in here only after a mutation has been validated, and every method
//! here is infallible, so there is no half-applied index update. On restore
//! the whole engine is rebuilt from the store with [`MultiIndex::rebuild`].
//!
//! ## Date range
//!
//! [`scan_issued_between`] walks the store in id order rather than keeping
//! a time-sorted index. Issuance order and time order coincide under
//! normal operation, so this is a cost trade-off, not a correctness gap.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use sbt_core::{CategoryId, CredentialId, Principal, Timestamp};

use crate::credential::{Credential, CredentialStatus};
use crate::error::{RegistryError, RegistryResult};

// ─── Page ────────────────────────────────────────────────────────────

/// One page of an index family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Ids on this page, ascending.
    pub ids: Vec<CredentialId>,
    /// Requested offset.
    pub offset: usize,
    /// Requested limit.
    pub limit: usize,
    /// Size of the whole family.
    pub total: usize,
}

impl Page {
    fn collect(
        ids: impl Iterator<Item = CredentialId>,
        offset: usize,
        limit: usize,
        total: usize,
    ) -> Self {
        let ids = if limit == 0 || offset >= total {
            Vec::new()
        } else {
            ids.skip(offset).take(limit).collect()
        };
        Self {
            ids,
            offset,
            limit,
            total,
        }
    }

    fn empty(offset: usize, limit: usize) -> Self {
        Self {
            ids: Vec::new(),
            offset,
            limit,
            total: 0,
        }
    }

    /// Number of ids on this page.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether this page is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether entries exist past this page.
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.ids.len()) < self.total
    }
}

// ─── Id Set ──────────────────────────────────────────────────────────

/// Ascending set of credential ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSet(BTreeSet<CredentialId>);

impl IdSet {
    /// Number of ids.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Membership test.
    pub fn contains(&self, id: CredentialId) -> bool {
        self.0.contains(&id)
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CredentialId> + '_ {
        self.0.iter().copied()
    }

    /// One page of ids.
    pub fn page(&self, offset: usize, limit: usize) -> Page {
        Page::collect(self.iter(), offset, limit, self.len())
    }

    fn insert(&mut self, id: CredentialId) {
        self.0.insert(id);
    }

    fn remove(&mut self, id: CredentialId) {
        self.0.remove(&id);
    }
}

impl FromIterator<CredentialId> for IdSet {
    fn from_iter<T: IntoIterator<Item = CredentialId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ─── Keyed family ────────────────────────────────────────────────────

/// A map from key to id set that drops keys whose set becomes empty.
#[derive(Debug, Clone)]
struct Family<K: Ord> {
    sets: BTreeMap<K, IdSet>,
}

impl<K: Ord> Default for Family<K> {
    fn default() -> Self {
        Self {
            sets: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> Family<K> {
    fn insert(&mut self, key: K, id: CredentialId) {
        self.sets.entry(key).or_default().insert(id);
    }

    fn remove(&mut self, key: K, id: CredentialId) {
        if let Some(set) = self.sets.get_mut(&key) {
            set.remove(id);
            if set.is_empty() {
                self.sets.remove(&key);
            }
        }
    }

    fn relocate(&mut self, from: K, to: K, id: CredentialId) {
        self.remove(from, id);
        self.insert(to, id);
    }

    fn page(&self, key: &K, offset: usize, limit: usize) -> Page {
        self.sets
            .get(key)
            .map(|set| set.page(offset, limit))
            .unwrap_or_else(|| Page::empty(offset, limit))
    }

    fn count(&self, key: &K) -> usize {
        self.sets.get(key).map_or(0, IdSet::len)
    }

    fn get(&self, key: &K) -> Option<&IdSet> {
        self.sets.get(key)
    }
}

// ─── Multi-Index ─────────────────────────────────────────────────────

/// The four keyed index families.
#[derive(Debug, Clone, Default)]
pub struct MultiIndex {
    by_status: Family<CredentialStatus>,
    by_holder: Family<Principal>,
    by_issuer: Family<Principal>,
    by_category: Family<CategoryId>,
}

impl MultiIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every family from scratch.
    pub fn rebuild<'a>(records: impl IntoIterator<Item = &'a Credential>) -> Self {
        let mut index = Self::new();
        for credential in records {
            index.insert(credential);
        }
        index
    }

    /// Add a newly stored credential to every family.
    pub(crate) fn insert(&mut self, credential: &Credential) {
        let id = credential.id;
        self.by_status.insert(credential.status(), id);
        self.by_holder.insert(credential.holder, id);
        self.by_issuer.insert(credential.issuer, id);
        self.by_category.insert(credential.category_id, id);
    }

    /// Remove a credential from every family.
    pub(crate) fn remove(&mut self, credential: &Credential) {
        let id = credential.id;
        self.by_status.remove(credential.status(), id);
        self.by_holder.remove(credential.holder, id);
        self.by_issuer.remove(credential.issuer, id);
        self.by_category.remove(credential.category_id, id);
    }

    pub(crate) fn move_status(
        &mut self,
        id: CredentialId,
        from: CredentialStatus,
        to: CredentialStatus,
    ) {
        if from != to {
            self.by_status.relocate(from, to, id);
        }
    }

    pub(crate) fn move_holder(&mut self, id: CredentialId, from: Principal, to: Principal) {
        if from != to {
            self.by_holder.relocate(from, to, id);
        }
    }

    /// Page of credentials in `status`.
    pub fn page_by_status(&self, status: CredentialStatus, offset: usize, limit: usize) -> Page {
        self.by_status.page(&status, offset, limit)
    }

    /// Number of credentials in `status`.
    pub fn count_by_status(&self, status: CredentialStatus) -> usize {
        self.by_status.count(&status)
    }

    /// Page of credentials held by `holder`.
    pub fn page_by_holder(&self, holder: &Principal, offset: usize, limit: usize) -> Page {
        self.by_holder.page(holder, offset, limit)
    }

    /// Number of credentials held by `holder`.
    pub fn count_by_holder(&self, holder: &Principal) -> usize {
        self.by_holder.count(holder)
    }

    /// Page of credentials issued by `issuer`.
    pub fn page_by_issuer(&self, issuer: &Principal, offset: usize, limit: usize) -> Page {
        self.by_issuer.page(issuer, offset, limit)
    }

    /// Number of credentials issued by `issuer`.
    pub fn count_by_issuer(&self, issuer: &Principal) -> usize {
        self.by_issuer.count(issuer)
    }

    /// Page of credentials in `category`.
    pub fn page_by_category(&self, category: CategoryId, offset: usize, limit: usize) -> Page {
        self.by_category.page(&category, offset, limit)
    }

    /// Number of credentials in `category`.
    pub fn count_by_category(&self, category: CategoryId) -> usize {
        self.by_category.count(&category)
    }

    /// The full id set held by `holder`, if any.
    pub fn holder_set(&self, holder: &Principal) -> Option<&IdSet> {
        self.by_holder.get(holder)
    }
}

// ─── Date range scan ─────────────────────────────────────────────────

/// An inclusive `issued_at` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: Timestamp,
    to: Timestamp,
}

impl DateRange {
    /// Both ends inclusive. Fails if `from > to`.
    pub fn new(from: Timestamp, to: Timestamp) -> RegistryResult<Self> {
        if from > to {
            return Err(RegistryError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Whether `ts` falls inside the window.
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.from <= ts && ts <= self.to
    }

    /// Start of the window.
    pub fn from(&self) -> Timestamp {
        self.from
    }

    /// End of the window.
    pub fn to(&self) -> Timestamp {
        self.to
    }
}

/// Linear scan, in id order, for credentials issued inside `range`.
pub fn scan_issued_between<'a>(
    records: impl Iterator<Item = &'a Credential> + Clone,
    range: DateRange,
    offset: usize,
    limit: usize,
) -> Page {
    let matching = records
        .filter(move |c| range.contains(c.issued_at))
        .map(|c| c.id);
    let total = matching.clone().count();
    Page::collect(matching, offset, limit, total)
}

/// Number of credentials issued inside `range`.
pub fn count_issued_between<'a>(
    records: impl Iterator<Item = &'a Credential>,
    range: DateRange,
) -> usize {
    records.filter(|c| range.contains(c.issued_at)).count()
}

// ─── Tests ───────────────────────────────────────────────────────────
