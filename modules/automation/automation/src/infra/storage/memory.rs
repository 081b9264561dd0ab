//! In-memory document collections.
//!
//! Documents keep insertion order. Collections whose documents expose a
//! `unique_key` maintain a `(name, organization_id)` index that is checked
//! and updated under the same write lock as the document itself, so two
//! racing inserts of the same key cannot both succeed.
//!
//! Fault switches let tests exercise the storage-failure paths of the
//! pipeline without a real backend.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use automation_sdk::models::{
    ActivityRecord, Credential, Inventory, Job, JobTemplate, Organization, Project, Team, User,
};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::repo::{
    Collection, Cursor, Document, Filter, ListQuery, StorageError, Store,
};

struct Inner<T> {
    docs: Vec<T>,
    unique: HashMap<(String, Uuid), Uuid>,
}

impl<T> Default for Inner<T> {
    fn default() -> Self {
        Self {
            docs: Vec::new(),
            unique: HashMap::new(),
        }
    }
}

#[derive(Default)]
struct Faults {
    writes: AtomicBool,
    delete_many: AtomicBool,
    /// Cursors fail after yielding this many documents; `usize::MAX` disables.
    iteration_after: AtomicUsize,
}

pub struct MemoryCollection<T> {
    inner: RwLock<Inner<T>>,
    faults: Faults,
    open_cursors: Arc<AtomicUsize>,
}

impl<T: Document> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> MemoryCollection<T> {
    #[must_use]
    pub fn new() -> Self {
        let faults = Faults::default();
        faults.iteration_after.store(usize::MAX, Ordering::SeqCst);
        Self {
            inner: RwLock::new(Inner::default()),
            faults,
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every insert, replace and delete fail.
    pub fn fail_writes(&self, on: bool) {
        self.faults.writes.store(on, Ordering::SeqCst);
    }

    /// Make `delete_many` fail.
    pub fn fail_delete_many(&self, on: bool) {
        self.faults.delete_many.store(on, Ordering::SeqCst);
    }

    /// Make cursors fail after yielding `after` documents; `None` restores normal iteration.
    pub fn fail_iteration_after(&self, after: Option<usize>) {
        self.faults
            .iteration_after
            .store(after.unwrap_or(usize::MAX), Ordering::SeqCst);
    }

    /// Cursors opened by `find` and not yet closed.
    #[must_use]
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().docs.is_empty()
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.faults.writes.load(Ordering::SeqCst) {
            return Err(StorageError::backend(format!(
                "{} is not accepting writes",
                T::COLLECTION
            )));
        }
        Ok(())
    }
}

fn duplicate<T: Document>(key: &(String, Uuid)) -> StorageError {
    StorageError::Duplicate {
        collection: T::COLLECTION,
        key: format!("({}, {})", key.0, key.1),
    }
}

#[async_trait]
impl<T: Document> Collection<T> for MemoryCollection<T> {
    async fn find(&self, query: &ListQuery) -> Result<Box<dyn Cursor<T>>, StorageError> {
        let mut items: Vec<T> = self
            .inner
            .read()
            .docs
            .iter()
            .filter(|d| query.filter.matches(*d))
            .cloned()
            .collect();
        if let Some(sort) = query.sort {
            items.sort_by(|a, b| sort.compare(a, b));
        }

        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryCursor {
            items: items.into(),
            remaining_before_failure: self.faults.iteration_after.load(Ordering::SeqCst),
            open_cursors: Arc::clone(&self.open_cursors),
        }))
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, StorageError> {
        Ok(self.inner.read().docs.iter().find(|d| d.id() == id).cloned())
    }

    async fn count(&self, filter: &Filter) -> Result<usize, StorageError> {
        Ok(self
            .inner
            .read()
            .docs
            .iter()
            .filter(|d| filter.matches(*d))
            .count())
    }

    async fn insert(&self, doc: T) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        let id = doc.id();
        if inner.docs.iter().any(|d| d.id() == id) {
            return Err(StorageError::Duplicate {
                collection: T::COLLECTION,
                key: id.to_string(),
            });
        }
        if let Some(key) = doc.unique_key() {
            if inner.unique.contains_key(&key) {
                return Err(duplicate::<T>(&key));
            }
            inner.unique.insert(key, id);
        }
        inner.docs.push(doc);
        Ok(())
    }

    async fn replace(&self, doc: T) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        let id = doc.id();
        let Some(pos) = inner.docs.iter().position(|d| d.id() == id) else {
            return Err(StorageError::Missing {
                collection: T::COLLECTION,
                id,
            });
        };

        let old_key = inner.docs[pos].unique_key();
        let new_key = doc.unique_key();
        if new_key != old_key {
            if let Some(key) = &new_key
                && inner.unique.get(key).is_some_and(|owner| *owner != id)
            {
                return Err(duplicate::<T>(key));
            }
            if let Some(key) = old_key {
                inner.unique.remove(&key);
            }
            if let Some(key) = new_key {
                inner.unique.insert(key, id);
            }
        }
        inner.docs[pos] = doc;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StorageError> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        let Some(pos) = inner.docs.iter().position(|d| d.id() == id) else {
            return Ok(false);
        };
        let removed = inner.docs.remove(pos);
        if let Some(key) = removed.unique_key() {
            inner.unique.remove(&key);
        }
        Ok(true)
    }

    async fn delete_many(&self, filter: &Filter) -> Result<usize, StorageError> {
        self.check_writable()?;
        if self.faults.delete_many.load(Ordering::SeqCst) {
            return Err(StorageError::backend(format!(
                "bulk delete failed on {}",
                T::COLLECTION
            )));
        }
        let mut inner = self.inner.write();
        let (removed, kept): (Vec<T>, Vec<T>) =
            inner.docs.drain(..).partition(|d| filter.matches(d));
        inner.docs = kept;
        for doc in &removed {
            if let Some(key) = doc.unique_key() {
                inner.unique.remove(&key);
            }
        }
        Ok(removed.len())
    }
}

struct MemoryCursor<T> {
    items: VecDeque<T>,
    remaining_before_failure: usize,
    open_cursors: Arc<AtomicUsize>,
}

#[async_trait]
impl<T: Document> Cursor<T> for MemoryCursor<T> {
    async fn next(&mut self) -> Result<Option<T>, StorageError> {
        if self.remaining_before_failure == 0 {
            return Err(StorageError::backend("cursor interrupted"));
        }
        let item = self.items.pop_front();
        if item.is_some() && self.remaining_before_failure != usize::MAX {
            self.remaining_before_failure -= 1;
        }
        Ok(item)
    }

    async fn close(self: Box<Self>) -> Result<(), StorageError> {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Typed handles to every in-memory collection, for seeding and fault injection.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub organizations: Arc<MemoryCollection<Organization>>,
    pub teams: Arc<MemoryCollection<Team>>,
    pub projects: Arc<MemoryCollection<Project>>,
    pub inventories: Arc<MemoryCollection<Inventory>>,
    pub job_templates: Arc<MemoryCollection<JobTemplate>>,
    pub credentials: Arc<MemoryCollection<Credential>>,
    pub users: Arc<MemoryCollection<User>>,
    pub jobs: Arc<MemoryCollection<Job>>,
    pub activity: Arc<MemoryCollection<ActivityRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Domain-facing handle sharing these collections.
    #[must_use]
    pub fn store(&self) -> Store {
        Store {
            organizations: self.organizations.clone(),
            teams: self.teams.clone(),
            projects: self.projects.clone(),
            inventories: self.inventories.clone(),
            job_templates: self.job_templates.clone(),
            credentials: self.credentials.clone(),
            users: self.users.clone(),
            jobs: self.jobs.clone(),
            activity: self.activity.clone(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::domain::repo::{Sort, drain};

    fn team(name: &str, org: Uuid) -> Team {
        let now = Utc::now();
        Team {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            description: String::new(),
            organization_id: org,
            created_by: Uuid::nil(),
            modified_by: Uuid::nil(),
            created: now,
            modified: now,
            roles: Vec::new(),
        }
    }

    #[tokio::test]
    async fn find_keeps_insertion_order_without_sort() {
        let coll = MemoryCollection::new();
        let org = Uuid::new_v4();
        for name in ["c", "a", "b"] {
            coll.insert(team(name, org)).await.unwrap();
        }

        let all = drain(coll.find(&ListQuery::default()).await.unwrap())
            .await
            .unwrap();
        let names: Vec<_> = all.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(coll.open_cursors(), 0);
    }

    #[tokio::test]
    async fn find_filters_and_sorts() {
        let coll = MemoryCollection::new();
        let org = Uuid::new_v4();
        let mut older = team("ops-old", org);
        older.created = DateTime::from_timestamp(0, 0).unwrap();
        coll.insert(team("ops-new", org)).await.unwrap();
        coll.insert(older).await.unwrap();
        coll.insert(team("dev", org)).await.unwrap();

        let query = ListQuery {
            filter: Filter::new().contains("name", "ops"),
            sort: Some(Sort {
                field: "created",
                descending: false,
            }),
        };
        let found = drain(coll.find(&query).await.unwrap()).await.unwrap();
        let names: Vec<_> = found.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["ops-old", "ops-new"]);
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicate_name_in_same_org() {
        let coll = MemoryCollection::new();
        let org = Uuid::new_v4();
        coll.insert(team("ops", org)).await.unwrap();

        let err = coll.insert(team("ops", org)).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));

        coll.insert(team("ops", Uuid::new_v4())).await.unwrap();
        assert_eq!(coll.len(), 2);
    }

    #[tokio::test]
    async fn replace_moves_unique_key() {
        let coll = MemoryCollection::new();
        let org = Uuid::new_v4();
        let mut a = team("a", org);
        coll.insert(a.clone()).await.unwrap();
        coll.insert(team("b", org)).await.unwrap();

        a.name = "b".to_owned();
        assert!(matches!(
            coll.replace(a.clone()).await,
            Err(StorageError::Duplicate { .. })
        ));

        a.name = "c".to_owned();
        coll.replace(a).await.unwrap();
        coll.insert(team("a", org)).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_duplicate_inserts_admit_exactly_one() {
        let coll = Arc::new(MemoryCollection::new());
        let org = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let coll = coll.clone();
                tokio::spawn(async move { coll.insert(team("race", org)).await })
            })
            .collect();

        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(coll.len(), 1);
    }

    #[tokio::test]
    async fn delete_many_removes_matches_and_frees_keys() {
        let coll = MemoryCollection::new();
        let org = Uuid::new_v4();
        coll.insert(team("a", org)).await.unwrap();
        coll.insert(team("b", org)).await.unwrap();
        coll.insert(team("c", Uuid::new_v4())).await.unwrap();

        let removed = coll
            .delete_many(&Filter::new().equals("organization_id", org))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(coll.len(), 1);
        coll.insert(team("a", org)).await.unwrap();
    }

    #[tokio::test]
    async fn iteration_fault_surfaces_as_storage_error() {
        let coll = MemoryCollection::new();
        let org = Uuid::new_v4();
        coll.insert(team("a", org)).await.unwrap();
        coll.insert(team("b", org)).await.unwrap();
        coll.fail_iteration_after(Some(1));

        let mut cursor = coll.find(&ListQuery::default()).await.unwrap();
        assert!(cursor.next().await.unwrap().is_some());
        assert!(cursor.next().await.is_err());
        cursor.close().await.unwrap();
        assert_eq!(coll.open_cursors(), 0);
    }
}
