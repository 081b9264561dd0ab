//! Storage contract consumed by the domain layer.
//!
//! Collections are queried with a structured [`ListQuery`] and iterated
//! through a [`Cursor`]. The domain never sees how documents are stored;
//! `infra::storage` provides the in-memory implementation.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use automation_sdk::models::{
    ActivityRecord, Credential, Inventory, Job, JobTemplate, Organization, Project, Team, User,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique index rejected the write.
    #[error("duplicate key {key} in {collection}")]
    Duplicate {
        collection: &'static str,
        key: String,
    },

    #[error("document {id} not found in {collection}")]
    Missing { collection: &'static str, id: Uuid },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// A stored field value as seen by filters and sorts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Uuid(Uuid),
    Time(DateTime<Utc>),
}

impl FieldValue {
    /// Text rendering used for exact and substring comparison.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Text(s) => s.clone(),
            Self::Uuid(u) => u.to_string(),
            Self::Time(t) => t.to_rfc3339(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<Option<Uuid>> for FieldValue {
    fn from(value: Option<Uuid>) -> Self {
        value.map_or(Self::Null, Self::Uuid)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Time(value)
    }
}

impl From<Option<DateTime<Utc>>> for FieldValue {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Null, Self::Time)
    }
}

/// A persisted document addressable by id and by named fields.
pub trait Document: Clone + Send + Sync + 'static {
    /// Collection name, used in logs and errors.
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;

    /// Value of a persisted field, `None` when the document has no such field.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Key of the `(name, organization_id)` unique index, when the collection has one.
    fn unique_key(&self) -> Option<(String, Uuid)> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Stored value rendered as text equals `value`.
    Equals { field: &'static str, value: String },
    /// Stored value rendered as text contains `value` (case-sensitive).
    Contains { field: &'static str, value: String },
}

impl Condition {
    fn matches<T: Document>(&self, doc: &T) -> bool {
        match self {
            Self::Equals { field, value } => doc.field(field).is_some_and(|v| v.render() == *value),
            Self::Contains { field, value } => doc
                .field(field)
                .is_some_and(|v| v.render().contains(value.as_str())),
        }
    }
}

/// Conjunction of conditions. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equals(mut self, field: &'static str, value: impl Into<FieldValue>) -> Self {
        self.conditions.push(Condition::Equals {
            field,
            value: value.into().render(),
        });
        self
    }

    #[must_use]
    pub fn contains(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains {
            field,
            value: value.into(),
        });
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    #[must_use]
    pub fn matches<T: Document>(&self, doc: &T) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub descending: bool,
}

impl Sort {
    /// Compare two documents by the sort field. Missing fields sort first.
    #[must_use]
    pub fn compare<T: Document>(&self, a: &T, b: &T) -> Ordering {
        let ord = a.field(self.field).cmp(&b.field(self.field));
        if self.descending { ord.reverse() } else { ord }
    }
}

/// Structured query: predicate plus optional sort. No sort means insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: Filter,
    pub sort: Option<Sort>,
}

impl ListQuery {
    #[must_use]
    pub fn filtered(filter: Filter) -> Self {
        Self { filter, sort: None }
    }
}

/// Forward-only iteration over a query result.
///
/// A cursor must be closed exactly once, on every exit path.
#[async_trait]
pub trait Cursor<T>: Send {
    async fn next(&mut self) -> Result<Option<T>, StorageError>;

    async fn close(self: Box<Self>) -> Result<(), StorageError>;
}

#[async_trait]
pub trait Collection<T: Document>: Send + Sync {
    async fn find(&self, query: &ListQuery) -> Result<Box<dyn Cursor<T>>, StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<T>, StorageError>;

    async fn count(&self, filter: &Filter) -> Result<usize, StorageError>;

    async fn insert(&self, doc: T) -> Result<(), StorageError>;

    /// Replace the document with the same id.
    async fn replace(&self, doc: T) -> Result<(), StorageError>;

    /// Returns whether a document was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StorageError>;

    /// Returns the number of removed documents.
    async fn delete_many(&self, filter: &Filter) -> Result<usize, StorageError>;
}

/// Injected handle to every collection the module touches.
#[derive(Clone)]
pub struct Store {
    pub organizations: Arc<dyn Collection<Organization>>,
    pub teams: Arc<dyn Collection<Team>>,
    pub projects: Arc<dyn Collection<Project>>,
    pub inventories: Arc<dyn Collection<Inventory>>,
    pub job_templates: Arc<dyn Collection<JobTemplate>>,
    pub credentials: Arc<dyn Collection<Credential>>,
    pub users: Arc<dyn Collection<User>>,
    pub jobs: Arc<dyn Collection<Job>>,
    pub activity: Arc<dyn Collection<ActivityRecord>>,
}

/// Drain a cursor without authorization filtering, closing it on every path.
///
/// # Errors
/// Returns the first storage error raised while iterating or closing.
pub async fn drain<T: Send>(mut cursor: Box<dyn Cursor<T>>) -> Result<Vec<T>, StorageError> {
    let mut out = Vec::new();
    let outcome = loop {
        match cursor.next().await {
            Ok(Some(doc)) => out.push(doc),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    let closed = cursor.close().await;
    outcome?;
    closed?;
    Ok(out)
}
