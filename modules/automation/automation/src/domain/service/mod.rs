//! Resource services: the list pipeline and mutation flows per resource type.
//!
//! Every list follows the same path: translate the request parameters,
//! stream the query through the authorization filter, window the approved
//! records, decorate the page.

mod inventories;
mod jobs;
mod organizations;
mod projects;
mod teams;

use std::path::PathBuf;
use std::sync::Arc;

use authz_oracle_sdk::{AuthorizationOracle, Protected};
use automation_sdk::models::{Organization, Page, Representation};
use conductor_security::SecurityContext;
use uuid::Uuid;

use super::activity::ActivityRecorder;
use super::decorate::{Decorate, Decorator};
use super::dispatch::{JobRunner, SyncDispatcher, WorkspaceCleanup};
use super::error::DomainError;
use super::fields::Fields;
use super::filter::FilterSpec;
use super::listing;
use super::pagination::{PageLimits, PageRequest, Paginator};
use super::repo::{Collection, Document, Filter, ListQuery, StorageError, Store, drain};

pub use projects::PROJECT;

/// Path and query parameters of a list request, as received.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl ListRequest {
    pub fn new(path: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub limits: PageLimits,
    /// Parent of every project's `local_path`.
    pub projects_home: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            limits: PageLimits::default(),
            projects_home: PathBuf::from("/var/lib/conductor/projects"),
        }
    }
}

pub struct Service {
    store: Store,
    oracle: Arc<dyn AuthorizationOracle>,
    decorator: Decorator,
    activity: ActivityRecorder,
    dispatcher: SyncDispatcher,
    cleanup: Arc<dyn WorkspaceCleanup>,
    config: ServiceConfig,
}

impl Service {
    pub fn new(
        store: Store,
        oracle: Arc<dyn AuthorizationOracle>,
        runner: Arc<dyn JobRunner>,
        cleanup: Arc<dyn WorkspaceCleanup>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            decorator: Decorator::new(store.clone()),
            activity: ActivityRecorder::new(Arc::clone(&store.activity)),
            dispatcher: SyncDispatcher::new(runner),
            store,
            oracle,
            cleanup,
            config,
        }
    }

    /// Filtered, authorized, paginated and decorated listing of one collection.
    ///
    /// `scope` conditions are added to whatever the request parameters select.
    async fn list_resource<T>(
        &self,
        ctx: &SecurityContext,
        spec: &FilterSpec,
        collection: &Arc<dyn Collection<T>>,
        req: &ListRequest,
        scope: Filter,
    ) -> Result<Page<Representation>, DomainError>
    where
        T: Document + Protected + Decorate,
    {
        let page_req = PageRequest::parse(&req.params, self.config.limits)?;
        let mut query = spec.translate(&req.params);
        for condition in scope.conditions() {
            query.filter.push(condition.clone());
        }

        let approved =
            listing::stream(ctx, self.oracle.as_ref(), collection.as_ref(), &query).await?;
        let page = Paginator::new(&req.path, &req.params).window(approved, page_req)?;
        Ok(self.decorate_page(page).await)
    }

    /// Paginate records that need no authorization of their own.
    fn paginate<T>(&self, records: Vec<T>, req: &ListRequest) -> Result<Page<T>, DomainError> {
        let page_req = PageRequest::parse(&req.params, self.config.limits)?;
        Ok(Paginator::new(&req.path, &req.params).window(records, page_req)?)
    }

    async fn decorate_page<T: Decorate>(&self, page: Page<T>) -> Page<Representation> {
        Page {
            count: page.count,
            next: page.next,
            previous: page.previous,
            results: self.decorator.all(&page.results).await,
        }
    }

    async fn load<T: Document>(
        collection: &Arc<dyn Collection<T>>,
        id: Uuid,
    ) -> Result<T, DomainError> {
        collection.get(id).await?.ok_or_else(DomainError::not_found)
    }

    /// Fetch a record the subject may read.
    async fn load_readable<T: Document + Protected>(
        &self,
        ctx: &SecurityContext,
        collection: &Arc<dyn Collection<T>>,
        id: Uuid,
    ) -> Result<T, DomainError> {
        let record = Self::load(collection, id).await?;
        if !self.oracle.can_read(ctx, &record).await? {
            return Err(DomainError::Forbidden);
        }
        Ok(record)
    }

    async fn ensure_write(
        &self,
        ctx: &SecurityContext,
        resource: &dyn Protected,
    ) -> Result<(), DomainError> {
        if self.oracle.can_write(ctx, resource).await? {
            Ok(())
        } else {
            tracing::debug!(resource_id = %resource.resource_id(), "write refused");
            Err(DomainError::Forbidden)
        }
    }

    /// Organization a request refers to. A dangling reference is a client error.
    async fn referenced_organization(&self, id: Uuid) -> Result<Organization, DomainError> {
        self.store
            .organizations
            .get(id)
            .await?
            .ok_or_else(|| DomainError::validation("Organization does not exist."))
    }

    /// Whether another record of `collection` in `organization_id` already uses `name`.
    async fn name_taken<T: Document>(
        collection: &Arc<dyn Collection<T>>,
        name: &str,
        organization_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        let filter = Filter::new()
            .equals(Fields::NAME, name)
            .equals(Fields::ORGANIZATION_ID, organization_id);
        let holders = drain(collection.find(&ListQuery::filtered(filter)).await?).await?;
        Ok(holders.iter().any(|d| Some(d.id()) != except))
    }
}

/// Trimmed, non-blank resource name.
fn clean_name(raw: &str) -> Result<String, DomainError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name: This field may not be blank."));
    }
    Ok(name.to_owned())
}

/// Translate a unique-index rejection into the caller-facing message.
fn unique_violation(err: StorageError, message: &str) -> DomainError {
    match err {
        StorageError::Duplicate { .. } => DomainError::validation(message),
        other => other.into(),
    }
}
