//! Best-effort background work triggered by project mutations.
//!
//! Both ports are no-wait: `enqueue_sync` returns as soon as the job is
//! queued or rejected, and `WorkspaceCleanup::submit` never blocks.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use automation_sdk::models::Project;
use conductor_security::SecurityContext;
use thiserror::Error;
use uuid::Uuid;

use super::repo::StorageError;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The runner cannot accept work right now (queue full or stopped).
    #[error("job runner unavailable: {0}")]
    Unavailable(String),

    #[error("job record could not be stored: {0}")]
    Storage(#[from] StorageError),
}

/// Executes SCM synchronization jobs out of band.
///
/// The runner creates the `Job` document and is its sole writer afterwards.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Queue a sync of `project` and return the new job id without waiting
    /// for execution.
    ///
    /// # Errors
    /// Returns [`DispatchError`] when the job cannot be queued.
    async fn enqueue_sync(
        &self,
        ctx: &SecurityContext,
        project: &Project,
    ) -> Result<Uuid, DispatchError>;
}

/// Removes project working directories after the record is gone.
pub trait WorkspaceCleanup: Send + Sync {
    /// Hand `path` to the background worker. Never blocks; a rejected task
    /// is logged and dropped.
    fn submit(&self, path: PathBuf);
}

/// Issues exactly one sync per successful project mutation.
#[derive(Clone)]
pub struct SyncDispatcher {
    runner: Arc<dyn JobRunner>,
}

impl SyncDispatcher {
    #[must_use]
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self { runner }
    }

    /// Fire-and-forget dispatch after a mutation. Failures are logged and
    /// reported as `None`; the caller's operation still succeeds.
    pub async fn dispatch(&self, ctx: &SecurityContext, project: &Project) -> Option<Uuid> {
        match self.runner.enqueue_sync(ctx, project).await {
            Ok(job_id) => {
                tracing::info!(project_id = %project.id, %job_id, "project sync queued");
                Some(job_id)
            }
            Err(e) => {
                tracing::error!(project_id = %project.id, error = %e, "project sync dispatch failed");
                None
            }
        }
    }

    /// Explicit sync request whose caller wants to see the failure.
    ///
    /// # Errors
    /// Returns the runner's [`DispatchError`] unchanged.
    pub async fn trigger(
        &self,
        ctx: &SecurityContext,
        project: &Project,
    ) -> Result<Uuid, DispatchError> {
        let job_id = self.runner.enqueue_sync(ctx, project).await?;
        tracing::info!(project_id = %project.id, %job_id, "project sync requested");
        Ok(job_id)
    }
}
