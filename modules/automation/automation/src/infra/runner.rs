//! Local SCM sync runner: a bounded queue drained by a fixed worker pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use automation_sdk::models::{Job, JobStatus, JobType, Project};
use chrono::Utc;
use conductor_security::SecurityContext;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::dispatch::{DispatchError, JobRunner};
use crate::domain::repo::Collection;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("working directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Brings a project's working directory up to date with its source.
#[async_trait]
pub trait ScmCheckout: Send + Sync {
    async fn checkout(&self, project: &Project) -> Result<(), CheckoutError>;
}

/// Prepares `local_path` on the local disk. Fetching from the remote is
/// left to an external agent watching the directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDirectoryCheckout;

#[async_trait]
impl ScmCheckout for LocalDirectoryCheckout {
    async fn checkout(&self, project: &Project) -> Result<(), CheckoutError> {
        let path = Path::new(&project.local_path);
        let io = |source| CheckoutError::Io {
            path: path.to_path_buf(),
            source,
        };
        if project.scm_delete_on_update {
            match tokio::fs::remove_dir_all(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io(e)),
            }
        }
        tokio::fs::create_dir_all(path).await.map_err(io)
    }
}

struct SyncTask {
    job_id: Uuid,
    project: Project,
}

/// [`JobRunner`] backed by in-process tokio workers.
pub struct LocalJobRunner {
    jobs: Arc<dyn Collection<Job>>,
    tx: mpsc::Sender<SyncTask>,
}

/// Collections a sync worker writes its progress to.
#[derive(Clone)]
struct SyncLedger {
    jobs: Arc<dyn Collection<Job>>,
    projects: Arc<dyn Collection<Project>>,
}

impl LocalJobRunner {
    /// Spawn `workers` tasks draining a queue of `capacity` pending syncs.
    /// Workers exit when `cancel` fires or the runner is dropped.
    ///
    /// Each sync records its progress on the job and mirrors it onto the
    /// project's `status`.
    #[must_use]
    pub fn start(
        jobs: Arc<dyn Collection<Job>>,
        projects: Arc<dyn Collection<Project>>,
        checkout: Arc<dyn ScmCheckout>,
        workers: usize,
        capacity: usize,
        cancel: &CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let ledger = SyncLedger {
            jobs: Arc::clone(&jobs),
            projects,
        };
        let handles = (0..workers.max(1))
            .map(|worker| {
                tokio::spawn(work(
                    worker,
                    Arc::clone(&rx),
                    ledger.clone(),
                    Arc::clone(&checkout),
                    cancel.clone(),
                ))
            })
            .collect();
        tracing::info!(workers, capacity, "sync workers started");
        (Self { jobs, tx }, handles)
    }
}

#[async_trait]
impl JobRunner for LocalJobRunner {
    async fn enqueue_sync(
        &self,
        ctx: &SecurityContext,
        project: &Project,
    ) -> Result<Uuid, DispatchError> {
        let permit = self.tx.try_reserve().map_err(|e| match e {
            mpsc::error::TrySendError::Full(()) => {
                DispatchError::Unavailable("sync queue is full".to_owned())
            }
            mpsc::error::TrySendError::Closed(()) => {
                DispatchError::Unavailable("sync workers are stopped".to_owned())
            }
        })?;

        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            name: project.name.clone(),
            job_type: JobType::UpdateJob,
            status: JobStatus::Pending,
            failed: false,
            project_id: project.id,
            organization_id: project.organization_id,
            job_explanation: String::new(),
            created_by: ctx.subject_id(),
            created: now,
            modified: now,
            started: None,
            finished: None,
            roles: project.roles.clone(),
        };
        let job_id = job.id;
        self.jobs.insert(job).await?;

        permit.send(SyncTask {
            job_id,
            project: project.clone(),
        });
        Ok(job_id)
    }
}

async fn work(
    worker: usize,
    rx: Arc<Mutex<mpsc::Receiver<SyncTask>>>,
    ledger: SyncLedger,
    checkout: Arc<dyn ScmCheckout>,
    cancel: CancellationToken,
) {
    loop {
        let task = tokio::select! {
            () = cancel.cancelled() => break,
            task = async { rx.lock().await.recv().await } => task,
        };
        let Some(task) = task else { break };
        run(&ledger, checkout.as_ref(), task).await;
    }
    tracing::debug!(worker, "sync worker stopped");
}

async fn run(ledger: &SyncLedger, checkout: &dyn ScmCheckout, task: SyncTask) {
    let SyncTask { job_id, project } = task;
    let jobs = ledger.jobs.as_ref();
    let mut job = match jobs.get(job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            tracing::warn!(%job_id, "job vanished before it started");
            return;
        }
        Err(e) => {
            tracing::error!(%job_id, error = %e, "failed to load job");
            return;
        }
    };
    if job.status.is_finished() {
        tracing::debug!(%job_id, status = %job.status, "skipping job that already finished");
        return;
    }

    let started = Utc::now();
    job.status = JobStatus::Running;
    job.started = Some(started);
    job.modified = started;
    if let Err(e) = jobs.replace(job.clone()).await {
        tracing::error!(%job_id, error = %e, "failed to mark job running");
        return;
    }
    record_project_status(ledger.projects.as_ref(), project.id, JobStatus::Running).await;

    let outcome = checkout.checkout(&project).await;
    let finished = Utc::now();
    job.finished = Some(finished);
    job.modified = finished;
    match outcome {
        Ok(()) => {
            job.status = JobStatus::Successful;
            tracing::info!(%job_id, project_id = %project.id, "project sync finished");
        }
        Err(e) => {
            job.status = JobStatus::Failed;
            job.failed = true;
            job.job_explanation = e.to_string();
            tracing::warn!(%job_id, project_id = %project.id, error = %e, "project sync failed");
        }
    }
    // Project first, so a finished job always implies an updated project.
    record_project_status(ledger.projects.as_ref(), project.id, job.status).await;
    if let Err(e) = jobs.replace(job).await {
        tracing::error!(%job_id, error = %e, "failed to record job outcome");
    }
}

/// Copy the latest sync status onto the stored project. Reloads the project
/// so edits made while the sync ran are kept.
async fn record_project_status(
    projects: &dyn Collection<Project>,
    project_id: Uuid,
    status: JobStatus,
) {
    let mut project = match projects.get(project_id).await {
        Ok(Some(project)) => project,
        Ok(None) => {
            tracing::debug!(%project_id, "project deleted during sync");
            return;
        }
        Err(e) => {
            tracing::error!(%project_id, error = %e, "failed to load project");
            return;
        }
    };
    status.as_str().clone_into(&mut project.status);
    if let Err(e) = projects.replace(project).await {
        tracing::error!(%project_id, error = %e, "failed to record project status");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use automation_sdk::models::ScmType;
    use conductor_security::{AccessControlEntry, Role};

    use super::*;
    use crate::infra::storage::memory::MemoryCollection;

    fn project(local_path: &Path) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            name: "Site".to_owned(),
            description: String::new(),
            organization_id: Uuid::new_v4(),
            scm_type: ScmType::Git,
            scm_url: "https://example.com/site.git".to_owned(),
            scm_branch: String::new(),
            scm_clean: false,
            scm_delete_on_update: false,
            scm_update_on_launch: false,
            scm_credential_id: None,
            local_path: local_path.display().to_string(),
            status: "new".to_owned(),
            created_by: Uuid::nil(),
            modified_by: Uuid::nil(),
            created: now,
            modified: now,
            roles: vec![AccessControlEntry::user(Uuid::nil(), Role::Admin)],
        }
    }

    /// Blocks every checkout until the test releases it.
    struct GatedCheckout(tokio::sync::Semaphore);

    #[async_trait]
    impl ScmCheckout for GatedCheckout {
        async fn checkout(&self, _project: &Project) -> Result<(), CheckoutError> {
            let _permit = self.0.acquire().await;
            Ok(())
        }
    }

    fn ledger() -> (Arc<MemoryCollection<Job>>, Arc<MemoryCollection<Project>>) {
        (
            Arc::new(MemoryCollection::new()),
            Arc::new(MemoryCollection::new()),
        )
    }

    struct FailingCheckout;

    #[async_trait]
    impl ScmCheckout for FailingCheckout {
        async fn checkout(&self, project: &Project) -> Result<(), CheckoutError> {
            Err(CheckoutError::Io {
                path: PathBuf::from(&project.local_path),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    async fn wait_for_status(jobs: &MemoryCollection<Job>, id: Uuid, status: JobStatus) -> Job {
        for _ in 0..200 {
            if let Some(job) = jobs.get(id).await.unwrap()
                && job.status == status
            {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} never reached {status}");
    }

    #[tokio::test]
    async fn enqueued_job_runs_to_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site");
        let (jobs, projects) = ledger();
        let cancel = CancellationToken::new();
        let (runner, _handles) = LocalJobRunner::start(
            jobs.clone(),
            projects.clone(),
            Arc::new(LocalDirectoryCheckout),
            1,
            4,
            &cancel,
        );
        let p = project(&path);
        projects.insert(p.clone()).await.unwrap();

        let id = runner
            .enqueue_sync(&SecurityContext::anonymous(), &p)
            .await
            .unwrap();

        let job = wait_for_status(&jobs, id, JobStatus::Successful).await;
        assert_eq!(job.job_type, JobType::UpdateJob);
        assert_eq!(job.project_id, p.id);
        assert_eq!(job.roles, p.roles);
        assert!(job.started.is_some() && job.finished.is_some());
        assert!(path.is_dir());
        let stored = projects.get(p.id).await.unwrap().unwrap();
        assert_eq!(stored.status, "successful");
        cancel.cancel();
    }

    #[tokio::test]
    async fn failed_checkout_marks_job_and_project_failed() {
        let dir = tempfile::tempdir().unwrap();
        let (jobs, projects) = ledger();
        let cancel = CancellationToken::new();
        let (runner, _handles) = LocalJobRunner::start(
            jobs.clone(),
            projects.clone(),
            Arc::new(FailingCheckout),
            1,
            4,
            &cancel,
        );
        let p = project(dir.path());
        projects.insert(p.clone()).await.unwrap();

        let id = runner
            .enqueue_sync(&SecurityContext::anonymous(), &p)
            .await
            .unwrap();

        let job = wait_for_status(&jobs, id, JobStatus::Failed).await;
        assert!(job.failed);
        assert!(job.job_explanation.contains("disk full"));
        let stored = projects.get(p.id).await.unwrap().unwrap();
        assert_eq!(stored.status, "failed");
        cancel.cancel();
    }

    #[tokio::test]
    async fn running_sync_is_visible_on_project() {
        let dir = tempfile::tempdir().unwrap();
        let (jobs, projects) = ledger();
        let cancel = CancellationToken::new();
        let gate = Arc::new(GatedCheckout(tokio::sync::Semaphore::new(0)));
        let (runner, _handles) =
            LocalJobRunner::start(jobs.clone(), projects.clone(), gate.clone(), 1, 1, &cancel);
        let p = project(dir.path());
        projects.insert(p.clone()).await.unwrap();

        let id = runner
            .enqueue_sync(&SecurityContext::anonymous(), &p)
            .await
            .unwrap();
        wait_for_status(&jobs, id, JobStatus::Running).await;
        let mut stored = projects.get(p.id).await.unwrap().unwrap();
        for _ in 0..200 {
            if stored.status == "running" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            stored = projects.get(p.id).await.unwrap().unwrap();
        }
        assert_eq!(stored.status, "running");

        gate.0.add_permits(1);
        wait_for_status(&jobs, id, JobStatus::Successful).await;
        cancel.cancel();
    }

    #[tokio::test]
    async fn project_deleted_mid_sync_still_finishes_job() {
        let dir = tempfile::tempdir().unwrap();
        let (jobs, projects) = ledger();
        let p = project(dir.path());
        let job_id = Uuid::new_v4();
        let now = Utc::now();
        jobs.insert(Job {
            id: job_id,
            name: p.name.clone(),
            job_type: JobType::UpdateJob,
            status: JobStatus::Pending,
            failed: false,
            project_id: p.id,
            organization_id: p.organization_id,
            job_explanation: String::new(),
            created_by: Uuid::nil(),
            created: now,
            modified: now,
            started: None,
            finished: None,
            roles: p.roles.clone(),
        })
        .await
        .unwrap();
        let state = SyncLedger {
            jobs: jobs.clone(),
            projects: projects.clone(),
        };

        let task = SyncTask {
            job_id,
            project: p.clone(),
        };
        run(&state, &LocalDirectoryCheckout, task).await;

        let job = jobs.get(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Successful);
        assert!(projects.get(p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn finished_job_is_not_run_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site");
        let (jobs, projects) = ledger();
        let p = project(&path);
        projects.insert(p.clone()).await.unwrap();
        let job_id = Uuid::new_v4();
        let now = Utc::now();
        jobs.insert(Job {
            id: job_id,
            name: p.name.clone(),
            job_type: JobType::UpdateJob,
            status: JobStatus::Canceled,
            failed: false,
            project_id: p.id,
            organization_id: p.organization_id,
            job_explanation: String::new(),
            created_by: Uuid::nil(),
            created: now,
            modified: now,
            started: None,
            finished: Some(now),
            roles: p.roles.clone(),
        })
        .await
        .unwrap();
        let state = SyncLedger {
            jobs: jobs.clone(),
            projects: projects.clone(),
        };

        let task = SyncTask {
            job_id,
            project: p.clone(),
        };
        run(&state, &LocalDirectoryCheckout, task).await;

        let job = jobs.get(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Canceled);
        assert!(job.started.is_none());
        assert!(!path.exists());
        assert_eq!(projects.get(p.id).await.unwrap().unwrap().status, "new");
    }

    #[tokio::test]
    async fn full_queue_is_reported_without_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let (jobs, projects) = ledger();
        let cancel = CancellationToken::new();
        let gate = Arc::new(GatedCheckout(tokio::sync::Semaphore::new(0)));
        let (runner, _handles) =
            LocalJobRunner::start(jobs.clone(), projects, gate.clone(), 1, 1, &cancel);
        let p = project(dir.path());
        let ctx = SecurityContext::anonymous();

        // First task is picked up by the single worker and parks on the gate.
        let first = runner.enqueue_sync(&ctx, &p).await.unwrap();
        wait_for_status(&jobs, first, JobStatus::Running).await;
        runner.enqueue_sync(&ctx, &p).await.unwrap();

        let err = runner.enqueue_sync(&ctx, &p).await.unwrap_err();
        assert!(matches!(err, DispatchError::Unavailable(_)));
        assert_eq!(jobs.len(), 2);

        gate.0.add_permits(2);
        cancel.cancel();
    }

    #[tokio::test]
    async fn stopped_workers_reject_new_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let (jobs, projects) = ledger();
        let cancel = CancellationToken::new();
        let (runner, handles) = LocalJobRunner::start(
            jobs.clone(),
            projects,
            Arc::new(LocalDirectoryCheckout),
            2,
            4,
            &cancel,
        );
        cancel.cancel();
        for h in handles {
            h.await.unwrap();
        }

        let err = runner
            .enqueue_sync(&SecurityContext::anonymous(), &project(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Unavailable(_)));
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_a_dispatch_error() {
        let dir = tempfile::tempdir().unwrap();
        let (jobs, projects) = ledger();
        jobs.fail_writes(true);
        let cancel = CancellationToken::new();
        let (runner, _handles) = LocalJobRunner::start(
            jobs,
            projects,
            Arc::new(LocalDirectoryCheckout),
            1,
            4,
            &cancel,
        );

        let err = runner
            .enqueue_sync(&SecurityContext::anonymous(), &project(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Storage(_)));
        cancel.cancel();
    }

    #[tokio::test]
    async fn delete_on_update_clears_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("stale.yml");
        std::fs::write(&stale, "---").unwrap();
        let mut p = project(dir.path());
        p.scm_delete_on_update = true;

        LocalDirectoryCheckout.checkout(&p).await.unwrap();

        assert!(dir.path().is_dir());
        assert!(!stale.exists());
    }
}
