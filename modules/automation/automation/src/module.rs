use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use authz_oracle_sdk::AuthorizationOracle;
use axum::Router;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::rest::routes;
use crate::config::AutomationConfig;
use crate::domain::dispatch::{JobRunner, WorkspaceCleanup};
use crate::domain::filter;
use crate::domain::repo::Store;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::cleanup::CleanupQueue;
use crate::infra::runner::{LocalDirectoryCheckout, LocalJobRunner, ScmCheckout};

/// Running automation module: the service plus its background workers.
pub struct AutomationModule {
    service: Arc<Service>,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

/// Wiring for [`AutomationModule`]. Collaborators that are not injected get
/// the local implementations.
pub struct AutomationModuleBuilder {
    config: AutomationConfig,
    store: Store,
    oracle: Arc<dyn AuthorizationOracle>,
    runner: Option<Arc<dyn JobRunner>>,
    checkout: Option<Arc<dyn ScmCheckout>>,
    cleanup: Option<Arc<dyn WorkspaceCleanup>>,
    cancel: Option<CancellationToken>,
}

impl AutomationModule {
    pub fn builder(
        config: AutomationConfig,
        store: Store,
        oracle: Arc<dyn AuthorizationOracle>,
    ) -> AutomationModuleBuilder {
        AutomationModuleBuilder {
            config,
            store,
            oracle,
            runner: None,
            checkout: None,
            cleanup: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn service(&self) -> Arc<Service> {
        Arc::clone(&self.service)
    }

    /// Router with every automation endpoint mounted.
    #[must_use]
    pub fn router(&self) -> Router {
        routes::register_routes(Router::new(), self.service())
    }

    /// Stop the background workers and wait for them to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.workers {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "automation worker ended abnormally");
            }
        }
        info!("automation module stopped");
    }
}

impl AutomationModuleBuilder {
    #[must_use]
    pub fn runner(mut self, runner: Arc<dyn JobRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    #[must_use]
    pub fn checkout(mut self, checkout: Arc<dyn ScmCheckout>) -> Self {
        self.checkout = Some(checkout);
        self
    }

    #[must_use]
    pub fn cleanup(mut self, cleanup: Arc<dyn WorkspaceCleanup>) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Share the host's shutdown token instead of a private one.
    #[must_use]
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Validate configuration and filter tables, then spawn the workers.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Fails when the configuration or a filter table is invalid.
    pub fn start(self) -> anyhow::Result<AutomationModule> {
        info!("Initializing automation module");

        self.config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid automation config: {e}"))?;
        for spec in filter::ALL {
            spec.validate()
                .with_context(|| format!("invalid filter table '{}'", spec.resource))?;
        }

        let cancel = self.cancel.unwrap_or_default();
        let mut workers = Vec::new();

        let runner = if let Some(runner) = self.runner {
            runner
        } else {
            let checkout = self
                .checkout
                .unwrap_or_else(|| Arc::new(LocalDirectoryCheckout) as Arc<dyn ScmCheckout>);
            let (runner, handles) = LocalJobRunner::start(
                Arc::clone(&self.store.jobs),
                Arc::clone(&self.store.projects),
                checkout,
                self.config.sync_workers,
                self.config.sync_queue_capacity,
                &cancel,
            );
            workers.extend(handles);
            Arc::new(runner) as Arc<dyn JobRunner>
        };

        let cleanup = if let Some(cleanup) = self.cleanup {
            cleanup
        } else {
            let (queue, handle) = CleanupQueue::start(self.config.cleanup_queue_capacity, &cancel);
            workers.push(handle);
            Arc::new(queue) as Arc<dyn WorkspaceCleanup>
        };

        let service = Arc::new(Service::new(
            self.store,
            self.oracle,
            runner,
            cleanup,
            ServiceConfig {
                limits: self.config.page_limits(),
                projects_home: PathBuf::from(&self.config.projects_home),
            },
        ));

        info!(
            projects_home = %self.config.projects_home,
            workers = workers.len(),
            "automation module started"
        );
        Ok(AutomationModule {
            service,
            cancel,
            workers,
        })
    }
}
