use automation_sdk::models::{Page, Representation};
use conductor_security::SecurityContext;
use uuid::Uuid;

use super::{ListRequest, Service};
use crate::domain::decorate::Decorate;
use crate::domain::error::DomainError;
use crate::domain::filter;
use crate::domain::repo::Filter;

impl Service {
    #[tracing::instrument(skip(self, ctx, req), fields(path = %req.path))]
    pub async fn list_jobs(
        &self,
        ctx: &SecurityContext,
        req: &ListRequest,
    ) -> Result<Page<Representation>, DomainError> {
        self.list_resource(ctx, &filter::JOBS, &self.store.jobs, req, Filter::new())
            .await
    }

    #[tracing::instrument(skip(self, ctx), fields(job_id = %id))]
    pub async fn get_job(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
    ) -> Result<Representation, DomainError> {
        let job = self.load_readable(ctx, &self.store.jobs, id).await?;
        Ok(job.decorate(&self.decorator).await)
    }
}
