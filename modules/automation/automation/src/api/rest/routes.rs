use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount every automation endpoint under `/v1/`.
///
/// Handlers expect a `SecurityContext` request extension; the host installs
/// it from its authentication middleware.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let router = router
        .route(
            "/v1/organizations/",
            get(handlers::list_organizations).post(handlers::create_organization),
        )
        .route("/v1/organizations/{id}/", get(handlers::get_organization))
        .route(
            "/v1/teams/",
            get(handlers::list_teams).post(handlers::create_team),
        )
        .route("/v1/teams/{id}/", get(handlers::get_team))
        .route(
            "/v1/projects/",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/v1/projects/{id}/",
            get(handlers::get_project)
                .put(handlers::update_project)
                .patch(handlers::patch_project)
                .delete(handlers::delete_project),
        )
        .route("/v1/projects/{id}/teams/", get(handlers::project_teams))
        .route(
            "/v1/projects/{id}/activity_stream/",
            get(handlers::project_activity),
        )
        .route(
            "/v1/projects/{id}/project_updates/",
            get(handlers::project_updates),
        )
        .route(
            "/v1/projects/{id}/playbooks/",
            get(handlers::project_playbooks),
        )
        .route(
            "/v1/projects/{id}/update/",
            get(handlers::project_update_info).post(handlers::trigger_project_update),
        )
        .route(
            "/v1/inventories/",
            get(handlers::list_inventories).post(handlers::create_inventory),
        )
        .route("/v1/inventories/{id}/", get(handlers::get_inventory))
        .route("/v1/jobs/", get(handlers::list_jobs))
        .route("/v1/jobs/{id}/", get(handlers::get_job));

    router.layer(Extension(service))
}
