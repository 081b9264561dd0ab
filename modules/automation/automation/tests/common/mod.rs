#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Shared fixture for HTTP-level tests: a started module over the in-memory
//! store, a seeded organization and admin, and a request helper that injects
//! the caller's `SecurityContext` the way the host's authn middleware does.

use std::sync::Arc;

use async_trait::async_trait;
use automation::config::{SeedOrganization, SeedUser};
use automation::domain::dispatch::{DispatchError, JobRunner};
use automation::infra::storage::memory::MemoryStore;
use automation::seed::seed;
use automation::{AutomationConfig, AutomationModule, SeedConfig};
use automation_sdk::models::Project;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use conductor_security::{Role, SecurityContext};
use http_body_util::BodyExt;
use serde_json::Value;
use static_authz_plugin::AuthZMode;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub mem: MemoryStore,
    pub module: AutomationModule,
    pub org_id: Uuid,
    pub admin: SecurityContext,
    pub projects_home: TempDir,
}

/// Runner that refuses every job, as a saturated queue would.
pub struct RejectingRunner;

#[async_trait]
impl JobRunner for RejectingRunner {
    async fn enqueue_sync(
        &self,
        _ctx: &SecurityContext,
        _project: &Project,
    ) -> Result<Uuid, DispatchError> {
        Err(DispatchError::Unavailable("sync queue is full".to_owned()))
    }
}

pub async fn app() -> TestApp {
    build(None).await
}

pub async fn app_with_runner(runner: Arc<dyn JobRunner>) -> TestApp {
    build(Some(runner)).await
}

async fn build(runner: Option<Arc<dyn JobRunner>>) -> TestApp {
    let mem = MemoryStore::new();
    let admin_id = Uuid::new_v4();
    let org_id = Uuid::new_v4();
    seed(
        &mem.store(),
        &SeedConfig {
            users: vec![SeedUser {
                id: admin_id,
                username: "admin".to_owned(),
                first_name: "Ada".to_owned(),
                last_name: "Lovelace".to_owned(),
                email: "admin@example.com".to_owned(),
            }],
            organizations: vec![SeedOrganization {
                id: org_id,
                name: "Default".to_owned(),
                description: String::new(),
                admins: vec![admin_id],
            }],
        },
    )
    .await
    .unwrap();

    let projects_home = tempfile::tempdir().unwrap();
    let config = AutomationConfig {
        projects_home: projects_home.path().display().to_string(),
        ..AutomationConfig::default()
    };
    let oracle = Arc::new(static_authz_plugin::Service::new(AuthZMode::RoleHierarchy));
    let mut builder = AutomationModule::builder(config, mem.store(), oracle);
    if let Some(runner) = runner {
        builder = builder.runner(runner);
    }
    let module = builder.start().unwrap();

    TestApp {
        router: module.router(),
        mem,
        module,
        org_id,
        admin: SecurityContext::builder()
            .subject_id(admin_id)
            .organization(org_id, Role::Admin)
            .build(),
        projects_home,
    }
}

impl TestApp {
    pub async fn call(
        &self,
        ctx: &SecurityContext,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = body.map_or_else(Body::empty, |v| Body::from(v.to_string()));
        self.send(ctx, method, uri, body).await
    }

    pub async fn send(
        &self,
        ctx: &SecurityContext,
        method: Method,
        uri: &str,
        body: Body,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        req.extensions_mut().insert(ctx.clone());

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, ctx: &SecurityContext, uri: &str) -> (StatusCode, Value) {
        self.call(ctx, Method::GET, uri, None).await
    }

    /// Create a project as the admin and return its id.
    pub async fn create_project(&self, name: &str) -> Uuid {
        let (status, body) = self
            .call(
                &self.admin,
                Method::POST,
                "/v1/projects/",
                Some(serde_json::json!({
                    "name": name,
                    "organization_id": self.org_id,
                    "scm_type": "git",
                    "scm_url": "https://example.com/site.git",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        serde_json::from_value(body["id"].clone()).unwrap()
    }
}

pub fn user(id: Uuid) -> SecurityContext {
    SecurityContext::builder().subject_id(id).build()
}
