#![allow(clippy::unwrap_used, clippy::expect_used)]

//! HTTP behaviour of the project endpoints.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use common::{RejectingRunner, app, app_with_runner, user};

#[tokio::test]
async fn create_returns_decorated_project() {
    let app = app().await;

    let (status, body) = app
        .call(
            &app.admin,
            Method::POST,
            "/v1/projects/",
            Some(json!({
                "name": "Site",
                "organization_id": app.org_id,
                "scm_type": "git",
                "scm_url": "https://example.com/site.git",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["id"].as_str().unwrap();
    assert_eq!(body["type"], "project");
    assert_eq!(body["url"], format!("/v1/projects/{id}/"));
    assert_eq!(
        body["related"]["organization"],
        format!("/v1/organizations/{}/", app.org_id)
    );
    assert_eq!(body["related"]["update"], format!("/v1/projects/{id}/update/"));
    assert_eq!(body["summary_fields"]["created_by"]["username"], "admin");
    assert_eq!(body["summary_fields"]["organization"]["name"], "Default");

    let (status, fetched) = app.get(&app.admin, &format!("/v1/projects/{id}/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Site");
}

#[tokio::test]
async fn duplicate_name_is_a_validation_error() {
    let app = app().await;
    app.create_project("Site").await;

    let (status, body) = app
        .call(
            &app.admin,
            Method::POST,
            "/v1/projects/",
            Some(json!({ "name": "Site", "organization_id": app.org_id })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "code": 400,
            "messages": ["Project with this Name and Organization already exists."],
        })
    );
}

#[tokio::test]
async fn unknown_organization_is_a_validation_error() {
    let app = app().await;

    let (status, body) = app
        .call(
            &app.admin,
            Method::POST,
            "/v1/projects/",
            Some(json!({ "name": "Site", "organization_id": Uuid::new_v4() })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["messages"], json!(["Organization does not exist."]));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = app().await;

    let (status, body) = app
        .send(
            &app.admin,
            Method::POST,
            "/v1/projects/",
            Body::from("{\"name\": "),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_and_unparseable_ids_are_not_found() {
    let app = app().await;

    for uri in [
        format!("/v1/projects/{}/", Uuid::new_v4()),
        "/v1/projects/not-a-uuid/".to_owned(),
        format!("/v1/projects/{}/playbooks/", Uuid::new_v4()),
    ] {
        let (status, body) = app.get(&app.admin, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({ "code": 404, "messages": ["Not Found"] }));
    }
}

#[tokio::test]
async fn outsider_cannot_read_project() {
    let app = app().await;
    let id = app.create_project("Site").await;

    let (status, body) = app
        .get(&user(Uuid::new_v4()), &format!("/v1/projects/{id}/"))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 403);
}

#[tokio::test]
async fn rejected_sync_does_not_fail_create() {
    let app = app_with_runner(Arc::new(RejectingRunner)).await;
    let id = app.create_project("Site").await;

    let (status, _) = app.get(&app.admin, &format!("/v1/projects/{id}/")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(
            &app.admin,
            Method::POST,
            &format!("/v1/projects/{id}/update/"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        json!({ "code": 503, "messages": ["sync queue is full"] })
    );
}

#[tokio::test]
async fn trigger_launches_update_job() {
    let app = app().await;
    let id = app.create_project("Site").await;

    let (status, info) = app
        .get(&app.admin, &format!("/v1/projects/{id}/update/"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info, json!({ "can_update": true }));

    let (status, body) = app
        .call(
            &app.admin,
            Method::POST,
            &format!("/v1/projects/{id}/update/"),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    let job = body["project_update"].as_str().unwrap();

    let (status, fetched) = app.get(&app.admin, &format!("/v1/jobs/{job}/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["job_type"], "update_job");
    assert_eq!(fetched["project_id"], id.to_string());
}

#[tokio::test]
async fn trigger_rejects_malformed_body() {
    let app = app().await;
    let id = app.create_project("Site").await;

    let (status, body) = app
        .send(
            &app.admin,
            Method::POST,
            &format!("/v1/projects/{id}/update/"),
            Body::from("not json"),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["messages"][0]
            .as_str()
            .unwrap()
            .starts_with("Malformed request body")
    );
}

#[tokio::test]
async fn member_cannot_trigger_update() {
    let app = app().await;
    let id = app.create_project("Site").await;
    let member = conductor_security::SecurityContext::builder()
        .subject_id(Uuid::new_v4())
        .organization(app.org_id, conductor_security::Role::Member)
        .build();

    let (status, _) = app.get(&member, &format!("/v1/projects/{id}/")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            &member,
            Method::POST,
            &format!("/v1/projects/{id}/update/"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn patch_renames_and_put_replaces() {
    let app = app().await;
    let id = app.create_project("Site").await;
    let uri = format!("/v1/projects/{id}/");

    let (status, body) = app
        .call(&app.admin, Method::PATCH, &uri, Some(json!({ "name": "Web" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Web");
    assert_eq!(body["scm_url"], "https://example.com/site.git");

    let (status, body) = app
        .call(
            &app.admin,
            Method::PUT,
            &uri,
            Some(json!({
                "name": "Web",
                "organization_id": app.org_id,
                "scm_type": "manual",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["scm_type"], "manual");
    assert_eq!(body["scm_url"], "");
}

#[tokio::test]
async fn delete_removes_project_and_its_jobs() {
    let app = app().await;
    let id = app.create_project("Site").await;
    let uri = format!("/v1/projects/{id}/");

    let (status, body) = app.call(&app.admin, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);

    let (status, _) = app.get(&app.admin, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, jobs) = app
        .get(&app.admin, &format!("/v1/jobs/?project={id}"))
        .await;
    assert_eq!(jobs["count"], 0);
}

#[tokio::test]
async fn failed_cascade_keeps_project() {
    let app = app().await;
    let id = app.create_project("Site").await;
    let uri = format!("/v1/projects/{id}/");
    app.mem.job_templates.fail_delete_many(true);

    let (status, body) = app.call(&app.admin, Method::DELETE, &uri, None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "code": 500, "messages": ["Internal server error"] })
    );
    let (status, _) = app.get(&app.admin, &uri).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn playbooks_lists_yaml_files_in_checkout() {
    let app = app().await;
    let id = app.create_project("Site").await;
    let dir = app.projects_home.path().join(id.to_string());
    std::fs::create_dir_all(dir.join("roles")).unwrap();
    std::fs::write(dir.join("site.yml"), "---\n").unwrap();
    std::fs::write(dir.join("roles/web.yaml"), "---\n").unwrap();
    std::fs::write(dir.join("README.md"), "docs\n").unwrap();

    let (status, body) = app
        .get(&app.admin, &format!("/v1/projects/{id}/playbooks/"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["roles/web.yaml", "site.yml"]));
}

#[tokio::test]
async fn sync_job_finishes_and_is_listed_under_project() {
    let app = app().await;
    let id = app.create_project("Site").await;
    let uri = format!("/v1/projects/{id}/project_updates/");

    let mut status_seen = String::new();
    for _ in 0..50 {
        let (_, page) = app.get(&app.admin, &uri).await;
        assert_eq!(page["count"], 1);
        status_seen = page["results"][0]["status"].as_str().unwrap().to_owned();
        if status_seen == "successful" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(status_seen, "successful");
    assert!(app.projects_home.path().join(id.to_string()).is_dir());
}

#[tokio::test]
async fn sync_outcome_is_recorded_on_project_and_filterable() {
    let app = app().await;
    let id = app.create_project("Site").await;
    let uri = format!("/v1/projects/{id}/");

    let mut project = Value::Null;
    for _ in 0..50 {
        (_, project) = app.get(&app.admin, &uri).await;
        if project["status"] == "successful" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(project["status"], "successful");

    let (status, page) = app.get(&app.admin, "/v1/projects/?status=successful").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["id"], id.to_string());

    let (_, page) = app.get(&app.admin, "/v1/projects/?status=new").await;
    assert_eq!(page["count"], 0);
}

#[tokio::test]
async fn activity_stream_records_creation() {
    let app = app().await;
    let id = app.create_project("Site").await;

    let (status, page) = app
        .get(&app.admin, &format!("/v1/projects/{id}/activity_stream/"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["description"], "Project Site created");
    assert_eq!(page["results"][0]["object_id"], id.to_string());
}
