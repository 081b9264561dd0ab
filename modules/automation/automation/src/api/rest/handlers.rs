use std::sync::Arc;

use automation_sdk::models::{ActivityRecord, Page, Representation};
use automation_sdk::requests::{NewInventory, NewOrganization, NewProject, NewTeam, ProjectPatch};
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, OriginalUri, Path, RawQuery};
use axum::http::StatusCode;
use conductor_security::SecurityContext;
use tracing::field::Empty;
use uuid::Uuid;

use crate::api::rest::dto::{UpdateInfoDto, UpdateLaunchedDto};
use crate::api::rest::error::{ApiError, ApiResult};
use crate::domain::service::{ListRequest, Service};

/// Unparseable ids are indistinguishable from unknown ones.
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found())
}

fn list_request(uri: &OriginalUri, query: Option<&str>) -> ApiResult<ListRequest> {
    let params: Vec<(String, String)> = serde_urlencoded::from_str(query.unwrap_or_default())
        .map_err(|e| ApiError::bad_request(format!("Invalid query string: {e}")))?;
    Ok(ListRequest::new(uri.path(), params))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(v)| v).map_err(ApiError::from)
}

type Created = (StatusCode, Json<Representation>);

// ---- organizations ----

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn list_organizations(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    uri: OriginalUri,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Page<Representation>>> {
    let req = list_request(&uri, query.as_deref())?;
    Ok(Json(svc.list_organizations(&ctx, &req).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn create_organization(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    payload: Result<Json<NewOrganization>, JsonRejection>,
) -> ApiResult<Created> {
    let repr = svc.create_organization(&ctx, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(repr)))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn get_organization(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Representation>> {
    Ok(Json(svc.get_organization(&ctx, parse_id(&id)?).await?))
}

// ---- teams ----

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn list_teams(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    uri: OriginalUri,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Page<Representation>>> {
    let req = list_request(&uri, query.as_deref())?;
    Ok(Json(svc.list_teams(&ctx, &req).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn create_team(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    payload: Result<Json<NewTeam>, JsonRejection>,
) -> ApiResult<Created> {
    let repr = svc.create_team(&ctx, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(repr)))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn get_team(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Representation>> {
    Ok(Json(svc.get_team(&ctx, parse_id(&id)?).await?))
}

// ---- projects ----

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn list_projects(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    uri: OriginalUri,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Page<Representation>>> {
    let req = list_request(&uri, query.as_deref())?;
    Ok(Json(svc.list_projects(&ctx, &req).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn create_project(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<Created> {
    let repr = svc.create_project(&ctx, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(repr)))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn get_project(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Representation>> {
    Ok(Json(svc.get_project(&ctx, parse_id(&id)?).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn update_project(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<Json<Representation>> {
    let id = parse_id(&id)?;
    Ok(Json(svc.update_project(&ctx, id, body(payload)?).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn patch_project(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    payload: Result<Json<ProjectPatch>, JsonRejection>,
) -> ApiResult<Json<Representation>> {
    let id = parse_id(&id)?;
    Ok(Json(svc.patch_project(&ctx, id, body(payload)?).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn delete_project(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    svc.delete_project(&ctx, parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn project_teams(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    uri: OriginalUri,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Page<Representation>>> {
    let id = parse_id(&id)?;
    let req = list_request(&uri, query.as_deref())?;
    Ok(Json(svc.project_teams(&ctx, id, &req).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn project_activity(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    uri: OriginalUri,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Page<ActivityRecord>>> {
    let id = parse_id(&id)?;
    let req = list_request(&uri, query.as_deref())?;
    Ok(Json(svc.project_activity(&ctx, id, &req).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn project_updates(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    uri: OriginalUri,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Page<Representation>>> {
    let id = parse_id(&id)?;
    let req = list_request(&uri, query.as_deref())?;
    Ok(Json(svc.project_updates(&ctx, id, &req).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn project_playbooks(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(svc.project_playbooks(&ctx, parse_id(&id)?).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn project_update_info(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<Json<UpdateInfoDto>> {
    let can_update = svc.project_update_info(&ctx, parse_id(&id)?).await?;
    Ok(Json(UpdateInfoDto { can_update }))
}

/// The body is optional; when present it must be valid JSON.
#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn trigger_project_update(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    raw: Bytes,
) -> ApiResult<(StatusCode, Json<UpdateLaunchedDto>)> {
    let id = parse_id(&id)?;
    if !raw.is_empty() {
        serde_json::from_slice::<serde_json::Value>(&raw)
            .map_err(|e| ApiError::bad_request(format!("Malformed request body: {e}")))?;
    }
    let job_id = svc.trigger_project_update(&ctx, id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(UpdateLaunchedDto {
            project_update: job_id,
        }),
    ))
}

// ---- inventories ----

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn list_inventories(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    uri: OriginalUri,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Page<Representation>>> {
    let req = list_request(&uri, query.as_deref())?;
    Ok(Json(svc.list_inventories(&ctx, &req).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn create_inventory(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    payload: Result<Json<NewInventory>, JsonRejection>,
) -> ApiResult<Created> {
    let repr = svc.create_inventory(&ctx, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(repr)))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn get_inventory(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Representation>> {
    Ok(Json(svc.get_inventory(&ctx, parse_id(&id)?).await?))
}

// ---- jobs ----

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn list_jobs(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    uri: OriginalUri,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Page<Representation>>> {
    let req = list_request(&uri, query.as_deref())?;
    Ok(Json(svc.list_jobs(&ctx, &req).await?))
}

#[tracing::instrument(skip_all, fields(request_id = Empty))]
pub async fn get_job(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Representation>> {
    Ok(Json(svc.get_job(&ctx, parse_id(&id)?).await?))
}
