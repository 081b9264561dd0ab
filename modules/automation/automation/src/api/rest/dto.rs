use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response of `GET /v1/projects/{id}/update/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInfoDto {
    pub can_update: bool,
}

/// Response of `POST /v1/projects/{id}/update/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLaunchedDto {
    pub project_update: Uuid,
}
