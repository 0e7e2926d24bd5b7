/// Volunteer endpoints
///
/// ```text
/// POST /v1/shelters/:shelterId/volunteers  WRITE in volunteers
/// GET  /v1/volunteers/:id                  READ in volunteers (shelter found from the volunteer)
/// ```
///
/// Enrolling is a write in the `volunteers` module, so besides owners and
/// admins it is open to volunteers responsible for any module of the
/// shelter (they are kept associated with the `volunteers` module).

use crate::{app::AppState, error::ApiError, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use shelterhub_shared::auth::gate::Grant;
use shelterhub_shared::models::volunteer::Volunteer;
use shelterhub_shared::modules::provisioning;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollVolunteerRequest {
    pub user_id: Uuid,
}

/// POST /v1/shelters/:shelterId/volunteers
pub async fn enroll_volunteer(
    State(state): State<AppState>,
    Path(shelter_id): Path<Uuid>,
    Json(req): Json<EnrollVolunteerRequest>,
) -> ApiResult<(StatusCode, Json<Volunteer>)> {
    let volunteer =
        provisioning::enroll_volunteer(state.store.as_ref(), shelter_id, req.user_id).await?;
    Ok((StatusCode::CREATED, Json(volunteer)))
}

/// GET /v1/volunteers/:id
///
/// Volunteers of other shelters than the authorized one are not found.
pub async fn get_volunteer(
    State(state): State<AppState>,
    Extension(grant): Extension<Grant>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Volunteer>> {
    let shelter_id = grant.params().and_then(|p| p.shelter_id);
    let volunteer = state
        .store
        .find_volunteer(id)
        .await?
        .filter(|v| Some(v.shelter_id) == shelter_id)
        .ok_or_else(|| ApiError::NotFound("Volunteer not found".to_string()))?;
    Ok(Json(volunteer))
}
