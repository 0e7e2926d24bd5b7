/// Shelter endpoints
///
/// ```text
/// POST /v1/shelters                  create a shelter; the caller becomes owner
/// GET  /v1/shelters/:shelterId/role  the caller's role in the shelter
/// ```

use crate::{app::AppState, error::ApiError, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shelterhub_shared::auth::middleware::AuthContext;
use shelterhub_shared::auth::permissions::PermissionResolver;
use shelterhub_shared::models::user_shelter::ShelterRole;
use shelterhub_shared::modules::provisioning::{self, NewShelter, ProvisionedShelter};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateShelterRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub shelter_id: Uuid,
    pub role: Option<ShelterRole>,
    pub is_owner: bool,
    pub is_admin: bool,
}

/// POST /v1/shelters
pub async fn create_shelter(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateShelterRequest>,
) -> ApiResult<(StatusCode, Json<ProvisionedShelter>)> {
    req.validate()?;

    state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let shelter = provisioning::create_shelter(
        state.store.as_ref(),
        auth.user_id,
        NewShelter {
            name: req.name.trim().to_string(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(shelter)))
}

/// GET /v1/shelters/:shelterId/role
pub async fn get_role(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(shelter_id): Path<Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    let store = state.store.as_ref();
    store
        .find_shelter(shelter_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Shelter not found".to_string()))?;

    let resolver = PermissionResolver::new(store);
    let role = resolver
        .get_user_role_in_shelter(auth.user_id, shelter_id)
        .await?;

    Ok(Json(RoleResponse {
        shelter_id,
        role,
        is_owner: resolver.is_owner_of_shelter(auth.user_id, shelter_id).await?,
        is_admin: resolver.is_admin_in_shelter(auth.user_id, shelter_id).await?,
    }))
}
