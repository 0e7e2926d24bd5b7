/// Shelter module endpoints
///
/// ```text
/// GET   /v1/shelters/:shelterId/modules             READ
/// GET   /v1/shelters/:shelterId/modules/:id         READ
/// PATCH /v1/shelters/:shelterId/modules/:id         MANAGE
/// PATCH /v1/shelters/:shelterId/modules/:id/toggle  shelter admin
/// ```
///
/// The PATCH body is a partial update; absent fields are left alone, and
/// `responsibleVolunteerId: null` or `""` clears the responsible volunteer:
///
/// ```json
/// {
///   "active": true,
///   "responsibleVolunteerId": "5f0c…",
///   "associatedVolunteerIds": ["5f0c…", "9a41…"]
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use shelterhub_shared::modules::coordinator::{self, ModuleDetails, ModulePatch};
use uuid::Uuid;

/// GET /v1/shelters/:shelterId/modules
pub async fn list_modules(
    State(state): State<AppState>,
    Path(shelter_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ModuleDetails>>> {
    let modules = coordinator::list_modules(state.store.as_ref(), shelter_id).await?;
    Ok(Json(modules))
}

/// GET /v1/shelters/:shelterId/modules/:id
pub async fn get_module(
    State(state): State<AppState>,
    Path((shelter_id, module_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ModuleDetails>> {
    let module = coordinator::load_module(state.store.as_ref(), shelter_id, module_id).await?;
    Ok(Json(module))
}

/// PATCH /v1/shelters/:shelterId/modules/:id
pub async fn update_module(
    State(state): State<AppState>,
    Path((shelter_id, module_id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<ModulePatch>,
) -> ApiResult<Json<ModuleDetails>> {
    let module =
        coordinator::apply_module_update(state.store.as_ref(), shelter_id, module_id, patch)
            .await?;
    tracing::info!(%shelter_id, %module_id, "Module updated");
    Ok(Json(module))
}

/// PATCH /v1/shelters/:shelterId/modules/:id/toggle
pub async fn toggle_module(
    State(state): State<AppState>,
    Path((shelter_id, module_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ModuleDetails>> {
    let module =
        coordinator::toggle_module_active(state.store.as_ref(), shelter_id, module_id).await?;
    Ok(Json(module))
}
