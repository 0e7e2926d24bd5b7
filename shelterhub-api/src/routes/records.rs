/// Shelter record endpoints (animals, resources, sheltered people)
///
/// Each family is mounted under its own prefix with the family passed as a
/// request extension:
///
/// ```text
/// GET    /v1/{family}?shelterId=…  READ
/// GET    /v1/{family}/:id          READ   (shelter found from the record)
/// DELETE /v1/{family}/:id          WRITE  (shelter found from the record)
///
/// A record outside the shelter the gate authorized is reported as not
/// found, including when the client names a shelter with `?shelterId=`.
/// POST   /v1/resources             WRITE  JSON, shelterId in the body
/// POST   /v1/sheltered-people      WRITE  JSON, shelterId in the body
/// POST   /v1/animals?shelterId=…   WRITE  multipart/form-data
/// ```
///
/// The animal upload accepts the fields `name`, `details` (a JSON object as
/// text) and an optional `photo` file. Only the photo's name and size are
/// recorded.

use crate::{app::AppState, error::ApiError, error::ApiResult};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shelterhub_shared::auth::gate::Grant;
use shelterhub_shared::models::record::{NewRecord, RecordFamily, ShelterRecord};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    pub shelter_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelterQuery {
    pub shelter_id: Uuid,
}

/// Shelter id the gate resolved for this request
fn resolved_shelter(grant: &Grant) -> ApiResult<Uuid> {
    grant
        .params()
        .and_then(|p| p.shelter_id)
        .ok_or_else(|| ApiError::BadRequest("Shelter id is required".to_string()))
}

/// GET /v1/{family}
pub async fn list_records(
    State(state): State<AppState>,
    Extension(family): Extension<RecordFamily>,
    Extension(grant): Extension<Grant>,
) -> ApiResult<Json<Vec<ShelterRecord>>> {
    let shelter_id = resolved_shelter(&grant)?;
    let records = state.store.list_records(family, shelter_id).await?;
    Ok(Json(records))
}

/// Loads a record, hiding records of shelters other than the authorized one
async fn find_in_shelter(
    state: &AppState,
    family: RecordFamily,
    id: Uuid,
    grant: &Grant,
) -> ApiResult<ShelterRecord> {
    let shelter_id = resolved_shelter(grant)?;
    state
        .store
        .find_record(family, id)
        .await?
        .filter(|record| record.shelter_id == shelter_id)
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))
}

/// GET /v1/{family}/:id
pub async fn get_record(
    State(state): State<AppState>,
    Extension(family): Extension<RecordFamily>,
    Extension(grant): Extension<Grant>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ShelterRecord>> {
    let record = find_in_shelter(&state, family, id, &grant).await?;
    Ok(Json(record))
}

/// DELETE /v1/{family}/:id
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(family): Extension<RecordFamily>,
    Extension(grant): Extension<Grant>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let record = find_in_shelter(&state, family, id, &grant).await?;
    if !state.store.delete_record(family, record.id).await? {
        return Err(ApiError::NotFound("Record not found".to_string()));
    }
    tracing::info!(family = family.table(), record_id = %id, shelter_id = %record.shelter_id, "Record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/resources, POST /v1/sheltered-people
pub async fn create_record(
    State(state): State<AppState>,
    Extension(family): Extension<RecordFamily>,
    Json(req): Json<CreateRecordRequest>,
) -> ApiResult<(StatusCode, Json<ShelterRecord>)> {
    req.validate()?;
    ensure_shelter(&state, req.shelter_id).await?;

    let record = state
        .store
        .create_record(
            family,
            NewRecord {
                shelter_id: req.shelter_id,
                name: req.name,
                details: req.details.unwrap_or_else(|| json!({})),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /v1/animals?shelterId=…
pub async fn create_animal(
    State(state): State<AppState>,
    Query(query): Query<ShelterQuery>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ShelterRecord>)> {
    ensure_shelter(&state, query.shelter_id).await?;

    let mut name: Option<String> = None;
    let mut details = json!({});
    let mut photo: Option<Value> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = Some(field.text().await?),
            "details" => {
                let text = field.text().await?;
                details = serde_json::from_str(&text)
                    .map_err(|e| ApiError::BadRequest(format!("Invalid details JSON: {}", e)))?;
            }
            "photo" => {
                let file_name = field.file_name().map(str::to_string);
                let size = field.bytes().await?.len();
                photo = Some(json!({ "fileName": file_name, "size": size }));
            }
            _ => {
                // drain unknown parts
                field.bytes().await?;
            }
        }
    }

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Field 'name' is required".to_string()))?;

    if let (Some(photo), Some(obj)) = (photo, details.as_object_mut()) {
        obj.insert("photo".to_string(), photo);
    }

    let record = state
        .store
        .create_record(
            RecordFamily::Animals,
            NewRecord {
                shelter_id: query.shelter_id,
                name,
                details,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

async fn ensure_shelter(state: &AppState, shelter_id: Uuid) -> ApiResult<()> {
    state
        .store
        .find_shelter(shelter_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Shelter not found".to_string()))?;
    Ok(())
}
