//! Equipment API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        client::DeleteQuery,
        equipment::{CreateEquipment, Equipment, EquipmentQuery, UpdateEquipment},
    },
    AppState,
};

use super::AuthenticatedUser;

/// List equipment
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(EquipmentQuery),
    responses(
        (status = 200, description = "Equipment ordered by category then name", body = Vec<Equipment>)
    )
)]
pub async fn list_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<EquipmentQuery>,
) -> AppResult<Json<Vec<Equipment>>> {
    // Clients only ever see bookable equipment
    let active_only = !claims.is_staff() || query.active_only.unwrap_or(true);
    let equipment = state.services.equipment.list(active_only).await?;
    Ok(Json(equipment))
}

/// Get equipment by ID
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment details", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn get_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Equipment>> {
    let equipment = state.services.equipment.get_by_id(id).await?;
    Ok(Json(equipment))
}

/// Create equipment
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = CreateEquipment,
    responses(
        (status = 201, description = "Equipment created", body = Equipment),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateEquipment>,
) -> AppResult<(StatusCode, Json<Equipment>)> {
    claims.require_staff()?;
    data.validate()?;
    let equipment = state.services.equipment.create(&data).await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// Update equipment
#[utoipa::path(
    put,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    request_body = UpdateEquipment,
    responses(
        (status = 200, description = "Equipment updated", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn update_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateEquipment>,
) -> AppResult<Json<Equipment>> {
    claims.require_staff()?;
    data.validate()?;
    let equipment = state.services.equipment.update(id, &data).await?;
    Ok(Json(equipment))
}

/// Retire equipment, or delete it with `hard=true`
#[utoipa::path(
    delete,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Equipment ID"),
        DeleteQuery
    ),
    responses(
        (status = 204, description = "Equipment retired or deleted"),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn delete_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(params): Query<DeleteQuery>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    if params.hard.unwrap_or(false) {
        state.services.equipment.delete(id).await?;
    } else {
        state.services.equipment.deactivate(id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
