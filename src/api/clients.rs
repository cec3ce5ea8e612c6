//! Client API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::client::{Client, ClientLookupQuery, ClientQuery, CreateClient, DeleteQuery, UpdateClient},
    AppState,
};

use super::AuthenticatedUser;

/// Client record of the authenticated principal
#[utoipa::path(
    get,
    path = "/me",
    tag = "clients",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own client record", body = Client),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Principal not linked to a client")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Client>> {
    let client = state.services.catalog.resolve_principal(&claims).await?;
    Ok(Json(client))
}

/// List clients
#[utoipa::path(
    get,
    path = "/clients",
    tag = "clients",
    security(("bearer_auth" = [])),
    params(ClientQuery),
    responses(
        (status = 200, description = "Clients ordered by surname then name", body = Vec<Client>),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn list_clients(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ClientQuery>,
) -> AppResult<Json<Vec<Client>>> {
    claims.require_staff()?;
    let clients = state
        .services
        .catalog
        .list_clients(query.active_only.unwrap_or(true))
        .await?;
    Ok(Json(clients))
}

/// Find a client by national ID or email
#[utoipa::path(
    get,
    path = "/clients/lookup",
    tag = "clients",
    security(("bearer_auth" = [])),
    params(ClientLookupQuery),
    responses(
        (status = 200, description = "Matching client", body = Client),
        (status = 400, description = "Neither or both keys given"),
        (status = 404, description = "No such client")
    )
)]
pub async fn lookup_client(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ClientLookupQuery>,
) -> AppResult<Json<Client>> {
    claims.require_staff()?;
    let client = match (query.national_id, query.email) {
        (Some(national_id), None) => state.services.catalog.find_by_national_id(&national_id).await?,
        (None, Some(email)) => state.services.catalog.find_by_email(&email).await?,
        _ => {
            return Err(AppError::BadRequest(
                "Exactly one of national_id or email is required".to_string(),
            ))
        }
    };
    Ok(Json(client))
}

/// Get client by ID
#[utoipa::path(
    get,
    path = "/clients/{id}",
    tag = "clients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client details", body = Client),
        (status = 404, description = "Client not found")
    )
)]
pub async fn get_client(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Client>> {
    claims.require_client_access(id)?;
    let client = state.services.catalog.get_client(id).await?;
    Ok(Json(client))
}

/// Register a new client
#[utoipa::path(
    post,
    path = "/clients",
    tag = "clients",
    security(("bearer_auth" = [])),
    request_body = CreateClient,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "National ID or email already registered")
    )
)]
pub async fn create_client(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateClient>,
) -> AppResult<(StatusCode, Json<Client>)> {
    claims.require_staff()?;
    data.validate()?;
    let client = state.services.catalog.create_client(data).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// Update a client (set `active` to true to reactivate)
#[utoipa::path(
    put,
    path = "/clients/{id}",
    tag = "clients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Client ID")),
    request_body = UpdateClient,
    responses(
        (status = 200, description = "Client updated", body = Client),
        (status = 404, description = "Client not found"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_client(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateClient>,
) -> AppResult<Json<Client>> {
    claims.require_staff()?;
    data.validate()?;
    let client = state.services.catalog.update_client(id, data).await?;
    Ok(Json(client))
}

/// Deactivate a client, or delete it with `hard=true`
#[utoipa::path(
    delete,
    path = "/clients/{id}",
    tag = "clients",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Client ID"),
        DeleteQuery
    ),
    responses(
        (status = 204, description = "Client deactivated or deleted"),
        (status = 404, description = "Client not found")
    )
)]
pub async fn delete_client(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(params): Query<DeleteQuery>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    if params.hard.unwrap_or(false) {
        state.services.catalog.delete_client(id).await?;
    } else {
        state.services.catalog.deactivate_client(id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
