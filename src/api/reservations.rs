//! Slot calendar and reservation API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::reservation::{
        Availability, AvailabilityQuery, BookReservation, OccupancyGrid, Reservation,
        ReservationDetails, ReservationQuery,
    },
    AppState,
};

use super::AuthenticatedUser;

/// The 48 half-hour slot labels of an opening day
#[utoipa::path(
    get,
    path = "/slots",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Slot start labels, 00:00 to 23:30", body = Vec<String>)
    )
)]
pub async fn list_slots(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> Json<Vec<String>> {
    let labels = state
        .services
        .calendar
        .slots()
        .into_iter()
        .map(|s| s.label().to_string())
        .collect();
    Json(labels)
}

/// Is one equipment slot free on a weekday
#[utoipa::path(
    get,
    path = "/availability",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Slot availability", body = Availability),
        (status = 400, description = "Invalid weekday or slot label")
    )
)]
pub async fn availability(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<Availability>> {
    let availability = state
        .services
        .calendar
        .is_free(query.equipment_id, query.weekday, &query.start)
        .await?;
    Ok(Json(availability))
}

/// Occupancy grid of a weekday: every active equipment crossed with the 48 slots
#[utoipa::path(
    get,
    path = "/occupancy/{weekday}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("weekday" = i16, Path, description = "1 = Monday .. 5 = Friday")),
    responses(
        (status = 200, description = "Occupancy grid", body = OccupancyGrid),
        (status = 400, description = "Weekday outside Monday..Friday")
    )
)]
pub async fn occupancy(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(weekday): Path<i16>,
) -> AppResult<Json<OccupancyGrid>> {
    let grid = state.services.calendar.occupancy_grid(weekday).await?;
    if claims.is_staff() {
        return Ok(Json(grid));
    }
    let own = claims.target_client(None)?;
    Ok(Json(grid.redact_for(own)))
}

/// Reservations of a weekday
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(ReservationQuery),
    responses(
        (status = 200, description = "Reservations ordered by equipment then start", body = Vec<ReservationDetails>),
        (status = 400, description = "Weekday outside Monday..Friday"),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReservationQuery>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    claims.require_staff()?;
    let reservations = state.services.reservations.list_by_day(query.weekday).await?;
    Ok(Json(reservations))
}

/// Standing reservations of one client
#[utoipa::path(
    get,
    path = "/clients/{id}/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Reservations ordered by weekday then start", body = Vec<ReservationDetails>),
        (status = 404, description = "Client not found")
    )
)]
pub async fn client_reservations(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    claims.require_client_access(id)?;
    let reservations = state.services.reservations.list_by_client(id).await?;
    Ok(Json(reservations))
}

/// Book one or more slots, all or nothing
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = BookReservation,
    responses(
        (status = 201, description = "Reservations created", body = Vec<Reservation>),
        (status = 400, description = "Invalid weekday or slot label"),
        (status = 409, description = "Slots already taken", body = crate::error::ErrorResponse),
        (status = 422, description = "Unknown or inactive client or equipment")
    )
)]
pub async fn book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BookReservation>,
) -> AppResult<(StatusCode, Json<Vec<Reservation>>)> {
    let client_id = claims.target_client(request.client_id)?;
    let created = state
        .services
        .reservations
        .book(client_id, request.equipment_id, request.weekday, &request.starts)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Cancel a reservation; the slot is free again immediately
#[utoipa::path(
    delete,
    path = "/reservations/{id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 204, description = "Reservation cancelled"),
        (status = 403, description = "Not the holder of the reservation"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn cancel(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    if !claims.is_staff() {
        let reservation = state.services.reservations.get(id).await?;
        claims
            .require_client_access(reservation.client_id)
            .map_err(|_| AppError::Authorization("Reservation belongs to another client".to_string()))?;
    }
    state.services.reservations.cancel(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
