//! API handlers for GymSlots REST endpoints

pub mod billing;
pub mod clients;
pub mod equipment;
pub mod health;
pub mod openapi;
pub mod reservations;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::principal::PrincipalClaims, AppState};

/// Extractor for the authenticated principal from the JWT bearer token
pub struct AuthenticatedUser(pub PrincipalClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let mut claims = PrincipalClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        // A client login that only carries its email is bound through the catalog
        if !claims.is_staff() && claims.client_id.is_none() && claims.email.is_some() {
            match state.services.catalog.resolve_principal(&claims).await {
                Ok(client) => claims.client_id = Some(client.id),
                Err(AppError::NotFound(_)) => {
                    tracing::debug!("No client matches principal {}", claims.sub);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Current principal
        .route("/me", get(clients::me))
        // Clients
        .route("/clients", get(clients::list_clients))
        .route("/clients", post(clients::create_client))
        .route("/clients/lookup", get(clients::lookup_client))
        .route("/clients/:id", get(clients::get_client))
        .route("/clients/:id", put(clients::update_client))
        .route("/clients/:id", delete(clients::delete_client))
        .route("/clients/:id/reservations", get(reservations::client_reservations))
        .route("/clients/:id/receipts", get(billing::client_receipts))
        // Equipment
        .route("/equipment", get(equipment::list_equipment))
        .route("/equipment", post(equipment::create_equipment))
        .route("/equipment/:id", get(equipment::get_equipment))
        .route("/equipment/:id", put(equipment::update_equipment))
        .route("/equipment/:id", delete(equipment::delete_equipment))
        // Slot calendar
        .route("/slots", get(reservations::list_slots))
        .route("/availability", get(reservations::availability))
        .route("/occupancy/:weekday", get(reservations::occupancy))
        // Reservations
        .route("/reservations", get(reservations::list_reservations))
        .route("/reservations", post(reservations::book))
        .route("/reservations/:id", delete(reservations::cancel))
        // Billing
        .route("/receipts", get(billing::list_receipts))
        .route("/receipts/generate", post(billing::generate_receipts))
        .route("/receipts/pending", get(billing::pending_receipts))
        .route("/receipts/:id/pay", post(billing::pay_receipt))
        .route("/billing/delinquents", get(billing::delinquents))
        .route("/billing/good-standing", get(billing::good_standing))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
