//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{billing, clients, equipment, health, reservations};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GymSlots API",
        version = "1.0.0",
        description = "Weekly equipment slot reservations and monthly billing for a small gym"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Clients
        clients::me,
        clients::list_clients,
        clients::lookup_client,
        clients::get_client,
        clients::create_client,
        clients::update_client,
        clients::delete_client,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Reservations
        reservations::list_slots,
        reservations::availability,
        reservations::occupancy,
        reservations::list_reservations,
        reservations::client_reservations,
        reservations::book,
        reservations::cancel,
        // Billing
        billing::list_receipts,
        billing::generate_receipts,
        billing::pay_receipt,
        billing::pending_receipts,
        billing::client_receipts,
        billing::delinquents,
        billing::good_standing,
    ),
    components(
        schemas(
            // Clients
            crate::models::client::Client,
            crate::models::client::CreateClient,
            crate::models::client::UpdateClient,
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::EquipmentCategory,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::BookReservation,
            crate::models::reservation::Availability,
            crate::models::reservation::OccupancyGrid,
            crate::models::reservation::EquipmentOccupancy,
            crate::models::reservation::SlotOccupancy,
            // Billing
            crate::models::receipt::Receipt,
            crate::models::receipt::ReceiptDetails,
            crate::models::receipt::Delinquent,
            crate::models::receipt::GenerateReceipts,
            crate::models::receipt::GenerationSummary,
            crate::models::receipt::PaymentOutcome,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "clients", description = "Client registry"),
        (name = "equipment", description = "Equipment catalog"),
        (name = "reservations", description = "Weekly slot calendar and bookings"),
        (name = "billing", description = "Monthly receipts and payment standing")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
