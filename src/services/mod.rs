//! Business logic services

pub mod billing;
pub mod calendar;
pub mod catalog;
pub mod equipment;
pub mod reservations;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub catalog: catalog::CatalogService,
    pub equipment: equipment::EquipmentService,
    pub calendar: calendar::CalendarService,
    pub reservations: reservations::ReservationsService,
    pub billing: billing::BillingService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), config.clients.clone()),
            equipment: equipment::EquipmentService::new(repository.clone()),
            calendar: calendar::CalendarService::new(repository.clone()),
            reservations: reservations::ReservationsService::new(repository.clone()),
            billing: billing::BillingService::new(repository.clone(), config.billing.clone()),
            repository,
        }
    }
}
