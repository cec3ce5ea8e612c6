//! Repository layer for database operations

pub mod clients;
pub mod equipment;
pub mod receipts;
pub mod reservations;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub clients: clients::ClientsRepository,
    pub equipment: equipment::EquipmentRepository,
    pub reservations: reservations::ReservationsRepository,
    pub receipts: receipts::ReceiptsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            clients: clients::ClientsRepository::new(pool.clone()),
            equipment: equipment::EquipmentRepository::new(pool.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone()),
            receipts: receipts::ReceiptsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database (readiness probe)
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
