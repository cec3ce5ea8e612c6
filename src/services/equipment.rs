//! Equipment service

use crate::{
    error::AppResult,
    models::equipment::{CreateEquipment, Equipment, UpdateEquipment},
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, active_only: bool) -> AppResult<Vec<Equipment>> {
        self.repository.equipment.list(active_only).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        self.repository.equipment.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let equipment = self.repository.equipment.create(data).await?;
        tracing::info!("Added equipment {} '{}'", equipment.id, equipment.name);
        Ok(equipment)
    }

    pub async fn update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        self.repository.equipment.update(id, data).await
    }

    /// Retire equipment: it leaves the occupancy grid and takes no new bookings
    pub async fn deactivate(&self, id: i32) -> AppResult<Equipment> {
        let equipment = self.repository.equipment.deactivate(id).await?;
        tracing::info!("Equipment {} retired", id);
        Ok(equipment)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.equipment.delete(id).await?;
        tracing::info!("Equipment {} permanently deleted with its reservations", id);
        Ok(())
    }
}
