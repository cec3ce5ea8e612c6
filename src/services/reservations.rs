//! Reservation service: batch booking and cancellation

use std::collections::BTreeSet;

use crate::{
    error::{AppError, AppResult},
    models::{
        reservation::{Reservation, ReservationDetails},
        slot::{SlotTime, Weekday},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
}

impl ReservationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, id: i32) -> AppResult<Reservation> {
        self.repository.reservations.get_by_id(id).await
    }

    /// Book a set of slots for one client on one equipment and weekday.
    ///
    /// All slots are created or none: a single taken slot rejects the batch
    /// with every conflicting label listed.
    pub async fn book(
        &self,
        client_id: i32,
        equipment_id: i32,
        weekday: i16,
        starts: &[String],
    ) -> AppResult<Vec<Reservation>> {
        let weekday = Weekday::try_from(weekday)?;
        let slots = parse_slot_batch(starts)?;

        let created = self
            .repository
            .reservations
            .book(client_id, equipment_id, weekday, &slots)
            .await
            .map_err(|e| {
                if let AppError::SlotConflict { ref slots } = e {
                    tracing::info!(
                        "Booking for client {} on equipment {} {} rejected: {} taken",
                        client_id,
                        equipment_id,
                        weekday,
                        slots.join(", ")
                    );
                }
                e
            })?;

        tracing::info!(
            "Client {} booked {} slot(s) on equipment {} for {}",
            client_id,
            created.len(),
            equipment_id,
            weekday
        );
        Ok(created)
    }

    pub async fn cancel(&self, id: i32) -> AppResult<()> {
        self.repository.reservations.delete(id).await?;
        tracing::info!("Reservation {} cancelled", id);
        Ok(())
    }

    pub async fn list_by_day(&self, weekday: i16) -> AppResult<Vec<ReservationDetails>> {
        let weekday = Weekday::try_from(weekday)?;
        self.repository.reservations.list_by_day(weekday).await
    }

    pub async fn list_by_client(&self, client_id: i32) -> AppResult<Vec<ReservationDetails>> {
        // Verify client exists
        self.repository.clients.get_by_id(client_id).await?;
        self.repository.reservations.list_by_client(client_id).await
    }
}

/// Parse slot labels into a sorted, duplicate-free batch.
///
/// Rejects an empty batch and any label off the half-hour grid before
/// anything reaches the database.
pub fn parse_slot_batch(starts: &[String]) -> AppResult<Vec<SlotTime>> {
    if starts.is_empty() {
        return Err(AppError::InvalidSlot("At least one slot is required".to_string()));
    }
    let slots = starts
        .iter()
        .map(|s| s.parse::<SlotTime>())
        .collect::<AppResult<BTreeSet<_>>>()?;
    Ok(slots.into_iter().collect())
}
