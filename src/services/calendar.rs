//! Slot calendar: availability checks and occupancy grids

use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{
        equipment::Equipment,
        reservation::{
            Availability, EquipmentOccupancy, OccupancyGrid, OccupiedSlotRow, SlotOccupancy,
        },
        slot::{slots_for_day, SlotTime, Weekday},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CalendarService {
    repository: Repository,
}

impl CalendarService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Canonical slot labels of any opening day
    pub fn slots(&self) -> Vec<SlotTime> {
        slots_for_day().collect()
    }

    pub async fn is_free(&self, equipment_id: i32, weekday: i16, start: &str) -> AppResult<Availability> {
        let weekday = Weekday::try_from(weekday)?;
        let start: SlotTime = start.parse()?;
        let free = self
            .repository
            .reservations
            .is_free(equipment_id, weekday, start)
            .await?;
        Ok(Availability {
            equipment_id,
            weekday,
            start,
            end: start.end(),
            free,
        })
    }

    /// Occupancy of every active equipment on a weekday.
    ///
    /// Two queries regardless of equipment count: the active equipment list
    /// and every reservation of the day.
    pub async fn occupancy_grid(&self, weekday: i16) -> AppResult<OccupancyGrid> {
        let weekday = Weekday::try_from(weekday)?;
        let equipment = self.repository.equipment.list(true).await?;
        let occupied = self.repository.reservations.occupied_slots(weekday).await?;
        tracing::debug!(
            "Occupancy for {}: {} equipment, {} occupied slots",
            weekday,
            equipment.len(),
            occupied.len()
        );
        Ok(build_occupancy_grid(weekday, &equipment, occupied))
    }
}

/// Cross `equipment` with the 48 slots of the day, filling in `occupied`.
///
/// Reservations of equipment missing from `equipment` (retired) are ignored.
pub fn build_occupancy_grid(
    weekday: Weekday,
    equipment: &[Equipment],
    occupied: Vec<OccupiedSlotRow>,
) -> OccupancyGrid {
    let mut by_slot: HashMap<(i32, SlotTime), OccupiedSlotRow> = occupied
        .into_iter()
        .map(|row| ((row.equipment_id, row.start_time), row))
        .collect();

    let equipment = equipment
        .iter()
        .map(|eq| {
            let slots: Vec<SlotOccupancy> = slots_for_day()
                .map(|start| match by_slot.remove(&(eq.id, start)) {
                    Some(row) => SlotOccupancy {
                        start,
                        end: start.end(),
                        occupied: true,
                        reservation_id: Some(row.reservation_id),
                        client_id: Some(row.client_id),
                        client_name: Some(format!(
                            "{} {}",
                            row.client_first_name, row.client_last_name
                        )),
                    },
                    None => SlotOccupancy {
                        start,
                        end: start.end(),
                        occupied: false,
                        reservation_id: None,
                        client_id: None,
                        client_name: None,
                    },
                })
                .collect();

            EquipmentOccupancy {
                equipment_id: eq.id,
                equipment_name: eq.name.clone(),
                category: eq.category,
                occupied_slots: slots.iter().filter(|s| s.occupied).count(),
                slots,
            }
        })
        .collect();

    OccupancyGrid {
        weekday,
        weekday_name: weekday.local_name().to_string(),
        equipment,
    }
}
