//! Standing weekly reservations and occupancy grid types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::equipment::EquipmentCategory;
use super::slot::{SlotTime, Weekday};

/// Reservation row: one equipment, one weekday, one half-hour slot, every week
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    pub client_id: i32,
    pub equipment_id: i32,
    /// 1 = Monday .. 5 = Friday
    #[schema(value_type = i16, example = 1)]
    pub weekday: Weekday,
    #[schema(value_type = String, example = "09:00")]
    pub start_time: SlotTime,
    #[schema(value_type = String, example = "09:30")]
    pub end_time: SlotTime,
    pub created_at: DateTime<Utc>,
}

/// Reservation joined with client and equipment display data
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReservationDetails {
    pub id: i32,
    pub client_id: i32,
    pub client_first_name: String,
    pub client_last_name: String,
    pub equipment_id: i32,
    pub equipment_name: String,
    pub equipment_category: EquipmentCategory,
    #[schema(value_type = i16, example = 1)]
    pub weekday: Weekday,
    #[schema(value_type = String, example = "09:00")]
    pub start_time: SlotTime,
    #[schema(value_type = String, example = "09:30")]
    pub end_time: SlotTime,
    pub created_at: DateTime<Utc>,
}

/// Book one or more slots of the same equipment on the same weekday
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookReservation {
    /// Required for staff; a client principal always books for itself
    pub client_id: Option<i32>,
    pub equipment_id: i32,
    /// 1 = Monday .. 5 = Friday
    pub weekday: i16,
    /// Slot start labels, e.g. ["09:00", "09:30"]
    pub starts: Vec<String>,
}

/// Reservation listing query
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ReservationQuery {
    /// 1 = Monday .. 5 = Friday
    pub weekday: i16,
}

/// Slot availability pre-check query
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AvailabilityQuery {
    pub equipment_id: i32,
    pub weekday: i16,
    /// Slot start label, e.g. "09:00"
    pub start: String,
}

/// Slot availability answer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Availability {
    pub equipment_id: i32,
    #[schema(value_type = i16)]
    pub weekday: Weekday,
    #[schema(value_type = String)]
    pub start: SlotTime,
    #[schema(value_type = String)]
    pub end: SlotTime,
    pub free: bool,
}

/// Occupied slot as fetched in bulk for one weekday
#[derive(Debug, Clone, FromRow)]
pub struct OccupiedSlotRow {
    pub reservation_id: i32,
    pub equipment_id: i32,
    pub start_time: SlotTime,
    pub client_id: i32,
    pub client_first_name: String,
    pub client_last_name: String,
}

/// State of one slot of one equipment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SlotOccupancy {
    #[schema(value_type = String)]
    pub start: SlotTime,
    #[schema(value_type = String)]
    pub end: SlotTime,
    pub occupied: bool,
    pub reservation_id: Option<i32>,
    pub client_id: Option<i32>,
    pub client_name: Option<String>,
}

/// The 48 slots of one equipment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EquipmentOccupancy {
    pub equipment_id: i32,
    pub equipment_name: String,
    pub category: EquipmentCategory,
    pub occupied_slots: usize,
    pub slots: Vec<SlotOccupancy>,
}

/// Occupancy of every active equipment for one weekday
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OccupancyGrid {
    #[schema(value_type = i16)]
    pub weekday: Weekday,
    pub weekday_name: String,
    pub equipment: Vec<EquipmentOccupancy>,
}

impl OccupancyGrid {
    /// Hide who holds the slots that do not belong to `client_id`
    pub fn redact_for(mut self, client_id: i32) -> Self {
        for slot in self.equipment.iter_mut().flat_map(|e| e.slots.iter_mut()) {
            if slot.occupied && slot.client_id != Some(client_id) {
                slot.reservation_id = None;
                slot.client_id = None;
                slot.client_name = None;
            }
        }
        self
    }
}
