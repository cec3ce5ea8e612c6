//! Data models for GymSlots

pub mod client;
pub mod equipment;
pub mod principal;
pub mod receipt;
pub mod reservation;
pub mod slot;

// Re-export commonly used types
pub use client::Client;
pub use equipment::{Equipment, EquipmentCategory};
pub use principal::{PrincipalClaims, Role};
pub use receipt::{BillingPeriod, Delinquent, Receipt, ReceiptDetails, StandingMode};
pub use reservation::{OccupancyGrid, Reservation, ReservationDetails};
pub use slot::{slots_for_day, SlotTime, Weekday};
