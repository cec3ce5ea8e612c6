//! Weekly timetable primitives: weekdays and half-hour slots
//!
//! A day is cut into 48 fixed slots of 30 minutes starting at 00:00. The
//! facility opens Monday to Friday only, and the slot grid is identical for
//! every weekday and every piece of equipment.

use chrono::{Duration, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{Decode, Encode, Postgres};

use crate::error::AppError;

pub const SLOTS_PER_DAY: u8 = 48;
pub const SLOT_MINUTES: u32 = 30;

static SLOT_LABELS: Lazy<Vec<String>> = Lazy::new(|| {
    (0..SLOTS_PER_DAY)
        .map(|i| format!("{:02}:{:02}", i / 2, (i % 2) as u32 * SLOT_MINUTES))
        .collect()
});

/// Canonical start labels "00:00" .. "23:30"
pub fn slot_labels() -> &'static [String] {
    &SLOT_LABELS
}

/// The 48 slots of any opening day, in order.
///
/// The sequence is lazy and can be cloned or requested again to restart it.
pub fn slots_for_day() -> impl ExactSizeIterator<Item = SlotTime> + DoubleEndedIterator + Clone {
    (0..SLOTS_PER_DAY).map(SlotTime)
}

/// Start of a half-hour slot, stored as its index within the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotTime(u8);

impl SlotTime {
    pub fn from_index(index: u8) -> Option<Self> {
        (index < SLOTS_PER_DAY).then_some(SlotTime(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn hour(self) -> u32 {
        (self.0 / 2) as u32
    }

    pub fn minute(self) -> u32 {
        (self.0 % 2) as u32 * SLOT_MINUTES
    }

    /// End of the slot. 23:30 ends at 00:00 and is still the same day's record.
    pub fn end(self) -> SlotTime {
        SlotTime((self.0 + 1) % SLOTS_PER_DAY)
    }

    pub fn label(self) -> &'static str {
        SLOT_LABELS[self.0 as usize].as_str()
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::default() + Duration::minutes(self.0 as i64 * SLOT_MINUTES as i64)
    }
}

impl std::fmt::Display for SlotTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SlotTime {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SLOT_LABELS
            .iter()
            .position(|label| label == s)
            .map(|i| SlotTime(i as u8))
            .ok_or_else(|| {
                AppError::InvalidSlot(format!(
                    "'{}' is not a slot start (expected HH:00 or HH:30 between 00:00 and 23:30)",
                    s
                ))
            })
    }
}

impl TryFrom<NaiveTime> for SlotTime {
    type Error = AppError;

    fn try_from(time: NaiveTime) -> Result<Self, Self::Error> {
        let secs = time.num_seconds_from_midnight();
        let width = SLOT_MINUTES * 60;
        if secs % width != 0 || time.nanosecond() != 0 {
            return Err(AppError::InvalidSlot(format!(
                "{} is not aligned to a half-hour boundary",
                time
            )));
        }
        Ok(SlotTime((secs / width) as u8))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e: AppError| serde::de::Error::custom(e.to_string()))
    }
}

// SQLx conversion for SlotTime (TIME column)
impl sqlx::Type<Postgres> for SlotTime {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <NaiveTime as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <NaiveTime as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for SlotTime {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let time: NaiveTime = Decode::<Postgres>::decode(value)?;
        SlotTime::try_from(time).map_err(|e| e.to_string().into())
    }
}

impl Encode<'_, Postgres> for SlotTime {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <NaiveTime as Encode<Postgres>>::encode(self.to_naive_time(), buf)
    }
}

/// Opening day of the week (the facility is closed on weekends)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i16)]
pub enum Weekday {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn number(self) -> i16 {
        self as i16
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
        }
    }

    /// Name shown on the front desk timetable
    pub fn local_name(self) -> &'static str {
        match self {
            Weekday::Monday => "Lunes",
            Weekday::Tuesday => "Martes",
            Weekday::Wednesday => "Miércoles",
            Weekday::Thursday => "Jueves",
            Weekday::Friday => "Viernes",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i16> for Weekday {
    type Error = AppError;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Weekday::Monday),
            2 => Ok(Weekday::Tuesday),
            3 => Ok(Weekday::Wednesday),
            4 => Ok(Weekday::Thursday),
            5 => Ok(Weekday::Friday),
            _ => Err(AppError::InvalidSlot(format!(
                "Weekday must be between 1 (Monday) and 5 (Friday), got {}",
                v
            ))),
        }
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.number())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = i16::deserialize(deserializer)?;
        Weekday::try_from(v).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

// SQLx conversion for Weekday (SMALLINT column)
impl sqlx::Type<Postgres> for Weekday {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Weekday {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let v: i16 = Decode::<Postgres>::decode(value)?;
        Weekday::try_from(v).map_err(|e| e.to_string().into())
    }
}

impl Encode<'_, Postgres> for Weekday {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <i16 as Encode<Postgres>>::encode(self.number(), buf)
    }
}
