//! Equipment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentCategory {
    Cardio,
    Strength,
    Functional,
    Other,
}

impl EquipmentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentCategory::Cardio => "cardio",
            EquipmentCategory::Strength => "strength",
            EquipmentCategory::Functional => "functional",
            EquipmentCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EquipmentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cardio" => Ok(EquipmentCategory::Cardio),
            "strength" | "musculación" | "musculacion" => Ok(EquipmentCategory::Strength),
            "functional" | "funcional" => Ok(EquipmentCategory::Functional),
            "other" | "otro" => Ok(EquipmentCategory::Other),
            _ => Err(format!("Invalid equipment category: {}", s)),
        }
    }
}

// SQLx conversion for EquipmentCategory
impl sqlx::Type<Postgres> for EquipmentCategory {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for EquipmentCategory {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for EquipmentCategory {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    /// Display name
    pub name: String,
    pub category: EquipmentCategory,
    pub description: Option<String>,
    /// False once retired (soft delete); retired equipment is hidden from the occupancy grid
    pub active: bool,
    pub crea_date: Option<DateTime<Utc>>,
    pub modif_date: Option<DateTime<Utc>>,
}

/// Create equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,
    /// Defaults to "other"
    pub category: Option<EquipmentCategory>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Update equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEquipment {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,
    pub category: Option<EquipmentCategory>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Equipment list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EquipmentQuery {
    /// Only return active equipment (default: true)
    pub active_only: Option<bool>,
}
