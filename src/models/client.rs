//! Client model and related types

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Facility client (member)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Client {
    pub id: i32,
    pub first_name: String,
    /// Surname(s)
    pub last_name: String,
    /// DNI/NIE, upper-case, unique among every client ever registered
    pub national_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub enrollment_date: NaiveDate,
    /// False once the client has been deactivated (soft delete)
    pub active: bool,
    pub crea_date: Option<DateTime<Utc>>,
    pub modif_date: Option<DateTime<Utc>>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Create client request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClient {
    #[validate(length(min = 1, max = 50, message = "First name must be 1-50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,
    #[validate(length(min = 1, max = 15, message = "National ID must be 1-15 characters"))]
    pub national_id: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Update client request.
///
/// The national ID is deliberately absent: it cannot change once registered.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateClient {
    #[validate(length(min = 1, max = 50, message = "First name must be 1-50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// Set to true to reactivate a deactivated client
    pub active: Option<bool>,
}

/// Client list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ClientQuery {
    /// Only return active clients (default: true)
    pub active_only: Option<bool>,
}

/// Identity lookup parameters (exactly one must be given)
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ClientLookupQuery {
    pub national_id: Option<String>,
    pub email: Option<String>,
}

/// Delete query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DeleteQuery {
    /// Permanently delete instead of deactivating (cascades to reservations and receipts)
    pub hard: Option<bool>,
}

const CONTROL_LETTERS: &[u8; 23] = b"TRWAGMYFPDXBNJZSQVHLCKE";

static DNI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{8}[A-Z]$").unwrap());
static NIE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[XYZ][0-9]{7}[A-Z]$").unwrap());

/// Trim, drop inner spaces and dashes, and upper-case a national ID
pub fn normalize_national_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Check a normalized DNI (8 digits + letter) or NIE (X/Y/Z + 7 digits + letter)
pub fn is_valid_national_id(id: &str) -> bool {
    let digits = if DNI_RE.is_match(id) {
        id[..8].to_string()
    } else if NIE_RE.is_match(id) {
        let prefix = match &id[..1] {
            "X" => '0',
            "Y" => '1',
            _ => '2',
        };
        format!("{}{}", prefix, &id[1..8])
    } else {
        return false;
    };

    let Ok(number) = digits.parse::<u32>() else {
        return false;
    };
    let expected = CONTROL_LETTERS[(number % 23) as usize];
    id.as_bytes()[8] == expected
}

/// Map blank optional form fields to None
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
