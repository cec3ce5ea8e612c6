//! Monthly receipt model, billing periods and standing queries

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// One monthly charge for one client
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Receipt {
    pub id: i32,
    pub client_id: i32,
    /// 1..12
    pub month: i16,
    pub year: i32,
    pub amount: Decimal,
    pub paid: bool,
    pub payment_date: Option<NaiveDate>,
    pub issue_date: NaiveDate,
}

/// Receipt joined with client display data
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReceiptDetails {
    pub id: i32,
    pub client_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub month: i16,
    pub year: i32,
    pub amount: Decimal,
    pub paid: bool,
    pub payment_date: Option<NaiveDate>,
    pub issue_date: NaiveDate,
}

/// Active client with unpaid receipts
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Delinquent {
    pub client_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub unpaid_count: i64,
    pub total_owed: Decimal,
}

/// A billing month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BillingPeriod {
    pub month: i16,
    pub year: i32,
}

impl BillingPeriod {
    pub fn new(month: i16, year: i32) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::Validation(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        if !(2000..=9999).contains(&year) {
            return Err(AppError::Validation(format!("Invalid billing year {}", year)));
        }
        Ok(Self { month, year })
    }
}

/// Check a receipt amount fits the money column: positive, at most two
/// decimals and below 100 000 000.
pub fn validate_amount(amount: Decimal) -> AppResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "Receipt amount must be positive, got {}",
            amount
        )));
    }
    let mut amount = amount.normalize();
    if amount.scale() > 2 {
        return Err(AppError::Validation(format!(
            "Receipt amount {} has more than two decimals",
            amount
        )));
    }
    // NUMERIC(10,2) column
    if amount >= Decimal::new(100_000_000, 0) {
        return Err(AppError::Validation(format!(
            "Receipt amount {} is too large",
            amount
        )));
    }
    amount.rescale(2);
    Ok(amount)
}

/// How "good standing" is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandingMode {
    /// Active clients holding a paid receipt for exactly this period
    PaidForPeriod(BillingPeriod),
    /// Active clients with no unpaid receipt in their whole history
    NoOutstandingReceipts,
}

/// Good-standing query; month and year go together or not at all
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StandingQuery {
    pub month: Option<i16>,
    pub year: Option<i32>,
}

impl StandingQuery {
    pub fn mode(&self) -> AppResult<StandingMode> {
        match (self.month, self.year) {
            (Some(month), Some(year)) => Ok(StandingMode::PaidForPeriod(BillingPeriod::new(month, year)?)),
            (None, None) => Ok(StandingMode::NoOutstandingReceipts),
            _ => Err(AppError::Validation(
                "month and year must be given together".to_string(),
            )),
        }
    }
}

/// Receipt listing query (optionally one period)
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ReceiptQuery {
    pub month: Option<i16>,
    pub year: Option<i32>,
}

impl ReceiptQuery {
    pub fn period(&self) -> AppResult<Option<BillingPeriod>> {
        match (self.month, self.year) {
            (Some(month), Some(year)) => Ok(Some(BillingPeriod::new(month, year)?)),
            (None, None) => Ok(None),
            _ => Err(AppError::Validation(
                "month and year must be given together".to_string(),
            )),
        }
    }
}

/// Pending receipts query
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PendingQuery {
    pub client_id: Option<i32>,
}

/// Monthly generation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateReceipts {
    pub month: i16,
    pub year: i32,
    /// Defaults to the configured monthly fee
    pub amount: Option<Decimal>,
}

/// Monthly generation result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationSummary {
    pub month: i16,
    pub year: i32,
    pub amount: Decimal,
    /// Receipts actually created by this run (existing ones are skipped)
    pub created: u64,
}

/// Result of recording a payment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentOutcome {
    pub receipt: Receipt,
    /// The receipt had been paid before this call; nothing was changed
    pub already_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
