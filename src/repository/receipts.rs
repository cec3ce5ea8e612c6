//! Receipts repository: monthly charges and standing aggregates

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        client::Client,
        receipt::{BillingPeriod, Delinquent, Receipt, ReceiptDetails, StandingMode},
    },
};

#[derive(Clone)]
pub struct ReceiptsRepository {
    pool: Pool<Postgres>,
}

impl ReceiptsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get receipt by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Receipt> {
        sqlx::query_as::<_, Receipt>("SELECT * FROM receipts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Receipt {} not found", id)))
    }

    /// Create one unpaid receipt per active client for the period.
    ///
    /// Existing receipts for the period (paid or not) are left untouched, so
    /// the call can be repeated safely. Returns how many rows were created.
    pub async fn generate(&self, period: BillingPeriod, amount: Decimal, issue_date: NaiveDate) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO receipts (client_id, month, year, amount, paid, issue_date)
            SELECT c.id, $1, $2, $3, FALSE, $4
            FROM clients c
            WHERE c.active = TRUE
            ON CONFLICT (client_id, month, year) DO NOTHING
            "#,
        )
        .bind(period.month)
        .bind(period.year)
        .bind(amount)
        .bind(issue_date)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mark an unpaid receipt as paid. Returns None if it was already paid or is missing.
    pub async fn mark_paid(&self, id: i32, payment_date: NaiveDate) -> AppResult<Option<Receipt>> {
        let receipt = sqlx::query_as::<_, Receipt>(
            r#"
            UPDATE receipts SET paid = TRUE, payment_date = $1
            WHERE id = $2 AND paid = FALSE
            RETURNING *
            "#,
        )
        .bind(payment_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(receipt)
    }

    /// Unpaid receipts, for one client (by period) or for everyone (by client name, then period)
    pub async fn pending(&self, client_id: Option<i32>) -> AppResult<Vec<ReceiptDetails>> {
        let rows = match client_id {
            Some(id) => {
                sqlx::query_as::<_, ReceiptDetails>(
                    r#"
                    SELECT r.id, r.client_id, c.first_name, c.last_name, c.national_id,
                           r.month, r.year, r.amount, r.paid, r.payment_date, r.issue_date
                    FROM receipts r
                    JOIN clients c ON r.client_id = c.id
                    WHERE r.paid = FALSE AND r.client_id = $1
                    ORDER BY r.year, r.month
                    "#,
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ReceiptDetails>(
                    r#"
                    SELECT r.id, r.client_id, c.first_name, c.last_name, c.national_id,
                           r.month, r.year, r.amount, r.paid, r.payment_date, r.issue_date
                    FROM receipts r
                    JOIN clients c ON r.client_id = c.id
                    WHERE r.paid = FALSE
                    ORDER BY c.last_name, c.first_name, r.year, r.month
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    /// Active clients owing at least one receipt, biggest debt first
    pub async fn delinquents(&self) -> AppResult<Vec<Delinquent>> {
        let rows = sqlx::query_as::<_, Delinquent>(
            r#"
            SELECT c.id AS client_id, c.first_name, c.last_name, c.national_id,
                   c.phone, c.email,
                   COUNT(r.id) AS unpaid_count,
                   SUM(r.amount) AS total_owed
            FROM clients c
            JOIN receipts r ON r.client_id = c.id
            WHERE r.paid = FALSE AND c.active = TRUE
            GROUP BY c.id
            ORDER BY total_owed DESC, c.last_name, c.first_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Clients in good standing under the given mode, ordered by surname then name
    pub async fn good_standing(&self, mode: StandingMode) -> AppResult<Vec<Client>> {
        let rows = match mode {
            StandingMode::PaidForPeriod(period) => {
                sqlx::query_as::<_, Client>(
                    r#"
                    SELECT c.* FROM clients c
                    WHERE c.active = TRUE AND EXISTS (
                        SELECT 1 FROM receipts r
                        WHERE r.client_id = c.id AND r.paid = TRUE
                          AND r.month = $1 AND r.year = $2
                    )
                    ORDER BY c.last_name, c.first_name
                    "#,
                )
                .bind(period.month)
                .bind(period.year)
                .fetch_all(&self.pool)
                .await?
            }
            StandingMode::NoOutstandingReceipts => {
                sqlx::query_as::<_, Client>(
                    r#"
                    SELECT c.* FROM clients c
                    WHERE c.active = TRUE AND NOT EXISTS (
                        SELECT 1 FROM receipts r
                        WHERE r.client_id = c.id AND r.paid = FALSE
                    )
                    ORDER BY c.last_name, c.first_name
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    /// Receipt history of one client, newest period first
    pub async fn list_for_client(&self, client_id: i32) -> AppResult<Vec<Receipt>> {
        let rows = sqlx::query_as::<_, Receipt>(
            "SELECT * FROM receipts WHERE client_id = $1 ORDER BY year DESC, month DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// All receipts, optionally restricted to one period
    pub async fn list(&self, period: Option<BillingPeriod>) -> AppResult<Vec<ReceiptDetails>> {
        let rows = match period {
            Some(period) => {
                sqlx::query_as::<_, ReceiptDetails>(
                    r#"
                    SELECT r.id, r.client_id, c.first_name, c.last_name, c.national_id,
                           r.month, r.year, r.amount, r.paid, r.payment_date, r.issue_date
                    FROM receipts r
                    JOIN clients c ON r.client_id = c.id
                    WHERE r.month = $1 AND r.year = $2
                    ORDER BY c.last_name, c.first_name
                    "#,
                )
                .bind(period.month)
                .bind(period.year)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ReceiptDetails>(
                    r#"
                    SELECT r.id, r.client_id, c.first_name, c.last_name, c.national_id,
                           r.month, r.year, r.amount, r.paid, r.payment_date, r.issue_date
                    FROM receipts r
                    JOIN clients c ON r.client_id = c.id
                    ORDER BY r.year DESC, r.month DESC, c.last_name, c.first_name
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }
}
