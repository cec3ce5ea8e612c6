//! Billing service: monthly receipts, payments and standing reports

use chrono::Utc;

use crate::{
    config::BillingConfig,
    error::AppResult,
    models::{
        client::Client,
        receipt::{
            validate_amount, BillingPeriod, Delinquent, GenerateReceipts, GenerationSummary,
            PaymentOutcome, Receipt, ReceiptDetails, StandingMode,
        },
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BillingService {
    repository: Repository,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(repository: Repository, config: BillingConfig) -> Self {
        Self { repository, config }
    }

    /// Issue the receipts of a month for every active client.
    ///
    /// Idempotent: clients already holding a receipt for the period keep it.
    pub async fn generate(&self, request: &GenerateReceipts) -> AppResult<GenerationSummary> {
        let period = BillingPeriod::new(request.month, request.year)?;
        let amount = validate_amount(request.amount.unwrap_or(self.config.monthly_fee))?;

        let today = Utc::now().date_naive();
        let created = self.repository.receipts.generate(period, amount, today).await?;
        tracing::info!(
            "Generated {} receipt(s) for {:02}/{} at {} {}",
            created,
            period.month,
            period.year,
            amount,
            self.config.currency
        );

        Ok(GenerationSummary {
            month: period.month,
            year: period.year,
            amount,
            created,
        })
    }

    /// Record the payment of a receipt.
    ///
    /// Paying an already paid receipt changes nothing; the outcome flags it
    /// and keeps the original payment date.
    pub async fn record_payment(&self, receipt_id: i32) -> AppResult<PaymentOutcome> {
        let today = Utc::now().date_naive();
        if let Some(receipt) = self.repository.receipts.mark_paid(receipt_id, today).await? {
            tracing::info!("Receipt {} paid by client {}", receipt.id, receipt.client_id);
            return Ok(PaymentOutcome {
                receipt,
                already_paid: false,
                warning: None,
            });
        }

        let receipt = self.repository.receipts.get_by_id(receipt_id).await?;
        let warning = match receipt.payment_date {
            Some(date) => format!("Receipt {} was already paid on {}", receipt.id, date),
            None => format!("Receipt {} was already paid", receipt.id),
        };
        tracing::warn!("{}", warning);
        Ok(PaymentOutcome {
            receipt,
            already_paid: true,
            warning: Some(warning),
        })
    }

    pub async fn pending(&self, client_id: Option<i32>) -> AppResult<Vec<ReceiptDetails>> {
        if let Some(id) = client_id {
            self.repository.clients.get_by_id(id).await?;
        }
        self.repository.receipts.pending(client_id).await
    }

    pub async fn delinquents(&self) -> AppResult<Vec<Delinquent>> {
        self.repository.receipts.delinquents().await
    }

    pub async fn good_standing(&self, mode: StandingMode) -> AppResult<Vec<Client>> {
        self.repository.receipts.good_standing(mode).await
    }

    pub async fn client_receipts(&self, client_id: i32) -> AppResult<Vec<Receipt>> {
        self.repository.clients.get_by_id(client_id).await?;
        self.repository.receipts.list_for_client(client_id).await
    }

    pub async fn list_receipts(&self, period: Option<BillingPeriod>) -> AppResult<Vec<ReceiptDetails>> {
        self.repository.receipts.list(period).await
    }
}
