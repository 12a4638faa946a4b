use chrono::{DateTime, Utc};
use rust_decimal::{prelude::ToPrimitive as _, Decimal};
use serde::{Deserialize, Serialize};

/// Body of `POST /v2/invoices`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateInvoice {
    pub external_id: String,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,
    pub description: String,
    /// Seconds the invoice stays payable; filled from config when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Settled,
    Expired,
    #[serde(other)]
    Unknown,
}

impl InvoiceStatus {
    /// `SETTLED` follows `PAID` once funds reach the merchant balance; both mean paid.
    pub fn is_paid(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Settled)
    }
}

/// Invoice as returned by the API and as posted to the invoice callback URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    pub external_id: String,
    pub status: InvoiceStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_channel: Option<String>,
}

/// Xendit posts the invoice object itself to the callback URL.
pub type InvoiceCallback = Invoice;

impl Invoice {
    /// Amount in whole Rupiah, or `None` if Xendit reported a fractional amount.
    pub fn amount_rupiah(&self) -> Option<i64> {
        if !self.amount.fract().is_zero() {
            return None;
        }
        self.amount.to_i64()
    }

    /// Channel the payer used (e.g. `BCA`, `OVO`), falling back to the method.
    pub fn channel(&self) -> Option<&str> {
        self.payment_channel
            .as_deref()
            .or(self.payment_method.as_deref())
    }
}

/// Error body returned by the API on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub(crate) fn describe(&self) -> String {
        match (&self.error_code, &self.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}
