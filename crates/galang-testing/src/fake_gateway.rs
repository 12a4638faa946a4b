use async_trait::async_trait;
use chrono::Utc;
use galang_xendit::{CreateInvoice, Invoice, InvoiceStatus, PaymentGateway, XenditError};
use rust_decimal::Decimal;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

/// A request the donation flow made to the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    CreateInvoice {
        merchant_key: Option<String>,
        external_id: String,
        amount: i64,
    },
    GetInvoice {
        merchant_key: Option<String>,
        invoice_id: String,
    },
}

#[derive(Default)]
struct FakeState {
    invoices: HashMap<String, Invoice>,
    calls: Vec<GatewayCall>,
    fail_next_create: bool,
    next_id: u64,
}

/// In-memory stand-in for Xendit. Tests decide when invoices get paid or expire.
pub struct FakeGateway {
    callback_token: Option<String>,
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn new(callback_token: Option<&str>) -> Self {
        Self {
            callback_token: callback_token.map(str::to_string),
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Make the next `create_invoice` fail like an outage would.
    pub fn fail_next_create(&self) {
        self.lock().fail_next_create = true;
    }

    /// Move an invoice to `status` and return it as Xendit would post it.
    pub fn set_status(&self, invoice_id: &str, status: InvoiceStatus) -> Invoice {
        let mut state = self.lock();
        let invoice = state
            .invoices
            .get_mut(invoice_id)
            .unwrap_or_else(|| panic!("Unknown invoice {invoice_id}"));

        invoice.status = status;
        if status.is_paid() {
            invoice.paid_at = Some(Utc::now());
            invoice.payment_method = Some("BANK_TRANSFER".to_string());
            invoice.payment_channel = Some("BCA".to_string());
        }
        invoice.clone()
    }

    /// Drop an invoice so later lookups fail with 404.
    pub fn forget(&self, invoice_id: &str) {
        self.lock().invoices.remove(invoice_id);
    }

    pub fn invoice(&self, invoice_id: &str) -> Option<Invoice> {
        self.lock().invoices.get(invoice_id).cloned()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn lookups(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, GatewayCall::GetInvoice { .. }))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_invoice(
        &self,
        merchant_key: Option<&str>,
        request: &CreateInvoice,
    ) -> Result<Invoice, XenditError> {
        let mut state = self.lock();
        state.calls.push(GatewayCall::CreateInvoice {
            merchant_key: merchant_key.map(str::to_string),
            external_id: request.external_id.clone(),
            amount: request.amount,
        });

        if std::mem::take(&mut state.fail_next_create) {
            return Err(XenditError::Api {
                status: 503,
                message: "SERVER_ERROR: upstream unavailable".to_string(),
            });
        }

        state.next_id += 1;
        let id = format!("inv_{:06}", state.next_id);
        let invoice = Invoice {
            id: id.clone(),
            external_id: request.external_id.clone(),
            status: InvoiceStatus::Pending,
            amount: Decimal::from(request.amount),
            invoice_url: Some(format!("https://checkout.xendit.test/web/{id}")),
            expiry_date: Some(Utc::now() + chrono::Duration::days(1)),
            paid_at: None,
            payment_method: None,
            payment_channel: None,
        };
        state.invoices.insert(id, invoice.clone());
        Ok(invoice)
    }

    async fn get_invoice(
        &self,
        merchant_key: Option<&str>,
        invoice_id: &str,
    ) -> Result<Invoice, XenditError> {
        let mut state = self.lock();
        state.calls.push(GatewayCall::GetInvoice {
            merchant_key: merchant_key.map(str::to_string),
            invoice_id: invoice_id.to_string(),
        });

        state
            .invoices
            .get(invoice_id)
            .cloned()
            .ok_or_else(|| XenditError::Api {
                status: 404,
                message: format!("INVOICE_NOT_FOUND_ERROR: {invoice_id}"),
            })
    }

    fn platform_callback_token(&self) -> Option<&str> {
        self.callback_token.as_deref()
    }
}
