use async_trait::async_trait;

use crate::{CreateInvoice, Invoice, XenditError};

/// Seam between the donation flow and the hosted-invoice provider.
///
/// `merchant_key` is the campaign owner's own secret key when they have one;
/// `None` means the platform account.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_invoice(
        &self,
        merchant_key: Option<&str>,
        request: &CreateInvoice,
    ) -> Result<Invoice, XenditError>;

    async fn get_invoice(
        &self,
        merchant_key: Option<&str>,
        invoice_id: &str,
    ) -> Result<Invoice, XenditError>;

    /// Callback token configured for the platform account.
    fn platform_callback_token(&self) -> Option<&str>;
}
