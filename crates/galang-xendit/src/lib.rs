/*!
# Galang Xendit Client

Hosted-invoice integration with [Xendit](https://developers.xendit.co/api-reference/#invoices),
with retry on transient failures and callback token verification.

## Quick Start

```no_run
use galang_xendit::{CreateInvoice, XenditClient, XenditConfig};

# async fn example() -> Result<(), galang_xendit::XenditError> {
let client = XenditClient::new(XenditConfig::new("xnd_development_..."))?;

let invoice = client
    .create_invoice(
        None,
        &CreateInvoice {
            external_id: "donation-1-9f2c".into(),
            amount: 50_000,
            payer_email: Some("donor@example.com".into()),
            description: "Donation to Clean Water for Sumba".into(),
            invoice_duration: None,
            success_redirect_url: None,
            failure_redirect_url: None,
            currency: None,
        },
    )
    .await?;

println!("Pay at {:?}", invoice.invoice_url);
# Ok(())
# }
```

## Merchant Keys

Campaign owners may connect their own Xendit account. Pass their secret key as
`merchant_key` and the invoice is issued on their account instead of the platform's.
*/

mod callback;
mod client;
mod config;
mod error;
mod gateway;
mod types;

pub use callback::verify_callback_token;
pub use client::XenditClient;
pub use config::{XenditConfig, DEFAULT_BASE_URL};
pub use error::XenditError;
pub use gateway::PaymentGateway;
pub use types::{CreateInvoice, Invoice, InvoiceCallback, InvoiceStatus};
