use backoff::ExponentialBackoff;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.xendit.co";

/// Configuration for the Xendit client
#[derive(Debug, Clone)]
pub struct XenditConfig {
    /// API root, overridable for tests and sandboxes
    pub base_url: String,

    /// Platform secret key, used when a campaign owner has no merchant key of their own
    pub secret_key: String,

    /// Token Xendit echoes in `x-callback-token` on platform invoices
    pub callback_token: Option<String>,

    /// How long an invoice stays payable
    pub invoice_duration: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Maximum number of retries for transient failures
    pub max_retries: usize,

    /// Backoff strategy for retry delays
    pub retry_backoff: ExponentialBackoff,

    /// Currency sent with every invoice
    pub currency: String,
}

impl XenditConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            ..Default::default()
        }
    }
}

impl Default for XenditConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            secret_key: String::new(),
            callback_token: None,
            invoice_duration: Duration::from_secs(24 * 60 * 60),
            request_timeout: Duration::from_secs(15),
            max_retries: 3,
            retry_backoff: ExponentialBackoff {
                initial_interval: Duration::from_millis(250),
                max_interval: Duration::from_secs(5),
                max_elapsed_time: Some(Duration::from_secs(30)),
                ..Default::default()
            },
            currency: "IDR".to_string(),
        }
    }
}
