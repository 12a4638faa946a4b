use crate::{
    types::ApiErrorBody, CreateInvoice, Invoice, PaymentGateway, XenditConfig, XenditError,
};
use async_trait::async_trait;
use backoff::future::retry;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

/// Xendit invoice API client with retry on transient failures
#[derive(Debug, Clone)]
pub struct XenditClient {
    http: reqwest::Client,
    base_url: Url,
    config: XenditConfig,
}

impl XenditClient {
    /// Create a new client from configuration
    pub fn new(config: XenditConfig) -> Result<Self, XenditError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Self::with_http(config, http)
    }

    /// Create a new client reusing an existing reqwest client
    pub fn with_http(config: XenditConfig, http: reqwest::Client) -> Result<Self, XenditError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| XenditError::Config(format!("invalid base url {base}: {e}")))?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    pub fn config(&self) -> &XenditConfig {
        &self.config
    }

    /// Create a hosted invoice
    ///
    /// Fills `invoice_duration` and `currency` from configuration when the request leaves them empty.
    pub async fn create_invoice(
        &self,
        merchant_key: Option<&str>,
        request: &CreateInvoice,
    ) -> Result<Invoice, XenditError> {
        let url = self.endpoint("v2/invoices")?;
        let key = self.secret_key(merchant_key)?;

        let mut body = request.clone();
        body.invoice_duration
            .get_or_insert(self.config.invoice_duration.as_secs());
        body.currency.get_or_insert_with(|| self.config.currency.clone());

        let invoice: Invoice = self
            .execute("create_invoice", XenditError::was_not_processed, || {
                self.http
                    .post(url.clone())
                    .basic_auth(key, Some(""))
                    .json(&body)
            })
            .await?;

        info!(
            external_id = %invoice.external_id,
            invoice_id = %invoice.id,
            "Created Xendit invoice"
        );
        Ok(invoice)
    }

    /// Fetch the current state of an invoice
    pub async fn get_invoice(
        &self,
        merchant_key: Option<&str>,
        invoice_id: &str,
    ) -> Result<Invoice, XenditError> {
        let url = self.endpoint(&format!("v2/invoices/{invoice_id}"))?;
        let key = self.secret_key(merchant_key)?;

        self.execute("get_invoice", XenditError::is_transient, || {
            self.http.get(url.clone()).basic_auth(key, Some(""))
        })
        .await
    }

    fn endpoint(&self, path: &str) -> Result<Url, XenditError> {
        self.base_url
            .join(path)
            .map_err(|e| XenditError::Config(format!("invalid endpoint {path}: {e}")))
    }

    fn secret_key<'a>(&'a self, merchant_key: Option<&'a str>) -> Result<&'a str, XenditError> {
        let key = merchant_key.unwrap_or(&self.config.secret_key);
        if key.is_empty() {
            return Err(XenditError::Config("no Xendit secret key configured".into()));
        }
        Ok(key)
    }

    /// Send a request with retry logic
    ///
    /// `make_request` is called once per attempt since request builders cannot be replayed.
    /// `retryable` decides which failures are resent; creates must not be resent after a
    /// timeout or 5xx, as Xendit may already have issued the invoice.
    async fn execute<T, F>(
        &self,
        op: &'static str,
        retryable: fn(&XenditError) -> bool,
        make_request: F,
    ) -> Result<T, XenditError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let max_retries = self.config.max_retries;
        let mut attempt = 0usize;

        retry(self.config.retry_backoff.clone(), || {
            attempt += 1;
            let current = attempt;
            let request = make_request();

            async move {
                match send(request).await {
                    Ok(value) => {
                        debug!(op, attempt = current, "Xendit request succeeded");
                        Ok(value)
                    }
                    Err(err) if retryable(&err) && current <= max_retries => {
                        warn!(op, attempt = current, error = %err, "Xendit request failed, retrying");
                        Err(backoff::Error::transient(err))
                    }
                    Err(err) if retryable(&err) => {
                        Err(backoff::Error::permanent(XenditError::RetriesExhausted {
                            retries: max_retries,
                            last_error: err.to_string(),
                        }))
                    }
                    Err(err) => Err(backoff::Error::permanent(err)),
                }
            }
        })
        .await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, XenditError> {
    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(XenditError::Unauthorized);
    }

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.describe())
            .unwrap_or(text);
        return Err(XenditError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| XenditError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl PaymentGateway for XenditClient {
    async fn create_invoice(
        &self,
        merchant_key: Option<&str>,
        request: &CreateInvoice,
    ) -> Result<Invoice, XenditError> {
        XenditClient::create_invoice(self, merchant_key, request).await
    }

    async fn get_invoice(
        &self,
        merchant_key: Option<&str>,
        invoice_id: &str,
    ) -> Result<Invoice, XenditError> {
        XenditClient::get_invoice(self, merchant_key, invoice_id).await
    }

    fn platform_callback_token(&self) -> Option<&str> {
        self.config.callback_token.as_deref()
    }
}
