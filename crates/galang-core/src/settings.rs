use chrono::Duration;

/// Business rules that vary per deployment
#[derive(Debug, Clone)]
pub struct Settings {
    /// Smallest donation accepted, in Rupiah
    pub min_donation: i64,

    /// Where Xendit sends the payer after a successful payment
    pub success_redirect_url: Option<String>,

    /// Where Xendit sends the payer after a failed or expired payment
    pub failure_redirect_url: Option<String>,

    /// Lifetime of a login session
    pub session_ttl: Duration,

    /// Gateway lookups in flight at once while polling pending donations
    pub poll_concurrency: usize,

    /// SHA-256 iterations for password hashing
    pub password_rounds: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_donation: 10_000,
            success_redirect_url: None,
            failure_redirect_url: None,
            session_ttl: Duration::days(7),
            poll_concurrency: 4,
            password_rounds: 10_000,
        }
    }
}
