use chrono::Duration as SessionTtl;
use galang_core::Settings;
use galang_xendit::{XenditConfig, DEFAULT_BASE_URL};
use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
#[error("Invalid {key}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub reason: String,
}

/// Upper bound for session lifetime, one leap year
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Process configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,

    pub xendit_base_url: String,
    pub xendit_secret_key: String,
    pub xendit_callback_token: Option<String>,

    /// Smallest donation accepted, in Rupiah
    pub min_donation: i64,
    pub invoice_duration_secs: u64,
    pub success_redirect_url: Option<String>,
    pub failure_redirect_url: Option<String>,
    pub session_ttl_hours: i64,

    /// Seconds between pending-payment sweeps; 0 disables the poller
    pub poll_interval_secs: u64,
    pub poll_batch: u64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self {
            port: try_load("PORT", "8080")?,
            database_url: try_load("DATABASE_URL", "sqlite://galang.db?mode=rwc")?,
            xendit_base_url: try_load("XENDIT_BASE_URL", DEFAULT_BASE_URL)?,
            xendit_secret_key: read_secret("XENDIT_SECRET_KEY").unwrap_or_default(),
            xendit_callback_token: read_secret("XENDIT_CALLBACK_TOKEN"),
            min_donation: try_load("MIN_DONATION", "10000")?,
            invoice_duration_secs: try_load("INVOICE_DURATION_SECS", "86400")?,
            success_redirect_url: optional("SUCCESS_REDIRECT_URL"),
            failure_redirect_url: optional("FAILURE_REDIRECT_URL"),
            session_ttl_hours: try_load("SESSION_TTL_HOURS", "168")?,
            poll_interval_secs: try_load("POLL_INTERVAL_SECS", "60")?,
            poll_batch: try_load("POLL_BATCH", "50")?,
        };

        config.validate()?;
        if config.xendit_secret_key.is_empty() {
            warn!("No platform Xendit key; only creators with their own key can receive donations");
        }

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_donation <= 0 {
            return Err(ConfigError {
                key: "MIN_DONATION".into(),
                reason: "must be positive".into(),
            });
        }
        if self.session_ttl_hours <= 0 || self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError {
                key: "SESSION_TTL_HOURS".into(),
                reason: format!("must be between 1 and {MAX_SESSION_TTL_HOURS}"),
            });
        }
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        Settings {
            min_donation: self.min_donation,
            success_redirect_url: self.success_redirect_url.clone(),
            failure_redirect_url: self.failure_redirect_url.clone(),
            session_ttl: SessionTtl::hours(self.session_ttl_hours),
            ..Settings::default()
        }
    }

    pub fn xendit(&self) -> XenditConfig {
        XenditConfig {
            base_url: self.xendit_base_url.clone(),
            secret_key: self.xendit_secret_key.clone(),
            callback_token: self.xendit_callback_token.clone(),
            invoice_duration: Duration::from_secs(self.invoice_duration_secs),
            ..XenditConfig::default()
        }
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
}

fn optional(key: &str) -> Option<String> {
    let value = var(key);
    if value.is_none() {
        info!("{key} not set");
    }
    value
}

/// Environment first, then a mounted secret file.
fn read_secret(secret_name: &str) -> Option<String> {
    if let Some(value) = var(secret_name) {
        return Some(value);
    }

    let path = format!("/run/secrets/{secret_name}");
    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_load_falls_back_to_default() {
        let port: u16 = try_load("GALANG_TEST_UNSET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_try_load_rejects_garbage() {
        std::env::set_var("GALANG_TEST_BAD_BATCH", "fifty");
        let err = try_load::<u64>("GALANG_TEST_BAD_BATCH", "50").unwrap_err();
        assert_eq!(err.key, "GALANG_TEST_BAD_BATCH");
    }

    fn base_config() -> Config {
        Config {
            port: 8080,
            database_url: "sqlite::memory:".into(),
            xendit_base_url: DEFAULT_BASE_URL.into(),
            xendit_secret_key: String::new(),
            xendit_callback_token: None,
            min_donation: 25_000,
            invoice_duration_secs: 3600,
            success_redirect_url: Some("https://galang.example/thanks".into()),
            failure_redirect_url: None,
            session_ttl_hours: 2,
            poll_interval_secs: 0,
            poll_batch: 10,
        }
    }

    #[test]
    fn test_settings_carry_overrides() {
        let config = base_config();

        let settings = config.settings();
        assert_eq!(settings.min_donation, 25_000);
        assert_eq!(settings.session_ttl, SessionTtl::hours(2));
        assert_eq!(config.xendit().invoice_duration, Duration::from_secs(3600));
        assert!(config.poll_interval().is_none());
    }

    #[test]
    fn test_session_ttl_is_bounded() {
        let mut config = base_config();
        config.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        assert!(config.validate().is_ok());
        // the expiry must still be computable from now
        let _ = chrono::Utc::now() + config.settings().session_ttl;

        for hours in [0, -1, MAX_SESSION_TTL_HOURS + 1, i64::MAX] {
            config.session_ttl_hours = hours;
            let err = config.validate().unwrap_err();
            assert_eq!(err.key, "SESSION_TTL_HOURS");
        }

        config.session_ttl_hours = 2;
        config.min_donation = 0;
        assert_eq!(config.validate().unwrap_err().key, "MIN_DONATION");
    }
}
