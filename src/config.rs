use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;
use secrecy::SecretString;

#[derive(Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub receipt_dir: PathBuf,
    /// `None` when `SMTP_HOST` is unset; notifications are then only logged.
    pub smtp: Option<SmtpConfig>,
    pub notify: NotifyConfig,
}

#[derive(Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_name: String,
    pub from_email: String,
}

/// Retry policy and pacing of the notification outbox worker.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub max_attempts: u32,
    pub retry_base: Duration,
    pub retry_max: Duration,
    pub scan_interval: Duration,
    pub batch_size: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_base: Duration::from_secs(5),
            retry_max: Duration::from_secs(300),
            scan_interval: Duration::from_secs(30),
            batch_size: 20,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let receipt_dir = env::var("RECEIPT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("receipts"));

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret: SecretString::from(jwt_secret),
            receipt_dir,
            smtp: SmtpConfig::from_env()?,
            notify: NotifyConfig::from_env(),
        })
    }
}

impl SmtpConfig {
    fn from_env() -> anyhow::Result<Option<Self>> {
        let Ok(host) = env::var("SMTP_HOST") else {
            return Ok(None);
        };
        let port = env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(587);
        let username = env::var("SMTP_EMAIL").context("SMTP_EMAIL is not set")?;
        let password = env::var("SMTP_PASSWORD").context("SMTP_PASSWORD is not set")?;
        let from_email = env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| username.clone());
        let from_name =
            env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Flower Shop".to_string());

        Ok(Some(Self {
            host,
            port,
            username,
            password: SecretString::from(password),
            from_name,
            from_email,
        }))
    }
}

impl NotifyConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };
        Self {
            max_attempts: env::var("NOTIFY_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_attempts),
            retry_base: secs("NOTIFY_RETRY_BASE_SECS", defaults.retry_base),
            retry_max: secs("NOTIFY_RETRY_MAX_SECS", defaults.retry_max),
            scan_interval: secs("NOTIFY_SCAN_INTERVAL_SECS", defaults.scan_interval),
            batch_size: defaults.batch_size,
        }
    }

    /// Delay before the next attempt once `attempts` deliveries have failed.
    pub fn backoff(&self, attempts: u32) -> Duration {
        let exp = attempts.saturating_sub(1).min(16);
        self.retry_base
            .saturating_mul(2u32.saturating_pow(exp))
            .min(self.retry_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let cfg = NotifyConfig {
            retry_base: Duration::from_secs(5),
            retry_max: Duration::from_secs(60),
            ..NotifyConfig::default()
        };
        assert_eq!(cfg.backoff(1), Duration::from_secs(5));
        assert_eq!(cfg.backoff(2), Duration::from_secs(10));
        assert_eq!(cfg.backoff(3), Duration::from_secs(20));
        assert_eq!(cfg.backoff(5), Duration::from_secs(60));
        assert_eq!(cfg.backoff(40), Duration::from_secs(60));
    }
}
