//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `careops.toml` in the working directory. Every field has a
//! default so the file is optional, except the JWT secret which must come
//! from the file or `CAREOPS_JWT_SECRET`. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use careops_app::automation_engine::AutomationSettings;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Token signing settings.
    pub auth: AuthConfig,
    /// Outbound email relay.
    pub smtp: SmtpConfig,
    /// Outbound SMS carrier account.
    pub sms: SmsConfig,
    /// Browser origins admitted by CORS.
    pub cors: CorsConfig,
    /// Notification rules and the reminder scheduler.
    pub automation: AutomationConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for access tokens.
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Exact origins, or `*` for any.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Seconds between reminder sweeps; `0` disables the scheduler.
    pub sweep_interval_secs: u64,
    /// Bound on a single email or SMS send.
    pub notify_timeout_secs: u64,
    /// How long a staff reply silences automated reminders.
    pub staff_reply_cooldown_hours: i64,
}

impl Config {
    /// Load configuration from `careops.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("careops.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides read through `var`, later keys winning over earlier ones.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("CAREOPS_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("CAREOPS_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("CAREOPS_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("CAREOPS_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("CAREOPS_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("CAREOPS_JWT_SECRET") {
            self.auth.jwt_secret = val;
        }
        if let Some(val) = var("SMTP_HOST") {
            self.smtp.host = val;
        }
        if let Some(port) = var("SMTP_PORT").and_then(|v| v.parse().ok()) {
            self.smtp.port = port;
        }
        if let Some(val) = var("SMTP_USER") {
            self.smtp.username = Some(val);
        }
        if let Some(val) = var("SMTP_PASSWORD") {
            self.smtp.password = Some(val);
        }
        if let Some(val) = var("SMTP_FROM") {
            self.smtp.from = Some(val);
        }
        if let Some(val) = var("TWILIO_ACCOUNT_SID") {
            self.sms.account_sid = Some(val);
        }
        if let Some(val) = var("TWILIO_AUTH_TOKEN") {
            self.sms.auth_token = Some(val);
        }
        if let Some(val) = var("TWILIO_PHONE_NUMBER") {
            self.sms.from_number = Some(val);
        }
        if let Some(val) = var("FRONTEND_URL") {
            self.cors.allowed_origins.extend(
                val.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string),
            );
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Validation(
                "auth.jwt_secret must be set (or CAREOPS_JWT_SECRET)".to_string(),
            ));
        }
        if self.auth.token_ttl_minutes <= 0 {
            return Err(ConfigError::Validation(
                "auth.token_ttl_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn security(&self) -> careops_adapter_security::Config {
        careops_adapter_security::Config {
            jwt_secret: self.auth.jwt_secret.clone(),
            token_ttl: chrono::Duration::minutes(self.auth.token_ttl_minutes),
        }
    }

    #[must_use]
    pub fn smtp(&self) -> careops_adapter_email_smtp::Config {
        careops_adapter_email_smtp::Config {
            host: self.smtp.host.clone(),
            port: self.smtp.port,
            username: self.smtp.username.clone(),
            password: self.smtp.password.clone(),
            from: self.smtp.from.clone(),
        }
    }

    #[must_use]
    pub fn sms(&self) -> careops_adapter_sms_twilio::Config {
        careops_adapter_sms_twilio::Config {
            account_sid: self.sms.account_sid.clone(),
            auth_token: self.sms.auth_token.clone(),
            from_number: self.sms.from_number.clone(),
            api_base: self.sms.api_base.clone(),
        }
    }

    #[must_use]
    pub fn automation_settings(&self) -> AutomationSettings {
        AutomationSettings {
            staff_reply_cooldown: chrono::Duration::hours(
                self.automation.staff_reply_cooldown_hours,
            ),
            ..AutomationSettings::default()
        }
    }

    #[must_use]
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.automation.notify_timeout_secs)
    }

    /// Period of the reminder sweep, `None` when the scheduler is disabled.
    #[must_use]
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.automation.sweep_interval_secs > 0)
            .then(|| Duration::from_secs(self.automation.sweep_interval_secs))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:careops.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "careopsd=info,careops=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_minutes: 60,
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
            from: None,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 900,
            notify_timeout_secs: 10,
            staff_reply_cooldown_hours: 24,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
