//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Authentication policy.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Outbound mail configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Legacy ERP endpoint.
    #[serde(default)]
    pub erp: ErpConfig,
    /// Employee sync schedule.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deadline applied to every request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as read from config sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,
    /// Refresh token expiration in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: i64,
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> i64 {
    604_800 // 7 days
}

/// Authentication policy knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a password-reset token.
    #[serde(default = "default_password_reset_ttl")]
    pub password_reset_ttl_secs: i64,
    /// Minimum spacing between two reset requests for the same user.
    #[serde(default = "default_password_reset_throttle")]
    pub password_reset_throttle_secs: i64,
    /// How long a pending second-factor login stays valid.
    #[serde(default = "default_two_factor_window")]
    pub two_factor_window_secs: i64,
    /// Issuer shown in authenticator apps.
    #[serde(default = "default_totp_issuer")]
    pub totp_issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_reset_ttl_secs: default_password_reset_ttl(),
            password_reset_throttle_secs: default_password_reset_throttle(),
            two_factor_window_secs: default_two_factor_window(),
            totp_issuer: default_totp_issuer(),
        }
    }
}

fn default_password_reset_ttl() -> i64 {
    1800 // 30 minutes
}

fn default_password_reset_throttle() -> i64 {
    60
}

fn default_two_factor_window() -> i64 {
    300
}

fn default_totp_issuer() -> String {
    "Foundry".to_string()
}

/// SMTP configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Base URL of the admin UI, used to build reset links.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            frontend_url: default_frontend_url(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_email() -> String {
    "no-reply@foundry.local".to_string()
}

fn default_from_name() -> String {
    "Foundry".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

/// Legacy ERP connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ErpConfig {
    /// Base URL of the ERP HTTP gateway.
    #[serde(default = "default_erp_url")]
    pub base_url: String,
    /// Basic-auth user.
    #[serde(default)]
    pub username: String,
    /// Basic-auth password.
    #[serde(default)]
    pub password: String,
    /// Per-call deadline.
    #[serde(default = "default_erp_timeout")]
    pub timeout_secs: u64,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            base_url: default_erp_url(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_erp_timeout(),
        }
    }
}

fn default_erp_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_erp_timeout() -> u64 {
    60
}

/// Employee sync schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Whether the daily job runs at all.
    #[serde(default = "default_sync_enabled")]
    pub enabled: bool,
    /// Six-field cron expression (sec min hour day month weekday), local time.
    #[serde(default = "default_sync_cron")]
    pub cron: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_sync_enabled(),
            cron: default_sync_cron(),
        }
    }
}

fn default_sync_enabled() -> bool {
    true
}

fn default_sync_cron() -> String {
    "0 10 17 * * *".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FOUNDRY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("FOUNDRY__DATABASE__URL", Some("postgres://localhost/foundry")),
                ("FOUNDRY__JWT__SECRET", Some("s3cret")),
                ("FOUNDRY__AUTH__PASSWORD_RESET_TTL_SECS", Some("600")),
                ("RUN_MODE", Some("nonexistent-mode")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/foundry");
                assert_eq!(config.jwt.secret, "s3cret");
                assert_eq!(config.auth.password_reset_ttl_secs, 600);
                assert_eq!(config.jwt.access_token_expiry_secs, 900);
            },
        );
    }

    #[test]
    fn test_defaults() {
        let auth = AuthConfig::default();
        assert_eq!(auth.password_reset_ttl_secs, 1800);
        assert_eq!(auth.password_reset_throttle_secs, 60);

        let sync = SyncConfig::default();
        assert!(sync.enabled);
        assert_eq!(sync.cron, "0 10 17 * * *");

        let server = ServerConfig::default();
        assert_eq!(server.port, 8080);
        assert_eq!(server.request_timeout_secs, 30);
    }

    #[test]
    fn test_missing_jwt_secret_is_an_error() {
        temp_env::with_vars(
            [
                ("FOUNDRY__DATABASE__URL", Some("postgres://localhost/foundry")),
                ("FOUNDRY__JWT__SECRET", None::<&str>),
                ("RUN_MODE", Some("nonexistent-mode")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
