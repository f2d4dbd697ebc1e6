use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub sse: SseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

/// Notification manager configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub toast: ToastConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    /// Capacity of the event channel feeding rendering adapters
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToastConfig {
    /// TTL applied when a toast does not specify one
    #[serde(default = "default_toast_ttl_ms")]
    pub default_ttl_ms: u64,
}

/// What happens when a confirmation is requested while another one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationPolicy {
    /// Wait behind the active request (FIFO)
    #[default]
    Queue,
    /// Fail the new request immediately
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationConfig {
    #[serde(default)]
    pub policy: ConfirmationPolicy,
    #[serde(default = "default_confirm_label")]
    pub confirm_label: String,
    #[serde(default = "default_cancel_label")]
    pub cancel_label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SseConfig {
    /// Keep-alive comment interval in seconds
    #[serde(default = "default_keep_alive_seconds")]
    pub keep_alive_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_capacity() -> usize {
    256
}

fn default_toast_ttl_ms() -> u64 {
    4000
}

fn default_confirm_label() -> String {
    "Confirmer".to_string()
}

fn default_cancel_label() -> String {
    "Annuler".to_string()
}

fn default_keep_alive_seconds() -> u64 {
    15
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("logging.level", default_log_level())?
            .set_default("notifications.toast.default_ttl_ms", default_toast_ttl_ms())?
            .set_default("notifications.confirmation.policy", "queue")?
            .set_default("sse.keep_alive_seconds", default_keep_alive_seconds())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // ARA__SERVER__PORT, ARA__NOTIFICATIONS__CONFIRMATION__POLICY, etc.
            .add_source(
                Environment::with_prefix("ARA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(","),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ToastConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            toast: ToastConfig::default(),
            confirmation: ConfirmationConfig::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: default_toast_ttl_ms(),
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            policy: ConfirmationPolicy::default(),
            confirm_label: default_confirm_label(),
            cancel_label: default_cancel_label(),
        }
    }
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            keep_alive_seconds: default_keep_alive_seconds(),
        }
    }
}
