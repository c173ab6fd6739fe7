use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::{Result, ToastError};
use crate::notification::{Position, StackOrder};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub toast: ToastConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-scope toast behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct ToastConfig {
    /// Corner the stack is anchored to (presentation only)
    #[serde(default)]
    pub position: Position,
    /// Auto-dismiss delay in milliseconds when a toast doesn't set its own
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,
    /// Maximum toasts kept at once; oldest are evicted beyond this
    #[serde(default = "default_max_visible")]
    pub max_visible: Option<usize>,
    /// Exit animation delay between `leaving` and removal, in milliseconds
    #[serde(default = "default_exit_delay_ms")]
    pub exit_delay_ms: u64,
    #[serde(default)]
    pub order: StackOrder,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

fn default_duration_ms() -> u64 {
    3500
}

fn default_max_visible() -> Option<usize> {
    Some(4)
}

fn default_exit_delay_ms() -> u64 {
    380
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> std::result::Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("toast.position", "top-right")?
            .set_default("toast.default_duration_ms", default_duration_ms())?
            .set_default("toast.exit_delay_ms", default_exit_delay_ms())?
            .set_default("toast.order", "oldest-first")?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // TOAST__MAX_VISIBLE, TOAST__DEFAULT_DURATION_MS, LOGGING__LEVEL, etc.
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl ToastConfig {
    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }

    pub fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_duration_ms == 0 {
            return Err(ToastError::InvalidConfig(
                "default_duration_ms must be positive".to_string(),
            ));
        }
        if self.max_visible == Some(0) {
            return Err(ToastError::InvalidConfig(
                "max_visible must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            position: Position::default(),
            default_duration_ms: default_duration_ms(),
            max_visible: default_max_visible(),
            exit_delay_ms: default_exit_delay_ms(),
            order: StackOrder::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let toast = ToastConfig::default();
        assert_eq!(toast.position, Position::TopRight);
        assert_eq!(toast.default_duration(), Duration::from_millis(3500));
        assert_eq!(toast.max_visible, Some(4));
        assert_eq!(toast.exit_delay(), Duration::from_millis(380));
        assert_eq!(toast.order, StackOrder::OldestFirst);
        assert!(toast.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let toast = ToastConfig {
            max_visible: Some(0),
            ..Default::default()
        };
        assert!(matches!(toast.validate(), Err(ToastError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_default_duration() {
        let toast = ToastConfig {
            default_duration_ms: 0,
            ..Default::default()
        };
        assert!(matches!(toast.validate(), Err(ToastError::InvalidConfig(_))));
    }

    #[test]
    fn test_unbounded_is_valid() {
        let toast = ToastConfig {
            max_visible: None,
            ..Default::default()
        };
        assert!(toast.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_section() {
        let settings: Settings = Config::builder()
            .set_override("toast.max_visible", 1)
            .unwrap()
            .set_override("toast.order", "newest-first")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.toast.max_visible, Some(1));
        assert_eq!(settings.toast.order, StackOrder::NewestFirst);
        assert_eq!(settings.toast.default_duration_ms, 3500);
        assert_eq!(settings.logging.level, "info");
    }
}
