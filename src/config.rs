use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LifeConfig {
    /// Shortens hook bounds and disables signal handling
    #[serde(default = "default_test_mode")]
    pub test_mode: bool,

    pub hooks: HookConfig,
    pub signals: SignalConfig,

    /// Demo components registered by the `life` binary
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HookConfig {
    /// Bound on one hook group in milliseconds
    #[serde(default = "default_hook_timeout_ms")]
    pub timeout_ms: u64,

    /// Bound on one hook group when running in test mode
    #[serde(default = "default_hook_test_timeout_ms")]
    pub test_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SignalConfig {
    /// Observe SIGINT/SIGTERM once the application is running
    #[serde(default = "default_signals_enabled")]
    pub enabled: bool,

    /// How long a signal-driven shutdown may take before the process is forced out
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ComponentConfig {
    pub name: String,

    #[serde(default)]
    pub depends: Vec<String>,

    /// Simulated start work in milliseconds
    #[serde(default)]
    pub start_delay_ms: u64,

    /// Simulated stop work in milliseconds
    #[serde(default)]
    pub stop_delay_ms: u64,
}

impl LifeConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("life.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("test_mode", default_test_mode())?
            .set_default("hooks.timeout_ms", default_hook_timeout_ms() as i64)?
            .set_default("hooks.test_timeout_ms", default_hook_test_timeout_ms() as i64)?
            .set_default("signals.enabled", default_signals_enabled())?
            .set_default("signals.shutdown_timeout_ms", default_shutdown_timeout_ms() as i64)?
            .add_source(File::with_name(&path_str).required(false))
            // LIFE_HOOKS__TIMEOUT_MS, LIFE_SIGNALS__ENABLED, ...
            .add_source(
                Environment::with_prefix("LIFE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: LifeConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Configuration suited to running inside a test harness
    pub fn for_tests() -> Self {
        let mut config = Self::default();
        config.test_mode = true;
        config.signals.enabled = false;
        config
    }

    /// Bound applied to each hook group
    pub fn hook_timeout(&self) -> Duration {
        if self.test_mode {
            Duration::from_millis(self.hooks.test_timeout_ms)
        } else {
            Duration::from_millis(self.hooks.timeout_ms)
        }
    }

    /// Bound applied to a signal-driven shutdown
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.signals.shutdown_timeout_ms)
    }

    /// Whether `start` should spawn the OS signal monitor
    pub fn watches_signals(&self) -> bool {
        self.signals.enabled && !self.test_mode
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hooks.timeout_ms == 0 || self.hooks.test_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Hook timeouts must be greater than 0".to_string(),
            ));
        }

        if self.signals.shutdown_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Signal shutdown timeout must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for component in &self.components {
            if component.name.is_empty() {
                return Err(ConfigError::Message(
                    "Component name must not be empty".to_string(),
                ));
            }
            if !seen.insert(component.name.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Component '{}' is listed more than once",
                    component.name
                )));
            }
        }

        Ok(())
    }
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            test_mode: default_test_mode(),
            hooks: HookConfig {
                timeout_ms: default_hook_timeout_ms(),
                test_timeout_ms: default_hook_test_timeout_ms(),
            },
            signals: SignalConfig {
                enabled: default_signals_enabled(),
                shutdown_timeout_ms: default_shutdown_timeout_ms(),
            },
            components: Vec::new(),
        }
    }
}

// Default value functions
fn default_test_mode() -> bool {
    false
}

fn default_hook_timeout_ms() -> u64 {
    30_000
}
fn default_hook_test_timeout_ms() -> u64 {
    1_000
}

fn default_signals_enabled() -> bool {
    true
}
fn default_shutdown_timeout_ms() -> u64 {
    60_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = LifeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hook_timeout(), Duration::from_secs(30));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(60));
        assert!(config.watches_signals());
    }

    #[test]
    fn test_test_mode_shortens_hook_bound() {
        let config = LifeConfig::for_tests();
        assert_eq!(config.hook_timeout(), Duration::from_secs(1));
        assert!(!config.watches_signals());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[hooks]
timeout_ms = 500

[signals]
enabled = false

[[components]]
name = "db"

[[components]]
name = "web"
depends = ["db"]
start_delay_ms = 20
"#
        )
        .unwrap();

        let config = LifeConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.hooks.timeout_ms, 500);
        assert_eq!(config.hooks.test_timeout_ms, 1_000);
        assert!(!config.signals.enabled);
        assert_eq!(config.components.len(), 2);
        assert_eq!(config.components[1].depends, vec!["db".to_string()]);
        assert_eq!(config.components[1].start_delay_ms, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = LifeConfig::load_from_file("/nonexistent/life.toml").unwrap();
        assert_eq!(config.hooks.timeout_ms, 30_000);
        assert!(config.components.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LifeConfig::default();
        config.hooks.timeout_ms = 0;
        assert!(config.validate().is_err());

        config.hooks.timeout_ms = 10;
        config.components = vec![
            ComponentConfig {
                name: "db".to_string(),
                depends: Vec::new(),
                start_delay_ms: 0,
                stop_delay_ms: 0,
            },
            ComponentConfig {
                name: "db".to_string(),
                depends: Vec::new(),
                start_delay_ms: 0,
                stop_delay_ms: 0,
            },
        ];
        assert!(config.validate().is_err());

        config.components.pop();
        assert!(config.validate().is_ok());
    }
}
