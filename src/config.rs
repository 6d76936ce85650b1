use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::sync::WizardHistoryOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub wizard: WizardConfig,
    pub ui: UiConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The wizard hosted by the demo and the replay runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Ordered step names; the owning UI only advances through these
    pub steps: Vec<String>,
    /// Step shown on first render (must be one of `steps`)
    pub initial_step: String,
    /// Route to navigate to when backing out of the first step
    pub parent_path: String,
    /// Ask for confirmation before the tab closes
    #[serde(default = "default_has_unsaved_data")]
    pub has_unsaved_data: bool,
}

fn default_has_unsaved_data() -> bool {
    true
}

impl WizardConfig {
    pub fn contains_step(&self, step: &str) -> bool {
        self.steps.iter().any(|s| s == step)
    }

    /// Step that follows `step` in the configured order.
    pub fn next_step(&self, step: &str) -> Option<&str> {
        let position = self.steps.iter().position(|s| s == step)?;
        self.steps.get(position + 1).map(String::as_str)
    }

    /// Mount options for [`crate::WizardHistory`].
    pub fn options(&self) -> Result<WizardHistoryOptions<String>> {
        if self.steps.is_empty() {
            bail!("wizard.steps must list at least one step");
        }
        if !self.contains_step(&self.initial_step) {
            bail!(
                "wizard.initial_step '{}' is not one of the configured steps ({})",
                self.initial_step,
                self.steps.join(", ")
            );
        }
        Ok(
            WizardHistoryOptions::new(self.initial_step.clone(), self.parent_path.clone())
                .with_unsaved_data(self.has_unsaved_data),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub state: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

impl Config {
    /// Path to the project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".wizard-history/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the tool works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let project_config = Self::project_config_path();
        if project_config.exists() {
            builder = builder.add_source(config::File::from(project_config));
        }

        // User config in ~/.config/wizard-history/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("wizard-history").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with WIZARD_HISTORY_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("WIZARD_HISTORY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to .wizard-history/config.toml
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::project_config_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str = self.to_toml()?;
        std::fs::write(config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wizard: WizardConfig {
                steps: vec![
                    "pickup".to_string(),
                    "delivery".to_string(),
                    "freight".to_string(),
                    "rate".to_string(),
                    "review".to_string(),
                ],
                initial_step: "pickup".to_string(),
                parent_path: "/shipper/loads".to_string(),
                has_unsaved_data: default_has_unsaved_data(),
            },
            ui: UiConfig { tick_rate_ms: 250 },
            paths: PathsConfig {
                state: ".wizard-history".to_string(),
            },
            logging: LoggingConfig::default(),
        }
    }
}
