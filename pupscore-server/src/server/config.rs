use pupscore_shared::domain::{AchievementDefinition, ChallengeDefinition};
use pupscore_shared::gamification::NotifierSettings;
use serde::Deserialize;
use std::{env, fs, path::Path};

/// Upper bound for notifier durations (one week). Larger values would push
/// timestamp arithmetic out of range.
pub const MAX_NOTIFY_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub achievements: Vec<AchievementDefinition>,
    #[serde(default)]
    pub challenges: Vec<ChallengeDefinition>,
    #[serde(default)]
    pub notifications: NotifierSettings,
    pub dev_cors_origin: Option<String>,
    pub listen_port: Option<u16>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Yaml(e) => write!(f, "YAML error: {}", e),
            ConfigError::Invalid(m) => write!(f, "invalid config: {}", m),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        ConfigError::Yaml(value)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        Self::load_from_path(path)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for a in &self.achievements {
            if !seen.insert(&a.id.0) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate achievement id: {}",
                    a.id
                )));
            }
        }
        let durations = [
            ("window_secs", self.notifications.window_secs),
            ("cooldown_secs", self.notifications.cooldown_secs),
        ];
        for (name, secs) in durations {
            if secs > MAX_NOTIFY_SECS {
                return Err(ConfigError::Invalid(format!(
                    "notifications.{name} must be at most {MAX_NOTIFY_SECS}, got {secs}"
                )));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for c in &self.challenges {
            if !seen.insert(&c.id.0) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate challenge id: {}",
                    c.id
                )));
            }
        }
        Ok(())
    }
}
