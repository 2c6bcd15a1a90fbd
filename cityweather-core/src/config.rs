use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    model::Credential,
    provider::ProviderId,
    rate_limit::DEFAULT_DELAY,
    units::UnitSelection,
};

/// Environment variable that overrides `api_key` from the config file.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

pub const DEFAULT_BASE_URL: &str = "http://api.weatherstack.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_LOCATIONS: &[&str] = &[
    "New York",
    "Los Angeles",
    "Chicago",
    "Houston",
    "Phoenix",
    "Philadelphia",
    "Seattle",
    "San Diego",
    "Boston",
    "San Jose",
];

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// units = "metric"
/// locations = ["Boston", "Seattle"]
/// delay_ms = 1000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Default unit selection, e.g. "imperial" or "m".
    pub units: Option<String>,

    /// Locations queried when none are given on the command line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,

    /// Provider short name, "weatherstack" or "sample".
    pub provider: Option<String>,

    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,

    /// Minimum pause between requests, in milliseconds.
    pub delay_ms: Option<u64>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Credential from `WEATHER_API_KEY`, falling back to the file's `api_key`.
    ///
    /// Blank values count as absent.
    pub fn credential(&self) -> Option<Credential> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        self.credential_with_env(from_env.as_deref())
    }

    fn credential_with_env(&self, env_value: Option<&str>) -> Option<Credential> {
        [env_value, self.api_key.as_deref()]
            .into_iter()
            .flatten()
            .map(Credential::new)
            .find(|c| !c.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Configured unit selection, or imperial when unset.
    pub fn unit_selection(&self) -> Result<UnitSelection> {
        match &self.units {
            Some(units) => UnitSelection::try_from(units.as_str())
                .with_context(|| "Invalid `units` in config file"),
            None => Ok(UnitSelection::default()),
        }
    }

    pub fn provider_id(&self) -> Result<ProviderId> {
        match &self.provider {
            Some(p) => Ok(ProviderId::try_from(p.as_str())?),
            None => Ok(ProviderId::Weatherstack),
        }
    }

    pub fn locations(&self) -> Vec<String> {
        if self.locations.is_empty() {
            DEFAULT_LOCATIONS.iter().map(|l| l.to_string()).collect()
        } else {
            self.locations.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn delay(&self) -> Duration {
        self.delay_ms.map(Duration::from_millis).unwrap_or(DEFAULT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let cfg = Config::default();

        assert_eq!(cfg.unit_selection().unwrap(), UnitSelection::Imperial);
        assert_eq!(cfg.provider_id().unwrap(), ProviderId::Weatherstack);
        assert_eq!(cfg.locations().len(), 10);
        assert_eq!(cfg.locations()[0], "New York");
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.delay(), Duration::from_secs(1));
    }

    #[test]
    fn env_credential_wins_over_file() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let cred = cfg.credential_with_env(Some("ENV_KEY")).expect("credential");
        assert_eq!(cred.expose(), "ENV_KEY");
    }

    #[test]
    fn blank_env_credential_falls_back_to_file() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let cred = cfg.credential_with_env(Some("   ")).expect("credential");
        assert_eq!(cred.expose(), "FILE_KEY");
    }

    #[test]
    fn no_credential_anywhere() {
        let cfg = Config { api_key: Some(String::new()), ..Default::default() };
        assert!(cfg.credential_with_env(None).is_none());
    }

    #[test]
    fn invalid_units_in_file_is_an_error() {
        let cfg = Config { units: Some("furlongs".into()), ..Default::default() };
        let err = cfg.unit_selection().unwrap_err();
        assert!(format!("{err:#}").contains("Unknown unit selection 'furlongs'"));
    }

    #[test]
    fn parses_toml() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "KEY"
            units = "m"
            locations = ["Boston", "Seattle"]
            provider = "sample"
            delay_ms = 250
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.unit_selection().unwrap(), UnitSelection::Metric);
        assert_eq!(cfg.provider_id().unwrap(), ProviderId::Sample);
        assert_eq!(cfg.locations(), vec!["Boston".to_string(), "Seattle".to_string()]);
        assert_eq!(cfg.delay(), Duration::from_millis(250));
    }

    #[test]
    fn toml_roundtrip_keeps_fields() {
        let cfg = Config {
            api_key: Some("KEY".into()),
            units: Some("scientific".into()),
            ..Default::default()
        };

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let back: Config = toml::from_str(&text).expect("parse");
        assert_eq!(back.api_key.as_deref(), Some("KEY"));
        assert_eq!(back.unit_selection().unwrap(), UnitSelection::Scientific);
    }
}
