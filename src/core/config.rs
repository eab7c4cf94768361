use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const LUNCH_MONEY_BASE_URL: &str = "https://dev.lunchmoney.app";
pub const KUBERA_BASE_URL: &str = "https://api.kubera.com/api";

fn default_lunch_money_base_url() -> String {
    LUNCH_MONEY_BASE_URL.to_string()
}

fn default_kubera_base_url() -> String {
    KUBERA_BASE_URL.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LunchMoneyConfig {
    #[serde(default = "default_lunch_money_base_url")]
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct KuberaConfig {
    #[serde(default = "default_kubera_base_url")]
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub portfolio_id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    pub lunch_money: Option<LunchMoneyConfig>,
    pub kubera: Option<KuberaConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("app", "wealthtree", "wealthtree")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn lunch_money(&self) -> Result<&LunchMoneyConfig> {
        self.providers
            .lunch_money
            .as_ref()
            .context("Lunch Money provider is not configured: add providers.lunch_money.token to the config file")
    }

    pub fn kubera(&self) -> Result<&KuberaConfig> {
        self.providers.kubera.as_ref().context(
            "Kubera provider is not configured: add providers.kubera.api_key, api_secret and portfolio_id to the config file",
        )
    }
}
