use std::path::PathBuf;

use tokio::fs;

use crate::error::{PictorError, Result};
use crate::utils::unix_timestamp;

use super::config::{Configuration, ProviderConfig, ProviderUpdate};

/// Built-in provider catalog used to seed a fresh installation.
const EMBEDDED_DEFAULTS: &str = include_str!("default_providers.json");

/// JSON-file configuration store. Holds no in-memory state: every operation
/// loads a fresh snapshot and writes the whole snapshot back.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Opens the store, seeding the file from the embedded defaults on first
    /// run.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let store = Self { path };
        if !fs::try_exists(&store.path).await? {
            store.save(&Self::embedded_defaults()?).await?;
        }
        Ok(store)
    }

    pub fn embedded_defaults() -> Result<Configuration> {
        Ok(serde_json::from_str(EMBEDDED_DEFAULTS)?)
    }

    /// Loads the configuration, falling back to the embedded defaults when
    /// the file is missing or unreadable as JSON.
    pub async fn load(&self) -> Result<Configuration> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Self::embedded_defaults();
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&data) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "config file is corrupt, using embedded defaults");
                Self::embedded_defaults()
            }
        }
    }

    pub async fn save(&self, config: &Configuration) -> Result<()> {
        let data = serde_json::to_vec_pretty(config)?;
        fs::write(&self.path, data).await?;
        Ok(())
    }

    pub async fn provider(&self, id: &str) -> Result<ProviderConfig> {
        let config = self.load().await?;
        config
            .providers
            .get(id)
            .cloned()
            .ok_or_else(|| PictorError::ProviderNotConfigured(id.to_string()))
    }

    /// Applies a partial update to one provider and persists the snapshot.
    pub async fn update_provider(&self, id: &str, update: &ProviderUpdate) -> Result<()> {
        let mut config = self.load().await?;
        let provider = config
            .providers
            .get_mut(id)
            .ok_or_else(|| PictorError::ProviderNotConfigured(id.to_string()))?;

        if let Some(api_key) = &update.api_key {
            provider.api_key = api_key.clone();
        }
        if let Some(base_url) = &update.base_url {
            provider.base_url = base_url.clone();
        }
        if let Some(default_model) = &update.default_model {
            provider.default_model = default_model.clone();
        }
        if update.set_active {
            config.active_provider = id.to_string();
        }
        config.updated_at = unix_timestamp();

        self.save(&config).await
    }

    /// Presentation view of the configuration with API keys masked.
    pub async fn masked(&self) -> Result<Configuration> {
        let mut config = self.load().await?;
        for provider in config.providers.values_mut() {
            provider.api_key = mask_api_key(&provider.api_key);
        }
        Ok(config)
    }
}

fn mask_api_key(api_key: &str) -> String {
    if api_key.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}xxxxx{tail}")
    } else {
        "xxxxx".to_string()
    }
}
