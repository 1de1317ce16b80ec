use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a single model supports beyond a plain text prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelCapabilities {
    pub supports_reference_image: bool,
    pub max_reference_images: u32,
}

/// Declarative description of one image generation provider: endpoint,
/// credentials, model catalog, per-model size options and capabilities, and
/// per-model request templates. Everything an adapter needs to build this
/// provider's bespoke payload lives here, not in code.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    /// Empty means "not configured"; generation refuses to start without it.
    pub api_key: String,
    pub base_url: String,
    /// Endpoint path; may contain a `{model}` placeholder.
    pub endpoint: String,
    pub models: Vec<String>,
    pub default_model: String,
    /// Ordered per-model size options; the first entry is the default.
    pub size_options: BTreeMap<String, Vec<String>>,
    pub model_capabilities: BTreeMap<String, ModelCapabilities>,
    /// Per-model request templates (JSON trees with `{{.Name}}` placeholders).
    pub request_template: BTreeMap<String, Value>,
}

impl ProviderConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn capabilities(&self, model: &str) -> ModelCapabilities {
        self.model_capabilities
            .get(model)
            .copied()
            .unwrap_or_default()
    }

    pub fn info(&self) -> ProviderInfo {
        ProviderInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            models: self.models.clone(),
            size_options: self.size_options.clone(),
            model_capabilities: self.model_capabilities.clone(),
        }
    }
}

/// Credential-free provider description for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub models: Vec<String>,
    pub size_options: BTreeMap<String, Vec<String>>,
    pub model_capabilities: BTreeMap<String, ModelCapabilities>,
}

/// Whole-snapshot application configuration. Loaded fresh per operation and
/// written back whole; concurrent writers are last-writer-wins.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub providers: BTreeMap<String, ProviderConfig>,
    pub active_provider: String,
    /// Unix seconds of the last save.
    pub updated_at: i64,
}

/// Partial provider update applied through the config store.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    pub set_active: bool,
}
