//! Provider adapters: one per distinct wire protocol, all driven by
//! [`ProviderConfig`] data rather than per-provider code paths.

#[cfg(feature = "provider-chat-choices")]
pub mod chat_choices;
#[cfg(feature = "provider-genai")]
pub mod genai;

#[cfg(feature = "provider-chat-choices")]
pub use chat_choices::ChatChoicesAdapter;
#[cfg(feature = "provider-genai")]
pub use genai::GenAiAdapter;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{PictorError, Result};
use crate::profile::ProviderConfig;
use crate::request;
use crate::template::TemplateVariables;
use crate::types::{GenerateRequest, GeneratedImage};
use crate::utils::http::{MAX_ERROR_BODY_BYTES, response_text_truncated};

/// One wire protocol's worth of transport, auth, and envelope parsing.
///
/// The provided [`generate`](ProviderAdapter::generate) drives the whole
/// call: credential check, payload rendering, a single-shot POST, and
/// success/error parsing. Adapters own their HTTP client so timeout and
/// protocol policy can differ per protocol.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Short name of the wire protocol this adapter speaks.
    fn protocol(&self) -> &'static str;

    fn http(&self) -> &reqwest::Client;

    /// Size used when neither the request nor the model's size options
    /// supply one.
    fn fallback_size(&self) -> &'static str;

    /// Full URL of the call. A `{model}` placeholder in the configured
    /// endpoint path is substituted with the effective model.
    fn endpoint_url(&self, provider: &ProviderConfig, model: &str) -> String {
        let endpoint = provider.endpoint.replace("{model}", model);
        format!("{}{endpoint}", provider.base_url.trim_end_matches('/'))
    }

    /// Template variables for this protocol. Always binds
    /// `Prompt`/`Model`/`Size`; adapters may add protocol-specific keys.
    fn build_variables(
        &self,
        provider: &ProviderConfig,
        req: &GenerateRequest,
        model: &str,
        size: &str,
    ) -> Result<TemplateVariables> {
        let _ = provider;
        Ok(request::base_variables(&req.prompt, model, size))
    }

    /// Attaches this provider's auth scheme to the outgoing request.
    fn authenticate(
        &self,
        provider: &ProviderConfig,
        req: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder;

    /// Unpacks a 2xx body into images. An image-free body is an error, never
    /// an empty success.
    fn parse_success(&self, provider: &ProviderConfig, body: &[u8]) -> Result<Vec<GeneratedImage>>;

    /// Maps a non-2xx response to the provider's native error shape when the
    /// body matches it, else to a generic HTTP error.
    fn parse_error(
        &self,
        provider: &ProviderConfig,
        status: reqwest::StatusCode,
        body: String,
    ) -> PictorError;

    /// Runs one generation. Single attempt; transient failures surface as
    /// errors for the caller to retry at their discretion.
    async fn generate(
        &self,
        provider: &ProviderConfig,
        req: &GenerateRequest,
    ) -> Result<Vec<GeneratedImage>> {
        if !provider.has_api_key() {
            return Err(PictorError::MissingCredential(provider.id.clone()));
        }

        let model = request::resolve_model(provider, req).to_string();
        let size = request::resolve_size(provider, req, &model, self.fallback_size());
        let vars = self.build_variables(provider, req, &model, &size)?;
        let payload = request::build_payload(provider, &model, &vars)?;

        let url = self.endpoint_url(provider, &model);
        tracing::debug!(provider = %provider.id, %model, protocol = self.protocol(), "sending generation request");
        let http_req = self.http().post(url).json(&Value::Object(payload));
        let response = self.authenticate(provider, http_req).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response_text_truncated(response, MAX_ERROR_BODY_BYTES).await;
            return Err(self.parse_error(provider, status, body));
        }

        let body = response.bytes().await?;
        self.parse_success(provider, &body)
    }
}

impl std::fmt::Debug for dyn ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("protocol", &self.protocol())
            .finish()
    }
}

/// Maps provider ids to adapter instances. New providers plug in through
/// [`register`](AdapterRegistry::register) instead of new code paths.
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self {
            adapters: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, provider_id: impl Into<String>, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(provider_id.into(), adapter);
    }

    pub fn get(&self, provider_id: &str) -> Result<Arc<dyn ProviderAdapter>> {
        self.adapters
            .get(provider_id)
            .cloned()
            .ok_or_else(|| PictorError::UnsupportedProvider(provider_id.to_string()))
    }

    pub fn provider_ids(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }
}

impl Default for AdapterRegistry {
    /// Registry with the built-in wire protocols wired to the providers the
    /// embedded catalog ships.
    fn default() -> Self {
        let mut registry = Self::empty();
        #[cfg(feature = "provider-chat-choices")]
        registry.register("dashscope", Arc::new(ChatChoicesAdapter::new()));
        #[cfg(feature = "provider-genai")]
        registry.register("gemini", Arc::new(GenAiAdapter::new()));
        registry
    }
}
