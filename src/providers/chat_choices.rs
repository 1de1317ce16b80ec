//! Adapter for providers that answer a single-turn image request with a
//! chat-style `output.choices[].message.content[].image` envelope
//! (DashScope's multimodal generation API and compatibles).

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{PictorError, Result};
use crate::profile::ProviderConfig;
use crate::types::GeneratedImage;
use crate::utils::unix_nanos;

use super::ProviderAdapter;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Clone)]
pub struct ChatChoicesAdapter {
    http: reqwest::Client,
}

impl ChatChoicesAdapter {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http }
    }
}

impl Default for ChatChoicesAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize, Default)]
struct ChoicesEnvelope {
    #[serde(default)]
    output: ChoicesOutput,
    #[serde(default)]
    usage: ChoicesUsage,
}

#[derive(Debug, Deserialize, Default)]
struct ChoicesOutput {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize, Default)]
struct Choice {
    #[serde(default)]
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize, Default)]
struct ChoiceMessage {
    #[serde(default)]
    content: Vec<ChoiceContent>,
}

#[derive(Debug, Deserialize, Default)]
struct ChoiceContent {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ChoicesUsage {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ChoicesErrorEnvelope {
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl ProviderAdapter for ChatChoicesAdapter {
    fn protocol(&self) -> &'static str {
        "chat-choices"
    }

    fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn fallback_size(&self) -> &'static str {
        "1536*1536"
    }

    fn authenticate(
        &self,
        provider: &ProviderConfig,
        req: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        req.bearer_auth(provider.api_key.trim())
    }

    fn parse_success(&self, provider: &ProviderConfig, body: &[u8]) -> Result<Vec<GeneratedImage>> {
        let _ = provider;
        let envelope: ChoicesEnvelope = serde_json::from_slice(body)?;

        let mut images = Vec::new();
        if let Some(choice) = envelope.output.choices.first() {
            for content in &choice.message.content {
                if let Some(url) = content.image.as_deref().filter(|u| !u.is_empty()) {
                    let mut image = GeneratedImage::new(format!("img_{}", unix_nanos()), url);
                    image.width = envelope.usage.width;
                    image.height = envelope.usage.height;
                    images.push(image);
                }
            }
        }

        if images.is_empty() {
            return Err(PictorError::NoImages {
                detail: "no images were generated in the response".to_string(),
            });
        }
        Ok(images)
    }

    fn parse_error(
        &self,
        provider: &ProviderConfig,
        status: reqwest::StatusCode,
        body: String,
    ) -> PictorError {
        if let Ok(envelope) = serde_json::from_str::<ChoicesErrorEnvelope>(&body) {
            if !envelope.code.is_empty() {
                return PictorError::Provider {
                    provider: provider.id.clone(),
                    code: envelope.code,
                    message: envelope.message,
                    request_id: envelope.request_id,
                };
            }
        }
        PictorError::Http { status, body }
    }
}
