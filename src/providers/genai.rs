//! Adapter for providers that speak the GenAI `candidates[].content.parts[]`
//! protocol with inline binary data (Gemini image models and compatibles).
//!
//! Reference images travel inside the request as content parts, so payloads
//! are large and slow upstream; the client uses a longer timeout and forces
//! HTTP/1.1, since protocol negotiation over some proxies truncates reads.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{PictorError, Result};
use crate::profile::ProviderConfig;
use crate::request;
use crate::template::TemplateVariables;
use crate::types::{GenerateRequest, GeneratedImage};
use crate::utils::unix_nanos;

use super::ProviderAdapter;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

const AUTH_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GenAiAdapter {
    http: reqwest::Client,
}

impl GenAiAdapter {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .http1_only()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http }
    }
}

impl Default for GenAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a `data:<mime>;base64,<payload>` reference into mime and payload.
fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let (header, data) = uri.split_once(";base64,")?;
    Some((header.strip_prefix("data:")?, data))
}

#[derive(Debug, Deserialize, Default)]
struct GenAiEnvelope {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize, Default)]
struct GenAiErrorEnvelope {
    #[serde(default)]
    error: GenAiErrorBody,
}

#[derive(Debug, Deserialize, Default)]
struct GenAiErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[async_trait]
impl ProviderAdapter for GenAiAdapter {
    fn protocol(&self) -> &'static str {
        "genai-parts"
    }

    fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn fallback_size(&self) -> &'static str {
        "1:1"
    }

    /// Binds `ContentParts`: the prompt text part followed by up to the
    /// model's cap of reference images as inline data parts. References
    /// that are not data URIs are skipped.
    fn build_variables(
        &self,
        provider: &ProviderConfig,
        req: &GenerateRequest,
        model: &str,
        size: &str,
    ) -> Result<TemplateVariables> {
        let mut parts = vec![json!({ "text": req.prompt })];
        for reference in request::clamp_reference_images(provider, model, &req.images) {
            let Some((mime_type, data)) = split_data_uri(reference) else {
                continue;
            };
            parts.push(json!({
                "inlineData": { "mimeType": mime_type, "data": data }
            }));
        }

        let mut vars = request::base_variables(&req.prompt, model, size);
        vars.insert("ContentParts".to_string(), Value::Array(parts));
        Ok(vars)
    }

    fn authenticate(
        &self,
        provider: &ProviderConfig,
        req: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        req.header(AUTH_HEADER, provider.api_key.trim())
    }

    fn parse_success(&self, provider: &ProviderConfig, body: &[u8]) -> Result<Vec<GeneratedImage>> {
        let _ = provider;
        let envelope: GenAiEnvelope = serde_json::from_slice(body)?;

        let mut images = Vec::new();
        if let Some(candidate) = envelope.candidates.first() {
            for part in &candidate.content.parts {
                let Some(inline) = &part.inline_data else {
                    continue;
                };
                if inline.data.is_empty() {
                    continue;
                }
                // Self-contained reference; no follow-up fetch needed.
                let data_uri = format!("data:{};base64,{}", inline.mime_type, inline.data);
                images.push(GeneratedImage::new(format!("img_{}", unix_nanos()), data_uri));
            }
        }

        if images.is_empty() {
            // Surface any text the model returned (refusal, explanation).
            let mut detail = String::from("response contained no image data");
            let text: Vec<&str> = envelope
                .candidates
                .iter()
                .flat_map(|c| &c.content.parts)
                .filter_map(|p| p.text.as_deref())
                .filter(|t| !t.is_empty())
                .collect();
            if !text.is_empty() {
                detail.push_str(". Model output: ");
                detail.push_str(&text.join(" "));
            }
            return Err(PictorError::NoImages { detail });
        }
        Ok(images)
    }

    fn parse_error(
        &self,
        provider: &ProviderConfig,
        status: reqwest::StatusCode,
        body: String,
    ) -> PictorError {
        if let Ok(envelope) = serde_json::from_str::<GenAiErrorEnvelope>(&body) {
            if envelope.error.code != 0 {
                return PictorError::Provider {
                    provider: provider.id.clone(),
                    code: envelope.error.status,
                    message: envelope.error.message,
                    request_id: None,
                };
            }
        }
        PictorError::Http { status, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ModelCapabilities;
    use serde_json::json;

    fn provider_fixture() -> ProviderConfig {
        let mut provider = ProviderConfig {
            id: "gemini".to_string(),
            api_key: "key".to_string(),
            endpoint: "/v1beta/models/{model}:generateContent".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            default_model: "gemini-2.5-flash-image".to_string(),
            ..ProviderConfig::default()
        };
        provider.model_capabilities.insert(
            "gemini-2.5-flash-image".to_string(),
            ModelCapabilities {
                supports_reference_image: true,
                max_reference_images: 2,
            },
        );
        provider
    }

    #[test]
    fn endpoint_substitutes_model() {
        let adapter = GenAiAdapter::new();
        let url = adapter.endpoint_url(&provider_fixture(), "gemini-2.5-flash-image");
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn content_parts_carry_prompt_then_capped_references() {
        let adapter = GenAiAdapter::new();
        let provider = provider_fixture();
        let req = GenerateRequest::new("a fox", "gemini").with_images(vec![
            "data:image/png;base64,AAAA".to_string(),
            "not-a-data-uri".to_string(),
            "data:image/jpeg;base64,BBBB".to_string(),
            "data:image/png;base64,CCCC".to_string(),
        ]);

        let vars = adapter
            .build_variables(&provider, &req, "gemini-2.5-flash-image", "1:1")
            .expect("vars");
        let parts = vars["ContentParts"].as_array().expect("array");
        // Cap is 2: the first two references are considered, the malformed
        // one is skipped, everything past the cap is dropped.
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], json!({ "text": "a fox" }));
        assert_eq!(
            parts[1],
            json!({ "inlineData": { "mimeType": "image/png", "data": "AAAA" } })
        );
    }

    #[test]
    fn inline_data_becomes_data_uri() {
        let adapter = GenAiAdapter::new();
        let body = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": "AQID" } }
                ]}
            }]
        });
        let images = adapter
            .parse_success(&provider_fixture(), body.to_string().as_bytes())
            .expect("images");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "data:image/png;base64,AQID");
    }

    #[test]
    fn text_only_response_is_no_images_with_model_output() {
        let adapter = GenAiAdapter::new();
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "I cannot draw that." }] }
            }]
        });
        let err = adapter
            .parse_success(&provider_fixture(), body.to_string().as_bytes())
            .expect_err("no images");
        assert_eq!(err.code(), "NO_IMAGES_GENERATED");
        assert!(err.to_string().contains("I cannot draw that."));
    }

    #[test]
    fn structured_error_envelope_maps_to_provider_error() {
        let adapter = GenAiAdapter::new();
        let body = json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        });
        let err = adapter.parse_error(
            &provider_fixture(),
            reqwest::StatusCode::BAD_REQUEST,
            body.to_string(),
        );
        match err {
            PictorError::Provider { code, message, .. } => {
                assert_eq!(code, "INVALID_ARGUMENT");
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
