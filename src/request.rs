//! Turns a uniform request plus a provider configuration into the rendered,
//! provider-specific payload: resolves the effective model and size, applies
//! per-model reference image caps, and renders the request template.

use serde_json::{Map, Value};

use crate::error::{PictorError, Result};
use crate::profile::ProviderConfig;
use crate::template::{TemplateVariables, render};
use crate::types::GenerateRequest;

/// Effective model: the request's, else the provider default.
pub fn resolve_model<'a>(provider: &'a ProviderConfig, request: &'a GenerateRequest) -> &'a str {
    request
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(&provider.default_model)
}

/// Effective size: the request's, else the model's first size option, else
/// the adapter's fallback.
pub fn resolve_size(
    provider: &ProviderConfig,
    request: &GenerateRequest,
    model: &str,
    fallback: &str,
) -> String {
    if let Some(size) = request.size.as_deref().filter(|s| !s.trim().is_empty()) {
        return size.to_string();
    }
    provider
        .size_options
        .get(model)
        .and_then(|options| options.first())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

/// Takes at most the model's reference image cap, preserving order. A soft
/// limit: the remainder is dropped silently, never an error.
pub fn clamp_reference_images<'a>(
    provider: &ProviderConfig,
    model: &str,
    images: &'a [String],
) -> &'a [String] {
    let max = provider.capabilities(model).max_reference_images as usize;
    &images[..images.len().min(max)]
}

/// Request template for `model`, falling back to the provider's default
/// model's template.
pub fn find_template<'a>(provider: &'a ProviderConfig, model: &str) -> Result<&'a Value> {
    provider
        .request_template
        .get(model)
        .or_else(|| provider.request_template.get(&provider.default_model))
        .ok_or_else(|| PictorError::TemplateMissing(model.to_string()))
}

/// Variable set every adapter binds; adapters may add protocol-specific keys.
pub fn base_variables(prompt: &str, model: &str, size: &str) -> TemplateVariables {
    let mut vars = TemplateVariables::new();
    vars.insert("Prompt".to_string(), Value::String(prompt.to_string()));
    vars.insert("Model".to_string(), Value::String(model.to_string()));
    vars.insert("Size".to_string(), Value::String(size.to_string()));
    vars
}

/// Renders the model's template against `vars`. The result must be a JSON
/// object, since it becomes the HTTP request body.
pub fn build_payload(
    provider: &ProviderConfig,
    model: &str,
    vars: &TemplateVariables,
) -> Result<Map<String, Value>> {
    let template = find_template(provider, model)?;
    match render(template, vars) {
        Value::Object(map) => Ok(map),
        _ => Err(PictorError::TemplateMalformed(model.to_string())),
    }
}
