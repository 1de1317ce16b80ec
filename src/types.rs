use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PictorError, Result};

/// Provider-agnostic image generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Reference images as data URIs or local paths.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            provider: provider.into(),
            model: None,
            size: None,
            images: Vec::new(),
            parameters: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// One generated image. `url` is a remote URL, a data URI, or a local path
/// once the image has been persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl GeneratedImage {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            width: None,
            height: None,
        }
    }
}

/// Uniform error shape surfaced at the presentation boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Uniform result shape: success with a non-empty image list, or an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<GeneratedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl GenerateResponse {
    /// Normalizes an adapter outcome. An empty image list is folded into a
    /// typed error so callers can always tell "nothing" from "N images".
    pub fn from_result(provider: &str, result: Result<Vec<GeneratedImage>>) -> Self {
        let result = result.and_then(|images| {
            if images.is_empty() {
                Err(PictorError::NoImages {
                    detail: "response contained no image data".to_string(),
                })
            } else {
                Ok(images)
            }
        });

        match result {
            Ok(images) => Self {
                success: true,
                images,
                error: None,
            },
            Err(err) => Self {
                success: false,
                images: Vec::new(),
                error: Some(err.into_api_error(provider)),
            },
        }
    }
}

/// Parameters a generation was run with, kept alongside its history record.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationParams {
    pub prompt: String,
    pub provider: String,
    pub model: String,
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub params: GenerationParams,
    pub images: Vec<GeneratedImage>,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

/// A prompt template shown in the gallery. Names and content are keyed by
/// locale.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptTemplate {
    pub id: String,
    pub name: BTreeMap<String, String>,
    pub content: BTreeMap<String, String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "imageUrls", skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    pub author: String,
}

/// A word bank: a labelled set of interchangeable phrase options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BankItem {
    pub label: BTreeMap<String, String>,
    pub category: String,
    pub options: Vec<BTreeMap<String, String>>,
}

pub type BankMap = BTreeMap<String, BankItem>;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub id: String,
    pub label: BTreeMap<String, String>,
    pub color: String,
}

pub type CategoryMap = BTreeMap<String, Category>;
