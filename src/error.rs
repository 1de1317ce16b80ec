use thiserror::Error;

use crate::types::ApiError;

#[derive(Debug, Error)]
pub enum PictorError {
    #[error("api key is not configured for provider {0}")]
    MissingCredential(String),
    #[error("provider {0} is not configured")]
    ProviderNotConfigured(String),
    #[error("no adapter is registered for provider {0}")]
    UnsupportedProvider(String),
    #[error("no request template found for model {0}")]
    TemplateMissing(String),
    #[error("request template for model {0} did not render to an object")]
    TemplateMalformed(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("http error ({status}): {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("{provider} returned {code}: {message}")]
    Provider {
        provider: String,
        code: String,
        message: String,
        request_id: Option<String>,
    },
    #[error("no images were generated: {detail}")]
    NoImages { detail: String },
    #[error("invalid data uri")]
    InvalidDataUri,
    #[error("{0} not found")]
    NotFound(String),
    #[error("failed to decode image data: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("failed to decode base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
}

impl PictorError {
    /// Stable machine code for the uniform error wire shape.
    pub fn code(&self) -> &str {
        match self {
            Self::MissingCredential(_) => "MISSING_API_KEY",
            Self::ProviderNotConfigured(_) => "PROVIDER_NOT_FOUND",
            Self::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",
            Self::TemplateMissing(_) => "TEMPLATE_MISSING",
            Self::TemplateMalformed(_) => "TEMPLATE_MALFORMED",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Http { .. } => "HTTP_ERROR",
            Self::Provider { code, .. } => code.as_str(),
            Self::NoImages { .. } => "NO_IMAGES_GENERATED",
            Self::InvalidDataUri => "INVALID_DATA_URI",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            Self::Base64(_) => "INVALID_DATA_URI",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Converts into the uniform error shape, attributing it to `provider`.
    ///
    /// Provider-native errors keep their own provider id and request id.
    pub fn into_api_error(self, provider: &str) -> ApiError {
        match self {
            Self::Provider {
                provider,
                code,
                message,
                request_id,
            } => ApiError {
                code,
                message,
                provider,
                request_id,
            },
            other => ApiError {
                code: other.code().to_string(),
                message: other.to_string(),
                provider: provider.to_string(),
                request_id: None,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, PictorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_keeps_native_fields() {
        let err = PictorError::Provider {
            provider: "dashscope".to_string(),
            code: "Throttling.RateQuota".to_string(),
            message: "requests throttled".to_string(),
            request_id: Some("req-123".to_string()),
        };
        let api = err.into_api_error("ignored");
        assert_eq!(api.code, "Throttling.RateQuota");
        assert_eq!(api.provider, "dashscope");
        assert_eq!(api.request_id.as_deref(), Some("req-123"));
    }

    #[test]
    fn generic_errors_take_caller_provider() {
        let err = PictorError::MissingCredential("gemini".to_string());
        assert_eq!(err.code(), "MISSING_API_KEY");
        let api = err.into_api_error("gemini");
        assert_eq!(api.provider, "gemini");
        assert_eq!(api.request_id, None);
    }
}
