//! Provider-agnostic AI image generation for desktop tools.
//!
//! The core is a declarative provider adapter layer: provider configuration
//! data (endpoint, auth, model catalog, per-model request templates) drives
//! how a uniform request becomes each provider's bespoke JSON payload, and
//! how each provider's bespoke response becomes a uniform result. Around it
//! sit the JSON-file stores a front end needs: configuration, generation
//! history (with local image persistence), prompt templates, word banks,
//! and categories.

pub mod collections;
mod error;
pub mod history;
pub mod persist;
pub mod profile;
pub mod providers;
pub mod request;
mod studio;
pub mod template;
pub mod types;
mod utils;

pub use error::{PictorError, Result};
pub use studio::Studio;

pub use collections::{BankStore, CategoryStore, TemplateStore};
pub use history::HistoryStore;
pub use persist::ImageStore;
pub use profile::{
    ConfigStore, Configuration, ModelCapabilities, ProviderConfig, ProviderInfo, ProviderUpdate,
};
pub use providers::{AdapterRegistry, ProviderAdapter};
pub use template::{TemplateVariables, render};
pub use types::{
    ApiError, BankItem, BankMap, Category, CategoryMap, GenerateRequest, GenerateResponse,
    GeneratedImage, GenerationParams, HistoryRecord, PromptTemplate,
};

#[cfg(feature = "provider-chat-choices")]
pub use providers::ChatChoicesAdapter;
#[cfg(feature = "provider-genai")]
pub use providers::GenAiAdapter;
