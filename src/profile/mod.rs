mod config;
mod store;

pub use config::{
    Configuration, ModelCapabilities, ProviderConfig, ProviderInfo, ProviderUpdate,
};
pub use store::ConfigStore;
