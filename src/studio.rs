//! The facade a desktop front end talks to: explicit store instances plus an
//! adapter registry, wired once at startup. No global state; concurrent
//! operations are independent and last-writer-wins on the config file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::collections::{BankStore, CategoryStore, TemplateStore};
use crate::error::{PictorError, Result};
use crate::history::HistoryStore;
use crate::persist::ImageStore;
use crate::profile::{ConfigStore, ProviderInfo};
use crate::providers::AdapterRegistry;
use crate::request;
use crate::types::{GenerateRequest, GenerateResponse, GenerationParams, HistoryRecord};
use crate::utils::{unix_nanos, unix_timestamp};

pub struct Studio {
    config: ConfigStore,
    history: HistoryStore,
    images: ImageStore,
    templates: TemplateStore,
    banks: BankStore,
    categories: CategoryStore,
    registry: AdapterRegistry,
}

impl Studio {
    /// Opens (and on first run seeds) all stores under `data_dir`, with the
    /// built-in adapter registry.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let json_dir = data_dir.join("json");

        Ok(Self {
            config: ConfigStore::open(json_dir.join("config.json")).await?,
            history: HistoryStore::open(json_dir.join("ai-history.json")).await?,
            images: ImageStore::open(data_dir.join("images")).await?,
            templates: TemplateStore::new(json_dir.join("templates.json")),
            banks: BankStore::new(json_dir.join("banks.json")),
            categories: CategoryStore::new(json_dir.join("categories.json")),
            registry: AdapterRegistry::default(),
        })
    }

    /// Replaces the adapter registry, e.g. to plug in a custom provider.
    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn banks(&self) -> &BankStore {
        &self.banks
    }

    pub fn categories(&self) -> &CategoryStore {
        &self.categories
    }

    /// Credential-free descriptions of every configured provider.
    pub async fn providers(&self) -> Result<Vec<ProviderInfo>> {
        let config = self.config.load().await?;
        Ok(config.providers.values().map(|p| p.info()).collect())
    }

    /// Runs one generation and returns the uniform wire-shape response.
    /// Provider-level failures come back as structured errors inside the
    /// response; only infrastructure failures (config store I/O) are `Err`.
    pub async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        let (response, _) = self.dispatch(req).await?;
        Ok(response)
    }

    /// Like [`generate`](Self::generate), but on success also persists the
    /// returned images locally and appends a history record. Recording
    /// failures are logged, never allowed to mask a successful generation.
    pub async fn generate_and_record(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        let (response, params) = self.dispatch(req).await?;

        if response.success {
            if let Some(params) = params {
                let record = HistoryRecord {
                    id: format!("record_{}", unix_nanos()),
                    params,
                    images: response.images.clone(),
                    timestamp: unix_timestamp(),
                    metadata: BTreeMap::new(),
                };
                if let Err(err) = self.history.append(record, &self.images).await {
                    tracing::warn!(%err, "failed to append history record");
                }
            }
        }
        Ok(response)
    }

    async fn dispatch(
        &self,
        req: &GenerateRequest,
    ) -> Result<(GenerateResponse, Option<GenerationParams>)> {
        let config = self.config.load().await?;
        let Some(provider) = config.providers.get(&req.provider) else {
            let err = PictorError::ProviderNotConfigured(req.provider.clone());
            return Ok((GenerateResponse::from_result(&req.provider, Err(err)), None));
        };
        let adapter = match self.registry.get(&req.provider) {
            Ok(adapter) => adapter,
            Err(err) => {
                return Ok((GenerateResponse::from_result(&req.provider, Err(err)), None));
            }
        };

        let model = request::resolve_model(provider, req).to_string();
        let size = request::resolve_size(provider, req, &model, adapter.fallback_size());
        let params = GenerationParams {
            prompt: req.prompt.clone(),
            provider: req.provider.clone(),
            model,
            size,
            parameters: req.parameters.clone(),
        };

        let outcome = adapter.generate(provider, req).await;
        Ok((
            GenerateResponse::from_result(&req.provider, outcome),
            Some(params),
        ))
    }

    /// Persists a data URI or remote URL into the local image store.
    pub async fn persist_image(&self, source: &str) -> Result<std::path::PathBuf> {
        self.images.persist(source).await
    }

    /// Persists an image and appends a single-image history record for it.
    /// Returns the local path.
    pub async fn persist_and_record(
        &self,
        source: &str,
        params: GenerationParams,
    ) -> Result<std::path::PathBuf> {
        let local = self.images.persist(source).await?;
        let stamp = unix_nanos();
        let record = HistoryRecord {
            id: format!("record_{stamp}"),
            params,
            images: vec![crate::types::GeneratedImage::new(
                format!("img_{stamp}"),
                local.display().to_string(),
            )],
            timestamp: unix_timestamp(),
            metadata: BTreeMap::new(),
        };
        if let Err(err) = self.history.append(record, &self.images).await {
            tracing::warn!(%err, "failed to append history record");
        }
        Ok(local)
    }

    pub fn data_paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.images.dir())
    }
}
