//! Plain keyed JSON collections: prompt templates, word banks, categories.
//! Each store is a thin load/save wrapper around one file; a missing or
//! unparseable file yields an empty collection.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;

use crate::error::{PictorError, Result};
use crate::persist::ImageStore;
use crate::types::{BankItem, BankMap, Category, CategoryMap, PromptTemplate};

async fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let data = match fs::read(path).await {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => return Err(err.into()),
    };
    match serde_json::from_slice(&data) {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "collection file is corrupt, starting empty");
            Ok(T::default())
        }
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, serde_json::to_vec_pretty(value)?).await?;
    Ok(())
}

/// Prompt template gallery, stored as a JSON list.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
}

impl TemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Vec<PromptTemplate>> {
        read_or_default(&self.path).await
    }

    pub async fn save(&self, templates: &[PromptTemplate]) -> Result<()> {
        write_json(&self.path, &templates).await
    }

    /// Adds the template or replaces the one sharing its id.
    pub async fn upsert(&self, template: PromptTemplate) -> Result<()> {
        let mut templates = self.load().await?;
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => templates.push(template),
        }
        self.save(&templates).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut templates = self.load().await?;
        templates.retain(|t| t.id != id);
        self.save(&templates).await
    }

    /// Persists `source` through the image pipeline and sets it as the
    /// template's cover. Returns the local path.
    pub async fn set_cover(
        &self,
        id: &str,
        source: &str,
        images: &ImageStore,
    ) -> Result<String> {
        let local_path = images.persist(source).await?;
        let local = local_path.display().to_string();

        let mut templates = self.load().await?;
        let template = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| PictorError::NotFound(format!("template {id}")))?;
        template.image_url = local.clone();

        self.save(&templates).await?;
        Ok(local)
    }
}

/// Word banks keyed by bank id.
#[derive(Debug, Clone)]
pub struct BankStore {
    path: PathBuf,
}

impl BankStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<BankMap> {
        read_or_default(&self.path).await
    }

    pub async fn save(&self, banks: &BankMap) -> Result<()> {
        write_json(&self.path, banks).await
    }

    pub async fn upsert(&self, key: &str, item: BankItem) -> Result<()> {
        let mut banks = self.load().await?;
        banks.insert(key.to_string(), item);
        self.save(&banks).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut banks = self.load().await?;
        banks.remove(key);
        self.save(&banks).await
    }
}

/// Category definitions keyed by category id.
#[derive(Debug, Clone)]
pub struct CategoryStore {
    path: PathBuf,
}

impl CategoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<CategoryMap> {
        read_or_default(&self.path).await
    }

    pub async fn save(&self, categories: &CategoryMap) -> Result<()> {
        write_json(&self.path, categories).await
    }

    /// Inserts or replaces a category; the map key wins over any id carried
    /// in the value.
    pub async fn upsert(&self, key: &str, mut category: Category) -> Result<()> {
        category.id = key.to_string();
        let mut categories = self.load().await?;
        categories.insert(key.to_string(), category);
        self.save(&categories).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut categories = self.load().await?;
        categories.remove(key);
        self.save(&categories).await
    }
}
