//! Model management for downloading and caching Hugging Face models

use crate::config::AvailableModel;
use crate::error::{Result, ResumeWriterError};
use hf_hub::api::tokio::Api;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Manager for pre-trained models - handles download, caching, and lookup.
/// The set of known models comes from the configuration registry.
pub struct ModelManager {
    models_dir: PathBuf,
    registry: HashMap<String, AvailableModel>,
    downloaded_models: HashSet<String>,
    api: Api,
}

impl ModelManager {
    pub async fn new(models_dir: PathBuf, available: &[AvailableModel]) -> Result<Self> {
        if !models_dir.exists() {
            fs::create_dir_all(&models_dir).await.map_err(|e| {
                ResumeWriterError::ModelError(format!("Failed to create models directory: {}", e))
            })?;
        }

        let api = Api::new().map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to initialize HF API: {}", e))
        })?;

        let registry = available
            .iter()
            .map(|m| (m.name.clone(), m.clone()))
            .collect();

        let mut manager = Self {
            models_dir,
            registry,
            downloaded_models: HashSet::new(),
            api,
        };

        manager.scan_downloaded_models().await?;
        Ok(manager)
    }

    /// Scan for already downloaded models
    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await.map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to scan models directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to read directory entry: {}", e))
        })? {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);

            if is_dir {
                let model_name = entry.file_name().to_string_lossy().to_string();
                if self.is_valid_model_directory(&entry.path()).await? {
                    self.downloaded_models.insert(model_name);
                }
            }
        }

        Ok(())
    }

    /// A valid model directory has a config, a tokenizer, and at least one
    /// safetensors weight file.
    async fn is_valid_model_directory(&self, path: &Path) -> Result<bool> {
        for file in ["config.json", "tokenizer.json"] {
            if fs::metadata(path.join(file)).await.is_err() {
                return Ok(false);
            }
        }

        let mut entries = fs::read_dir(path).await.map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to read model directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to read directory entry: {}", e))
        })? {
            if entry
                .file_name()
                .to_string_lossy()
                .ends_with(".safetensors")
            {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Return the local path for a model, downloading it first if needed.
    pub async fn ensure_model(&mut self, name: &str) -> Result<PathBuf> {
        if let Some(path) = self.get_model_path(name) {
            return Ok(path);
        }
        self.download_model(name).await
    }

    /// Download a model from the Hugging Face Hub
    pub async fn download_model(&mut self, name: &str) -> Result<PathBuf> {
        let model_info = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| ResumeWriterError::ModelNotFound(name.to_string()))?;

        let model_dir = self.models_dir.join(name);

        if self.downloaded_models.contains(name) {
            return Ok(model_dir);
        }

        println!(
            "📥 Downloading model: {} (~{} MB)",
            model_info.repo_id, model_info.size_mb
        );

        fs::create_dir_all(&model_dir).await.map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to create model directory: {}", e))
        })?;

        let repo = self.api.repo(hf_hub::Repo::model(model_info.repo_id.clone()));

        // Config, tokenizer, and generation settings. Some repos don't ship
        // all of these; only config.json and tokenizer.json are mandatory.
        let essential_files = [
            "config.json",
            "tokenizer.json",
            "tokenizer_config.json",
            "generation_config.json",
        ];

        for file in &essential_files {
            match repo.get(file).await {
                Ok(file_path) => {
                    fs::copy(&file_path, model_dir.join(file)).await.map_err(|e| {
                        ResumeWriterError::ModelError(format!("Failed to copy {}: {}", file, e))
                    })?;
                    println!("  ✅ Downloaded: {}", file);
                }
                Err(e) => {
                    if *file == "config.json" || *file == "tokenizer.json" {
                        return Err(ResumeWriterError::ModelError(format!(
                            "Failed to download {}: {}",
                            file, e
                        )));
                    }
                }
            }
        }

        self.download_weights(&repo, &model_dir).await?;

        self.downloaded_models.insert(name.to_string());
        println!("✅ Model {} downloaded successfully!", model_info.repo_id);
        Ok(model_dir)
    }

    /// Download model weights: sharded safetensors when an index file is
    /// present, a single model.safetensors otherwise.
    async fn download_weights(
        &self,
        repo: &hf_hub::api::tokio::ApiRepo,
        model_dir: &Path,
    ) -> Result<()> {
        match repo.get("model.safetensors.index.json").await {
            Ok(index_path) => {
                let dest_index = model_dir.join("model.safetensors.index.json");
                fs::copy(&index_path, &dest_index).await.map_err(|e| {
                    ResumeWriterError::ModelError(format!(
                        "Failed to copy safetensors index: {}",
                        e
                    ))
                })?;

                for shard_file in shard_files_from_index(&dest_index).await? {
                    let shard_path = repo.get(&shard_file).await.map_err(|e| {
                        ResumeWriterError::ModelError(format!(
                            "Failed to download shard {}: {}",
                            shard_file, e
                        ))
                    })?;
                    fs::copy(&shard_path, model_dir.join(&shard_file))
                        .await
                        .map_err(|e| {
                            ResumeWriterError::ModelError(format!(
                                "Failed to copy shard {}: {}",
                                shard_file, e
                            ))
                        })?;
                    println!("  ✅ Downloaded: {}", shard_file);
                }
                Ok(())
            }
            Err(_) => {
                let weights_path = repo.get("model.safetensors").await.map_err(|e| {
                    ResumeWriterError::ModelError(format!(
                        "Failed to download model weights: {}",
                        e
                    ))
                })?;
                fs::copy(&weights_path, model_dir.join("model.safetensors"))
                    .await
                    .map_err(|e| {
                        ResumeWriterError::ModelError(format!(
                            "Failed to copy model weights: {}",
                            e
                        ))
                    })?;
                println!("  ✅ Downloaded: model.safetensors");
                Ok(())
            }
        }
    }

    /// Get path to a downloaded model
    pub fn get_model_path(&self, name: &str) -> Option<PathBuf> {
        if self.downloaded_models.contains(name) {
            Some(self.models_dir.join(name))
        } else {
            None
        }
    }

    pub fn list_downloaded_models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.downloaded_models.iter().cloned().collect();
        models.sort();
        models
    }

    pub fn is_model_downloaded(&self, name: &str) -> bool {
        self.downloaded_models.contains(name)
    }

    pub fn get_model_info(&self, name: &str) -> Option<&AvailableModel> {
        self.registry.get(name)
    }

    /// Remove a downloaded model from disk.
    pub async fn remove_model(&mut self, name: &str) -> Result<()> {
        let model_dir = self.models_dir.join(name);
        if !model_dir.exists() {
            return Err(ResumeWriterError::ModelNotFound(name.to_string()));
        }
        fs::remove_dir_all(&model_dir).await.map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to remove model: {}", e))
        })?;
        self.downloaded_models.remove(name);
        Ok(())
    }
}

/// List the safetensors weight files inside a downloaded model directory,
/// resolving the shard index when one exists.
pub fn weight_files(model_dir: &Path) -> Result<Vec<PathBuf>> {
    let index_path = model_dir.join("model.safetensors.index.json");

    if index_path.exists() {
        let index_content = std::fs::read_to_string(&index_path)?;
        let index_json: serde_json::Value = serde_json::from_str(&index_content)?;

        let weight_map = index_json
            .get("weight_map")
            .and_then(|v| v.as_object())
            .ok_or_else(|| {
                ResumeWriterError::ModelError(
                    "Invalid safetensors index format: missing weight_map".to_string(),
                )
            })?;

        let mut shard_names: Vec<String> = weight_map
            .values()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        shard_names.sort();

        let files: Vec<PathBuf> = shard_names
            .into_iter()
            .map(|name| model_dir.join(name))
            .collect();

        for file in &files {
            if !file.exists() {
                return Err(ResumeWriterError::ModelError(format!(
                    "Shard file not found: {}",
                    file.display()
                )));
            }
        }

        return Ok(files);
    }

    let single = model_dir.join("model.safetensors");
    if single.exists() {
        Ok(vec![single])
    } else {
        Err(ResumeWriterError::ModelError(
            "Model weights file not found (neither sharded nor single safetensors)".to_string(),
        ))
    }
}

async fn shard_files_from_index(index_path: &Path) -> Result<Vec<String>> {
    let index_content = fs::read_to_string(index_path).await.map_err(|e| {
        ResumeWriterError::ModelError(format!("Failed to read safetensors index: {}", e))
    })?;

    let index_json: serde_json::Value = serde_json::from_str(&index_content)?;
    let weight_map = index_json
        .get("weight_map")
        .and_then(|v| v.as_object())
        .ok_or_else(|| {
            ResumeWriterError::ModelError(
                "Invalid safetensors index format: missing weight_map".to_string(),
            )
        })?;

    let mut shards: Vec<String> = weight_map
        .values()
        .filter_map(|v| v.as_str().map(|s| s.to_string()))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    shards.sort();
    Ok(shards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_model_manager_creation() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::default();
        let manager = ModelManager::new(
            temp_dir.path().to_path_buf(),
            &config.models.available_models,
        )
        .await;
        assert!(manager.is_ok());

        let manager = manager.unwrap();
        assert!(manager.list_downloaded_models().is_empty());
        assert!(manager.get_model_info("flan-t5-small").is_some());
        assert!(manager.get_model_info("no-such-model").is_none());
    }

    #[tokio::test]
    async fn test_weight_files_single() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("model.safetensors"), b"stub").unwrap();

        let files = weight_files(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("model.safetensors"));
    }

    #[tokio::test]
    async fn test_weight_files_sharded() {
        let temp_dir = TempDir::new().unwrap();
        let index = serde_json::json!({
            "weight_map": {
                "a.weight": "model-00001-of-00002.safetensors",
                "b.weight": "model-00002-of-00002.safetensors",
                "c.weight": "model-00001-of-00002.safetensors"
            }
        });
        std::fs::write(
            temp_dir.path().join("model.safetensors.index.json"),
            serde_json::to_string(&index).unwrap(),
        )
        .unwrap();
        std::fs::write(temp_dir.path().join("model-00001-of-00002.safetensors"), b"a").unwrap();
        std::fs::write(temp_dir.path().join("model-00002-of-00002.safetensors"), b"b").unwrap();

        let files = weight_files(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn test_weight_files_missing() {
        let temp_dir = TempDir::new().unwrap();
        assert!(weight_files(temp_dir.path()).is_err());
    }
}
