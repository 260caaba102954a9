use crate::config::Config;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

pub const REGISTRY_DELIMITER: char = '`';

/// One launchable model. Extra descriptor fields used by the chat front-end
/// (prompt tokens, endpoints, parameters) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub short_name: String,
    /// Hugging Face repository id, e.g. `TheBloke/Mistral-7B-Instruct-v0.1-GGUF`.
    pub name: String,
    pub weights_filename: String,
    /// Passed to the server as-is; `-1` offloads every layer.
    pub n_gpu_layers: i64,
    pub context_length: i64,
}

#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelEntry>,
}

/// Returns the text strictly between the first and second `delimiter`.
pub fn extract_delimited(content: &str, delimiter: char) -> Result<&str> {
    let mut parts = content.splitn(3, delimiter);
    parts.next();

    match (parts.next(), parts.next()) {
        (Some(payload), Some(_)) => Ok(payload),
        _ => Err(Error::ParseError(format!(
            "expected the model list between two '{}' characters",
            delimiter
        ))),
    }
}

impl ModelRegistry {
    pub fn load(config: &Config) -> Result<Self> {
        tracing::debug!("Loading model registry from {:?}", config.registry_path);

        let content =
            fs::read_to_string(&config.registry_path).map_err(|source| Error::RegistryRead {
                path: config.registry_path.clone(),
                source,
            })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let payload = extract_delimited(content, REGISTRY_DELIMITER)?;
        let entries: Vec<ModelEntry> = serde_json::from_str(payload)?;

        let mut registry = Self::default();
        for entry in entries {
            registry.add_model(entry);
        }
        Ok(registry)
    }

    /// Later entries replace earlier ones with the same short name.
    pub fn add_model(&mut self, entry: ModelEntry) {
        if let Some(previous) = self.models.insert(entry.short_name.clone(), entry) {
            tracing::warn!(
                "Duplicate short name '{}' in model registry, keeping the last entry",
                previous.short_name
            );
        }
    }

    pub fn get_model(&self, short_name: &str) -> Result<&ModelEntry> {
        self.models
            .get(short_name)
            .ok_or_else(|| Error::ModelNotFound {
                name: short_name.to_string(),
                available: self.short_names(),
            })
    }

    pub fn short_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn list_models(&self) -> Vec<&ModelEntry> {
        let mut models: Vec<&ModelEntry> = self.models.values().collect();
        models.sort_by(|a, b| a.short_name.cmp(&b.short_name));
        models
    }
}
