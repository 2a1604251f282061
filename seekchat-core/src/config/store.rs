//! Key/value settings store and a typed façade over it

use super::error::{ConfigError, ConfigResult};
use super::secrets::SecretString;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Store key holding the API credential
pub const API_KEY: &str = "apiKey";

/// Store key holding the selected model id
pub const MODEL_KEY: &str = "model";

/// Model used when nothing is saved and the caller names none
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// A model the user can pick in the settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOption {
    pub id: &'static str,
    pub name: &'static str,
}

/// Models offered by the settings page
pub const AVAILABLE_MODELS: &[ModelOption] = &[
    ModelOption {
        id: "deepseek-chat",
        name: "DeepSeek Chat",
    },
    ModelOption {
        id: "deepseek-reasoner",
        name: "DeepSeek Reasoner",
    },
];

/// Persisted settings storage.
///
/// The chat client only reads from it at call start. Implementations may
/// be backed by browser storage, a file, or memory.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read a value; `None` when the key was never written
    async fn get(&self, key: &str) -> ConfigResult<Option<String>>;

    /// Write a value
    async fn set(&self, key: &str, value: &str) -> ConfigResult<()>;
}

/// In-memory settings store for tests and demos
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut guard) = store.values.write() {
            guard.insert(API_KEY.to_string(), api_key.into());
        }
        store
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        let guard = self
            .values
            .read()
            .map_err(|_| ConfigError::store("settings lock poisoned"))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ConfigResult<()> {
        let mut guard = self
            .values
            .write()
            .map_err(|_| ConfigError::store("settings lock poisoned"))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Snapshot of the user-facing settings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoredSettings {
    pub api_key: SecretString,
    pub model: Option<String>,
}

/// Typed access to the credential and model entries of a [`ConfigStore`]
pub struct Settings<'a> {
    store: &'a dyn ConfigStore,
}

impl<'a> Settings<'a> {
    pub fn new(store: &'a dyn ConfigStore) -> Self {
        Self { store }
    }

    /// Saved API key; empty when unset
    pub async fn api_key(&self) -> ConfigResult<SecretString> {
        Ok(SecretString::new(
            self.store.get(API_KEY).await?.unwrap_or_default(),
        ))
    }

    pub async fn set_api_key(&self, api_key: &SecretString) -> ConfigResult<()> {
        self.store.set(API_KEY, api_key.expose_secret()).await
    }

    /// Saved model id; `None` when unset or blank
    pub async fn model(&self) -> ConfigResult<Option<String>> {
        Ok(self
            .store
            .get(MODEL_KEY)
            .await?
            .filter(|m| !m.trim().is_empty()))
    }

    pub async fn set_model(&self, model: &str) -> ConfigResult<()> {
        self.store.set(MODEL_KEY, model).await
    }

    /// Read every setting at once
    pub async fn load(&self) -> ConfigResult<StoredSettings> {
        Ok(StoredSettings {
            api_key: self.api_key().await?,
            model: self.model().await?,
        })
    }

    /// Write every setting at once; a missing model is saved as the default
    pub async fn save(&self, settings: &StoredSettings) -> ConfigResult<()> {
        self.set_api_key(&settings.api_key).await?;
        self.set_model(settings.model.as_deref().unwrap_or(DEFAULT_MODEL))
            .await
    }

    /// True when a non-blank API key is saved
    pub async fn is_api_key_set(&self) -> ConfigResult<bool> {
        Ok(!self.api_key().await?.is_blank())
    }
}
