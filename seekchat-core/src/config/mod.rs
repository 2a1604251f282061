//! Configuration module
//!
//! Two layers live here:
//! - [`ClientConfig`]: connection settings loaded from a YAML or JSON file
//!   with `${ENV_VAR}` interpolation
//! - [`ConfigStore`]: the key/value store holding the user's API key and
//!   model choice, read by the chat client at the start of every call

mod env;
mod error;
mod schema;
mod secrets;
mod store;

pub use error::{ConfigError, ConfigResult, FieldError, FieldErrorKind};
pub use schema::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use secrets::SecretString;
pub use store::{
    ConfigStore, MemoryConfigStore, ModelOption, Settings, StoredSettings, API_KEY,
    AVAILABLE_MODELS, DEFAULT_MODEL, MODEL_KEY,
};

use std::fs;
use std::path::Path;

fn read_interpolated(path: &Path) -> Result<String, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    env::interpolate_env_vars(&content)
}

/// Load a client configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    let content = read_interpolated(path)?;

    let config: ClientConfig =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}

/// Load a client configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    let content = read_interpolated(path)?;

    let config: ClientConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}

impl ClientConfig {
    /// Copy the credential and model from this file into a settings store.
    ///
    /// Entries absent from the file are left untouched in the store.
    pub async fn seed_store(&self, store: &dyn ConfigStore) -> Result<(), ConfigError> {
        let settings = Settings::new(store);
        if let Some(api_key) = &self.api_key {
            settings.set_api_key(api_key).await?;
        }
        if let Some(model) = &self.model {
            settings.set_model(model).await?;
        }
        Ok(())
    }
}
