use std::sync::Arc;

use crate::plugin::{PluginData, StorageError};

const SECTION: &str = "fflogs";
const OPTION: &str = "token";

/// FFLogs API 토큰 저장소 (`[fflogs] token`)
#[derive(Debug, Clone)]
pub struct TokenStore {
    data: Arc<PluginData>,
}

impl TokenStore {
    pub fn new(data: Arc<PluginData>) -> Self {
        Self { data }
    }

    /// 저장된 토큰. 없거나 비어 있으면 `None`.
    pub fn get(&self) -> Option<String> {
        match self.data.config().get(SECTION, OPTION) {
            Ok(token) if !token.trim().is_empty() => Some(token),
            Ok(_) => None,
            Err(StorageError::ConfigMissing { .. }) => None,
            Err(e) => {
                tracing::warn!("could not read FFLogs token: {}", e);
                None
            }
        }
    }

    pub fn set(&self, token: &str) -> Result<(), StorageError> {
        self.data.config().set(SECTION, OPTION, token.trim())
    }
}
