//! 플러그인 데이터 관리
//!
//! `data_dir/plugin-<name>/` 아래에 플러그인별 설정 파일과 캐시 파일을 저장합니다.
//! 디렉터리는 처음 열 때 자동으로 생성됩니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::blob::BlobCache;
use super::config_store::ConfigStore;

/// 저장소 계층 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no config value for [{section}] {option}")]
    ConfigMissing { section: String, option: String },
    #[error("cache entry {name} is missing or unreadable")]
    CacheMiss { name: String },
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {}: {source}", path.display())]
    TomlDe {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("could not encode cache entry: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// 플러그인 전용 디렉터리 (설정 + 캐시)
#[derive(Debug)]
pub struct PluginData {
    name: String,
    base_path: PathBuf,
    config: ConfigStore,
    blobs: BlobCache,
}

impl PluginData {
    /// `data_dir/plugin-<name>` 을 열고, 없으면 생성합니다.
    pub fn open(name: &str, data_dir: &Path) -> Result<Self, StorageError> {
        let base_path = data_dir.join(format!("plugin-{}", name));
        std::fs::create_dir_all(&base_path).map_err(StorageError::io(&base_path))?;

        let config = ConfigStore::open(base_path.join(format!("{}.toml", name)))?;
        let blobs = BlobCache::new(base_path.clone());

        tracing::debug!("opened plugin data for {} at {}", name, base_path.display());

        Ok(Self {
            name: name.to_string(),
            base_path,
            config,
            blobs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn blobs(&self) -> &BlobCache {
        &self.blobs
    }
}

/// 플러그인의 데이터 핸들
///
/// 데이터가 필요 없는 플러그인도 항상 이 필드를 가지며, 그 경우 `Disabled` 입니다.
#[derive(Debug, Clone)]
pub enum PluginStorage {
    Disabled,
    Enabled(Arc<PluginData>),
}

impl PluginStorage {
    pub fn open(name: &str, data_dir: &Path, needs_data: bool) -> Result<Self, StorageError> {
        if !needs_data {
            return Ok(Self::Disabled);
        }
        Ok(Self::Enabled(Arc::new(PluginData::open(name, data_dir)?)))
    }

    pub fn data(&self) -> Option<&Arc<PluginData>> {
        match self {
            Self::Disabled => None,
            Self::Enabled(data) => Some(data),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }
}
