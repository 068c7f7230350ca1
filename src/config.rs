use serde::Deserialize;
use std::path::PathBuf;

use crate::fflogs::client::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// 플러그인 데이터 디렉터리 (`plugin-<name>/` 이 이 아래에 생성됨)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub fflogs: FFLogs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            fflogs: FFLogs::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FFLogs {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for FFLogs {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
