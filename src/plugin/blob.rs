//! 플러그인 디렉터리 안의 이름 있는 파일 캐시

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::data::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    /// 새로 만들거나 덮어쓰기
    Write,
}

#[derive(Debug, Clone)]
pub struct BlobCache {
    root: PathBuf,
}

impl BlobCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// 파일 열기. 반환된 핸들은 drop 시점에 닫힙니다.
    pub fn open(&self, name: &str, mode: OpenMode) -> Result<File, StorageError> {
        let path = self.path(name);
        let result = match mode {
            OpenMode::Read => File::open(&path),
            OpenMode::Write => {
                std::fs::create_dir_all(&self.root).map_err(StorageError::io(&self.root))?;
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&path)
            }
        };
        result.map_err(StorageError::io(&path))
    }

    /// 파일 전체 읽기. 없거나 읽을 수 없으면 `CacheMiss`.
    pub fn load(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let miss = || StorageError::CacheMiss {
            name: name.to_string(),
        };

        let mut file = self.open(name, OpenMode::Read).map_err(|_| miss())?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|_| miss())?;
        Ok(bytes)
    }

    /// 파일 덮어쓰기
    ///
    /// 임시 파일에 쓴 뒤 rename 하므로 읽는 쪽은 완성된 파일만 봅니다.
    pub fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let tmp_name = format!("{}.tmp", name);
        {
            let mut file = self.open(&tmp_name, OpenMode::Write)?;
            let tmp_path = self.path(&tmp_name);
            file.write_all(bytes).map_err(StorageError::io(&tmp_path))?;
            file.sync_all().map_err(StorageError::io(&tmp_path))?;
        }

        let path = self.path(name);
        std::fs::rename(self.path(&tmp_name), &path).map_err(StorageError::io(&path))
    }

    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, StorageError> {
        let bytes = self.load(name)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)?;
        self.save(name, &bytes)
    }

    /// 비동기 경로용 `load`
    pub async fn load_async(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(self.path(name))
            .await
            .map_err(|_| StorageError::CacheMiss {
                name: name.to_string(),
            })
    }

    /// 비동기 경로용 `save`. 임시 파일 + rename 은 동일합니다.
    pub async fn save_async(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(StorageError::io(&self.root))?;

        let tmp_path = self.path(&format!("{}.tmp", name));
        {
            let mut file = tokio::fs::File::create(&tmp_path)
                .await
                .map_err(StorageError::io(&tmp_path))?;
            file.write_all(bytes).await.map_err(StorageError::io(&tmp_path))?;
            file.sync_all().await.map_err(StorageError::io(&tmp_path))?;
        }

        let path = self.path(name);
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(StorageError::io(&path))
    }

    pub async fn load_json_async<T: DeserializeOwned>(&self, name: &str) -> Result<T, StorageError> {
        let bytes = self.load_async(name).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn save_json_async<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)?;
        self.save_async(name, &bytes).await
    }
}
