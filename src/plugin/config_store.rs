//! 플러그인 설정 저장소
//!
//! `[section] option = "value"` 형태의 TOML 파일 하나에 설정을 저장합니다.
//! 값을 바꿀 때마다 파일 전체를 다시 씁니다. 파일 잠금은 없으므로
//! 여러 프로세스가 동시에 쓰면 마지막 쓰기만 남습니다.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::data::StorageError;

type Sections = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    sections: RwLock<Sections>,
}

impl ConfigStore {
    /// 설정 파일을 읽습니다. 파일이 없으면 빈 설정으로 시작합니다.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let sections = read_sections(&path)?;
        Ok(Self {
            path,
            sections: RwLock::new(sections),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 설정 값 조회
    pub fn get(&self, section: &str, option: &str) -> Result<String, StorageError> {
        self.read()
            .get(section)
            .and_then(|options| options.get(option))
            .cloned()
            .ok_or_else(|| StorageError::ConfigMissing {
                section: section.to_string(),
                option: option.to_string(),
            })
    }

    /// 설정 값 조회, 없으면 `fallback` 을 저장한 뒤 반환
    ///
    /// 이 호출은 파일을 쓸 수 있습니다. 한 번 `fallback` 이 저장되면
    /// 이후 `get` 은 같은 값을 돌려줍니다.
    pub fn get_or_insert(
        &self,
        section: &str,
        option: &str,
        fallback: &str,
    ) -> Result<String, StorageError> {
        let mut sections = self.write();
        if let Some(value) = sections.get(section).and_then(|options| options.get(option)) {
            return Ok(value.clone());
        }

        self.update(&mut sections, section, option, fallback)?;

        tracing::debug!("seeded [{}] {} = {:?}", section, option, fallback);
        Ok(fallback.to_string())
    }

    /// 설정 값 저장 (섹션이 없으면 생성)
    pub fn set(&self, section: &str, option: &str, value: &str) -> Result<(), StorageError> {
        let mut sections = self.write();
        self.update(&mut sections, section, option, value)
    }

    /// 디스크에서 다시 읽기 (사람이 파일을 직접 고친 경우)
    pub fn reload(&self) -> Result<(), StorageError> {
        let sections = read_sections(&self.path)?;
        *self.write() = sections;
        Ok(())
    }

    /// 사본에 값을 넣어 파일에 쓰고, 쓰기가 성공한 뒤에만 메모리에 반영
    fn update(
        &self,
        sections: &mut Sections,
        section: &str,
        option: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        let mut updated = sections.clone();
        updated
            .entry(section.to_string())
            .or_default()
            .insert(option.to_string(), value.to_string());
        self.persist(&updated)?;
        *sections = updated;
        Ok(())
    }

    fn persist(&self, sections: &Sections) -> Result<(), StorageError> {
        let content = toml::to_string_pretty(sections)?;
        std::fs::write(&self.path, content).map_err(StorageError::io(&self.path))
    }

    fn read(&self) -> RwLockReadGuard<'_, Sections> {
        self.sections.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Sections> {
        self.sections.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn read_sections(path: &Path) -> Result<Sections, StorageError> {
    if !path.exists() {
        return Ok(Sections::new());
    }

    let content = std::fs::read_to_string(path).map_err(StorageError::io(path))?;
    let table: toml::Table = toml::from_str(&content).map_err(|source| StorageError::TomlDe {
        path: path.to_path_buf(),
        source,
    })?;

    let mut sections = Sections::new();
    for (section, value) in table {
        // 섹션 밖의 값은 무시
        let toml::Value::Table(options) = value else {
            tracing::warn!("ignoring top-level key {:?} in {}", section, path.display());
            continue;
        };
        let options = options
            .into_iter()
            .map(|(option, value)| {
                // 손으로 `range = 14` 처럼 적은 값도 문자열로 받아들임
                let value = match value {
                    toml::Value::String(s) => s,
                    other => other.to_string(),
                };
                (option, value)
            })
            .collect();
        sections.insert(section, options);
    }
    Ok(sections)
}
