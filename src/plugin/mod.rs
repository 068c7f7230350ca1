//! 플러그인 관련 모듈
//!
//! - `data`: 플러그인 전용 디렉터리 ([`PluginData`], [`PluginStorage`])
//! - `config_store`: 섹션/옵션 설정 저장소
//! - `blob`: 파일 캐시
//!
//! 플러그인은 호스트가 직접 생성해서 [`PluginManager`] 에 등록합니다.

pub mod blob;
pub mod config_store;
pub mod data;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use blob::{BlobCache, OpenMode};
pub use config_store::ConfigStore;
pub use data::{PluginData, PluginStorage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("plugin {0} does not exist")]
    NotFound(String),
    #[error("plugin {0} is already registered")]
    AlreadyRegistered(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// 호스트가 호출하는 플러그인 인터페이스
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn storage(&self) -> &PluginStorage;

    /// 메시지 처리. 응답할 내용이 없으면 `None`.
    async fn on_message(&self, text: &str) -> Option<String>;

    fn enable(&self) {}

    fn disable(&self) {}

    fn reload(&self) -> Result<(), PluginError> {
        Ok(())
    }

    fn status(&self) -> String;
}

struct Registered {
    plugin: Arc<dyn Plugin>,
    enabled: bool,
}

/// 플러그인 관리자
#[derive(Default)]
pub struct PluginManager {
    plugins: BTreeMap<String, Registered>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 플러그인 등록 (비활성 상태로 시작)
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), PluginError> {
        let name = plugin.name().to_string();
        if self.plugins.contains_key(&name) {
            return Err(PluginError::AlreadyRegistered(name));
        }
        tracing::debug!("Plugin [{}] registered.", name);
        self.plugins.insert(
            name,
            Registered {
                plugin,
                enabled: false,
            },
        );
        Ok(())
    }

    pub fn enable(&mut self, name: &str) -> Result<(), PluginError> {
        let entry = self.entry_mut(name)?;
        if !entry.enabled {
            entry.plugin.enable();
            entry.enabled = true;
            tracing::info!("Plugin [{}] enabled.", name);
        }
        Ok(())
    }

    pub fn disable(&mut self, name: &str) -> Result<(), PluginError> {
        let entry = self.entry_mut(name)?;
        if entry.enabled {
            entry.plugin.disable();
            entry.enabled = false;
            tracing::info!("Plugin [{}] disabled.", name);
        }
        Ok(())
    }

    pub fn reload(&self, name: &str) -> Result<(), PluginError> {
        self.entry(name)?.plugin.reload()?;
        tracing::info!("Plugin [{}] reloaded.", name);
        Ok(())
    }

    pub fn status(&self, name: &str) -> Result<String, PluginError> {
        let entry = self.entry(name)?;
        let state = if entry.enabled { "enabled" } else { "disabled" };
        Ok(format!("[{}] {}: {}", name, state, entry.plugin.status()))
    }

    pub fn enable_all(&mut self) {
        let names: Vec<String> = self.plugins.keys().cloned().collect();
        for name in names {
            // 등록된 이름이므로 실패하지 않음
            let _ = self.enable(&name);
        }
    }

    pub fn disable_all(&mut self) {
        let names: Vec<String> = self.plugins.keys().cloned().collect();
        for name in names {
            let _ = self.disable(&name);
        }
    }

    /// 활성화된 플러그인에 메시지를 전달하고 응답을 모읍니다.
    pub async fn dispatch(&self, text: &str) -> Vec<String> {
        let mut replies = Vec::new();
        for entry in self.plugins.values().filter(|entry| entry.enabled) {
            if let Some(reply) = entry.plugin.on_message(text).await {
                replies.push(reply);
            }
        }
        replies
    }

    fn entry(&self, name: &str) -> Result<&Registered, PluginError> {
        self.plugins
            .get(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut Registered, PluginError> {
        self.plugins
            .get_mut(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ping {
        storage: PluginStorage,
        enabled_calls: AtomicUsize,
    }

    impl Ping {
        fn new() -> Self {
            Self {
                storage: PluginStorage::Disabled,
                enabled_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Plugin for Ping {
        fn name(&self) -> &str {
            "ping"
        }

        fn storage(&self) -> &PluginStorage {
            &self.storage
        }

        async fn on_message(&self, text: &str) -> Option<String> {
            (text == "/ping").then(|| "pong".to_string())
        }

        fn enable(&self) {
            self.enabled_calls.fetch_add(1, Ordering::SeqCst);
        }

        fn status(&self) -> String {
            "ok".to_string()
        }
    }

    #[test]
    fn test_register_twice_fails() {
        let mut manager = PluginManager::new();
        manager.register(Arc::new(Ping::new())).unwrap();
        let err = manager.register(Arc::new(Ping::new())).unwrap_err();
        assert!(matches!(err, PluginError::AlreadyRegistered(name) if name == "ping"));
    }

    #[test]
    fn test_unknown_plugin() {
        let mut manager = PluginManager::new();
        assert!(matches!(manager.enable("nope"), Err(PluginError::NotFound(_))));
        assert!(matches!(manager.status("nope"), Err(PluginError::NotFound(_))));
        assert!(matches!(manager.reload("nope"), Err(PluginError::NotFound(_))));
    }

    #[test]
    fn test_enable_is_idempotent() {
        let ping = Arc::new(Ping::new());
        let mut manager = PluginManager::new();
        manager.register(ping.clone()).unwrap();

        manager.enable("ping").unwrap();
        manager.enable_all();
        assert_eq!(ping.enabled_calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.status("ping").unwrap(), "[ping] enabled: ok");
    }

    #[tokio::test]
    async fn test_dispatch_only_reaches_enabled_plugins() {
        let mut manager = PluginManager::new();
        manager.register(Arc::new(Ping::new())).unwrap();

        assert!(manager.dispatch("/ping").await.is_empty());

        manager.enable("ping").unwrap();
        assert_eq!(manager.dispatch("/ping").await, vec!["pong".to_string()]);
        assert!(manager.dispatch("hello").await.is_empty());

        manager.disable_all();
        assert!(manager.dispatch("/ping").await.is_empty());
    }
}
