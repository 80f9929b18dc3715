//! JSON file provider.
//!
//! The whole file is one JSON object. Every mutation rewrites the file
//! before returning, so a crash never loses a value that was reported as
//! saved. A file that fails to parse is moved aside to `*.json.corrupt`
//! and treated as empty, so the next write replaces it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::ConfigResult;
use super::provider::ConfigProvider;

const STORE_FILE: &str = "capabilities.json";

pub struct FileConfigProvider {
    path: PathBuf,
    data: Mutex<Option<BTreeMap<String, serde_json::Value>>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: Mutex::new(None),
        }
    }

    /// File in the platform data directory, e.g.
    /// `~/.local/share/modhost/capabilities.json` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "modhost")
            .map(|dirs| dirs.data_dir().join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> ConfigResult<BTreeMap<String, serde_json::Value>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(BTreeMap::new());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                let aside = self.path.with_extension("json.corrupt");
                tracing::warn!(path = %self.path.display(), error = %e, "Unreadable store file, starting empty");
                if let Err(e) = tokio::fs::rename(&self.path, &aside).await {
                    tracing::warn!(path = %aside.display(), error = %e, "Failed to set corrupt store file aside");
                }
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_file(&self, data: &BTreeMap<String, serde_json::Value>) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_string_pretty(data)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Drops the cached copy so the next access re-reads the file.
    pub async fn reload(&self) {
        *self.data.lock().await = None;
    }
}

fn lookup<'a>(
    map: &'a BTreeMap<String, serde_json::Value>,
    key: &str,
) -> Option<&'a serde_json::Value> {
    if let Some(value) = map.get(key) {
        return Some(value);
    }
    // Dotted keys address nested objects.
    let mut parts = key.split('.');
    let mut current = map.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

#[async_trait::async_trait]
impl ConfigProvider for FileConfigProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        let mut guard = self.data.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_file().await?);
        }
        let value = guard.as_ref().and_then(|map| lookup(map, key));
        Ok(value.map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    async fn set_raw(&self, key: &str, value: &str) -> ConfigResult<()> {
        let mut guard = self.data.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_file().await?);
        }
        let map = guard.get_or_insert_with(BTreeMap::new);
        let json = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        map.insert(key.to_string(), json);
        self.write_file(map).await
    }

    async fn delete(&self, key: &str) -> ConfigResult<bool> {
        let mut guard = self.data.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_file().await?);
        }
        let Some(map) = guard.as_mut() else {
            return Ok(false);
        };
        let existed = map.remove(key).is_some();
        if existed {
            self.write_file(map).await?;
        }
        Ok(existed)
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let mut guard = self.data.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_file().await?);
        }
        Ok(guard
            .as_ref()
            .map(|map| {
                map.keys()
                    .filter(|k| k.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigProviderExt;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("absent.json"));
        assert_eq!(provider.get_raw("anything").await.unwrap(), None);
        assert!(provider.list_keys("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let provider = FileConfigProvider::new(path.clone());

        provider
            .set("app_discoveredModules", &vec!["home", "about"])
            .await
            .unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            on_disk["app_discoveredModules"],
            serde_json::json!(["home", "about"])
        );

        let fresh = FileConfigProvider::new(path);
        let names: Option<Vec<String>> = fresh.get("app_discoveredModules").await.unwrap();
        assert_eq!(names.unwrap(), vec!["home", "about"]);
    }

    #[tokio::test]
    async fn test_dotted_lookup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"discovery": {"probe_timeout_ms": 250, "base_url": "http://localhost:8080/"}}"#,
        )
        .unwrap();

        let provider = FileConfigProvider::new(path);
        let timeout: Option<u64> = provider.get("discovery.probe_timeout_ms").await.unwrap();
        assert_eq!(timeout, Some(250));
        let base: Option<String> = provider.get("discovery.base_url").await.unwrap();
        assert_eq!(base.as_deref(), Some("http://localhost:8080/"));
    }

    #[tokio::test]
    async fn test_delete_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let provider = FileConfigProvider::new(path.clone());

        provider.set_raw("app_discoveryQuietMode", "true").await.unwrap();
        assert!(provider.delete("app_discoveryQuietMode").await.unwrap());

        let fresh = FileConfigProvider::new(path);
        assert_eq!(fresh.get_raw("app_discoveryQuietMode").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_set_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let provider = FileConfigProvider::new(path.clone());
        assert_eq!(provider.get_raw("key").await.unwrap(), None);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("store.json.corrupt")).unwrap(),
            "{not json"
        );
        assert!(!path.exists());
    }
}
