//! File-backed preference storage for deferred-link state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use shell_host::{PrefsStore, PrefsStoreFuture};
use tauri::Manager;

type PrefMap = BTreeMap<String, String>;

fn load_pref_map(path: &Path) -> Result<PrefMap, String> {
    if !path.exists() {
        return Ok(PrefMap::new());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(PrefMap::new());
    }
    serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse prefs map {}: {err}", path.display()))
}

fn save_pref_map(path: &Path, map: &PrefMap) -> Result<(), String> {
    let serialized = serde_json::to_string(map)
        .map_err(|err| format!("failed to serialize prefs map: {err}"))?;
    fs::write(path, serialized).map_err(|err| format!("failed to write {}: {err}", path.display()))
}

fn validate_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        Err("Preference key must not be empty".to_string())
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Preference store backed by a single JSON map file.
pub struct FilePrefsStore {
    file: PathBuf,
}

impl FilePrefsStore {
    /// Creates a store rooted at `root`.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, String> {
        let root = root.as_ref();
        fs::create_dir_all(root)
            .map_err(|err| format!("failed to create prefs dir {}: {err}", root.display()))?;
        Ok(Self {
            file: root.join("prefs.json"),
        })
    }

    /// Creates a store under the Tauri app data directory.
    pub fn from_app(app: &tauri::AppHandle) -> Result<Self, String> {
        let root = app
            .path()
            .app_data_dir()
            .map_err(|err| format!("failed to resolve app data dir: {err}"))?
            .join("prefs");
        Self::from_root(root)
    }

    fn load(&self, key: &str) -> Result<Option<String>, String> {
        validate_key(key)?;
        let map = load_pref_map(&self.file)?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), String> {
        validate_key(key)?;
        let mut map = load_pref_map(&self.file)?;
        map.insert(key.to_string(), value.to_string());
        save_pref_map(&self.file, &map)
    }

    fn delete(&self, key: &str) -> Result<(), String> {
        validate_key(key)?;
        let mut map = load_pref_map(&self.file)?;
        map.remove(key);
        save_pref_map(&self.file, &map)
    }
}

impl PrefsStore for FilePrefsStore {
    fn load_value<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move { self.load(key) })
    }

    fn save_value<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async move { self.save(key, value) })
    }

    fn delete_value<'a>(&'a self, key: &'a str) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async move { self.delete(key) })
    }
}
