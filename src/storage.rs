// src/storage.rs

//! Local key-value persistence shared by the mixer and the diary.
//!
//! Every read takes a fallback and never fails: a missing entry, a value that
//! does not parse as the requested shape, or a store with no backing context
//! all yield the fallback. Writes are fire-and-forget.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// Every key carries the `rr_` prefix.
pub const MIXER_STATE_KEY: &str = "rr_mixer_state";
pub const NOTES_KEY: &str = "rr_notes_v1";
pub const FIRST_OPENED_KEY: &str = "rr_first_opened";
pub const SCENE_KEY: &str = "rr_scene";

pub type SharedStore = Arc<dyn KeyValueStore + Send + Sync>;

pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: String);
    fn remove(&self, key: &str);

    /// False when there is no hosting context to read from or write to.
    fn is_available(&self) -> bool {
        true
    }

    fn get_string(&self, key: &str, fallback: &str) -> String {
        if !self.is_available() {
            return fallback.to_string();
        }
        self.get_raw(key).unwrap_or_else(|| fallback.to_string())
    }

    fn set_string(&self, key: &str, value: &str) {
        if self.is_available() {
            self.set_raw(key, value.to_string());
        }
    }

    fn get_bool(&self, key: &str, fallback: bool) -> bool {
        if !self.is_available() {
            return fallback;
        }
        match self.get_raw(key).as_deref().map(str::trim) {
            Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            Some(other) => {
                log::warn!("Ignoring non-boolean value {:?} stored under '{}'", other, key);
                fallback
            }
            None => fallback,
        }
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.set_string(key, if value { "1" } else { "0" });
    }
}

/// Reads `key` as JSON, returning `fallback` when absent or unparseable.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, fallback: T) -> T {
    if !store.is_available() {
        return fallback;
    }
    let Some(raw) = store.get_raw(key) else {
        return fallback;
    };
    if raw.is_empty() {
        return fallback;
    }
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Failed to parse stored value under '{}', using fallback. Error: {}", key, e);
            fallback
        }
    }
}

pub fn set_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    if !store.is_available() {
        return;
    }
    match serde_json::to_string(value) {
        Ok(json) => store.set_raw(key, json),
        Err(e) => log::warn!("Failed to serialize value for '{}': {}", key, e),
    }
}

/// In-process store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// A store with no backing context. Reads fall back, writes are dropped.
pub struct DetachedStore;

impl KeyValueStore for DetachedStore {
    fn get_raw(&self, _key: &str) -> Option<String> {
        None
    }

    fn set_raw(&self, _key: &str, _value: String) {}

    fn remove(&self, _key: &str) {}

    fn is_available(&self) -> bool {
        false
    }
}

/// Store backed by a single JSON object file, written through on every change.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`. A missing or corrupt file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(json_string) => match serde_json::from_str(&json_string) {
                    Ok(entries) => entries,
                    Err(e) => {
                        log::warn!(
                            "Failed to parse local store '{}', starting empty. Error: {}",
                            path.display(),
                            e
                        );
                        BTreeMap::new()
                    }
                },
                Err(e) => {
                    log::warn!(
                        "Failed to read local store '{}', starting empty. Error: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn flush(&self, entries: &BTreeMap<String, String>) {
        match serde_json::to_string_pretty(entries) {
            Ok(json_string) => {
                if let Err(e) = fs::write(&self.path, json_string) {
                    log::warn!("Failed to write local store to {}: {}", self.path.display(), e);
                }
            }
            Err(e) => log::warn!("Failed to serialize local store: {}", e),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
            self.flush(&entries);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.remove(key).is_some() {
                self.flush(&entries);
            }
        }
    }
}
