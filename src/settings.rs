use crate::mixer::{DEFAULT_CROSSFADE_MS, DEFAULT_VOLUME};
use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";
pub const LOCAL_STORE_FILE: &str = "local_storage.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Crossfade length; clamped into the supported range when applied.
    pub crossfade_ms: u64,
    /// Volume used when no mixer state has been stored yet.
    pub start_volume: f32,
    /// Root that scene locators (`audio/...`) are resolved against.
    pub asset_dir: Option<PathBuf>,
    /// Folder scanned for the image gallery.
    pub images_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            crossfade_ms: DEFAULT_CROSSFADE_MS,
            start_volume: DEFAULT_VOLUME,
            asset_dir: None,
            images_dir: None,
        }
    }
}

impl AppSettings {
    pub fn crossfade_duration(&self) -> Duration {
        Duration::from_millis(self.crossfade_ms)
    }

    pub fn asset_root(&self, config_dir: &Path) -> PathBuf {
        self.asset_dir.clone().unwrap_or_else(|| config_dir.to_path_buf())
    }

    pub fn images_root(&self, config_dir: &Path) -> PathBuf {
        self.images_dir
            .clone()
            .unwrap_or_else(|| self.asset_root(config_dir).join("images"))
    }
}

/// Resolves the per-user data directory and makes sure its asset folders exist.
pub fn get_config_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "RelaxRoom")
        .ok_or_else(|| anyhow!("Could not determine a data directory for this user"))?;
    let config_dir = dirs.data_dir().to_path_buf();
    ensure_layout(&config_dir)?;
    Ok(config_dir)
}

pub fn ensure_layout(config_dir: &Path) -> Result<()> {
    for dir in [config_dir.to_path_buf(), config_dir.join("audio"), config_dir.join("images")] {
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .map_err(|e| anyhow!("Failed to create directory at {}: {}", dir.display(), e))?;
        }
    }
    Ok(())
}

pub fn save_settings(config_dir: &Path, settings: &AppSettings) {
    let path = config_dir.join(SETTINGS_FILE);
    match serde_json::to_string_pretty(settings) {
        Ok(json_string) => {
            if let Err(e) = fs::write(&path, json_string) {
                log::warn!("Failed to write settings to {}: {}", path.display(), e);
            }
        }
        Err(e) => {
            log::warn!("Failed to serialize settings: {}", e);
        }
    }
}

pub fn load_settings(config_dir: &Path) -> AppSettings {
    let path = config_dir.join(SETTINGS_FILE);
    if path.exists() {
        return match fs::read_to_string(&path) {
            Ok(json_string) => match serde_json::from_str(&json_string) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Failed to parse settings file, using defaults. Error: {}", e);
                    AppSettings::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read settings file, using defaults. Error: {}", e);
                AppSettings::default()
            }
        };
    }
    AppSettings::default()
}
