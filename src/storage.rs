use crate::error::Result;
use crate::models::{AppSettings, PageSize, RecentFile};
use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

const MAX_RECENT_FILES: usize = 10;

pub fn get_config_dir() -> PathBuf {
    ProjectDirs::from("", "", "pdfcrop")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn atomic_write(path: &Path, data: &str) -> Result<()> {
    let tmp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Reads `settings.json` from `dir`. A corrupt file falls back to defaults,
/// keeping whichever fields can still be read.
pub fn load_settings_from(dir: &Path) -> AppSettings {
    let path = dir.join("settings.json");
    let Ok(data) = fs::read_to_string(&path) else {
        return AppSettings::default();
    };
    if let Ok(loaded) = serde_json::from_str::<AppSettings>(&data) {
        return loaded.sanitized();
    }

    warn!(path = %path.display(), "corrupted settings.json, using defaults");
    let mut settings = AppSettings::default();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&data) {
        if let Some(obj) = value.as_object() {
            if let Some(v) = obj.get("display_scale").and_then(serde_json::Value::as_f64) {
                settings.display_scale = v as f32;
            }
            if let Some(v) = obj
                .get("export_dpi")
                .and_then(serde_json::Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
            {
                settings.export_dpi = v;
            }
            if let Some(v) = obj
                .get("default_page_size")
                .and_then(|v| serde_json::from_value::<PageSize>(v.clone()).ok())
            {
                settings.default_page_size = v;
            }
            if let Some(v) = obj.get("zoom_step").and_then(serde_json::Value::as_f64) {
                settings.zoom_step = v as f32;
            }
            if let Some(v) = obj.get("remember_recent").and_then(serde_json::Value::as_bool) {
                settings.remember_recent = v;
            }
        }
    }
    settings.sanitized()
}

pub fn save_settings_to(dir: &Path, settings: &AppSettings) -> Result<()> {
    fs::create_dir_all(dir)?;
    let data = serde_json::to_string_pretty(settings)?;
    atomic_write(&dir.join("settings.json"), &data)
}

pub fn load_recent_files_from(dir: &Path) -> Vec<RecentFile> {
    let path = dir.join("recent_files.json");
    if let Ok(data) = fs::read_to_string(&path) {
        match serde_json::from_str(&data) {
            Ok(files) => return files,
            Err(e) => warn!(error = %e, "corrupted recent_files.json, using empty list"),
        }
    }
    Vec::new()
}

pub fn save_recent_files_to(dir: &Path, recent_files: &[RecentFile]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let data = serde_json::to_string_pretty(recent_files)?;
    atomic_write(&dir.join("recent_files.json"), &data)
}

/// Moves `path` to the front of the list, keeping at most ten entries.
pub fn push_recent_file(recent_files: &mut Vec<RecentFile>, path: &Path, now: u64) {
    let path_str = path.to_string_lossy().to_string();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    recent_files.retain(|f| f.path != path_str);
    recent_files.insert(
        0,
        RecentFile {
            path: path_str,
            name,
            last_opened: now,
        },
    );
    recent_files.truncate(MAX_RECENT_FILES);
}

pub fn load_settings() -> AppSettings {
    load_settings_from(&get_config_dir())
}

pub fn save_settings(settings: &AppSettings) {
    if let Err(e) = save_settings_to(&get_config_dir(), settings) {
        warn!(error = %e, "failed to save settings");
    }
}

pub fn load_recent_files() -> Vec<RecentFile> {
    load_recent_files_from(&get_config_dir())
}

pub fn add_recent_file(recent_files: &mut Vec<RecentFile>, path: &Path) {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    push_recent_file(recent_files, path, now);
    if let Err(e) = save_recent_files_to(&get_config_dir(), recent_files) {
        warn!(error = %e, "failed to save recent files");
    }
}

pub fn clear_recent_files(recent_files: &mut Vec<RecentFile>) {
    recent_files.clear();
    if let Err(e) = save_recent_files_to(&get_config_dir(), recent_files) {
        warn!(error = %e, "failed to save recent files");
    }
}
