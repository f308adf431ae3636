use crate::error::{SketchError, SketchResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub scene_path: String,
    pub markup_path: String,
    /// Display pixels per data unit in the preview, before zoom.
    pub preview_unit_px: f32,
    pub show_preview_grid: bool,
    pub autosave: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            scene_path: "scene.json".to_string(),
            markup_path: "figure.tex".to_string(),
            preview_unit_px: 32.0,
            show_preview_grid: true,
            autosave: true,
        }
    }
}

/// `~/.config/tikzsketch.toml` if present, else `./settings.toml` if present.
pub fn config_path() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config").join("tikzsketch.toml");
        if path.exists() {
            return Some(path);
        }
    }
    let local = PathBuf::from("settings.toml");
    local.exists().then_some(local)
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "toml")
}

/// Reads settings as TOML or JSON, trying the format the extension suggests first.
pub fn load_settings(path: &Path) -> SketchResult<AppSettings> {
    let s = std::fs::read_to_string(path).map_err(|e| SketchError::io(path, e))?;
    if is_toml(path) {
        match toml::from_str::<AppSettings>(&s) {
            Ok(settings) => Ok(settings),
            Err(err) => serde_json::from_str::<AppSettings>(&s).map_err(|_| err.into()),
        }
    } else {
        match serde_json::from_str::<AppSettings>(&s) {
            Ok(settings) => Ok(settings),
            Err(err) => toml::from_str::<AppSettings>(&s).map_err(|_| err.into()),
        }
    }
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> SketchResult<()> {
    let text = if is_toml(path) {
        toml::to_string_pretty(settings)?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text).map_err(|e| SketchError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_fills_missing_fields() {
        let s: AppSettings = toml::from_str("preview_unit_px = 48.0\nautosave = false\n").unwrap();
        assert_eq!(s.preview_unit_px, 48.0);
        assert!(!s.autosave);
        assert_eq!(s.scene_path, "scene.json");
    }

    #[test]
    fn round_trips_through_a_toml_file() {
        let name = format!("tikzsketch-settings-{}.toml", std::process::id());
        let path = std::env::temp_dir().join(name);
        let settings = AppSettings {
            markup_path: "out/plot.tex".to_string(),
            show_preview_grid: false,
            ..Default::default()
        };
        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn json_content_in_toml_file_still_loads() {
        let name = format!("tikzsketch-json-{}.toml", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, r#"{"autosave": false}"#).unwrap();
        let loaded = load_settings(&path);
        let _ = std::fs::remove_file(&path);
        assert!(!loaded.unwrap().autosave);
    }
}
