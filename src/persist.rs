use crate::error::{SketchError, SketchResult};
use crate::model::{AxisParams, Element, ShapeType};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// The last scene, as saved between sessions. Carries no schema version.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedScene {
    pub elements: Vec<Element>,
    pub axis_defaults: AxisParams,
    pub staged_shape_type: ShapeType,
}

pub trait SceneStorage {
    fn load(&self) -> SketchResult<PersistedScene>;
    fn save(&self, scene: &PersistedScene) -> SketchResult<()>;
}

/// Loads the stored scene, falling back to an empty one on any failure.
pub fn load_or_default(storage: &dyn SceneStorage) -> PersistedScene {
    match storage.load() {
        Ok(scene) => scene,
        Err(err) => {
            tracing::warn!(%err, "could not load the last scene, starting empty");
            PersistedScene::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SceneStorage for JsonFileStorage {
    fn load(&self) -> SketchResult<PersistedScene> {
        let json =
            std::fs::read_to_string(&self.path).map_err(|e| SketchError::io(&self.path, e))?;
        let scene: PersistedScene = serde_json::from_str(&json)?;
        tracing::info!(
            path = %self.path.display(),
            elements = scene.elements.len(),
            "loaded scene"
        );
        Ok(scene)
    }

    fn save(&self, scene: &PersistedScene) -> SketchResult<()> {
        let json = serde_json::to_string_pretty(scene)?;
        std::fs::write(&self.path, json).map_err(|e| SketchError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "saved scene");
        Ok(())
    }
}

/// Keeps the last saved record in memory. Useful headless and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    scene: RefCell<Option<PersistedScene>>,
    saves: RefCell<usize>,
}

impl MemoryStorage {
    pub fn with_scene(scene: PersistedScene) -> Self {
        Self {
            scene: RefCell::new(Some(scene)),
            saves: RefCell::new(0),
        }
    }

    pub fn last_saved(&self) -> Option<PersistedScene> {
        self.scene.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl SceneStorage for MemoryStorage {
    fn load(&self) -> SketchResult<PersistedScene> {
        Ok(self.scene.borrow().clone().unwrap_or_default())
    }

    fn save(&self, scene: &PersistedScene) -> SketchResult<()> {
        *self.scene.borrow_mut() = Some(scene.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_default() {
        let storage = JsonFileStorage::new("/nonexistent/dir/scene.json");
        assert!(matches!(storage.load(), Err(SketchError::Io { .. })));
        assert_eq!(load_or_default(&storage), PersistedScene::default());
    }

    #[test]
    fn record_uses_camel_case_keys() {
        let v = serde_json::to_value(PersistedScene::default()).unwrap();
        assert!(v.get("elements").is_some());
        assert!(v.get("axisDefaults").is_some());
        assert_eq!(v["stagedShapeType"], "circle");
    }

    #[test]
    fn partial_record_fills_defaults() {
        let scene: PersistedScene =
            serde_json::from_str(r#"{"stagedShapeType":"arc"}"#).unwrap();
        assert_eq!(scene.staged_shape_type, ShapeType::Arc);
        assert!(scene.elements.is_empty());
        assert_eq!(scene.axis_defaults, AxisParams::default());
    }

    #[test]
    fn memory_storage_counts_saves() {
        let storage = MemoryStorage::default();
        storage.save(&PersistedScene::default()).unwrap();
        storage.save(&PersistedScene::default()).unwrap();
        assert_eq!(storage.save_count(), 2);
        assert!(storage.last_saved().is_some());
    }
}
