use eframe::egui;
use std::path::PathBuf;
use tikzsketch::settings::{self, AppSettings};
use tikzsketch::{
    JsonFileStorage, PersistedScene, SceneStorage, Session, SketchResult, ViewportTransform,
};

mod editors;
mod render;
mod update;

/// Scene file storage that can be switched off from the settings.
pub(crate) struct AppStorage {
    file: JsonFileStorage,
    autosave: bool,
}

impl SceneStorage for AppStorage {
    fn load(&self) -> SketchResult<PersistedScene> {
        self.file.load()
    }

    fn save(&self, scene: &PersistedScene) -> SketchResult<()> {
        if self.autosave {
            self.file.save(scene)
        } else {
            Ok(())
        }
    }
}

pub struct SketchApp {
    session: Session<AppStorage>,
    view: ViewportTransform,
    settings: AppSettings,
    settings_path: PathBuf,
    status: Option<String>,
}

impl SketchApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path =
            settings::config_path().unwrap_or_else(|| PathBuf::from("settings.toml"));
        let settings = match settings::load_settings(&settings_path) {
            Ok(s) => s,
            Err(err) => {
                tracing::info!(%err, "using default settings");
                AppSettings::default()
            }
        };
        let storage = AppStorage {
            file: JsonFileStorage::new(&settings.scene_path),
            autosave: settings.autosave,
        };
        Self {
            session: Session::open(storage),
            view: ViewportTransform::default(),
            settings,
            settings_path,
            status: None,
        }
    }

    fn copy_markup(&mut self, ctx: &egui::Context) {
        ctx.copy_text(self.session.markup().to_string());
        self.status = Some("Markup copied to clipboard".to_string());
    }

    fn save_markup_to_path(&mut self) {
        match std::fs::write(&self.settings.markup_path, self.session.markup()) {
            Ok(()) => self.status = Some(format!("Saved {}", self.settings.markup_path)),
            Err(e) => self.status = Some(format!("Markup save failed: {e}")),
        }
    }

    fn save_markup_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name("figure.tex")
            .add_filter("TeX", &["tex"])
            .save_file()
        {
            let path_str = path.display().to_string();
            match std::fs::write(&path, self.session.markup()) {
                Ok(()) => {
                    self.settings.markup_path = path_str.clone();
                    self.status = Some(format!("Saved {}", path_str));
                }
                Err(e) => self.status = Some(format!("Markup save failed: {e}")),
            }
        }
    }

    fn save_settings(&mut self) {
        match settings::save_settings(&self.settings_path, &self.settings) {
            Ok(()) => self.status = Some(format!("Saved {}", self.settings_path.display())),
            Err(e) => self.status = Some(format!("Settings save failed: {e}")),
        }
    }
}
