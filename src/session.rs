use crate::model::{ElementId, ElementKind, ElementType, ElementUpdate};
use crate::persist::{SceneStorage, load_or_default};
use crate::scene::{SceneStore, Staging};
use crate::tikz;

/// The editing session: a scene, its current markup and where it is saved.
///
/// Every committed mutation ends in [`Session::commit`], which regenerates the whole
/// markup and hands the scene to storage. Selection changes are not mutations.
pub struct Session<S: SceneStorage> {
    store: SceneStore,
    markup: String,
    storage: S,
    commits: u64,
}

impl<S: SceneStorage> Session<S> {
    /// Starts from whatever `storage` holds, or an empty scene when that fails.
    pub fn open(storage: S) -> Self {
        let store = SceneStore::from_persisted(load_or_default(&storage));
        let markup = tikz::generate(store.elements());
        Self {
            store,
            markup,
            storage,
            commits: 0,
        }
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Markup as of the last commit.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Regenerates markup from the current scene.
    pub fn emit(&self) -> String {
        tikz::generate(self.store.elements())
    }

    /// Number of recomputes since the session opened.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    #[tracing::instrument(skip(self), fields(elements = self.store.len()))]
    fn commit(&mut self) {
        self.markup = tikz::generate(self.store.elements());
        self.commits += 1;
        if let Err(err) = self.storage.save(&self.store.to_persisted()) {
            tracing::warn!(%err, "could not save the scene");
        }
    }

    pub fn add(&mut self, element_type: ElementType) -> ElementId {
        let id = self.store.add_staged(element_type);
        self.commit();
        id
    }

    pub fn add_with(&mut self, kind: ElementKind) -> ElementId {
        let id = self.store.add_element(kind);
        self.commit();
        id
    }

    pub fn update(&mut self, id: ElementId, update: ElementUpdate) {
        self.store.update_element(id, &update);
        self.commit();
    }

    pub fn remove(&mut self, id: ElementId) {
        self.store.remove_element(id);
        self.commit();
    }

    pub fn set_parent(&mut self, plot: ElementId, axis: ElementId) {
        self.store.set_parent(plot, axis);
        self.commit();
    }

    pub fn select(&mut self, id: Option<ElementId>) {
        self.store.select(id);
    }

    /// Edits the staged defaults. Axis defaults and the staged shape type are saved,
    /// so this commits as well.
    pub fn edit_staging(&mut self, edit: impl FnOnce(&mut Staging)) {
        edit(self.store.staging_mut());
        self.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShapeType, StylePatch};
    use crate::persist::{MemoryStorage, PersistedScene};

    #[test]
    fn every_mutation_recomputes_and_saves() {
        let mut session = Session::open(MemoryStorage::default());
        let id = session.add(ElementType::Shape);
        assert!(session.markup().contains("circle (1)"));
        session.update(
            id,
            ElementUpdate::Style(StylePatch {
                line_width: Some(2.0),
                ..Default::default()
            }),
        );
        assert!(session.markup().contains("line width=2mm"));
        session.remove(id);
        assert!(!session.markup().contains("\\draw"));
        assert_eq!(session.commits(), 3);
        assert_eq!(session.storage().save_count(), 3);
    }

    #[test]
    fn unknown_id_still_recomputes() {
        let mut session = Session::open(MemoryStorage::default());
        session.remove(ElementId(42));
        assert_eq!(session.commits(), 1);
        assert_eq!(session.markup(), session.emit());
    }

    #[test]
    fn selection_does_not_commit() {
        let mut session = Session::open(MemoryStorage::default());
        let id = session.add(ElementType::Axis);
        session.select(None);
        session.select(Some(id));
        assert_eq!(session.commits(), 1);
        assert_eq!(session.store().selected(), Some(id));
    }

    #[test]
    fn opens_the_saved_scene() {
        let mut first = Session::open(MemoryStorage::default());
        first.add(ElementType::Plot);
        first.edit_staging(|s| s.shape_type = ShapeType::Grid);
        let saved: PersistedScene = first.storage().last_saved().unwrap();

        let second = Session::open(MemoryStorage::with_scene(saved));
        assert_eq!(second.store().len(), 2);
        assert_eq!(second.store().staging().shape_type, ShapeType::Grid);
        assert_eq!(second.markup(), first.markup());
    }
}
