use crate::model::{
    AxisParams, Element, ElementId, ElementKind, ElementType, ElementUpdate, PlotParams,
    ShapeParams, ShapeType, Style,
};
use crate::persist::PersistedScene;
use std::collections::{HashMap, HashSet};

/// Field values currently being edited in the UI. They seed the next add.
#[derive(Clone, Debug, PartialEq)]
pub struct Staging {
    pub shape_type: ShapeType,
    pub shape: ShapeParams,
    pub axis: AxisParams,
    pub plot: PlotParams,
    pub style: Style,
}

impl Default for Staging {
    fn default() -> Self {
        Self {
            shape_type: ShapeType::Circle,
            shape: ShapeParams::default(),
            axis: AxisParams::default(),
            plot: PlotParams::default(),
            style: Style::default(),
        }
    }
}

impl Staging {
    /// The staged shape, converted to the staged shape type.
    pub fn staged_shape(&self) -> ShapeParams {
        ShapeParams {
            geometry: self.shape.geometry.with_type(self.shape_type),
            ..self.shape
        }
    }

    pub fn staged_kind(&self, element_type: ElementType) -> ElementKind {
        match element_type {
            ElementType::Shape => ElementKind::Shape(self.staged_shape()),
            ElementType::Axis => ElementKind::Axis(self.axis.clone()),
            ElementType::Plot => ElementKind::Plot(self.plot.clone()),
        }
    }
}

/// Flat element table plus an id index. Plots point at their axis by id only.
#[derive(Clone, Debug)]
pub struct SceneStore {
    elements: Vec<Element>,
    index: HashMap<ElementId, usize>,
    selected: Option<ElementId>,
    next_id: u64,
    staging: Staging,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneStore {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            index: HashMap::new(),
            selected: None,
            next_id: 1,
            staging: Staging::default(),
        }
    }

    /// Rebuilds a store from a persisted record. Duplicate ids are dropped and plots
    /// whose axis is missing are re-attached the same way a fresh plot would be.
    pub fn from_persisted(record: PersistedScene) -> Self {
        let mut store = Self::new();
        store.staging.axis = record.axis_defaults;
        store.staging.shape_type = record.staged_shape_type;

        let mut seen = HashSet::new();
        let mut orphans = Vec::new();
        for element in record.elements {
            if !seen.insert(element.id) {
                tracing::warn!(id = %element.id, "dropping element with duplicate id");
                continue;
            }
            let Some(after) = element.id.0.checked_add(1) else {
                tracing::warn!(id = %element.id, "dropping element with an out-of-range id");
                continue;
            };
            store.next_id = store.next_id.max(after);
            store.elements.push(element);
        }
        store.reindex();

        for i in 0..store.elements.len() {
            let e = &store.elements[i];
            if e.is_plot() && !e.parent_id.is_some_and(|p| store.is_axis(p)) {
                orphans.push(e.id);
            } else if !e.is_plot() && e.parent_id.is_some() {
                store.elements[i].parent_id = None;
            }
        }
        for id in orphans {
            let parent = store.resolve_parent_axis();
            if let Some(e) = store.get_mut(id) {
                tracing::warn!(%id, axis = %parent, "re-attaching plot with a missing axis");
                e.parent_id = Some(parent);
            }
        }
        store
    }

    pub fn to_persisted(&self) -> PersistedScene {
        PersistedScene {
            elements: self.elements.clone(),
            axis_defaults: self.staging.axis.clone(),
            staged_shape_type: self.staging.shape_type,
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.index.get(&id).map(|&i| &self.elements[i])
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let i = *self.index.get(&id)?;
        self.elements.get_mut(i)
    }

    fn is_axis(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(Element::is_axis)
    }

    pub fn children(&self, parent: ElementId) -> impl Iterator<Item = &Element> + '_ {
        self.elements
            .iter()
            .filter(move |e| e.parent_id == Some(parent))
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn selected_element(&self) -> Option<&Element> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Unknown ids are ignored.
    pub fn select(&mut self, id: Option<ElementId>) {
        match id {
            Some(id) if !self.index.contains_key(&id) => {
                tracing::debug!(%id, "ignoring selection of unknown element");
            }
            _ => self.selected = id,
        }
    }

    pub fn staging(&self) -> &Staging {
        &self.staging
    }

    pub fn staging_mut(&mut self) -> &mut Staging {
        &mut self.staging
    }

    /// Adds an element built from the staged defaults for `element_type`.
    pub fn add_staged(&mut self, element_type: ElementType) -> ElementId {
        let kind = self.staging.staged_kind(element_type);
        let style = self.staging.style.clone();
        self.add_element_styled(kind, style)
    }

    pub fn add_element(&mut self, kind: ElementKind) -> ElementId {
        let style = self.staging.style.clone();
        self.add_element_styled(kind, style)
    }

    /// Appends a new element and selects it. A plot is parented to the selected axis,
    /// the selected plot's axis or the last axis, and an axis is created from the staged
    /// axis defaults when none exists.
    pub fn add_element_styled(&mut self, kind: ElementKind, style: Style) -> ElementId {
        let parent_id = match kind {
            ElementKind::Plot(_) => Some(self.resolve_parent_axis()),
            _ => None,
        };
        let name = self.next_name(&kind);
        let id = self.push(parent_id, name, kind, style);
        self.selected = Some(id);
        tracing::debug!(%id, parent = ?parent_id, "added element");
        id
    }

    fn push(
        &mut self,
        parent_id: Option<ElementId>,
        name: String,
        kind: ElementKind,
        style: Style,
    ) -> ElementId {
        let id = self.allocate_id();
        self.index.insert(id, self.elements.len());
        self.elements.push(Element {
            id,
            parent_id,
            name,
            kind,
            style,
        });
        id
    }

    /// Hands out ids in increasing order. Once the id space is used up the lowest free
    /// id is taken instead.
    fn allocate_id(&mut self) -> ElementId {
        if let Some(after) = self.next_id.checked_add(1) {
            let id = ElementId(self.next_id);
            self.next_id = after;
            return id;
        }
        let free = (1..u64::MAX)
            .map(ElementId)
            .find(|id| !self.index.contains_key(id))
            .unwrap_or(ElementId(0));
        tracing::warn!(id = %free, "id space exhausted, reusing a free id");
        free
    }

    fn resolve_parent_axis(&mut self) -> ElementId {
        if let Some(sel) = self.selected_element() {
            if sel.is_axis() {
                return sel.id;
            }
            if let Some(parent) = sel.parent_id.filter(|p| self.is_axis(*p)) {
                return parent;
            }
        }
        if let Some(axis) = self.elements.iter().rev().find(|e| e.is_axis()) {
            return axis.id;
        }
        let kind = ElementKind::Axis(self.staging.axis.clone());
        let name = self.next_name(&kind);
        let id = self.push(None, name, kind, Style::default());
        tracing::debug!(%id, "created axis for new plot");
        id
    }

    fn next_name(&self, kind: &ElementKind) -> String {
        let label = match kind {
            ElementKind::Shape(s) => s.shape_type().label(),
            ElementKind::Axis(_) => ElementType::Axis.label(),
            ElementKind::Plot(_) => ElementType::Plot.label(),
        };
        let count = self
            .elements
            .iter()
            .filter(|e| e.element_type() == kind.element_type())
            .count();
        format!("{} {}", label, count + 1)
    }

    /// Merges `update` into the element. Unknown ids and params of another kind are
    /// ignored.
    pub fn update_element(&mut self, id: ElementId, update: &ElementUpdate) {
        let Some(element) = self.get_mut(id) else {
            tracing::debug!(%id, "ignoring update of unknown element");
            return;
        };
        if !element.apply(update) {
            tracing::debug!(%id, "ignoring params patch for another element kind");
        }
    }

    /// Removes the element and every element parented to it. Unknown ids are ignored.
    pub fn remove_element(&mut self, id: ElementId) {
        if !self.index.contains_key(&id) {
            tracing::debug!(%id, "ignoring removal of unknown element");
            return;
        }
        let before = self.elements.len();
        self.elements
            .retain(|e| e.id != id && e.parent_id != Some(id));
        if self.selected.is_some_and(|s| !self.elements.iter().any(|e| e.id == s)) {
            self.selected = None;
        }
        self.reindex();
        tracing::debug!(%id, removed = before - self.elements.len(), "removed element");
    }

    /// Moves a plot under another axis. Ignored unless `plot` is a plot and `axis` an axis.
    pub fn set_parent(&mut self, plot: ElementId, axis: ElementId) {
        if !self.is_axis(axis) {
            tracing::debug!(%plot, %axis, "ignoring re-parent onto a non-axis");
            return;
        }
        match self.get_mut(plot) {
            Some(e) if e.is_plot() => e.parent_id = Some(axis),
            _ => tracing::debug!(%plot, "ignoring re-parent of a non-plot"),
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
    }

    /// True when the index matches the table and every plot hangs off a live axis.
    pub fn is_consistent(&self) -> bool {
        if self.index.len() != self.elements.len() {
            return false;
        }
        let indexed = self
            .elements
            .iter()
            .enumerate()
            .all(|(i, e)| self.index.get(&e.id) == Some(&i));
        let parented = self.elements.iter().all(|e| match e.kind {
            ElementKind::Plot(_) => e.parent_id.is_some_and(|p| self.is_axis(p)),
            _ => e.parent_id.is_none(),
        });
        indexed && parented
    }
}
