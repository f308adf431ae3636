//! Scene model and TikZ/pgfplots generation for an interactive plot sketcher.
//!
//! A [`SceneStore`] holds shapes, axes and plots. [`tikz::generate`] turns the scene into
//! markup, [`sampler`] evaluates plot expressions for previews and [`ViewportTransform`]
//! maps preview data space to the screen.

pub mod error;
pub mod model;
pub mod persist;
pub mod sampler;
pub mod scene;
pub mod session;
pub mod settings;
pub mod tikz;
pub mod viewport;

pub use error::{SketchError, SketchResult};
pub use model::{Element, ElementId, ElementKind, ElementType, ElementUpdate};
pub use persist::{JsonFileStorage, MemoryStorage, PersistedScene, SceneStorage};
pub use scene::{SceneStore, Staging};
pub use session::Session;
pub use viewport::{ViewportTransform, ZoomDirection};
