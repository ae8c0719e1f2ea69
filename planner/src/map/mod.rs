//! Map rendering: a layer-owning pipeline drawing onto a [`MapSurface`].

pub mod bounds;
pub mod pipeline;
pub mod popup;
pub mod style;
pub mod surface;

pub use bounds::Bounds;
pub use pipeline::{LayerGroup, MapRenderPipeline, RouteOverlay, DEFAULT_ZOOM};
pub use style::StyleTier;
pub use surface::{Layer, LayerId, MapSurface, Marker, MarkerIcon, SceneSurface, Viewport};
