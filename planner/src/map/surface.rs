//! Rendering target abstraction and the in-memory scene used headless.

use std::collections::BTreeMap;

use shared::GeoPoint;

use super::{bounds::Bounds, style::PolylineStyle, style::StyleTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub subdomains: String,
    pub max_zoom: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Zoom,
    Scale,
    Legend { html: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIcon {
    Depot,
    NormalBin,
    UrgentBin,
    Step { number: usize, tier: StyleTier },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tooltip {
    pub text: String,
    pub permanent: bool,
}

impl Tooltip {
    pub fn hover(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            permanent: false,
        }
    }

    pub fn permanent(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            permanent: true,
        }
    }
}

/// Popup HTML is fixed when the marker is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: GeoPoint,
    pub icon: MarkerIcon,
    pub tooltip: Option<Tooltip>,
    pub popup: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub path: Vec<GeoPoint>,
    pub style: PolylineStyle,
}

/// A standalone popup not attached to any marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub position: GeoPoint,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Tiles(TileLayer),
    Control(Control),
    Marker(Marker),
    Polyline(Polyline),
    Popup(Popup),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Viewport {
    Fitted(Bounds),
    Centered { center: GeoPoint, zoom: u8 },
}

pub trait MapSurface {
    fn add_layer(&mut self, layer: Layer) -> LayerId;

    /// Returns `false` when the layer was not on the map.
    fn remove_layer(&mut self, id: LayerId) -> bool;

    fn fit_bounds(&mut self, bounds: Bounds);

    fn set_view(&mut self, center: GeoPoint, zoom: u8);

    fn open_popup(&mut self, id: LayerId);
}

/// Keeps every layer in memory, in insertion order.
#[derive(Debug, Default)]
pub struct SceneSurface {
    next_id: u64,
    layers: BTreeMap<LayerId, Layer>,
    viewport: Option<Viewport>,
    open_popup: Option<LayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneSummary {
    pub tiles: usize,
    pub controls: usize,
    pub markers: usize,
    pub polylines: usize,
    pub popups: usize,
}

impl SceneSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &Layer)> {
        self.layers.iter().map(|(id, layer)| (*id, layer))
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.layers.values().filter_map(|layer| match layer {
            Layer::Marker(marker) => Some(marker),
            _ => None,
        })
    }

    pub fn polylines(&self) -> impl Iterator<Item = &Polyline> {
        self.layers.values().filter_map(|layer| match layer {
            Layer::Polyline(line) => Some(line),
            _ => None,
        })
    }

    pub fn popups(&self) -> impl Iterator<Item = &Popup> {
        self.layers.values().filter_map(|layer| match layer {
            Layer::Popup(popup) => Some(popup),
            _ => None,
        })
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// Marker whose popup is currently open.
    pub fn opened(&self) -> Option<&Marker> {
        match self.open_popup.and_then(|id| self.layers.get(&id)) {
            Some(Layer::Marker(marker)) => Some(marker),
            _ => None,
        }
    }

    pub fn summary(&self) -> SceneSummary {
        self.layers
            .values()
            .fold(SceneSummary::default(), |mut summary, layer| {
                match layer {
                    Layer::Tiles(_) => summary.tiles += 1,
                    Layer::Control(_) => summary.controls += 1,
                    Layer::Marker(_) => summary.markers += 1,
                    Layer::Polyline(_) => summary.polylines += 1,
                    Layer::Popup(_) => summary.popups += 1,
                }
                summary
            })
    }
}

impl MapSurface for SceneSurface {
    fn add_layer(&mut self, layer: Layer) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.insert(id, layer);
        id
    }

    fn remove_layer(&mut self, id: LayerId) -> bool {
        if self.open_popup == Some(id) {
            self.open_popup = None;
        }
        self.layers.remove(&id).is_some()
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.viewport = Some(Viewport::Fitted(bounds));
    }

    fn set_view(&mut self, center: GeoPoint, zoom: u8) {
        self.viewport = Some(Viewport::Centered { center, zoom });
    }

    fn open_popup(&mut self, id: LayerId) {
        if self.layers.contains_key(&id) {
            self.open_popup = Some(id);
        }
    }
}
