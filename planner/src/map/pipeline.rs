use std::collections::HashMap;

use chrono::Local;
use shared::{GeoPoint, PickupPoint};

use super::{
    bounds::{Bounds, ROUTE_PADDING},
    popup,
    style::StyleTier,
    surface::{Control, Layer, LayerId, MapSurface, Marker, MarkerIcon, Polyline, Popup, TileLayer, Tooltip},
};
use crate::{
    classify::{classify, UrgencyClass},
    config::Depot,
};

pub const DEFAULT_ZOOM: u8 = 13;
const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}{r}.png";
const TILE_ATTRIBUTION: &str = "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>";
const TILE_SUBDOMAINS: &str = "abcd";
const TILE_MAX_ZOOM: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerGroup {
    /// Tiles and controls; never removed once installed.
    Base,
    Points,
    Route,
}

/// Layers created by the pipeline, by role.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    groups: HashMap<LayerGroup, Vec<LayerId>>,
}

impl LayerRegistry {
    pub fn record(&mut self, group: LayerGroup, id: LayerId) {
        self.groups.entry(group).or_default().push(id);
    }

    pub fn take(&mut self, group: LayerGroup) -> Vec<LayerId> {
        self.groups.remove(&group).unwrap_or_default()
    }

    pub fn ids(&self, group: LayerGroup) -> &[LayerId] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A route ready to draw: decoded geometry plus the stops in visiting order.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay {
    pub path: Vec<GeoPoint>,
    pub stops: Vec<GeoPoint>,
    pub tier: StyleTier,
    pub distance_meters: f64,
    pub time_millis: u64,
}

/// Owns every layer it puts on the surface and removes exactly those.
pub struct MapRenderPipeline<S> {
    surface: S,
    depot: Depot,
    registry: LayerRegistry,
    shown_route: Option<StyleTier>,
}

impl<S: MapSurface> MapRenderPipeline<S> {
    pub fn new(surface: S, depot: Depot) -> Self {
        Self {
            surface,
            depot,
            registry: LayerRegistry::default(),
            shown_route: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn depot(&self) -> &Depot {
        &self.depot
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Tier of the route polyline on the map, if any.
    pub fn shown_route(&self) -> Option<StyleTier> {
        self.shown_route
    }

    /// Tile layer, zoom and scale controls, legend. Idempotent.
    pub fn install_base(&mut self) {
        if !self.registry.ids(LayerGroup::Base).is_empty() {
            return;
        }
        let base = [
            Layer::Tiles(TileLayer {
                url_template: TILE_URL.to_string(),
                attribution: TILE_ATTRIBUTION.to_string(),
                subdomains: TILE_SUBDOMAINS.to_string(),
                max_zoom: TILE_MAX_ZOOM,
            }),
            Layer::Control(Control::Zoom),
            Layer::Control(Control::Scale),
            Layer::Control(Control::Legend {
                html: popup::legend_html(),
            }),
        ];
        for layer in base {
            self.add(LayerGroup::Base, layer);
        }
        self.surface.set_view(self.depot.location, DEFAULT_ZOOM);
    }

    /// Clear points and route, then draw the depot and one marker per point.
    pub fn render_points(&mut self, points: &[PickupPoint]) {
        self.clear_group(LayerGroup::Points);
        self.clear_route();

        self.add(
            LayerGroup::Points,
            Layer::Marker(Marker {
                position: self.depot.location,
                icon: MarkerIcon::Depot,
                tooltip: Some(Tooltip::permanent("START")),
                popup: Some(popup::depot_popup(&self.depot)),
            }),
        );

        let today = Local::now().date_naive();
        let mut urgent = 0;
        for point in points {
            let class = classify(point);
            let (icon, tooltip) = match class {
                UrgencyClass::Urgent => {
                    urgent += 1;
                    (MarkerIcon::UrgentBin, "Full!")
                }
                UrgencyClass::Normal => (MarkerIcon::NormalBin, "OK"),
            };
            self.add(
                LayerGroup::Points,
                Layer::Marker(Marker {
                    position: point.location(),
                    icon,
                    tooltip: Some(Tooltip::hover(tooltip)),
                    popup: Some(popup::point_popup(point, class, today)),
                }),
            );
        }
        tracing::debug!(points = points.len(), urgent, "rendered pickup points");
    }

    /// Replace the shown route and fit the viewport to it.
    pub fn render_route(&mut self, overlay: RouteOverlay) {
        self.clear_route();

        for style in overlay.tier.route_lines() {
            self.add(
                LayerGroup::Route,
                Layer::Polyline(Polyline {
                    path: overlay.path.clone(),
                    style,
                }),
            );
        }

        for (index, stop) in overlay.stops.iter().enumerate() {
            let number = index + 1;
            self.add(
                LayerGroup::Route,
                Layer::Marker(Marker {
                    position: *stop,
                    icon: MarkerIcon::Step {
                        number,
                        tier: overlay.tier,
                    },
                    tooltip: Some(Tooltip::hover(format!("Step {number}"))),
                    popup: None,
                }),
            );
        }

        let summary = self.add(
            LayerGroup::Route,
            Layer::Marker(Marker {
                position: self.depot.location,
                icon: MarkerIcon::Depot,
                tooltip: None,
                popup: Some(popup::route_summary_popup(
                    overlay.tier,
                    overlay.stops.len(),
                    overlay.distance_meters,
                    overlay.time_millis,
                )),
            }),
        );
        self.surface.open_popup(summary);

        match Bounds::from_points(overlay.path.iter().copied()) {
            Some(bounds) => self.surface.fit_bounds(bounds.pad(ROUTE_PADDING)),
            None => self.center_on_depot(),
        }
        self.shown_route = Some(overlay.tier);
        tracing::debug!(
            tier = ?overlay.tier,
            vertices = overlay.path.len(),
            stops = overlay.stops.len(),
            "rendered route"
        );
    }

    pub fn clear_route(&mut self) {
        self.clear_group(LayerGroup::Route);
        self.shown_route = None;
    }

    pub fn center_on_depot(&mut self) {
        self.surface.set_view(self.depot.location, DEFAULT_ZOOM);
    }

    /// Standalone popup at the depot, removed on the next point render.
    pub fn show_message(&mut self, text: &str) {
        self.add(
            LayerGroup::Points,
            Layer::Popup(Popup {
                position: self.depot.location,
                html: popup::escape_html(text),
            }),
        );
    }

    fn add(&mut self, group: LayerGroup, layer: Layer) -> LayerId {
        let id = self.surface.add_layer(layer);
        self.registry.record(group, id);
        id
    }

    fn clear_group(&mut self, group: LayerGroup) {
        for id in self.registry.take(group) {
            if !self.surface.remove_layer(id) {
                tracing::warn!(?id, ?group, "layer already gone from the map");
            }
        }
    }
}
