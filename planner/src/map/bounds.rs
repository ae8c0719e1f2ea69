use geo_types::{coord, Rect};
use shared::GeoPoint;

/// Padding applied around a route before fitting the viewport.
pub const ROUTE_PADDING: f64 = 0.4;

/// Geographic bounding box. `x` is longitude, `y` latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds(Rect<f64>);

impl Bounds {
    /// `None` for an empty point set.
    pub fn from_points(points: impl IntoIterator<Item = GeoPoint>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mut min_lat, mut max_lat) = (first.lat, first.lat);
        let (mut min_lng, mut max_lng) = (first.lng, first.lng);
        for point in points {
            min_lat = min_lat.min(point.lat);
            max_lat = max_lat.max(point.lat);
            min_lng = min_lng.min(point.lng);
            max_lng = max_lng.max(point.lng);
        }
        Some(Bounds(Rect::new(
            coord! { x: min_lng, y: min_lat },
            coord! { x: max_lng, y: max_lat },
        )))
    }

    /// Extend each side by `ratio` times the span on that axis.
    pub fn pad(self, ratio: f64) -> Self {
        let dx = self.0.width() * ratio;
        let dy = self.0.height() * ratio;
        let (min, max) = (self.0.min(), self.0.max());
        Bounds(Rect::new(
            coord! { x: min.x - dx, y: min.y - dy },
            coord! { x: max.x + dx, y: max.y + dy },
        ))
    }

    pub fn south_west(&self) -> GeoPoint {
        let min = self.0.min();
        GeoPoint::new(min.y, min.x)
    }

    pub fn north_east(&self) -> GeoPoint {
        let max = self.0.max();
        GeoPoint::new(max.y, max.x)
    }

    pub fn center(&self) -> GeoPoint {
        let center = self.0.center();
        GeoPoint::new(center.y, center.x)
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        let (min, max) = (self.0.min(), self.0.max());
        (min.y..=max.y).contains(&point.lat) && (min.x..=max.x).contains(&point.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_set_has_no_bounds() {
        assert!(Bounds::from_points(Vec::new()).is_none());
    }

    #[test]
    fn box_covers_every_point() {
        let points = [
            GeoPoint::new(35.77, 10.82),
            GeoPoint::new(35.80, 10.79),
            GeoPoint::new(35.75, 10.85),
        ];
        let bounds = Bounds::from_points(points).unwrap();
        assert_eq!(bounds.south_west(), GeoPoint::new(35.75, 10.79));
        assert_eq!(bounds.north_east(), GeoPoint::new(35.80, 10.85));
        assert!(points.iter().all(|p| bounds.contains(*p)));
    }

    #[test]
    fn padding_extends_each_side_by_span_ratio() {
        let bounds = Bounds::from_points([GeoPoint::new(0.0, 0.0), GeoPoint::new(10.0, 20.0)])
            .unwrap()
            .pad(ROUTE_PADDING);
        let sw = bounds.south_west();
        let ne = bounds.north_east();
        assert!(close(sw.lat, -4.0) && close(sw.lng, -8.0));
        assert!(close(ne.lat, 14.0) && close(ne.lng, 28.0));
        assert!(close(bounds.center().lat, 5.0) && close(bounds.center().lng, 10.0));
    }

    #[test]
    fn single_point_stays_degenerate_after_padding() {
        let point = GeoPoint::new(35.77799, 10.82617);
        let bounds = Bounds::from_points([point]).unwrap().pad(ROUTE_PADDING);
        assert_eq!(bounds.center(), point);
        assert_eq!(bounds.south_west(), bounds.north_east());
    }
}
