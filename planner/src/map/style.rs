//! Colours and line styles for the two route tiers.

pub const NORMAL_COLOR: &str = "#27ae60";
pub const URGENT_COLOR: &str = "#e74c3c";
pub const ATTENTION_COLOR: &str = "#f39c12";
pub const OUT_OF_SERVICE_COLOR: &str = "#95a5a6";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineStyle {
    pub color: &'static str,
    pub weight: u8,
    pub opacity: f32,
    pub dash_array: Option<&'static str>,
}

/// Distinguishes the unsaved draft from a persisted route being viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleTier {
    Draft,
    Historical,
}

impl StyleTier {
    pub fn color(self) -> &'static str {
        match self {
            StyleTier::Draft => "#667eea",
            StyleTier::Historical => "#7f8c8d",
        }
    }

    pub fn dashed_steps(self) -> bool {
        self == StyleTier::Historical
    }

    pub fn title(self) -> &'static str {
        match self {
            StyleTier::Draft => "Optimized route",
            StyleTier::Historical => "Saved route",
        }
    }

    /// Halo, main line and dashed highlight, drawn in that order.
    pub fn route_lines(self) -> [PolylineStyle; 3] {
        let (halo, weight) = match self {
            StyleTier::Draft => ("#4a5fd8", 8),
            StyleTier::Historical => ("#5d6d7e", 6),
        };
        [
            PolylineStyle {
                color: halo,
                weight: weight + 4,
                opacity: 0.3,
                dash_array: None,
            },
            PolylineStyle {
                color: self.color(),
                weight,
                opacity: 0.8,
                dash_array: None,
            },
            PolylineStyle {
                color: "#ffffff",
                weight: 3,
                opacity: 0.6,
                dash_array: Some("10, 20"),
            },
        ]
    }
}
