//! Urgency classification of pickup points from their container readings.

use shared::{Container, PickupPoint};

/// Fill ratio at which a container must be emptied this cycle (inclusive).
pub const URGENT_FILL_RATIO: f64 = 0.8;
/// Fill ratio at which a container is flagged for attention in popups.
pub const ATTENTION_FILL_RATIO: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyClass {
    Urgent,
    Normal,
}

impl UrgencyClass {
    pub fn is_urgent(self) -> bool {
        self == UrgencyClass::Urgent
    }
}

/// Condition of a single container, as shown in a point's popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerCondition {
    OutOfService,
    Urgent,
    Attention,
    Normal,
}

impl ContainerCondition {
    pub fn of(container: &Container) -> Self {
        if !container.is_functional() {
            return ContainerCondition::OutOfService;
        }
        let ratio = container.fill_ratio();
        if ratio >= URGENT_FILL_RATIO {
            ContainerCondition::Urgent
        } else if ratio >= ATTENTION_FILL_RATIO {
            ContainerCondition::Attention
        } else {
            ContainerCondition::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContainerCondition::OutOfService => "Out of service",
            ContainerCondition::Urgent => "Urgent",
            ContainerCondition::Attention => "Attention",
            ContainerCondition::Normal => "Normal",
        }
    }
}

pub fn classify(point: &PickupPoint) -> UrgencyClass {
    let needs_visit = point
        .containers
        .iter()
        .any(|c| !c.is_functional() || c.fill_ratio() >= URGENT_FILL_RATIO);

    if needs_visit {
        UrgencyClass::Urgent
    } else {
        UrgencyClass::Normal
    }
}

/// Fill level as a whole percentage, for display.
pub fn fill_percent(container: &Container) -> u32 {
    let ratio = container.fill_ratio();
    if ratio.is_finite() {
        (ratio * 100.0).round().max(0.0) as u32
    } else {
        100
    }
}

/// Pickup points split by urgency, each side in input order.
#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub urgent: Vec<&'a PickupPoint>,
    pub normal: Vec<&'a PickupPoint>,
}

impl Classified<'_> {
    pub fn has_urgent(&self) -> bool {
        !self.urgent.is_empty()
    }
}

pub fn partition(points: &[PickupPoint]) -> Classified<'_> {
    let mut classified = Classified::default();
    for point in points {
        match classify(point) {
            UrgencyClass::Urgent => classified.urgent.push(point),
            UrgencyClass::Normal => classified.normal.push(point),
        }
    }
    classified
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ContainerStatus;

    fn container(fill_level: f64, capacity: f64, status: ContainerStatus) -> Container {
        Container {
            id: Some("c".into()),
            kind: "plastic".into(),
            fill_level,
            capacity,
            status,
        }
    }

    fn point(id: &str, containers: Vec<Container>) -> PickupPoint {
        PickupPoint {
            id: id.into(),
            lat: 35.78,
            lng: 10.83,
            address: String::new(),
            containers,
        }
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let full = point("a", vec![container(80.0, 100.0, ContainerStatus::Functional)]);
        let almost = point("b", vec![container(79.0, 100.0, ContainerStatus::Functional)]);
        assert_eq!(classify(&full), UrgencyClass::Urgent);
        assert_eq!(classify(&almost), UrgencyClass::Normal);
    }

    #[test]
    fn test_broken_container_is_urgent_at_any_fill() {
        let broken = point("a", vec![container(0.0, 100.0, ContainerStatus::NonFunctional)]);
        assert_eq!(classify(&broken), UrgencyClass::Urgent);
    }

    #[test]
    fn test_empty_container_list_is_normal() {
        assert_eq!(classify(&point("a", vec![])), UrgencyClass::Normal);
    }

    #[test]
    fn test_one_full_container_among_many() {
        let mixed = point(
            "a",
            vec![
                container(10.0, 100.0, ContainerStatus::Functional),
                container(95.0, 100.0, ContainerStatus::Functional),
            ],
        );
        assert!(classify(&mixed).is_urgent());
    }

    #[test]
    fn test_overfilled_container_uses_raw_ratio() {
        let over = point("a", vec![container(130.0, 100.0, ContainerStatus::Functional)]);
        assert_eq!(classify(&over), UrgencyClass::Urgent);
        assert_eq!(fill_percent(&over.containers[0]), 130);
    }

    #[test]
    fn test_zero_capacity() {
        let empty = point("a", vec![container(0.0, 0.0, ContainerStatus::Functional)]);
        let spilled = point("b", vec![container(3.0, 0.0, ContainerStatus::Functional)]);
        assert_eq!(classify(&empty), UrgencyClass::Normal);
        assert_eq!(classify(&spilled), UrgencyClass::Urgent);
        assert_eq!(fill_percent(&spilled.containers[0]), 100);
    }

    #[test]
    fn test_container_conditions() {
        let cases = [
            (container(50.0, 100.0, ContainerStatus::NonFunctional), ContainerCondition::OutOfService),
            (container(80.0, 100.0, ContainerStatus::Functional), ContainerCondition::Urgent),
            (container(60.0, 100.0, ContainerStatus::Functional), ContainerCondition::Attention),
            (container(59.0, 100.0, ContainerStatus::Functional), ContainerCondition::Normal),
        ];
        for (c, expected) in cases {
            assert_eq!(ContainerCondition::of(&c), expected);
        }
    }

    #[test]
    fn test_partition_keeps_input_order() {
        let points = vec![
            point("n1", vec![container(10.0, 100.0, ContainerStatus::Functional)]),
            point("u1", vec![container(90.0, 100.0, ContainerStatus::Functional)]),
            point("n2", vec![]),
            point("u2", vec![container(0.0, 100.0, ContainerStatus::NonFunctional)]),
        ];
        let classified = partition(&points);
        let urgent: Vec<_> = classified.urgent.iter().map(|p| p.id.as_str()).collect();
        let normal: Vec<_> = classified.normal.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(urgent, ["u1", "u2"]);
        assert_eq!(normal, ["n1", "n2"]);
        assert!(classified.has_urgent());
    }
}
