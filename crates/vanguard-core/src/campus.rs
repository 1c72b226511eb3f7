//! Static campus geography — destinations, visit purposes, the premise
//! map, and the cosmetic parking/QR helpers that decorate a pass.

use crate::visitor::VisitorPersona;
use rand::Rng;

/// A selectable destination on campus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub id: &'static str,
    pub label: &'static str,
    pub parking_zone: &'static str,
}

/// Destination table, in kiosk display order.
pub const DESTINATIONS: [Destination; 4] = [
    Destination { id: "TOWER_A", label: "Tower A (Finance)", parking_zone: "Zone A" },
    Destination { id: "TOWER_B", label: "Tower B (Tech Hub)", parking_zone: "Zone B" },
    Destination { id: "TOWER_C", label: "Tower C (Ops)", parking_zone: "Zone C" },
    Destination { id: "ANNEX", label: "Convention Ctr", parking_zone: "Zone D" },
];

/// Look up a destination by id. Unknown ids fall back to the first entry.
pub fn destination_by_id(id: &str) -> Destination {
    DESTINATIONS
        .iter()
        .find(|d| d.id == id)
        .copied()
        .unwrap_or(DESTINATIONS[0])
}

/// A visit purpose and the persona it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Purpose {
    pub label: &'static str,
    pub persona: VisitorPersona,
}

pub const PURPOSES: [Purpose; 6] = [
    Purpose { label: "Business Meeting", persona: VisitorPersona::CorporateVisitor },
    Purpose { label: "Site Maintenance", persona: VisitorPersona::Contractor },
    Purpose { label: "Delivery / Logistics", persona: VisitorPersona::Delivery },
    Purpose { label: "Job Interview", persona: VisitorPersona::InterviewCandidate },
    Purpose { label: "VIP Visit", persona: VisitorPersona::Vip },
    Purpose { label: "Staff Entry", persona: VisitorPersona::InternalStaff },
];

/// Look up a purpose by display label. Unknown labels fall back to the
/// first entry.
pub fn purpose_by_label(label: &str) -> Purpose {
    PURPOSES
        .iter()
        .find(|p| p.label == label)
        .copied()
        .unwrap_or(PURPOSES[0])
}

/// The purpose auto-selected when a staff badge is scanned.
pub fn staff_purpose() -> Purpose {
    PURPOSES
        .iter()
        .find(|p| p.persona == VisitorPersona::InternalStaff)
        .copied()
        .unwrap_or(PURPOSES[0])
}

/// Allocate a cosmetic parking slot in the destination's zone:
/// `"{zone}-0{n}"` with n in 1..=9. Not a real allocator; collisions
/// are not checked.
pub fn parking_slot<R: Rng + ?Sized>(rng: &mut R, zone: &str) -> String {
    let n: u32 = rng.gen_range(1..=9);
    format!("{zone}-0{n}")
}

/// Node kind on the premise map, controls rendering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Tower,
    AmenityCircle,
    AmenityRect,
    Guard,
}

/// A fixed node on the schematic premise map (percent coordinates).
#[derive(Debug, Clone, Copy)]
pub struct MapNode {
    pub key: &'static str,
    pub x: f32,
    pub y: f32,
    pub label: &'static str,
    pub kind: NodeKind,
}

pub const MAP_NODES: [MapNode; 8] = [
    MapNode { key: "GUARD_A", x: 25.0, y: 88.0, label: "Guard House A", kind: NodeKind::Guard },
    MapNode { key: "GUARD_B", x: 92.0, y: 62.0, label: "Guard House B", kind: NodeKind::Guard },
    MapNode { key: "TOWER_A", x: 38.0, y: 35.0, label: "Tower 1 (HQ)", kind: NodeKind::Tower },
    MapNode { key: "TOWER_B", x: 62.0, y: 35.0, label: "Tower 2", kind: NodeKind::Tower },
    MapNode { key: "TOWER_C", x: 50.0, y: 52.0, label: "Tower 3", kind: NodeKind::Tower },
    MapNode { key: "ANNEX", x: 15.0, y: 20.0, label: "Convention Ctr", kind: NodeKind::AmenityCircle },
    MapNode { key: "MOSQUE", x: 88.0, y: 20.0, label: "Mosque", kind: NodeKind::AmenityCircle },
    MapNode { key: "SPORTS", x: 85.0, y: 88.0, label: "Sports Field", kind: NodeKind::AmenityRect },
];

/// Entry point for walking routes (main guard house).
pub const START_NODE_KEY: &str = "GUARD_A";

pub fn map_node(key: &str) -> Option<MapNode> {
    MAP_NODES.iter().find(|n| n.key == key).copied()
}

/// Cosmetic walking estimate shown on the navigation screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkingEstimate {
    /// Straight-line distance in metres (scaled map units).
    pub distance_m: u32,
    /// Estimated walking time in whole minutes, rounded up.
    pub minutes: u32,
}

/// Map-unit to metre scale factor.
const DISTANCE_SCALE: f32 = 4.0;
/// Assumed walking speed, metres per minute.
const WALK_SPEED_M_PER_MIN: f32 = 60.0;

/// Straight-line estimate from the main guard house to a destination.
/// This is cosmetic geometry, not pathfinding: no obstacles, no graph.
/// Unknown destinations fall back to Tower A.
pub fn walking_estimate(destination_id: &str) -> WalkingEstimate {
    // START_NODE_KEY and TOWER_A are both in MAP_NODES.
    let start = map_node(START_NODE_KEY).unwrap_or(MAP_NODES[0]);
    let end = map_node(destination_id)
        .or_else(|| map_node("TOWER_A"))
        .unwrap_or(MAP_NODES[0]);

    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let distance_m = ((dx * dx + dy * dy).sqrt() * DISTANCE_SCALE).round() as u32;
    let minutes = (distance_m as f32 / WALK_SPEED_M_PER_MIN).ceil() as u32;

    WalkingEstimate { distance_m, minutes }
}

/// Generate a decorative QR-like dot grid (`side * side` cells, each
/// filled with probability `density`). Not a real encoding.
pub fn qr_grid<R: Rng + ?Sized>(rng: &mut R, side: usize, density: f64) -> Vec<bool> {
    (0..side * side).map(|_| rng.gen_bool(density)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_destination_lookup_and_fallback() {
        assert_eq!(destination_by_id("TOWER_A").label, "Tower A (Finance)");
        assert_eq!(destination_by_id("ANNEX").parking_zone, "Zone D");
        // Unknown id falls back to the first destination
        assert_eq!(destination_by_id("BASEMENT"), DESTINATIONS[0]);
    }

    #[test]
    fn test_purpose_lookup() {
        assert_eq!(purpose_by_label("VIP Visit").persona, VisitorPersona::Vip);
        assert_eq!(staff_purpose().label, "Staff Entry");
        assert_eq!(purpose_by_label("nonsense"), PURPOSES[0]);
    }

    #[test]
    fn test_parking_slot_pattern() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let slot = parking_slot(&mut rng, "Zone B");
            let suffix = slot.strip_prefix("Zone B-0").unwrap();
            let n: u32 = suffix.parse().unwrap();
            assert!((1..=9).contains(&n), "slot {slot} outside Z-0[1-9]");
        }
    }

    #[test]
    fn test_walking_estimate_tower_a() {
        // GUARD_A (25,88) -> TOWER_A (38,35): sqrt(13^2 + 53^2) * 4 = 218m
        let est = walking_estimate("TOWER_A");
        assert_eq!(est.distance_m, 218);
        assert_eq!(est.minutes, 4);
    }

    #[test]
    fn test_walking_estimate_unknown_falls_back_to_tower_a() {
        assert_eq!(walking_estimate("NOWHERE"), walking_estimate("TOWER_A"));
    }

    #[test]
    fn test_qr_grid_dimensions() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(qr_grid(&mut rng, 7, 0.7).len(), 49);
        assert_eq!(qr_grid(&mut rng, 5, 0.6).len(), 25);
    }
}
