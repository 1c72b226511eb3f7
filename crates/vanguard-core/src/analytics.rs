//! Mock analytics backing the security dashboard. Static data only;
//! there is no real measurement pipeline behind it.

use rand::Rng;
use serde::Serialize;

/// Visitor/guard counts at a point in the day.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrafficPoint {
    pub time: &'static str,
    pub visitors: u32,
    pub guards: u32,
}

pub const TRAFFIC_BY_HOUR: [TrafficPoint; 6] = [
    TrafficPoint { time: "08:00", visitors: 12, guards: 4 },
    TrafficPoint { time: "10:00", visitors: 45, guards: 6 },
    TrafficPoint { time: "12:00", visitors: 82, guards: 8 },
    TrafficPoint { time: "14:00", visitors: 65, guards: 8 },
    TrafficPoint { time: "16:00", visitors: 30, guards: 5 },
    TrafficPoint { time: "18:00", visitors: 15, guards: 4 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertLevel {
    Low,
    Medium,
    High,
}

/// A canned perimeter alert shown on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityAlert {
    pub id: &'static str,
    pub timestamp: &'static str,
    pub level: AlertLevel,
    pub message: &'static str,
    pub location: &'static str,
}

pub const ALERTS: [SecurityAlert; 2] = [
    SecurityAlert {
        id: "A1",
        timestamp: "10:15 AM",
        level: AlertLevel::Low,
        message: "Gate 3 sensor bypass detected",
        location: "North Perimeter",
    },
    SecurityAlert {
        id: "A2",
        timestamp: "11:30 AM",
        level: AlertLevel::High,
        message: "Unrecognized facial match at Server Room 4",
        location: "Tower B, L12",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BayType {
    Standard,
    Ev,
    Vip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BayStatus {
    Available,
    Occupied,
    Reserved,
}

/// A parking bay on the P1 deck.
#[derive(Debug, Clone, Serialize)]
pub struct ParkingBay {
    pub id: String,
    pub bay_type: BayType,
    pub status: BayStatus,
    pub tower: &'static str,
}

/// Seed the mock P1 parking deck: every tenth bay is a reserved VIP
/// bay, every fifth an EV charger, and the rest have occupancy
/// randomized at roughly 30%.
pub fn seed_parking<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<ParkingBay> {
    (0..count)
        .map(|i| {
            let bay_type = if i % 10 == 9 {
                BayType::Vip
            } else if i % 5 == 0 {
                BayType::Ev
            } else {
                BayType::Standard
            };
            ParkingBay {
                id: format!("P1-{}", i + 1),
                bay_type,
                status: if bay_type == BayType::Vip {
                    BayStatus::Reserved
                } else if rng.gen_bool(0.7) {
                    BayStatus::Available
                } else {
                    BayStatus::Occupied
                },
                tower: crate::campus::DESTINATIONS[i % crate::campus::DESTINATIONS.len()].label,
            }
        })
        .collect()
}

/// Peak visitor count across the day's traffic curve.
pub fn peak_visitors() -> u32 {
    TRAFFIC_BY_HOUR.iter().map(|p| p.visitors).max().unwrap_or(0)
}
