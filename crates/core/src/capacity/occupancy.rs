use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyStatus {
    Full,
    Busy,
    Moderate,
    Available,
    Unknown,
}

impl OccupancyStatus {
    fn from_rate(rate: f64) -> Self {
        if rate >= 90.0 {
            OccupancyStatus::Full
        } else if rate >= 70.0 {
            OccupancyStatus::Busy
        } else if rate >= 30.0 {
            OccupancyStatus::Moderate
        } else {
            OccupancyStatus::Available
        }
    }
}

impl std::fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OccupancyStatus::Full => "full",
            OccupancyStatus::Busy => "busy",
            OccupancyStatus::Moderate => "moderate",
            OccupancyStatus::Available => "available",
            OccupancyStatus::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OccupancyStats {
    /// Percentage, capped at 100 and rounded to one decimal.
    pub occupancy_rate: f64,
    pub available_spots: u32,
    pub occupied_spots: u32,
    pub total_capacity: u32,
    pub status: OccupancyStatus,
}

pub fn occupancy_stats(total_capacity: u32, vehicle_count: u32) -> OccupancyStats {
    if total_capacity == 0 {
        return OccupancyStats {
            occupancy_rate: 0.0,
            available_spots: 0,
            occupied_spots: vehicle_count,
            total_capacity,
            status: OccupancyStatus::Unknown,
        };
    }

    let rate = (vehicle_count as f64 / total_capacity as f64 * 100.0).min(100.0);
    OccupancyStats {
        occupancy_rate: (rate * 10.0).round() / 10.0,
        available_spots: total_capacity.saturating_sub(vehicle_count),
        occupied_spots: vehicle_count,
        total_capacity,
        status: OccupancyStatus::from_rate(rate),
    }
}
