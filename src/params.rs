#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Only actors within this distance of a vehicle are negotiated with.
const SEARCH_RADIUS: f64 = 20.0; // m

/// Vehicles further apart than this vertically are on different levels.
const VERTICAL_OVERLAP_THRESHOLD: f64 = 2.0; // m

/// Boundary intersections with no more area than this are ignored.
const ZERO_AREA: f64 = 0.0001; // m^2

/// The minimum for each term of the boundary extension.
const BOUNDARY_EXTENSION_MINIMUM: f64 = 1.5; // m

/// Scales the square root term of the boundary extension.
const EXTENSION_SQUARE_POINT: f64 = 7.0; // m.s

/// Scales the linear term of the boundary extension.
const TIME_HORIZON: f64 = 0.5; // s

/// Above this speed the boundary extension uses the highway horizon.
const HIGHWAY_SPEED: f64 = 50.0 / 3.6; // m/s

/// The boundary extension horizon at highway speeds.
const HIGHWAY_TIME_HORIZON: f64 = 5.0; // s

/// How often the world is scanned for vehicles not managed by the pipeline.
const UNREGISTERED_SCAN_INTERVAL: Duration = Duration::from_millis(500);

/// Tuning of the collision negotiation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionParams {
    /// Only actors within this distance of a vehicle are negotiated with, in m.
    pub search_radius: f64,
    /// The maximum height difference of two negotiating vehicles, in m.
    pub vertical_overlap_threshold: f64,
    /// Footprint intersections must exceed this area to count, in m^2.
    pub zero_area: f64,
    /// The minimum of each term of the boundary extension, in m.
    pub extension_minimum: f64,
    /// Scales the square root term of the boundary extension.
    pub extension_square_point: f64,
    /// Scales the linear term of the boundary extension, in s.
    pub time_horizon: f64,
    /// The speed above which the highway horizon is used, in m/s.
    pub highway_speed: f64,
    /// The boundary extension horizon at highway speeds, in s.
    pub highway_time_horizon: f64,
    /// The minimum time between scans for unregistered actors.
    pub scan_interval: Duration,
}

impl Default for CollisionParams {
    fn default() -> Self {
        Self {
            search_radius: SEARCH_RADIUS,
            vertical_overlap_threshold: VERTICAL_OVERLAP_THRESHOLD,
            zero_area: ZERO_AREA,
            extension_minimum: BOUNDARY_EXTENSION_MINIMUM,
            extension_square_point: EXTENSION_SQUARE_POINT,
            time_horizon: TIME_HORIZON,
            highway_speed: HIGHWAY_SPEED,
            highway_time_horizon: HIGHWAY_TIME_HORIZON,
            scan_interval: UNREGISTERED_SCAN_INTERVAL,
        }
    }
}

/// The attributes of a collision stage.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StageAttributes {
    /// The number of worker threads.
    pub pool_size: usize,
    /// The number of vehicles to allocate output buffers for.
    pub capacity: usize,
    /// The negotiation tuning.
    pub params: CollisionParams,
}

impl Default for StageAttributes {
    fn default() -> Self {
        Self {
            pool_size: 4,
            capacity: 0,
            params: Default::default(),
        }
    }
}
