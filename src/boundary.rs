//! Footprint polygons of vehicles on the ground plane.

use crate::actor::{ActorState, Waypoint};
use crate::math::{ground, ground_dir, rot90, Point2d};
use crate::params::CollisionParams;
use cgmath::prelude::*;

/// The four corners of a vehicle's bounding box.
pub type StaticBoundary = [Point2d; 4];

/// Computes the corners of the actor's bounding box on the ground plane,
/// in clockwise order for the simulator's left-handed frame.
pub fn static_boundary(state: &ActorState) -> StaticBoundary {
    let pos = state.position();
    let x = state.half_length * state.heading;
    let y = state.half_width * rot90(state.heading);
    [pos + x - y, pos - x - y, pos - x + y, pos + x + y]
}

/// Computes how far a vehicle's boundary is extended along its path, in m.
///
/// # Parameters
/// * `speed` - The vehicle's speed in m/s
/// * `params` - The negotiation tuning
pub fn extension_length(speed: f64, params: &CollisionParams) -> f64 {
    if speed > params.highway_speed {
        return params.highway_time_horizon * speed;
    }
    let min = params.extension_minimum;
    f64::max((params.extension_square_point * speed).sqrt(), min)
        + f64::max(speed * params.time_horizon, min)
        + min
}

/// Computes the vehicle's footprint extended along its upcoming path.
///
/// Actors without a path, or with an empty one, get their bounding box.
///
/// # Parameters
/// * `state` - The vehicle's state
/// * `path` - The upcoming waypoints of a managed vehicle, nearest first
/// * `params` - The negotiation tuning
pub fn geodesic_boundary(
    state: &ActorState,
    path: Option<&[Waypoint]>,
    params: &CollisionParams,
) -> Vec<Point2d> {
    let bbox = static_boundary(state);
    let Some(path) = path.filter(|path| !path.is_empty()) else {
        return bbox.to_vec();
    };

    let extension = extension_length(state.speed(), params);
    let max_dist2 = extension * extension;
    let start = ground(path[0].location);

    let mut left = vec![];
    let mut right = vec![];
    for waypoint in path {
        let pos = ground(waypoint.location);
        if start.distance2(pos) >= max_dist2 {
            break;
        }
        if let Some(heading) = ground_dir(waypoint.forward) {
            let offset = state.half_width * rot90(heading);
            left.push(pos + offset);
            right.push(pos - offset);
        }
    }

    // Trace the right side from the far end back to the vehicle,
    // around the bounding box, then out along the left side.
    right
        .into_iter()
        .rev()
        .chain(bbox)
        .chain(left)
        .collect()
}
