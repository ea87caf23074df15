use crate::actor::{ActorState, Waypoint};
use crate::boundary::{geodesic_boundary, static_boundary};
use crate::debug::debug_boundary;
use crate::math::{distance, intersection_area, Point2d};
use crate::params::CollisionParams;

/// One side of a collision negotiation.
#[derive(Clone, Copy, Debug)]
pub struct Participant<'a> {
    /// The actor's state this tick.
    pub state: ActorState,
    /// The upcoming waypoints, if the actor is managed by the pipeline.
    pub path: Option<&'a [Waypoint]>,
}

impl<'a> Participant<'a> {
    /// A vehicle managed by the pipeline, which follows a known path.
    pub fn managed(state: ActorState, path: &'a [Waypoint]) -> Self {
        Self {
            state,
            path: Some(path),
        }
    }

    /// An actor with no known path.
    pub fn unregistered(state: ActorState) -> Self {
        Self { state, path: None }
    }
}

/// Determines whether two boundaries overlap by more than a negligible area.
pub fn overlaps(a: &[Point2d], b: &[Point2d], params: &CollisionParams) -> bool {
    intersection_area(a, b) > params.zero_area
}

/// Determines whether `reference` must give way to `other`.
///
/// Both footprints are extended along their paths. If the extended footprints
/// overlap, the vehicle whose body is further from the other's extended
/// footprint gives way. When both are equally far, neither does.
pub fn negotiate(reference: &Participant, other: &Participant, params: &CollisionParams) -> bool {
    let height_diff = (reference.state.location.z - other.state.location.z).abs();
    if height_diff >= params.vertical_overlap_threshold {
        return false;
    }

    let reference_geodesic = geodesic_boundary(&reference.state, reference.path, params);
    let other_geodesic = geodesic_boundary(&other.state, other.path, params);
    if !overlaps(&reference_geodesic, &other_geodesic, params) {
        return false;
    }

    let reference_to_other = distance(&static_boundary(&reference.state), &other_geodesic);
    let other_to_reference = distance(&static_boundary(&other.state), &reference_geodesic);

    let hazard = reference_to_other > other_to_reference;
    if hazard {
        debug_boundary("hazard", &reference_geodesic);
        debug_boundary("right of way", &other_geodesic);
    }
    hazard
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::{Point3d, Vector2d, Vector3d};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn vehicle(x: f64, y: f64, z: f64, heading: Vector2d, speed: f64) -> ActorState {
        ActorState {
            location: Point3d::new(x, y, z),
            heading,
            velocity: Vector3d::new(heading.x * speed, heading.y * speed, 0.0),
            half_length: 2.0,
            half_width: 1.0,
        }
    }

    fn path_ahead(state: &ActorState, len: usize) -> Vec<Waypoint> {
        let forward = Vector3d::new(state.heading.x, state.heading.y, 0.0);
        (0..len)
            .map(|i| Waypoint::new(state.location + i as f64 * forward, forward))
            .collect()
    }

    #[test]
    fn rear_vehicle_gives_way() {
        let params = CollisionParams::default();
        let east = Vector2d::new(1.0, 0.0);
        let rear = vehicle(0.0, 0.0, 0.0, east, 0.0);
        let front = vehicle(5.0, 0.0, 0.0, east, 0.0);
        let (rear_path, front_path) = (path_ahead(&rear, 20), path_ahead(&front, 20));
        let rear = Participant::managed(rear, &rear_path);
        let front = Participant::managed(front, &front_path);

        assert!(negotiate(&rear, &front, &params));
        assert!(!negotiate(&front, &rear, &params));
    }

    #[test]
    fn overlapping_bodies_are_a_tie() {
        let params = CollisionParams::default();
        let east = Vector2d::new(1.0, 0.0);
        let a = vehicle(0.0, 0.0, 0.0, east, 0.0);
        let b = vehicle(3.0, 0.0, 0.0, east, 0.0);
        let (a_path, b_path) = (path_ahead(&a, 20), path_ahead(&b, 20));
        let a = Participant::managed(a, &a_path);
        let b = Participant::managed(b, &b_path);

        // Each body touches the other's footprint, so neither has priority
        assert!(!negotiate(&a, &b, &params));
        assert!(!negotiate(&b, &a, &params));
    }

    #[test]
    fn different_levels_never_conflict() {
        let params = CollisionParams::default();
        let east = Vector2d::new(1.0, 0.0);
        let rear = vehicle(0.0, 0.0, 0.0, east, 0.0);
        let front = vehicle(5.0, 0.0, 2.0, east, 0.0);
        let (rear_path, front_path) = (path_ahead(&rear, 20), path_ahead(&front, 20));
        let rear = Participant::managed(rear, &rear_path);
        let front = Participant::managed(front, &front_path);

        assert!(!negotiate(&rear, &front, &params));
        assert!(!negotiate(&front, &rear, &params));
    }

    #[test]
    fn unregistered_actor_uses_bounding_box() {
        let params = CollisionParams::default();
        let east = Vector2d::new(1.0, 0.0);
        let ego = vehicle(0.0, 0.0, 0.0, east, 0.0);
        let ego_path = path_ahead(&ego, 20);
        let ego = Participant::managed(ego, &ego_path);

        // The other actor's bounding box reaches into the ego's footprint
        let blocker = Participant::unregistered(vehicle(5.0, 0.0, 0.0, east, 10.0));
        assert!(negotiate(&ego, &blocker, &params));
        assert!(!negotiate(&blocker, &ego, &params));

        // Without a known path, only its bounding box counts
        let clear = Participant::unregistered(vehicle(8.0, 0.0, 0.0, east, 10.0));
        assert!(!negotiate(&ego, &clear, &params));
    }

    #[test]
    fn crossing_paths() {
        let params = CollisionParams::default();
        let ego = vehicle(0.0, -8.0, 0.0, Vector2d::new(0.0, 1.0), 5.0);
        let cross = vehicle(-3.0, 0.0, 0.0, Vector2d::new(1.0, 0.0), 5.0);
        let (ego_path, cross_path) = (path_ahead(&ego, 30), path_ahead(&cross, 30));
        let ego = Participant::managed(ego, &ego_path);
        let cross = Participant::managed(cross, &cross_path);

        // The crossing vehicle is already at the junction, so the ego gives way
        assert!(negotiate(&ego, &cross, &params));
        assert!(!negotiate(&cross, &ego, &params));
    }

    #[test]
    fn at_most_one_side_gives_way() {
        let params = CollisionParams::default();
        let mut rng = StdRng::seed_from_u64(7);

        let random_vehicle = |rng: &mut StdRng| {
            let angle: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            let heading = Vector2d::new(angle.cos(), angle.sin());
            let state = vehicle(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(0.0..1.0),
                heading,
                rng.gen_range(0.0..20.0),
            );
            let path = path_ahead(&state, 40);
            (state, path)
        };

        for _ in 0..100 {
            let (a, a_path) = random_vehicle(&mut rng);
            let (b, b_path) = random_vehicle(&mut rng);
            let a = Participant::managed(a, &a_path);
            let b = Participant::managed(b, &b_path);
            assert!(!(negotiate(&a, &b, &params) && negotiate(&b, &a, &params)));

            let a_geodesic = geodesic_boundary(&a.state, a.path, &params);
            let b_geodesic = geodesic_boundary(&b.state, b.path, &params);
            assert_eq!(
                overlaps(&a_geodesic, &b_geodesic, &params),
                overlaps(&b_geodesic, &a_geodesic, &params)
            );
        }
    }
}
