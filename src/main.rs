use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use rand::prelude::*;
use rand_distr::Normal;
use traffic_collision::math::{Point3d, Vector2d, Vector3d};
use traffic_collision::{
    ActorHandle, ActorKind, ActorState, CollisionStage, GridIndex, InputFrame, Messenger,
    SimActor, SimWorld, StageAttributes, VehicleRecord, Waypoint,
};

const NUM_LANES: usize = 4;
const VEHICLES_PER_LANE: usize = 25;
const NUM_CROSSING: usize = 5;
const LANE_WIDTH: f64 = 3.5; // m
const PATH_LENGTH: usize = 30; // waypoints
const NUM_FRAMES: u32 = 500;
const DT: f64 = 0.05; // s

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let world = Arc::new(SimWorld::new());
    let mut rng = StdRng::seed_from_u64(0);
    let speeds = Normal::new(12.0, 3.0)?;

    let mut managed = vec![];
    for lane in 0..NUM_LANES {
        let mut x = 0.0;
        for _ in 0..VEHICLES_PER_LANE {
            x += rng.gen_range(6.0..20.0);
            let speed = f64::max(speeds.sample(&mut rng), 0.0);
            let state = car(x, LANE_WIDTH * lane as f64, Vector2d::unit_x(), speed);
            managed.push(world.spawn(ActorKind::Vehicle, state));
        }
    }

    // Vehicles driving across the lanes which the pipeline does not manage
    let crossing: Vec<_> = (0..NUM_CROSSING)
        .map(|i| {
            let state = car(60.0 + 80.0 * i as f64, -20.0, Vector2d::unit_y(), 6.0);
            world.spawn(ActorKind::Vehicle, state)
        })
        .collect();

    let upstream = Arc::new(Messenger::<InputFrame>::new());
    let downstream = Arc::new(Messenger::new());
    let attributes = StageAttributes {
        capacity: managed.len(),
        ..Default::default()
    };
    let stage = CollisionStage::new(
        &attributes,
        world.clone(),
        GridIndex::default(),
        upstream.clone(),
        downstream.clone(),
    )?;
    let stage = stage.spawn()?;

    // Stands in for the motion planner stage
    let planner = thread::spawn(move || {
        let mut version = downstream.state();
        let mut frames = 0;
        let mut hazards = 0;
        while let Some(packet) = downstream.receive(version) {
            version = packet.version;
            frames += 1;
            hazards += packet.data.read().iter().filter(|flag| **flag).count();
        }
        (frames, hazards)
    });

    println!("Simulating...");
    let start = Instant::now();
    let mut version = upstream.state().wrapping_sub(1);
    for _ in 0..NUM_FRAMES {
        let frame = managed
            .iter()
            .map(localize)
            .collect::<Result<Vec<_>, _>>()?;
        match upstream.send(version, Arc::new(frame)) {
            Some(next) => version = next,
            None => break,
        }
        for actor in managed.iter().chain(&crossing) {
            advance(actor, DT)?;
        }
    }
    let elapsed = start.elapsed();

    stage.stop()?;
    let (frames, hazards) = planner.join().unwrap_or_default();
    println!(
        "Avg. frame: {:?} --> {} frames, {} vehs, {:.2} hazards per frame",
        elapsed / NUM_FRAMES,
        frames,
        managed.len(),
        hazards as f64 / usize::max(frames, 1) as f64,
    );
    Ok(())
}

fn car(x: f64, y: f64, heading: Vector2d, speed: f64) -> ActorState {
    ActorState {
        location: Point3d::new(x, y, 0.0),
        heading,
        velocity: Vector3d::new(heading.x * speed, heading.y * speed, 0.0),
        half_length: 2.3,
        half_width: 0.9,
    }
}

/// Builds a vehicle record with a straight path ahead of the vehicle.
fn localize(actor: &Arc<SimActor>) -> Result<VehicleRecord, Box<dyn Error>> {
    let state = actor.state()?;
    let forward = Vector3d::new(state.heading.x, state.heading.y, 0.0);
    let buffer = (0..PATH_LENGTH)
        .map(|i| Waypoint::new(state.location + i as f64 * forward, forward))
        .collect();
    Ok(VehicleRecord::new(actor.clone(), buffer))
}

fn advance(actor: &SimActor, dt: f64) -> Result<(), Box<dyn Error>> {
    let mut state = actor.state()?;
    state.location += dt * state.velocity;
    actor.set_state(state);
    Ok(())
}
