use crate::math::{ground, Point2d, Point3d, Vector2d, Vector3d};
use crate::ActorId;
use cgmath::prelude::*;
use std::sync::Arc;
use thiserror::Error;

/// A shared handle to an actor in the simulated world.
pub type Actor = Arc<dyn ActorHandle>;

/// An actor in the simulated world, as exposed by the simulation client.
pub trait ActorHandle: Send + Sync {
    /// Gets the actor's ID.
    fn id(&self) -> ActorId;

    /// Whether the actor still exists in the simulation.
    fn is_alive(&self) -> bool;

    /// Takes a snapshot of the actor's pose and extents.
    fn state(&self) -> Result<ActorState, ActorError>;
}

/// The category of an actor, used to filter world queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Vehicle,
    Walker,
    Other,
}

/// A failure to query an actor.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ActorError {
    #[error("actor {0:?} has been destroyed")]
    Destroyed(ActorId),
}

/// A snapshot of an actor's pose and extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorState {
    /// The world space coordinates of the centre of the actor.
    pub location: Point3d,
    /// A unit vector on the ground plane aligned with the actor's heading.
    pub heading: Vector2d,
    /// The velocity in m/s.
    pub velocity: Vector3d,
    /// Half the actor's length in m.
    pub half_length: f64,
    /// Half the actor's width in m.
    pub half_width: f64,
}

/// A point on a vehicle's planned path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    /// The world space coordinates of the waypoint.
    pub location: Point3d,
    /// The direction of travel at the waypoint.
    pub forward: Vector3d,
}

/// A vehicle managed by the pipeline, as produced by the localization stage.
#[derive(Clone)]
pub struct VehicleRecord {
    /// The vehicle's actor.
    pub actor: Actor,
    /// The upcoming waypoints on the vehicle's path, nearest first.
    pub buffer: Vec<Waypoint>,
}

impl ActorState {
    /// The speed in m/s.
    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }

    /// The coordinates of the centre of the actor on the ground plane.
    pub fn position(&self) -> Point2d {
        ground(self.location)
    }
}

impl Waypoint {
    pub fn new(location: Point3d, forward: Vector3d) -> Self {
        Self { location, forward }
    }
}

impl VehicleRecord {
    pub fn new(actor: Actor, buffer: Vec<Waypoint>) -> Self {
        Self { actor, buffer }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> ActorId {
        self.actor.id()
    }
}

impl std::fmt::Debug for VehicleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleRecord")
            .field("id", &self.actor.id())
            .field("buffer", &self.buffer.len())
            .finish()
    }
}
