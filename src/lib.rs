//! Collision negotiation stage of a multi-stage traffic manager pipeline.
//!
//! Once per tick the stage receives the managed vehicles from the localization
//! stage, decides for each of them whether continuing along its path would run
//! into another vehicle, and hands one hazard flag per vehicle to the motion
//! planner stage.

pub use actor::{Actor, ActorError, ActorHandle, ActorKind, ActorState, VehicleRecord, Waypoint};
pub use cgmath;
pub use error::StageError;
pub use frame::{FrameRing, HazardFrame};
pub use messenger::{Messenger, Packet, Version};
pub use negotiation::{negotiate, overlaps, Participant};
pub use params::{CollisionParams, StageAttributes};
pub use registry::{Candidate, Registry};
use slotmap::new_key_type;
pub use slotmap::{Key, KeyData};
pub use stage::{CollisionStage, InputFrame, StageHandle};
pub use util::Interval;
pub use vicinity::{GridIndex, VicinityIndex};
pub use world::{SimActor, SimWorld, World};

mod actor;
pub mod boundary;
mod debug;
mod error;
mod frame;
pub mod math;
mod messenger;
mod negotiation;
mod params;
mod registry;
mod stage;
mod util;
mod vicinity;
mod world;

new_key_type! {
    /// Unique ID of an actor in the simulated world.
    pub struct ActorId;
}
