use crate::actor::{Actor, ActorError, ActorHandle, ActorKind, ActorState};
use crate::ActorId;
use parking_lot::RwLock;
use slotmap::SlotMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The simulation client, as seen by the collision stage.
pub trait World: Send + Sync {
    /// Lists the live actors of the given kind.
    fn list_actors(&self, kind: ActorKind) -> Vec<Actor>;
}

/// An in-memory simulated world.
#[derive(Default)]
pub struct SimWorld {
    actors: RwLock<SlotMap<ActorId, Arc<SimActor>>>,
}

/// An actor of a [SimWorld].
#[derive(Debug)]
pub struct SimActor {
    id: ActorId,
    kind: ActorKind,
    alive: AtomicBool,
    state: RwLock<ActorState>,
}

impl SimWorld {
    /// Creates an empty world.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds an actor to the world.
    pub fn spawn(&self, kind: ActorKind, state: ActorState) -> Arc<SimActor> {
        let mut actors = self.actors.write();
        let id = actors.insert_with_key(|id| {
            Arc::new(SimActor {
                id,
                kind,
                alive: AtomicBool::new(true),
                state: RwLock::new(state),
            })
        });
        actors[id].clone()
    }

    /// Removes an actor from the world. Handles to it stop being alive.
    /// Returns `false` if there was no such actor.
    pub fn destroy(&self, id: ActorId) -> bool {
        match self.actors.write().remove(id) {
            Some(actor) => {
                actor.alive.store(false, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Gets the actor with the given ID.
    pub fn get(&self, id: ActorId) -> Option<Arc<SimActor>> {
        self.actors.read().get(id).cloned()
    }

    /// The number of actors in the world.
    pub fn len(&self) -> usize {
        self.actors.read().len()
    }

    /// Whether the world has no actors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl World for SimWorld {
    fn list_actors(&self, kind: ActorKind) -> Vec<Actor> {
        self.actors
            .read()
            .values()
            .filter(|actor| actor.kind == kind)
            .map(|actor| actor.clone() as Actor)
            .collect()
    }
}

impl SimActor {
    /// The kind of actor.
    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    /// Moves the actor.
    pub fn set_state(&self, state: ActorState) {
        *self.state.write() = state;
    }
}

impl ActorHandle for SimActor {
    fn id(&self) -> ActorId {
        self.id
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn state(&self) -> Result<ActorState, ActorError> {
        if self.is_alive() {
            Ok(*self.state.read())
        } else {
            Err(ActorError::Destroyed(self.id))
        }
    }
}
