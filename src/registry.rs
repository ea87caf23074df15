use crate::actor::{Actor, ActorError, ActorKind, VehicleRecord};
use crate::error::StageError;
use crate::negotiation::Participant;
use crate::vicinity::VicinityIndex;
use crate::world::World;
use crate::ActorId;
use log::{debug, trace};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks which actors are managed by the pipeline, and where to find them.
pub struct Registry {
    /// Maps managed actors to their index in the current input frame.
    id_to_index: HashMap<ActorId, usize>,
    /// Vehicles in the world which are not managed by the pipeline.
    unregistered: HashMap<ActorId, Actor>,
    /// When the world was last scanned for unregistered vehicles.
    last_scan: Option<Instant>,
    /// The minimum time between scans.
    scan_interval: Duration,
}

/// An actor near a vehicle, resolved through the [Registry].
#[derive(Clone, Copy)]
pub enum Candidate<'a> {
    /// A vehicle in the current input frame.
    Managed(&'a VehicleRecord),
    /// A vehicle found by scanning the world.
    Unregistered(&'a Actor),
}

impl Registry {
    /// Creates an empty registry.
    pub fn new(scan_interval: Duration) -> Self {
        Self {
            id_to_index: HashMap::new(),
            unregistered: HashMap::new(),
            last_scan: None,
            scan_interval,
        }
    }

    /// Maps each actor in a freshly received frame to its index.
    /// Returns the IDs which were managed in the previous frame but not in this one.
    ///
    /// Fails if an actor appears more than once in the frame,
    /// in which case the registry is left unchanged.
    pub fn rebuild(&mut self, frame: &[VehicleRecord]) -> Result<Vec<ActorId>, StageError> {
        let mut id_to_index = HashMap::with_capacity(frame.len());
        for (index, record) in frame.iter().enumerate() {
            let id = record.id();
            if let Some(first) = id_to_index.insert(id, index) {
                return Err(StageError::DuplicateActor {
                    id,
                    first,
                    second: index,
                });
            }
        }

        // The pipeline has taken over these vehicles
        for id in id_to_index.keys() {
            if self.unregistered.remove(id).is_some() {
                debug!("Actor {:?} is now managed", id);
            }
        }

        let previous = std::mem::replace(&mut self.id_to_index, id_to_index);
        Ok(previous
            .into_keys()
            .filter(|id| !self.id_to_index.contains_key(id))
            .collect())
    }

    /// The number of managed actors.
    pub fn len(&self) -> usize {
        self.id_to_index.len()
    }

    /// Whether no actors are managed.
    pub fn is_empty(&self) -> bool {
        self.id_to_index.is_empty()
    }

    /// Gets the index of a managed actor in the current input frame.
    pub fn index_of(&self, id: ActorId) -> Option<usize> {
        self.id_to_index.get(&id).copied()
    }

    /// Whether the actor is managed by the pipeline.
    pub fn is_managed(&self, id: ActorId) -> bool {
        self.id_to_index.contains_key(&id)
    }

    /// Whether the actor is a known unregistered vehicle.
    pub fn is_unregistered(&self, id: ActorId) -> bool {
        self.unregistered.contains_key(&id)
    }

    /// Returns an iterator over the known unregistered vehicles.
    pub fn iter_unregistered(&self) -> impl Iterator<Item = &Actor> {
        self.unregistered.values()
    }

    /// Finds the actor with the given ID.
    ///
    /// # Parameters
    /// * `id` - The actor's ID
    /// * `frame` - The input frame the registry was last rebuilt from
    pub fn resolve<'a>(&'a self, id: ActorId, frame: &'a [VehicleRecord]) -> Option<Candidate<'a>> {
        match self.index_of(id) {
            Some(index) => frame.get(index).map(Candidate::Managed),
            None => self.unregistered.get(&id).map(Candidate::Unregistered),
        }
    }

    /// Scans the world for vehicles not managed by the pipeline, unless a scan
    /// happened within the scan interval. Returns `true` if a scan happened.
    pub fn scan_unregistered(&mut self, world: &dyn World, now: Instant) -> bool {
        let due = self
            .last_scan
            .map_or(true, |last| now.saturating_duration_since(last) > self.scan_interval);
        if !due {
            return false;
        }

        for actor in world.list_actors(ActorKind::Vehicle) {
            let id = actor.id();
            if !self.is_managed(id) && !self.is_unregistered(id) {
                trace!("Found unregistered actor {:?}", id);
                self.unregistered.insert(id, actor);
            }
        }
        self.last_scan = Some(now);
        true
    }

    /// Moves the unregistered vehicles in the vicinity index,
    /// and forgets those which no longer exist.
    pub fn refresh_unregistered(&mut self, vicinity: &mut dyn VicinityIndex) {
        let mut destroyed = vec![];
        for (id, actor) in &self.unregistered {
            let updated = actor.is_alive() && vicinity.update(actor.as_ref()).is_ok();
            if !updated {
                vicinity.erase(*id);
                destroyed.push(*id);
            }
        }
        for id in destroyed {
            debug!("Unregistered actor {:?} is gone", id);
            self.unregistered.remove(&id);
        }
    }
}

impl<'a> Candidate<'a> {
    /// Snapshots the candidate for negotiation.
    pub fn participant(&self) -> Result<Participant<'a>, ActorError> {
        Ok(match *self {
            Candidate::Managed(record) => {
                Participant::managed(record.actor.state()?, &record.buffer)
            }
            Candidate::Unregistered(actor) => Participant::unregistered(actor.state()?),
        })
    }
}
