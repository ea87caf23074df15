use crate::actor::VehicleRecord;
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::error::StageError;
use crate::frame::{FrameRing, HazardFrame};
use crate::messenger::{Messenger, Version};
use crate::negotiation::{negotiate, Participant};
use crate::params::{CollisionParams, StageAttributes};
use crate::registry::Registry;
use crate::vicinity::VicinityIndex;
use crate::world::World;
use crate::ActorId;
use cgmath::prelude::*;
use log::{debug, error, trace, warn};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::ops::Range;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// The managed vehicles of one tick, as produced by the localization stage.
pub type InputFrame = Arc<Vec<VehicleRecord>>;

/// The collision stage of the pipeline.
///
/// Each tick it receives an [InputFrame], flags every vehicle which must give way
/// to another actor, and hands the flags to the next stage as a [HazardFrame].
pub struct CollisionStage<V> {
    /// Delivers input frames from the localization stage.
    upstream: Arc<Messenger<InputFrame>>,
    /// Takes output frames to the motion planner stage.
    downstream: Arc<Messenger<HazardFrame>>,
    /// The version of the last received input frame.
    upstream_version: Version,
    /// The version returned by the last send.
    downstream_version: Version,
    /// The simulation client.
    world: Arc<dyn World>,
    /// Finds the actors near a vehicle.
    vicinity: V,
    /// Managed and unregistered actors.
    registry: Registry,
    /// The double-buffered output.
    frames: FrameRing,
    /// The worker pool.
    pool: ThreadPool,
    /// The range of vehicles processed by each worker.
    partitions: Partitions,
    /// The negotiation tuning.
    params: CollisionParams,
    /// The input frame being processed.
    input: InputFrame,
}

/// A handle to a collision stage running on its own thread.
pub struct StageHandle {
    thread: JoinHandle<Result<(), StageError>>,
    upstream: Arc<Messenger<InputFrame>>,
    downstream: Arc<Messenger<HazardFrame>>,
}

/// Contiguous, disjoint ranges of vehicle indices covering a frame,
/// one per worker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Partitions {
    /// The frame length the ranges were computed for.
    len: usize,
    ranges: Vec<Range<usize>>,
}

/// The read-only view of one tick shared by all workers.
struct Negotiator<'a, V> {
    registry: &'a Registry,
    vicinity: &'a V,
    frame: &'a [VehicleRecord],
    params: &'a CollisionParams,
}

impl<V: VicinityIndex> CollisionStage<V> {
    /// Creates a collision stage between two messengers.
    ///
    /// # Parameters
    /// * `attributes` - The pool size, buffer capacity and tuning
    /// * `world` - The simulation client
    /// * `vicinity` - The spatial index, owned by the stage
    /// * `upstream` - Delivers input frames from the localization stage
    /// * `downstream` - Takes output frames to the motion planner stage
    pub fn new(
        attributes: &StageAttributes,
        world: Arc<dyn World>,
        vicinity: V,
        upstream: Arc<Messenger<InputFrame>>,
        downstream: Arc<Messenger<HazardFrame>>,
    ) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(usize::max(attributes.pool_size, 1))
            .thread_name(|idx| format!("collision-worker-{idx}"))
            .build()?;

        Ok(Self {
            upstream_version: upstream.state(),
            // Sending precedes the motion planner's first receive
            downstream_version: downstream.state().wrapping_sub(1),
            upstream,
            downstream,
            world,
            vicinity,
            registry: Registry::new(attributes.params.scan_interval),
            frames: FrameRing::new(attributes.capacity),
            pool,
            partitions: Default::default(),
            params: attributes.params,
            input: Default::default(),
        })
    }

    /// The registry as of the last tick.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The spatial index.
    pub fn vicinity(&self) -> &V {
        &self.vicinity
    }

    /// The number of workers.
    pub fn pool_size(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Gets the range of vehicle indices assigned to a worker in the last tick.
    pub fn partition(&self, worker: usize) -> Result<Range<usize>, StageError> {
        self.partitions.get(worker)
    }

    /// Gets the debugging information recorded since the last call, as a JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&self) -> serde_json::Value {
        take_debug_frame()
    }

    /// Runs a single tick: receives an input frame, negotiates and sends the hazards.
    ///
    /// Returns `false` without doing anything if either messenger was stopped,
    /// or an error if the input frame breaks its contract.
    pub fn tick(&mut self) -> Result<bool, StageError> {
        let Some(packet) = self.upstream.receive(self.upstream_version) else {
            return Ok(false);
        };
        self.upstream_version = packet.version;
        self.input = packet.data;

        self.maintain(Instant::now())?;
        self.dispatch()?;

        let frame = self.frames.writable().clone();
        let Some(version) = self.downstream.send(self.downstream_version, frame) else {
            return Ok(false);
        };
        self.downstream_version = version;
        self.frames.flip();
        Ok(true)
    }

    /// Runs ticks on a new thread until the messengers are stopped
    /// or an input frame breaks its contract.
    pub fn spawn(mut self) -> std::io::Result<StageHandle>
    where
        V: 'static,
    {
        let upstream = self.upstream.clone();
        let downstream = self.downstream.clone();
        let thread = thread::Builder::new()
            .name("collision-stage".into())
            .spawn(move || loop {
                match self.tick() {
                    Ok(true) => {}
                    Ok(false) => break Ok(()),
                    Err(err) => {
                        error!("Collision stage aborted: {}", err);
                        // Wake the neighbouring stages rather than leave them waiting
                        self.upstream.stop();
                        self.downstream.stop();
                        break Err(err);
                    }
                }
            })?;

        Ok(StageHandle {
            thread,
            upstream,
            downstream,
        })
    }

    /// Brings the registry and the vicinity index up to date with the new
    /// input frame. This is the only place either is modified, and it always
    /// completes before the workers start.
    fn maintain(&mut self, now: Instant) -> Result<(), StageError> {
        for id in self.registry.rebuild(&self.input)? {
            self.vicinity.erase(id);
        }
        for record in self.input.iter() {
            if let Err(err) = self.vicinity.update(record.actor.as_ref()) {
                warn!("Could not locate managed vehicle: {}", err);
            }
        }

        if self.registry.scan_unregistered(self.world.as_ref(), now) {
            debug!(
                "Scanned for unregistered vehicles: {} known",
                self.registry.iter_unregistered().count()
            );
        }
        self.registry.refresh_unregistered(&mut self.vicinity);
        Ok(())
    }

    /// Computes the hazard flags of all vehicles in parallel, writing them
    /// to the writable output buffer.
    fn dispatch(&mut self) -> Result<(), StageError> {
        let len = self.input.len();
        if self.partitions.len != len || self.partitions.is_empty() {
            self.partitions = Partitions::new(len, self.pool.current_num_threads());
        }

        // Blocks until the next stage has finished reading this buffer
        let frame = self.frames.writable().clone();
        let mut flags = frame.write();
        flags.clear();
        flags.resize(len, false);

        let mut rest: &mut [bool] = &mut flags;
        let mut work = Vec::with_capacity(self.partitions.count());
        for worker in 0..self.partitions.count() {
            let range = self.partitions.get(worker)?;
            let (out, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            work.push((range, out));
            rest = tail;
        }

        let negotiator = Negotiator {
            registry: &self.registry,
            vicinity: &self.vicinity,
            frame: &self.input,
            params: &self.params,
        };
        self.pool.scope(|scope| {
            for (range, out) in work {
                let negotiator = &negotiator;
                scope.spawn(move |_| negotiator.process(range, out));
            }
        });

        trace!("Negotiated {} vehicles", len);
        Ok(())
    }
}

impl StageHandle {
    /// Stops both messengers, then waits for the stage to finish.
    pub fn stop(self) -> Result<(), StageError> {
        self.upstream.stop();
        self.downstream.stop();
        self.join()
    }

    /// Waits for the stage to finish.
    pub fn join(self) -> Result<(), StageError> {
        match self.thread.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl Partitions {
    /// Splits `len` indices into at most `workers` ranges of near equal size.
    fn new(len: usize, workers: usize) -> Self {
        let chunk = usize::max(len.div_ceil(workers.max(1)), 1);
        let ranges = (0..workers)
            .map(|i| usize::min(i * chunk, len)..usize::min((i + 1) * chunk, len))
            .filter(|range| !range.is_empty())
            .collect();
        Self { len, ranges }
    }

    fn count(&self) -> usize {
        self.ranges.len()
    }

    fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn get(&self, worker: usize) -> Result<Range<usize>, StageError> {
        self.ranges
            .get(worker)
            .cloned()
            .ok_or(StageError::PartitionOutOfRange {
                index: worker,
                len: self.ranges.len(),
            })
    }
}

impl<V: VicinityIndex> Negotiator<'_, V> {
    /// Computes the hazard flags of a worker's range of vehicles.
    fn process(&self, range: Range<usize>, out: &mut [bool]) {
        for (index, flag) in range.zip(out) {
            *flag = self.has_hazard(index);
        }
    }

    /// Determines whether the vehicle at the given index must give way to any actor.
    fn has_hazard(&self, index: usize) -> bool {
        let record = &self.frame[index];
        let ego = match record.actor.state() {
            Ok(state) => Participant::managed(state, &record.buffer),
            Err(err) => {
                warn!("Encountered problem while determining collision: {}", err);
                return false;
            }
        };
        let nearby = match self.vicinity.query(record.actor.as_ref()) {
            Ok(ids) => ids,
            Err(err) => {
                warn!("Encountered problem while determining collision: {}", err);
                return false;
            }
        };

        let ego_id = record.actor.id();
        nearby
            .into_iter()
            .filter(|id| *id != ego_id)
            .any(|id| self.gives_way_to(&ego, id))
    }

    /// Determines whether the ego vehicle must give way to the actor with the given ID.
    fn gives_way_to(&self, ego: &Participant, id: ActorId) -> bool {
        let Some(candidate) = self.registry.resolve(id, self.frame) else {
            debug!("Actor {:?} is not known to the registry", id);
            return false;
        };
        let other = match candidate.participant() {
            Ok(other) => other,
            Err(err) => {
                warn!("Encountered problem while determining collision: {}", err);
                return false;
            }
        };

        // Height counts towards the search radius
        let dist2 = ego.state.location.distance2(other.state.location);
        dist2 <= self.params.search_radius.powi(2) && negotiate(ego, &other, self.params)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partitions_cover_frame() {
        for (len, workers) in [(10, 4), (3, 4), (8, 4), (1, 1), (100, 7)] {
            let partitions = Partitions::new(len, workers);
            assert!(partitions.count() <= workers);
            let mut next = 0;
            for worker in 0..partitions.count() {
                let range = partitions.get(worker).unwrap();
                assert_eq!(range.start, next);
                assert!(!range.is_empty());
                next = range.end;
            }
            assert_eq!(next, len);
        }
    }

    #[test]
    fn empty_frame_has_no_partitions() {
        let partitions = Partitions::new(0, 4);
        assert!(partitions.is_empty());
        assert_eq!(
            partitions.get(0),
            Err(StageError::PartitionOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn unknown_worker_is_rejected() {
        let partitions = Partitions::new(10, 4);
        assert_eq!(partitions.get(3), Ok(9..10));
        assert_eq!(
            partitions.get(4),
            Err(StageError::PartitionOutOfRange { index: 4, len: 4 })
        );
    }
}
