use crate::ActorId;
use thiserror::Error;

/// A broken contract on the inputs of the collision stage.
/// These abort the current tick.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StageError {
    #[error("actor {id:?} appears at both index {first} and {second} of the input frame")]
    DuplicateActor {
        id: ActorId,
        first: usize,
        second: usize,
    },
    #[error("partition {index} is out of range for a pool of {len} workers")]
    PartitionOutOfRange { index: usize, len: usize },
}
