use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// A handle to one of the two output buffers of the collision stage.
/// Holds one hazard flag per vehicle, in input frame order.
#[derive(Clone, Debug)]
pub struct HazardFrame {
    slot: usize,
    flags: Arc<RwLock<Vec<bool>>>,
}

/// Two alternating output buffers: one is written by the stage while
/// the other is read by the next stage.
#[derive(Debug)]
pub struct FrameRing {
    slots: [HazardFrame; 2],
    writable: usize,
}

impl HazardFrame {
    fn new(slot: usize, capacity: usize) -> Self {
        Self {
            slot,
            flags: Arc::new(RwLock::new(Vec::with_capacity(capacity))),
        }
    }

    /// Which of the two buffers this is.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Locks the flags for reading. The stage cannot overwrite
    /// this buffer until the guard is dropped.
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<bool>> {
        self.flags.read()
    }

    /// Copies the flags out of the buffer.
    pub fn to_vec(&self) -> Vec<bool> {
        self.read().clone()
    }

    /// Whether both handles refer to the same buffer.
    pub fn same_buffer(&self, other: &HazardFrame) -> bool {
        Arc::ptr_eq(&self.flags, &other.flags)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Vec<bool>> {
        self.flags.write()
    }
}

impl FrameRing {
    /// Allocates both buffers.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: [HazardFrame::new(0, capacity), HazardFrame::new(1, capacity)],
            writable: 0,
        }
    }

    /// The buffer to write this tick.
    pub fn writable(&self) -> &HazardFrame {
        &self.slots[self.writable]
    }

    /// Makes the other buffer writable. Called once per tick, after the
    /// written buffer has been handed to the next stage.
    pub fn flip(&mut self) {
        self.writable = 1 - self.writable;
    }
}
