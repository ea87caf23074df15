use parking_lot::{Condvar, Mutex};

/// The state counter of a [Messenger].
pub type Version = u64;

/// Data handed between two pipeline stages, tagged with the messenger state.
#[derive(Clone, Debug)]
pub struct Packet<T> {
    pub version: Version,
    pub data: T,
}

/// A versioned handshake between a producing and a consuming pipeline stage.
///
/// Every send and every receive advances the state counter. A sender waits until
/// the counter has moved past the version its last send returned, meaning the
/// previous packet was received; a receiver waits until it has moved past the
/// version of the last packet it received.
pub struct Messenger<T> {
    inner: Mutex<Inner<T>>,
    send_cond: Condvar,
    receive_cond: Condvar,
}

struct Inner<T> {
    version: Version,
    data: Option<T>,
    stopped: bool,
}

impl<T: Clone> Messenger<T> {
    /// Creates a messenger with no data.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                version: 0,
                data: None,
                stopped: false,
            }),
            send_cond: Condvar::new(),
            receive_cond: Condvar::new(),
        }
    }

    /// The current state counter.
    /// A producer that should send first starts from one less than this.
    pub fn state(&self) -> Version {
        self.inner.lock().version
    }

    /// Publishes data once the previous packet has been received.
    /// Returns the version to pass to the next call, or `None` if stopped.
    ///
    /// # Parameters
    /// * `version` - The version returned by the previous send
    /// * `data` - The data to publish
    pub fn send(&self, version: Version, data: T) -> Option<Version> {
        let mut inner = self.inner.lock();
        while inner.version == version && !inner.stopped {
            self.send_cond.wait(&mut inner);
        }
        if inner.stopped {
            return None;
        }
        inner.data = Some(data);
        inner.version = inner.version.wrapping_add(1);
        self.receive_cond.notify_all();
        Some(inner.version)
    }

    /// Waits for data newer than the given version.
    /// Returns `None` if stopped.
    ///
    /// # Parameters
    /// * `version` - The version of the previously received packet
    pub fn receive(&self, version: Version) -> Option<Packet<T>> {
        let mut inner = self.inner.lock();
        while (inner.version == version || inner.data.is_none()) && !inner.stopped {
            self.receive_cond.wait(&mut inner);
        }
        if inner.stopped {
            return None;
        }
        inner.version = inner.version.wrapping_add(1);
        self.send_cond.notify_all();
        Some(Packet {
            version: inner.version,
            data: inner.data.clone()?,
        })
    }

    /// Wakes all waiting stages and makes every later call return `None`.
    pub fn stop(&self) {
        self.inner.lock().stopped = true;
        self.send_cond.notify_all();
        self.receive_cond.notify_all();
    }

    /// Whether [stop](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.inner.lock().stopped
    }
}

impl<T: Clone> Default for Messenger<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn first_send_does_not_block() {
        let messenger = Messenger::new();
        let version = messenger.send(messenger.state().wrapping_sub(1), 7);
        assert_eq!(version, Some(1));

        let packet = messenger.receive(0).unwrap();
        assert_eq!(packet.data, 7);
        assert_eq!(packet.version, 2);
    }

    #[test]
    fn packets_arrive_in_order() {
        let messenger = Arc::new(Messenger::new());

        let producer = {
            let messenger = messenger.clone();
            thread::spawn(move || {
                let mut version = messenger.state().wrapping_sub(1);
                for i in 0..100 {
                    version = messenger.send(version, i).unwrap();
                }
            })
        };

        let mut version = messenger.state();
        for i in 0..100 {
            let packet = messenger.receive(version).unwrap();
            assert_eq!(packet.data, i);
            version = packet.version;
        }
        producer.join().unwrap();
    }

    #[test]
    fn stop_wakes_receiver() {
        let messenger = Arc::new(Messenger::<u32>::new());
        let receiver = {
            let messenger = messenger.clone();
            thread::spawn(move || messenger.receive(0))
        };
        messenger.stop();
        assert!(receiver.join().unwrap().is_none());
        assert!(messenger.is_stopped());
        assert!(messenger.send(5, 1).is_none());
    }
}
