//! Frame transport collaborators
//!
//! The pipeline itself neither subscribes nor publishes; it is handed a
//! [`FrameSource`] and a [`FrameSink`] by whatever owns the sensor
//! connection. The in-process [`latest_frame_channel`] implements both
//! ends with a buffer depth of one: a frame that arrives while the
//! previous one is still unconsumed displaces it, so the pipeline always
//! works on the freshest frame and never builds a backlog.

use crate::pipeline::FrameResult;
use cloudsift_core::PointCloud;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// Push-style provider of point-cloud frames
pub trait FrameSource<P> {
    /// Blocks for the next frame; `None` means the stream has ended.
    fn next_frame(&mut self) -> Option<PointCloud<P>>;
}

/// Consumer of per-frame pipeline results
pub trait FrameSink<P> {
    fn publish(&mut self, result: FrameResult<P>);
}

struct Slot<T> {
    value: Mutex<SlotState<T>>,
    available: Condvar,
    senders: AtomicUsize,
}

struct SlotState<T> {
    pending: Option<T>,
    closed: bool,
}

/// Sending half of a depth-1 frame channel
pub struct FrameSender<T> {
    slot: Arc<Slot<T>>,
}

/// Receiving half of a depth-1 frame channel
pub struct FrameReceiver<T> {
    slot: Arc<Slot<T>>,
}

/// Create an in-process frame channel with a buffer depth of one
///
/// `send` never blocks: if the receiver has not yet taken the previous
/// value, the new one replaces it and the older frame is dropped. `recv`
/// blocks until a value is available or every sender is gone.
pub fn latest_frame_channel<T>() -> (FrameSender<T>, FrameReceiver<T>) {
    let slot = Arc::new(Slot {
        value: Mutex::new(SlotState {
            pending: None,
            closed: false,
        }),
        available: Condvar::new(),
        senders: AtomicUsize::new(1),
    });

    (
        FrameSender { slot: slot.clone() },
        FrameReceiver { slot },
    )
}

impl<T> FrameSender<T> {
    /// Deposit a value, displacing any undelivered previous one
    ///
    /// Returns the displaced value, if there was one.
    pub fn send(&self, value: T) -> Option<T> {
        let mut state = self.slot.value.lock().expect("frame slot poisoned");
        let displaced = state.pending.replace(value);
        drop(state);
        self.slot.available.notify_one();
        displaced
    }
}

impl<T> Clone for FrameSender<T> {
    fn clone(&self) -> Self {
        self.slot.senders.fetch_add(1, Ordering::Relaxed);
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> Drop for FrameSender<T> {
    fn drop(&mut self) {
        // Last sender going away ends the stream.
        if self.slot.senders.fetch_sub(1, Ordering::AcqRel) == 1 {
            let mut state = self.slot.value.lock().expect("frame slot poisoned");
            state.closed = true;
            drop(state);
            self.slot.available.notify_all();
        }
    }
}

impl<T> FrameReceiver<T> {
    /// Block until a value arrives; `None` once all senders are gone
    /// and nothing is pending
    pub fn recv(&self) -> Option<T> {
        let mut state = self.slot.value.lock().expect("frame slot poisoned");
        loop {
            if let Some(value) = state.pending.take() {
                return Some(value);
            }
            if state.closed {
                return None;
            }
            state = self
                .slot
                .available
                .wait(state)
                .expect("frame slot poisoned");
        }
    }

    /// Take the pending value without blocking
    pub fn try_recv(&self) -> Option<T> {
        self.slot
            .value
            .lock()
            .expect("frame slot poisoned")
            .pending
            .take()
    }
}

impl<P> FrameSource<P> for FrameReceiver<PointCloud<P>> {
    fn next_frame(&mut self) -> Option<PointCloud<P>> {
        self.recv()
    }
}

impl<P> FrameSink<P> for FrameSender<FrameResult<P>> {
    fn publish(&mut self, result: FrameResult<P>) {
        self.send(result);
    }
}

/// Source that drains a pre-recorded sequence of frames
///
/// Handy for demos and tests that replay captured data through
/// [`crate::Pipeline::run`].
pub struct VecFrameSource<P> {
    frames: std::vec::IntoIter<PointCloud<P>>,
}

impl<P> VecFrameSource<P> {
    pub fn new(frames: Vec<PointCloud<P>>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl<P> FrameSource<P> for VecFrameSource<P> {
    fn next_frame(&mut self) -> Option<PointCloud<P>> {
        self.frames.next()
    }
}

/// Sink that collects every published result
pub struct VecFrameSink<P> {
    pub results: Vec<FrameResult<P>>,
}

impl<P> VecFrameSink<P> {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

impl<P> Default for VecFrameSink<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> FrameSink<P> for VecFrameSink<P> {
    fn publish(&mut self, result: FrameResult<P>) {
        self.results.push(result);
    }
}
