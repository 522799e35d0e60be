//! Time and frame scheduling seams.
//!
//! All times are milliseconds on a monotonic clock (`performance.now()` in the
//! browser). Nothing in the core reads the clock or schedules frames directly;
//! hosts inject a [`Clock`] and a [`FrameRequester`].

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

/// Milliseconds on a monotonic clock.
pub type Millis = f64;

pub trait Clock {
    fn now(&self) -> Millis;
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        ManualClock {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, t: Millis) {
        self.now.set(t);
    }

    pub fn advance(&self, dt: Millis) {
        self.now.set(self.now.get() + dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}

/// Handle for one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// "Call me back on the next rendering frame" primitive.
pub trait FrameRequester {
    fn request_frame(&mut self) -> FrameId;
    fn cancel_frame(&mut self, id: FrameId);
}

#[derive(Debug, Default)]
struct FrameQueueState {
    next: u64,
    pending: BTreeSet<FrameId>,
}

/// Frame requester backed by a shared queue the host drains once per frame.
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    state: Rc<RefCell<FrameQueueState>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every frame requested so far, oldest first.
    pub fn take_due(&self) -> Vec<FrameId> {
        let mut state = self.state.borrow_mut();
        std::mem::take(&mut state.pending).into_iter().collect()
    }

    pub fn pending_len(&self) -> usize {
        self.state.borrow().pending.len()
    }
}

impl FrameRequester for FrameQueue {
    fn request_frame(&mut self) -> FrameId {
        let mut state = self.state.borrow_mut();
        state.next += 1;
        let id = FrameId(state.next);
        state.pending.insert(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.state.borrow_mut().pending.remove(&id);
    }
}

/// Format a duration as `m:ss.d`. Negative input clamps to zero.
pub fn format_clock(ms: Millis) -> String {
    let total_sec = ms.max(0.0) / 1000.0;
    let m = (total_sec / 60.0).floor() as u64;
    let s = (total_sec % 60.0).floor() as u64;
    let d = ((total_sec % 1.0) * 10.0).floor() as u64;
    format!("{}:{:02}.{}", m, s, d)
}

/// Format a duration as seconds with one decimal, e.g. `3.4s`.
pub fn format_seconds(ms: Millis) -> String {
    format!("{:.1}s", ms / 1000.0)
}
