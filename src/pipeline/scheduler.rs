//! Render Scheduler - Coalesced passes and deferred tasks.
//!
//! The runtime never blocks or spawns. Everything deferred goes through a
//! [`RunSoon`] primitive, the equivalent of posting a microtask. The host
//! decides when queued work runs; tests drive [`MicrotaskQueue`] by hand.
//!
//! # Coalescing
//!
//! ```text
//! set(1)  -> armed = true, post(pass)
//! set(2)  -> already armed, nothing posted
//! set(3)  -> already armed, nothing posted
//! ... microtask boundary ...
//! pass    -> armed = false, reconcile once
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// Deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Platform "run soon" primitive.
pub trait RunSoon {
    /// Run `task` after the current synchronous work completes, in post order.
    fn run_soon(&self, task: Task);
}

// =============================================================================
// Microtask queue
// =============================================================================

/// FIFO task queue drained explicitly by the host.
///
/// Cloning shares the queue.
#[derive(Clone, Default)]
pub struct MicrotaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run the oldest queued task. Returns false if the queue was empty.
    pub fn run_next(&self) -> bool {
        // Pop before running: the task may post more work
        let task = self.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until none are left, including ones posted while draining.
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl RunSoon for MicrotaskQueue {
    fn run_soon(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MicrotaskQueue({} pending)", self.len())
    }
}

// =============================================================================
// Render scheduler
// =============================================================================

/// Edge-triggered pass scheduler: an armed flag plus a run-soon primitive.
#[derive(Clone)]
pub struct RenderScheduler {
    armed: Rc<Cell<bool>>,
    run_soon: Rc<dyn RunSoon>,
}

impl RenderScheduler {
    pub fn new(run_soon: Rc<dyn RunSoon>) -> Self {
        Self {
            armed: Rc::new(Cell::new(false)),
            run_soon,
        }
    }

    /// A pass has been posted and has not started yet.
    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }

    /// Post `pass` unless one is already pending. Returns whether it posted.
    ///
    /// The flag drops just before `pass` runs, so a schedule call made while
    /// the pass executes arms the next one.
    pub fn schedule(&self, pass: impl FnOnce() + 'static) -> bool {
        if self.armed.replace(true) {
            trace!("render already scheduled");
            return false;
        }
        let armed = self.armed.clone();
        self.run_soon.run_soon(Box::new(move || {
            armed.set(false);
            pass();
        }));
        true
    }

    /// Post an arbitrary task through the same primitive.
    pub fn post(&self, task: Task) {
        self.run_soon.run_soon(task);
    }
}

impl fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("armed", &self.armed.get())
            .finish()
    }
}
