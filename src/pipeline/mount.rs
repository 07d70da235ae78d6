//! Mount API - Root controller and render pass.
//!
//! A [`Runtime`] owns one root: the container it renders into, the declared
//! root node, the materialized tree, the hooks store and the effect queue.
//! Runtimes are independent; several can share a [`Document`].
//!
//! # Example
//!
//! ```ignore
//! use hookdom::{Child, Component, Runtime, h, use_state};
//!
//! let counter = Component::new("Counter", |_| {
//!     let (count, set_count) = use_state(0)?;
//!     Ok(h("button")
//!         .on(EventKind::Click, Listener::new(move |_| set_count.update(|n| n + 1)))
//!         .child(count)
//!         .into())
//! });
//!
//! let runtime = Runtime::new();
//! let body = runtime.document().create_element("body");
//! runtime.configure(counter.element(), body)?;
//!
//! // ... a listener fires, a pass is scheduled ...
//! runtime.flush()?;
//! ```
//!
//! # Render pass
//!
//! 1. reset the visited set and cursors
//! 2. reconcile the declared root against the previous root instance
//! 3. reclaim hook slots of paths not visited, running their cleanups
//! 4. snapshot the effect queue and post every effect as its own task

use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span, error, warn};

use super::config::{RuntimeBuilder, RuntimeConfig};
use super::reconcile::Reconciler;
use super::scheduler::{MicrotaskQueue, RenderScheduler, RunSoon};
use crate::engine::{Cleanup, HookCell, HooksStore, Instance, Path};
use crate::error::RenderError;
use crate::primitives::{Child, VNode, normalize};
use crate::renderer::{Document, NodeId};

// =============================================================================
// Active runtime
// =============================================================================

thread_local! {
    /// Runtimes currently executing a pass, innermost last.
    static ACTIVE: RefCell<Vec<Rc<RuntimeInner>>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a runtime on the active stack for the duration of a pass.
struct ActiveGuard;

impl ActiveGuard {
    fn enter(inner: Rc<RuntimeInner>) -> Self {
        ACTIVE.with(|active| active.borrow_mut().push(inner));
        ActiveGuard
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.borrow_mut().pop());
    }
}

/// Runtime whose pass is currently executing.
pub(crate) fn active_runtime(hook: &'static str) -> Result<Rc<RuntimeInner>, RenderError> {
    ACTIVE
        .with(|active| active.borrow().last().cloned())
        .ok_or(RenderError::NoActiveRuntime { hook })
}

// =============================================================================
// Runtime state
// =============================================================================

/// Effect registered during a pass, waiting to be posted.
pub(crate) struct PendingEffect {
    pub(crate) path: Path,
    pub(crate) index: usize,
    pub(crate) generation: u64,
    pub(crate) effect: Box<dyn FnOnce() -> Option<Cleanup>>,
}

#[derive(Default)]
struct RootState {
    container: Option<NodeId>,
    node: Option<VNode>,
    instance: Option<Instance>,
    /// The last pass failed and the root instance was dropped.
    stale: bool,
}

pub(crate) struct RuntimeInner {
    pub(crate) document: Document,
    pub(crate) config: RuntimeConfig,
    pub(crate) hooks: RefCell<HooksStore>,
    pub(crate) effects: RefCell<Vec<PendingEffect>>,
    root: RefCell<RootState>,
    scheduler: RenderScheduler,
    queue: Option<MicrotaskQueue>,
    passes: Cell<u64>,
    last_error: RefCell<Option<RenderError>>,
}

impl RuntimeInner {
    /// Arm the scheduler. Returns whether a new pass was posted.
    pub(crate) fn schedule_render(this: &Rc<Self>) -> bool {
        let weak = Rc::downgrade(this);
        this.scheduler.schedule(move || {
            let Some(inner) = weak.upgrade() else { return };
            if let Err(err) = Self::render_pass(&inner) {
                error!(error = %err, "scheduled render pass failed");
                *inner.last_error.borrow_mut() = Some(err);
            }
        })
    }

    fn render_pass(this: &Rc<Self>) -> Result<(), RenderError> {
        let (container, node) = {
            let root = this.root.borrow();
            match root.container {
                Some(container) => (container, root.node.clone()),
                None => return Ok(()),
            }
        };

        let pass = this.passes.get() + 1;
        this.passes.set(pass);
        let _span = debug_span!("render_pass", pass).entered();

        this.hooks.borrow_mut().begin_pass();
        let previous = {
            let mut root = this.root.borrow_mut();
            if mem::take(&mut root.stale) {
                debug!("discarding output of the failed pass");
                this.document.clear_children(container);
            }
            root.instance.take()
        };

        // Cleanups of reclaimed paths also run with the runtime active, so a
        // hook called from one fails as being outside a component body
        let _active = ActiveGuard::enter(this.clone());
        let result =
            Reconciler::new(this).reconcile(container, previous, node.as_ref(), &Path::root(), None);

        // On failure partial mutations stay applied until the next pass,
        // which empties the container and mounts afresh
        if result.is_err() {
            this.root.borrow_mut().stale = true;
            this.effects.borrow_mut().clear();
        }
        this.root.borrow_mut().instance = result?;

        let cleanups = this.hooks.borrow_mut().reclaim();
        for cleanup in cleanups {
            cleanup();
        }

        let effects = mem::take(&mut *this.effects.borrow_mut());
        debug!(effects = effects.len(), "render pass complete");
        for pending in effects {
            let weak = Rc::downgrade(this);
            this.scheduler.post(Box::new(move || run_effect(&weak, pending)));
        }
        Ok(())
    }
}

/// Run one queued effect against the cell that registered it.
fn run_effect(runtime: &Weak<RuntimeInner>, pending: PendingEffect) {
    let Some(inner) = runtime.upgrade() else { return };
    let PendingEffect {
        path,
        index,
        generation,
        effect,
    } = pending;

    let previous = match inner.hooks.borrow_mut().cell_mut(&path, index, generation) {
        Some(HookCell::Effect(cell)) => cell.cleanup.take(),
        _ => {
            debug!(path = %path, index, "effect owner unmounted before it ran");
            return;
        }
    };
    if let Some(cleanup) = previous {
        cleanup();
    }

    let Some(cleanup) = effect() else { return };

    let displaced = match inner.hooks.borrow_mut().cell_mut(&path, index, generation) {
        Some(HookCell::Effect(cell)) => cell.cleanup.replace(cleanup),
        _ => {
            warn!(path = %path, index, "effect owner unmounted while it ran, cleaning up");
            Some(cleanup)
        }
    };
    if let Some(cleanup) = displaced {
        cleanup();
    }
}

// =============================================================================
// Runtime
// =============================================================================

/// Explicit runtime: one root, its hooks and its scheduler.
///
/// Cloning shares the runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Runtime with a fresh document and a private microtask queue.
    pub fn new() -> Self {
        RuntimeBuilder::new().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub(crate) fn from_parts(
        document: Document,
        run_soon: Rc<dyn RunSoon>,
        queue: Option<MicrotaskQueue>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                document,
                config,
                hooks: RefCell::new(HooksStore::new()),
                effects: RefCell::new(Vec::new()),
                root: RefCell::new(RootState::default()),
                scheduler: RenderScheduler::new(run_soon),
                queue,
                passes: Cell::new(0),
                last_error: RefCell::new(None),
            }),
        }
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    // -------------------------------------------------------------------------
    // Root controller
    // -------------------------------------------------------------------------

    /// Bind `root` to `container` and render it synchronously.
    ///
    /// Any previous root of this runtime is released, the container is
    /// emptied and hook state is reset (without running cleanups). Fails
    /// before touching the document if the container is not a live element
    /// or the root normalizes to nothing.
    pub fn configure(&self, root: impl Into<Child>, container: NodeId) -> Result<(), RenderError> {
        let doc = &self.inner.document;
        if !doc.is_element(container) {
            return Err(RenderError::MissingContainer);
        }
        let node = normalize(root.into()).ok_or(RenderError::MissingRoot)?;

        let previous = mem::take(&mut *self.inner.root.borrow_mut());
        if let Some(instance) = previous.instance {
            debug!("releasing previous root");
            for live in instance.live_nodes() {
                doc.destroy(live);
            }
        }
        doc.clear_children(container);

        *self.inner.root.borrow_mut() = RootState {
            container: Some(container),
            node: Some(node),
            instance: None,
            stale: false,
        };
        self.inner.hooks.borrow_mut().clear();
        self.inner.effects.borrow_mut().clear();
        self.inner.last_error.borrow_mut().take();

        RuntimeInner::render_pass(&self.inner)
    }

    /// Container of the configured root.
    pub fn container(&self) -> Option<NodeId> {
        self.inner.root.borrow().container
    }

    // -------------------------------------------------------------------------
    // Scheduling
    // -------------------------------------------------------------------------

    /// Arm a pass for the next microtask boundary. Returns false if one was
    /// already pending.
    pub fn schedule_render(&self) -> bool {
        RuntimeInner::schedule_render(&self.inner)
    }

    pub fn is_render_scheduled(&self) -> bool {
        self.inner.scheduler.is_armed()
    }

    /// Run a pass right now, outside the scheduler.
    pub fn render_now(&self) -> Result<(), RenderError> {
        RuntimeInner::render_pass(&self.inner)
    }

    /// Drain the private microtask queue: pending passes, then the effects
    /// they post, then anything those schedule.
    ///
    /// Returns the number of tasks run, or the error of the last failed
    /// pass. A runtime built with a host run-soon primitive has nothing to
    /// drain here.
    pub fn flush(&self) -> Result<usize, RenderError> {
        let ran = self.inner.queue.as_ref().map_or(0, MicrotaskQueue::run_until_idle);
        match self.take_error() {
            Some(err) => Err(err),
            None => Ok(ran),
        }
    }

    /// Run only the oldest queued task of the private queue.
    pub fn run_next_task(&self) -> bool {
        self.inner.queue.as_ref().is_some_and(MicrotaskQueue::run_next)
    }

    /// Tasks waiting in the private queue.
    pub fn pending_tasks(&self) -> usize {
        self.inner.queue.as_ref().map_or(0, MicrotaskQueue::len)
    }

    /// Error of the last scheduled pass that failed, if not yet taken.
    pub fn take_error(&self) -> Option<RenderError> {
        self.inner.last_error.borrow_mut().take()
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Number of passes run so far.
    pub fn pass_count(&self) -> u64 {
        self.inner.passes.get()
    }

    /// Paths that currently own hook cells.
    pub fn hook_paths(&self) -> Vec<Path> {
        self.inner.hooks.borrow().paths().cloned().collect()
    }

    /// Number of hook cells owned by `path`, if it owns any slot.
    pub fn hook_cell_count(&self, path: impl Into<Path>) -> Option<usize> {
        self.inner.hooks.borrow().cell_count(&path.into())
    }

    /// Read the materialized root.
    pub fn with_root_instance<R>(&self, read: impl FnOnce(Option<&Instance>) -> R) -> R {
        read(self.inner.root.borrow().instance.as_ref())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("container", &self.container())
            .field("passes", &self.pass_count())
            .field("scheduler", &self.inner.scheduler)
            .finish()
    }
}
