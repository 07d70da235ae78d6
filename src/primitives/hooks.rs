//! Hook primitives - `use_state`, `use_effect` and the cell access they are
//! built on.
//!
//! Hooks are free functions. They find the runtime whose pass is executing
//! and the component body currently running, then read the cell under that
//! body's cursor. Call them unconditionally and in the same order on every
//! render; a changed order surfaces as [`RenderError::HookMismatch`].
//!
//! ```ignore
//! let timer = Component::new("Timer", |props| {
//!     let (ticks, set_ticks) = use_state(0_u32)?;
//!     use_effect(
//!         move || {
//!             set_ticks.update(|t| t + 1);
//!             Some(Box::new(|| { /* stop */ }) as Cleanup)
//!         },
//!         Some(vec![]),
//!     )?;
//!     Ok(ticks.into())
//! });
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use super::equals::shallow_equals;
use crate::engine::{Cleanup, EffectCell, HookCell, Path};
use crate::error::RenderError;
use crate::pipeline::{PendingEffect, RuntimeInner, active_runtime};
use crate::types::Value;

// =============================================================================
// Cell access
// =============================================================================

/// Path of the component body currently executing.
pub fn current_path() -> Result<Path, RenderError> {
    owner("current_path").map(|(_, path)| path)
}

fn owner(hook: &'static str) -> Result<(Rc<RuntimeInner>, Path), RenderError> {
    let rt = active_runtime(hook)?;
    let path = rt
        .hooks
        .borrow()
        .current_path()
        .cloned()
        .ok_or(RenderError::HookOutsideComponent { hook })?;
    Ok((rt, path))
}

/// Handle to one value cell of a mounted component.
///
/// Outlives the render that created it. Once the owning path is unmounted
/// every access is a no-op returning `None`, even if a component later mounts
/// at the same path.
pub struct CellRef<T> {
    rt: Weak<RuntimeInner>,
    path: Path,
    index: usize,
    generation: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for CellRef<T> {
    fn clone(&self) -> Self {
        Self {
            rt: self.rt.clone(),
            path: self.path.clone(),
            index: self.index,
            generation: self.generation,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CellRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellRef")
            .field("path", &self.path)
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T> PartialEq for CellRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rt.ptr_eq(&other.rt)
            && self.path == other.path
            && self.index == other.index
            && self.generation == other.generation
    }
}

impl<T: 'static> CellRef<T> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Still backed by a mounted cell?
    pub fn is_live(&self) -> bool {
        self.with(|_| ()).is_some()
    }

    /// Run `f` on the cell value.
    ///
    /// The hooks store stays borrowed while `f` runs, so `f` must not call
    /// hooks or setters.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let rt = self.rt.upgrade()?;
        let mut hooks = rt.hooks.borrow_mut();
        let result = match hooks.cell_mut(&self.path, self.index, self.generation) {
            Some(HookCell::Value(value)) => value.downcast_mut::<T>().map(f),
            _ => None,
        };
        result
    }

    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.with(|value| value.clone())
    }

    /// Setter writes recorded on the owning slot, if still mounted.
    pub(crate) fn revision(&self) -> Option<u64> {
        let rt = self.rt.upgrade()?;
        let hooks = rt.hooks.borrow();
        hooks
            .slot(&self.path)
            .filter(|slot| slot.generation() == self.generation)
            .map(|slot| slot.revision())
    }

    /// Arm the owning runtime's scheduler, if the cell is still mounted.
    pub fn schedule_render(&self) -> bool {
        match self.rt.upgrade() {
            Some(rt) if self.is_live() => RuntimeInner::schedule_render(&rt),
            _ => false,
        }
    }
}

/// Claim the next value cell of the running component, seeding it with
/// `init()` on first occupation.
///
/// This is the primitive derived hooks build on. `init` runs at most once
/// per mount.
pub fn use_cell<T: 'static>(init: impl FnOnce() -> T) -> Result<CellRef<T>, RenderError> {
    use_cell_named("use_cell", init)
}

pub(super) fn use_cell_named<T: 'static>(
    hook: &'static str,
    init: impl FnOnce() -> T,
) -> Result<CellRef<T>, RenderError> {
    let (rt, path) = owner(hook)?;

    let (index, generation, occupied) = {
        let mut hooks = rt.hooks.borrow_mut();
        let index = hooks.advance(&path);
        let slot = hooks.slot_mut(&path);
        let occupied = match slot.cells().get(index) {
            Some(HookCell::Value(value)) if value.is::<T>() => true,
            Some(HookCell::Value(_)) => return Err(mismatch(hook, &path, index, "differently typed state")),
            Some(other) => return Err(mismatch(hook, &path, index, other.kind())),
            None => false,
        };
        (index, slot.generation(), occupied)
    };

    if !occupied {
        // Seed outside the borrow: `init` is caller code
        let value: Box<dyn Any> = Box::new(init());
        let mut hooks = rt.hooks.borrow_mut();
        let pushed = hooks.slot_mut(&path).push(HookCell::Value(value));
        if pushed != index {
            return Err(mismatch(hook, &path, index, "missing"));
        }
        trace!(path = %path, index, "seeded state cell");
    }

    Ok(CellRef {
        rt: Rc::downgrade(&rt),
        path,
        index,
        generation,
        _marker: PhantomData,
    })
}

fn mismatch(hook: &'static str, path: &Path, index: usize, found: &'static str) -> RenderError {
    RenderError::HookMismatch {
        hook,
        path: path.clone(),
        index,
        found,
    }
}

// =============================================================================
// use_state
// =============================================================================

/// Setter returned by [`use_state`].
///
/// Writes only when the candidate differs from the stored value, and only
/// then arms the scheduler. After the owner unmounts it does nothing.
pub struct Setter<T> {
    cell: CellRef<T>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> PartialEq for Setter<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Setter").field(&self.cell).finish()
    }
}

impl<T: Clone + PartialEq + 'static> Setter<T> {
    /// Store `next`. Returns whether a write happened.
    pub fn set(&self, next: T) -> bool {
        let written = self.cell.with(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        match written {
            Some(true) => {
                if let Some(rt) = self.cell.rt.upgrade() {
                    rt.hooks.borrow_mut().touch(&self.cell.path, self.cell.generation);
                    RuntimeInner::schedule_render(&rt);
                }
                true
            }
            Some(false) => false,
            None => {
                warn!(path = %self.cell.path, index = self.cell.index, "state set after unmount ignored");
                false
            }
        }
    }

    /// Compute the next value from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        match self.cell.get() {
            Some(current) => self.set(f(&current)),
            None => {
                warn!(path = %self.cell.path, index = self.cell.index, "state update after unmount ignored");
                false
            }
        }
    }

    /// Underlying cell.
    pub fn cell(&self) -> &CellRef<T> {
        &self.cell
    }
}

/// Component-local state seeded with `initial`.
///
/// Equality is `PartialEq` on `T`: wrap values in `Rc` and compare with
/// `Rc::ptr_eq` in a newtype for identity semantics.
pub fn use_state<T: Clone + PartialEq + 'static>(initial: T) -> Result<(T, Setter<T>), RenderError> {
    use_state_named("use_state", || initial)
}

/// Like [`use_state`], with the initial value produced lazily on first
/// occupation.
pub fn use_state_with<T: Clone + PartialEq + 'static>(
    init: impl FnOnce() -> T,
) -> Result<(T, Setter<T>), RenderError> {
    use_state_named("use_state_with", init)
}

fn use_state_named<T: Clone + PartialEq + 'static>(
    hook: &'static str,
    init: impl FnOnce() -> T,
) -> Result<(T, Setter<T>), RenderError> {
    let cell = use_cell_named(hook, init)?;
    let value = cell
        .get()
        .ok_or_else(|| mismatch(hook, &cell.path, cell.index, "missing"))?;
    Ok((value, Setter { cell }))
}

// =============================================================================
// use_effect
// =============================================================================

/// Defer `effect` until after the current pass has mutated the document.
///
/// `deps == None` re-runs on every render; otherwise the effect runs on
/// mount and whenever `deps` is not entry-wise identical to the previous
/// render's. The previous run's cleanup runs right before the next run and
/// when the component unmounts.
pub fn use_effect(
    effect: impl FnOnce() -> Option<Cleanup> + 'static,
    deps: Option<Vec<Value>>,
) -> Result<(), RenderError> {
    const HOOK: &str = "use_effect";
    let (rt, path) = owner(HOOK)?;
    let deps: Option<Rc<[Value]>> = deps.map(Into::into);

    let (index, generation, run) = {
        let mut hooks = rt.hooks.borrow_mut();
        let index = hooks.advance(&path);
        let slot = hooks.slot_mut(&path);
        let generation = slot.generation();
        let run = match slot.cell_mut(index) {
            Some(HookCell::Effect(cell)) => {
                let changed = match (&cell.deps, &deps) {
                    (Some(prev), Some(next)) => !shallow_equals(prev, next),
                    _ => true,
                };
                if changed {
                    cell.deps = deps;
                }
                changed
            }
            Some(other) => return Err(mismatch(HOOK, &path, index, other.kind())),
            None => {
                let pushed = slot.push(HookCell::Effect(EffectCell {
                    deps,
                    cleanup: None,
                }));
                if pushed != index {
                    return Err(mismatch(HOOK, &path, index, "missing"));
                }
                true
            }
        };
        (index, generation, run)
    };

    if run {
        trace!(path = %path, index, "effect queued");
        rt.effects.borrow_mut().push(PendingEffect {
            path,
            index,
            generation,
            effect: Box::new(effect),
        });
    }
    Ok(())
}
