//! Hooks Store - Per-path hook cells.
//!
//! Each component path owns an ordered list of cells. A component body reads
//! its cells through a cursor that starts at 0 every time the body runs and
//! advances once per hook call, so the n-th hook call always lands on the
//! n-th cell.
//!
//! Reclamation is reachability-based: a path that was not visited during the
//! last pass is treated as unmounted, its effect cleanups are handed back to
//! the caller and its cells are dropped.
//!
//! Every slot carries a mount generation. Setters and queued effects capture
//! it, so a handle that outlives its component cannot write into a slot that
//! was later re-created at the same path.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use tracing::debug;

use super::path::Path;
use crate::types::Value;

/// Cleanup returned by an effect.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Cells
// =============================================================================

/// Stored state of one `use_effect` call.
#[derive(Default)]
pub struct EffectCell {
    /// Dependencies seen on the last render. `None` means "always re-run".
    pub deps: Option<Rc<[Value]>>,
    /// Cleanup returned by the last run of the effect.
    pub cleanup: Option<Cleanup>,
}

/// One slot of per-component state.
pub enum HookCell {
    Value(Box<dyn Any>),
    Effect(EffectCell),
}

impl HookCell {
    /// Name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            HookCell::Value(_) => "state",
            HookCell::Effect(_) => "effect",
        }
    }
}

/// All cells of one mounted path.
pub struct HookSlot {
    generation: u64,
    revision: u64,
    cells: Vec<HookCell>,
}

impl HookSlot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of state writes made through setters since the slot was created.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn cells(&self) -> &[HookCell] {
        &self.cells
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut HookCell> {
        self.cells.get_mut(index)
    }

    /// Append a cell. Cell count only grows while the path stays mounted.
    pub fn push(&mut self, cell: HookCell) -> usize {
        self.cells.push(cell);
        self.cells.len() - 1
    }
}

// =============================================================================
// Store
// =============================================================================

/// Path-indexed hook storage plus the per-pass bookkeeping.
#[derive(Default)]
pub struct HooksStore {
    slots: BTreeMap<Path, HookSlot>,
    cursor: HashMap<Path, usize>,
    visited: HashSet<Path>,
    stack: Vec<Path>,
    next_generation: u64,
}

impl HooksStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Component stack
    // -------------------------------------------------------------------------

    /// Enter a component body. The cursor for `path` restarts at 0.
    pub fn enter(&mut self, path: Path) {
        self.cursor.insert(path.clone(), 0);
        self.stack.push(path);
    }

    /// Leave the current component body.
    pub fn exit(&mut self) -> Option<Path> {
        self.stack.pop()
    }

    /// Path of the component body currently executing.
    pub fn current_path(&self) -> Option<&Path> {
        self.stack.last()
    }

    // -------------------------------------------------------------------------
    // Cursor
    // -------------------------------------------------------------------------

    /// Current cursor of `path` (0 if unset).
    pub fn cursor(&self, path: &Path) -> usize {
        self.cursor.get(path).copied().unwrap_or(0)
    }

    /// Return the current cursor of `path` and advance it.
    pub fn advance(&mut self, path: &Path) -> usize {
        let entry = self.cursor.entry(path.clone()).or_insert(0);
        let index = *entry;
        *entry += 1;
        index
    }

    // -------------------------------------------------------------------------
    // Slots
    // -------------------------------------------------------------------------

    /// Slot for `path`, created with a fresh generation on first use.
    pub fn slot_mut(&mut self, path: &Path) -> &mut HookSlot {
        let next_generation = &mut self.next_generation;
        self.slots.entry(path.clone()).or_insert_with(|| {
            *next_generation += 1;
            HookSlot {
                generation: *next_generation,
                revision: 0,
                cells: Vec::new(),
            }
        })
    }

    pub fn slot(&self, path: &Path) -> Option<&HookSlot> {
        self.slots.get(path)
    }

    /// Cell at `index` of `path`, but only if the slot is still the one
    /// created under `generation`.
    pub fn cell_mut(&mut self, path: &Path, index: usize, generation: u64) -> Option<&mut HookCell> {
        self.slots
            .get_mut(path)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.cells.get_mut(index))
    }

    /// Record a state write on `path`. Ignored if the slot was re-created.
    pub fn touch(&mut self, path: &Path, generation: u64) {
        if let Some(slot) = self.slots.get_mut(path).filter(|slot| slot.generation == generation) {
            slot.revision += 1;
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.slots.keys()
    }

    pub fn cell_count(&self, path: &Path) -> Option<usize> {
        self.slots.get(path).map(|slot| slot.cells.len())
    }

    // -------------------------------------------------------------------------
    // Pass lifecycle
    // -------------------------------------------------------------------------

    /// Forget the previous pass's visited set and cursors.
    pub fn begin_pass(&mut self) {
        self.visited.clear();
        self.cursor.clear();
    }

    pub fn mark_visited(&mut self, path: Path) {
        self.visited.insert(path);
    }

    pub fn is_visited(&self, path: &Path) -> bool {
        self.visited.contains(path)
    }

    /// Drop every slot whose path was not visited this pass.
    ///
    /// Returns the effect cleanups of the dropped slots, in path order, so the
    /// caller can run them once the store is no longer borrowed.
    pub fn reclaim(&mut self) -> Vec<Cleanup> {
        let unvisited: Vec<Path> = self
            .slots
            .keys()
            .filter(|path| !self.visited.contains(*path))
            .cloned()
            .collect();

        let mut cleanups = Vec::new();
        for path in unvisited {
            let Some(slot) = self.slots.remove(&path) else { continue };
            self.cursor.remove(&path);
            debug!(path = %path, cells = slot.cells.len(), "reclaiming hook slot");
            for cell in slot.cells {
                if let HookCell::Effect(EffectCell { cleanup: Some(cleanup), .. }) = cell {
                    cleanups.push(cleanup);
                }
            }
        }
        cleanups
    }

    /// Reset everything (used when a root is reconfigured).
    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor.clear();
        self.visited.clear();
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_cursor_restarts_on_enter() {
        let mut store = HooksStore::new();
        let path = Path::from("/Counter/idx:0");

        store.enter(path.clone());
        assert_eq!(store.current_path(), Some(&path));
        assert_eq!(store.advance(&path), 0);
        assert_eq!(store.advance(&path), 1);
        assert_eq!(store.cursor(&path), 2);
        store.exit();
        assert_eq!(store.current_path(), None);

        store.enter(path.clone());
        assert_eq!(store.advance(&path), 0);
    }

    #[test]
    fn test_nested_component_stack() {
        let mut store = HooksStore::new();
        let outer = Path::from("/Outer/idx:0");
        let inner = Path::from("/Outer/idx:0/Inner/idx:0");

        store.enter(outer.clone());
        store.enter(inner.clone());
        assert_eq!(store.current_path(), Some(&inner));
        store.exit();
        assert_eq!(store.current_path(), Some(&outer));
    }

    #[test]
    fn test_reclaim_unvisited() {
        let mut store = HooksStore::new();
        let kept = Path::from("/A/idx:0");
        let dropped = Path::from("/B/idx:0");

        let ran = Rc::new(Cell::new(0));
        let ran_clone = ran.clone();

        store.slot_mut(&kept).push(HookCell::Value(Box::new(1_i32)));
        store.slot_mut(&dropped).push(HookCell::Value(Box::new(2_i32)));
        store.slot_mut(&dropped).push(HookCell::Effect(EffectCell {
            deps: None,
            cleanup: Some(Box::new(move || ran_clone.set(ran_clone.get() + 1))),
        }));

        store.begin_pass();
        store.mark_visited(kept.clone());
        let cleanups = store.reclaim();
        assert_eq!(cleanups.len(), 1);
        for cleanup in cleanups {
            cleanup();
        }

        assert_eq!(ran.get(), 1);
        assert_eq!(store.cell_count(&kept), Some(1));
        assert_eq!(store.cell_count(&dropped), None);
    }

    #[test]
    fn test_generation_guards_stale_cells() {
        let mut store = HooksStore::new();
        let path = Path::from("/A/idx:0");

        store.slot_mut(&path).push(HookCell::Value(Box::new(1_i32)));
        let generation = store.slot(&path).map(HookSlot::generation).unwrap_or_default();
        assert!(store.cell_mut(&path, 0, generation).is_some());

        // Unmount, then mount again at the same path
        store.begin_pass();
        assert!(store.reclaim().is_empty());
        store.slot_mut(&path).push(HookCell::Value(Box::new(2_i32)));

        assert!(store.cell_mut(&path, 0, generation).is_none());
    }

    #[test]
    fn test_touch_bumps_revision_of_live_slot_only() {
        let mut store = HooksStore::new();
        let path = Path::from("/A/idx:0");

        let generation = store.slot_mut(&path).generation();
        store.touch(&path, generation);
        store.touch(&path, generation + 1);
        assert_eq!(store.slot(&path).map(HookSlot::revision), Some(1));
    }
}
