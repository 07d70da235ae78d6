//! # hookdom
//!
//! Minimal reactive UI runtime: declarative trees rendered into a live DOM,
//! with component-local state kept across renders by structural path.
//!
//! ## Architecture
//!
//! The declared tree is rebuilt from scratch on every render and carries no
//! identity of its own. Each position gets a [`Path`] derived from its type
//! and key (or its ordinal among same-typed siblings). Paths pair old and new
//! nodes during reconciliation and own the hook cells of components.
//!
//! ```text
//! Child ──normalize──▶ VNode ──reconcile──▶ Instance tree ──▶ Document
//!                                   │
//!                             HooksStore (path → cells)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Prop values, styles, event kinds, boolean DOM properties
//! - [`engine`] - Paths, the hooks store, materialized instances
//! - [`primitives`] - Elements, normalization, hooks, memoization
//! - [`renderer`] - In-memory document and prop projection
//! - [`pipeline`] - Reconciler, scheduler, runtime
//!
//! ## Logging
//!
//! The crate emits `tracing` events (render passes, replace/unmount
//! decisions, hook reclamation, ignored setters). It never installs a
//! subscriber.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod renderer;
pub mod types;

pub use types::*;

pub use error::RenderError;

pub use engine::{Cleanup, Instance, InstanceKind, Path};

pub use primitives::{
    CellRef, Child, Component, Element, NodeKind, Props, Setter, VNode, create_element,
    current_path, deep_equals, deep_equals_list, deep_equals_props, deep_memo, fragment, h, memo,
    memo_with, normalize, normalize_children, shallow_equals, shallow_equals_props,
    use_auto_callback, use_callback, use_cell, use_deep_memo, use_effect, use_memo,
    use_memo_with, use_ref, use_state, use_state_with,
};

pub use renderer::{Document, Event, Listener, NodeId, Projector};

pub use pipeline::{MicrotaskQueue, RunSoon, Runtime, RuntimeBuilder, RuntimeConfig};
