//! Render Pipeline
//!
//! ```text
//! configure / setter
//!        │
//!        ▼
//!   RenderScheduler ──run soon──▶ render pass
//!                                   │
//!                                   ├─ Reconciler (mount / replace / update / unmount)
//!                                   │     └─ Projector (props onto live elements)
//!                                   ├─ hook reclamation (unvisited paths)
//!                                   └─ effects, each posted as its own task
//! ```
//!
//! At most one pass is pending at a time. Setters called while a pass runs
//! arm the next one; nothing re-enters the pass in flight.

mod config;
mod mount;
mod reconcile;
mod scheduler;

pub use config::{DEFAULT_COMPONENT_FALLBACK, RuntimeBuilder, RuntimeConfig};
pub use mount::Runtime;
pub use scheduler::{MicrotaskQueue, RenderScheduler, RunSoon, Task};

pub(crate) use mount::{PendingEffect, RuntimeInner, active_runtime};
