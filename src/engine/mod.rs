//! Engine - Identity and state bookkeeping.
//!
//! - Path: structural identity of a tree position
//! - Hooks: per-path hook cells, cursor and visited set
//! - Instance: the materialized tree produced by reconciliation
//!
//! # Identity
//!
//! The declared tree is rebuilt from scratch on every render, so nothing the
//! caller hands over has stable identity. Identity is derived instead:
//!
//! ```text
//! <App>                   ""                 root
//!   <div>                 ""                 rendered by App, same path
//!     <Counter/>          /Counter/idx:0     hooks live here
//!     <p/>                /p/idx:0
//!     <Counter/>          /Counter/idx:1
//!     <li key="a"/>       /li/key:a
//! ```

mod hooks;
mod instance;
mod path;

pub use hooks::*;
pub use instance::*;
pub use path::*;
