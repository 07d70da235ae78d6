//! Primitives - What components are written with.
//!
//! - [`element`] shapes: [`Child`], [`Element`], [`VNode`], [`Component`]
//! - [`normalize`](normalize()) turns declared shapes into canonical nodes
//! - hooks: [`use_state`], [`use_effect`] and the cell access they build on
//! - derived hooks (`use_ref`, `use_memo`, `use_callback`, ...) and [`memo`](memo())
//! - equality helpers used for effect dependencies and memoization
//!
//! # Components
//!
//! A component is a named render function wrapped in a [`Component`]
//! descriptor. The descriptor's identity is its type: build it once and reuse
//! it, or every render looks like a type change and remounts.
//!
//! ```ignore
//! thread_local! {
//!     static LABEL: Component = Component::new("Label", |props| {
//!         Ok(h("span").child(props.str("text").unwrap_or_default()).into())
//!     });
//! }
//! ```

pub mod element;
mod equals;
mod hooks;
mod memo;
mod normalize;

pub use element::*;
pub use equals::*;
pub use hooks::*;
pub use memo::*;
pub use normalize::*;
