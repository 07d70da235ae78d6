//! Renderer - The live DOM and the projection of props onto it.
//!
//! - Document: in-memory node arena, attributes, styles, listeners
//! - Props: apply / patch of declared props on live elements

mod document;
mod props;

pub use document::*;
pub use props::*;
