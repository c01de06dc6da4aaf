//! 2D rendering
//!
//! Objects draw into a [`DrawContext`], which tessellates everything into a
//! single triangle list for the WebGPU pipeline.

pub mod canvas;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use canvas::{DrawContext, Fill, TextRun};
pub use pipeline::RenderState;
pub use vertex::Vertex;
