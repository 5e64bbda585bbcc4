//! The demo pipeline: one animated, vertex-colored quad.
//!
//! Geometry is generated in the vertex shader from `vertex_index`, so there are
//! no vertex buffers. The only binding is a 16-byte uniform holding the elapsed
//! time in seconds. Pipelines are resolution-independent and built once.

mod quad;

pub use quad::{
    DrawCall, PipelineBundle, QUAD_DRAW, TimeUniform, build_pipeline, source_over_blend,
};
