// glutess: polygon tessellation with the GLU tessellator's interface
// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)

//! Polygon tessellation in the style of the GLU tessellator.
//!
//! Contours may self-intersect, overlap, and nest; interior regions are
//! chosen with a winding rule and reported as triangle fans, strips and
//! lists (or as boundary loops) through callbacks on [`Tessellator`].

pub mod bucketalloc;
pub mod dict;
pub mod error;
pub mod geom;
pub mod mesh;
pub mod priorityq;
pub mod sweep;
pub mod tess;

pub use error::TessError;
pub use geom::Real;
pub use tess::render::PrimitiveSink;
pub use tess::{
    PrimitiveKind, TessConfig, TessProperty, Tessellator, WindingRule, GLU_TESS_AVOID_DEGENERATE_TRIANGLES,
    GLU_TESS_BOUNDARY_ONLY, GLU_TESS_TOLERANCE, GLU_TESS_WINDING_ABS_GEQ_TWO, GLU_TESS_WINDING_NEGATIVE,
    GLU_TESS_WINDING_NONZERO, GLU_TESS_WINDING_ODD, GLU_TESS_WINDING_POSITIVE, GLU_TESS_WINDING_RULE,
    GL_LINE_LOOP, GL_TRIANGLES, GL_TRIANGLE_FAN, GL_TRIANGLE_STRIP, MAX_CACHE, MAX_COORD,
};
