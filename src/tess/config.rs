// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Tessellator settings and the GLU enumerants they map to.

use crate::error::TessError;
use crate::geom::Real;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

pub const GLU_TESS_WINDING_ODD: u32 = 100130;
pub const GLU_TESS_WINDING_NONZERO: u32 = 100131;
pub const GLU_TESS_WINDING_POSITIVE: u32 = 100132;
pub const GLU_TESS_WINDING_NEGATIVE: u32 = 100133;
pub const GLU_TESS_WINDING_ABS_GEQ_TWO: u32 = 100134;

pub const GLU_TESS_WINDING_RULE: u32 = 100140;
pub const GLU_TESS_BOUNDARY_ONLY: u32 = 100141;
pub const GLU_TESS_TOLERANCE: u32 = 100142;
pub const GLU_TESS_AVOID_DEGENERATE_TRIANGLES: u32 = 100149;

pub const GL_LINE_LOOP: u32 = 0x0002;
pub const GL_TRIANGLES: u32 = 0x0004;
pub const GL_TRIANGLE_STRIP: u32 = 0x0005;
pub const GL_TRIANGLE_FAN: u32 = 0x0006;

/// Largest accepted coordinate magnitude; larger values are clamped.
pub const MAX_COORD: Real = 1.0e150;
/// Height of the two sentinel edges bounding the sweep.
pub const SENTINEL_COORD: Real = 4.0 * MAX_COORD;
/// Vertices buffered before a mesh is built.
pub const MAX_CACHE: usize = 100;

/// Which regions count as interior, given their winding number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum WindingRule {
    #[default]
    Odd,
    NonZero,
    Positive,
    Negative,
    AbsGeqTwo,
}

impl WindingRule {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            GLU_TESS_WINDING_ODD => Some(WindingRule::Odd),
            GLU_TESS_WINDING_NONZERO => Some(WindingRule::NonZero),
            GLU_TESS_WINDING_POSITIVE => Some(WindingRule::Positive),
            GLU_TESS_WINDING_NEGATIVE => Some(WindingRule::Negative),
            GLU_TESS_WINDING_ABS_GEQ_TWO => Some(WindingRule::AbsGeqTwo),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            WindingRule::Odd => GLU_TESS_WINDING_ODD,
            WindingRule::NonZero => GLU_TESS_WINDING_NONZERO,
            WindingRule::Positive => GLU_TESS_WINDING_POSITIVE,
            WindingRule::Negative => GLU_TESS_WINDING_NEGATIVE,
            WindingRule::AbsGeqTwo => GLU_TESS_WINDING_ABS_GEQ_TWO,
        }
    }

    #[inline]
    pub fn is_inside(self, n: i32) -> bool {
        match self {
            WindingRule::Odd => n & 1 != 0,
            WindingRule::NonZero => n != 0,
            WindingRule::Positive => n > 0,
            WindingRule::Negative => n < 0,
            WindingRule::AbsGeqTwo => n >= 2 || n <= -2,
        }
    }
}

/// Primitive kind passed to the begin callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum PrimitiveKind {
    Triangles,
    TriangleFan,
    TriangleStrip,
    LineLoop,
}

impl PrimitiveKind {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            GL_TRIANGLES => Some(PrimitiveKind::Triangles),
            GL_TRIANGLE_FAN => Some(PrimitiveKind::TriangleFan),
            GL_TRIANGLE_STRIP => Some(PrimitiveKind::TriangleStrip),
            GL_LINE_LOOP => Some(PrimitiveKind::LineLoop),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            PrimitiveKind::Triangles => GL_TRIANGLES,
            PrimitiveKind::TriangleFan => GL_TRIANGLE_FAN,
            PrimitiveKind::TriangleStrip => GL_TRIANGLE_STRIP,
            PrimitiveKind::LineLoop => GL_LINE_LOOP,
        }
    }
}

/// Numeric property selectors for `set_property` / `property`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TessProperty {
    WindingRule,
    BoundaryOnly,
    Tolerance,
    AvoidDegenerateTriangles,
}

impl TessProperty {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            GLU_TESS_WINDING_RULE => Some(TessProperty::WindingRule),
            GLU_TESS_BOUNDARY_ONLY => Some(TessProperty::BoundaryOnly),
            GLU_TESS_TOLERANCE => Some(TessProperty::Tolerance),
            GLU_TESS_AVOID_DEGENERATE_TRIANGLES => Some(TessProperty::AvoidDegenerateTriangles),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            TessProperty::WindingRule => GLU_TESS_WINDING_RULE,
            TessProperty::BoundaryOnly => GLU_TESS_BOUNDARY_ONLY,
            TessProperty::Tolerance => GLU_TESS_TOLERANCE,
            TessProperty::AvoidDegenerateTriangles => GLU_TESS_AVOID_DEGENERATE_TRIANGLES,
        }
    }
}

/// All the knobs of a [`Tessellator`](crate::Tessellator).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct TessConfig {
    pub winding_rule: WindingRule,
    /// Emit closed boundary loops instead of triangles.
    pub boundary_only: bool,
    /// Merge distance hint in [0, 1]. Stored and reported; vertices are only
    /// merged when they coincide exactly.
    pub tolerance: Real,
    /// Postpone zero-area ears while triangulating.
    pub avoid_degenerate_triangles: bool,
    /// Plane normal; all zeros means "compute it from the input".
    pub normal: [Real; 3],
}

impl Default for TessConfig {
    fn default() -> Self {
        TessConfig {
            winding_rule: WindingRule::Odd,
            boundary_only: false,
            tolerance: 0.0,
            avoid_degenerate_triangles: false,
            normal: [0.0; 3],
        }
    }
}

impl TessConfig {
    pub fn validate(&self) -> Result<(), TessError> {
        if !(0.0..=1.0).contains(&self.tolerance) {
            return Err(TessError::InvalidValue);
        }
        if self.normal.iter().any(|c| !c.is_finite()) {
            return Err(TessError::InvalidValue);
        }
        Ok(())
    }
}
