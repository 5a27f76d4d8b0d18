// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Error codes reported through the tessellator's error callback.
//
// The numeric values are the GLU enumerants so that clients porting GLU
// code can keep matching on them.

use thiserror::Error;

pub const GLU_INVALID_ENUM: u32 = 100900;
pub const GLU_INVALID_VALUE: u32 = 100901;
pub const GLU_OUT_OF_MEMORY: u32 = 100902;
pub const GLU_TESS_MISSING_BEGIN_POLYGON: u32 = 100151;
pub const GLU_TESS_MISSING_BEGIN_CONTOUR: u32 = 100152;
pub const GLU_TESS_MISSING_END_POLYGON: u32 = 100153;
pub const GLU_TESS_MISSING_END_CONTOUR: u32 = 100154;
pub const GLU_TESS_COORD_TOO_LARGE: u32 = 100155;
pub const GLU_TESS_NEED_COMBINE_CALLBACK: u32 = 100156;

/// Everything the tessellator can report.
///
/// Protocol errors and `CoordTooLarge` are recoverable: the tessellator
/// repairs the call sequence (or clamps the value) and keeps going.
/// `NeedCombineCallback`, `OutOfMemory` and `Internal` abort the current
/// polygon; nothing is emitted for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TessError {
    #[error("begin_polygon was not called")]
    MissingBeginPolygon,
    #[error("begin_contour was not called")]
    MissingBeginContour,
    #[error("end_polygon was not called")]
    MissingEndPolygon,
    #[error("end_contour was not called")]
    MissingEndContour,
    #[error("vertex coordinate exceeds the maximum magnitude and was clamped")]
    CoordTooLarge,
    #[error("edges intersect but no combine callback is registered")]
    NeedCombineCallback,
    #[error("out of memory")]
    OutOfMemory,
    #[error("invalid property value")]
    InvalidValue,
    #[error("invalid property or enumerant")]
    InvalidEnum,
    /// The sweep reached a state its invariants rule out. Reported with the
    /// out-of-memory code, since GLU reports every aborted run that way.
    #[error("tessellation aborted: {0}")]
    Internal(&'static str),
}

impl TessError {
    /// The GLU enumerant for this error.
    pub fn code(self) -> u32 {
        match self {
            TessError::MissingBeginPolygon => GLU_TESS_MISSING_BEGIN_POLYGON,
            TessError::MissingBeginContour => GLU_TESS_MISSING_BEGIN_CONTOUR,
            TessError::MissingEndPolygon => GLU_TESS_MISSING_END_POLYGON,
            TessError::MissingEndContour => GLU_TESS_MISSING_END_CONTOUR,
            TessError::CoordTooLarge => GLU_TESS_COORD_TOO_LARGE,
            TessError::NeedCombineCallback => GLU_TESS_NEED_COMBINE_CALLBACK,
            TessError::OutOfMemory | TessError::Internal(_) => GLU_OUT_OF_MEMORY,
            TessError::InvalidValue => GLU_INVALID_VALUE,
            TessError::InvalidEnum => GLU_INVALID_ENUM,
        }
    }

    /// True when the error abandons the polygon being tessellated.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            TessError::NeedCombineCallback | TessError::OutOfMemory | TessError::Internal(_)
        )
    }
}

impl From<std::collections::TryReserveError> for TessError {
    fn from(_: std::collections::TryReserveError) -> Self {
        TessError::OutOfMemory
    }
}
