// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Triangulation of the monotone faces left by the sweep, and the winding
// reset used for boundary extraction.

use super::{sym, FaceIdx, Mesh, E_HEAD, F_HEAD};
use crate::error::TessError;
use crate::geom::{edge_sign, vert_leq};

impl Mesh {
    /// Triangulate one monotone face.
    ///
    /// The face is walked as an upper and a lower chain meeting at the
    /// leftmost and rightmost vertices. Triangles are cut off whichever chain
    /// is further left; the remainder becomes a fan from the leftmost vertex.
    ///
    /// With `avoid_degenerate` set, an ear whose three vertices are collinear
    /// is left for later unless the chain cannot advance without it.
    pub fn tessellate_mono_region(
        &mut self,
        face: FaceIdx,
        avoid_degenerate: bool,
    ) -> Result<(), TessError> {
        let mut up = self.faces[face as usize].an_edge;
        if self.lnext(up) == up || self.lnext(self.lnext(up)) == up {
            return Err(TessError::Internal("monotone face with fewer than three edges"));
        }

        // Find the rightmost vertex: back up while edges go left, then move
        // forward while they go right.
        while vert_leq(self.dst_st(up), self.org_st(up)) {
            up = self.lprev(up);
        }
        while vert_leq(self.org_st(up), self.dst_st(up)) {
            up = self.lnext(up);
        }
        let mut lo = self.lprev(up);

        while self.lnext(up) != lo {
            if vert_leq(self.dst_st(up), self.org_st(lo)) {
                // up.dst is further left; cut triangles from lo.org.
                while self.lnext(lo) != up {
                    let next = self.lnext(lo);
                    let cut = self.edge_goes_left(next) || {
                        let sign = edge_sign(self.org_st(lo), self.dst_st(lo), self.dst_st(next));
                        if avoid_degenerate {
                            sign < 0.0
                        } else {
                            sign <= 0.0
                        }
                    };
                    if !cut {
                        break;
                    }
                    lo = sym(self.connect(next, lo)?);
                }
                lo = self.lprev(lo);
            } else {
                // lo.org is further left; cut CCW triangles from up.dst.
                while self.lnext(lo) != up {
                    let prev = self.lprev(up);
                    let cut = self.edge_goes_right(prev) || {
                        let sign = edge_sign(self.dst_st(up), self.org_st(up), self.org_st(prev));
                        if avoid_degenerate {
                            sign > 0.0
                        } else {
                            sign >= 0.0
                        }
                    };
                    if !cut {
                        break;
                    }
                    up = sym(self.connect(up, prev)?);
                }
                up = self.lnext(up);
            }
        }

        if self.lnext(lo) == up {
            return Err(TessError::Internal("monotone chains collapsed"));
        }
        while self.lnext(self.lnext(lo)) != up {
            lo = sym(self.connect(self.lnext(lo), lo)?);
        }
        Ok(())
    }

    /// Triangulate every face marked inside. Faces created while splitting
    /// are inserted before the face being split, so the walk never revisits
    /// them.
    pub fn tessellate_interior(&mut self, avoid_degenerate: bool) -> Result<(), TessError> {
        let mut f = self.faces[F_HEAD as usize].next;
        while f != F_HEAD {
            let next = self.faces[f as usize].next;
            if self.faces[f as usize].inside {
                self.tessellate_mono_region(f, avoid_degenerate)?;
            }
            f = next;
        }
        Ok(())
    }

    /// Give every edge separating an inside face from an outside one the
    /// winding `value` (positive with the inside on its left). Other edges get
    /// winding 0, or are deleted when `keep_only_boundary` is set.
    pub fn set_winding_number(
        &mut self,
        value: i32,
        keep_only_boundary: bool,
    ) -> Result<(), TessError> {
        let mut e = self.edges[E_HEAD as usize].next;
        while e != E_HEAD {
            let e_next = self.edges[e as usize].next;
            let left_inside = self.faces[self.lface(e) as usize].inside;
            let right_inside = self.faces[self.rface(e) as usize].inside;
            if left_inside != right_inside {
                self.edges[e as usize].winding = if left_inside { value } else { -value };
            } else if !keep_only_boundary {
                self.edges[e as usize].winding = 0;
            } else {
                self.delete_edge(e)?;
            }
            e = e_next;
        }
        Ok(())
    }
}
