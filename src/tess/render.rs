// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Turns the finished mesh (or the vertex cache) into primitives.
//
// Triangulated faces are grouped greedily into the largest fan or strip
// around each unvisited triangle; triangles that fit in neither are batched
// into a single `Triangles` primitive at the end. When the client wants edge
// flags, only `Triangles` are produced, since a fan or strip cannot say which
// of its edges lie on the boundary.

use log::debug;

use super::normal::{cross, dot, long_axis};
use super::{CachedVertex, PrimitiveKind, WindingRule};
use crate::geom::{vert_ccw, Real, St};
use crate::mesh::{sym, EdgeIdx, FaceIdx, Mesh, F_HEAD, INVALID};

/// Receiver of the primitives produced by rendering. `data` is the payload
/// slot of the vertex.
pub trait PrimitiveSink {
    fn begin(&mut self, kind: PrimitiveKind);
    fn edge_flag(&mut self, boundary: bool);
    fn vertex(&mut self, data: u32);
    fn end(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Group {
    Triangle,
    Fan,
    Strip,
}

#[derive(Clone, Copy, Debug)]
struct FaceGroup {
    size: usize,
    e_start: EdgeIdx,
    kind: Group,
}

struct Renderer<'m, 's> {
    mesh: &'m mut Mesh,
    sink: &'s mut dyn PrimitiveSink,
    flag_boundary: bool,
    lonely: FaceIdx,
}

impl<'m, 's> Renderer<'m, 's> {
    #[inline]
    fn marked(&self, f: FaceIdx) -> bool {
        let face = &self.mesh.faces[f as usize];
        !face.inside || face.marked
    }

    fn add_to_trail(&mut self, f: FaceIdx, trail: &mut FaceIdx) {
        let face = &mut self.mesh.faces[f as usize];
        face.trail = *trail;
        face.marked = true;
        *trail = f;
    }

    fn free_trail(&mut self, mut trail: FaceIdx) {
        while trail != INVALID {
            let face = &mut self.mesh.faces[trail as usize];
            face.marked = false;
            trail = face.trail;
        }
    }

    fn emit_org(&mut self, e: EdgeIdx) {
        let v = self.mesh.org(e);
        self.sink.vertex(self.mesh.verts[v as usize].data);
    }

    fn emit_dst(&mut self, e: EdgeIdx) {
        let v = self.mesh.dst(e);
        self.sink.vertex(self.mesh.verts[v as usize].data);
    }

    /// Largest fan around `e_orig.org` containing `e_orig.lface`.
    fn maximum_fan(&mut self, e_orig: EdgeIdx) -> FaceGroup {
        let mut trail = INVALID;
        let mut size = 0;

        let mut e = e_orig;
        while !self.marked(self.mesh.lface(e)) {
            self.add_to_trail(self.mesh.lface(e), &mut trail);
            size += 1;
            e = self.mesh.onext(e);
        }
        e = e_orig;
        while !self.marked(self.mesh.rface(e)) {
            self.add_to_trail(self.mesh.rface(e), &mut trail);
            size += 1;
            e = self.mesh.oprev(e);
        }

        self.free_trail(trail);
        FaceGroup {
            size,
            e_start: e,
            kind: Group::Fan,
        }
    }

    /// Largest strip through `e_orig.lface`, walked in both directions.
    /// The strip must start on an even triangle, so one end may be trimmed.
    fn maximum_strip(&mut self, e_orig: EdgeIdx) -> FaceGroup {
        let mut trail = INVALID;
        let mut tail_size = 0;
        let mut head_size = 0;

        let mut e = e_orig;
        while !self.marked(self.mesh.lface(e)) {
            self.add_to_trail(self.mesh.lface(e), &mut trail);
            tail_size += 1;
            e = self.mesh.dprev(e);
            if self.marked(self.mesh.lface(e)) {
                break;
            }
            self.add_to_trail(self.mesh.lface(e), &mut trail);
            tail_size += 1;
            e = self.mesh.onext(e);
        }
        let e_tail = e;

        e = e_orig;
        while !self.marked(self.mesh.rface(e)) {
            self.add_to_trail(self.mesh.rface(e), &mut trail);
            head_size += 1;
            e = self.mesh.oprev(e);
            if self.marked(self.mesh.rface(e)) {
                break;
            }
            self.add_to_trail(self.mesh.rface(e), &mut trail);
            head_size += 1;
            e = self.mesh.dnext(e);
        }
        let e_head = e;

        let mut group = FaceGroup {
            size: tail_size + head_size,
            e_start: INVALID,
            kind: Group::Strip,
        };
        if tail_size % 2 == 0 {
            group.e_start = sym(e_tail);
        } else if head_size % 2 == 0 {
            group.e_start = e_head;
        } else {
            // Both ends odd: drop a triangle from the head.
            group.size -= 1;
            group.e_start = self.mesh.onext(e_head);
        }

        self.free_trail(trail);
        group
    }

    /// Emit the largest group containing `face`.
    fn render_maximum_face_group(&mut self, face: FaceIdx) {
        let e = self.mesh.faces[face as usize].an_edge;
        let mut best = FaceGroup {
            size: 1,
            e_start: e,
            kind: Group::Triangle,
        };

        if !self.flag_boundary {
            let (lnext, lprev) = (self.mesh.lnext(e), self.mesh.lprev(e));
            for candidate in [e, lnext, lprev] {
                let group = self.maximum_fan(candidate);
                if group.size > best.size {
                    best = group;
                }
            }
            for candidate in [e, lnext, lprev] {
                let group = self.maximum_strip(candidate);
                if group.size > best.size {
                    best = group;
                }
            }
        }

        match best.kind {
            Group::Triangle => {
                let f = self.mesh.lface(best.e_start);
                let mut lonely = self.lonely;
                self.add_to_trail(f, &mut lonely);
                self.lonely = lonely;
            }
            Group::Fan => self.render_fan(best.e_start, best.size),
            Group::Strip => self.render_strip(best.e_start, best.size),
        }
    }

    fn render_fan(&mut self, mut e: EdgeIdx, mut size: usize) {
        self.sink.begin(PrimitiveKind::TriangleFan);
        self.emit_org(e);
        self.emit_dst(e);
        while !self.marked(self.mesh.lface(e)) {
            let f = self.mesh.lface(e);
            self.mesh.faces[f as usize].marked = true;
            size -= 1;
            e = self.mesh.onext(e);
            self.emit_dst(e);
        }
        debug_assert_eq!(size, 0);
        self.sink.end();
    }

    fn render_strip(&mut self, mut e: EdgeIdx, mut size: usize) {
        self.sink.begin(PrimitiveKind::TriangleStrip);
        self.emit_org(e);
        self.emit_dst(e);
        while !self.marked(self.mesh.lface(e)) {
            let f = self.mesh.lface(e);
            self.mesh.faces[f as usize].marked = true;
            size -= 1;
            e = self.mesh.dprev(e);
            self.emit_org(e);
            if self.marked(self.mesh.lface(e)) {
                break;
            }
            let f = self.mesh.lface(e);
            self.mesh.faces[f as usize].marked = true;
            size -= 1;
            e = self.mesh.onext(e);
            self.emit_dst(e);
        }
        debug_assert_eq!(size, 0);
        self.sink.end();
    }

    /// All batched triangles as one primitive. With edge flags, a flag is
    /// sent whenever it changes; the first one always goes out.
    fn render_lonely_triangles(&mut self) {
        let mut f = self.lonely;
        if f == INVALID {
            return;
        }
        let mut edge_state = None;

        self.sink.begin(PrimitiveKind::Triangles);
        while f != INVALID {
            let start = self.mesh.faces[f as usize].an_edge;
            let mut e = start;
            loop {
                if self.flag_boundary {
                    let boundary = !self.mesh.faces[self.mesh.rface(e) as usize].inside;
                    if edge_state != Some(boundary) {
                        edge_state = Some(boundary);
                        self.sink.edge_flag(boundary);
                    }
                }
                self.emit_org(e);
                e = self.mesh.lnext(e);
                if e == start {
                    break;
                }
            }
            f = self.mesh.faces[f as usize].trail;
        }
        self.sink.end();
    }
}

/// Emit every inside face of a triangulated mesh. Returns the number of
/// triangles rendered.
pub fn render_mesh(mesh: &mut Mesh, sink: &mut dyn PrimitiveSink, flag_boundary: bool) -> usize {
    let mut f = mesh.faces[F_HEAD as usize].next;
    while f != F_HEAD {
        mesh.faces[f as usize].marked = false;
        f = mesh.faces[f as usize].next;
    }

    let mut renderer = Renderer {
        mesh,
        sink,
        flag_boundary,
        lonely: INVALID,
    };
    let mut triangles = 0;
    let mut f = renderer.mesh.faces[F_HEAD as usize].next;
    while f != F_HEAD {
        let face = &renderer.mesh.faces[f as usize];
        if face.inside {
            triangles += 1;
            if !face.marked {
                renderer.render_maximum_face_group(f);
                debug_assert!(renderer.mesh.faces[f as usize].marked);
            }
        }
        f = renderer.mesh.faces[f as usize].next;
    }
    renderer.render_lonely_triangles();
    debug!("rendered {} triangles", triangles);
    triangles
}

/// Emit each inside face as a closed line loop.
pub fn render_boundary(mesh: &Mesh, sink: &mut dyn PrimitiveSink) -> usize {
    let mut loops = 0;
    let mut f = mesh.faces[F_HEAD as usize].next;
    while f != F_HEAD {
        if mesh.faces[f as usize].inside {
            sink.begin(PrimitiveKind::LineLoop);
            let start = mesh.faces[f as usize].an_edge;
            let mut e = start;
            loop {
                let v = mesh.org(e);
                sink.vertex(mesh.verts[v as usize].data);
                e = mesh.lnext(e);
                if e == start {
                    break;
                }
            }
            sink.end();
            loops += 1;
        }
        f = mesh.faces[f as usize].next;
    }
    debug!("rendered {} boundary loops", loops);
    loops
}

/// Orientation of the fan from the first cached vertex, measured against a
/// normal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FanSign {
    /// Every triangle has zero area.
    Degenerate,
    Ccw,
    Cw,
    /// Triangles face both ways (or, when degenerate triangles are to be
    /// avoided, some have zero area).
    Inconsistent,
}

/// Normal of the fan, with back-facing triangles counted reversed.
fn fan_normal(cache: &[CachedVertex]) -> [Real; 3] {
    let mut norm = [0.0; 3];
    let v0 = cache[0].coords;
    let edge = |c: &[Real; 3]| [c[0] - v0[0], c[1] - v0[1], c[2] - v0[2]];
    let mut xc = edge(&cache[1].coords);
    for vc in &cache[2..] {
        let xp = xc;
        xc = edge(&vc.coords);
        let n = cross(&xp, &xc);
        if dot(&n, &norm) >= 0.0 {
            for i in 0..3 {
                norm[i] += n[i];
            }
        } else {
            for i in 0..3 {
                norm[i] -= n[i];
            }
        }
    }
    norm
}

/// Axes of the plane perpendicular to `norm`, ordered so that a turn which
/// is counter-clockwise about `norm` stays counter-clockwise in (s, t).
fn fan_axes(norm: &[Real; 3]) -> (usize, usize) {
    let k = long_axis(norm);
    let (i, j) = ((k + 1) % 3, (k + 2) % 3);
    if norm[k] < 0.0 {
        (j, i)
    } else {
        (i, j)
    }
}

fn fan_sign(cache: &[CachedVertex], norm: &[Real; 3], avoid_degenerate: bool) -> FanSign {
    if *norm == [0.0; 3] {
        return if avoid_degenerate {
            FanSign::Inconsistent
        } else {
            FanSign::Degenerate
        };
    }
    let (i, j) = fan_axes(norm);
    let st = |c: &[Real; 3]| St::new(c[i], c[j]);

    let mut sign = FanSign::Degenerate;
    let v0 = st(&cache[0].coords);
    let mut vc = st(&cache[1].coords);
    for next in &cache[2..] {
        let vp = vc;
        vc = st(&next.coords);
        let ccw = vert_ccw(v0, vp, vc);
        let cw = vert_ccw(v0, vc, vp);
        if ccw && cw {
            if avoid_degenerate {
                return FanSign::Inconsistent;
            }
        } else if ccw {
            if sign == FanSign::Cw {
                return FanSign::Inconsistent;
            }
            sign = FanSign::Ccw;
        } else {
            if sign == FanSign::Ccw {
                return FanSign::Inconsistent;
            }
            sign = FanSign::Cw;
        }
    }
    sign
}

/// Fast path for a single contour that was never turned into a mesh: if the
/// cached vertices form a consistently oriented fan, emit it directly.
///
/// Returns false when the polygon needs the full pipeline.
pub(crate) fn render_cache(
    cache: &[CachedVertex],
    normal: [Real; 3],
    rule: WindingRule,
    boundary_only: bool,
    avoid_degenerate: bool,
    sink: &mut dyn PrimitiveSink,
) -> bool {
    if cache.len() < 3 {
        return true;
    }

    let norm = if normal == [0.0; 3] {
        fan_normal(cache)
    } else {
        normal
    };
    let sign = match fan_sign(cache, &norm, avoid_degenerate) {
        FanSign::Inconsistent => return false,
        FanSign::Degenerate => return true,
        sign => sign,
    };

    match rule {
        WindingRule::Odd | WindingRule::NonZero => {}
        WindingRule::Positive if sign == FanSign::Cw => return true,
        WindingRule::Negative if sign == FanSign::Ccw => return true,
        WindingRule::AbsGeqTwo => return true,
        _ => {}
    }

    let kind = if boundary_only {
        PrimitiveKind::LineLoop
    } else if cache.len() > 3 {
        PrimitiveKind::TriangleFan
    } else {
        PrimitiveKind::Triangles
    };
    debug!("fast path: {:?} with {} vertices", kind, cache.len());

    sink.begin(kind);
    sink.vertex(cache[0].data);
    if sign == FanSign::Ccw {
        for v in &cache[1..] {
            sink.vertex(v.data);
        }
    } else {
        for v in cache[1..].iter().rev() {
            sink.vertex(v.data);
        }
    }
    sink.end();
    true
}
