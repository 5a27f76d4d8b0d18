// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Half-edge mesh (Guibas/Stolfi style) stored in index arenas.
//
// Design:
//   - INVALID: u32::MAX marks "no element".
//   - Half-edges are allocated in pairs: edges[i] and edges[i ^ 1] are twins.
//   - Sentinel list heads: verts[0], faces[0], and the edge pair 0/1.
//     The global edge list links even halves through `next`; the odd half's
//     `next` holds the backwards link.
//   - Killed elements keep their slot with `next == INVALID`, so a stale index
//     is detectable (`is_live_*`) rather than silently aliasing a new element.
//
// Only the operations in this file touch the rings. Everything above it
// (sweep, triangulation, output) edits the mesh through them.

pub mod monotone;

use crate::bucketalloc::Handle;
use crate::error::TessError;
use crate::geom::{vert_leq, Real, St};
use crate::priorityq::PqHandle;
use thiserror::Error;

pub const INVALID: u32 = u32::MAX;

/// Index into Mesh::verts
pub type VertIdx = u32;
/// Index into Mesh::faces
pub type FaceIdx = u32;
/// Index into Mesh::edges
pub type EdgeIdx = u32;

pub const V_HEAD: VertIdx = 0;
pub const F_HEAD: FaceIdx = 0;
pub const E_HEAD: EdgeIdx = 0;
pub const E_HEAD_SYM: EdgeIdx = 1;

/// The twin half-edge.
#[inline(always)]
pub fn sym(e: EdgeIdx) -> EdgeIdx {
    e ^ 1
}

#[derive(Clone, Debug)]
pub struct Vertex {
    pub next: VertIdx,
    pub prev: VertIdx,
    /// Some half-edge with this origin.
    pub an_edge: EdgeIdx,
    pub coords: [Real; 3],
    pub s: Real,
    pub t: Real,
    pub pq_handle: Option<PqHandle>,
    /// Client payload slot, INVALID for sentinel vertices.
    pub data: u32,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            next: INVALID,
            prev: INVALID,
            an_edge: INVALID,
            coords: [0.0; 3],
            s: 0.0,
            t: 0.0,
            pq_handle: None,
            data: INVALID,
        }
    }
}

impl Vertex {
    #[inline]
    pub fn st(&self) -> St {
        St::new(self.s, self.t)
    }
}

#[derive(Clone, Debug)]
pub struct Face {
    pub next: FaceIdx,
    pub prev: FaceIdx,
    /// Some half-edge with this left face.
    pub an_edge: EdgeIdx,
    /// Scratch list used while grouping output primitives.
    pub trail: FaceIdx,
    pub marked: bool,
    pub inside: bool,
}

impl Default for Face {
    fn default() -> Self {
        Self {
            next: INVALID,
            prev: INVALID,
            an_edge: INVALID,
            trail: INVALID,
            marked: false,
            inside: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HalfEdge {
    /// Global edge list link (see module notes).
    pub next: EdgeIdx,
    /// Next edge CCW around the origin.
    pub onext: EdgeIdx,
    /// Next edge CCW around the left face.
    pub lnext: EdgeIdx,
    pub org: VertIdx,
    pub lface: FaceIdx,
    /// Region whose upper edge this is, while the edge is in the sweep
    /// dictionary.
    pub active_region: Option<Handle>,
    /// Change in winding number when crossing from the right face to the
    /// left face.
    pub winding: i32,
}

impl Default for HalfEdge {
    fn default() -> Self {
        Self {
            next: INVALID,
            onext: INVALID,
            lnext: INVALID,
            org: INVALID,
            lface: INVALID,
            active_region: None,
            winding: 0,
        }
    }
}

/// A broken invariant found by [`Mesh::check_mesh`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MeshError {
    #[error("{list} list is broken at element {index}")]
    BrokenList { list: &'static str, index: u32 },
    #[error("half-edge {0} is dead or out of range but still referenced")]
    DeadEdge(EdgeIdx),
    #[error("half-edge {0} violates the onext/lnext ring relations")]
    BrokenRing(EdgeIdx),
    #[error("half-edge {edge} has origin {found}, expected vertex {expected}")]
    WrongOrigin { edge: EdgeIdx, expected: VertIdx, found: VertIdx },
    #[error("half-edge {edge} has left face {found}, expected face {expected}")]
    WrongFace { edge: EdgeIdx, expected: FaceIdx, found: FaceIdx },
    #[error("ring starting at half-edge {0} does not close")]
    OpenRing(EdgeIdx),
}

/// The half-edge mesh.
pub struct Mesh {
    pub verts: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub edges: Vec<HalfEdge>,
}

impl Mesh {
    /// An empty mesh holding only the list heads.
    pub fn new() -> Self {
        let v_head = Vertex {
            next: V_HEAD,
            prev: V_HEAD,
            ..Vertex::default()
        };
        let f_head = Face {
            next: F_HEAD,
            prev: F_HEAD,
            ..Face::default()
        };
        let e_head = HalfEdge {
            next: E_HEAD,
            ..HalfEdge::default()
        };
        let e_head_sym = HalfEdge {
            next: E_HEAD_SYM,
            ..HalfEdge::default()
        };
        Mesh {
            verts: vec![v_head],
            faces: vec![f_head],
            edges: vec![e_head, e_head_sym],
        }
    }

    // ──────────────────────────── Navigation ────────────────────────────────

    #[inline]
    pub fn onext(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[e as usize].onext
    }

    #[inline]
    pub fn lnext(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[e as usize].lnext
    }

    #[inline]
    pub fn org(&self, e: EdgeIdx) -> VertIdx {
        self.edges[e as usize].org
    }

    #[inline]
    pub fn dst(&self, e: EdgeIdx) -> VertIdx {
        self.edges[sym(e) as usize].org
    }

    #[inline]
    pub fn lface(&self, e: EdgeIdx) -> FaceIdx {
        self.edges[e as usize].lface
    }

    #[inline]
    pub fn rface(&self, e: EdgeIdx) -> FaceIdx {
        self.edges[sym(e) as usize].lface
    }

    /// Sym->Lnext
    #[inline]
    pub fn oprev(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[sym(e) as usize].lnext
    }

    /// Onext->Sym
    #[inline]
    pub fn lprev(&self, e: EdgeIdx) -> EdgeIdx {
        sym(self.edges[e as usize].onext)
    }

    /// Lnext->Sym
    #[inline]
    pub fn dprev(&self, e: EdgeIdx) -> EdgeIdx {
        sym(self.edges[e as usize].lnext)
    }

    /// Sym->Onext
    #[inline]
    pub fn rprev(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[sym(e) as usize].onext
    }

    /// Rprev->Sym
    #[inline]
    pub fn dnext(&self, e: EdgeIdx) -> EdgeIdx {
        sym(self.rprev(e))
    }

    #[inline]
    pub fn st(&self, v: VertIdx) -> St {
        self.verts[v as usize].st()
    }

    #[inline]
    pub fn org_st(&self, e: EdgeIdx) -> St {
        self.st(self.org(e))
    }

    #[inline]
    pub fn dst_st(&self, e: EdgeIdx) -> St {
        self.st(self.dst(e))
    }

    #[inline]
    pub fn edge_goes_left(&self, e: EdgeIdx) -> bool {
        vert_leq(self.dst_st(e), self.org_st(e))
    }

    #[inline]
    pub fn edge_goes_right(&self, e: EdgeIdx) -> bool {
        vert_leq(self.org_st(e), self.dst_st(e))
    }

    pub fn is_live_vertex(&self, v: VertIdx) -> bool {
        v != V_HEAD && (v as usize) < self.verts.len() && self.verts[v as usize].next != INVALID
    }

    pub fn is_live_face(&self, f: FaceIdx) -> bool {
        f != F_HEAD && (f as usize) < self.faces.len() && self.faces[f as usize].next != INVALID
    }

    pub fn is_live_edge(&self, e: EdgeIdx) -> bool {
        e > E_HEAD_SYM && (e as usize) < self.edges.len() && self.edges[e as usize].next != INVALID
    }

    pub fn vertex_count(&self) -> usize {
        self.count_list(|m, i| m.verts[i as usize].next, V_HEAD)
    }

    pub fn face_count(&self) -> usize {
        self.count_list(|m, i| m.faces[i as usize].next, F_HEAD)
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.count_list(|m, i| m.edges[i as usize].next, E_HEAD)
    }

    fn count_list(&self, next: impl Fn(&Self, u32) -> u32, head: u32) -> usize {
        let mut n = 0;
        let mut i = next(self, head);
        while i != head && i != INVALID {
            n += 1;
            i = next(self, i);
        }
        n
    }

    // ──────────────────────── Allocation helpers ────────────────────────────

    /// Reserve room up front so an operation either fails before touching
    /// any ring or runs to completion.
    fn reserve(&mut self, edge_pairs: usize, verts: usize, faces: usize) -> Result<(), TessError> {
        self.edges.try_reserve(edge_pairs * 2)?;
        self.verts.try_reserve(verts)?;
        self.faces.try_reserve(faces)?;
        Ok(())
    }

    /// New isolated half-edge pair, linked into the edge list before `e_next`.
    fn make_edge_pair(&mut self, e_next: EdgeIdx) -> EdgeIdx {
        let e_next = e_next & !1;
        let e = self.edges.len() as EdgeIdx;
        let e_sym = sym(e);
        let e_prev = self.edges[sym(e_next) as usize].next;

        self.edges.push(HalfEdge {
            next: e_next,
            onext: e,
            lnext: e_sym,
            ..HalfEdge::default()
        });
        self.edges.push(HalfEdge {
            next: e_prev,
            onext: e_sym,
            lnext: e,
            ..HalfEdge::default()
        });

        self.edges[sym(e_prev) as usize].next = e;
        self.edges[sym(e_next) as usize].next = e_sym;
        e
    }

    /// New vertex before `v_next` in the vertex list, made the origin of
    /// every edge in `e_orig`'s origin ring.
    fn make_vertex(&mut self, e_orig: EdgeIdx, v_next: VertIdx) -> VertIdx {
        let v_new = self.verts.len() as VertIdx;
        let v_prev = self.verts[v_next as usize].prev;
        self.verts.push(Vertex {
            next: v_next,
            prev: v_prev,
            an_edge: e_orig,
            ..Vertex::default()
        });
        self.verts[v_prev as usize].next = v_new;
        self.verts[v_next as usize].prev = v_new;

        let mut e = e_orig;
        loop {
            self.edges[e as usize].org = v_new;
            e = self.onext(e);
            if e == e_orig {
                break;
            }
        }
        v_new
    }

    /// New face before `f_next` in the face list, made the left face of
    /// every edge in `e_orig`'s face ring. Inherits `f_next.inside`.
    fn make_face(&mut self, e_orig: EdgeIdx, f_next: FaceIdx) -> FaceIdx {
        let f_new = self.faces.len() as FaceIdx;
        let f_prev = self.faces[f_next as usize].prev;
        let inside = self.faces[f_next as usize].inside;
        self.faces.push(Face {
            next: f_next,
            prev: f_prev,
            an_edge: e_orig,
            inside,
            ..Face::default()
        });
        self.faces[f_prev as usize].next = f_new;
        self.faces[f_next as usize].prev = f_new;

        let mut e = e_orig;
        loop {
            self.edges[e as usize].lface = f_new;
            e = self.lnext(e);
            if e == e_orig {
                break;
            }
        }
        f_new
    }

    /// Unlink `v_del`, pointing its ring at `new_org` (INVALID when the ring
    /// is going away too).
    fn kill_vertex(&mut self, v_del: VertIdx, new_org: VertIdx) {
        let e_start = self.verts[v_del as usize].an_edge;
        let mut e = e_start;
        loop {
            self.edges[e as usize].org = new_org;
            e = self.onext(e);
            if e == e_start {
                break;
            }
        }

        let Vertex { prev, next, .. } = self.verts[v_del as usize];
        self.verts[prev as usize].next = next;
        self.verts[next as usize].prev = prev;

        let dead = &mut self.verts[v_del as usize];
        dead.next = INVALID;
        dead.prev = INVALID;
        dead.an_edge = INVALID;
    }

    fn kill_face(&mut self, f_del: FaceIdx, new_lface: FaceIdx) {
        let e_start = self.faces[f_del as usize].an_edge;
        let mut e = e_start;
        loop {
            self.edges[e as usize].lface = new_lface;
            e = self.lnext(e);
            if e == e_start {
                break;
            }
        }

        let Face { prev, next, .. } = self.faces[f_del as usize];
        self.faces[prev as usize].next = next;
        self.faces[next as usize].prev = prev;

        let dead = &mut self.faces[f_del as usize];
        dead.next = INVALID;
        dead.prev = INVALID;
        dead.an_edge = INVALID;
    }

    fn kill_edge(&mut self, e_del: EdgeIdx) {
        let e_del = e_del & !1;
        let e_next = self.edges[e_del as usize].next;
        let e_prev = self.edges[sym(e_del) as usize].next;
        self.edges[sym(e_next) as usize].next = e_prev;
        self.edges[sym(e_prev) as usize].next = e_next;

        self.edges[e_del as usize].next = INVALID;
        self.edges[sym(e_del) as usize].next = INVALID;
        self.edges[e_del as usize].active_region = None;
        self.edges[sym(e_del) as usize].active_region = None;
    }

    /// Exchange a->Onext and b->Onext, fixing the Lnext links that point at
    /// them.
    fn raw_splice(&mut self, a: EdgeIdx, b: EdgeIdx) {
        let a_onext = self.onext(a);
        let b_onext = self.onext(b);
        self.edges[sym(a_onext) as usize].lnext = b;
        self.edges[sym(b_onext) as usize].lnext = a;
        self.edges[a as usize].onext = b_onext;
        self.edges[b as usize].onext = a_onext;
    }

    // ─────────────────────────── Public operations ──────────────────────────

    /// A new edge with two new vertices and one face (both sides of the edge
    /// bound the same loop).
    pub fn make_edge(&mut self) -> Result<EdgeIdx, TessError> {
        self.reserve(1, 2, 1)?;
        let e = self.make_edge_pair(E_HEAD);
        self.make_vertex(e, V_HEAD);
        self.make_vertex(sym(e), V_HEAD);
        self.make_face(e, F_HEAD);
        Ok(e)
    }

    /// The basic connectivity change: exchange `e_org.onext` and
    /// `e_dst.onext`.
    ///
    /// If the two origins differ, the vertices are merged (e_dst's origin is
    /// destroyed); otherwise the origin ring is split and e_dst gets a new
    /// vertex. Likewise, different left faces are merged (e_dst's face is
    /// destroyed) and a shared left face is split, e_dst getting the new face.
    pub fn splice(&mut self, e_org: EdgeIdx, e_dst: EdgeIdx) -> Result<(), TessError> {
        if e_org == e_dst {
            return Ok(());
        }
        self.reserve(0, 1, 1)?;

        let org = self.org(e_org);
        let lface = self.lface(e_org);
        let joining_vertices = self.org(e_dst) != org;
        let joining_loops = self.lface(e_dst) != lface;

        if joining_vertices {
            self.kill_vertex(self.org(e_dst), org);
        }
        if joining_loops {
            self.kill_face(self.lface(e_dst), lface);
        }

        self.raw_splice(e_dst, e_org);

        if !joining_vertices {
            self.make_vertex(e_dst, org);
            self.verts[org as usize].an_edge = e_org;
        }
        if !joining_loops {
            self.make_face(e_dst, lface);
            self.faces[lface as usize].an_edge = e_org;
        }
        Ok(())
    }

    /// Remove `e_del` (and its twin). Faces on either side are joined; a
    /// vertex or face left without edges is destroyed.
    pub fn delete_edge(&mut self, e_del: EdgeIdx) -> Result<(), TessError> {
        self.reserve(0, 0, 1)?;
        let e_del_sym = sym(e_del);

        let joining_loops = self.lface(e_del) != self.rface(e_del);
        if joining_loops {
            self.kill_face(self.lface(e_del), self.rface(e_del));
        }

        if self.onext(e_del) == e_del {
            self.kill_vertex(self.org(e_del), INVALID);
        } else {
            let rface = self.rface(e_del);
            self.faces[rface as usize].an_edge = self.oprev(e_del);
            let org = self.org(e_del);
            self.verts[org as usize].an_edge = self.onext(e_del);

            self.raw_splice(e_del, self.oprev(e_del));
            if !joining_loops {
                self.make_face(e_del, self.lface(e_del));
            }
        }

        // The mesh is consistent again except that e_del.org may be gone.
        // Now detach the destination.
        if self.onext(e_del_sym) == e_del_sym {
            self.kill_vertex(self.org(e_del_sym), INVALID);
            self.kill_face(self.lface(e_del_sym), INVALID);
        } else {
            let lface = self.lface(e_del);
            self.faces[lface as usize].an_edge = self.oprev(e_del_sym);
            let dst = self.org(e_del_sym);
            self.verts[dst as usize].an_edge = self.onext(e_del_sym);
            self.raw_splice(e_del_sym, self.oprev(e_del_sym));
        }

        self.kill_edge(e_del);
        Ok(())
    }

    /// Remove a vertex together with every edge incident to it.
    pub fn delete_vertex(&mut self, v: VertIdx) -> Result<(), TessError> {
        while self.is_live_vertex(v) {
            let e = self.verts[v as usize].an_edge;
            self.delete_edge(e)?;
        }
        Ok(())
    }

    /// A new edge `e_new` such that `e_new == e_org.lnext` and `e_new.dst` is
    /// a new vertex. Both halves share `e_org`'s left face.
    pub fn add_edge_vertex(&mut self, e_org: EdgeIdx) -> Result<EdgeIdx, TessError> {
        self.reserve(1, 1, 0)?;
        let e_new = self.make_edge_pair(e_org);
        let e_new_sym = sym(e_new);

        self.raw_splice(e_new, self.lnext(e_org));

        let dst = self.dst(e_org);
        self.edges[e_new as usize].org = dst;
        self.make_vertex(e_new_sym, dst);

        let lface = self.lface(e_org);
        self.edges[e_new as usize].lface = lface;
        self.edges[e_new_sym as usize].lface = lface;
        Ok(e_new)
    }

    /// Split `e_org` in two at a new vertex: afterwards `e_new == e_org.lnext`,
    /// `e_org.dst == e_new.org` is the new vertex, and both halves keep
    /// `e_org`'s faces and winding.
    pub fn split_edge(&mut self, e_org: EdgeIdx) -> Result<EdgeIdx, TessError> {
        let temp = self.add_edge_vertex(e_org)?;
        let e_new = sym(temp);
        let e_org_sym = sym(e_org);

        // Detach e_org from its old destination and attach it to e_new.org.
        self.raw_splice(e_org_sym, self.oprev(e_org_sym));
        self.raw_splice(e_org_sym, e_new);

        let mid = self.org(e_new);
        self.edges[e_org_sym as usize].org = mid;
        let far = self.dst(e_new);
        self.verts[far as usize].an_edge = sym(e_new);
        self.edges[sym(e_new) as usize].lface = self.rface(e_org);
        self.edges[e_new as usize].winding = self.edges[e_org as usize].winding;
        self.edges[sym(e_new) as usize].winding = self.edges[e_org_sym as usize].winding;
        Ok(e_new)
    }

    /// A new edge from `e_org.dst` to `e_dst.org`, returned as the half whose
    /// origin is `e_org.dst`. If the two left faces differ they are merged,
    /// otherwise the face is split and the new half-edge gets the new face.
    pub fn connect(&mut self, e_org: EdgeIdx, e_dst: EdgeIdx) -> Result<EdgeIdx, TessError> {
        self.reserve(1, 0, 1)?;
        let e_new = self.make_edge_pair(e_org);
        let e_new_sym = sym(e_new);

        let lface = self.lface(e_org);
        let joining_loops = self.lface(e_dst) != lface;
        if joining_loops {
            self.kill_face(self.lface(e_dst), lface);
        }

        self.raw_splice(e_new, self.lnext(e_org));
        self.raw_splice(e_new_sym, e_dst);

        self.edges[e_new as usize].org = self.dst(e_org);
        self.edges[e_new_sym as usize].org = self.org(e_dst);
        self.edges[e_new as usize].lface = lface;
        self.edges[e_new_sym as usize].lface = lface;

        self.faces[lface as usize].an_edge = e_new_sym;

        if !joining_loops {
            self.make_face(e_new, lface);
        }
        Ok(e_new)
    }

    // ─────────────────────────── Consistency check ──────────────────────────

    /// Walk every list and ring and verify the half-edge relations.
    pub fn check_mesh(&self) -> Result<(), MeshError> {
        let limit = self.edges.len() + 1;

        let mut f_prev = F_HEAD;
        loop {
            let f = self.faces[f_prev as usize].next;
            if f == F_HEAD {
                break;
            }
            if !self.is_live_face(f) || self.faces[f as usize].prev != f_prev {
                return Err(MeshError::BrokenList { list: "face", index: f });
            }
            let start = self.faces[f as usize].an_edge;
            self.walk_ring(start, limit, |m, e| m.lnext(e), |m, e| {
                if m.lface(e) != f {
                    return Err(MeshError::WrongFace { edge: e, expected: f, found: m.lface(e) });
                }
                Ok(())
            })?;
            f_prev = f;
        }
        if self.faces[F_HEAD as usize].prev != f_prev {
            return Err(MeshError::BrokenList { list: "face", index: F_HEAD });
        }

        let mut v_prev = V_HEAD;
        loop {
            let v = self.verts[v_prev as usize].next;
            if v == V_HEAD {
                break;
            }
            if !self.is_live_vertex(v) || self.verts[v as usize].prev != v_prev {
                return Err(MeshError::BrokenList { list: "vertex", index: v });
            }
            let start = self.verts[v as usize].an_edge;
            self.walk_ring(start, limit, |m, e| m.onext(e), |m, e| {
                if m.org(e) != v {
                    return Err(MeshError::WrongOrigin { edge: e, expected: v, found: m.org(e) });
                }
                Ok(())
            })?;
            v_prev = v;
        }
        if self.verts[V_HEAD as usize].prev != v_prev {
            return Err(MeshError::BrokenList { list: "vertex", index: V_HEAD });
        }

        let mut e_prev = E_HEAD;
        let mut steps = 0;
        loop {
            let e = self.edges[e_prev as usize].next;
            if e == E_HEAD {
                break;
            }
            steps += 1;
            if !self.is_live_edge(e) || steps > limit {
                return Err(MeshError::BrokenList { list: "edge", index: e });
            }
            if self.edges[sym(e) as usize].next != sym(e_prev) {
                return Err(MeshError::BrokenList { list: "edge", index: e });
            }
            self.check_edge(e)?;
            self.check_edge(sym(e))?;
            if !self.is_live_vertex(self.org(e)) || !self.is_live_vertex(self.dst(e)) {
                return Err(MeshError::DeadEdge(e));
            }
            if !self.is_live_face(self.lface(e)) || !self.is_live_face(self.rface(e)) {
                return Err(MeshError::DeadEdge(e));
            }
            e_prev = e;
        }
        if self.edges[E_HEAD_SYM as usize].next != sym(e_prev) {
            return Err(MeshError::BrokenList { list: "edge", index: E_HEAD });
        }
        Ok(())
    }

    fn check_edge(&self, e: EdgeIdx) -> Result<(), MeshError> {
        if !self.is_live_edge(e) {
            return Err(MeshError::DeadEdge(e));
        }
        let (onext, lnext) = (self.onext(e), self.lnext(e));
        if !self.is_live_edge(onext) || !self.is_live_edge(lnext) {
            return Err(MeshError::DeadEdge(e));
        }
        if sym(self.onext(lnext)) != e || self.lnext(sym(onext)) != e {
            return Err(MeshError::BrokenRing(e));
        }
        Ok(())
    }

    fn walk_ring(
        &self,
        start: EdgeIdx,
        limit: usize,
        step: impl Fn(&Self, EdgeIdx) -> EdgeIdx,
        mut visit: impl FnMut(&Self, EdgeIdx) -> Result<(), MeshError>,
    ) -> Result<(), MeshError> {
        let mut e = start;
        for _ in 0..limit {
            self.check_edge(e)?;
            visit(self, e)?;
            e = step(self, e);
            if e == start {
                return Ok(());
            }
        }
        Err(MeshError::OpenRing(start))
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// V - E + F; two for every connected component of a closed mesh.
    fn euler_characteristic(mesh: &Mesh) -> i64 {
        mesh.vertex_count() as i64 - mesh.edge_count() as i64 + mesh.face_count() as i64
    }

    fn face_degree(mesh: &Mesh, f: FaceIdx) -> usize {
        let start = mesh.faces[f as usize].an_edge;
        let mut n = 1;
        let mut e = mesh.lnext(start);
        while e != start {
            n += 1;
            e = mesh.lnext(e);
        }
        n
    }

    #[test]
    fn make_edge_creates_single_edge() {
        let mut mesh = Mesh::new();
        let e = mesh.make_edge().unwrap();
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.edge_count(), 1);
        assert_ne!(mesh.org(e), mesh.dst(e));
        assert_eq!(mesh.lface(e), mesh.rface(e));
        assert_eq!(mesh.onext(e), e);
        assert_eq!(mesh.lnext(e), sym(e));
        mesh.check_mesh().unwrap();
    }

    #[test]
    fn sym_involution() {
        for e in [2u32, 3, 10, 11, 1001] {
            assert_eq!(sym(sym(e)), e);
            assert_ne!(sym(e), e);
        }
    }

    #[test]
    fn splice_with_own_twin_closes_a_loop() {
        let mut mesh = Mesh::new();
        let e = mesh.make_edge().unwrap();
        mesh.splice(e, sym(e)).unwrap();
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.org(e), mesh.dst(e));
        assert_ne!(mesh.lface(e), mesh.rface(e));
        assert_eq!(euler_characteristic(&mesh), 2);
        mesh.check_mesh().unwrap();
    }

    /// Build a closed contour the way the tessellator does.
    fn triangle(mesh: &mut Mesh) -> EdgeIdx {
        let mut e = mesh.make_edge().unwrap();
        mesh.splice(e, sym(e)).unwrap();
        for _ in 0..2 {
            mesh.split_edge(e).unwrap();
            e = mesh.lnext(e);
        }
        e
    }

    #[test]
    fn split_edge_builds_contour() {
        let mut mesh = Mesh::new();
        let e = triangle(&mut mesh);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.edge_count(), 3);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(face_degree(&mesh, mesh.lface(e)), 3);
        assert_eq!(face_degree(&mesh, mesh.rface(e)), 3);
        mesh.check_mesh().unwrap();
    }

    #[test]
    fn split_edge_keeps_winding_and_faces() {
        let mut mesh = Mesh::new();
        let e = mesh.make_edge().unwrap();
        mesh.edges[e as usize].winding = 1;
        mesh.edges[sym(e) as usize].winding = -1;
        let e_new = mesh.split_edge(e).unwrap();
        assert_eq!(mesh.lnext(e), e_new);
        assert_eq!(mesh.dst(e), mesh.org(e_new));
        assert_eq!(mesh.edges[e_new as usize].winding, 1);
        assert_eq!(mesh.edges[sym(e_new) as usize].winding, -1);
        assert_eq!(mesh.lface(e_new), mesh.lface(e));
        mesh.check_mesh().unwrap();
    }

    #[test]
    fn connect_splits_face() {
        let mut mesh = Mesh::new();
        let mut e = mesh.make_edge().unwrap();
        mesh.splice(e, sym(e)).unwrap();
        for _ in 0..3 {
            mesh.split_edge(e).unwrap();
            e = mesh.lnext(e);
        }
        let faces_before = mesh.face_count();
        let lface = mesh.lface(e);
        let d = mesh.connect(e, mesh.lprev(e)).unwrap();
        assert_eq!(mesh.face_count(), faces_before + 1);
        assert_eq!(mesh.org(d), mesh.dst(e));
        assert_ne!(mesh.lface(d), mesh.rface(d));
        assert!(mesh.lface(d) == lface || mesh.rface(d) == lface);
        assert_eq!(euler_characteristic(&mesh), 2);
        mesh.check_mesh().unwrap();
    }

    #[test]
    fn delete_edge_merges_faces_and_marks_dead() {
        let mut mesh = Mesh::new();
        let mut e = mesh.make_edge().unwrap();
        mesh.splice(e, sym(e)).unwrap();
        for _ in 0..3 {
            mesh.split_edge(e).unwrap();
            e = mesh.lnext(e);
        }
        let d = mesh.connect(e, mesh.lprev(e)).unwrap();
        let faces = mesh.face_count();
        mesh.delete_edge(d).unwrap();
        assert_eq!(mesh.face_count(), faces - 1);
        assert!(!mesh.is_live_edge(d));
        assert!(!mesh.is_live_edge(sym(d)));
        mesh.check_mesh().unwrap();
    }

    #[test]
    fn delete_vertex_removes_incident_edges() {
        let mut mesh = Mesh::new();
        let e = triangle(&mut mesh);
        let v = mesh.org(e);
        mesh.delete_vertex(v).unwrap();
        assert!(!mesh.is_live_vertex(v));
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.edge_count(), 1);
        assert_eq!(mesh.face_count(), 1);
        mesh.check_mesh().unwrap();
    }

    #[test]
    fn deleting_last_edge_empties_mesh() {
        let mut mesh = Mesh::new();
        let e = mesh.make_edge().unwrap();
        mesh.delete_edge(e).unwrap();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.edge_count(), 0);
        mesh.check_mesh().unwrap();
    }

    #[test]
    fn check_mesh_reports_broken_ring() {
        let mut mesh = Mesh::new();
        let e = triangle(&mut mesh);
        let other = mesh.lnext(e);
        mesh.edges[e as usize].onext = other;
        assert!(mesh.check_mesh().is_err());
    }

    #[derive(Clone, Debug)]
    enum MeshOp {
        MakeEdge,
        Splice(usize, bool, usize, bool),
        SplitEdge(usize, bool),
        Connect(usize, bool, usize, bool),
        Delete(usize, bool),
    }

    fn mesh_op() -> impl Strategy<Value = MeshOp> {
        let pick = (any::<usize>(), any::<bool>());
        prop_oneof![
            Just(MeshOp::MakeEdge),
            (pick.clone(), pick.clone()).prop_map(|((a, x), (b, y))| MeshOp::Splice(a, x, b, y)),
            pick.clone().prop_map(|(a, x)| MeshOp::SplitEdge(a, x)),
            (pick.clone(), pick.clone()).prop_map(|((a, x), (b, y))| MeshOp::Connect(a, x, b, y)),
            pick.prop_map(|(a, x)| MeshOp::Delete(a, x)),
        ]
    }

    fn live_edges(mesh: &Mesh) -> Vec<EdgeIdx> {
        let mut out = Vec::new();
        let mut e = mesh.edges[E_HEAD as usize].next;
        while e != E_HEAD {
            out.push(e);
            e = mesh.edges[e as usize].next;
        }
        out
    }

    fn choose(edges: &[EdgeIdx], i: usize, flip: bool) -> EdgeIdx {
        let e = edges[i % edges.len()];
        if flip {
            sym(e)
        } else {
            e
        }
    }

    proptest! {
        #[test]
        fn invariants_hold_under_random_edits(ops in prop::collection::vec(mesh_op(), 1..60)) {
            let mut mesh = Mesh::new();
            mesh.make_edge().unwrap();
            for op in ops {
                let edges = live_edges(&mesh);
                if edges.is_empty() {
                    mesh.make_edge().unwrap();
                    continue;
                }
                match op {
                    MeshOp::MakeEdge => {
                        mesh.make_edge().unwrap();
                    }
                    MeshOp::Splice(a, x, b, y) => {
                        mesh.splice(choose(&edges, a, x), choose(&edges, b, y)).unwrap();
                    }
                    MeshOp::SplitEdge(a, x) => {
                        let e = choose(&edges, a, x);
                        let e_new = mesh.split_edge(e).unwrap();
                        prop_assert_eq!(mesh.lnext(e), e_new);
                    }
                    MeshOp::Connect(a, x, b, y) => {
                        mesh.connect(choose(&edges, a, x), choose(&edges, b, y)).unwrap();
                    }
                    MeshOp::Delete(a, x) => {
                        mesh.delete_edge(choose(&edges, a, x)).unwrap();
                    }
                }
                let check = mesh.check_mesh();
                prop_assert!(check.is_ok(), "{:?}", check);
            }
        }
    }
}
