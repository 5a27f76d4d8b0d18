// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Sweep-line computation of the planar arrangement.
//
// Vertices are processed left to right (vert_leq order). The edges crossing
// the sweep line are kept sorted bottom to top in the edge dictionary; each
// dictionary entry owns the region between its edge and the edge below.
// When the sweep is done, every face of the mesh is monotone and carries an
// `inside` flag computed from its winding number.
//
// Edges crossing the sweep line ("upper edges" of their regions) are directed
// right to left: `dst` has already been processed, `org` has not.

use log::{debug, trace};

use crate::bucketalloc::{BucketAlloc, Handle};
use crate::dict::{Dict, NodeIdx};
use crate::error::TessError;
use crate::geom::{edge_eval, edge_intersect, edge_sign, vert_eq, vert_l1_dist, vert_leq, Real, St};
use crate::mesh::{sym, EdgeIdx, Mesh, VertIdx, E_HEAD, F_HEAD, INVALID, V_HEAD};
use crate::priorityq::PriorityQ;
use crate::tess::{WindingRule, SENTINEL_COORD};

pub type RegionIdx = Handle;

/// The area between two adjacent edges crossing the sweep line.
#[derive(Clone, Debug)]
pub struct ActiveRegion {
    /// Upper edge, directed right to left.
    pub e_up: EdgeIdx,
    /// Dictionary node holding this region.
    pub node_up: NodeIdx,
    pub winding_number: i32,
    pub inside: bool,
    /// One of the two fake edges at t = ±SENTINEL_COORD.
    pub sentinel: bool,
    /// The upper or lower edge changed; ordering and intersections must be
    /// rechecked.
    pub dirty: bool,
    /// `e_up` is a temporary edge added for a vertex with no right-going
    /// edges; it is replaced as soon as a real edge is available.
    pub fix_upper_edge: bool,
}

/// Supplies payloads for vertices the sweep creates or merges.
pub trait VertexCombiner {
    /// Payload for a vertex at `coords` built from the payload slots in
    /// `sources`, blended with `weights` (same length, summing to 1). `None`
    /// when no resolver is available.
    fn combine(&mut self, coords: [Real; 3], sources: &[u32], weights: &[Real]) -> Option<u32>;
}

/// Queue entry: a vertex and its sweep position at insertion time.
#[derive(Clone, Copy, Debug)]
struct Event {
    st: St,
    vert: VertIdx,
}

fn event_leq(a: &Event, b: &Event) -> bool {
    vert_leq(a.st, b.st)
}

/// Ordering of two dictionary edges at the current event: true when `e1`
/// is at or below `e2`. Edges ending at the event are recognized by vertex
/// identity and ordered by slope.
fn edge_leq(mesh: &Mesh, event: VertIdx, e1: EdgeIdx, e2: EdgeIdx) -> bool {
    let ev = mesh.st(event);
    let (d1, d2) = (mesh.dst(e1), mesh.dst(e2));

    if d1 == event {
        if d2 == event {
            // Two edges right of the sweep line meeting at the event:
            // sort by slope.
            let (o1, o2) = (mesh.org_st(e1), mesh.org_st(e2));
            if vert_leq(o1, o2) {
                return edge_sign(mesh.st(d2), o1, o2) <= 0.0;
            }
            return edge_sign(mesh.st(d1), o2, o1) >= 0.0;
        }
        return edge_sign(mesh.st(d2), ev, mesh.org_st(e2)) <= 0.0;
    }
    if d2 == event {
        return edge_sign(mesh.st(d1), ev, mesh.org_st(e1)) >= 0.0;
    }

    let t1 = edge_eval(mesh.st(d1), ev, mesh.org_st(e1));
    let t2 = edge_eval(mesh.st(d2), ev, mesh.org_st(e2));
    t1 >= t2
}

struct Sweep<'a> {
    mesh: &'a mut Mesh,
    combiner: &'a mut dyn VertexCombiner,
    rule: WindingRule,
    dict: Dict<RegionIdx>,
    regions: BucketAlloc<ActiveRegion>,
    pq: PriorityQ<Event>,
    event: VertIdx,
}

/// Run the sweep over `mesh`.
///
/// On success every face is monotone with `inside` set per `rule`, and the
/// mesh passes `check_mesh`. Errors are fatal for the polygon.
pub fn compute_interior(
    mesh: &mut Mesh,
    rule: WindingRule,
    combiner: &mut dyn VertexCombiner,
) -> Result<(), TessError> {
    let mut sweep = Sweep {
        mesh,
        combiner,
        rule,
        dict: Dict::new(),
        regions: BucketAlloc::new(),
        pq: PriorityQ::new(0, event_leq),
        event: INVALID,
    };

    sweep.remove_degenerate_edges()?;
    sweep.init_priority_q()?;
    sweep.init_edge_dict()?;

    let mut events = 0usize;
    while let Some(ev) = sweep.pq.extract_min() {
        let v = ev.vert;
        sweep.mesh.verts[v as usize].pq_handle = None;

        // Coincident vertices are merged before the event is processed.
        while let Some(next) = sweep.pq.minimum() {
            if !vert_eq(next.st, ev.st) {
                break;
            }
            sweep.pq.extract_min();
            sweep.mesh.verts[next.vert as usize].pq_handle = None;
            let e1 = sweep.mesh.verts[v as usize].an_edge;
            let e2 = sweep.mesh.verts[next.vert as usize].an_edge;
            sweep.splice_merge_vertices(e1, e2)?;
        }

        sweep.sweep_event(v)?;
        events += 1;
    }

    sweep.done_edge_dict()?;
    sweep.remove_degenerate_faces()?;

    if let Err(err) = sweep.mesh.check_mesh() {
        debug!("mesh check failed after sweep: {}", err);
        return Err(TessError::Internal("mesh invariant violated by sweep"));
    }
    debug!(
        "sweep done: {} events, {} vertices, {} edges, {} faces",
        events,
        sweep.mesh.vertex_count(),
        sweep.mesh.edge_count(),
        sweep.mesh.face_count()
    );
    Ok(())
}

impl<'a> Sweep<'a> {
    // ─────── Region helpers ──────────────────────────────────────────────────

    fn region_above(&self, reg: RegionIdx) -> Option<RegionIdx> {
        self.dict.key(self.dict.succ(self.regions[reg].node_up))
    }

    fn region_below(&self, reg: RegionIdx) -> Option<RegionIdx> {
        self.dict.key(self.dict.pred(self.regions[reg].node_up))
    }

    fn above(&self, reg: RegionIdx) -> Result<RegionIdx, TessError> {
        self.region_above(reg)
            .ok_or(TessError::Internal("no region above"))
    }

    fn below(&self, reg: RegionIdx) -> Result<RegionIdx, TessError> {
        self.region_below(reg)
            .ok_or(TessError::Internal("no region below"))
    }

    fn e_up(&self, reg: RegionIdx) -> EdgeIdx {
        self.regions[reg].e_up
    }

    fn edge_region(&self, e: EdgeIdx) -> Result<RegionIdx, TessError> {
        self.mesh.edges[e as usize]
            .active_region
            .ok_or(TessError::Internal("edge is not in the dictionary"))
    }

    fn add_winding(&mut self, e_dst: EdgeIdx, e_src: EdgeIdx) {
        let w = self.mesh.edges[e_src as usize].winding;
        let w_sym = self.mesh.edges[sym(e_src) as usize].winding;
        self.mesh.edges[e_dst as usize].winding += w;
        self.mesh.edges[sym(e_dst) as usize].winding += w_sym;
    }

    /// Insert a region for `e_new_up` into the dictionary, searching down
    /// from `reg_above`. The winding number is left for the caller.
    fn add_region_below(&mut self, reg_above: RegionIdx, e_new_up: EdgeIdx) -> RegionIdx {
        let reg_new = self.regions.alloc(ActiveRegion {
            e_up: e_new_up,
            node_up: 0,
            winding_number: 0,
            inside: false,
            sentinel: false,
            dirty: false,
            fix_upper_edge: false,
        });

        let mesh: &Mesh = self.mesh;
        let regions = &self.regions;
        let event = self.event;
        let node = self.dict.insert_before(self.regions[reg_above].node_up, reg_new, |stored| {
            edge_leq(mesh, event, regions[stored].e_up, e_new_up)
        });

        self.regions[reg_new].node_up = node;
        self.mesh.edges[e_new_up as usize].active_region = Some(reg_new);
        reg_new
    }

    fn delete_region(&mut self, reg: RegionIdx) {
        let ActiveRegion { e_up, node_up, .. } = self.regions[reg];
        debug_assert!(!self.regions[reg].fix_upper_edge || self.mesh.edges[e_up as usize].winding == 0);
        self.mesh.edges[e_up as usize].active_region = None;
        self.dict.delete(node_up);
        self.regions.free(reg);
    }

    /// Replace a temporary upper edge with `new_edge`.
    fn fix_upper_edge(&mut self, reg: RegionIdx, new_edge: EdgeIdx) -> Result<(), TessError> {
        debug_assert!(self.regions[reg].fix_upper_edge);
        self.mesh.delete_edge(self.e_up(reg))?;
        let r = &mut self.regions[reg];
        r.fix_upper_edge = false;
        r.e_up = new_edge;
        self.mesh.edges[new_edge as usize].active_region = Some(reg);
        Ok(())
    }

    /// Region above the uppermost edge sharing `reg`'s origin. A temporary
    /// edge found there is fixed first.
    fn top_left_region(&mut self, mut reg: RegionIdx) -> Result<RegionIdx, TessError> {
        let org = self.mesh.org(self.e_up(reg));
        loop {
            reg = self.above(reg)?;
            if self.mesh.org(self.e_up(reg)) != org {
                break;
            }
        }

        if self.regions[reg].fix_upper_edge {
            let below = self.below(reg)?;
            let e = self
                .mesh
                .connect(sym(self.e_up(below)), self.mesh.lnext(self.e_up(reg)))?;
            self.fix_upper_edge(reg, e)?;
            reg = self.above(reg)?;
        }
        Ok(reg)
    }

    /// Region above the uppermost edge sharing `reg`'s destination.
    fn top_right_region(&self, mut reg: RegionIdx) -> Result<RegionIdx, TessError> {
        let dst = self.mesh.dst(self.e_up(reg));
        loop {
            reg = self.above(reg)?;
            if self.mesh.dst(self.e_up(reg)) != dst {
                return Ok(reg);
            }
        }
    }

    fn compute_winding(&mut self, reg: RegionIdx) -> Result<(), TessError> {
        let above = self.above(reg)?;
        let n = self.regions[above].winding_number + self.mesh.edges[self.e_up(reg) as usize].winding;
        let r = &mut self.regions[reg];
        r.winding_number = n;
        r.inside = self.rule.is_inside(n);
        Ok(())
    }

    /// Close a region: its left face gets the region's inside flag.
    fn finish_region(&mut self, reg: RegionIdx) {
        let e = self.e_up(reg);
        let f = self.mesh.lface(e);
        let face = &mut self.mesh.faces[f as usize];
        face.inside = self.regions[reg].inside;
        face.an_edge = e;
        self.delete_region(reg);
    }

    // ─────── Event processing ────────────────────────────────────────────────

    /// Finish the regions from `reg_first` down to (not including)
    /// `reg_last`, whose edges all end at the event. Returns the lowest
    /// left-going edge at the event.
    fn finish_left_regions(
        &mut self,
        reg_first: RegionIdx,
        reg_last: Option<RegionIdx>,
    ) -> Result<EdgeIdx, TessError> {
        let mut reg_prev = reg_first;
        let mut e_prev = self.e_up(reg_first);

        while Some(reg_prev) != reg_last {
            self.regions[reg_prev].fix_upper_edge = false;
            let reg = self.below(reg_prev)?;
            let mut e = self.e_up(reg);

            if self.mesh.org(e) != self.mesh.org(e_prev) {
                if !self.regions[reg].fix_upper_edge {
                    // Last left-going edge. Finish (not just delete) the
                    // region: the vertex may have more edges in the mesh.
                    self.finish_region(reg_prev);
                    break;
                }
                // The edge below is temporary; now it can be fixed.
                e = self.mesh.connect(self.mesh.lprev(e_prev), sym(e))?;
                self.fix_upper_edge(reg, e)?;
            }

            // Relink so that e_prev.onext == e.
            if self.mesh.onext(e_prev) != e {
                self.mesh.splice(self.mesh.oprev(e), e)?;
                self.mesh.splice(e_prev, e)?;
            }
            self.finish_region(reg_prev);
            e_prev = self.e_up(reg);
            reg_prev = reg;
        }
        Ok(e_prev)
    }

    /// Add the right-going edges `e_first .. e_last` (an onext range around
    /// the event) below `reg_up`, then walk every right-going edge at the
    /// event in dictionary order, fixing mesh order and winding numbers.
    /// `e_top_left` is the onext predecessor of the topmost new edge, if
    /// known.
    fn add_right_edges(
        &mut self,
        reg_up: RegionIdx,
        e_first: EdgeIdx,
        e_last: EdgeIdx,
        e_top_left: Option<EdgeIdx>,
        clean_up: bool,
    ) -> Result<(), TessError> {
        let mut e = e_first;
        loop {
            debug_assert!(vert_leq(self.mesh.org_st(e), self.mesh.dst_st(e)));
            self.add_region_below(reg_up, sym(e));
            e = self.mesh.onext(e);
            if e == e_last {
                break;
            }
        }

        let e_top_left = match e_top_left {
            Some(e) => e,
            None => {
                let below = self.below(reg_up)?;
                self.mesh.rprev(self.e_up(below))
            }
        };

        let mut reg_prev = reg_up;
        let mut e_prev = e_top_left;
        let mut first_time = true;
        loop {
            let reg = self.below(reg_prev)?;
            let e = sym(self.e_up(reg));
            if self.mesh.org(e) != self.mesh.org(e_prev) {
                break;
            }

            if self.mesh.onext(e) != e_prev {
                // Unlink e and relink it below e_prev.
                self.mesh.splice(self.mesh.oprev(e), e)?;
                self.mesh.splice(self.mesh.oprev(e_prev), e)?;
            }

            let n = self.regions[reg_prev].winding_number - self.mesh.edges[e as usize].winding;
            self.regions[reg].winding_number = n;
            self.regions[reg].inside = self.rule.is_inside(n);

            // Two outgoing edges with the same slope are merged before any
            // intersection test.
            self.regions[reg_prev].dirty = true;
            if !first_time && self.check_for_right_splice(reg_prev)? {
                self.add_winding(e, e_prev);
                self.delete_region(reg_prev);
                self.mesh.delete_edge(e_prev)?;
            }
            first_time = false;
            reg_prev = reg;
            e_prev = e;
        }
        self.regions[reg_prev].dirty = true;

        if clean_up {
            self.walk_dirty_regions(reg_prev)?;
        }
        Ok(())
    }

    /// Merge two coincident vertices, asking the combiner for the merged
    /// payload. Keeps `e1.org`'s payload when there is no resolver.
    fn splice_merge_vertices(&mut self, e1: EdgeIdx, e2: EdgeIdx) -> Result<(), TessError> {
        let v1 = self.mesh.org(e1);
        let v2 = self.mesh.org(e2);
        let sources = [self.mesh.verts[v1 as usize].data, self.mesh.verts[v2 as usize].data];
        let coords = self.mesh.verts[v1 as usize].coords;
        if let Some(data) = self.combiner.combine(coords, &sources, &[0.5, 0.5]) {
            self.mesh.verts[v1 as usize].data = data;
        }
        trace!("merging coincident vertices {} and {}", v1, v2);
        self.mesh.splice(e1, e2)
    }

    /// Weights of `org` and `dst` for a vertex at `isect` on the edge
    /// between them, totalling 0.5. Adds the weighted coordinates to
    /// `coords`.
    fn vertex_weights(&self, isect: St, org: VertIdx, dst: VertIdx, coords: &mut [Real; 3]) -> [Real; 2] {
        let t1 = vert_l1_dist(self.mesh.st(org), isect);
        let t2 = vert_l1_dist(self.mesh.st(dst), isect);
        let weights = if t1 + t2 > 0.0 {
            [0.5 * t2 / (t1 + t2), 0.5 * t1 / (t1 + t2)]
        } else {
            [0.25, 0.25]
        };
        let (oc, dc) = (self.mesh.verts[org as usize].coords, self.mesh.verts[dst as usize].coords);
        for i in 0..3 {
            coords[i] += weights[0] * oc[i] + weights[1] * dc[i];
        }
        weights
    }

    /// Coordinates and payload for a new intersection vertex. A payload is
    /// required, so a missing resolver is fatal.
    fn get_intersect_data(
        &mut self,
        isect: VertIdx,
        org_up: VertIdx,
        dst_up: VertIdx,
        org_lo: VertIdx,
        dst_lo: VertIdx,
    ) -> Result<(), TessError> {
        let at = self.mesh.st(isect);
        let mut coords = [0.0; 3];
        let [w0, w1] = self.vertex_weights(at, org_up, dst_up, &mut coords);
        let [w2, w3] = self.vertex_weights(at, org_lo, dst_lo, &mut coords);
        self.mesh.verts[isect as usize].coords = coords;

        let sources = [org_up, dst_up, org_lo, dst_lo].map(|v| self.mesh.verts[v as usize].data);
        match self.combiner.combine(coords, &sources, &[w0, w1, w2, w3]) {
            Some(data) => {
                self.mesh.verts[isect as usize].data = data;
                Ok(())
            }
            None => Err(TessError::NeedCombineCallback),
        }
    }

    /// Check the ordering of the upper and lower edges at their origins
    /// (right endpoints) and splice one origin into the other edge if they
    /// are out of order. Returns true if the mesh changed.
    fn check_for_right_splice(&mut self, reg_up: RegionIdx) -> Result<bool, TessError> {
        let reg_lo = self.below(reg_up)?;
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let m = &*self.mesh;

        if vert_leq(m.org_st(e_up), m.org_st(e_lo)) {
            if edge_sign(m.dst_st(e_lo), m.org_st(e_up), m.org_st(e_lo)) > 0.0 {
                return Ok(false);
            }

            // e_up.org appears to be below e_lo.
            if !vert_eq(m.org_st(e_up), m.org_st(e_lo)) {
                // Splice e_up.org into e_lo.
                self.mesh.split_edge(sym(e_lo))?;
                self.mesh.splice(e_up, self.mesh.oprev(e_lo))?;
                self.regions[reg_up].dirty = true;
                self.regions[reg_lo].dirty = true;
            } else if m.org(e_up) != m.org(e_lo) {
                // Merge the two vertices, discarding e_up.org.
                let org_up = self.mesh.org(e_up);
                if let Some(handle) = self.mesh.verts[org_up as usize].pq_handle.take() {
                    self.pq.delete(handle);
                }
                self.splice_merge_vertices(self.mesh.oprev(e_lo), e_up)?;
            }
        } else {
            if edge_sign(m.dst_st(e_up), m.org_st(e_lo), m.org_st(e_up)) < 0.0 {
                return Ok(false);
            }

            // e_lo.org appears to be above e_up; splice it into e_up.
            let above = self.above(reg_up)?;
            self.regions[above].dirty = true;
            self.regions[reg_up].dirty = true;
            self.mesh.split_edge(sym(e_up))?;
            self.mesh.splice(self.mesh.oprev(e_lo), e_up)?;
        }
        Ok(true)
    }

    /// Same check at the destinations (left endpoints), which have already
    /// been processed. Returns true if the mesh changed.
    fn check_for_left_splice(&mut self, reg_up: RegionIdx) -> Result<bool, TessError> {
        let reg_lo = self.below(reg_up)?;
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let m = &*self.mesh;
        debug_assert!(!vert_eq(m.dst_st(e_up), m.dst_st(e_lo)));

        if vert_leq(m.dst_st(e_up), m.dst_st(e_lo)) {
            if edge_sign(m.dst_st(e_up), m.dst_st(e_lo), m.org_st(e_up)) < 0.0 {
                return Ok(false);
            }

            // e_lo.dst is above e_up; splice it into e_up.
            let above = self.above(reg_up)?;
            self.regions[above].dirty = true;
            self.regions[reg_up].dirty = true;
            let e = self.mesh.split_edge(e_up)?;
            self.mesh.splice(sym(e_lo), e)?;
            let f = self.mesh.lface(e);
            self.mesh.faces[f as usize].inside = self.regions[reg_up].inside;
        } else {
            if edge_sign(m.dst_st(e_lo), m.dst_st(e_up), m.org_st(e_lo)) > 0.0 {
                return Ok(false);
            }

            // e_up.dst is below e_lo; splice it into e_lo.
            self.regions[reg_up].dirty = true;
            self.regions[reg_lo].dirty = true;
            let e = self.mesh.split_edge(e_lo)?;
            self.mesh.splice(self.mesh.lnext(e_up), sym(e_lo))?;
            let f = self.mesh.rface(e);
            self.mesh.faces[f as usize].inside = self.regions[reg_up].inside;
        }
        Ok(true)
    }

    /// Check whether the upper and lower edges of `reg_up` cross, and if so
    /// split both at the crossing. Returns true when the dirty-region walk
    /// has already been redone recursively.
    fn check_for_intersect(&mut self, mut reg_up: RegionIdx) -> Result<bool, TessError> {
        let mut reg_lo = self.below(reg_up)?;
        let e_up = self.e_up(reg_up);
        let mut e_lo = self.e_up(reg_lo);
        let m = &*self.mesh;
        let (org_up, org_lo) = (m.org(e_up), m.org(e_lo));
        let (dst_up, dst_lo) = (m.dst(e_up), m.dst(e_lo));
        let (o_up, o_lo) = (m.st(org_up), m.st(org_lo));
        let (d_up, d_lo) = (m.st(dst_up), m.st(dst_lo));
        let event = self.event;
        let ev = m.st(event);

        debug_assert!(!vert_eq(d_lo, d_up));
        debug_assert!(org_up != event && org_lo != event);
        debug_assert!(!self.regions[reg_up].fix_upper_edge && !self.regions[reg_lo].fix_upper_edge);

        if org_up == org_lo {
            // Right endpoints are the same.
            return Ok(false);
        }

        let t_min_up = o_up.t.min(d_up.t);
        let t_max_lo = o_lo.t.max(d_lo.t);
        if t_min_up > t_max_lo {
            // t ranges do not overlap.
            return Ok(false);
        }

        if vert_leq(o_up, o_lo) {
            if edge_sign(d_lo, o_up, o_lo) > 0.0 {
                return Ok(false);
            }
        } else if edge_sign(d_up, o_lo, o_up) < 0.0 {
            return Ok(false);
        }

        // The edges intersect, at least marginally.
        let mut isect = edge_intersect(d_up, o_up, d_lo, o_lo);
        trace!("edges {} and {} cross near ({}, {})", e_up, e_lo, isect.s, isect.t);

        if vert_leq(isect, ev) {
            // Slightly left of the sweep line: move it onto the event.
            isect = ev;
        }
        // Right of the leftmost origin is just as bad; clamp there.
        let o_min = if vert_leq(o_up, o_lo) { o_up } else { o_lo };
        if vert_leq(o_min, isect) {
            isect = o_min;
        }

        if vert_eq(isect, o_up) || vert_eq(isect, o_lo) {
            // Intersection at one of the right endpoints.
            self.check_for_right_splice(reg_up)?;
            return Ok(false);
        }

        let up_wrong_side = dst_up != event && edge_sign(d_up, ev, isect) >= 0.0;
        let lo_wrong_side = dst_lo != event && edge_sign(d_lo, ev, isect) <= 0.0;
        if up_wrong_side || lo_wrong_side {
            // The new upper or lower edge would pass on the wrong side of
            // the event, or through it. Only happens through rounding.
            if dst_lo == event {
                // Splice dst_lo into e_up and process the new regions.
                self.mesh.split_edge(sym(e_up))?;
                self.mesh.splice(sym(e_lo), e_up)?;
                reg_up = self.top_left_region(reg_up)?;
                let below = self.below(reg_up)?;
                let e = self.e_up(below);
                self.finish_left_regions(below, Some(reg_lo))?;
                self.add_right_edges(reg_up, self.mesh.oprev(e), e, Some(e), true)?;
                return Ok(true);
            }
            if dst_up == event {
                // Splice dst_up into e_lo and process the new regions.
                self.mesh.split_edge(sym(e_lo))?;
                self.mesh.splice(self.mesh.lnext(e_up), self.mesh.oprev(e_lo))?;
                reg_lo = reg_up;
                reg_up = self.top_right_region(reg_up)?;
                let below = self.below(reg_up)?;
                let e = self.mesh.rprev(self.e_up(below));
                self.regions[reg_lo].e_up = self.mesh.oprev(e_lo);
                e_lo = self.finish_left_regions(reg_lo, None)?;
                let e_first = self.mesh.onext(e_lo);
                let e_last = self.mesh.rprev(e_up);
                self.add_right_edges(reg_up, e_first, e_last, Some(e), true)?;
                return Ok(true);
            }

            // Called from connect_right_vertex: split whichever edge passes
            // on the wrong side and leave the splicing to the caller.
            if edge_sign(d_up, ev, isect) >= 0.0 {
                let above = self.above(reg_up)?;
                self.regions[above].dirty = true;
                self.regions[reg_up].dirty = true;
                self.mesh.split_edge(sym(e_up))?;
                let org = self.mesh.org(e_up) as usize;
                self.mesh.verts[org].s = ev.s;
                self.mesh.verts[org].t = ev.t;
            }
            if edge_sign(d_lo, ev, isect) <= 0.0 {
                self.regions[reg_up].dirty = true;
                self.regions[reg_lo].dirty = true;
                self.mesh.split_edge(sym(e_lo))?;
                let org = self.mesh.org(e_lo) as usize;
                self.mesh.verts[org].s = ev.s;
                self.mesh.verts[org].t = ev.t;
            }
            return Ok(false);
        }

        // General case: split both edges and splice them at a new vertex.
        // Splicing e_lo's remainder into e_up keeps the face walks short.
        self.mesh.split_edge(sym(e_up))?;
        self.mesh.split_edge(sym(e_lo))?;
        self.mesh.splice(self.mesh.oprev(e_lo), e_up)?;
        let v = self.mesh.org(e_up);
        self.mesh.verts[v as usize].s = isect.s;
        self.mesh.verts[v as usize].t = isect.t;
        let handle = self.pq.insert(Event { st: isect, vert: v });
        self.mesh.verts[v as usize].pq_handle = Some(handle);
        self.get_intersect_data(v, org_up, dst_up, org_lo, dst_lo)?;

        let above = self.above(reg_up)?;
        self.regions[above].dirty = true;
        self.regions[reg_up].dirty = true;
        self.regions[reg_lo].dirty = true;
        Ok(false)
    }

    /// Recheck every dirty region, from the bottom up, until the dictionary
    /// is consistent with the mesh again.
    fn walk_dirty_regions(&mut self, mut reg_up: RegionIdx) -> Result<(), TessError> {
        let mut reg_lo = self.below(reg_up)?;

        loop {
            // Find the lowest dirty region.
            while self.regions[reg_lo].dirty {
                reg_up = reg_lo;
                reg_lo = self.below(reg_lo)?;
            }
            if !self.regions[reg_up].dirty {
                reg_lo = reg_up;
                match self.region_above(reg_up) {
                    Some(r) if self.regions[r].dirty => reg_up = r,
                    _ => return Ok(()),
                }
            }
            self.regions[reg_up].dirty = false;
            let mut e_up = self.e_up(reg_up);
            let mut e_lo = self.e_up(reg_lo);

            if self.mesh.dst(e_up) != self.mesh.dst(e_lo) && self.check_for_left_splice(reg_up)? {
                // Temporary edges are no longer needed once a real edge
                // reaches their vertex.
                if self.regions[reg_lo].fix_upper_edge {
                    self.delete_region(reg_lo);
                    self.mesh.delete_edge(e_lo)?;
                    reg_lo = self.below(reg_up)?;
                    e_lo = self.e_up(reg_lo);
                } else if self.regions[reg_up].fix_upper_edge {
                    self.delete_region(reg_up);
                    self.mesh.delete_edge(e_up)?;
                    reg_up = self.above(reg_lo)?;
                    e_up = self.e_up(reg_up);
                }
            }

            if self.mesh.org(e_up) != self.mesh.org(e_lo) {
                let dst_up = self.mesh.dst(e_up);
                let dst_lo = self.mesh.dst(e_lo);
                if dst_up != dst_lo
                    && !self.regions[reg_up].fix_upper_edge
                    && !self.regions[reg_lo].fix_upper_edge
                    && (dst_up == self.event || dst_lo == self.event)
                {
                    // check_for_intersect may fall back to using the event
                    // as the crossing, so the event must lie between the two
                    // edges and neither may be temporary.
                    if self.check_for_intersect(reg_up)? {
                        return Ok(());
                    }
                } else {
                    // The origins may still violate the ordering.
                    self.check_for_right_splice(reg_up)?;
                }
            }

            if self.mesh.org(e_up) == self.mesh.org(e_lo) && self.mesh.dst(e_up) == self.mesh.dst(e_lo) {
                // A two-edge loop; drop the upper edge.
                self.add_winding(e_lo, e_up);
                self.delete_region(reg_up);
                self.mesh.delete_edge(e_up)?;
                reg_up = self.above(reg_lo)?;
            }
        }
    }

    /// The event has no right-going edges. Connect it to the closer of the
    /// two origins bounding its region with a temporary edge, so the region
    /// below it stays monotone.
    fn connect_right_vertex(&mut self, mut reg_up: RegionIdx, mut e_bottom_left: EdgeIdx) -> Result<(), TessError> {
        let mut e_top_left = self.mesh.onext(e_bottom_left);
        let reg_lo = self.below(reg_up)?;
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let mut degenerate = false;

        if self.mesh.dst(e_up) != self.mesh.dst(e_lo) {
            self.check_for_intersect(reg_up)?;
        }

        // The upper or lower edge may now pass through the event.
        let ev = self.mesh.st(self.event);
        if vert_eq(self.mesh.org_st(e_up), ev) {
            self.mesh.splice(self.mesh.oprev(e_top_left), e_up)?;
            reg_up = self.top_left_region(reg_up)?;
            let below = self.below(reg_up)?;
            e_top_left = self.e_up(below);
            self.finish_left_regions(below, Some(reg_lo))?;
            degenerate = true;
        }
        if vert_eq(self.mesh.org_st(e_lo), ev) {
            self.mesh.splice(e_bottom_left, self.mesh.oprev(e_lo))?;
            e_bottom_left = self.finish_left_regions(reg_lo, None)?;
            degenerate = true;
        }
        if degenerate {
            let e_first = self.mesh.onext(e_bottom_left);
            return self.add_right_edges(reg_up, e_first, e_top_left, Some(e_top_left), true);
        }

        let target = if vert_leq(self.mesh.org_st(e_lo), self.mesh.org_st(e_up)) {
            self.mesh.oprev(e_lo)
        } else {
            e_up
        };
        let e_new = self.mesh.connect(self.mesh.lprev(e_bottom_left), target)?;

        // No cleanup yet: e_new must be marked temporary before anything
        // can delete it.
        let e_next = self.mesh.onext(e_new);
        self.add_right_edges(reg_up, e_new, e_next, Some(e_next), false)?;
        let reg_new = self.edge_region(sym(e_new))?;
        self.regions[reg_new].fix_upper_edge = true;
        self.walk_dirty_regions(reg_up)
    }

    /// The event lies on the upper edge of `reg_up` (it was not merged when
    /// extracted because that edge's endpoints differ from it).
    fn connect_left_degenerate(&mut self, mut reg_up: RegionIdx, v_event: VertIdx) -> Result<(), TessError> {
        let e = self.e_up(reg_up);
        let ev = self.mesh.st(v_event);

        if vert_eq(self.mesh.org_st(e), ev) {
            // e.org is still unprocessed: merge and wait for it.
            let an_edge = self.mesh.verts[v_event as usize].an_edge;
            return self.splice_merge_vertices(e, an_edge);
        }

        if !vert_eq(self.mesh.dst_st(e), ev) {
            // Splice the event into the edge passing through it.
            self.mesh.split_edge(sym(e))?;
            if self.regions[reg_up].fix_upper_edge {
                // Drop the unused part of the temporary edge.
                self.mesh.delete_edge(self.mesh.onext(e))?;
                self.regions[reg_up].fix_upper_edge = false;
            }
            let an_edge = self.mesh.verts[v_event as usize].an_edge;
            self.mesh.splice(an_edge, e)?;
            return self.sweep_event(v_event);
        }

        // The event coincides with e.dst, which was already processed.
        // Splice in the additional right-going edges.
        reg_up = self.top_right_region(reg_up)?;
        let reg = self.below(reg_up)?;
        let mut e_top_right = sym(self.e_up(reg));
        let e_last = self.mesh.onext(e_top_right);
        let mut e_top_left = Some(e_last);
        if self.regions[reg].fix_upper_edge {
            // Its only right-going edge was temporary; real ones replace it.
            self.delete_region(reg);
            self.mesh.delete_edge(e_top_right)?;
            e_top_right = self.mesh.oprev(e_last);
        }
        let an_edge = self.mesh.verts[v_event as usize].an_edge;
        self.mesh.splice(an_edge, e_top_right)?;
        if !self.mesh.edge_goes_left(e_last) {
            // e.dst had no left-going edges.
            e_top_left = None;
        }
        let e_first = self.mesh.onext(e_top_right);
        self.add_right_edges(reg_up, e_first, e_last, e_top_left, true)
    }

    /// The event has no processed neighbours: all its edges go right. Find
    /// the region containing it and connect it to the mesh if that region is
    /// inside (or bounded by a temporary edge).
    fn connect_left_vertex(&mut self, v_event: VertIdx) -> Result<(), TessError> {
        let an_edge = self.mesh.verts[v_event as usize].an_edge;
        let probe = sym(an_edge);

        let mesh: &Mesh = self.mesh;
        let regions = &self.regions;
        let event = self.event;
        let node = self
            .dict
            .search(|stored| edge_leq(mesh, event, probe, regions[stored].e_up));
        let reg_up = self
            .dict
            .key(node)
            .ok_or(TessError::Internal("event lies above every dictionary edge"))?;
        let reg_lo = self.below(reg_up)?;
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);

        // Try merging with the upper edge first.
        if edge_sign(self.mesh.dst_st(e_up), self.mesh.st(v_event), self.mesh.org_st(e_up)) == 0.0 {
            return self.connect_left_degenerate(reg_up, v_event);
        }

        // Connect to the closer of e_lo.dst and e_up.dst.
        let reg = if vert_leq(self.mesh.dst_st(e_lo), self.mesh.dst_st(e_up)) {
            reg_up
        } else {
            reg_lo
        };

        if self.regions[reg_up].inside || self.regions[reg].fix_upper_edge {
            let e_new = if reg == reg_up {
                self.mesh.connect(sym(an_edge), self.mesh.lnext(e_up))?
            } else {
                sym(self.mesh.connect(self.mesh.dnext(e_lo), an_edge)?)
            };
            if self.regions[reg].fix_upper_edge {
                self.fix_upper_edge(reg, e_new)?;
            } else {
                let reg_new = self.add_region_below(reg_up, e_new);
                self.compute_winding(reg_new)?;
            }
            self.sweep_event(v_event)
        } else {
            // Outside the polygon: no need to connect it to anything.
            self.add_right_edges(reg_up, an_edge, an_edge, None, true)
        }
    }

    /// Process one vertex of the sweep.
    fn sweep_event(&mut self, v_event: VertIdx) -> Result<(), TessError> {
        self.event = v_event;
        let ev = self.mesh.st(v_event);
        trace!("sweep event {} at ({}, {})", v_event, ev.s, ev.t);

        // Is the event the right endpoint of an edge already in the
        // dictionary? Then no search is needed.
        let start = self.mesh.verts[v_event as usize].an_edge;
        let mut e = start;
        while self.mesh.edges[e as usize].active_region.is_none() {
            e = self.mesh.onext(e);
            if e == start {
                // Every edge goes right.
                return self.connect_left_vertex(v_event);
            }
        }

        // First finish the regions closed off by the event, then add the
        // right-going edges.
        let reg_up = self.top_left_region(self.edge_region(e)?)?;
        let reg = self.below(reg_up)?;
        let e_top_left = self.e_up(reg);
        let e_bottom_left = self.finish_left_regions(reg, None)?;

        if self.mesh.onext(e_bottom_left) == e_top_left {
            // No right-going edges: add a temporary one.
            self.connect_right_vertex(reg_up, e_bottom_left)
        } else {
            let e_first = self.mesh.onext(e_bottom_left);
            self.add_right_edges(reg_up, e_first, e_top_left, Some(e_top_left), true)
        }
    }

    // ─────── Setup and teardown ──────────────────────────────────────────────

    /// Remove zero-length edges and contours with fewer than three edges.
    fn remove_degenerate_edges(&mut self) -> Result<(), TessError> {
        let mut e = self.mesh.edges[E_HEAD as usize].next;
        while e != E_HEAD {
            let mut e_next = self.mesh.edges[e as usize].next;
            let mut e_lnext = self.mesh.lnext(e);

            if vert_eq(self.mesh.org_st(e), self.mesh.dst_st(e)) && self.mesh.lnext(e_lnext) != e {
                // Zero-length edge in a contour of at least three edges.
                self.splice_merge_vertices(e_lnext, e)?;
                self.mesh.delete_edge(e)?;
                e = e_lnext;
                e_lnext = self.mesh.lnext(e);
            }
            if self.mesh.lnext(e_lnext) == e {
                // A contour of one or two edges.
                if e_lnext != e {
                    if e_lnext == e_next || e_lnext == sym(e_next) {
                        e_next = self.mesh.edges[e_next as usize].next;
                    }
                    self.mesh.delete_edge(e_lnext)?;
                }
                if e == e_next || e == sym(e_next) {
                    e_next = self.mesh.edges[e_next as usize].next;
                }
                self.mesh.delete_edge(e)?;
            }
            e = e_next;
        }
        Ok(())
    }

    fn init_priority_q(&mut self) -> Result<(), TessError> {
        let mut v = self.mesh.verts[V_HEAD as usize].next;
        while v != V_HEAD {
            let st = self.mesh.st(v);
            let handle = self.pq.insert(Event { st, vert: v });
            self.mesh.verts[v as usize].pq_handle = Some(handle);
            v = self.mesh.verts[v as usize].next;
        }
        self.pq.init();
        Ok(())
    }

    /// A horizontal edge at height `t` spanning the whole plane.
    fn add_sentinel(&mut self, t: Real) -> Result<(), TessError> {
        let e = self.mesh.make_edge()?;
        let (org, dst) = (self.mesh.org(e), self.mesh.dst(e));
        self.mesh.verts[org as usize].s = SENTINEL_COORD;
        self.mesh.verts[org as usize].t = t;
        self.mesh.verts[dst as usize].s = -SENTINEL_COORD;
        self.mesh.verts[dst as usize].t = t;
        self.event = dst;

        let reg = self.regions.alloc(ActiveRegion {
            e_up: e,
            node_up: 0,
            winding_number: 0,
            inside: false,
            sentinel: true,
            dirty: false,
            fix_upper_edge: false,
        });
        let mesh: &Mesh = self.mesh;
        let regions = &self.regions;
        let event = self.event;
        let node = self
            .dict
            .insert(reg, |stored| edge_leq(mesh, event, regions[stored].e_up, e));
        self.regions[reg].node_up = node;
        Ok(())
    }

    fn init_edge_dict(&mut self) -> Result<(), TessError> {
        self.add_sentinel(-SENTINEL_COORD)?;
        self.add_sentinel(SENTINEL_COORD)
    }

    /// Only the two sentinels and at most one temporary edge remain.
    fn done_edge_dict(&mut self) -> Result<(), TessError> {
        let mut fixed_edges = 0;
        while let Some(reg) = self.dict.key(self.dict.min()) {
            let r = &self.regions[reg];
            if !r.sentinel {
                if !r.fix_upper_edge {
                    return Err(TessError::Internal("real edge left in the dictionary"));
                }
                fixed_edges += 1;
            }
            debug_assert!(fixed_edges <= 1 && r.winding_number == 0);
            self.delete_region(reg);
        }
        Ok(())
    }

    /// Delete faces bounded by only two edges, folding their windings into
    /// the neighbour.
    fn remove_degenerate_faces(&mut self) -> Result<(), TessError> {
        let mut f = self.mesh.faces[F_HEAD as usize].next;
        while f != F_HEAD {
            let f_next = self.mesh.faces[f as usize].next;
            let e = self.mesh.faces[f as usize].an_edge;
            if self.mesh.lnext(self.mesh.lnext(e)) == e {
                let onext = self.mesh.onext(e);
                self.add_winding(onext, e);
                self.mesh.delete_edge(e)?;
            }
            f = f_next;
        }
        Ok(())
    }
}
