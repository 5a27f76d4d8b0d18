// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Geometric predicates over projected (s, t) coordinates.
//
// Every ordering and orientation decision made by the sweep goes through
// these functions so that ties are broken the same way everywhere. The
// transposed variants swap the roles of s and t.

pub type Real = f64;

/// A point in the sweep plane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct St {
    pub s: Real,
    pub t: Real,
}

impl St {
    #[inline]
    pub fn new(s: Real, t: Real) -> Self {
        St { s, t }
    }

    /// The same point with s and t exchanged.
    #[inline]
    pub fn transposed(self) -> Self {
        St { s: self.t, t: self.s }
    }
}

/// Lexicographic order: s first, then t.
#[inline]
pub fn vert_leq(u: St, v: St) -> bool {
    u.s < v.s || (u.s == v.s && u.t <= v.t)
}

#[inline]
pub fn vert_eq(u: St, v: St) -> bool {
    u.s == v.s && u.t == v.t
}

/// Lexicographic order with t primary.
#[inline]
pub fn trans_leq(u: St, v: St) -> bool {
    u.t < v.t || (u.t == v.t && u.s <= v.s)
}

/// Given `u <= v <= w` under `vert_leq`, evaluates the t-coordinate of edge
/// uw at v.s and returns `v.t - uw(v.s)`. Zero when uw is vertical.
///
/// The result is computed relative to whichever endpoint is closer to v, so
/// it stays bounded by the endpoint values even when v nearly coincides with
/// u or w.
pub fn edge_eval(u: St, v: St, w: St) -> Real {
    let gap_l = v.s - u.s;
    let gap_r = w.s - v.s;
    if gap_l + gap_r > 0.0 {
        if gap_l < gap_r {
            (v.t - u.t) + (u.t - w.t) * (gap_l / (gap_l + gap_r))
        } else {
            (v.t - w.t) + (w.t - u.t) * (gap_r / (gap_l + gap_r))
        }
    } else {
        0.0
    }
}

/// Same sign as `edge_eval(u, v, w)` without the division.
pub fn edge_sign(u: St, v: St, w: St) -> Real {
    let gap_l = v.s - u.s;
    let gap_r = w.s - v.s;
    if gap_l + gap_r > 0.0 {
        (v.t - w.t) * gap_l + (v.t - u.t) * gap_r
    } else {
        0.0
    }
}

/// `edge_eval` with s and t exchanged; requires `u <= v <= w` under `trans_leq`.
#[inline]
pub fn trans_eval(u: St, v: St, w: St) -> Real {
    edge_eval(u.transposed(), v.transposed(), w.transposed())
}

/// `edge_sign` with s and t exchanged.
#[inline]
pub fn trans_sign(u: St, v: St, w: St) -> Real {
    edge_sign(u.transposed(), v.transposed(), w.transposed())
}

/// True when (u, v, w) turn counter-clockwise or are collinear.
#[inline]
pub fn vert_ccw(u: St, v: St, w: St) -> bool {
    u.s * (v.t - w.t) + v.s * (w.t - u.t) + w.s * (u.t - v.t) >= 0.0
}

#[inline]
pub fn vert_l1_dist(u: St, v: St) -> Real {
    (u.s - v.s).abs() + (u.t - v.t).abs()
}

/// `(b*x + a*y) / (a + b)` with negative weights clamped to zero, and the
/// midpoint when both weights are zero. The result always lies between x
/// and y.
pub fn interpolate(a: Real, x: Real, b: Real, y: Real) -> Real {
    let a = if a < 0.0 { 0.0 } else { a };
    let b = if b < 0.0 { 0.0 } else { b };
    if a <= b {
        if b == 0.0 {
            x / 2.0 + y / 2.0
        } else {
            x + (y - x) * (a / (a + b))
        }
    } else {
        y + (x - y) * (b / (a + b))
    }
}

/// One ordering of the plane, with the evaluators and the leading
/// coordinate that go with it.
struct Order {
    leq: fn(St, St) -> bool,
    eval: fn(St, St, St) -> Real,
    sign: fn(St, St, St) -> Real,
    coord: fn(St) -> Real,
}

fn s_of(p: St) -> Real {
    p.s
}

fn t_of(p: St) -> Real {
    p.t
}

const BY_S: Order = Order {
    leq: vert_leq,
    eval: edge_eval,
    sign: edge_sign,
    coord: s_of,
};

const BY_T: Order = Order {
    leq: trans_leq,
    eval: trans_eval,
    sign: trans_sign,
    coord: t_of,
};

/// Leading coordinate of the crossing of (o1, d1) and (o2, d2) under
/// `order`: sort the four endpoints, then interpolate between the two
/// middle ones.
fn intersect_coord(order: &Order, mut o1: St, mut d1: St, mut o2: St, mut d2: St) -> Real {
    let leq = order.leq;
    let at = order.coord;
    if !leq(o1, d1) {
        std::mem::swap(&mut o1, &mut d1);
    }
    if !leq(o2, d2) {
        std::mem::swap(&mut o2, &mut d2);
    }
    if !leq(o1, o2) {
        std::mem::swap(&mut o1, &mut o2);
        std::mem::swap(&mut d1, &mut d2);
    }

    if !leq(o2, d1) {
        // No overlap; the midpoint of the gap is the best we can do.
        (at(o2) + at(d1)) / 2.0
    } else if leq(d1, d2) {
        let mut z1 = (order.eval)(o1, o2, d1);
        let mut z2 = (order.eval)(o2, d1, d2);
        if z1 + z2 < 0.0 {
            z1 = -z1;
            z2 = -z2;
        }
        interpolate(z1, at(o2), z2, at(d1))
    } else {
        let mut z1 = (order.sign)(o1, o2, d1);
        let mut z2 = -(order.sign)(o1, d2, d1);
        if z1 + z2 < 0.0 {
            z1 = -z1;
            z2 = -z2;
        }
        interpolate(z1, at(o2), z2, at(d2))
    }
}

/// Intersection of edges (o1, d1) and (o2, d2).
///
/// s is found under `vert_leq` and t under `trans_leq`, each by
/// interpolating between the middle two endpoints. The result lies in the
/// bounding rectangle of each edge even when the edges are nearly parallel
/// or do not actually cross.
pub fn edge_intersect(o1: St, d1: St, o2: St, d2: St) -> St {
    St {
        s: intersect_coord(&BY_S, o1, d1, o2, d2),
        t: intersect_coord(&BY_T, o1, d1, o2, d2),
    }
}
