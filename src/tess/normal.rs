// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Plane normal estimation and projection of the input onto the sweep plane.

use crate::geom::Real;
use crate::mesh::{Mesh, F_HEAD, V_HEAD};
use crate::tess::MAX_COORD;

#[inline]
pub(crate) fn dot(u: &[Real; 3], v: &[Real; 3]) -> Real {
    u[0] * v[0] + u[1] * v[1] + u[2] * v[2]
}

#[inline]
pub(crate) fn cross(u: &[Real; 3], v: &[Real; 3]) -> [Real; 3] {
    [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ]
}

#[inline]
fn sub(u: &[Real; 3], v: &[Real; 3]) -> [Real; 3] {
    [u[0] - v[0], u[1] - v[1], u[2] - v[2]]
}

/// Index of the component with the largest magnitude.
pub(crate) fn long_axis(v: &[Real; 3]) -> usize {
    let mut i = 0;
    if v[1].abs() > v[0].abs() {
        i = 1;
    }
    if v[2].abs() > v[i].abs() {
        i = 2;
    }
    i
}

/// Index of the component with the smallest magnitude.
pub(crate) fn short_axis(v: &[Real; 3]) -> usize {
    let mut i = 0;
    if v[1].abs() < v[0].abs() {
        i = 1;
    }
    if v[2].abs() < v[i].abs() {
        i = 2;
    }
    i
}

/// Estimate the plane normal of the mesh vertices.
///
/// Takes the two vertices furthest apart along the axis of largest extent,
/// then the third vertex giving the largest triangle with them. Collinear
/// input gets a normal along the short axis of that line; input with no
/// extent at all gets +z.
pub(crate) fn compute_normal(mesh: &Mesh) -> [Real; 3] {
    let mut max_val = [-2.0 * MAX_COORD; 3];
    let mut min_val = [2.0 * MAX_COORD; 3];
    let mut max_vert = [V_HEAD; 3];
    let mut min_vert = [V_HEAD; 3];

    let mut v = mesh.verts[V_HEAD as usize].next;
    while v != V_HEAD {
        let c = mesh.verts[v as usize].coords;
        for i in 0..3 {
            if c[i] < min_val[i] {
                min_val[i] = c[i];
                min_vert[i] = v;
            }
            if c[i] > max_val[i] {
                max_val[i] = c[i];
                max_vert[i] = v;
            }
        }
        v = mesh.verts[v as usize].next;
    }

    let mut i = 0;
    if max_val[1] - min_val[1] > max_val[0] - min_val[0] {
        i = 1;
    }
    if max_val[2] - min_val[2] > max_val[i] - min_val[i] {
        i = 2;
    }
    if min_val[i] >= max_val[i] {
        return [0.0, 0.0, 1.0];
    }

    let c2 = mesh.verts[max_vert[i] as usize].coords;
    let d1 = sub(&mesh.verts[min_vert[i] as usize].coords, &c2);
    let mut norm = [0.0; 3];
    let mut max_len2 = 0.0;

    let mut v = mesh.verts[V_HEAD as usize].next;
    while v != V_HEAD {
        let d2 = sub(&mesh.verts[v as usize].coords, &c2);
        let n = cross(&d1, &d2);
        let len2 = dot(&n, &n);
        if len2 > max_len2 {
            max_len2 = len2;
            norm = n;
        }
        v = mesh.verts[v as usize].next;
    }

    if max_len2 <= 0.0 {
        norm = [0.0; 3];
        norm[short_axis(&d1)] = 1.0;
    }
    norm
}

/// Flip t if the contours are, in total, clockwise in (s, t). Only edges
/// with positive winding are summed so each contour counts once.
fn check_orientation(mesh: &mut Mesh) -> bool {
    let mut area = 0.0;
    let mut f = mesh.faces[F_HEAD as usize].next;
    while f != F_HEAD {
        let start = mesh.faces[f as usize].an_edge;
        if mesh.edges[start as usize].winding > 0 {
            let mut e = start;
            loop {
                let (o, d) = (mesh.org_st(e), mesh.dst_st(e));
                area += (o.s - d.s) * (o.t + d.t);
                e = mesh.lnext(e);
                if e == start {
                    break;
                }
            }
        }
        f = mesh.faces[f as usize].next;
    }

    if area < 0.0 {
        let mut v = mesh.verts[V_HEAD as usize].next;
        while v != V_HEAD {
            mesh.verts[v as usize].t = -mesh.verts[v as usize].t;
            v = mesh.verts[v as usize].next;
        }
        return true;
    }
    false
}

/// Project every vertex onto the plane perpendicular to `normal` (or to the
/// estimated normal when `normal` is all zeros), dropping its long axis.
/// Returns the normal used.
pub(crate) fn project_polygon(mesh: &mut Mesh, normal: [Real; 3]) -> [Real; 3] {
    let computed = normal == [0.0; 3];
    let norm = if computed { compute_normal(mesh) } else { normal };

    let i = long_axis(&norm);
    let mut s_unit = [0.0; 3];
    let mut t_unit = [0.0; 3];
    s_unit[(i + 1) % 3] = 1.0;
    t_unit[(i + 2) % 3] = if norm[i] > 0.0 { 1.0 } else { -1.0 };

    let mut v = mesh.verts[V_HEAD as usize].next;
    while v != V_HEAD {
        let c = mesh.verts[v as usize].coords;
        mesh.verts[v as usize].s = dot(&c, &s_unit);
        mesh.verts[v as usize].t = dot(&c, &t_unit);
        v = mesh.verts[v as usize].next;
    }

    if computed && check_orientation(mesh) {
        return [-norm[0], -norm[1], -norm[2]];
    }
    norm
}
