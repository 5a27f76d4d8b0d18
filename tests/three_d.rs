// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Tests for 3D coordinate input, normal estimation and supplied normals.

mod helpers;

use glutess::{Real, Tessellator, WindingRule};
use helpers::{Output, Point, Shared};

fn tessellate_3d(contours: &[&[Point]], configure: impl FnOnce(&mut Tessellator<'_, Point>)) -> Output {
    helpers::init_logging();
    let out = Shared::default();
    {
        let mut tess = helpers::recorder(&out, true);
        configure(&mut tess);
        tess.begin_polygon(());
        for contour in contours {
            tess.begin_contour();
            for p in contour.iter() {
                tess.add_vertex(*p, *p);
            }
            tess.end_contour();
        }
        tess.end_polygon();
    }
    let result = out.borrow().clone();
    result
}

fn sub(a: &Point, b: &Point) -> Point {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: &Point, b: &Point) -> Point {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: &Point, b: &Point) -> Real {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn triangle_normal(t: &[Point; 3]) -> Point {
    cross(&sub(&t[1], &t[0]), &sub(&t[2], &t[0]))
}

fn area_3d(out: &Output) -> Real {
    out.triangles()
        .iter()
        .map(|t| 0.5 * dot(&triangle_normal(t), &triangle_normal(t)).sqrt())
        .sum()
}

/// Lift 2-D points onto a plane through the origin spanned by `u` and `v`.
fn lift(pts: &[[Real; 2]], u: Point, v: Point) -> Vec<Point> {
    pts.iter()
        .map(|p| {
            [
                p[0] * u[0] + p[1] * v[0],
                p[0] * u[1] + p[1] * v[1],
                p[0] * u[2] + p[1] * v[2],
            ]
        })
        .collect()
}

const OUTER: [[Real; 2]; 4] = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
const HOLE: [[Real; 2]; 4] = [[1.0, 1.0], [1.0, 3.0], [3.0, 3.0], [3.0, 1.0]];

#[test]
fn xy_plane_matches_2d() {
    let square = lift(&OUTER, [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
    let out = tessellate_3d(&[&square], |_| {});
    assert_eq!(out.triangles().len(), 2);
    assert!((area_3d(&out) - 16.0).abs() < 1e-9);
}

#[test]
fn xz_plane_quad() {
    let square = lift(&OUTER, [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
    let out = tessellate_3d(&[&square], |_| {});
    assert!(out.errors.is_empty());
    assert_eq!(out.triangles().len(), 2);
    assert!((area_3d(&out) - 16.0).abs() < 1e-9);
    // Input positions come back unchanged, y included.
    for t in out.triangles() {
        for v in t {
            assert_eq!(v[1], 0.0);
        }
    }
}

#[test]
fn yz_plane_with_hole() {
    let (u, v) = ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
    let outer = lift(&OUTER, u, v);
    let hole = lift(&HOLE, u, v);
    let out = tessellate_3d(&[&outer, &hole], |_| {});
    assert!(out.errors.is_empty());
    assert_eq!(out.triangles().len(), 8);
    assert!((area_3d(&out) - 12.0).abs() < 1e-9);
}

#[test]
fn tilted_plane_with_hole() {
    // The plane z = x, seen at 45 degrees.
    let (u, v) = ([1.0, 0.0, 1.0], [0.0, 1.0, 0.0]);
    let outer = lift(&OUTER, u, v);
    let hole = lift(&HOLE, u, v);
    let out = tessellate_3d(&[&outer, &hole], |_| {});
    assert!(out.errors.is_empty());
    assert_eq!(out.triangles().len(), 8);
    let expected = 12.0 * Real::sqrt(2.0);
    assert!((area_3d(&out) - expected).abs() < 1e-9, "area {}", area_3d(&out));
    for t in out.triangles() {
        for p in t {
            assert!((p[2] - p[0]).abs() < 1e-12, "{:?} off the plane", p);
        }
    }
}

#[test]
fn oblique_plane_triangles_share_one_orientation() {
    let (u, v) = ([1.0, 2.0, 0.5], [-0.5, 0.25, 1.0]);
    let arrow = lift(&[[0.0, 0.0], [4.0, 2.0], [0.0, 4.0], [1.0, 2.0]], u, v);
    let out = tessellate_3d(&[&arrow], |_| {});
    assert!(out.errors.is_empty());
    let tris = out.triangles();
    assert_eq!(tris.len(), 2);
    let n0 = triangle_normal(&tris[0]);
    for t in &tris {
        assert!(dot(&triangle_normal(t), &n0) > 0.0);
    }
}

#[test]
fn supplied_normal_decides_orientation() {
    // Counter-clockwise when viewed from +y.
    let square: Vec<Point> = vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
    for through_sweep in [false, true] {
        for (normal, expect_output) in [([0.0, 1.0, 0.0], true), ([0.0, -3.0, 0.0], false)] {
            let out = tessellate_3d(&[&square], |tess| {
                tess.set_normal(normal).unwrap();
                tess.set_winding_rule(WindingRule::Positive);
                if through_sweep {
                    tess.on_edge_flag(|_, _| {});
                }
            });
            assert!(out.errors.is_empty());
            assert_eq!(!out.primitives.is_empty(), expect_output, "normal {:?}", normal);
            for t in out.triangles() {
                assert!(dot(&triangle_normal(&t), &normal) > 0.0);
            }
        }
    }
}

#[test]
fn computed_normal_ignores_contour_direction() {
    let (u, v) = ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]);
    let mut square = lift(&OUTER, u, v);
    for _ in 0..2 {
        let out = tessellate_3d(&[&square], |tess| tess.set_winding_rule(WindingRule::Positive));
        assert_eq!(out.triangles().len(), 2);
        square.reverse();
    }
}
