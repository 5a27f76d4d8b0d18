// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Shared test utilities: a callback recorder and area helpers.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use glutess::{PrimitiveKind, Real, TessError, Tessellator};

pub type Point = [Real; 3];

/// Route `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub vertices: Vec<Point>,
    /// Edge flags as (index of the next vertex, flag).
    pub flags: Vec<(usize, bool)>,
}

#[derive(Clone, Debug, Default)]
pub struct Output {
    pub primitives: Vec<Primitive>,
    pub errors: Vec<TessError>,
    pub combines: usize,
    /// begin/end calls must alternate.
    pub open: bool,
}

pub type Shared = Rc<RefCell<Output>>;

impl Output {
    /// Every primitive broken into triangles, in emission order.
    pub fn triangles(&self) -> Vec<[Point; 3]> {
        let mut out = Vec::new();
        for p in &self.primitives {
            let v = &p.vertices;
            match p.kind {
                PrimitiveKind::Triangles => {
                    for t in v.chunks(3) {
                        out.push([t[0], t[1], t[2]]);
                    }
                }
                PrimitiveKind::TriangleFan => {
                    for i in 1..v.len() - 1 {
                        out.push([v[0], v[i], v[i + 1]]);
                    }
                }
                PrimitiveKind::TriangleStrip => {
                    for i in 0..v.len() - 2 {
                        if i % 2 == 0 {
                            out.push([v[i], v[i + 1], v[i + 2]]);
                        } else {
                            out.push([v[i + 1], v[i], v[i + 2]]);
                        }
                    }
                }
                PrimitiveKind::LineLoop => {}
            }
        }
        out
    }

    pub fn loops(&self) -> Vec<Vec<Point>> {
        self.primitives
            .iter()
            .filter(|p| p.kind == PrimitiveKind::LineLoop)
            .map(|p| p.vertices.clone())
            .collect()
    }

    pub fn kinds(&self) -> Vec<PrimitiveKind> {
        self.primitives.iter().map(|p| p.kind).collect()
    }

    pub fn total_area(&self) -> Real {
        self.triangles().iter().map(|t| triangle_area(t).abs()).sum()
    }

    pub fn signed_area(&self) -> Real {
        self.triangles().iter().map(triangle_area).sum()
    }
}

/// Signed area of a triangle projected onto the xy plane.
pub fn triangle_area(t: &[Point; 3]) -> Real {
    0.5 * ((t[1][0] - t[0][0]) * (t[2][1] - t[0][1]) - (t[2][0] - t[0][0]) * (t[1][1] - t[0][1]))
}

/// Signed area of a closed polygon in the xy plane.
pub fn polygon_area(pts: &[[Real; 2]]) -> Real {
    let mut area = 0.0;
    for i in 0..pts.len() {
        let (a, b) = (pts[i], pts[(i + 1) % pts.len()]);
        area += a[0] * b[1] - b[0] * a[1];
    }
    area / 2.0
}

/// A tessellator whose payloads are the vertex positions, recording every
/// callback into `out`. With `combine`, new vertices take their position.
pub fn recorder<'a>(out: &Shared, combine: bool) -> Tessellator<'a, Point> {
    let mut tess = Tessellator::new();

    let o = out.clone();
    tess.on_begin(move |kind, _| {
        let mut out = o.borrow_mut();
        assert!(!out.open, "begin inside a primitive");
        out.open = true;
        out.primitives.push(Primitive {
            kind,
            vertices: Vec::new(),
            flags: Vec::new(),
        });
    });
    let o = out.clone();
    tess.on_vertex(move |v, _| {
        let mut out = o.borrow_mut();
        assert!(out.open, "vertex outside a primitive");
        if let Some(p) = out.primitives.last_mut() {
            p.vertices.push(*v);
        }
    });
    let o = out.clone();
    tess.on_end(move |_| {
        let mut out = o.borrow_mut();
        assert!(out.open, "end without begin");
        out.open = false;
    });
    let o = out.clone();
    tess.on_error(move |err, _| o.borrow_mut().errors.push(err));

    if combine {
        let o = out.clone();
        tess.on_combine(move |coords, sources, weights, _| {
            assert_eq!(sources.len(), weights.len());
            o.borrow_mut().combines += 1;
            coords
        });
    }
    tess
}

/// Also record edge flags (which restricts output to triangles).
pub fn record_edge_flags(tess: &mut Tessellator<'_, Point>, out: &Shared) {
    let o = out.clone();
    tess.on_edge_flag(move |flag, _| {
        let mut out = o.borrow_mut();
        if let Some(p) = out.primitives.last_mut() {
            let at = p.vertices.len();
            p.flags.push((at, flag));
        }
    });
}

/// Feed 2-D contours (z = 0) as one polygon.
pub fn add_polygon(tess: &mut Tessellator<'_, Point>, contours: &[&[[Real; 2]]]) {
    tess.begin_polygon(());
    for contour in contours {
        tess.begin_contour();
        for p in contour.iter() {
            let v = [p[0], p[1], 0.0];
            tess.add_vertex(v, v);
        }
        tess.end_contour();
    }
    tess.end_polygon();
}

/// Tessellate `contours` with a combine callback, after `configure` has
/// adjusted the tessellator.
pub fn tessellate_with(
    contours: &[&[[Real; 2]]],
    configure: impl FnOnce(&mut Tessellator<'_, Point>),
) -> Output {
    init_logging();
    let out = Shared::default();
    {
        let mut tess = recorder(&out, true);
        configure(&mut tess);
        add_polygon(&mut tess, contours);
    }
    let result = out.borrow().clone();
    assert!(!result.open, "primitive left open");
    result
}

pub fn tessellate(contours: &[&[[Real; 2]]]) -> Output {
    tessellate_with(contours, |_| {})
}

/// Every emitted vertex lies within the bounding box of the input.
pub fn assert_within_bounds(out: &Output, contours: &[&[[Real; 2]]]) {
    let pts = contours.iter().flat_map(|c| c.iter());
    let (mut lo, mut hi) = ([Real::MAX; 2], [Real::MIN; 2]);
    for p in pts {
        for i in 0..2 {
            lo[i] = lo[i].min(p[i]);
            hi[i] = hi[i].max(p[i]);
        }
    }
    for prim in &out.primitives {
        for v in &prim.vertices {
            for i in 0..2 {
                assert!(
                    v[i] >= lo[i] - 1e-9 && v[i] <= hi[i] + 1e-9,
                    "vertex {:?} outside input bounds",
                    v
                );
            }
        }
    }
}

/// A regular polygon, counter-clockwise.
pub fn regular_polygon(n: usize, radius: Real, center: [Real; 2]) -> Vec<[Real; 2]> {
    (0..n)
        .map(|i| {
            let a = i as Real * std::f64::consts::TAU / n as Real;
            [center[0] + radius * a.cos(), center[1] + radius * a.sin()]
        })
        .collect()
}

/// A star with `points` spikes whose edges cross (like a pentagram).
pub fn crossing_star(points: usize, radius: Real) -> Vec<[Real; 2]> {
    let step = points / 2;
    (0..points)
        .map(|i| {
            let k = (i * step) % points;
            let a = k as Real * std::f64::consts::TAU / points as Real + std::f64::consts::FRAC_PI_2;
            [radius * a.cos(), radius * a.sin()]
        })
        .collect()
}
