// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// The client-facing tessellator: polygon/contour state machine, the vertex
// cache behind the single-contour fast path, callbacks and properties.
//
// A polygon is described between `begin_polygon` and `end_polygon`; all the
// work happens in `end_polygon`, which reports its results through the
// registered callbacks and then forgets the polygon.

pub mod config;
mod normal;
pub mod render;

#[cfg(test)]
mod tests;

use log::debug;

use crate::error::TessError;
use crate::geom::Real;
use crate::mesh::{sym, EdgeIdx, Mesh, INVALID};
use crate::sweep::{self, VertexCombiner};

pub use config::{
    PrimitiveKind, TessConfig, TessProperty, WindingRule, GLU_TESS_AVOID_DEGENERATE_TRIANGLES,
    GLU_TESS_BOUNDARY_ONLY, GLU_TESS_TOLERANCE, GLU_TESS_WINDING_ABS_GEQ_TWO,
    GLU_TESS_WINDING_NEGATIVE, GLU_TESS_WINDING_NONZERO, GLU_TESS_WINDING_ODD,
    GLU_TESS_WINDING_POSITIVE, GLU_TESS_WINDING_RULE, GL_LINE_LOOP, GL_TRIANGLES,
    GL_TRIANGLE_FAN, GL_TRIANGLE_STRIP, MAX_CACHE, MAX_COORD, SENTINEL_COORD,
};
use render::{render_boundary, render_cache, render_mesh, PrimitiveSink};

type BeginFn<'a, P> = Box<dyn FnMut(PrimitiveKind, &P) + 'a>;
type EdgeFlagFn<'a, P> = Box<dyn FnMut(bool, &P) + 'a>;
type VertexFn<'a, V, P> = Box<dyn FnMut(&V, &P) + 'a>;
type EndFn<'a, P> = Box<dyn FnMut(&P) + 'a>;
type CombineFn<'a, V, P> = Box<dyn FnMut([Real; 3], &[&V], &[Real], &P) -> V + 'a>;
type ErrorFn<'a, P> = Box<dyn FnMut(TessError, &P) + 'a>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum State {
    Dormant,
    InPolygon,
    InContour,
}

/// A vertex held back while the polygon might still take the fast path.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CachedVertex {
    pub(crate) coords: [Real; 3],
    pub(crate) data: u32,
}

struct Callbacks<'a, V, P> {
    begin: Option<BeginFn<'a, P>>,
    edge_flag: Option<EdgeFlagFn<'a, P>>,
    vertex: Option<VertexFn<'a, V, P>>,
    end: Option<EndFn<'a, P>>,
    combine: Option<CombineFn<'a, V, P>>,
    error: Option<ErrorFn<'a, P>>,
}

impl<'a, V, P> Callbacks<'a, V, P> {
    fn wants_primitives(&self) -> bool {
        self.begin.is_some() || self.edge_flag.is_some() || self.vertex.is_some() || self.end.is_some()
    }
}

/// Forwards rendered primitives to the client callbacks.
struct CallbackSink<'t, 'a, V, P> {
    callbacks: &'t mut Callbacks<'a, V, P>,
    payloads: &'t [V],
    polygon_data: &'t P,
}

impl<'t, 'a, V, P> PrimitiveSink for CallbackSink<'t, 'a, V, P> {
    fn begin(&mut self, kind: PrimitiveKind) {
        if let Some(cb) = self.callbacks.begin.as_mut() {
            cb(kind, self.polygon_data);
        }
    }

    fn edge_flag(&mut self, boundary: bool) {
        if let Some(cb) = self.callbacks.edge_flag.as_mut() {
            cb(boundary, self.polygon_data);
        }
    }

    fn vertex(&mut self, data: u32) {
        // Vertices without a payload only exist transiently inside the sweep.
        let Some(payload) = self.payloads.get(data as usize) else {
            return;
        };
        if let Some(cb) = self.callbacks.vertex.as_mut() {
            cb(payload, self.polygon_data);
        }
    }

    fn end(&mut self) {
        if let Some(cb) = self.callbacks.end.as_mut() {
            cb(self.polygon_data);
        }
    }
}

/// Resolves sweep-created vertices through the client's combine callback,
/// storing the new payloads next to the input ones.
struct PayloadCombiner<'t, 'a, V, P> {
    combine: Option<&'t mut CombineFn<'a, V, P>>,
    payloads: &'t mut Vec<V>,
    polygon_data: &'t P,
}

impl<'t, 'a, V, P> VertexCombiner for PayloadCombiner<'t, 'a, V, P> {
    fn combine(&mut self, coords: [Real; 3], sources: &[u32], weights: &[Real]) -> Option<u32> {
        let cb = self.combine.as_mut()?;

        let mut refs: Vec<&V> = Vec::with_capacity(sources.len());
        let mut kept: Vec<Real> = Vec::with_capacity(sources.len());
        for (&src, &w) in sources.iter().zip(weights) {
            if let Some(payload) = self.payloads.get(src as usize) {
                refs.push(payload);
                kept.push(w);
            }
        }
        if refs.is_empty() {
            return None;
        }
        if refs.len() < sources.len() {
            let total: Real = kept.iter().sum();
            if total > 0.0 {
                kept.iter_mut().for_each(|w| *w /= total);
            }
        }

        let merged = cb(coords, &refs, &kept, self.polygon_data);
        self.payloads.push(merged);
        Some((self.payloads.len() - 1) as u32)
    }
}

/// Polygon tessellator.
///
/// `V` is the per-vertex payload handed back through the vertex callback;
/// `P` is per-polygon data passed to every callback.
///
/// ```
/// use std::cell::RefCell;
/// use glutess::{PrimitiveKind, Tessellator};
///
/// let out = RefCell::new(Vec::new());
/// let mut tess: Tessellator<usize> = Tessellator::new();
/// tess.on_begin(|kind, _| out.borrow_mut().push((kind, Vec::new())));
/// tess.on_vertex(|v, _| out.borrow_mut().last_mut().unwrap().1.push(*v));
///
/// tess.begin_polygon(());
/// tess.begin_contour();
/// for (i, p) in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
///     .into_iter()
///     .enumerate()
/// {
///     tess.add_vertex(p, i);
/// }
/// tess.end_contour();
/// tess.end_polygon();
/// drop(tess);
///
/// assert_eq!(out.into_inner(), vec![(PrimitiveKind::TriangleFan, vec![0, 1, 2, 3])]);
/// ```
pub struct Tessellator<'a, V, P = ()> {
    config: TessConfig,
    state: State,
    polygon_data: P,

    mesh: Option<Mesh>,
    /// Last edge of the contour being built, INVALID at a contour start.
    last_edge: EdgeIdx,

    cache: Vec<CachedVertex>,
    /// A second contour started while vertices were cached; the next vertex
    /// moves the cache into a mesh.
    empty_cache: bool,

    /// Input payloads followed by payloads created by combining.
    payloads: Vec<V>,

    callbacks: Callbacks<'a, V, P>,
}

impl<'a, V, P: Default> Default for Tessellator<'a, V, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, V, P: Default> Tessellator<'a, V, P> {
    pub fn new() -> Self {
        Tessellator {
            config: TessConfig::default(),
            state: State::Dormant,
            polygon_data: P::default(),
            mesh: None,
            last_edge: INVALID,
            cache: Vec::with_capacity(MAX_CACHE),
            empty_cache: false,
            payloads: Vec::new(),
            callbacks: Callbacks {
                begin: None,
                edge_flag: None,
                vertex: None,
                end: None,
                combine: None,
                error: None,
            },
        }
    }

    pub fn with_config(config: TessConfig) -> Result<Self, TessError> {
        config.validate()?;
        let mut tess = Self::new();
        tess.config = config;
        Ok(tess)
    }

    pub fn config(&self) -> &TessConfig {
        &self.config
    }

    // ─────── Configuration ──────────────────────────────────────────────────

    pub fn set_winding_rule(&mut self, rule: WindingRule) {
        self.config.winding_rule = rule;
    }

    pub fn set_boundary_only(&mut self, boundary_only: bool) {
        self.config.boundary_only = boundary_only;
    }

    /// Rejects values outside [0, 1], keeping the previous tolerance.
    pub fn set_tolerance(&mut self, tolerance: Real) -> Result<(), TessError> {
        self.apply_property(TessProperty::Tolerance.code(), tolerance)
    }

    pub fn set_avoid_degenerate_triangles(&mut self, avoid: bool) {
        self.config.avoid_degenerate_triangles = avoid;
    }

    /// Set the plane normal. All zeros (the default) means the normal is
    /// estimated from the input.
    pub fn set_normal(&mut self, normal: [Real; 3]) -> Result<(), TessError> {
        if normal.iter().any(|c| !c.is_finite()) {
            self.report(TessError::InvalidValue);
            return Err(TessError::InvalidValue);
        }
        self.config.normal = normal;
        Ok(())
    }

    /// Set a property by its GLU code.
    pub fn set_property(&mut self, code: u32, value: Real) -> Result<(), TessError> {
        self.apply_property(code, value)
    }

    /// Read a property by its GLU code.
    pub fn property(&mut self, code: u32) -> Result<Real, TessError> {
        let Some(property) = TessProperty::from_code(code) else {
            self.report(TessError::InvalidEnum);
            return Err(TessError::InvalidEnum);
        };
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Ok(match property {
            TessProperty::WindingRule => self.config.winding_rule.code() as Real,
            TessProperty::BoundaryOnly => flag(self.config.boundary_only),
            TessProperty::Tolerance => self.config.tolerance,
            TessProperty::AvoidDegenerateTriangles => flag(self.config.avoid_degenerate_triangles),
        })
    }

    fn apply_property(&mut self, code: u32, value: Real) -> Result<(), TessError> {
        let result = self.try_apply_property(code, value);
        if let Err(err) = result {
            self.report(err);
        }
        result
    }

    fn try_apply_property(&mut self, code: u32, value: Real) -> Result<(), TessError> {
        let property = TessProperty::from_code(code).ok_or(TessError::InvalidEnum)?;
        match property {
            TessProperty::WindingRule => {
                if !value.is_finite() || value.fract() != 0.0 || value < 0.0 {
                    return Err(TessError::InvalidValue);
                }
                self.config.winding_rule =
                    WindingRule::from_code(value as u32).ok_or(TessError::InvalidEnum)?;
            }
            TessProperty::BoundaryOnly => self.config.boundary_only = value != 0.0,
            TessProperty::Tolerance => {
                if !(0.0..=1.0).contains(&value) {
                    return Err(TessError::InvalidValue);
                }
                self.config.tolerance = value;
            }
            TessProperty::AvoidDegenerateTriangles => {
                self.config.avoid_degenerate_triangles = value != 0.0;
            }
        }
        Ok(())
    }

    // ─────── Callbacks ──────────────────────────────────────────────────────

    /// Start of a primitive.
    pub fn on_begin(&mut self, f: impl FnMut(PrimitiveKind, &P) + 'a) -> &mut Self {
        self.callbacks.begin = Some(Box::new(f));
        self
    }

    /// Whether the following vertices start boundary edges. Registering this
    /// restricts output to independent triangles.
    pub fn on_edge_flag(&mut self, f: impl FnMut(bool, &P) + 'a) -> &mut Self {
        self.callbacks.edge_flag = Some(Box::new(f));
        self
    }

    pub fn on_vertex(&mut self, f: impl FnMut(&V, &P) + 'a) -> &mut Self {
        self.callbacks.vertex = Some(Box::new(f));
        self
    }

    pub fn on_end(&mut self, f: impl FnMut(&P) + 'a) -> &mut Self {
        self.callbacks.end = Some(Box::new(f));
        self
    }

    /// Payload for a vertex created at an intersection or by merging, from
    /// its position, up to four source payloads and their weights (summing
    /// to 1). Without it, intersecting input is an error.
    pub fn on_combine(&mut self, f: impl FnMut([Real; 3], &[&V], &[Real], &P) -> V + 'a) -> &mut Self {
        self.callbacks.combine = Some(Box::new(f));
        self
    }

    pub fn on_error(&mut self, f: impl FnMut(TessError, &P) + 'a) -> &mut Self {
        self.callbacks.error = Some(Box::new(f));
        self
    }

    fn report(&mut self, err: TessError) {
        debug!("tessellator error {}: {}", err.code(), err);
        if let Some(cb) = self.callbacks.error.as_mut() {
            cb(err, &self.polygon_data);
        }
    }

    // ─────── State machine ──────────────────────────────────────────────────

    /// Synthesize the calls needed to reach `target`, reporting each one.
    fn require_state(&mut self, target: State) {
        while self.state != target {
            match self.state {
                State::Dormant => {
                    self.report(TessError::MissingBeginPolygon);
                    self.begin_polygon(P::default());
                }
                State::InPolygon if self.state < target => {
                    self.report(TessError::MissingBeginContour);
                    self.begin_contour();
                }
                State::InPolygon => {
                    self.report(TessError::MissingEndPolygon);
                    self.make_dormant();
                }
                State::InContour => {
                    self.report(TessError::MissingEndContour);
                    self.end_contour();
                }
            }
        }
    }

    /// Abandon the current polygon.
    fn make_dormant(&mut self) {
        self.mesh = None;
        self.state = State::Dormant;
        self.last_edge = INVALID;
        self.cache.clear();
        self.empty_cache = false;
        self.payloads.clear();
    }

    pub fn begin_polygon(&mut self, data: P) {
        self.require_state(State::Dormant);
        self.state = State::InPolygon;
        self.cache.clear();
        self.empty_cache = false;
        self.mesh = None;
        self.payloads.clear();
        self.polygon_data = data;
    }

    pub fn begin_contour(&mut self) {
        self.require_state(State::InPolygon);
        self.state = State::InContour;
        self.last_edge = INVALID;
        if !self.cache.is_empty() {
            self.empty_cache = true;
        }
    }

    /// Add a vertex to the current contour. Coordinates beyond
    /// ±[`MAX_COORD`] are clamped, reporting `CoordTooLarge` for each one.
    pub fn add_vertex(&mut self, coords: [Real; 3], data: V) {
        self.require_state(State::InContour);

        if coords.iter().any(|c| c.is_nan()) {
            self.report(TessError::InvalidValue);
            return;
        }

        if self.empty_cache {
            if let Err(err) = self.flush_cache() {
                self.report(err);
            }
            self.last_edge = INVALID;
        }

        let mut clamped = coords;
        for c in clamped.iter_mut() {
            if *c < -MAX_COORD {
                *c = -MAX_COORD;
                self.report(TessError::CoordTooLarge);
            } else if *c > MAX_COORD {
                *c = MAX_COORD;
                self.report(TessError::CoordTooLarge);
            }
        }

        let slot = self.payloads.len() as u32;
        self.payloads.push(data);

        if self.mesh.is_none() {
            if self.cache.len() < MAX_CACHE {
                self.cache.push(CachedVertex {
                    coords: clamped,
                    data: slot,
                });
                return;
            }
            if let Err(err) = self.flush_cache() {
                self.report(err);
                return;
            }
        }
        if let Err(err) = self.add_mesh_vertex(clamped, slot) {
            self.report(err);
        }
    }

    pub fn end_contour(&mut self) {
        self.require_state(State::InContour);
        self.state = State::InPolygon;
    }

    /// Tessellate the polygon and emit it through the callbacks.
    pub fn end_polygon(&mut self) {
        self.require_state(State::InPolygon);
        self.state = State::Dormant;

        if let Err(err) = self.finish_polygon() {
            self.report(err);
        }

        self.make_dormant();
        self.polygon_data = P::default();
    }

    /// `begin_polygon` with default data followed by `begin_contour`.
    pub fn begin_polygon_legacy(&mut self) {
        self.begin_polygon(P::default());
        self.begin_contour();
    }

    /// `end_contour` followed by `begin_contour`.
    pub fn next_contour(&mut self) {
        self.end_contour();
        self.begin_contour();
    }

    /// `end_contour` followed by `end_polygon`.
    pub fn end_polygon_legacy(&mut self) {
        self.end_contour();
        self.end_polygon();
    }

    // ─────── Mesh building ──────────────────────────────────────────────────

    /// Append a vertex to the contour being built in the mesh.
    fn add_mesh_vertex(&mut self, coords: [Real; 3], data: u32) -> Result<(), TessError> {
        let mesh = self.mesh.get_or_insert_with(Mesh::new);
        let e = if self.last_edge == INVALID {
            // A self-loop: one vertex, one edge.
            let e = mesh.make_edge()?;
            mesh.splice(e, sym(e))?;
            e
        } else {
            mesh.split_edge(self.last_edge)?;
            mesh.lnext(self.last_edge)
        };

        let v = mesh.org(e) as usize;
        mesh.verts[v].coords = coords;
        mesh.verts[v].data = data;
        // The contour's interior is on the left of its edges.
        mesh.edges[e as usize].winding = 1;
        mesh.edges[sym(e) as usize].winding = -1;
        self.last_edge = e;
        Ok(())
    }

    /// Move the cached vertices into a new mesh as one contour.
    fn flush_cache(&mut self) -> Result<(), TessError> {
        self.mesh = Some(Mesh::new());
        self.last_edge = INVALID;
        let cache = std::mem::take(&mut self.cache);
        let result = cache
            .iter()
            .try_for_each(|v| self.add_mesh_vertex(v.coords, v.data));
        self.cache = cache;
        self.cache.clear();
        self.empty_cache = false;
        result
    }

    fn finish_polygon(&mut self) -> Result<(), TessError> {
        let flag_boundary = self.callbacks.edge_flag.is_some();

        if self.mesh.is_none() {
            if !flag_boundary {
                let mut sink = CallbackSink {
                    callbacks: &mut self.callbacks,
                    payloads: &self.payloads,
                    polygon_data: &self.polygon_data,
                };
                if render_cache(
                    &self.cache,
                    self.config.normal,
                    self.config.winding_rule,
                    self.config.boundary_only,
                    self.config.avoid_degenerate_triangles,
                    &mut sink,
                ) {
                    return Ok(());
                }
            }
            self.flush_cache()?;
        }

        let mut mesh = self.mesh.take().unwrap_or_else(Mesh::new);
        let normal = normal::project_polygon(&mut mesh, self.config.normal);
        debug!(
            "sweeping {} vertices, normal {:?}, rule {:?}",
            mesh.vertex_count(),
            normal,
            self.config.winding_rule
        );

        let mut combiner = PayloadCombiner {
            combine: self.callbacks.combine.as_mut(),
            payloads: &mut self.payloads,
            polygon_data: &self.polygon_data,
        };
        sweep::compute_interior(&mut mesh, self.config.winding_rule, &mut combiner)?;

        if self.config.boundary_only {
            mesh.set_winding_number(1, true)?;
        } else {
            mesh.tessellate_interior(self.config.avoid_degenerate_triangles)?;
        }
        if let Err(err) = mesh.check_mesh() {
            debug!("mesh check failed after triangulation: {}", err);
            return Err(TessError::Internal("mesh invariant violated by triangulation"));
        }

        if self.callbacks.wants_primitives() {
            let mut sink = CallbackSink {
                callbacks: &mut self.callbacks,
                payloads: &self.payloads,
                polygon_data: &self.polygon_data,
            };
            if self.config.boundary_only {
                render_boundary(&mesh, &mut sink);
            } else {
                render_mesh(&mut mesh, &mut sink, flag_boundary);
            }
        }
        Ok(())
    }
}
