// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Unit tests for the tessellator's state machine, cache and properties.

use std::cell::RefCell;
use std::rc::Rc;

use super::*;

type Log = Rc<RefCell<Vec<TessError>>>;

fn with_error_log<'a, V>() -> (Tessellator<'a, V>, Log) {
    let errors: Log = Rc::default();
    let mut tess = Tessellator::new();
    let sink = errors.clone();
    tess.on_error(move |err, _| sink.borrow_mut().push(err));
    (tess, errors)
}

fn square(tess: &mut Tessellator<'_, u32>, offset: Real) {
    tess.begin_contour();
    for (i, (x, y)) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)].into_iter().enumerate() {
        tess.add_vertex([x + offset, y, 0.0], i as u32);
    }
    tess.end_contour();
}

#[test]
fn single_contour_stays_in_cache() {
    let mut tess: Tessellator<u32> = Tessellator::new();
    tess.begin_polygon(());
    square(&mut tess, 0.0);
    assert!(tess.mesh.is_none());
    assert_eq!(tess.cache.len(), 4);
    assert_eq!(tess.payloads.len(), 4);
    tess.end_polygon();
    assert_eq!(tess.state, State::Dormant);
    assert!(tess.cache.is_empty());
    assert!(tess.payloads.is_empty());
}

#[test]
fn second_contour_flushes_cache() {
    let mut tess: Tessellator<u32> = Tessellator::new();
    tess.begin_polygon(());
    square(&mut tess, 0.0);
    tess.begin_contour();
    assert!(tess.empty_cache);
    assert!(tess.mesh.is_none());
    tess.add_vertex([5.0, 0.0, 0.0], 9);
    assert!(!tess.empty_cache);
    assert!(tess.cache.is_empty());
    let mesh = tess.mesh.as_ref().unwrap();
    assert_eq!(mesh.vertex_count(), 5);
    mesh.check_mesh().unwrap();
}

#[test]
fn cache_overflow_builds_mesh() {
    let mut tess: Tessellator<u32> = Tessellator::new();
    tess.begin_polygon(());
    tess.begin_contour();
    for i in 0..MAX_CACHE {
        let a = i as Real * 0.05;
        tess.add_vertex([a.cos(), a.sin(), 0.0], i as u32);
    }
    assert!(tess.mesh.is_none());
    assert_eq!(tess.cache.len(), MAX_CACHE);

    tess.add_vertex([0.0, -2.0, 0.0], 1000);
    assert!(tess.cache.is_empty());
    let mesh = tess.mesh.as_ref().unwrap();
    assert_eq!(mesh.vertex_count(), MAX_CACHE + 1);
    // Still a single contour: one loop with two faces.
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(mesh.edge_count(), MAX_CACHE + 1);
}

#[test]
fn stray_vertex_synthesizes_polygon_and_contour() {
    let (mut tess, errors) = with_error_log::<u32>();
    tess.add_vertex([0.0, 0.0, 0.0], 0);
    assert_eq!(tess.state, State::InContour);
    assert_eq!(
        *errors.borrow(),
        vec![TessError::MissingBeginPolygon, TessError::MissingBeginContour]
    );
}

#[test]
fn begin_polygon_inside_contour_abandons_it() {
    let (mut tess, errors) = with_error_log::<u32>();
    tess.begin_polygon(());
    square(&mut tess, 0.0);
    square(&mut tess, 3.0);
    tess.begin_contour();
    tess.add_vertex([0.0, 0.0, 0.0], 0);
    assert!(tess.mesh.is_some());

    tess.begin_polygon(());
    assert_eq!(
        *errors.borrow(),
        vec![TessError::MissingEndContour, TessError::MissingEndPolygon]
    );
    assert_eq!(tess.state, State::InPolygon);
    assert!(tess.mesh.is_none());
    assert!(tess.payloads.is_empty());
}

#[test]
fn end_contour_without_begin() {
    let (mut tess, errors) = with_error_log::<u32>();
    tess.begin_polygon(());
    tess.end_contour();
    assert_eq!(tess.state, State::InPolygon);
    assert_eq!(*errors.borrow(), vec![TessError::MissingBeginContour]);
}

#[test]
fn end_polygon_while_dormant_is_harmless() {
    let (mut tess, errors) = with_error_log::<u32>();
    tess.end_polygon();
    assert_eq!(tess.state, State::Dormant);
    assert_eq!(*errors.borrow(), vec![TessError::MissingBeginPolygon]);
}

#[test]
fn large_coordinates_are_clamped_per_component() {
    let (mut tess, errors) = with_error_log::<u32>();
    tess.begin_polygon(());
    tess.begin_contour();
    tess.add_vertex([2.0e150, -3.0e151, 1.0], 0);
    assert_eq!(
        *errors.borrow(),
        vec![TessError::CoordTooLarge, TessError::CoordTooLarge]
    );
    assert_eq!(tess.cache[0].coords, [MAX_COORD, -MAX_COORD, 1.0]);
}

#[test]
fn nan_coordinates_are_rejected() {
    let (mut tess, errors) = with_error_log::<u32>();
    tess.begin_polygon(());
    tess.begin_contour();
    tess.add_vertex([Real::NAN, 0.0, 0.0], 0);
    assert_eq!(*errors.borrow(), vec![TessError::InvalidValue]);
    assert!(tess.cache.is_empty());
    assert!(tess.payloads.is_empty());
}

#[test]
fn properties_round_trip_through_codes() {
    let (mut tess, errors) = with_error_log::<u32>();
    tess.set_property(GLU_TESS_WINDING_RULE, GLU_TESS_WINDING_ABS_GEQ_TWO as Real)
        .unwrap();
    assert_eq!(tess.config().winding_rule, WindingRule::AbsGeqTwo);
    assert_eq!(
        tess.property(GLU_TESS_WINDING_RULE).unwrap(),
        GLU_TESS_WINDING_ABS_GEQ_TWO as Real
    );

    tess.set_property(GLU_TESS_BOUNDARY_ONLY, 1.0).unwrap();
    assert!(tess.config().boundary_only);
    tess.set_property(GLU_TESS_AVOID_DEGENERATE_TRIANGLES, 1.0).unwrap();
    assert_eq!(tess.property(GLU_TESS_AVOID_DEGENERATE_TRIANGLES).unwrap(), 1.0);
    tess.set_property(GLU_TESS_TOLERANCE, 0.5).unwrap();
    assert_eq!(tess.property(GLU_TESS_TOLERANCE).unwrap(), 0.5);
    assert!(errors.borrow().is_empty());
}

#[test]
fn bad_properties_keep_previous_values() {
    let (mut tess, errors) = with_error_log::<u32>();
    assert_eq!(tess.set_property(12345, 1.0), Err(TessError::InvalidEnum));
    assert_eq!(tess.property(12345), Err(TessError::InvalidEnum));
    assert_eq!(
        tess.set_property(GLU_TESS_WINDING_RULE, 100130.5),
        Err(TessError::InvalidValue)
    );
    assert_eq!(
        tess.set_property(GLU_TESS_WINDING_RULE, 100139.0),
        Err(TessError::InvalidEnum)
    );
    assert_eq!(tess.set_tolerance(2.0), Err(TessError::InvalidValue));
    assert_eq!(tess.set_normal([0.0, Real::NAN, 1.0]), Err(TessError::InvalidValue));

    assert_eq!(*tess.config(), TessConfig::default());
    assert_eq!(errors.borrow().len(), 6);
}

#[test]
fn with_config_validates() {
    let config = TessConfig {
        tolerance: -0.1,
        ..TessConfig::default()
    };
    assert_eq!(
        Tessellator::<u32>::with_config(config).err(),
        Some(TessError::InvalidValue)
    );

    let config = TessConfig {
        winding_rule: WindingRule::Positive,
        boundary_only: true,
        ..TessConfig::default()
    };
    let tess = Tessellator::<u32>::with_config(config).unwrap();
    assert_eq!(*tess.config(), config);
}

#[test]
fn legacy_calls_map_onto_contours() {
    let (mut tess, errors) = with_error_log::<u32>();
    tess.begin_polygon_legacy();
    assert_eq!(tess.state, State::InContour);
    tess.add_vertex([0.0, 0.0, 0.0], 0);
    tess.next_contour();
    assert_eq!(tess.state, State::InContour);
    assert!(tess.empty_cache);
    tess.end_polygon_legacy();
    assert_eq!(tess.state, State::Dormant);
    assert!(errors.borrow().is_empty());
}
