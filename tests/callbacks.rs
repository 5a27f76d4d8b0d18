// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Callback protocol: polygon data, error reporting, call-order recovery and
// tessellator reuse.

mod helpers;

use std::cell::RefCell;
use std::rc::Rc;

use glutess::{
    PrimitiveKind, Real, TessConfig, TessError, Tessellator, WindingRule, GLU_TESS_BOUNDARY_ONLY,
    GLU_TESS_WINDING_NONZERO, GLU_TESS_WINDING_RULE, MAX_COORD,
};

#[derive(Debug, PartialEq)]
enum Call {
    Begin(PrimitiveKind, &'static str),
    Vertex(usize, &'static str),
    End(&'static str),
    Error(TessError, &'static str),
}

type Calls = Rc<RefCell<Vec<Call>>>;

fn logging_tessellator<'a>(calls: &Calls) -> Tessellator<'a, usize, &'static str> {
    let mut tess = Tessellator::new();
    let c = calls.clone();
    tess.on_begin(move |kind, data| c.borrow_mut().push(Call::Begin(kind, *data)));
    let c = calls.clone();
    tess.on_vertex(move |v, data| c.borrow_mut().push(Call::Vertex(*v, *data)));
    let c = calls.clone();
    tess.on_end(move |data| c.borrow_mut().push(Call::End(*data)));
    let c = calls.clone();
    tess.on_error(move |err, data| c.borrow_mut().push(Call::Error(err, *data)));
    tess
}

fn triangle(tess: &mut Tessellator<'_, usize, &'static str>) {
    tess.begin_contour();
    tess.add_vertex([0.0, 0.0, 0.0], 0);
    tess.add_vertex([1.0, 0.0, 0.0], 1);
    tess.add_vertex([0.0, 1.0, 0.0], 2);
    tess.end_contour();
}

#[test]
fn polygon_data_reaches_every_callback() {
    let calls = Calls::default();
    let mut tess = logging_tessellator(&calls);
    tess.begin_polygon("first");
    triangle(&mut tess);
    tess.end_polygon();

    tess.begin_polygon("second");
    triangle(&mut tess);
    tess.end_polygon();
    drop(tess);

    let expected: Vec<Call> = ["first", "second"]
        .into_iter()
        .flat_map(|d| {
            vec![
                Call::Begin(PrimitiveKind::Triangles, d),
                Call::Vertex(0, d),
                Call::Vertex(1, d),
                Call::Vertex(2, d),
                Call::End(d),
            ]
        })
        .collect();
    assert_eq!(*calls.borrow(), expected);
}

#[test]
fn errors_carry_polygon_data() {
    let calls = Calls::default();
    let mut tess = logging_tessellator(&calls);
    tess.begin_polygon("data");
    tess.begin_contour();
    tess.add_vertex([MAX_COORD * 10.0, 0.0, 0.0], 0);
    drop(tess);
    assert_eq!(*calls.borrow(), vec![Call::Error(TessError::CoordTooLarge, "data")]);
}

#[test]
fn missing_calls_are_reported_and_synthesized() {
    let calls = Calls::default();
    let mut tess = logging_tessellator(&calls);
    // No begin_polygon or begin_contour.
    tess.add_vertex([0.0, 0.0, 0.0], 0);
    tess.add_vertex([1.0, 0.0, 0.0], 1);
    tess.add_vertex([0.0, 1.0, 0.0], 2);
    // No end_contour.
    tess.end_polygon();
    drop(tess);

    let calls = calls.borrow();
    assert_eq!(
        calls[..3],
        [
            Call::Error(TessError::MissingBeginPolygon, ""),
            Call::Error(TessError::MissingBeginContour, ""),
            Call::Error(TessError::MissingEndContour, ""),
        ]
    );
    // The synthesized polygon still renders.
    assert_eq!(calls[3], Call::Begin(PrimitiveKind::Triangles, ""));
    assert_eq!(calls.len(), 3 + 5);
}

#[test]
fn begin_polygon_twice_discards_the_first() {
    let calls = Calls::default();
    let mut tess = logging_tessellator(&calls);
    tess.begin_polygon("lost");
    triangle(&mut tess);
    tess.begin_polygon("kept");
    triangle(&mut tess);
    tess.end_polygon();
    drop(tess);

    let calls = calls.borrow();
    assert_eq!(calls[0], Call::Error(TessError::MissingEndPolygon, "lost"));
    assert_eq!(calls[1], Call::Begin(PrimitiveKind::Triangles, "kept"));
    assert_eq!(calls.len(), 1 + 5);
}

#[test]
fn error_codes_match_glu() {
    assert_eq!(TessError::MissingBeginPolygon.code(), 100151);
    assert_eq!(TessError::MissingBeginContour.code(), 100152);
    assert_eq!(TessError::MissingEndPolygon.code(), 100153);
    assert_eq!(TessError::MissingEndContour.code(), 100154);
    assert_eq!(TessError::CoordTooLarge.code(), 100155);
    assert_eq!(TessError::NeedCombineCallback.code(), 100156);
}

#[test]
fn properties_by_code() {
    let mut tess: Tessellator<usize> = Tessellator::new();
    tess.set_property(GLU_TESS_WINDING_RULE, GLU_TESS_WINDING_NONZERO as Real)
        .unwrap();
    assert_eq!(tess.config().winding_rule, WindingRule::NonZero);
    tess.set_property(GLU_TESS_BOUNDARY_ONLY, 1.0).unwrap();
    assert_eq!(tess.property(GLU_TESS_BOUNDARY_ONLY), Ok(1.0));
    assert_eq!(tess.set_property(0, 0.0), Err(TessError::InvalidEnum));
}

#[test]
fn config_applies_to_every_polygon() {
    let config = TessConfig {
        winding_rule: WindingRule::AbsGeqTwo,
        ..TessConfig::default()
    };
    let shared = helpers::Shared::default();
    {
        let mut tess = helpers::recorder(&shared, true);
        tess.set_winding_rule(config.winding_rule);
        let square: &[[Real; 2]] = &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        helpers::add_polygon(&mut tess, &[square]);
        helpers::add_polygon(&mut tess, &[square, square]);
        assert_eq!(*tess.config(), config);
    }
    let out = shared.borrow();
    assert!(out.errors.is_empty());
    // The lone square has winding 1 and is dropped; the doubled one stays.
    assert!((out.total_area() - 1.0).abs() < 1e-12);
}

#[test]
fn no_callbacks_is_fine() {
    let mut tess: Tessellator<()> = Tessellator::new();
    tess.begin_polygon(());
    tess.begin_contour();
    for p in [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        tess.add_vertex(p, ());
    }
    tess.end_contour();
    tess.end_polygon();
}

#[test]
fn combine_payloads_are_owned_values() {
    // Payloads that are not Copy: the combine callback builds a new label.
    let labels = Rc::new(RefCell::new(Vec::new()));
    let mut tess: Tessellator<String> = Tessellator::new();
    tess.on_combine(|_, sources, weights, _| {
        let parts: Vec<String> = sources
            .iter()
            .zip(weights)
            .map(|(s, w)| format!("{}*{:.2}", s, w))
            .collect();
        parts.join("+")
    });
    let l = labels.clone();
    tess.on_vertex(move |v, _| l.borrow_mut().push(v.clone()));

    tess.begin_polygon(());
    tess.begin_contour();
    for (name, p) in [("a", [0.0, 0.0]), ("b", [1.0, 1.0]), ("c", [1.0, 0.0]), ("d", [0.0, 1.0])] {
        tess.add_vertex([p[0], p[1], 0.0], name.to_string());
    }
    tess.end_contour();
    tess.end_polygon();
    drop(tess);

    let labels = labels.borrow();
    assert_eq!(labels.len(), 6);
    let merged: Vec<&String> = labels.iter().filter(|l| l.contains('+')).collect();
    assert_eq!(merged.len(), 2);
    for name in ["a*0.25", "b*0.25", "c*0.25", "d*0.25"] {
        assert!(merged[0].contains(name), "{}", merged[0]);
    }
}
