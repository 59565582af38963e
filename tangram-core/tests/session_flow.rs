use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tangram_core::{
    Catalog, CheckOutcome, GameConfig, GameSession, MatchResult, MirrorScale, Mismatch, Point,
    ScorePolicy, SessionEvent, Sign, TransformError,
};

fn session() -> GameSession {
    GameSession::new(Catalog::bundled().unwrap(), GameConfig::default()).unwrap()
}

/// Put every piece exactly where the current shape's template wants it.
fn solve_current(s: &mut GameSession) {
    let template = s.current_shape().solution.clone();
    for entry in template {
        let id = entry.piece_id.as_str();
        s.place_on_board(id, Some(entry.target_position)).unwrap();
        s.rotate_piece(id, entry.target_rotation_deg).unwrap();
        if let Some(scale) = entry.target_scale {
            s.store.set_scale(id, scale).unwrap();
        }
    }
}

#[test]
fn house_solves_and_awards_once() {
    let mut s = session();
    s.select_shape("house").unwrap();
    solve_current(&mut s);
    let t = s.store.get("large-triangle-1").unwrap();
    assert_eq!(t.position, Point::new(125.0, 50.0));
    assert_eq!(t.rotation_deg, 135.0);

    let outcome = s.check_solution();
    assert_eq!(
        outcome,
        CheckOutcome::FirstTimeSuccess {
            shape_id: "house".into(),
            award: 100
        }
    );
    assert_eq!(s.score(), 100);
    assert_eq!(s.completed_shape_ids(), ["house".to_string()]);

    let again = s.check_solution();
    assert_eq!(
        again,
        CheckOutcome::RepeatSuccess {
            shape_id: "house".into()
        }
    );
    assert_eq!(s.score(), 100);
    assert_eq!(s.completed_shape_ids().len(), 1);
}

#[test]
fn house_with_parallelogram_unflipped_fails_on_scale() {
    let mut s = session();
    solve_current(&mut s);
    s.flip_piece("parallelogram").unwrap();
    match s.check_solution() {
        CheckOutcome::TryAgain {
            result: MatchResult::Failed { piece_id, mismatch },
        } => {
            assert_eq!(piece_id.as_str(), "parallelogram");
            assert!(matches!(mismatch, Mismatch::Scale { .. }));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(s.score(), 0);
    assert!(s.completed_shape_ids().is_empty());
}

#[test]
fn small_deviations_within_tolerance_still_solve() {
    let mut s = session();
    solve_current(&mut s);
    s.move_piece("square", Point::new(100.0 + 21.0, 175.0 + 28.0)).unwrap();
    s.rotate_piece_by("square", 360.0 + 14.0).unwrap();
    assert!(matches!(
        s.check_solution(),
        CheckOutcome::FirstTimeSuccess { .. }
    ));
}

#[test]
fn piece_left_in_palette_fails() {
    let mut s = session();
    solve_current(&mut s);
    s.park_piece("small-triangle-2").unwrap();
    assert!(matches!(
        s.check_solution(),
        CheckOutcome::TryAgain {
            result: MatchResult::Failed {
                mismatch: Mismatch::NotOnBoard,
                ..
            }
        }
    ));
}

#[test]
fn shape_without_template_is_unsupported() {
    let mut s = session();
    s.select_shape("dog").unwrap();
    solve_current(&mut s);
    assert_eq!(
        s.check_solution(),
        CheckOutcome::UnsupportedShape {
            shape_id: "dog".into()
        }
    );
    assert_eq!(s.score(), 0);
}

#[test]
fn selecting_a_shape_parks_every_piece() {
    let mut s = session();
    for (i, id) in ["square", "parallelogram", "medium-triangle"].iter().enumerate() {
        s.place_on_board(id, Some(Point::new(40.0 * i as f64, 17.0))).unwrap();
        s.rotate_piece(id, 33.0 * (i as f64 + 1.0)).unwrap();
        s.flip_piece(id).unwrap();
    }
    s.toggle_hint();
    s.select_shape("cat").unwrap();
    assert_eq!(s.current_shape().id, "cat");
    assert!(!s.hint_visible());
    for v in s.store.views() {
        assert!(!v.state.on_board, "{} still on board", v.id);
        assert_eq!(v.state.transform.rotation_deg, 0.0);
        assert_eq!(v.state.transform.scale, MirrorScale::IDENTITY);
        assert_eq!(v.state.transform.position, Point::ORIGIN);
    }
}

#[test]
fn unknown_shape_is_rejected() {
    let mut s = session();
    assert!(s.select_shape("unicorn").is_err());
    assert_eq!(s.current_shape().id, "house");
}

#[test]
fn palette_click_drops_at_default_point() {
    let mut s = session();
    s.place_on_board("square", None).unwrap();
    let st = s.store.state("square").unwrap();
    assert!(st.on_board);
    assert_eq!(st.transform.position, Point::new(300.0, 180.0));
}

#[test]
fn flip_twice_restores_scale() {
    let mut s = session();
    s.flip_piece("parallelogram").unwrap();
    assert_eq!(s.store.get("parallelogram").unwrap().scale.x, Sign::Negative);
    s.flip_piece("parallelogram").unwrap();
    assert_eq!(s.store.get("parallelogram").unwrap().scale, MirrorScale::IDENTITY);
}

#[test]
fn difficulty_weighted_score() {
    let cfg = GameConfig {
        score: ScorePolicy::ByDifficulty {
            easy: 50,
            medium: 100,
            hard: 200,
        },
        ..GameConfig::default()
    };
    let mut s = GameSession::new(Catalog::bundled().unwrap(), cfg).unwrap();
    solve_current(&mut s);
    assert_eq!(
        s.check_solution(),
        CheckOutcome::FirstTimeSuccess {
            shape_id: "house".into(),
            award: 50
        }
    );
    assert_eq!(s.score(), 50);
}

#[test]
fn random_shape_avoids_completed_ones() {
    let mut s = session();
    solve_current(&mut s);
    s.check_solution();
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..50 {
        let picked = s.select_random_shape(&mut rng).id.clone();
        assert_ne!(picked, "house");
    }
}

#[test]
fn progress_counts_by_category() {
    let mut s = session();
    solve_current(&mut s);
    s.check_solution();
    let p = s.progress();
    assert_eq!(p.completed, 1);
    assert_eq!(p.total, 20);
    let objects = p
        .categories
        .iter()
        .find(|c| c.category == tangram_core::Category::Object)
        .unwrap();
    assert_eq!((objects.completed, objects.total), (1, 6));
    let sum: usize = p.categories.iter().map(|c| c.total).sum();
    assert_eq!(sum, 20);
}

#[test]
fn events_follow_check_outcomes() {
    let mut s = session();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    s.subscribe(move |e| {
        let tag = match e {
            SessionEvent::ShapeSelected { .. } => "shape",
            SessionEvent::HintChanged { .. } => "hint",
            SessionEvent::Checked { .. } => "checked",
            SessionEvent::ScoreChanged(_) => "score",
        };
        sink.borrow_mut().push(tag);
    });
    s.check_solution();
    solve_current(&mut s);
    s.check_solution();
    s.check_solution();
    s.toggle_hint();
    s.select_shape("fox").unwrap();
    assert_eq!(
        *seen.borrow(),
        vec!["checked", "checked", "score", "checked", "hint", "hint", "shape"]
    );
}

#[test]
fn store_observers_see_every_mutation() {
    let mut s = session();
    let counts = Rc::new(RefCell::new(Vec::new()));
    let sink = counts.clone();
    s.store.subscribe(move |pieces| sink.borrow_mut().push(pieces.len()));
    s.move_piece("square", Point::new(1.0, 1.0)).unwrap();
    s.rotate_piece("square", 10.0).unwrap();
    assert!(s.move_piece("circle", Point::new(1.0, 1.0)).is_err());
    assert_eq!(*counts.borrow(), vec![7, 7]);
}

#[test]
fn snapshot_serializes_for_the_shell() {
    let mut s = session();
    s.place_on_board("parallelogram", Some(Point::new(150.0, 250.0))).unwrap();
    s.flip_piece("parallelogram").unwrap();
    let json = serde_json::to_value(s.snapshot()).unwrap();
    assert_eq!(json["current_shape_id"], "house");
    let para = json["pieces"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == "parallelogram")
        .unwrap();
    assert_eq!(para["position"], serde_json::json!([150.0, 250.0]));
    assert_eq!(para["scale"], serde_json::json!([-1, 1]));
    assert_eq!(para["on_board"], true);
}

#[test]
fn non_finite_inputs_cannot_award_points() {
    let mut s = session();
    let nan = Point::new(f64::NAN, f64::NAN);
    let template = s.current_shape().solution.clone();
    for entry in &template {
        let id = entry.piece_id.as_str();
        assert!(matches!(
            s.place_on_board(id, Some(nan)),
            Err(TransformError::NonFinite { .. })
        ));
        assert!(s.rotate_piece(id, f64::NAN).is_err());
    }
    assert!(matches!(s.check_solution(), CheckOutcome::TryAgain { .. }));
    assert_eq!(s.score(), 0);

    solve_current(&mut s);
    assert!(s.move_piece("square", nan).is_err());
    assert!(s.rotate_piece_by("square", f64::INFINITY).is_err());
    assert_eq!(s.store.get("square").unwrap().position, Point::new(100.0, 175.0));
    assert!(matches!(
        s.check_solution(),
        CheckOutcome::FirstTimeSuccess { .. }
    ));
}

fn catalog_without(shape_id: &str) -> Catalog {
    let full = Catalog::bundled().unwrap();
    let shapes = full
        .shapes()
        .iter()
        .filter(|sh| sh.id != shape_id)
        .cloned()
        .collect();
    Catalog::new(full.pieces().to_vec(), shapes).unwrap()
}

#[test]
fn loading_a_catalog_keeps_score() {
    let mut s = session();
    solve_current(&mut s);
    s.check_solution();
    assert_eq!(s.score(), 100);

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    s.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    let redraws = Rc::new(RefCell::new(0));
    let counter = redraws.clone();
    s.store.subscribe(move |_| *counter.borrow_mut() += 1);

    s.load_catalog(Catalog::bundled().unwrap(), "arrow").unwrap();
    assert_eq!(s.score(), 100);
    assert_eq!(s.completed_shape_ids(), ["house".to_string()]);
    assert_eq!(s.current_shape().id, "arrow");
    assert!(s.store.views().iter().all(|v| !v.state.on_board));
    assert!(*redraws.borrow() > 0);
    assert!(matches!(
        events.borrow().last(),
        Some(SessionEvent::ScoreChanged(snap)) if snap.score == 100
    ));
}

#[test]
fn loading_a_catalog_drops_unknown_completions() {
    let mut s = session();
    solve_current(&mut s);
    s.check_solution();

    assert!(s.load_catalog(catalog_without("house"), "house").is_err());
    assert_eq!(s.current_shape().id, "house");
    assert_eq!(s.completed_shape_ids().len(), 1);

    s.load_catalog(catalog_without("house"), "arrow").unwrap();
    assert_eq!(s.score(), 100);
    assert!(s.completed_shape_ids().is_empty());
    assert!(s.select_shape("house").is_err());
}
