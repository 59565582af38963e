use tangram_core::{
    Catalog, CheckOutcome, GameConfig, GameSession, GestureMode, Point, PointerId, PointerInput,
    SurfaceFrame,
};

fn session() -> GameSession {
    GameSession::new(Catalog::bundled().unwrap(), GameConfig::default()).unwrap()
}

#[test]
fn drag_preserves_grab_offset_in_surface_frame() {
    let mut s = session();
    let frame = SurfaceFrame::at(300.0, 120.0);
    s.place_on_board("medium-triangle", Some(Point::new(100.0, 100.0)))
        .unwrap();
    let start = frame.to_client(Point::new(110.0, 105.0));
    s.gestures
        .pointer_down(
            &mut s.store,
            "medium-triangle",
            frame,
            PointerInput::mouse(start.x, start.y),
        )
        .unwrap();
    let to = frame.to_client(Point::new(150.0, 140.0));
    s.gestures
        .pointer_move(&mut s.store, PointerInput::mouse(to.x, to.y));
    assert_eq!(
        s.store.get("medium-triangle").unwrap().position,
        Point::new(140.0, 135.0)
    );
}

#[test]
fn latest_move_wins() {
    let mut s = session();
    let frame = SurfaceFrame::default();
    s.place_on_board("square", Some(Point::ORIGIN)).unwrap();
    s.gestures
        .pointer_down(&mut s.store, "square", frame, PointerInput::touch(3, 10.0, 10.0))
        .unwrap();
    for x in [20.0, 35.0, 50.0, 65.0] {
        s.gestures
            .pointer_move(&mut s.store, PointerInput::touch(3, x, 10.0));
    }
    assert_eq!(s.store.get("square").unwrap().position, Point::new(55.0, 0.0));
    assert_eq!(s.gestures.pointer_up(PointerId(3)), None);
}

#[test]
fn solve_house_by_gestures() {
    let mut s = session();
    let frame = SurfaceFrame::at(8.0, 64.0);
    let template = s.current_shape().solution.clone();
    for entry in &template {
        let id = entry.piece_id.as_str();
        s.place_on_board(id, None).unwrap();

        // drag from the drop point to the target, grabbing 12 units in
        let grab = s.store.get(id).unwrap().position + Point::new(12.0, 12.0);
        let from = frame.to_client(grab);
        let to = frame.to_client(entry.target_position + Point::new(12.0, 12.0));
        s.gestures
            .pointer_down(&mut s.store, id, frame, PointerInput::mouse(from.x, from.y))
            .unwrap();
        s.gestures
            .pointer_move(&mut s.store, PointerInput::mouse(to.x, to.y));
        s.gestures.pointer_up(PointerId(1));

        // turn with the handle: place the pointer at the requested heading
        let center = frame.to_client(s.store.center(id).unwrap());
        let heading = (entry.target_rotation_deg - 90.0).to_radians();
        let handle = Point::new(center.x + 60.0 * heading.cos(), center.y + 60.0 * heading.sin());
        let mode = s
            .gestures
            .begin_handle_rotation(&mut s.store, id, frame, PointerInput::mouse(center.x, center.y - 60.0))
            .unwrap();
        assert_eq!(mode, GestureMode::RotateByHandle);
        s.gestures
            .pointer_move(&mut s.store, PointerInput::mouse(handle.x, handle.y));
        s.gestures.pointer_up(PointerId(1));

        if entry.target_scale.is_some_and(|sc| sc != s.store.get(id).unwrap().scale) {
            s.flip_piece(id).unwrap();
        }
    }
    assert_eq!(s.gestures.active_sessions(), 0);
    assert!(matches!(
        s.check_solution(),
        CheckOutcome::FirstTimeSuccess { .. }
    ));
}

#[test]
fn twist_adds_to_rotation_at_second_touch() {
    let mut s = session();
    let frame = SurfaceFrame::default();
    s.place_on_board("small-triangle-1", Some(Point::ORIGIN)).unwrap();
    s.rotate_piece("small-triangle-1", 270.0).unwrap();
    s.gestures
        .pointer_down(&mut s.store, "small-triangle-1", frame, PointerInput::touch(1, 0.0, 0.0))
        .unwrap();
    let mode = s
        .gestures
        .pointer_down(&mut s.store, "small-triangle-1", frame, PointerInput::touch(2, 0.0, 100.0))
        .unwrap();
    assert_eq!(mode, GestureMode::RotateByTwist);
    // line from finger 1 to finger 2 turns from 90 to 180
    s.gestures
        .pointer_move(&mut s.store, PointerInput::touch(2, -100.0, 0.0));
    let r = s.store.get("small-triangle-1").unwrap().rotation_deg;
    assert!((r - 360.0).abs() < 1e-9, "rotation {r}");
}

#[test]
fn selecting_shape_mid_gesture_releases_it() {
    let mut s = session();
    let frame = SurfaceFrame::default();
    s.place_on_board("square", Some(Point::ORIGIN)).unwrap();
    s.gestures
        .pointer_down(&mut s.store, "square", frame, PointerInput::touch(1, 5.0, 5.0))
        .unwrap();
    s.select_shape("arrow").unwrap();
    assert_eq!(s.gestures.active_sessions(), 0);
    assert!(
        !s.gestures
            .pointer_move(&mut s.store, PointerInput::touch(1, 50.0, 50.0))
    );
    assert_eq!(s.store.get("square").unwrap().position, Point::ORIGIN);
}
