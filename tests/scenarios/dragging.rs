use std::cell::Cell;
use std::rc::Rc;

use super::harness::ShellRig;

#[test]
fn a_dragged_object_lands_in_the_drop_target() {
    let rig = ShellRig::new();
    rig.shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("square resolves");
    let square = rig.main_area.connected()[0].clone();

    rig.drag.drag(&square).expect("square is connected");
    assert!(rig.main_area.connected().is_empty());
    assert!(rig.drag.is_dragging(&square));

    rig.drag.drop_onto(rig.sidebar.clone());
    rig.scheduler.run_pending();

    assert_eq!(rig.sidebar.connected().len(), 1);
    assert!(rig.drag.dragged().is_none());
    assert_eq!(rig.shell.registry().len(), 1, "the object stayed open throughout");
}

#[test]
fn closing_after_a_drop_routes_through_the_new_owner() {
    let rig = ShellRig::new();
    let closer = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("square resolves");
    let square = rig.main_area.connected()[0].clone();

    rig.drag.drag(&square).expect("square is connected");
    rig.drag.drop_onto(rig.sidebar.clone());
    rig.scheduler.run_pending();

    closer.close();
    rig.scheduler.run_pending();

    assert!(rig.sidebar.connected().is_empty());
    assert!(rig.shell.registry().is_empty());
}

#[test]
fn a_shell_close_mid_drag_cancels_the_drag() {
    let rig = ShellRig::new();
    let closer = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("square resolves");
    let square = rig.main_area.connected()[0].clone();
    rig.drag.drag(&square).expect("square is connected");

    let closed_events = Rc::new(Cell::new(0));
    let seen = closed_events.clone();
    rig.drag.on_dragged_closed(move |_| seen.set(seen.get() + 1));

    closer.close();

    assert_eq!(closed_events.get(), 1, "dragged-closed fires exactly once");
    assert!(rig.drag.dragged().is_none());
    assert!(rig.shell.registry().is_empty());
    let figure = rig.last_figure();
    assert!(figure.disposed.get(), "staged bag values were disposed");
}
