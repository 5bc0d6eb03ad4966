use std::cell::Cell;
use std::rc::Rc;

use tabshell::{ShellError, ShellObject, ShellUri};

use super::harness::{ShellRig, TestFigure};

#[test]
fn resolving_a_square_end_to_end() {
    let rig = ShellRig::new();

    let closer = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("square resolves");

    assert_eq!(rig.main_area.connected().len(), 1);
    assert_eq!(rig.main_area.views().len(), 1);
    assert!(rig.main_area.active().is_none(), "nothing activates implicitly");
    assert_eq!(rig.shell.registry().len(), 1);

    let figure = rig.last_figure();
    let connected = rig.main_area.connected();
    rig.main_area
        .set_active(Some(&connected[0]))
        .expect("connected object can activate");
    assert!(rig.main_area.active().is_some());

    closer.close();
    assert!(rig.main_area.connected().is_empty());
    assert!(rig.shell.registry().is_empty());
    assert!(figure.disposed.get());
}

#[test]
fn a_freed_id_is_reusable_after_close() {
    let rig = ShellRig::with_capacity(1);

    let closer = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("first open fits");
    closer.close();

    rig.shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("the freed id is allocatable again");
}

#[test]
fn a_missing_item_resolver_is_a_resolution_error() {
    let rig = ShellRig::new();
    let uri: ShellUri = "tabapp://main/unheard-of".parse().expect("uri");

    let error = rig
        .shell
        .resolve(uri.clone(), Vec::new())
        .open_or_err()
        .expect_err("nothing resolves this module");
    assert!(matches!(error, ShellError::NoItemResolver { .. }));

    // The logging entry point swallows the same failure and hands back a
    // spent closer.
    let closer = rig.shell.resolve(uri, Vec::new()).open();
    assert!(closer.is_closed());
    assert!(rig.shell.registry().is_empty());
}

#[test]
fn a_missing_placement_is_a_resolution_error() {
    let rig = ShellRig::new();
    let uri: ShellUri = "tabapp://nowhere/square".parse().expect("uri");

    let error = rig
        .shell
        .resolve(uri, Vec::new())
        .open_or_err()
        .expect_err("no connector claims this placement");
    assert!(matches!(error, ShellError::NoPlacementResolver { .. }));
    assert!(rig.main_area.connected().is_empty());
}

#[test]
fn module_item_lookup_is_case_insensitive() {
    let rig = ShellRig::new();
    let uri: ShellUri = "tabapp://main/SQUARE".parse().expect("uri");

    rig.shell
        .resolve(uri, Vec::new())
        .open_or_err()
        .expect("case does not matter for the module-item key");
}

#[test]
fn a_failed_registration_rolls_the_connect_back() {
    let rig = ShellRig::with_capacity(1);
    let _first = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("first open fits");

    let error = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect_err("the id space is spent");

    assert!(matches!(error, ShellError::IdSpaceExhausted { .. }));
    assert_eq!(
        rig.main_area.connected().len(),
        1,
        "the second connect was rolled back before the error propagated"
    );
}

#[test]
fn attachments_are_embedded_as_surrogate_ids() {
    let rig = ShellRig::new();
    let attachment: Rc<TestFigure> = rig_attachment();
    let uri = ShellUri::build()
        .placement("main")
        .module("square")
        .attachment("payload", 0)
        .parameter("length", "125")
        .end();

    rig.shell
        .resolve(uri, vec![attachment.clone()])
        .open_or_err()
        .expect("square resolves");

    let seen = rig.figures.seen_uris.borrow()[0].clone();
    let surrogate = seen.parameter("payload").expect("parameter survives");
    assert_ne!(surrogate, "{0}", "the placeholder was rewritten");
    assert_eq!(seen.parameter("length"), Some("125"), "others pass through");

    let delivered = rig.figures.seen_payloads.borrow()[0]
        .clone()
        .expect("the surrogate resolves to the attachment");
    assert!(Rc::ptr_eq(
        &(attachment as Rc<dyn ShellObject>),
        &delivered
    ));

    // The registered metadata carries the rewritten URI.
    let figure = rig.last_figure();
    let metadata = rig
        .shell
        .registry()
        .metadata(&(figure as Rc<dyn ShellObject>))
        .expect("figure is registered");
    assert_eq!(metadata.uri().parameter("payload"), Some(surrogate));
}

#[test]
fn a_placeholder_past_the_attachment_array_resolves_to_nothing() {
    let rig = ShellRig::new();
    let uri = ShellUri::build()
        .placement("main")
        .module("square")
        .attachment("payload", 3)
        .end();

    rig.shell
        .resolve(uri, Vec::new())
        .open_or_err()
        .expect("the open itself succeeds");

    assert!(rig.figures.seen_payloads.borrow()[0].is_none());
}

#[test]
fn setup_replays_on_ready_now_and_on_finished_at_close() {
    let rig = ShellRig::new();
    let ready = Rc::new(Cell::new(false));
    let finished = Rc::new(Cell::new(false));

    let closer = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .setup::<TestFigure>(
            {
                let ready = ready.clone();
                move |_| ready.set(true)
            },
            {
                let finished = finished.clone();
                move |_| finished.set(true)
            },
        )
        .open_or_err()
        .expect("square resolves");

    assert!(ready.get());
    assert!(!finished.get());

    closer.close();
    assert!(finished.get());
}

#[test]
fn setup_for_an_incompatible_type_is_skipped_not_failed() {
    struct SomethingElse;

    let rig = ShellRig::new();
    let ready = Rc::new(Cell::new(false));

    let closer = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .setup::<SomethingElse>(
            {
                let ready = ready.clone();
                move |_| ready.set(true)
            },
            |_| {},
        )
        .open_or_err()
        .expect("the mismatch does not fail the open");

    assert!(!ready.get());
    assert_eq!(rig.shell.registry().len(), 1);
    closer.close();
}

#[test]
#[should_panic(expected = "at most once")]
fn a_second_setup_request_is_a_programming_error() {
    let rig = ShellRig::new();
    let _ = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .setup::<TestFigure>(|_| {}, |_| {})
        .setup::<TestFigure>(|_| {}, |_| {});
}

#[test]
fn closing_twice_is_harmless() {
    let rig = ShellRig::new();
    let closer = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("square resolves");

    closer.close();
    closer.close();
    assert!(rig.shell.registry().is_empty());
    assert!(rig.main_area.connected().is_empty());
}

fn rig_attachment() -> Rc<TestFigure> {
    Rc::new(TestFigure {
        key: None,
        refreshes: Cell::new(0),
        disposed: Cell::new(false),
    })
}
