use std::rc::Rc;

use tabshell::placement::ItemsPlacementConnector;
use tabshell::shell::Shell;
use tabshell::{
    AttachmentSelector, PlacementConnector, PlacementResolver, SharedObject, ShellUri,
};

use super::harness::{FigureResolver, ShellRig};

#[test]
fn an_open_object_is_asked_to_refresh_once() {
    let rig = ShellRig::new();
    rig.shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("square resolves");

    assert_eq!(rig.last_figure().refreshes.get(), 1);
}

#[test]
fn refresh_broadcasts_reach_only_the_addressed_object() {
    let rig = ShellRig::new();
    rig.shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("first square");
    rig.shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("second square");

    let created = rig.figures.created.borrow().clone();
    let (first, second) = (created[0].clone(), created[1].clone());
    let first_id = rig
        .shell
        .registry()
        .metadata(&(first.clone() as SharedObject))
        .expect("registered")
        .id();

    rig.shell.send_refresh(first_id);

    assert_eq!(first.refreshes.get(), 2, "one at open, one addressed");
    assert_eq!(second.refreshes.get(), 1, "only its open-time refresh");
}

#[test]
fn refreshing_a_closed_id_reaches_nobody() {
    let rig = ShellRig::new();
    let closer = rig
        .shell
        .resolve(rig.square_uri(), Vec::new())
        .open_or_err()
        .expect("square resolves");
    let figure = rig.last_figure();
    let id = rig
        .shell
        .registry()
        .metadata(&(figure.clone() as SharedObject))
        .expect("registered")
        .id();

    closer.close();
    rig.shell.send_refresh(id);

    assert_eq!(figure.refreshes.get(), 1, "nothing after the close");
}

struct FixedPlacement(Rc<ItemsPlacementConnector>);

impl PlacementResolver for FixedPlacement {
    fn resolve(
        &self,
        _resolved: &SharedObject,
        _uri: &ShellUri,
        _attachments: &AttachmentSelector,
    ) -> Option<Rc<dyn PlacementConnector>> {
        Some(self.0.clone())
    }
}

#[test]
fn a_connector_refreshing_its_own_content_suppresses_the_broadcast() {
    let shell = Shell::new();
    let connector = Rc::new(ItemsPlacementConnector::new().owns_content_refresh(true));
    let figures = Rc::new(FigureResolver::default());
    shell.register_item_resolver("square", "", figures.clone());
    let placements: Rc<dyn PlacementResolver> = Rc::new(FixedPlacement(connector.clone()));
    shell.register_placement_resolver(&placements);

    let uri: ShellUri = "tabapp://main/square".parse().expect("uri");
    shell
        .resolve(uri, Vec::new())
        .open_or_err()
        .expect("square resolves");

    let figure = figures.created.borrow()[0].clone();
    assert_eq!(figure.refreshes.get(), 0, "the connector owns its refresh");
}
