/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Headless demo shell: wires figure resolvers, a main items area, and a
//! batched sidebar, then walks a resolve/activate/drag/close scenario and
//! prints the resulting shell state.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tabshell::placement::{
    DragDropCoordinator, ItemsPlacementConnector, QueueScheduler, SidebarPlacementConnector,
};
use tabshell::shell::Shell;
use tabshell::{
    AttachmentSelector, ItemResolver, PlacementConnector, PlacementResolver, Refreshable,
    SharedObject, ShellObject, ShellUri,
};

struct SquareFigure {
    shell: Shell,
    self_ref: Weak<SquareFigure>,
    length: Cell<f64>,
    background: RefCell<String>,
}

impl SquareFigure {
    fn new(shell: Shell, uri: &ShellUri) -> Rc<Self> {
        let figure = Rc::new_cyclic(|weak| Self {
            shell,
            self_ref: weak.clone(),
            length: Cell::new(0.0),
            background: RefCell::new(String::new()),
        });
        figure.read_parameters(uri);
        figure
    }

    fn read_parameters(&self, uri: &ShellUri) {
        if let Some(length) = uri.parameter("length").and_then(|v| v.parse().ok()) {
            self.length.set(length);
        }
        if let Some(background) = uri.parameter("background") {
            *self.background.borrow_mut() = background.to_string();
        }
    }
}

impl ShellObject for SquareFigure {
    fn identity_key(&self) -> Option<String> {
        Some("figure.square".to_string())
    }

    fn as_refreshable(&self) -> Option<&dyn Refreshable> {
        Some(self)
    }
}

impl Refreshable for SquareFigure {
    // Pull the current parameters back out of the resolved URI.
    fn refresh(&self) {
        let Some(me) = self.self_ref.upgrade() else {
            return;
        };
        let me: SharedObject = me;
        if let Ok(metadata) = self.shell.registry().metadata(&me) {
            self.read_parameters(metadata.uri());
            log::debug!(
                "square refreshed: length={} background={}",
                self.length.get(),
                self.background.borrow()
            );
        }
    }
}

struct CircleFigure {
    radius: f64,
}

impl ShellObject for CircleFigure {}

struct NoteFigure {
    text: String,
}

impl ShellObject for NoteFigure {}

struct SquareResolver {
    shell: Shell,
}

impl ItemResolver for SquareResolver {
    fn resolve(&self, uri: &ShellUri, _attachments: &AttachmentSelector) -> SharedObject {
        SquareFigure::new(self.shell.clone(), uri)
    }
}

struct CircleResolver;

impl ItemResolver for CircleResolver {
    fn resolve(&self, uri: &ShellUri, _attachments: &AttachmentSelector) -> SharedObject {
        let radius = uri
            .parameter("radius")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1.0);
        let figure = Rc::new(CircleFigure { radius });
        log::debug!("circle figure created: radius={}", figure.radius);
        figure
    }
}

/// Resolves the `text` parameter through the attachment selector: the note
/// body travels beside the URI, not inside it.
struct NoteResolver;

impl ItemResolver for NoteResolver {
    fn resolve(&self, uri: &ShellUri, attachments: &AttachmentSelector) -> SharedObject {
        let text = uri
            .parameter("text")
            .and_then(|surrogate| attachments.get(surrogate))
            .and_then(|attachment| {
                tabshell::downcast_object::<NoteFigure>(&attachment).map(|note| note.text.clone())
            })
            .unwrap_or_default();
        Rc::new(NoteFigure { text })
    }
}

/// Placement routing: "main" goes to the items area, "side" to the
/// batched sidebar.
struct DemoPlacements {
    main: Rc<ItemsPlacementConnector>,
    side: Rc<SidebarPlacementConnector>,
}

impl PlacementResolver for DemoPlacements {
    fn resolve(
        &self,
        _resolved: &SharedObject,
        uri: &ShellUri,
        _attachments: &AttachmentSelector,
    ) -> Option<Rc<dyn PlacementConnector>> {
        match uri.placement() {
            "main" => Some(self.main.clone()),
            "side" => Some(self.side.clone()),
            _ => None,
        }
    }
}

fn main() {
    let options = tabshell::prefs::options().run();
    let prefs = tabshell::prefs::load_prefs(options.prefs.as_deref());
    let filter = options.log_filter.clone().or(prefs.log_filter.clone());
    tabshell::init_tracing(filter.as_deref());

    let shell = Shell::new();
    let drag = DragDropCoordinator::new(shell.disconnect_table().clone());
    let scheduler = QueueScheduler::new();

    let main_area = Rc::new(
        ItemsPlacementConnector::new()
            .with_drag(drag.clone())
            .activate_new_connections(options.activate_on_open || prefs.activate_on_open),
    );
    let sidebar = SidebarPlacementConnector::new(None, scheduler.clone());

    shell.register_item_resolver("square", "", Rc::new(SquareResolver { shell: shell.clone() }));
    shell.register_item_resolver("circle", "", Rc::new(CircleResolver));
    shell.register_item_resolver("note", "", Rc::new(NoteResolver));
    let placements: Rc<dyn PlacementResolver> = Rc::new(DemoPlacements {
        main: main_area.clone(),
        side: sidebar.clone(),
    });
    shell.register_placement_resolver(&placements);

    let square_uri: ShellUri = "tabapp://main/square?length=125&background=Red"
        .parse()
        .expect("demo uri");
    let square_closer = shell.resolve(square_uri, Vec::new()).open();

    let circle_uri = ShellUri::build()
        .placement("side")
        .module("circle")
        .parameter("radius", "40")
        .end();
    let _circle_closer = shell.resolve(circle_uri, Vec::new()).open();

    let note_uri = ShellUri::build()
        .placement("main")
        .module("note")
        .attachment("text", 0)
        .end();
    let note: SharedObject = Rc::new(NoteFigure {
        text: "shipped alongside the uri".to_string(),
    });
    let _note_closer = shell.resolve(note_uri, vec![note]).open();

    // Apply the sidebar's batched reconciliation.
    scheduler.run_pending();

    println!("main area: {} connected", main_area.connected().len());
    println!("sidebar:   {} connected", sidebar.connected().len());
    println!("registry:  {} resolved ids", shell.registry().resolved_ids().len());

    // Drag the square out of the main area and drop it on the sidebar.
    let main_connected = main_area.connected();
    if let Some(square) = main_connected.first() {
        if drag.drag(square).is_ok() {
            drag.drop_onto(sidebar.clone());
            scheduler.run_pending();
            println!(
                "after drag: main={} side={}",
                main_area.connected().len(),
                sidebar.connected().len()
            );
        }
    }

    square_closer.close();
    scheduler.run_pending();
    println!(
        "after close: registry holds {} objects",
        shell.registry().len()
    );
}
