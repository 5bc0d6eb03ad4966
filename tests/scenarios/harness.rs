use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tabshell::placement::{
    DragDropCoordinator, ItemsPlacementConnector, QueueScheduler, SidebarPlacementConnector,
};
use tabshell::shell::Shell;
use tabshell::{
    AttachmentSelector, Disposable, ItemResolver, PlacementConnector, PlacementResolver,
    Refreshable, ResolvedObjectRegistry, SharedObject, ShellObject, ShellUri,
};

/// A resolvable application object with observable lifecycle.
pub(crate) struct TestFigure {
    pub key: Option<String>,
    pub refreshes: Cell<usize>,
    pub disposed: Cell<bool>,
}

impl TestFigure {
    fn new(key: Option<String>) -> Rc<Self> {
        Rc::new(Self {
            key,
            refreshes: Cell::new(0),
            disposed: Cell::new(false),
        })
    }
}

impl ShellObject for TestFigure {
    fn identity_key(&self) -> Option<String> {
        self.key.clone()
    }

    fn as_refreshable(&self) -> Option<&dyn Refreshable> {
        Some(self)
    }

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}

impl Refreshable for TestFigure {
    fn refresh(&self) {
        self.refreshes.set(self.refreshes.get() + 1);
    }
}

impl Disposable for TestFigure {
    fn dispose(&self) {
        self.disposed.set(true);
    }
}

/// Creates [`TestFigure`]s and records what the pipeline handed it.
#[derive(Default)]
pub(crate) struct FigureResolver {
    pub created: RefCell<Vec<Rc<TestFigure>>>,
    pub seen_uris: RefCell<Vec<ShellUri>>,
    pub seen_payloads: RefCell<Vec<Option<SharedObject>>>,
}

impl ItemResolver for FigureResolver {
    fn resolve(&self, uri: &ShellUri, attachments: &AttachmentSelector) -> SharedObject {
        self.seen_uris.borrow_mut().push(uri.clone());
        // A "payload" parameter is expected to carry an embedded surrogate.
        let payload = uri
            .parameter("payload")
            .and_then(|surrogate| attachments.get(surrogate));
        self.seen_payloads.borrow_mut().push(payload);

        let figure = TestFigure::new(uri.parameter("key").map(ToOwned::to_owned));
        self.created.borrow_mut().push(figure.clone());
        figure
    }
}

struct RigPlacements {
    main: Rc<ItemsPlacementConnector>,
    side: Rc<SidebarPlacementConnector>,
}

impl PlacementResolver for RigPlacements {
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

/// A fully wired shell: items main area, batched sidebar, drag coordinator,
/// and one figure resolver registered as `square`.
pub(crate) struct ShellRig {
    pub shell: Shell,
    pub scheduler: Rc<QueueScheduler>,
    pub drag: Rc<DragDropCoordinator>,
    pub main_area: Rc<ItemsPlacementConnector>,
    pub sidebar: Rc<SidebarPlacementConnector>,
    pub figures: Rc<FigureResolver>,
    _placements: Rc<dyn PlacementResolver>,
}

impl ShellRig {
    pub fn new() -> Self {
        Self::with_registry(Rc::new(ResolvedObjectRegistry::new()))
    }

    pub fn with_capacity(capacity: u16) -> Self {
        Self::with_registry(Rc::new(ResolvedObjectRegistry::with_bounds(1, capacity)))
    }

    fn with_registry(registry: Rc<ResolvedObjectRegistry>) -> Self {
        let shell = Shell::with_registry(registry);
        let drag = DragDropCoordinator::new(shell.disconnect_table().clone());
        let scheduler = QueueScheduler::new();
        let main_area = Rc::new(ItemsPlacementConnector::new().with_drag(drag.clone()));
        let sidebar = SidebarPlacementConnector::new(None, scheduler.clone());

        let figures = Rc::new(FigureResolver::default());
        shell.register_item_resolver("square", "", figures.clone());

        let placements: Rc<dyn PlacementResolver> = Rc::new(RigPlacements {
            main: main_area.clone(),
            side: sidebar.clone(),
        });
        shell.register_placement_resolver(&placements);

        Self {
            shell,
            scheduler,
            drag,
            main_area,
            sidebar,
            figures,
            _placements: placements,
        }
    }

    pub fn square_uri(&self) -> ShellUri {
        "tabapp://main/square?length=125&background=Red"
            .parse()
            .expect("well-formed scenario uri")
    }

    pub fn last_figure(&self) -> Rc<TestFigure> {
        self.figures
            .created
            .borrow()
            .last()
            .expect("a figure was resolved")
            .clone()
    }
}
