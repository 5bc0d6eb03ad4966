/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Placement connectors: where resolved objects are shown.
//!
//! Both connector variants share one state core: parallel `connected` /
//! `views` sequences and an active index, mutated only inside a single
//! atomic change block per public operation. The block computes the new
//! active index exactly once and raises change events in a fixed order.

pub(crate) mod change_block;
pub mod drag;
pub mod items;
pub mod scheduler;
pub mod sidebar;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tabshell_core::SharedObject;

pub use drag::{DRAG_VIEW_KEY, DragDropCoordinator};
pub use items::ItemsPlacementConnector;
pub use scheduler::QueueScheduler;
pub use sidebar::SidebarPlacementConnector;

/// What a connected-changed event reports about its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectedChangeAction {
    Connect,
    Disconnect,
    Move,
}

/// A connector's connected sequence changed.
#[derive(Clone)]
pub struct ConnectedChanged {
    pub action: ConnectedChangeAction,
    pub object: SharedObject,
}

/// A connector's active object changed.
#[derive(Clone)]
pub struct ActiveChanged {
    pub old: Option<SharedObject>,
    pub new: Option<SharedObject>,
}

/// Handle for removing a registered event handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

/// Ordered list of strongly-held event handlers.
///
/// Connector events are scoped to the connector's own lifetime, so unlike
/// the broadcaster there is nothing to hold weakly here; callers remove
/// handlers explicitly.
pub struct Handlers<T> {
    entries: RefCell<Vec<(HandlerId, Rc<dyn Fn(&T)>)>>,
    next: Cell<u64>,
}

impl<T> Default for Handlers<T> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next: Cell::new(0),
        }
    }
}

impl<T> Handlers<T> {
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> HandlerId {
        let id = HandlerId(self.next.get());
        self.next.set(self.next.get() + 1);
        self.entries.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: HandlerId) {
        self.entries.borrow_mut().retain(|(entry, _)| *entry != id);
    }

    pub(crate) fn raise(&self, event: &T) {
        let snapshot: Vec<Rc<dyn Fn(&T)>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in snapshot {
            handler(event);
        }
    }
}
