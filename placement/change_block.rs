/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shared connector state and the atomic change block both placement
//! connector variants mutate through.

use std::cell::{Cell, RefCell};

use tabshell_core::{ObjectKey, SharedObject};

use super::{ActiveChanged, ConnectedChangeAction, ConnectedChanged, Handlers};

/// Parallel `connected`/`views` sequences plus the active index, guarded by
/// one re-entrancy flag. Connectors never call back into themselves; a
/// nested `begin_change` is a programming error and panics.
pub(crate) struct ConnectorCore {
    connected: RefCell<Vec<SharedObject>>,
    views: RefCell<Vec<SharedObject>>,
    active: Cell<Option<usize>>,
    changing: Cell<bool>,
    syncing_cursor: Cell<bool>,
    pub(crate) connected_changed: Handlers<ConnectedChanged>,
    pub(crate) active_changed: Handlers<ActiveChanged>,
    cursor_hook: RefCell<Option<Box<dyn Fn(Option<usize>)>>>,
}

impl ConnectorCore {
    pub(crate) fn new() -> Self {
        Self {
            connected: RefCell::new(Vec::new()),
            views: RefCell::new(Vec::new()),
            active: Cell::new(None),
            changing: Cell::new(false),
            syncing_cursor: Cell::new(false),
            connected_changed: Handlers::default(),
            active_changed: Handlers::default(),
            cursor_hook: RefCell::new(None),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.connected.borrow().len()
    }

    pub(crate) fn connected(&self) -> Vec<SharedObject> {
        self.connected.borrow().clone()
    }

    pub(crate) fn views(&self) -> Vec<SharedObject> {
        self.views.borrow().clone()
    }

    pub(crate) fn connected_at(&self, index: usize) -> SharedObject {
        self.connected.borrow()[index].clone()
    }

    pub(crate) fn view_at(&self, index: usize) -> SharedObject {
        self.views.borrow()[index].clone()
    }

    pub(crate) fn index_of(&self, object: &SharedObject) -> Option<usize> {
        let key = ObjectKey::of(object);
        self.connected
            .borrow()
            .iter()
            .position(|candidate| ObjectKey::of(candidate) == key)
    }

    pub(crate) fn active_index(&self) -> Option<usize> {
        self.active.get()
    }

    pub(crate) fn active(&self) -> Option<SharedObject> {
        self.active.get().map(|index| self.connected_at(index))
    }

    /// True while the block end is pushing the current-item cursor out to
    /// the host; mutations arriving as feedback are ignored by callers.
    pub(crate) fn in_cursor_sync(&self) -> bool {
        self.syncing_cursor.get()
    }

    pub(crate) fn set_cursor_hook(&self, hook: impl Fn(Option<usize>) + 'static) {
        *self.cursor_hook.borrow_mut() = Some(Box::new(hook));
    }

    pub(crate) fn begin_change(&self) -> ChangeBlock<'_> {
        assert!(
            !self.changing.replace(true),
            "re-entrant connector change: connectors never call back into themselves"
        );
        let old_active = self.active();
        ChangeBlock {
            core: self,
            requested_active: old_active.clone(),
            old_active,
            connects: Vec::new(),
            moves: Vec::new(),
            disconnects: Vec::new(),
        }
    }
}

fn same_object(a: &Option<SharedObject>, b: &Option<SharedObject>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => ObjectKey::of(a) == ObjectKey::of(b),
        _ => false,
    }
}

/// One atomic mutation of a connector's sequences.
///
/// `end` recomputes the active index from the requested new-active object,
/// raises connect/move sub-changes before the active change, disconnect
/// sub-changes after it, and finally synchronizes the externally observed
/// cursor under the feedback guard.
pub(crate) struct ChangeBlock<'a> {
    core: &'a ConnectorCore,
    old_active: Option<SharedObject>,
    requested_active: Option<SharedObject>,
    connects: Vec<SharedObject>,
    moves: Vec<SharedObject>,
    disconnects: Vec<SharedObject>,
}

impl ChangeBlock<'_> {
    pub(crate) fn insert(&mut self, index: usize, object: SharedObject, view: SharedObject) {
        self.core.connected.borrow_mut().insert(index, object.clone());
        self.core.views.borrow_mut().insert(index, view);
        self.connects.push(object);
    }

    pub(crate) fn remove(&mut self, index: usize) -> (SharedObject, SharedObject) {
        let object = self.core.connected.borrow_mut().remove(index);
        let view = self.core.views.borrow_mut().remove(index);
        self.disconnects.push(object.clone());
        (object, view)
    }

    pub(crate) fn relocate(&mut self, from: usize, to: usize) {
        let object = {
            let mut connected = self.core.connected.borrow_mut();
            let object = connected.remove(from);
            connected.insert(to, object.clone());
            object
        };
        {
            let mut views = self.core.views.borrow_mut();
            let view = views.remove(from);
            views.insert(to, view);
        }
        self.moves.push(object);
    }

    pub(crate) fn request_active(&mut self, active: Option<SharedObject>) {
        self.requested_active = active;
    }

    pub(crate) fn end(self) {
        let core = self.core;

        let new_index = self
            .requested_active
            .as_ref()
            .and_then(|object| core.index_of(object));
        core.active.set(new_index);
        let new_active = new_index.map(|index| core.connected_at(index));

        for object in &self.connects {
            core.connected_changed.raise(&ConnectedChanged {
                action: ConnectedChangeAction::Connect,
                object: object.clone(),
            });
        }
        for object in &self.moves {
            core.connected_changed.raise(&ConnectedChanged {
                action: ConnectedChangeAction::Move,
                object: object.clone(),
            });
        }

        if !same_object(&self.old_active, &new_active) {
            core.active_changed.raise(&ActiveChanged {
                old: self.old_active.clone(),
                new: new_active,
            });
        }

        for object in &self.disconnects {
            core.connected_changed.raise(&ConnectedChanged {
                action: ConnectedChangeAction::Disconnect,
                object: object.clone(),
            });
        }

        core.syncing_cursor.set(true);
        if let Some(hook) = core.cursor_hook.borrow().as_ref() {
            hook(new_index);
        }
        core.syncing_cursor.set(false);

        core.changing.set(false);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use tabshell_core::ShellObject;

    use super::*;

    struct Obj;
    impl ShellObject for Obj {}

    fn obj() -> SharedObject {
        Rc::new(Obj)
    }

    #[test]
    fn sequences_stay_index_correspondent() {
        let core = ConnectorCore::new();
        let (a, va) = (obj(), obj());
        let (b, vb) = (obj(), obj());

        let mut block = core.begin_change();
        block.insert(0, a.clone(), va.clone());
        block.insert(1, b.clone(), vb.clone());
        block.end();

        assert_eq!(core.len(), 2);
        assert_eq!(ObjectKey::of(&core.view_at(0)), ObjectKey::of(&va));
        assert_eq!(ObjectKey::of(&core.view_at(1)), ObjectKey::of(&vb));

        let mut block = core.begin_change();
        block.relocate(0, 1);
        block.end();
        assert_eq!(ObjectKey::of(&core.connected_at(1)), ObjectKey::of(&a));
        assert_eq!(ObjectKey::of(&core.view_at(1)), ObjectKey::of(&va));
    }

    #[test]
    fn active_index_tracks_the_requested_object_across_mutations() {
        let core = ConnectorCore::new();
        let (a, b) = (obj(), obj());

        let mut block = core.begin_change();
        block.insert(0, a.clone(), obj());
        block.insert(1, b.clone(), obj());
        block.request_active(Some(b.clone()));
        block.end();
        assert_eq!(core.active_index(), Some(1));

        let mut block = core.begin_change();
        block.relocate(1, 0);
        block.end();
        assert_eq!(core.active_index(), Some(0), "active follows its object");
    }

    #[test]
    #[should_panic(expected = "re-entrant connector change")]
    fn nested_change_blocks_panic() {
        let core = ConnectorCore::new();
        let _outer = core.begin_change();
        let _inner = core.begin_change();
    }

    #[test]
    fn cursor_hook_runs_under_the_feedback_guard() {
        let core = Rc::new(ConnectorCore::new());
        let observed = Rc::new(RefCell::new(Vec::new()));
        {
            let hook_core = core.clone();
            let hook_observed = observed.clone();
            // Reads the guard the way a feedback-prone consumer would.
            core.set_cursor_hook(move |index| {
                hook_observed
                    .borrow_mut()
                    .push((index, hook_core.in_cursor_sync()));
            });
        }

        let mut block = core.begin_change();
        let first = obj();
        block.insert(0, first.clone(), obj());
        block.request_active(Some(first));
        block.end();

        assert_eq!(*observed.borrow(), [(Some(0), true)]);
        assert!(!core.in_cursor_sync());
    }
}
