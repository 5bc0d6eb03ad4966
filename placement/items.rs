/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The immediate placement connector: connect/disconnect/move apply
//! synchronously, one change block per operation.

use std::cell::Cell;
use std::rc::Rc;

use tabshell_core::{
    ObjectKey, PlacementConnector, SharedObject, ShellError, ViewMatcher,
};

use super::change_block::ConnectorCore;
use super::drag::{DRAG_VIEW_KEY, DragDropCoordinator};
use super::{ActiveChanged, ConnectedChanged, HandlerId};

pub struct ItemsPlacementConnector {
    core: ConnectorCore,
    view_matcher: Option<Rc<dyn ViewMatcher>>,
    drag: Option<Rc<DragDropCoordinator>>,
    activate_on_connect: Cell<bool>,
    owns_refresh: Cell<bool>,
}

impl Default for ItemsPlacementConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemsPlacementConnector {
    pub fn new() -> Self {
        Self {
            core: ConnectorCore::new(),
            view_matcher: None,
            drag: None,
            activate_on_connect: Cell::new(false),
            owns_refresh: Cell::new(false),
        }
    }

    pub fn with_view_matcher(mut self, matcher: Rc<dyn ViewMatcher>) -> Self {
        self.view_matcher = Some(matcher);
        self
    }

    pub fn with_drag(mut self, drag: Rc<DragDropCoordinator>) -> Self {
        self.drag = Some(drag);
        self
    }

    /// Newly connected objects become active immediately.
    pub fn activate_new_connections(self, activate: bool) -> Self {
        self.activate_on_connect.set(activate);
        self
    }

    /// This connector pulls fresh content itself; the shell skips its
    /// post-open refresh broadcast.
    pub fn owns_content_refresh(self, owns: bool) -> Self {
        self.owns_refresh.set(owns);
        self
    }

    pub fn connected(&self) -> Vec<SharedObject> {
        self.core.connected()
    }

    pub fn views(&self) -> Vec<SharedObject> {
        self.core.views()
    }

    pub fn active(&self) -> Option<SharedObject> {
        self.core.active()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.core.active_index()
    }

    pub fn set_active(&self, object: Option<&SharedObject>) -> Result<(), ShellError> {
        if self.core.in_cursor_sync() {
            return Ok(());
        }
        let requested = match object {
            Some(object) => {
                self.core.index_of(object).ok_or(ShellError::NotConnected)?;
                Some(object.clone())
            }
            None => None,
        };
        let mut block = self.core.begin_change();
        block.request_active(requested);
        block.end();
        Ok(())
    }

    /// Relocate `object` to `new_index` in both sequences. Already there is
    /// a no-op; no events are raised for it.
    pub fn move_connected(&self, object: &SharedObject, new_index: usize) -> Result<(), ShellError> {
        if self.core.in_cursor_sync() {
            return Ok(());
        }
        let index = self.core.index_of(object).ok_or(ShellError::NotConnected)?;
        if index == new_index {
            return Ok(());
        }
        let mut block = self.core.begin_change();
        block.relocate(index, new_index);
        block.end();
        Ok(())
    }

    pub fn on_connected_changed(&self, handler: impl Fn(&ConnectedChanged) + 'static) -> HandlerId {
        self.core.connected_changed.subscribe(handler)
    }

    pub fn on_active_changed(&self, handler: impl Fn(&ActiveChanged) + 'static) -> HandlerId {
        self.core.active_changed.subscribe(handler)
    }

    pub fn set_cursor_hook(&self, hook: impl Fn(Option<usize>) + 'static) {
        self.core.set_cursor_hook(hook);
    }

    /// Mid-drag objects travel with their staged view; otherwise ask the
    /// matcher, and fall back to the object presenting itself.
    fn choose_view(&self, object: &SharedObject) -> SharedObject {
        if let Some(drag) = &self.drag
            && drag.is_dragging(object)
            && let Some(view) = drag.take_data(DRAG_VIEW_KEY)
        {
            return view;
        }
        if let Some(matcher) = &self.view_matcher
            && let Some(matched) = matcher.match_model(object)
        {
            return matched.view();
        }
        object.clone()
    }
}

impl PlacementConnector for ItemsPlacementConnector {
    fn connect(&self, object: &SharedObject) {
        if self.core.in_cursor_sync() {
            return;
        }
        let view = self.choose_view(object);
        let mut block = self.core.begin_change();
        block.insert(self.core.len(), object.clone(), view);
        if self.activate_on_connect.get() {
            block.request_active(Some(object.clone()));
        }
        block.end();
    }

    fn disconnect(&self, object: &SharedObject) {
        if self.core.in_cursor_sync() {
            return;
        }
        let Some(index) = self.core.index_of(object) else {
            log::warn!("disconnect of an object this connector does not hold");
            return;
        };

        // Next active is decided before anything is removed: the following
        // item, else the preceding item, else none.
        let was_active = self.core.active_index() == Some(index);
        let requested = if was_active {
            let len = self.core.len();
            if len == 1 {
                None
            } else if index + 1 < len {
                Some(self.core.connected_at(index + 1))
            } else {
                Some(self.core.connected_at(index - 1))
            }
        } else {
            self.core.active()
        };

        let mut block = self.core.begin_change();
        let (_, view) = block.remove(index);
        block.request_active(requested);

        if let Some(drag) = &self.drag
            && drag.is_dragging(object)
        {
            drag.set_data(DRAG_VIEW_KEY, view);
        } else if ObjectKey::of(&view) != ObjectKey::of(object)
            && let Some(disposable) = view.as_disposable()
        {
            disposable.dispose();
        }
        block.end();
    }

    fn refreshes_own_content(&self) -> bool {
        self.owns_refresh.get()
    }
}
