/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Drag-and-drop ownership transfer.
//!
//! While a drag is in flight the coordinator itself owns the object in the
//! disconnect table, so a shell-initiated close routes through the
//! coordinator's `disconnect` and becomes the cancellation path.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tabshell_core::{
    DisconnectTable, ObjectKey, PlacementConnector, SharedObject, ShellError,
};

use super::{HandlerId, Handlers};

/// Bag key under which a source connector stages the in-flight view.
pub const DRAG_VIEW_KEY: &str = "drag.view";

/// Single mutable drag slot plus a keyed data bag valid only while a drag
/// is active.
pub struct DragDropCoordinator {
    table: Rc<DisconnectTable>,
    self_ref: Weak<DragDropCoordinator>,
    slot: RefCell<Option<SharedObject>>,
    bag: RefCell<HashMap<&'static str, SharedObject>>,
    dragged_closed: Handlers<()>,
}

impl DragDropCoordinator {
    pub fn new(table: Rc<DisconnectTable>) -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            table,
            self_ref: weak.clone(),
            slot: RefCell::new(None),
            bag: RefCell::new(HashMap::new()),
            dragged_closed: Handlers::default(),
        })
    }

    /// Lift `object` out of its current owner and claim ownership for the
    /// duration of the drag. The slot is filled before the owner's
    /// `disconnect` runs so the source connector can stage its view into
    /// the bag instead of disposing it.
    pub fn drag(&self, object: &SharedObject) -> Result<(), ShellError> {
        assert!(self.slot.borrow().is_none(), "a drag is already in progress");
        let owner = self.table.owner_of(object)?;
        *self.slot.borrow_mut() = Some(object.clone());
        owner.disconnect(object);
        let claimed = self
            .self_ref
            .upgrade()
            .expect("coordinators are always Rc-owned");
        self.table.set_owner(object, claimed);
        Ok(())
    }

    /// Hand the dragged object to `target` and end the drag.
    pub fn drop_onto(&self, target: Rc<dyn PlacementConnector>) {
        let object = self
            .slot
            .borrow()
            .clone()
            .unwrap_or_else(|| panic!("drop without an active drag"));
        target.connect(&object);
        self.table.set_owner(&object, target);
        *self.slot.borrow_mut() = None;
        self.bag.borrow_mut().clear();
    }

    pub fn dragged(&self) -> Option<SharedObject> {
        self.slot.borrow().clone()
    }

    pub fn is_dragging(&self, object: &SharedObject) -> bool {
        self.slot
            .borrow()
            .as_ref()
            .is_some_and(|dragged| ObjectKey::of(dragged) == ObjectKey::of(object))
    }

    pub fn set_data(&self, key: &'static str, value: SharedObject) {
        self.assert_drag_active();
        self.bag.borrow_mut().insert(key, value);
    }

    pub fn data(&self, key: &'static str) -> Option<SharedObject> {
        self.assert_drag_active();
        self.bag.borrow().get(key).cloned()
    }

    pub fn take_data(&self, key: &'static str) -> Option<SharedObject> {
        self.assert_drag_active();
        self.bag.borrow_mut().remove(key)
    }

    pub fn has_data(&self, key: &'static str) -> bool {
        self.assert_drag_active();
        self.bag.borrow().contains_key(key)
    }

    pub fn on_dragged_closed(&self, handler: impl Fn(&()) + 'static) -> HandlerId {
        self.dragged_closed.subscribe(handler)
    }

    fn assert_drag_active(&self) {
        assert!(
            self.slot.borrow().is_some(),
            "drag data bag used outside an active drag"
        );
    }
}

impl PlacementConnector for DragDropCoordinator {
    // The coordinator only ever owns; nothing connects through it.
    fn connect(&self, _object: &SharedObject) {}

    /// Cancellation path: a shell-initiated close reached the coordinator
    /// while it owned the dragged object. Disposes every disposable value
    /// staged in the bag, raises dragged-closed exactly once, and clears
    /// the slot.
    fn disconnect(&self, object: &SharedObject) {
        if !self.is_dragging(object) {
            log::warn!("disconnect for an object the drag coordinator does not hold");
            return;
        }
        let staged = std::mem::take(&mut *self.bag.borrow_mut());
        for value in staged.into_values() {
            if let Some(disposable) = value.as_disposable() {
                disposable.dispose();
            }
        }
        self.dragged_closed.raise(&());
        *self.slot.borrow_mut() = None;
    }
}
