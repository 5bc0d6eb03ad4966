//! Strict object → owning-connector table.
//!
//! Every object connected to any UI placement has exactly one entry here.
//! Misses are consistency errors, never `None`: callers reach this table
//! only for objects they already know are connected. Contrast with registry
//! removal, which tolerates absent objects silently.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::ShellError;
use crate::object::{ObjectKey, SharedObject};
use crate::ports::PlacementConnector;

struct TableEntry {
    object: SharedObject,
    owner: Rc<dyn PlacementConnector>,
}

#[derive(Default)]
pub struct DisconnectTable {
    inner: RefCell<HashMap<ObjectKey, TableEntry>>,
}

impl DisconnectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `owner` as the connector currently holding `object`,
    /// overwriting any previous owner.
    pub fn set_owner(&self, object: &SharedObject, owner: Rc<dyn PlacementConnector>) {
        self.inner.borrow_mut().insert(
            ObjectKey::of(object),
            TableEntry {
                object: object.clone(),
                owner,
            },
        );
    }

    pub fn owner_of(&self, object: &SharedObject) -> Result<Rc<dyn PlacementConnector>, ShellError> {
        self.inner
            .borrow()
            .get(&ObjectKey::of(object))
            .map(|entry| entry.owner.clone())
            .ok_or(ShellError::NotConnected)
    }

    pub fn remove(&self, object: &SharedObject) -> Result<(), ShellError> {
        self.inner
            .borrow_mut()
            .remove(&ObjectKey::of(object))
            .map(|_| ())
            .ok_or(ShellError::NotConnected)
    }

    pub fn contains(&self, object: &SharedObject) -> bool {
        self.inner.borrow().contains_key(&ObjectKey::of(object))
    }
}
