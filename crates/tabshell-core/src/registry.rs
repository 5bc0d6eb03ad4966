/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Bookkeeping for every object the shell currently holds open: the URI it
//! was opened from, its close chain, and a unique id drawn from the bounded
//! owner-id space of the URI codec.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use rand::Rng;

use crate::error::ShellError;
use crate::object::{ObjectKey, SharedObject};
use crate::uri::{MAX_RESOLVED_ID, MIN_RESOLVED_ID, NO_OWNER_ID, ShellUri};

/// Unique id of a currently-held resolved object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedId(u16);

impl ResolvedId {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ResolvedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered, appendable aggregate of close actions with single-shot
/// execution. Actions pushed after the closer already ran are executed
/// immediately.
#[derive(Default)]
pub struct CompositeCloser {
    actions: RefCell<Vec<Box<dyn FnOnce()>>>,
    closed: Cell<bool>,
}

impl std::fmt::Debug for CompositeCloser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeCloser")
            .field("actions", &self.actions.borrow().len())
            .field("closed", &self.closed.get())
            .finish()
    }
}

impl CompositeCloser {
    pub fn new() -> Self {
        Self::default()
    }

    /// An already-spent closer; closing it does nothing.
    pub fn noop() -> Rc<Self> {
        let closer = Rc::new(Self::new());
        closer.closed.set(true);
        closer
    }

    pub fn push(&self, action: impl FnOnce() + 'static) {
        if self.closed.get() {
            action();
            return;
        }
        self.actions.borrow_mut().push(Box::new(action));
    }

    /// Run every recorded action in registration order, exactly once.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        let actions = self.actions.take();
        for action in actions {
            action();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

/// Per-object metadata held by the registry for the object's lifetime.
pub struct ResolvedMetadata {
    uri: ShellUri,
    closer: Rc<CompositeCloser>,
    id: Cell<u16>,
}

impl ResolvedMetadata {
    pub fn new(uri: ShellUri) -> Self {
        Self {
            uri,
            closer: Rc::new(CompositeCloser::new()),
            id: Cell::new(NO_OWNER_ID),
        }
    }

    /// The URI this object was opened from.
    pub fn uri(&self) -> &ShellUri {
        &self.uri
    }

    pub fn closer(&self) -> &Rc<CompositeCloser> {
        &self.closer
    }

    /// The id assigned at registration.
    ///
    /// Panics when the metadata was never added to a registry; ids exist
    /// only for held objects.
    pub fn id(&self) -> ResolvedId {
        let raw = self.id.get();
        assert!(raw != NO_OWNER_ID, "metadata has not been registered");
        ResolvedId(raw)
    }

    fn assign(&self, id: u16) {
        self.id.set(id);
    }
}

struct RegistryEntry {
    object: SharedObject,
    metadata: Rc<ResolvedMetadata>,
}

#[derive(Default)]
struct RegistryInner {
    by_object: HashMap<ObjectKey, RegistryEntry>,
    by_id: HashMap<u16, ObjectKey>,
}

/// Bidirectional map of held objects: identity → metadata and id → object.
///
/// Ids are rejection-sampled from the bounded space, so no two live entries
/// ever share one; a freed id returns to the pool on removal.
pub struct ResolvedObjectRegistry {
    min_id: u16,
    max_id: u16,
    inner: RefCell<RegistryInner>,
}

impl Default for ResolvedObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolvedObjectRegistry {
    pub fn new() -> Self {
        Self::with_bounds(MIN_RESOLVED_ID, MAX_RESOLVED_ID)
    }

    /// Registry over a narrower id space. Bounds stay inside the codec's
    /// encodable owner-id range.
    pub fn with_bounds(min_id: u16, max_id: u16) -> Self {
        assert!(min_id >= MIN_RESOLVED_ID && min_id <= max_id, "invalid id bounds");
        Self {
            min_id,
            max_id,
            inner: RefCell::new(RegistryInner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        usize::from(self.max_id - self.min_id) + 1
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().by_object.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().by_object.is_empty()
    }

    /// Hold `object`, assign it a fresh id, and return its stored metadata.
    pub fn add(
        &self,
        object: &SharedObject,
        metadata: ResolvedMetadata,
    ) -> Result<Rc<ResolvedMetadata>, ShellError> {
        let key = ObjectKey::of(object);
        let mut inner = self.inner.borrow_mut();
        if inner.by_object.contains_key(&key) {
            return Err(ShellError::DuplicateObject);
        }
        if inner.by_id.len() >= self.capacity() {
            return Err(ShellError::IdSpaceExhausted {
                capacity: self.capacity(),
            });
        }

        let mut rng = rand::thread_rng();
        let id = loop {
            let candidate = rng.gen_range(self.min_id..=self.max_id);
            if !inner.by_id.contains_key(&candidate) {
                break candidate;
            }
        };

        metadata.assign(id);
        let metadata = Rc::new(metadata);
        inner.by_id.insert(id, key);
        inner.by_object.insert(
            key,
            RegistryEntry {
                object: object.clone(),
                metadata: metadata.clone(),
            },
        );
        Ok(metadata)
    }

    /// Release `object` and return its id to the pool. Removing an object
    /// that was never held is a silent no-op.
    pub fn remove(&self, object: &SharedObject) {
        let key = ObjectKey::of(object);
        let mut inner = self.inner.borrow_mut();
        if let Some(entry) = inner.by_object.remove(&key) {
            inner.by_id.remove(&entry.metadata.id().get());
        }
    }

    pub fn get(&self, id: ResolvedId) -> Result<SharedObject, ShellError> {
        let inner = self.inner.borrow();
        inner
            .by_id
            .get(&id.get())
            .and_then(|key| inner.by_object.get(key))
            .map(|entry| entry.object.clone())
            .ok_or(ShellError::UnknownId(id))
    }

    pub fn metadata(&self, object: &SharedObject) -> Result<Rc<ResolvedMetadata>, ShellError> {
        self.inner
            .borrow()
            .by_object
            .get(&ObjectKey::of(object))
            .map(|entry| entry.metadata.clone())
            .ok_or(ShellError::NotRegistered)
    }

    pub fn contains(&self, object: &SharedObject) -> bool {
        self.inner.borrow().by_object.contains_key(&ObjectKey::of(object))
    }

    /// Id of a held object, `None` when not held. Used by addressed
    /// broadcast delivery to check liveness.
    pub fn id_of(&self, object: &SharedObject) -> Option<ResolvedId> {
        self.inner
            .borrow()
            .by_object
            .get(&ObjectKey::of(object))
            .map(|entry| entry.metadata.id())
    }

    pub fn resolved_ids(&self) -> Vec<ResolvedId> {
        self.inner
            .borrow()
            .by_id
            .keys()
            .map(|raw| ResolvedId(*raw))
            .collect()
    }
}
