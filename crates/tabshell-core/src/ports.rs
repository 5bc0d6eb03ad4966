/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Boundary traits between the kernel and the host shell.
//!
//! Connector implementations, view matching, item/placement resolution, and
//! deferred scheduling are all host concerns; the kernel only names their
//! contracts so the registry, disconnect table, and pipeline can speak about
//! them without depending on any UI code.

use std::collections::HashMap;
use std::rc::Rc;

use crate::object::SharedObject;
use crate::uri::ShellUri;

/// Attaches and detaches a resolved object's view at a UI placement.
pub trait PlacementConnector {
    fn connect(&self, object: &SharedObject);

    fn disconnect(&self, object: &SharedObject);

    /// A connector that pulls fresh content itself opts out of the shell's
    /// post-open refresh broadcast.
    fn refreshes_own_content(&self) -> bool {
        false
    }
}

/// Resolves surrogate ids embedded in URI parameters back to the attachment
/// objects supplied at resolve time. Unknown ids resolve to `None`.
#[derive(Clone, Default)]
pub struct AttachmentSelector {
    inner: Rc<HashMap<String, SharedObject>>,
}

impl AttachmentSelector {
    pub fn new(entries: HashMap<String, SharedObject>) -> Self {
        Self {
            inner: Rc::new(entries),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, surrogate_id: &str) -> Option<SharedObject> {
        self.inner.get(surrogate_id).cloned()
    }
}

/// Creates the application object for a `(module, item)` pair.
pub trait ItemResolver {
    fn resolve(&self, uri: &ShellUri, attachments: &AttachmentSelector) -> SharedObject;
}

/// Chooses where a freshly resolved object is shown. Queried in
/// registration order; the first `Some` connector wins.
pub trait PlacementResolver {
    fn resolve(
        &self,
        resolved: &SharedObject,
        uri: &ShellUri,
        attachments: &AttachmentSelector,
    ) -> Option<Rc<dyn PlacementConnector>>;
}

/// A view bound to a model, as produced by the host's view matcher.
pub trait MatchedView {
    fn view(&self) -> SharedObject;

    /// Whether this view can swap its model in place.
    fn supports_model_change(&self) -> bool {
        false
    }

    /// Whether this view still structurally fits `model`.
    fn is_match_to_model(&self, model: &SharedObject) -> bool {
        let _ = model;
        false
    }

    /// Rebind the view to `model` in place.
    fn change_model(&self, model: &SharedObject) {
        let _ = model;
    }
}

/// The host's capability for finding a view for a model object. A `None`
/// match means the model serves as its own view.
pub trait ViewMatcher {
    fn match_model(&self, model: &SharedObject) -> Option<Rc<dyn MatchedView>>;
}

/// Post-a-callback deferral used by batched connectors. The engine never
/// blocks on a scheduled update; cancelling the handle before it fires
/// drops the callback.
pub trait UpdateScheduler {
    fn schedule(&self, update: Box<dyn FnOnce()>) -> Box<dyn ScheduleHandle>;
}

pub trait ScheduleHandle {
    fn cancel(&self);
}
