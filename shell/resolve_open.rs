/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The resolve operation: one bound URI, executed in a fixed order.
//!
//! Attachment embedding, module-item resolution, placement resolution,
//! connect, register (with connect rollback on registration failure),
//! setup replay, close-action registration, refresh notification.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use tabshell_core::object::downcast_object;
use tabshell_core::uri::attachment_placeholder_index;
use tabshell_core::{
    AttachmentSelector, BroadcastSubscriber, CompositeCloser, Refreshable, ResolvedMetadata,
    SharedObject, ShellError, ShellUri,
};
use uuid::Uuid;

use super::{CHANNEL_SHELL_REFRESH, Shell};

type SetupReplay = Box<dyn FnOnce(&SharedObject, &Rc<CompositeCloser>)>;

/// An unexecuted open, bound to a URI and its attachment array.
pub struct ResolveOpen {
    shell: Shell,
    uri: ShellUri,
    attachments: Vec<SharedObject>,
    setup: Option<SetupReplay>,
}

impl ResolveOpen {
    pub(crate) fn new(shell: Shell, uri: ShellUri, attachments: Vec<SharedObject>) -> Self {
        Self {
            shell,
            uri,
            attachments,
            setup: None,
        }
    }

    /// Register on-ready/on-finished callbacks replayed after a successful
    /// open, when the resolved object's runtime type is `T`. A type
    /// mismatch logs a warning and skips both callbacks without failing
    /// the open. At most one setup per operation; a second request is a
    /// programming error.
    pub fn setup<T: Any>(
        mut self,
        on_ready: impl FnOnce(&T) + 'static,
        on_finished: impl FnOnce(&T) + 'static,
    ) -> Self {
        assert!(
            self.setup.is_none(),
            "setup may be requested at most once per resolve operation"
        );
        self.setup = Some(Box::new(move |object: &SharedObject, closer: &Rc<CompositeCloser>| {
            match downcast_object::<T>(object) {
                Some(target) => on_ready(target),
                None => {
                    log::warn!(
                        "setup requested for {}, resolved object is something else; callbacks skipped",
                        std::any::type_name::<T>()
                    );
                    return;
                }
            }
            let object = object.clone();
            closer.push(move || {
                if let Some(target) = downcast_object::<T>(&object) {
                    on_finished(target);
                }
            });
        }));
        self
    }

    /// Execute the open; any error is logged and swallowed, and the caller
    /// receives a no-op closing handle. Panics (contract violations)
    /// propagate.
    pub fn open(self) -> Rc<CompositeCloser> {
        let uri = self.uri.clone();
        match self.execute() {
            Ok(closer) => closer,
            Err(error) => {
                log::error!("could not open {uri}: {error}");
                CompositeCloser::noop()
            }
        }
    }

    /// Execute the open; errors propagate to callers that want to branch.
    pub fn open_or_err(self) -> Result<Rc<CompositeCloser>, ShellError> {
        self.execute()
    }

    fn execute(self) -> Result<Rc<CompositeCloser>, ShellError> {
        let Self {
            shell,
            uri,
            attachments,
            setup,
        } = self;

        // 1. Attachment embedding rewrites placeholder parameters into
        // surrogate ids the resolver can look up.
        let (uri, selector) = embed_attachments(&uri, &attachments);

        // 2. Module-item resolution.
        let resolver = shell
            .item_resolver(&uri)
            .ok_or_else(|| ShellError::NoItemResolver { uri: uri.clone() })?;
        let resolved = resolver.resolve(&uri, &selector);

        // 3. Placement resolution.
        let connector = shell
            .resolve_placement(&resolved, &uri, &selector)
            .ok_or_else(|| ShellError::NoPlacementResolver { uri: uri.clone() })?;

        // 4./5. Connect, then register. A failed registration rolls the
        // connect back; a failed connect is never rolled back on its own.
        connector.connect(&resolved);
        let metadata = match shell
            .registry()
            .add(&resolved, ResolvedMetadata::new(uri.clone()))
        {
            Ok(metadata) => metadata,
            Err(error) => {
                connector.disconnect(&resolved);
                return Err(error);
            }
        };
        shell.disconnect_table().set_owner(&resolved, connector.clone());
        let closer = metadata.closer().clone();

        // 6. Setup replay.
        if let Some(replay) = setup {
            replay(&resolved, &closer);
        }

        // 7. The standard close action: disconnect through the table's
        // current owner, dispose the object, drop both registrations.
        {
            let shell = shell.clone();
            let object = resolved.clone();
            closer.push(move || close_resolved(&shell, &object));
        }

        // 8. Refresh notification, unless the connector refreshes its own
        // content.
        if !connector.refreshes_own_content() {
            arm_refresh(&shell, &resolved, &closer);
            shell.send_refresh(metadata.id());
        }

        Ok(closer)
    }
}

/// Scan parameter values for `{N}`; each match becomes a fresh surrogate
/// id mapped to `attachments[N]`. Values without a placeholder pass
/// through unchanged, as do placeholders pointing past the attachment
/// array (their surrogate then resolves to nothing).
fn embed_attachments(
    uri: &ShellUri,
    attachments: &[SharedObject],
) -> (ShellUri, AttachmentSelector) {
    let mut surrogates: HashMap<String, SharedObject> = HashMap::new();
    let mut builder = ShellUri::build()
        .placement(uri.placement())
        .owner(uri.owner_id())
        .module(uri.module())
        .item(uri.item());

    for (key, value) in uri.parameters() {
        let value = match attachment_placeholder_index(value) {
            Some(index) => {
                let surrogate = Uuid::new_v4().simple().to_string();
                if let Some(attachment) = attachments.get(index) {
                    surrogates.insert(surrogate.clone(), attachment.clone());
                }
                surrogate
            }
            None => value.to_string(),
        };
        builder = builder.parameter(key, value);
    }

    (builder.end(), AttachmentSelector::new(surrogates))
}

fn close_resolved(shell: &Shell, object: &SharedObject) {
    match shell.disconnect_table().owner_of(object) {
        Ok(owner) => owner.disconnect(object),
        Err(error) => log::warn!("closing an object with no owner: {error}"),
    }
    if let Some(disposable) = object.as_disposable() {
        disposable.dispose();
    }
    if let Err(error) = shell.disconnect_table().remove(object) {
        log::debug!("close found no disconnect entry: {error}");
    }
    shell.registry().remove(object);
}

/// Shim that forwards addressed refresh notices to the object's refresh
/// capability. The close chain keeps it alive and unsubscribes it.
struct RefreshForwarder {
    object: SharedObject,
}

impl BroadcastSubscriber for RefreshForwarder {
    fn deliver(&self, _payload: &dyn Any) {
        if let Some(refreshable) = self.object.as_refreshable() {
            refreshable.refresh();
        }
    }

    fn owner(&self) -> Option<SharedObject> {
        Some(self.object.clone())
    }
}

fn arm_refresh(shell: &Shell, object: &SharedObject, closer: &Rc<CompositeCloser>) {
    if object.as_refreshable().is_none() {
        return;
    }
    let forwarder: Rc<dyn BroadcastSubscriber> = Rc::new(RefreshForwarder {
        object: object.clone(),
    });
    let subscription = shell
        .broadcaster()
        .subscribe(CHANNEL_SHELL_REFRESH, &forwarder);
    closer.push(move || {
        subscription.unsubscribe();
        drop(forwarder);
    });
}
