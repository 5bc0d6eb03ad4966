/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The stateless orchestration facade over the resolve-open pipeline.
//!
//! The shell holds the registry, the disconnect table, the broadcaster, the
//! module-item resolver index, and a weakly held list of placement
//! resolvers. `resolve` binds a URI and its attachments into an unexecuted
//! [`ResolveOpen`]; everything else happens when the operation opens.
//! `Shell` is a cheap handle: clones share all state.

pub mod resolve_open;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tabshell_core::{
    AttachmentSelector, DisconnectTable, EventBroadcaster, ItemResolver, PlacementConnector,
    PlacementResolver, ResolvedId, ResolvedObjectRegistry, SharedObject, ShellUri,
};

pub use resolve_open::ResolveOpen;

/// Broadcast channel carrying "re-read your parameters" notices, addressed
/// by resolved id.
pub const CHANNEL_SHELL_REFRESH: &str = "shell.resolved.refresh";

#[derive(Clone)]
pub struct Shell {
    registry: Rc<ResolvedObjectRegistry>,
    disconnect: Rc<DisconnectTable>,
    broadcaster: Rc<EventBroadcaster>,
    item_resolvers: Rc<RefCell<HashMap<(String, String), Rc<dyn ItemResolver>>>>,
    placement_resolvers: Rc<RefCell<Vec<Weak<dyn PlacementResolver>>>>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        Self::with_registry(Rc::new(ResolvedObjectRegistry::new()))
    }

    /// Shell over a caller-supplied registry (narrow id bounds in tests).
    pub fn with_registry(registry: Rc<ResolvedObjectRegistry>) -> Self {
        Self {
            registry,
            disconnect: Rc::new(DisconnectTable::new()),
            broadcaster: Rc::new(EventBroadcaster::new()),
            item_resolvers: Rc::new(RefCell::new(HashMap::new())),
            placement_resolvers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn registry(&self) -> &Rc<ResolvedObjectRegistry> {
        &self.registry
    }

    pub fn disconnect_table(&self) -> &Rc<DisconnectTable> {
        &self.disconnect
    }

    pub fn broadcaster(&self) -> &Rc<EventBroadcaster> {
        &self.broadcaster
    }

    /// Index a module-item resolver. Keys are case-insensitive.
    pub fn register_item_resolver(
        &self,
        module: &str,
        item: &str,
        resolver: Rc<dyn ItemResolver>,
    ) {
        self.item_resolvers.borrow_mut().insert(
            (module.to_ascii_lowercase(), item.to_ascii_lowercase()),
            resolver,
        );
    }

    /// Append a placement resolver. The list holds it weakly: a resolver
    /// dropped by its owner stops being consulted without deregistration.
    pub fn register_placement_resolver(&self, resolver: &Rc<dyn PlacementResolver>) {
        self.placement_resolvers
            .borrow_mut()
            .push(Rc::downgrade(resolver));
    }

    /// Bind `uri` and its attachments into an unexecuted resolve operation.
    pub fn resolve(&self, uri: ShellUri, attachments: Vec<SharedObject>) -> ResolveOpen {
        ResolveOpen::new(self.clone(), uri, attachments)
    }

    /// Ask the object holding `id` to re-read its current parameters.
    /// Delivery is bounded to the one live subscriber addressed by the id.
    pub fn send_refresh(&self, id: ResolvedId) {
        let registry = self.registry.clone();
        self.broadcaster.send_addressed(
            CHANNEL_SHELL_REFRESH,
            &id,
            id,
            &move |object| registry.id_of(object),
        );
    }

    pub(crate) fn item_resolver(&self, uri: &ShellUri) -> Option<Rc<dyn ItemResolver>> {
        let key = (
            uri.module().to_ascii_lowercase(),
            uri.item().to_ascii_lowercase(),
        );
        self.item_resolvers.borrow().get(&key).cloned()
    }

    /// First non-null connector wins, in registration order. Dead weak
    /// entries are pruned in the same pass.
    pub(crate) fn resolve_placement(
        &self,
        resolved: &SharedObject,
        uri: &ShellUri,
        attachments: &AttachmentSelector,
    ) -> Option<Rc<dyn PlacementConnector>> {
        let live: Vec<Rc<dyn PlacementResolver>> = {
            let mut resolvers = self.placement_resolvers.borrow_mut();
            let mut upgraded = Vec::with_capacity(resolvers.len());
            resolvers.retain(|weak| {
                if let Some(resolver) = weak.upgrade() {
                    upgraded.push(resolver);
                    true
                } else {
                    false
                }
            });
            upgraded
        };

        live.into_iter()
            .find_map(|resolver| resolver.resolve(resolved, uri, attachments))
    }
}
