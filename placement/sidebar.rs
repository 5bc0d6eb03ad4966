/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The batched placement connector.
//!
//! Connect and disconnect do not touch connector state synchronously; they
//! edit the desired set and schedule exactly one deferred reconciliation.
//! Re-scheduling cancels any not-yet-run predecessor, so within a batching
//! window the last writer wins. Reconciliation rebuilds the connected
//! sequence, reuses views for keyed objects whose previous view still
//! structurally matches, and restores activation from the activity history.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::{Rc, Weak};

use tabshell_core::{
    Disposable, MatchedView, ObjectKey, PlacementConnector, ScheduleHandle, SharedObject,
    ShellError, UpdateScheduler, ViewMatcher,
};

use super::change_block::ConnectorCore;
use super::{ActiveChanged, ConnectedChanged, HandlerId};

struct OldEntry {
    object: SharedObject,
    view: SharedObject,
    matched: Option<Rc<dyn MatchedView>>,
}

pub struct SidebarPlacementConnector {
    core: ConnectorCore,
    view_matcher: Option<Rc<dyn ViewMatcher>>,
    scheduler: Rc<dyn UpdateScheduler>,
    self_ref: Weak<SidebarPlacementConnector>,
    /// The connected set as it should look after the next reconciliation.
    desired: RefCell<Vec<SharedObject>>,
    schedule: RefCell<Option<Box<dyn ScheduleHandle>>>,
    /// Unordered identity of the present key set → key of the last active
    /// object for that exact set.
    history: RefCell<HashMap<BTreeSet<String>, String>>,
    /// Match results parallel to the connected sequence; `None` for
    /// self-presenting objects.
    matches: RefCell<Vec<Option<Rc<dyn MatchedView>>>>,
}

impl SidebarPlacementConnector {
    pub fn new(
        view_matcher: Option<Rc<dyn ViewMatcher>>,
        scheduler: Rc<dyn UpdateScheduler>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            core: ConnectorCore::new(),
            view_matcher,
            scheduler,
            self_ref: weak.clone(),
            desired: RefCell::new(Vec::new()),
            schedule: RefCell::new(None),
            history: RefCell::new(HashMap::new()),
            matches: RefCell::new(Vec::new()),
        })
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

    /// Order is derived here, never user-controlled.
    pub fn move_connected(&self, _object: &SharedObject, _new_index: usize) -> Result<(), ShellError> {
        Err(ShellError::MoveUnsupported)
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

    fn reschedule(&self) {
        if let Some(previous) = self.schedule.borrow_mut().take() {
            previous.cancel();
        }
        let weak = self.self_ref.clone();
        let handle = self.scheduler.schedule(Box::new(move || {
            if let Some(connector) = weak.upgrade() {
                connector.update();
            }
        }));
        *self.schedule.borrow_mut() = Some(handle);
    }

    /// The deferred reconciliation: record activity, rebuild the connected
    /// sequence from the desired set, then restore activation.
    fn update(&self) {
        self.schedule.borrow_mut().take();

        // (1) Remember which key was active for the set that is about to be
        // replaced. Skipped when nothing is connected or when some
        // connected object has no key.
        let connected = self.core.connected();
        if !connected.is_empty() {
            let keys: Vec<Option<String>> = connected.iter().map(|o| o.identity_key()).collect();
            if keys.iter().all(Option::is_some)
                && let Some(active) = self.core.active()
                && let Some(active_key) = active.identity_key()
            {
                let present: BTreeSet<String> = keys.into_iter().flatten().collect();
                self.history.borrow_mut().insert(present, active_key);
            }
        }

        let desired = self.desired.borrow().clone();
        let mut block = self.core.begin_change();

        // (2) Disconnect everything currently connected.
        let old_matches: Vec<Option<Rc<dyn MatchedView>>> = self.matches.take();
        let mut reusable: HashMap<String, OldEntry> = HashMap::new();
        let mut orphans: Vec<OldEntry> = Vec::new();
        for matched in old_matches {
            let (object, view) = block.remove(0);
            let entry = OldEntry {
                object,
                view,
                matched,
            };
            match entry.object.identity_key() {
                Some(key) => {
                    if let Some(displaced) = reusable.insert(key, entry) {
                        orphans.push(displaced);
                    }
                }
                None => orphans.push(entry),
            }
        }

        // (3) Rebuild. A keyed object reclaims its previous view only when
        // that view can change models and still structurally matches; a
        // keyed object whose view fails the match gets a fresh view, the
        // same outcome as the keyless rule below but a separate branch by
        // design.
        let mut new_matches = Vec::with_capacity(desired.len());
        for object in &desired {
            let (view, matched) = match object.identity_key() {
                // Keyless objects never reuse a view across reconciliations.
                None => self.fresh_view(object),
                Some(key) => match reusable.remove(&key) {
                    Some(OldEntry {
                        view,
                        matched: Some(matched),
                        ..
                    }) if matched.supports_model_change() && matched.is_match_to_model(object) => {
                        matched.change_model(object);
                        (view, Some(matched))
                    }
                    Some(entry) => {
                        orphans.push(entry);
                        self.fresh_view(object)
                    }
                    None => self.fresh_view(object),
                },
            };
            let index = self.core.len();
            block.insert(index, object.clone(), view);
            new_matches.push(matched);
        }

        // (4) Dispose every view no reused match retained.
        for entry in reusable.into_values().chain(orphans) {
            dispose_view(&entry.view, &entry.object);
        }

        // (5) Restore activation: the recorded key for this exact key set,
        // else the first connected object.
        let new_connected = self.core.connected();
        let mut requested = new_connected.first().cloned();
        let keys: Vec<Option<String>> = new_connected.iter().map(|o| o.identity_key()).collect();
        if !new_connected.is_empty() && keys.iter().all(Option::is_some) {
            let present: BTreeSet<String> = keys.into_iter().flatten().collect();
            if let Some(active_key) = self.history.borrow().get(&present)
                && let Some(object) = new_connected
                    .iter()
                    .find(|o| o.identity_key().as_deref() == Some(active_key.as_str()))
            {
                requested = Some(object.clone());
            }
        }
        block.request_active(requested);

        *self.matches.borrow_mut() = new_matches;
        block.end();
    }

    fn fresh_view(&self, object: &SharedObject) -> (SharedObject, Option<Rc<dyn MatchedView>>) {
        if let Some(matcher) = &self.view_matcher
            && let Some(matched) = matcher.match_model(object)
        {
            (matched.view(), Some(matched))
        } else {
            (object.clone(), None)
        }
    }
}

fn dispose_view(view: &SharedObject, object: &SharedObject) {
    // A self-presenting object is not disposed through its view slot; the
    // close chain owns the object's teardown.
    if ObjectKey::of(view) != ObjectKey::of(object)
        && let Some(disposable) = view.as_disposable()
    {
        disposable.dispose();
    }
}

impl PlacementConnector for SidebarPlacementConnector {
    fn connect(&self, object: &SharedObject) {
        if self.core.in_cursor_sync() {
            return;
        }
        self.desired.borrow_mut().push(object.clone());
        self.reschedule();
    }

    fn disconnect(&self, object: &SharedObject) {
        if self.core.in_cursor_sync() {
            return;
        }
        let key = ObjectKey::of(object);
        {
            let mut desired = self.desired.borrow_mut();
            let before = desired.len();
            desired.retain(|candidate| ObjectKey::of(candidate) != key);
            if desired.len() == before {
                log::warn!("disconnect of an object the sidebar does not hold");
            }
        }
        self.reschedule();
    }
}

impl Disposable for SidebarPlacementConnector {
    fn dispose(&self) {
        if let Some(pending) = self.schedule.borrow_mut().take() {
            pending.cancel();
        }
        for (index, view) in self.core.views().into_iter().enumerate() {
            dispose_view(&view, &self.core.connected_at(index));
        }
    }
}
