/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Weakly-subscribed broadcast channels for cross-cutting notifications.
//!
//! The broadcaster never keeps a subscriber alive: channels hold weak
//! back-references purely for liveness-checked delivery, and dead entries
//! are pruned in the same pass that snapshots a send. Single-UI-thread
//! discipline; subscriber lists are `RefCell`-guarded, not locked.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::object::SharedObject;
use crate::registry::ResolvedId;

/// Receives payloads for the channels it subscribed to.
pub trait BroadcastSubscriber {
    fn deliver(&self, payload: &dyn Any);

    /// The resolved object this subscriber acts for. Addressed sends are
    /// only delivered when the owner is live and carries the target id.
    fn owner(&self) -> Option<SharedObject> {
        None
    }
}

struct SubscriberSlot {
    slot_id: u64,
    subscriber: Weak<dyn BroadcastSubscriber>,
}

#[derive(Default)]
struct Channels {
    by_channel: RefCell<HashMap<&'static str, Vec<SubscriberSlot>>>,
    next_slot: Cell<u64>,
}

#[derive(Default)]
pub struct EventBroadcaster {
    channels: Rc<Channels>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a weak subscription to `channel`; the returned handle
    /// unsubscribes explicitly, and a dropped subscriber is pruned lazily
    /// on the next send either way.
    pub fn subscribe(
        &self,
        channel: &'static str,
        subscriber: &Rc<dyn BroadcastSubscriber>,
    ) -> Subscription {
        let slot_id = self.channels.next_slot.get();
        self.channels.next_slot.set(slot_id + 1);
        self.channels
            .by_channel
            .borrow_mut()
            .entry(channel)
            .or_default()
            .push(SubscriberSlot {
                slot_id,
                subscriber: Rc::downgrade(subscriber),
            });
        Subscription {
            channels: Rc::downgrade(&self.channels),
            channel,
            slot_id,
        }
    }

    /// Deliver `payload` to every live subscriber of `channel`.
    pub fn send(&self, channel: &'static str, payload: &dyn Any) {
        for subscriber in self.snapshot(channel) {
            subscriber.deliver(payload);
        }
    }

    /// Deliver `payload` only to the subscriber whose owning object is
    /// still live (per `live_id`) and holds exactly `target`.
    pub fn send_addressed(
        &self,
        channel: &'static str,
        payload: &dyn Any,
        target: ResolvedId,
        live_id: &dyn Fn(&SharedObject) -> Option<ResolvedId>,
    ) {
        for subscriber in self.snapshot(channel) {
            let Some(owner) = subscriber.owner() else {
                continue;
            };
            if live_id(&owner) == Some(target) {
                subscriber.deliver(payload);
            }
        }
    }

    /// Snapshot live subscribers and prune dead ones in the same pass. The
    /// borrow is released before delivery so subscribers may re-subscribe.
    fn snapshot(&self, channel: &'static str) -> Vec<Rc<dyn BroadcastSubscriber>> {
        let mut by_channel = self.channels.by_channel.borrow_mut();
        let Some(slots) = by_channel.get_mut(channel) else {
            return Vec::new();
        };
        let mut live = Vec::with_capacity(slots.len());
        slots.retain(|slot| {
            if let Some(subscriber) = slot.subscriber.upgrade() {
                live.push(subscriber);
                true
            } else {
                false
            }
        });
        live
    }

    #[cfg(test)]
    fn slot_count(&self, channel: &'static str) -> usize {
        self.channels
            .by_channel
            .borrow()
            .get(channel)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Explicit unsubscribe handle. Idempotent; outliving the broadcaster is
/// harmless.
pub struct Subscription {
    channels: Weak<Channels>,
    channel: &'static str,
    slot_id: u64,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(channels) = self.channels.upgrade()
            && let Some(slots) = channels.by_channel.borrow_mut().get_mut(self.channel)
        {
            slots.retain(|slot| slot.slot_id != self.slot_id);
        }
    }
}
