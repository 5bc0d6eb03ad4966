/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Portable kernel for the Tabshell shell engine.
//!
//! Core structures:
//! - `ShellUri`: the addressable identity of everything the shell opens
//! - `ResolvedObjectRegistry`: id allocation and metadata for open objects
//! - `DisconnectTable`: which connector currently owns an open object
//! - `EventBroadcaster`: weakly-subscribed cross-cutting notifications
//!
//! Nothing in this crate touches a visual tree; the UI-facing connector
//! implementations live in the `tabshell` root package and reach back in
//! through the boundary traits in [`ports`].

pub mod broadcast;
pub mod disconnect;
pub mod error;
pub mod object;
pub mod ports;
pub mod registry;
pub mod uri;

pub use broadcast::{BroadcastSubscriber, EventBroadcaster, Subscription};
pub use disconnect::DisconnectTable;
pub use error::ShellError;
pub use object::{Disposable, ObjectKey, Refreshable, SharedObject, ShellObject};
pub use ports::{
    AttachmentSelector, ItemResolver, MatchedView, PlacementConnector, PlacementResolver,
    ScheduleHandle, UpdateScheduler, ViewMatcher,
};
pub use registry::{CompositeCloser, ResolvedId, ResolvedMetadata, ResolvedObjectRegistry};
pub use uri::{ShellUri, ShellUriBuilder, UriParseError};
