/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Tabshell: a desktop application shell engine.
//!
//! Objects are addressed by `tabapp://` URIs. A module-item resolver
//! creates them, a placement resolver decides where they are shown, and a
//! placement connector attaches their views to the UI. The portable kernel
//! (URI codec, registry, disconnect table, broadcaster) lives in
//! `tabshell-core`; this crate adds the resolve-open pipeline, the two
//! connector variants, and drag-and-drop ownership transfer.

pub mod placement;
pub mod prefs;
pub mod shell;

pub use tabshell_core::object::downcast_object;
pub use tabshell_core::{
    AttachmentSelector, DisconnectTable, Disposable, EventBroadcaster, ItemResolver, MatchedView,
    ObjectKey, PlacementConnector, PlacementResolver, Refreshable, ResolvedId, ResolvedMetadata,
    ResolvedObjectRegistry, SharedObject, ShellError, ShellObject, ShellUri, UpdateScheduler,
    ViewMatcher,
};

/// Install the tracing sink for the process. `filter` takes tracing
/// directives (e.g. `tabshell=debug`); without one the `RUST_LOG`
/// environment applies. Safe to call more than once; later calls lose.
pub fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::from_default_env(),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
