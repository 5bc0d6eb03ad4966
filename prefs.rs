/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Command-line options and the optional `tabshell.toml` preferences file.
//! Command-line values win over file values.

use std::path::{Path, PathBuf};

use bpaf::Bpaf;
use serde::Deserialize;

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
pub struct Options {
    /// Tracing filter directives, e.g. "tabshell=debug"
    #[bpaf(argument("FILTER"))]
    pub log_filter: Option<String>,

    /// Path to a tabshell.toml preferences file
    #[bpaf(argument("PATH"))]
    pub prefs: Option<PathBuf>,

    /// Activate each object as soon as it connects to the main area
    #[bpaf(switch)]
    pub activate_on_open: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Prefs {
    pub log_filter: Option<String>,
    pub activate_on_open: bool,
}

/// Load preferences, falling back to defaults on a missing or malformed
/// file. The shell never refuses to start over preferences.
pub fn load_prefs(path: Option<&Path>) -> Prefs {
    let Some(path) = path else {
        return Prefs::default();
    };
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            log::warn!("could not read prefs file {}: {error}", path.display());
            return Prefs::default();
        }
    };
    match toml::from_str(&text) {
        Ok(prefs) => prefs,
        Err(error) => {
            log::warn!("ignoring malformed prefs file {}: {error}", path.display());
            Prefs::default()
        }
    }
}
