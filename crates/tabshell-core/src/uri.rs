/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The shell URI codec.
//!
//! Text form: `tabapp://placement[:ownerId]/module/item[?k=v&...]`.
//! The placement maps to the authority host, the owner id to the port (an
//! omitted port means "no owner"), the path splits at its first `/` into
//! module and item, and the query carries an ordered multi-map of
//! case-sensitive parameters. Components percent-escape on build and
//! un-escape on parse.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use url::Url;
use url::form_urlencoded;

/// Scheme of every shell URI.
pub const SCHEME: &str = "tabapp";

/// Owner id carried in the port position; 0 means "owned by nothing".
pub const NO_OWNER_ID: u16 = 0;

/// Smallest id the resolved-object registry may allocate. 0 stays reserved
/// as the no-owner sentinel in the URI's port position.
pub const MIN_RESOLVED_ID: u16 = 1;

/// Largest id encodable in the URI's port position.
pub const MAX_RESOLVED_ID: u16 = u16::MAX;

/// Escape set for placement/module/item: unreserved characters pass through,
/// everything else is percent-encoded.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// An immutable, addressable identity for something the shell can open.
///
/// `placement`, `module`, and `item` are never absent; the empty string is
/// the null-equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShellUri {
    placement: String,
    owner_id: u16,
    module: String,
    item: String,
    parameters: Vec<(String, String)>,
}

impl ShellUri {
    /// Start a fluent builder for a new URI.
    pub fn build() -> ShellUriBuilder {
        ShellUriBuilder::default()
    }

    /// Re-open this URI as a builder, preserving every component.
    pub fn to_builder(&self) -> ShellUriBuilder {
        ShellUriBuilder {
            placement: self.placement.clone(),
            owner_id: self.owner_id,
            module: self.module.clone(),
            item: self.item.clone(),
            parameters: self.parameters.clone(),
        }
    }

    pub fn placement(&self) -> &str {
        &self.placement
    }

    pub fn owner_id(&self) -> u16 {
        self.owner_id
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    /// Parameters in insertion order; duplicate keys are preserved.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First value recorded under `key`, if any. Keys are case-sensitive.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Copy of this URI with one more parameter appended.
    pub fn with_parameter(&self, key: impl Into<String>, value: impl Into<String>) -> ShellUri {
        let mut next = self.clone();
        next.parameters.push((key.into(), value.into()));
        next
    }
}

impl fmt::Display for ShellUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}://{}", utf8_percent_encode(&self.placement, COMPONENT))?;
        if self.owner_id != NO_OWNER_ID {
            write!(f, ":{}", self.owner_id)?;
        }
        write!(
            f,
            "/{}/{}",
            utf8_percent_encode(&self.module, COMPONENT),
            utf8_percent_encode(&self.item, COMPONENT)
        )?;
        if !self.parameters.is_empty() {
            let mut query = form_urlencoded::Serializer::new(String::new());
            for (key, value) in &self.parameters {
                query.append_pair(key, value);
            }
            write!(f, "?{}", query.finish())?;
        }
        Ok(())
    }
}

/// Failures turning text into a [`ShellUri`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriParseError {
    /// Not a URI at all, or an out-of-range port.
    Malformed(String),
    /// A URI, but not a `tabapp://` one.
    WrongScheme(String),
}

impl fmt::Display for UriParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriParseError::Malformed(detail) => write!(f, "malformed shell uri: {detail}"),
            UriParseError::WrongScheme(scheme) => {
                write!(f, "expected scheme {SCHEME:?}, found {scheme:?}")
            }
        }
    }
}

impl std::error::Error for UriParseError {}

impl FromStr for ShellUri {
    type Err = UriParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s).map_err(|e| UriParseError::Malformed(e.to_string()))?;
        if url.scheme() != SCHEME {
            return Err(UriParseError::WrongScheme(url.scheme().to_string()));
        }

        let placement = percent_decode_str(url.host_str().unwrap_or(""))
            .decode_utf8_lossy()
            .into_owned();
        let owner_id = url.port().unwrap_or(NO_OWNER_ID);

        // The path splits at its FIRST separator; further slashes belong to
        // the item and arrive escaped when round-tripped through Display.
        // Exactly one leading slash is structural, so an empty module
        // survives as an empty first segment.
        let path = url.path().strip_prefix('/').unwrap_or(url.path());
        let (module, item) = match path.split_once('/') {
            Some((module, item)) => (module, item),
            None => (path, ""),
        };
        let module = percent_decode_str(module).decode_utf8_lossy().into_owned();
        let item = percent_decode_str(item).decode_utf8_lossy().into_owned();

        let parameters = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(ShellUri {
            placement,
            owner_id,
            module,
            item,
            parameters,
        })
    }
}

/// Fluent writer for [`ShellUri`] values.
#[derive(Debug, Clone, Default)]
pub struct ShellUriBuilder {
    placement: String,
    owner_id: u16,
    module: String,
    item: String,
    parameters: Vec<(String, String)>,
}

impl ShellUriBuilder {
    pub fn placement(mut self, placement: impl Into<String>) -> Self {
        self.placement = placement.into();
        self
    }

    pub fn owner(mut self, owner_id: u16) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn item(mut self, item: impl Into<String>) -> Self {
        self.item = item.into();
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    /// Record a parameter whose value is the attachment placeholder token
    /// `{index}`, resolved to a surrogate id when the URI is opened.
    pub fn attachment(mut self, key: impl Into<String>, index: usize) -> Self {
        self.parameters.push((key.into(), format!("{{{index}}}")));
        self
    }

    pub fn end(self) -> ShellUri {
        ShellUri {
            placement: self.placement,
            owner_id: self.owner_id,
            module: self.module,
            item: self.item,
            parameters: self.parameters,
        }
    }
}

/// Recognize the attachment placeholder token `{N}` in a parameter value.
pub fn attachment_placeholder_index(value: &str) -> Option<usize> {
    let digits = value.strip_prefix('{')?.strip_suffix('}')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
