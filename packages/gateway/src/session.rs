//! Session state carried across template and fragment requests.
//!
//! Backends take part in the session through headers prefixed with `x-rd-`.
//! Each response contributes a [`SessionFragment`]; the fragments are merged
//! into the request's [`SessionRoot`], which is sent along with every
//! subsequent fragment request.

use std::collections::BTreeMap;

use crate::composable::Composable;
use crate::config::SESSION_HEADER_PREFIX;

/// Key of the session identifier. Fragments cannot overwrite it.
pub const SESSION_ID_KEY: &str = "session-id";

/// Session key/value pairs. Keys are stored lowercased and without the
/// header prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    entries: BTreeMap<String, String>,
}

impl SessionData {
    /// Build from key/value pairs. Keys may carry the header prefix.
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (normalize_key(key.as_ref()), value.into()))
                .collect(),
        }
    }

    /// Build from response headers, keeping only session entries.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::new(
            headers
                .into_iter()
                .filter(|(name, _)| is_session_header(name)),
        )
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&normalize_key(key)).map(String::as_str)
    }

    /// Copy with `key` set to `value`.
    #[must_use]
    pub fn with(&self, key: &str, value: impl Into<String>) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(normalize_key(key), value.into());
        Self { entries }
    }

    /// Copy with the entries of `other` added, `other` winning on conflicts.
    #[must_use]
    pub fn merged_with(&self, other: &SessionData) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(
            other
                .entries
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Self { entries }
    }

    /// Entries as prefixed header pairs, sorted by key.
    #[must_use]
    pub fn as_headers(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (format!("{SESSION_HEADER_PREFIX}{key}"), value.clone()))
            .collect()
    }

    #[must_use]
    pub fn raw_data(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a header name marks a session entry.
///
/// # Examples
/// ```
/// use composer_gateway::session::is_session_header;
///
/// assert!(is_session_header("X-RD-Cart"));
/// assert!(!is_session_header("content-type"));
/// ```
#[must_use]
pub fn is_session_header(name: &str) -> bool {
    name.len() > SESSION_HEADER_PREFIX.len()
        && name.as_bytes()[..SESSION_HEADER_PREFIX.len()]
            .eq_ignore_ascii_case(SESSION_HEADER_PREFIX.as_bytes())
}

fn normalize_key(key: &str) -> String {
    let key = if is_session_header(key) {
        &key[SESSION_HEADER_PREFIX.len()..]
    } else {
        key
    };
    key.to_ascii_lowercase()
}

/// Session contribution of one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFragment {
    data: SessionData,
}

impl SessionFragment {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Session entries among response headers.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            data: SessionData::from_headers(headers),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key)
    }

    #[must_use]
    pub fn data(&self) -> &SessionData {
        &self.data
    }
}

impl Composable for SessionFragment {
    fn composed_with(self, other: Self) -> Self {
        Self {
            data: self.data.merged_with(&other.data),
        }
    }
}

/// The root session of one composition request.
///
/// The root is dirty when merging fragments changed its data, which tells
/// the caller that the session must be written back to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRoot {
    data: SessionData,
    dirty: bool,
}

impl SessionRoot {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Clean root session from key/value pairs.
    pub fn of<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            data: SessionData::new(values),
            dirty: false,
        }
    }

    /// Merge a response's session contribution. The root's session id is
    /// kept even if the fragment carries another one.
    #[must_use]
    pub fn merged_with(&self, fragment: &SessionFragment) -> Self {
        let merged = self.data.merged_with(&fragment.data);
        let data = match self.id() {
            Some(id) => merged.with(SESSION_ID_KEY, id),
            None => merged,
        };
        let changed = data != self.data;
        if changed {
            tracing::debug!(entries = data.raw_data().len(), "Session changed by fragment");
        }
        Self {
            data,
            dirty: self.dirty || changed,
        }
    }

    /// Merge plain values. The result is a clean session.
    #[must_use]
    pub fn merged_with_values<K, V>(&self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            data: self.data.merged_with(&SessionData::new(values)),
            dirty: false,
        }
    }

    /// Copy with a new session id. Always dirty.
    #[must_use]
    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Self {
            data: self.data.with(SESSION_ID_KEY, id),
            dirty: true,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key)
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get(SESSION_ID_KEY)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Headers sent with every fragment request.
    #[must_use]
    pub fn as_headers(&self) -> Vec<(String, String)> {
        self.data.as_headers()
    }

    #[must_use]
    pub fn raw_data(&self) -> &BTreeMap<String, String> {
        self.data.raw_data()
    }
}
