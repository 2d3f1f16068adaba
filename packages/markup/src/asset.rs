//! Asset declarations collected from a document head.
//!
//! An asset goes through two phases: a [`PendingAsset`] collects attributes
//! while its element is open, and [`PendingAsset::finish`] turns it into an
//! immutable [`Asset`] once the element's closing boundary is seen.

use std::fmt::Write as _;

/// Marker that must appear in the options attribute for an asset to be
/// forwarded into the composed page.
pub const INCLUDE_MARKER: &str = "include";

/// A finalized `link`/`script` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    tag: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
}

impl Asset {
    /// Tag name as written in the source document.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attributes in order of first appearance.
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Value of the attribute `name`, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn is_self_closing(&self) -> bool {
        self.self_closing
    }

    /// Render the asset as a standalone tag.
    ///
    /// Values are written verbatim; the source document's escaping is
    /// trusted.
    ///
    /// # Examples
    /// ```
    /// use composer_markup::PendingAsset;
    ///
    /// let mut pending = PendingAsset::new("script", false);
    /// pending.attribute("src", "app.js");
    /// assert_eq!(pending.finish().render(), r#"<script src="app.js" ></script>"#);
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(16 + self.tag.len() * 2);
        out.push('<');
        out.push_str(&self.tag);
        out.push(' ');
        for (name, value) in &self.attributes {
            // Writing to a String cannot fail.
            let _ = write!(out, "{name}=\"{value}\" ");
        }
        if self.self_closing {
            out.push_str("/>");
        } else {
            let _ = write!(out, "></{}>", self.tag);
        }
        out
    }
}

/// An asset element that is still open, collecting attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsset {
    tag: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
}

impl PendingAsset {
    #[must_use]
    pub fn new(tag: impl Into<String>, self_closing: bool) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            self_closing,
        }
    }

    /// Record an attribute. A repeated name overwrites the earlier value but
    /// keeps its original position.
    pub fn attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Whether the value of `options_attribute` contains [`INCLUDE_MARKER`].
    /// A missing attribute counts as an empty value.
    #[must_use]
    pub fn is_included(&self, options_attribute: &str) -> bool {
        self.attributes
            .iter()
            .find(|(key, _)| key == options_attribute)
            .is_some_and(|(_, value)| value.contains(INCLUDE_MARKER))
    }

    /// Freeze into an [`Asset`].
    #[must_use]
    pub fn finish(self) -> Asset {
        Asset {
            tag: self.tag,
            attributes: self.attributes,
            self_closing: self.self_closing,
        }
    }
}
