//! Include element collection.
//!
//! Templates (and fragments) mark the places where other fragments are
//! spliced in with an include element:
//!
//! ```html
//! <rewe-digital-include path="http://cart/fragment">Cart unavailable</rewe-digital-include>
//! ```
//!
//! The inner markup is the fallback used when the fragment cannot be
//! resolved.

use crate::error::Result;
use crate::handler::{Attribute, ElementName, MarkupHandler};
use crate::range::ContentRange;
use crate::scanner::scan;

/// Attribute naming the fragment location.
pub const PATH_ATTRIBUTE: &str = "path";

/// One include element of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// Value of the `path` attribute; empty when absent.
    pub path: String,
    /// The whole element, from `<` of the start tag to the end of the close tag.
    pub range: ContentRange,
    /// The element's inner markup. Empty for a standalone include.
    pub fallback: ContentRange,
}

impl Include {
    /// Fallback markup of this include within `source`.
    #[must_use]
    pub fn fallback<'a>(&self, source: &'a str) -> &'a str {
        self.fallback.slice(source).unwrap_or_default()
    }
}

#[derive(Debug)]
struct OpenInclude {
    path: String,
    start: usize,
    inner_start: usize,
}

/// [`MarkupHandler`] collecting the top-level include elements of a document.
#[derive(Debug)]
pub struct IncludeCollector<'c> {
    include_tag: &'c str,
    includes: Vec<Include>,
    open: Option<OpenInclude>,
    /// Include elements opened inside the current one.
    nested: usize,
    collecting_path: bool,
    standalone_path: Option<(String, usize)>,
}

impl<'c> IncludeCollector<'c> {
    #[must_use]
    pub fn new(include_tag: &'c str) -> Self {
        Self {
            include_tag,
            includes: Vec::new(),
            open: None,
            nested: 0,
            collecting_path: false,
            standalone_path: None,
        }
    }

    /// Collected includes in document order.
    #[must_use]
    pub fn into_includes(self) -> Vec<Include> {
        if let Some(open) = &self.open {
            tracing::warn!(
                path = %open.path,
                offset = open.start,
                "Include element never closed, ignoring it"
            );
        }
        self.includes
    }
}

impl MarkupHandler for IncludeCollector<'_> {
    fn open_element_start(&mut self, element: &ElementName<'_>) {
        if !element.is(self.include_tag) {
            return;
        }
        if self.open.is_some() {
            self.nested += 1;
            return;
        }
        self.open = Some(OpenInclude {
            path: String::new(),
            start: element.tag_offset,
            inner_start: element.tag_offset,
        });
        self.collecting_path = true;
    }

    fn open_element_end(&mut self, element: &ElementName<'_>, end: usize) {
        if !self.collecting_path || !element.is(self.include_tag) {
            return;
        }
        self.collecting_path = false;
        if let Some(open) = self.open.as_mut() {
            open.inner_start = end;
        }
    }

    fn standalone_element_start(&mut self, element: &ElementName<'_>, _minimized: bool) {
        if self.open.is_none() && element.is(self.include_tag) {
            self.standalone_path = Some((String::new(), element.tag_offset));
            self.collecting_path = true;
        }
    }

    fn standalone_element_end(&mut self, _element: &ElementName<'_>, _minimized: bool, end: usize) {
        if let Some((path, start)) = self.standalone_path.take() {
            self.collecting_path = false;
            self.includes.push(Include {
                path,
                range: ContentRange::new(start, end),
                fallback: ContentRange::new(end, end),
            });
        }
    }

    fn close_element_end(&mut self, element: &ElementName<'_>, end: usize) {
        if !element.is(self.include_tag) || self.open.is_none() {
            return;
        }
        if self.nested > 0 {
            self.nested -= 1;
            return;
        }
        if let Some(open) = self.open.take() {
            self.includes.push(Include {
                path: open.path,
                range: ContentRange::new(open.start, end),
                fallback: ContentRange::new(open.inner_start, element.tag_offset),
            });
        }
    }

    fn attribute(&mut self, attribute: &Attribute<'_>) {
        if !self.collecting_path || attribute.name != PATH_ATTRIBUTE {
            return;
        }
        let path = attribute.value.to_string();
        if let Some((standalone, _)) = self.standalone_path.as_mut() {
            *standalone = path;
        } else if let Some(open) = self.open.as_mut() {
            open.path = path;
        }
    }
}

/// Collect the top-level include elements of `source`.
///
/// # Examples
/// ```
/// use composer_markup::collect_includes;
///
/// let html = r#"<body><x-include path="/a">fallback</x-include></body>"#;
/// let includes = collect_includes(html, "x-include").unwrap();
///
/// assert_eq!(includes[0].path, "/a");
/// assert_eq!(includes[0].fallback(html), "fallback");
/// ```
pub fn collect_includes(source: &str, include_tag: &str) -> Result<Vec<Include>> {
    let mut collector = IncludeCollector::new(include_tag);
    scan(source, &mut collector)?;
    Ok(collector.into_includes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TAG: &str = "rd-include";

    #[test]
    fn test_collects_ranges() {
        let html = r#"<p><rd-include path="/cart">none</rd-include></p>"#;
        let includes = collect_includes(html, TAG).unwrap();
        assert_eq!(includes.len(), 1);

        let include = &includes[0];
        assert_eq!(include.path, "/cart");
        assert_eq!(
            include.range.slice(html),
            Some(r#"<rd-include path="/cart">none</rd-include>"#)
        );
        assert_eq!(include.fallback(html), "none");
    }

    #[test]
    fn test_standalone_include() {
        let html = r#"<rd-include path="/a"/><RD-INCLUDE path="/b"></RD-INCLUDE>"#;
        let includes = collect_includes(html, TAG).unwrap();
        assert_eq!(
            includes.iter().map(|i| i.path.as_str()).collect::<Vec<_>>(),
            vec!["/a", "/b"]
        );
        assert_eq!(includes[0].range.slice(html), Some(r#"<rd-include path="/a"/>"#));
        assert_eq!(includes[0].fallback(html), "");
    }

    #[test]
    fn test_nested_includes_stay_in_fallback() {
        let html = concat!(
            r#"<rd-include path="/outer">"#,
            r#"<rd-include path="/inner">x</rd-include>"#,
            r#"</rd-include>"#
        );
        let includes = collect_includes(html, TAG).unwrap();
        assert_eq!(includes.len(), 1);
        assert_eq!(includes[0].path, "/outer");
        assert_eq!(
            includes[0].fallback(html),
            r#"<rd-include path="/inner">x</rd-include>"#
        );
    }

    #[test]
    fn test_missing_path_is_empty() {
        let includes = collect_includes("<rd-include>f</rd-include>", TAG).unwrap();
        assert_eq!(includes[0].path, "");
    }

    #[test]
    fn test_attributes_of_children_do_not_leak() {
        let html = r#"<rd-include path="/a"><a path="/b">f</a></rd-include>"#;
        let includes = collect_includes(html, TAG).unwrap();
        assert_eq!(includes[0].path, "/a");
    }

    #[test]
    fn test_unclosed_include_is_dropped() {
        let includes = collect_includes(r#"<rd-include path="/a">f"#, TAG).unwrap();
        assert!(includes.is_empty());
    }
}
