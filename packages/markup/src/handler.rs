//! Markup handler trait definition.
//!
//! The scanner walks a document once and calls into a [`MarkupHandler`] for
//! every structural event, in document order. Handlers keep their own state;
//! the scanner keeps none on their behalf.

/// Element name as it appears in the source, with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementName<'a> {
    /// Raw tag name slice, case preserved.
    pub name: &'a str,
    /// Byte offset of the first character of the name.
    pub offset: usize,
    /// Byte offset of the `<` (or `</`) that starts the tag.
    pub tag_offset: usize,
    /// Line of the name (1-based).
    pub line: usize,
    /// Column of the name (1-based, in chars).
    pub col: usize,
}

impl ElementName<'_> {
    /// Byte offset just past the name.
    #[must_use]
    pub fn name_end(&self) -> usize {
        self.offset + self.name.len()
    }

    /// Case-insensitive equality against `other`.
    #[must_use]
    pub fn is(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }

    /// Case-insensitive substring test against `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        contains_ignore_ascii_case(self.name, needle)
    }
}

/// An attribute inside a start tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name, case preserved.
    pub name: &'a str,
    /// Attribute value without surrounding quotes, verbatim. Empty when the
    /// attribute has no value.
    pub value: &'a str,
    /// Byte offset of the name.
    pub offset: usize,
    /// Line of the name (1-based).
    pub line: usize,
    /// Column of the name (1-based, in chars).
    pub col: usize,
}

/// Consumer of structural markup events.
///
/// Every method has a no-op default so handlers only implement the events
/// they care about.
pub trait MarkupHandler {
    /// `<name` of a tag that will be closed by a later `</name>`.
    fn open_element_start(&mut self, _element: &ElementName<'_>) {}

    /// The `>` of an open tag. `end` is the offset just past it.
    fn open_element_end(&mut self, _element: &ElementName<'_>, _end: usize) {}

    /// `<name` of a standalone element: either written `<name/>`
    /// (`minimized`) or an HTML void element such as `<link>`.
    fn standalone_element_start(&mut self, _element: &ElementName<'_>, _minimized: bool) {}

    /// The `>` of a standalone element. `end` is the offset just past it.
    fn standalone_element_end(
        &mut self,
        _element: &ElementName<'_>,
        _minimized: bool,
        _end: usize,
    ) {
    }

    /// A complete `</name>` tag. `end` is the offset just past its `>`.
    fn close_element_end(&mut self, _element: &ElementName<'_>, _end: usize) {}

    /// An attribute of the element whose start event was delivered last.
    fn attribute(&mut self, _attribute: &Attribute<'_>) {}
}

impl<H: MarkupHandler + ?Sized> MarkupHandler for &mut H {
    fn open_element_start(&mut self, element: &ElementName<'_>) {
        (**self).open_element_start(element);
    }

    fn open_element_end(&mut self, element: &ElementName<'_>, end: usize) {
        (**self).open_element_end(element, end);
    }

    fn standalone_element_start(&mut self, element: &ElementName<'_>, minimized: bool) {
        (**self).standalone_element_start(element, minimized);
    }

    fn standalone_element_end(&mut self, element: &ElementName<'_>, minimized: bool, end: usize) {
        (**self).standalone_element_end(element, minimized, end);
    }

    fn close_element_end(&mut self, element: &ElementName<'_>, end: usize) {
        (**self).close_element_end(element, end);
    }

    fn attribute(&mut self, attribute: &Attribute<'_>) {
        (**self).attribute(attribute);
    }
}

/// ASCII case-insensitive substring search.
///
/// # Examples
/// ```
/// use composer_markup::handler::contains_ignore_ascii_case;
///
/// assert!(contains_ignore_ascii_case("NoScript", "script"));
/// assert!(!contains_ignore_ascii_case("style", "script"));
/// ```
#[must_use]
pub fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str) -> ElementName<'_> {
        ElementName {
            name,
            offset: 1,
            tag_offset: 0,
            line: 1,
            col: 2,
        }
    }

    #[test]
    fn test_name_end() {
        assert_eq!(element("head").name_end(), 5);
    }

    #[test]
    fn test_case_insensitive_matching() {
        assert!(element("HEAD").is("head"));
        assert!(!element("header").is("head"));
        assert!(element("Script").contains("script"));
        assert!(element("stylesheet-link").contains("LINK"));
    }

    #[test]
    fn test_contains_ignore_ascii_case_edges() {
        assert!(contains_ignore_ascii_case("", ""));
        assert!(!contains_ignore_ascii_case("li", "link"));
        assert!(contains_ignore_ascii_case("async,include", "include"));
    }

    #[derive(Default)]
    struct Counter {
        attributes: usize,
    }

    impl MarkupHandler for Counter {
        fn attribute(&mut self, _attribute: &Attribute<'_>) {
            self.attributes += 1;
        }
    }

    fn drive<H: MarkupHandler>(mut handler: H) {
        handler.open_element_start(&element("div"));
        handler.attribute(&Attribute {
            name: "id",
            value: "x",
            offset: 5,
            line: 1,
            col: 6,
        });
        handler.open_element_end(&element("div"), 12);
    }

    #[test]
    fn test_handler_defaults_and_forwarding() {
        let mut counter = Counter::default();
        drive(&mut counter);
        assert_eq!(counter.attributes, 1);
    }
}
