//! Content range and head asset extraction.
//!
//! [`ContentExtractor`] is a [`MarkupHandler`] that is driven once over a
//! fetched document. It tracks two things at the same time:
//!
//! - the content window: the inner markup of the first closed element named
//!   like the configured content tag,
//! - the head assets: `link`/`script` elements inside `head` whose options
//!   attribute contains `include`, rendered for insertion into the composed
//!   page.
//!
//! One extractor serves exactly one document. Construct a fresh one per
//! parse.

use crate::asset::{Asset, PendingAsset};
use crate::error::Result;
use crate::handler::{Attribute, ElementName, MarkupHandler};
use crate::range::ContentRange;
use crate::scanner::scan;

/// Matched by equality, so `header` and `thead` do not open the head.
const HEAD_TAG: &str = "head";
const ASSET_TAGS: [&str; 2] = ["link", "script"];

/// Names the extractor matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Element whose inner markup is the content. Matched case-insensitively
    /// as a substring of the tag name.
    pub content_tag: String,
    /// Attribute whose value must contain `include` for an asset to qualify.
    pub asset_options_attribute: String,
}

impl ExtractorConfig {
    #[must_use]
    pub fn new(content_tag: impl Into<String>, asset_options_attribute: impl Into<String>) -> Self {
        Self {
            content_tag: content_tag.into(),
            asset_options_attribute: asset_options_attribute.into(),
        }
    }
}

/// Working memory for one document.
#[derive(Debug, Default)]
struct ExtractorState {
    inside_head: bool,
    pending: Option<PendingAsset>,
    content_start: usize,
    content_end: Option<usize>,
    assets: Vec<Asset>,
    links: Vec<String>,
}

/// Streaming extractor for one document. See the module docs.
#[derive(Debug)]
pub struct ContentExtractor<'c> {
    default_range: ContentRange,
    config: &'c ExtractorConfig,
    state: ExtractorState,
}

impl<'c> ContentExtractor<'c> {
    /// Create an extractor that reports `default_range` when the document has
    /// no closed content element.
    #[must_use]
    pub fn new(default_range: ContentRange, config: &'c ExtractorConfig) -> Self {
        Self {
            default_range,
            config,
            state: ExtractorState::default(),
        }
    }

    /// The observed content range, or the default when no content element
    /// was closed.
    #[must_use]
    pub fn content_range(&self) -> ContentRange {
        match self.state.content_end {
            Some(end) => ContentRange::new(self.state.content_start, end),
            None => self.default_range,
        }
    }

    /// Rendered qualifying assets, in the order their elements closed.
    #[must_use]
    pub fn asset_links(&self) -> &[String] {
        &self.state.links
    }

    /// Qualifying assets, in the order their elements closed.
    #[must_use]
    pub fn assets(&self) -> &[Asset] {
        &self.state.assets
    }

    /// Consume the extractor into its results.
    #[must_use]
    pub fn into_extraction(self) -> Extraction {
        Extraction {
            content_range: self.content_range(),
            assets: self.state.assets,
            links: self.state.links,
        }
    }

    fn is_content_element(&self, element: &ElementName<'_>) -> bool {
        self.state.content_end.is_none() && element.contains(&self.config.content_tag)
    }

    fn start_asset(&mut self, element: &ElementName<'_>, self_closing: bool) {
        tracing::trace!(tag = element.name, line = element.line, "Asset element started");
        self.state.pending = Some(PendingAsset::new(element.name, self_closing));
    }

    fn finish_asset(&mut self) {
        let Some(pending) = self.state.pending.take() else {
            return;
        };
        if !pending.is_included(&self.config.asset_options_attribute) {
            tracing::debug!(
                options_attribute = %self.config.asset_options_attribute,
                "Dropping asset without include marker"
            );
            return;
        }
        let asset = pending.finish();
        self.state.links.push(asset.render());
        self.state.assets.push(asset);
    }
}

impl MarkupHandler for ContentExtractor<'_> {
    fn open_element_start(&mut self, element: &ElementName<'_>) {
        if element.is(HEAD_TAG) {
            self.state.inside_head = true;
        } else if self.is_content_element(element) {
            // Skips the `>` of a bare content tag. A later open before the
            // first close moves the start again.
            self.state.content_start = element.name_end() + 1;
        } else if self.state.inside_head && is_asset_element(element) {
            self.start_asset(element, false);
        }
    }

    fn standalone_element_start(&mut self, element: &ElementName<'_>, _minimized: bool) {
        if self.state.inside_head && is_asset_element(element) {
            self.start_asset(element, true);
        }
    }

    fn attribute(&mut self, attribute: &Attribute<'_>) {
        if let Some(pending) = self.state.pending.as_mut() {
            pending.attribute(attribute.name, attribute.value);
        }
    }

    fn standalone_element_end(&mut self, _element: &ElementName<'_>, _minimized: bool, _end: usize) {
        self.finish_asset();
    }

    fn close_element_end(&mut self, element: &ElementName<'_>, _end: usize) {
        if element.is(HEAD_TAG) {
            self.state.inside_head = false;
        } else if self.is_content_element(element) {
            // A close at the very start of the document ends nothing; the
            // window stays open for a later content element.
            if element.tag_offset > 0 {
                self.state.content_end = Some(element.tag_offset);
            }
        } else {
            self.finish_asset();
        }
    }
}

fn is_asset_element(element: &ElementName<'_>) -> bool {
    ASSET_TAGS.iter().any(|tag| element.contains(tag))
}

/// Result of running a [`ContentExtractor`] over a complete document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub content_range: ContentRange,
    pub assets: Vec<Asset>,
    pub links: Vec<String>,
}

impl Extraction {
    /// The content markup of `source`, the document this extraction came from.
    #[must_use]
    pub fn content<'a>(&self, source: &'a str) -> Option<&'a str> {
        self.content_range.slice(source)
    }
}

/// Scan `source` with a fresh [`ContentExtractor`].
///
/// # Examples
/// ```
/// use composer_markup::{extract, ContentRange, ExtractorConfig};
///
/// let config = ExtractorConfig::new("content", "data-opt");
/// let html = r#"<head><link rel="x" data-opt="include"/></head><content>Hi</content>"#;
/// let extraction = extract(html, ContentRange::whole(html), &config).unwrap();
///
/// assert_eq!(extraction.content(html), Some("Hi"));
/// assert_eq!(extraction.links, [r#"<link rel="x" data-opt="include" />"#]);
/// ```
pub fn extract(
    source: &str,
    default_range: ContentRange,
    config: &ExtractorConfig,
) -> Result<Extraction> {
    let mut extractor = ContentExtractor::new(default_range, config);
    scan(source, &mut extractor)?;
    Ok(extractor.into_extraction())
}
