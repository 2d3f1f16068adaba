//! Composition of a template with the fragments it includes.
//!
//! The template is fetched, its include elements are resolved against the
//! fragment source, and the asset links of every fragment are spliced into
//! the template head. Fragments may include fragments themselves, up to the
//! configured depth.

use composer_markup::{collect_includes, extract, ContentRange, ExtractorConfig, Include};
use reqwest::blocking::Client;

use crate::composable::Composable;
use crate::config::{validate_url, ComposerConfig};
use crate::error::{ComposerError, Result};
use crate::http::{create_client, fetch_document, FetchedDocument};
use crate::session::SessionRoot;

/// Close tag the asset links are inserted before.
const HEAD_CLOSE: &str = "</head>";

/// Where templates and fragments come from.
pub trait FragmentSource {
    /// Fetch the document at `url`, sending the entries of `session`.
    fn fetch(&self, url: &str, session: &SessionRoot) -> Result<FetchedDocument>;
}

/// [`FragmentSource`] fetching over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFragmentSource {
    client: Client,
    max_response_size: u64,
}

impl HttpFragmentSource {
    pub fn new(config: &ComposerConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config.timeout_secs)?,
            max_response_size: config.max_response_size,
        })
    }
}

impl FragmentSource for HttpFragmentSource {
    fn fetch(&self, url: &str, session: &SessionRoot) -> Result<FetchedDocument> {
        tracing::debug!(url, "Fetching");
        fetch_document(
            &self.client,
            url,
            &session.as_headers(),
            self.max_response_size,
        )
    }
}

/// Rendered asset links collected across fragments.
///
/// Composing keeps the first occurrence of every link, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetList {
    links: Vec<String>,
}

impl AssetList {
    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[must_use]
    pub fn into_links(self) -> Vec<String> {
        self.links
    }
}

impl From<Vec<String>> for AssetList {
    fn from(links: Vec<String>) -> Self {
        AssetList::default().composed_from(links.into_iter().map(|link| AssetList {
            links: vec![link],
        }))
    }
}

impl Composable for AssetList {
    fn composed_with(mut self, other: Self) -> Self {
        for link in other.links {
            if !self.links.contains(&link) {
                self.links.push(link);
            }
        }
        self
    }
}

/// Result of composing one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPage {
    /// The template with includes resolved and assets inserted.
    pub html: String,
    /// Deduplicated asset links of all fragments.
    pub assets: Vec<String>,
    /// Root session after merging every response's session entries.
    pub session: SessionRoot,
    /// Non-fatal problems, such as fragments replaced by their fallback.
    pub warnings: Vec<String>,
}

/// State accumulated while resolving the includes of one template.
struct Composition {
    session: SessionRoot,
    assets: AssetList,
    warnings: Vec<String>,
}

impl Composition {
    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// Composes templates from fragments.
#[derive(Debug)]
pub struct Composer<S> {
    config: ComposerConfig,
    extractor: ExtractorConfig,
    source: S,
}

impl Composer<HttpFragmentSource> {
    /// Composer fetching over HTTP with the given configuration.
    pub fn over_http(config: ComposerConfig) -> Result<Self> {
        let source = HttpFragmentSource::new(&config)?;
        Ok(Self::new(config, source))
    }
}

impl<S: FragmentSource> Composer<S> {
    #[must_use]
    pub fn new(config: ComposerConfig, source: S) -> Self {
        let extractor = config.extractor_config();
        Self {
            config,
            extractor,
            source,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Fetch the template at `template_url` and resolve its includes.
    ///
    /// # Arguments
    /// * `template_url` - Absolute http(s) URL of the template
    /// * `session` - Session of the incoming request
    ///
    /// # Returns
    /// The composed page. Fragment failures are not errors; the include's
    /// fallback markup is used and a warning recorded instead.
    pub fn compose(&self, template_url: &str, session: SessionRoot) -> Result<ComposedPage> {
        validate_url(template_url)?;

        let template = self.source.fetch(template_url, &session).map_err(|e| {
            ComposerError::TemplateDownload {
                url: template_url.to_string(),
                source: Box::new(e),
            }
        })?;

        let mut composition = Composition {
            session: session.merged_with(&template.session_fragment()),
            assets: AssetList::default(),
            warnings: Vec::new(),
        };

        let body = self.resolve(&template.body, 0, &mut composition)?;
        let html = match insert_assets(&body, composition.assets.links()) {
            Some(html) => html,
            None => {
                if !composition.assets.is_empty() {
                    tracing::warn!(
                        url = template_url,
                        assets = composition.assets.links().len(),
                        "Template has no </head>, dropping fragment assets"
                    );
                    composition.warn(format!(
                        "Template {template_url} has no </head>, {} asset(s) dropped",
                        composition.assets.links().len()
                    ));
                }
                body
            }
        };

        tracing::info!(
            url = template_url,
            assets = composition.assets.links().len(),
            warnings = composition.warnings.len(),
            "Composed template"
        );

        Ok(ComposedPage {
            html,
            assets: composition.assets.into_links(),
            session: composition.session,
            warnings: composition.warnings,
        })
    }

    /// Replace every include of `source` by its resolved markup.
    fn resolve(&self, source: &str, depth: usize, composition: &mut Composition) -> Result<String> {
        let includes = collect_includes(source, &self.config.include_tag)?;
        if includes.is_empty() {
            return Ok(source.to_string());
        }

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for include in &includes {
            out.push_str(&source[cursor..include.range.start()]);
            out.push_str(&self.resolve_include(include, source, depth, composition));
            cursor = include.range.end();
        }
        out.push_str(&source[cursor..]);
        Ok(out)
    }

    fn resolve_include(
        &self,
        include: &Include,
        source: &str,
        depth: usize,
        composition: &mut Composition,
    ) -> String {
        let fallback = include.fallback(source);

        if include.path.is_empty() {
            tracing::warn!(range = %include.range, "Include without path, using fallback");
            composition.warn(format!("Include at {} has no path", include.range));
            return fallback.to_string();
        }
        if depth >= self.config.max_recursion {
            tracing::warn!(
                path = %include.path,
                max_recursion = self.config.max_recursion,
                "Maximum include depth reached, using fallback"
            );
            composition.warn(format!(
                "Include of {} exceeds the maximum depth of {}",
                include.path, self.config.max_recursion
            ));
            return fallback.to_string();
        }

        let content = match self.fetch_fragment(&include.path, composition) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %include.path, error = %e, "Fragment unavailable, using fallback");
                composition.warn(format!("Fragment {} unavailable: {e}", include.path));
                return fallback.to_string();
            }
        };

        match self.resolve(&content, depth + 1, composition) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(path = %include.path, error = %e, "Could not resolve nested includes");
                composition.warn(format!(
                    "Nested includes of {} left unresolved: {e}",
                    include.path
                ));
                content
            }
        }
    }

    /// Fetch a fragment, merge its session entries and assets, and return
    /// its content markup.
    fn fetch_fragment(&self, url: &str, composition: &mut Composition) -> Result<String> {
        let document = self.source.fetch(url, &composition.session)?;
        let body = document.body.as_str();
        let extraction = extract(body, ContentRange::whole(body), &self.extractor)?;

        composition.session = composition.session.merged_with(&document.session_fragment());
        composition.assets = std::mem::take(&mut composition.assets)
            .composed_with(AssetList::from(extraction.links.clone()));

        tracing::debug!(
            url,
            range = %extraction.content_range,
            assets = extraction.links.len(),
            "Extracted fragment"
        );
        Ok(extraction.content(body).unwrap_or_default().to_string())
    }
}

/// Insert `links` immediately before the first `</head>` of `html`,
/// case-insensitively.
///
/// Returns `None` when `html` has no `</head>`.
///
/// # Examples
/// ```
/// use composer_gateway::compose::insert_assets;
///
/// let html = insert_assets("<HEAD></HEAD>", &[r#"<link a="1" />"#.to_string()]);
/// assert_eq!(html.as_deref(), Some("<HEAD><link a=\"1\" />\n</HEAD>"));
/// ```
#[must_use]
pub fn insert_assets(html: &str, links: &[String]) -> Option<String> {
    // ASCII lowercasing keeps byte offsets intact.
    let position = html.to_ascii_lowercase().find(HEAD_CLOSE)?;

    let extra: usize = links.iter().map(|link| link.len() + 1).sum();
    let mut out = String::with_capacity(html.len() + extra);
    out.push_str(&html[..position]);
    for link in links {
        out.push_str(link);
        out.push('\n');
    }
    out.push_str(&html[position..]);
    Some(out)
}
