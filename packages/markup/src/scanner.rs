//! Single-pass markup scanner that drives a [`MarkupHandler`].
//!
//! The scanner does not build a tree and does not validate nesting. It finds
//! tags, splits them into names and attributes, and reports them to the
//! handler in document order.
//!
//! Known limitations (intentional):
//! - No entity decoding; attribute values are reported verbatim.
//! - No implied end tags or other HTML5 tree-construction recovery.
//! - Only `script` and `style` are treated as raw text.

use memchr::{memchr, memchr_iter, memmem, memrchr};

use crate::error::{MarkupError, Result};
use crate::handler::{Attribute, ElementName, MarkupHandler};

const COMMENT_START: &[u8] = b"<!--";
const COMMENT_END: &[u8] = b"-->";
const CDATA_START: &[u8] = b"<![CDATA[";
const CDATA_END: &[u8] = b"]]>";

/// Elements that never have a close tag in HTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose body is raw text up to the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Scan `input` and report every structural event to `handler`.
///
/// Events already delivered when an error is returned stay delivered; the
/// handler should be discarded in that case.
///
/// # Examples
/// ```
/// use composer_markup::handler::{ElementName, MarkupHandler};
/// use composer_markup::scanner::scan;
///
/// #[derive(Default)]
/// struct Names(Vec<String>);
///
/// impl MarkupHandler for Names {
///     fn open_element_start(&mut self, element: &ElementName<'_>) {
///         self.0.push(element.name.to_string());
///     }
/// }
///
/// let mut names = Names::default();
/// scan("<html><body><p>hi</p></body></html>", &mut names).unwrap();
/// assert_eq!(names.0, ["html", "body", "p"]);
/// ```
pub fn scan<H: MarkupHandler + ?Sized>(input: &str, handler: &mut H) -> Result<()> {
    Scanner::new(input, handler).run()
}

/// Tracks line/column positions while offsets only move forward.
///
/// Each byte of the input is looked at once, however many events share a
/// line.
#[derive(Debug)]
struct LineTracker {
    offset: usize,
    line: usize,
    col: usize,
}

impl LineTracker {
    fn new() -> Self {
        Self {
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    fn position(&mut self, input: &str, offset: usize) -> (usize, usize) {
        if offset < self.offset {
            *self = Self::new();
        }
        let segment = &input.as_bytes()[self.offset..offset];
        match memrchr(b'\n', segment) {
            Some(last) => {
                self.line += memchr_iter(b'\n', segment).count();
                self.col = input[self.offset + last + 1..offset].chars().count() + 1;
            }
            None => self.col += input[self.offset..offset].chars().count(),
        }
        self.offset = offset;
        (self.line, self.col)
    }
}

struct StartTag<'a> {
    name: ElementName<'a>,
    attributes: Vec<Attribute<'a>>,
    minimized: bool,
    end: usize,
}

struct Scanner<'a, 'h, H: ?Sized> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    lines: LineTracker,
    handler: &'h mut H,
}

impl<'a, 'h, H: MarkupHandler + ?Sized> Scanner<'a, 'h, H> {
    fn new(input: &'a str, handler: &'h mut H) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            lines: LineTracker::new(),
            handler,
        }
    }

    fn run(mut self) -> Result<()> {
        while self.pos < self.bytes.len() {
            let Some(rel) = memchr(b'<', &self.bytes[self.pos..]) else {
                break;
            };
            let lt = self.pos + rel;

            match self.bytes.get(lt + 1).copied() {
                Some(b'!') => self.pos = self.skip_markup_declaration(lt)?,
                Some(b'?') => {
                    self.pos = self.skip_to_gt(lt, "processing instruction")?;
                }
                Some(b'/')
                    if self
                        .bytes
                        .get(lt + 2)
                        .is_some_and(|b| b.is_ascii_alphabetic()) =>
                {
                    self.pos = self.close_tag(lt)?;
                }
                Some(c) if c.is_ascii_alphabetic() => self.pos = self.start_tag(lt)?,
                _ => self.pos = lt + 1,
            }
        }

        tracing::trace!(bytes = self.bytes.len(), "Scanned document");
        Ok(())
    }

    fn skip_markup_declaration(&mut self, lt: usize) -> Result<usize> {
        if self.bytes[lt..].starts_with(COMMENT_START) {
            return self.skip_section(lt, COMMENT_START.len(), COMMENT_END, "comment");
        }
        if starts_with_ignore_ascii_case(&self.bytes[lt..], CDATA_START) {
            return self.skip_section(lt, CDATA_START.len(), CDATA_END, "CDATA section");
        }
        self.skip_to_gt(lt, "declaration")
    }

    fn skip_section(
        &mut self,
        lt: usize,
        open_len: usize,
        terminator: &[u8],
        kind: &'static str,
    ) -> Result<usize> {
        let body = lt + open_len;
        match memmem::find(&self.bytes[body..], terminator) {
            Some(rel) => Ok(body + rel + terminator.len()),
            None => Err(self.section_error(lt, kind)),
        }
    }

    fn skip_to_gt(&mut self, lt: usize, kind: &'static str) -> Result<usize> {
        match memchr(b'>', &self.bytes[lt..]) {
            Some(rel) => Ok(lt + rel + 1),
            None => Err(self.section_error(lt, kind)),
        }
    }

    fn section_error(&mut self, lt: usize, kind: &'static str) -> MarkupError {
        let (line, col) = self.lines.position(self.input, lt);
        MarkupError::UnterminatedSection { kind, line, col }
    }

    fn element_name(&mut self, tag_offset: usize, offset: usize) -> ElementName<'a> {
        let input = self.input;
        let end = self.scan_name(offset);
        let (line, col) = self.lines.position(input, offset);
        ElementName {
            name: &input[offset..end],
            offset,
            tag_offset,
            line,
            col,
        }
    }

    fn scan_name(&self, start: usize) -> usize {
        let mut end = start;
        while end < self.bytes.len() && !is_name_terminator(self.bytes[end]) {
            end += 1;
        }
        end
    }

    fn close_tag(&mut self, lt: usize) -> Result<usize> {
        let name = self.element_name(lt, lt + 2);
        let Some(rel) = memchr(b'>', &self.bytes[name.name_end()..]) else {
            return Err(unterminated_tag(&name));
        };
        let end = name.name_end() + rel + 1;
        self.handler.close_element_end(&name, end);
        Ok(end)
    }

    fn start_tag(&mut self, lt: usize) -> Result<usize> {
        let tag = self.parse_start_tag(lt)?;
        let standalone = tag.minimized || is_one_of(tag.name.name, VOID_ELEMENTS);

        if standalone {
            self.handler
                .standalone_element_start(&tag.name, tag.minimized);
            for attribute in &tag.attributes {
                self.handler.attribute(attribute);
            }
            self.handler
                .standalone_element_end(&tag.name, tag.minimized, tag.end);
            return Ok(tag.end);
        }

        self.handler.open_element_start(&tag.name);
        for attribute in &tag.attributes {
            self.handler.attribute(attribute);
        }
        self.handler.open_element_end(&tag.name, tag.end);

        if is_one_of(tag.name.name, RAW_TEXT_ELEMENTS) {
            return Ok(self.raw_text(tag.end, tag.name.name));
        }
        Ok(tag.end)
    }

    /// Skip a raw text body and report its close tag, if there is one.
    fn raw_text(&mut self, from: usize, open_name: &str) -> usize {
        let len = self.bytes.len();
        let mut i = from;
        while let Some(rel) = memchr(b'<', &self.bytes[i..]) {
            let lt = i + rel;
            let name_start = lt + 2;
            let name_end = name_start + open_name.len();
            if self.bytes.get(lt + 1) == Some(&b'/')
                && name_end <= len
                && self.bytes[name_start..name_end].eq_ignore_ascii_case(open_name.as_bytes())
            {
                let k = self.skip_whitespace(name_end);
                if self.bytes.get(k) == Some(&b'>') {
                    let name = self.element_name(lt, name_start);
                    self.handler.close_element_end(&name, k + 1);
                    return k + 1;
                }
            }
            i = lt + 1;
        }
        len
    }

    fn parse_start_tag(&mut self, lt: usize) -> Result<StartTag<'a>> {
        let input = self.input;
        let name = self.element_name(lt, lt + 1);
        let len = self.bytes.len();
        let mut attributes = Vec::new();
        let mut k = name.name_end();

        loop {
            k = self.skip_whitespace(k);
            if k >= len {
                return Err(unterminated_tag(&name));
            }
            match self.bytes[k] {
                b'>' => {
                    return Ok(StartTag {
                        name,
                        attributes,
                        minimized: false,
                        end: k + 1,
                    });
                }
                b'/' if self.bytes.get(k + 1) == Some(&b'>') => {
                    return Ok(StartTag {
                        name,
                        attributes,
                        minimized: true,
                        end: k + 2,
                    });
                }
                b'/' | b'=' => {
                    k += 1;
                    continue;
                }
                _ => {}
            }

            let attr_start = k;
            while k < len && !is_attribute_name_terminator(self.bytes[k]) {
                k += 1;
            }
            let attr_name = &input[attr_start..k];
            let (line, col) = self.lines.position(self.input, attr_start);

            k = self.skip_whitespace(k);
            let mut value = "";
            if k < len && self.bytes[k] == b'=' {
                k = self.skip_whitespace(k + 1);
                if k >= len {
                    return Err(unterminated_tag(&name));
                }
                let quote = self.bytes[k];
                if quote == b'"' || quote == b'\'' {
                    let value_start = k + 1;
                    let Some(rel) = memchr(quote, &self.bytes[value_start..]) else {
                        return Err(MarkupError::UnterminatedAttributeValue {
                            attribute: attr_name.to_string(),
                            line,
                            col,
                        });
                    };
                    value = &input[value_start..value_start + rel];
                    k = value_start + rel + 1;
                } else {
                    let value_start = k;
                    while k < len && !self.bytes[k].is_ascii_whitespace() && self.bytes[k] != b'>'
                    {
                        if self.bytes[k] == b'/' && self.bytes.get(k + 1) == Some(&b'>') {
                            break;
                        }
                        k += 1;
                    }
                    value = &input[value_start..k];
                }
            }

            attributes.push(Attribute {
                name: attr_name,
                value,
                offset: attr_start,
                line,
                col,
            });
        }
    }

    fn skip_whitespace(&self, mut k: usize) -> usize {
        while k < self.bytes.len() && self.bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        k
    }
}

fn unterminated_tag(name: &ElementName<'_>) -> MarkupError {
    MarkupError::UnterminatedTag {
        name: name.name.to_string(),
        line: name.line,
        col: name.col,
    }
}

fn is_name_terminator(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/' || b == b'>'
}

fn is_attribute_name_terminator(b: u8) -> bool {
    is_name_terminator(b) || b == b'='
}

fn is_one_of(name: &str, set: &[&str]) -> bool {
    set.iter().any(|candidate| name.eq_ignore_ascii_case(candidate))
}

fn starts_with_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}
