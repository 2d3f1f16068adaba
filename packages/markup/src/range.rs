//! Content range type.

use std::fmt;

/// Byte offsets `[start, end)` into a source document delimiting the markup
/// that is spliced into the composed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentRange {
    start: usize,
    end: usize,
}

impl ContentRange {
    /// Create a range. `start` is clamped so that `start <= end` holds.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end,
        }
    }

    /// Range covering the whole of `source`.
    ///
    /// # Examples
    /// ```
    /// use composer_markup::ContentRange;
    ///
    /// let range = ContentRange::whole("<p>hi</p>");
    /// assert_eq!((range.start(), range.end()), (0, 9));
    /// ```
    #[must_use]
    pub fn whole(source: &str) -> Self {
        Self::new(0, source.len())
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The part of `source` this range covers.
    ///
    /// Returns `None` when the range does not fit `source` or does not fall on
    /// char boundaries, which happens when the range was computed for a
    /// different document.
    #[must_use]
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
