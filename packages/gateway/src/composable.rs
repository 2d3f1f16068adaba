//! Values that are merged across the documents of one composition.

/// A value that can be merged with another value of the same type.
///
/// Merging is left-to-right: `a.composed_with(b)` lets `b` win where the two
/// disagree, unless the implementation documents otherwise.
pub trait Composable: Sized {
    /// Merge `other` into `self`.
    #[must_use]
    fn composed_with(self, other: Self) -> Self;

    /// Merge every item of `others` into `self`, in order.
    #[must_use]
    fn composed_from(self, others: impl IntoIterator<Item = Self>) -> Self {
        others
            .into_iter()
            .fold(self, |acc, other| acc.composed_with(other))
    }
}
