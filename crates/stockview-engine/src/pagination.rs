//! Page arithmetic for reconciled listings. Pages are 1-indexed.

use std::num::NonZeroUsize;
use std::ops::Range;

/// Number of pages needed to show `total_items`, using ceiling division.
///
/// An empty listing has zero pages.
#[must_use]
pub fn total_pages(total_items: usize, page_size: NonZeroUsize) -> usize {
    total_items.div_ceil(page_size.get())
}

/// Index range of `page` within a listing of `total_items`.
///
/// Pages past the end yield an empty range at `total_items`. `page` 0 is
/// treated as before the first page and also yields an empty range.
#[must_use]
pub fn page_range(total_items: usize, page_size: NonZeroUsize, page: usize) -> Range<usize> {
    let Some(index) = page.checked_sub(1) else {
        return 0..0;
    };
    let start = index.saturating_mul(page_size.get()).min(total_items);
    let end = start.saturating_add(page_size.get()).min(total_items);
    start..end
}

/// The items shown on `page`.
#[must_use]
pub fn page_slice<T>(items: &[T], page_size: NonZeroUsize, page: usize) -> &[T] {
    &items[page_range(items.len(), page_size, page)]
}
