use std::iter::FusedIterator;

use crate::views::Items;

/// Iterator over the stored `(key, value)` pairs in insertion order.
///
/// Duplicate inserts of the same key are all yielded, including the ones
/// that lookups never reach.
pub struct Iter<'a> {
    items: Items<'a>,
    current_index: usize,
    fill: usize,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(items: Items<'a>, fill: usize) -> Self {
        Self {
            items,
            current_index: 0,
            fill,
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index >= self.fill {
            return None;
        }
        let item = self.items.get(self.current_index);
        self.current_index += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.fill.saturating_sub(self.current_index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
