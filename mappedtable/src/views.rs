//! Typed views over the three sections of a table region.
//!
//! Every accessor is bounds-checked against the section it views, so a
//! corrupted bucket value can never reach outside the mapping.

use crate::layout::{BUCKET_SIZE, FILL_OFFSET, HEADER_SIZE, TableParams};

/// Read-only view of the bucket-index array.
#[derive(Clone, Copy)]
pub(crate) struct Buckets<'a> {
    bytes: &'a [u8],
}

/// Writable view of the bucket-index array.
pub(crate) struct BucketsMut<'a> {
    bytes: &'a mut [u8],
}

/// Read-only view of the item array.
#[derive(Clone, Copy)]
pub(crate) struct Items<'a> {
    bytes: &'a [u8],
    key_size: usize,
    value_size: usize,
}

/// Writable view of the item array.
pub(crate) struct ItemsMut<'a> {
    bytes: &'a mut [u8],
    key_size: usize,
    value_size: usize,
}

fn read_slot(bytes: &[u8], index: usize) -> Option<i32> {
    let start = index.checked_mul(BUCKET_SIZE)?;
    let raw = bytes.get(start..start + BUCKET_SIZE)?;
    Some(i32::from_le_bytes(raw.try_into().ok()?))
}

impl<'a> Buckets<'a> {
    /// Raw slot value: 0 for empty, otherwise a 1-based item index.
    pub(crate) fn get(&self, index: usize) -> Option<i32> {
        read_slot(self.bytes, index)
    }
}

impl<'a> BucketsMut<'a> {
    pub(crate) fn get(&self, index: usize) -> Option<i32> {
        read_slot(self.bytes, index)
    }

    pub(crate) fn set(&mut self, index: usize, value: i32) {
        let start = index * BUCKET_SIZE;
        self.bytes[start..start + BUCKET_SIZE].copy_from_slice(&value.to_le_bytes());
    }
}

impl<'a> Items<'a> {
    fn item_size(&self) -> usize {
        self.key_size + self.value_size
    }

    /// Key and value bytes of item slot `index`.
    pub(crate) fn get(&self, index: usize) -> Option<(&'a [u8], &'a [u8])> {
        let item_size = self.item_size();
        let start = index.checked_mul(item_size)?;
        let item = self.bytes.get(start..start.checked_add(item_size)?)?;
        Some(item.split_at(self.key_size))
    }
}

impl<'a> ItemsMut<'a> {
    /// Writes `key` then `value` into item slot `index`.
    pub(crate) fn write(&mut self, index: usize, key: &[u8], value: &[u8]) {
        debug_assert_eq!(key.len(), self.key_size);
        debug_assert_eq!(value.len(), self.value_size);
        let start = index * (self.key_size + self.value_size);
        let (key_dst, rest) = self.bytes[start..].split_at_mut(self.key_size);
        key_dst.copy_from_slice(key);
        rest[..self.value_size].copy_from_slice(value);
    }
}

/// Splits a region into its bucket and item views.
pub(crate) fn split<'a>(region: &'a [u8], params: &TableParams) -> (Buckets<'a>, Items<'a>) {
    let buckets_end = params.items_offset();
    let items_end = buckets_end + params.capacity * params.item_size();
    (
        Buckets {
            bytes: &region[HEADER_SIZE..buckets_end],
        },
        Items {
            bytes: &region[buckets_end..items_end],
            key_size: params.key_size,
            value_size: params.value_size,
        },
    )
}

/// Splits a writable region into the raw `fill` field, bucket and item views.
pub(crate) fn split_mut<'a>(
    region: &'a mut [u8],
    params: &TableParams,
) -> (&'a mut [u8], BucketsMut<'a>, ItemsMut<'a>) {
    let buckets_end = params.items_offset();
    let items_end = buckets_end + params.capacity * params.item_size();
    let (header, rest) = region[..items_end].split_at_mut(HEADER_SIZE);
    let (buckets, items) = rest.split_at_mut(buckets_end - HEADER_SIZE);
    (
        &mut header[FILL_OFFSET..FILL_OFFSET + 4],
        BucketsMut { bytes: buckets },
        ItemsMut {
            bytes: items,
            key_size: params.key_size,
            value_size: params.value_size,
        },
    )
}
