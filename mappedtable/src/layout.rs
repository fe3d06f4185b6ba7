//! On-disk layout of a mapped hash table.
//!
//! ```text
//! offset 0                      header { key_size, value_size, capacity, fill, nbuckets }
//! offset HEADER_SIZE            bucket_index[nbuckets]   0 = empty, else 1-based item index
//! offset HEADER_SIZE + nb * 4   item[capacity]           key bytes then value bytes
//! ```
//!
//! All integers are 32-bit signed little-endian, so files are portable
//! between hosts.

use bytemuck::{Pod, Zeroable};

use crate::error::{Result, TableError};

/// Size of the fixed header at the start of the region.
pub const HEADER_SIZE: usize = std::mem::size_of::<Header>();

/// Size of one slot of the bucket-index array.
pub const BUCKET_SIZE: usize = std::mem::size_of::<i32>();

/// Bucket value meaning "no item".
pub const BUCKET_EMPTY: i32 = 0;

/// Byte offset of `fill` inside the header.
pub(crate) const FILL_OFFSET: usize = 3 * std::mem::size_of::<i32>();

/// Header lives at offset 0 of the region.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroable, Pod)]
pub struct Header {
    pub key_size: i32,
    pub value_size: i32,
    pub capacity: i32,
    pub fill: i32,
    pub nbuckets: i32,
}

const _: () = assert!(HEADER_SIZE == 20);

impl Header {
    /// Decodes the header from the first `HEADER_SIZE` bytes of `bytes`.
    pub fn read_from(bytes: &[u8]) -> Option<Self> {
        let raw = bytes.get(..HEADER_SIZE)?;
        let stored: Header = bytemuck::pod_read_unaligned(raw);
        Some(stored.swapped_from_le())
    }

    /// Encodes the header into the first `HEADER_SIZE` bytes of `bytes`.
    pub fn write_to(&self, bytes: &mut [u8]) {
        let stored = self.swapped_to_le();
        bytes[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&stored));
    }

    fn swapped_to_le(self) -> Self {
        Header {
            key_size: self.key_size.to_le(),
            value_size: self.value_size.to_le(),
            capacity: self.capacity.to_le(),
            fill: self.fill.to_le(),
            nbuckets: self.nbuckets.to_le(),
        }
    }

    fn swapped_from_le(self) -> Self {
        Header {
            key_size: i32::from_le(self.key_size),
            value_size: i32::from_le(self.value_size),
            capacity: i32::from_le(self.capacity),
            fill: i32::from_le(self.fill),
            nbuckets: i32::from_le(self.nbuckets),
        }
    }

    /// Size of the region this header describes.
    pub fn region_size(&self) -> Result<usize> {
        TableParams::try_from(*self)?.region_size()
    }
}

/// The fixed geometry of a table, chosen once at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableParams {
    pub key_size: usize,
    pub value_size: usize,
    pub capacity: usize,
    pub nbuckets: usize,
}

impl TableParams {
    /// Geometry with twice as many buckets as items, keeping the load factor at or below one half.
    pub fn new(key_size: usize, value_size: usize, capacity: usize) -> Self {
        Self {
            key_size,
            value_size,
            capacity,
            nbuckets: capacity.saturating_mul(2).max(1),
        }
    }

    pub fn with_nbuckets(mut self, nbuckets: usize) -> Self {
        self.nbuckets = nbuckets;
        self
    }

    /// Bytes taken by one key plus its value.
    pub fn item_size(&self) -> usize {
        self.key_size + self.value_size
    }

    /// Offset of the bucket-index array from the start of the region.
    pub fn buckets_offset(&self) -> usize {
        HEADER_SIZE
    }

    /// Offset of the item array from the start of the region.
    pub fn items_offset(&self) -> usize {
        HEADER_SIZE + self.nbuckets * BUCKET_SIZE
    }

    /// Total size of the region in bytes.
    pub fn region_size(&self) -> Result<usize> {
        let overflow = || TableError::InvalidInput(format!("region size overflows for {self:?}"));
        let item_size = self
            .key_size
            .checked_add(self.value_size)
            .ok_or_else(overflow)?;
        let items = self.capacity.checked_mul(item_size).ok_or_else(overflow)?;
        let buckets = self
            .nbuckets
            .checked_mul(BUCKET_SIZE)
            .ok_or_else(overflow)?;
        HEADER_SIZE
            .checked_add(buckets)
            .and_then(|n| n.checked_add(items))
            .ok_or_else(overflow)
    }

    /// Checks that the geometry can be stored in a header and addressed.
    pub fn validate(&self) -> Result<()> {
        let fits = |name: &str, n: usize| {
            i32::try_from(n)
                .map(|_| ())
                .map_err(|_| TableError::InvalidInput(format!("{name} {n} does not fit in 32 bits")))
        };
        fits("key_size", self.key_size)?;
        fits("value_size", self.value_size)?;
        fits("nbuckets", self.nbuckets)?;
        fits("item size", self.item_size())?;
        // Buckets store `fill + 1`, so the last item index must stay representable.
        if self.capacity >= i32::MAX as usize {
            return Err(TableError::InvalidInput(format!(
                "capacity {} must be below {}",
                self.capacity,
                i32::MAX
            )));
        }
        if self.nbuckets == 0 {
            return Err(TableError::InvalidInput(
                "nbuckets must be at least 1".to_string(),
            ));
        }
        self.region_size().map(|_| ())
    }

    /// The header of a freshly created table with this geometry.
    pub(crate) fn empty_header(&self) -> Header {
        Header {
            key_size: self.key_size as i32,
            value_size: self.value_size as i32,
            capacity: self.capacity as i32,
            fill: 0,
            nbuckets: self.nbuckets as i32,
        }
    }
}

impl TryFrom<Header> for TableParams {
    type Error = TableError;

    fn try_from(header: Header) -> Result<Self> {
        let field = |name: &str, n: i32| {
            usize::try_from(n)
                .map_err(|_| TableError::Corrupt(format!("negative {name} {n} in header")))
        };
        let params = TableParams {
            key_size: field("key_size", header.key_size)?,
            value_size: field("value_size", header.value_size)?,
            capacity: field("capacity", header.capacity)?,
            nbuckets: field("nbuckets", header.nbuckets)?,
        };
        if params.nbuckets == 0 {
            return Err(TableError::Corrupt("header has zero buckets".to_string()));
        }
        params
            .region_size()
            .map_err(|e| TableError::Corrupt(e.to_string()))?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_region_size_of_sample_geometry() {
        let params = TableParams::new(24, 20, 10000).with_nbuckets(5000);
        assert_eq!(params.region_size().unwrap(), 20 + 5000 * 4 + 10000 * 44);
        assert_eq!(params.items_offset(), 20 + 5000 * 4);
    }

    #[test]
    fn test_header_is_little_endian() {
        let header = Header {
            key_size: 24,
            value_size: 20,
            capacity: 10000,
            fill: 0,
            nbuckets: 5000,
        };
        let mut bytes = [0u8; HEADER_SIZE];
        header.write_to(&mut bytes);
        assert_eq!(&bytes[0..4], &24i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &10000i32.to_le_bytes());
        assert_eq!(&bytes[FILL_OFFSET..FILL_OFFSET + 4], &0i32.to_le_bytes());
        assert_eq!(&bytes[16..20], &5000i32.to_le_bytes());
        assert_eq!(Header::read_from(&bytes), Some(header));
    }

    #[test]
    fn test_short_buffer_has_no_header() {
        assert_eq!(Header::read_from(&[0u8; HEADER_SIZE - 1]), None);
    }

    #[test]
    fn test_validate_rejects_zero_buckets() {
        let params = TableParams::new(8, 8, 10).with_nbuckets(0);
        assert!(matches!(params.validate(), Err(TableError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_dimensions() {
        let params = TableParams::new(usize::MAX / 2, 8, 10);
        assert!(matches!(params.validate(), Err(TableError::InvalidInput(_))));
        let params = TableParams::new(8, 8, i32::MAX as usize);
        assert!(matches!(params.validate(), Err(TableError::InvalidInput(_))));
    }

    #[test]
    fn test_negative_header_is_corrupt() {
        let header = Header {
            key_size: 8,
            value_size: -1,
            capacity: 10,
            fill: 0,
            nbuckets: 20,
        };
        assert!(matches!(
            TableParams::try_from(header),
            Err(TableError::Corrupt(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_header_round_trips_params(
            key_size in 0usize..512,
            value_size in 0usize..512,
            capacity in 0usize..100_000,
            nbuckets in 1usize..200_000,
        ) {
            let params = TableParams::new(key_size, value_size, capacity).with_nbuckets(nbuckets);
            prop_assert!(params.validate().is_ok());
            let header = params.empty_header();
            prop_assert_eq!(TableParams::try_from(header).unwrap(), params);
            prop_assert_eq!(header.region_size().unwrap(), params.region_size().unwrap());
        }
    }
}
