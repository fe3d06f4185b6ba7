use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use tracing::{debug, warn};

use crate::byte_store::{ByteStore, MMapFile};
use crate::error::{Result, TableError};
use crate::hash::{BucketHasher, PolyHash};
use crate::iter::Iter;
use crate::layout::{BUCKET_EMPTY, FILL_OFFSET, Header, TableParams};
use crate::views;

/// A table kept on the heap instead of in a memory map.
pub type HeapTable<H = PolyHash> = MappedHashTable<Vec<u8>, H>;

/// A fixed-capacity open-addressing hash table living in one contiguous region.
///
/// The region holds a header, a bucket-index array and a flat item array
/// (see [`crate::layout`]). Keys and values are fixed-width byte strings;
/// collisions are resolved by linear probing. Items are only ever appended,
/// so the table never rehashes, moves or deletes anything.
///
/// The handle owns its region. [`MappedHashTable::close`] consumes it and
/// reports flush/unmap errors; dropping it releases the region silently.
pub struct MappedHashTable<S: ByteStore = MMapFile, H: BucketHasher = PolyHash> {
    store: S,
    params: TableParams,
    _hasher: PhantomData<H>,
}

impl<H: BucketHasher> MappedHashTable<MMapFile, H> {
    /// Creates a table in `path`, or in an anonymous map when `path` is `None`.
    ///
    /// An existing file is truncated. If the file cannot be sized or mapped it
    /// is removed again before the error is returned.
    pub fn create(params: TableParams, path: Option<&Path>) -> Result<Self> {
        params.validate()?;
        let size = params.region_size()?;
        let store = match path {
            Some(path) => MMapFile::create(path, size)?,
            None => MMapFile::anonymous(size)?,
        };
        debug!(
            "Created table at {} ({size} bytes, {params:?})",
            path.map_or_else(|| "<anonymous>".to_string(), |p| p.display().to_string())
        );
        Ok(Self::init(params, store))
    }

    /// Creates a table in an anonymous map; contents vanish when it is released.
    pub fn anonymous(params: TableParams) -> Result<Self> {
        Self::create(params, None)
    }

    /// Maps an existing table file read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let store = MMapFile::open(path)?;
        debug!("Opened table {} read-only ({} bytes)", path.display(), store.len());
        Self::from_store(store)
    }

    /// Maps an existing table file read-write so more items can be appended.
    pub fn open_mut(path: &Path) -> Result<Self> {
        let store = MMapFile::open_mut(path)?;
        debug!("Opened table {} read-write ({} bytes)", path.display(), store.len());
        Self::from_store(store)
    }

    /// The backing file, `None` for anonymous tables.
    pub fn path(&self) -> Option<&Path> {
        self.store.path()
    }

    pub fn is_writable(&self) -> bool {
        self.store.is_writable()
    }
}

impl<H: BucketHasher> MappedHashTable<Vec<u8>, H> {
    /// Creates a table in a zeroed heap buffer.
    pub fn in_heap(params: TableParams) -> Result<Self> {
        params.validate()?;
        let store = vec![0u8; params.region_size()?];
        Ok(Self::init(params, store))
    }
}

impl<S: ByteStore, H: BucketHasher> MappedHashTable<S, H> {
    /// Writes the header of an empty table into an already zeroed store of the exact size.
    fn init(params: TableParams, mut store: S) -> Self {
        if let Some(region) = store.bytes_mut() {
            params.empty_header().write_to(region);
        }
        Self {
            store,
            params,
            _hasher: PhantomData,
        }
    }

    /// Builds an empty table over `store`, which must be writable and exactly
    /// `params.region_size()` bytes long. Previous contents are zeroed.
    pub fn with_store(params: TableParams, mut store: S) -> Result<Self> {
        params.validate()?;
        let size = params.region_size()?;
        let region = store.bytes_mut().ok_or(TableError::ReadOnly)?;
        if region.len() != size {
            return Err(TableError::InvalidInput(format!(
                "store holds {} bytes but the table needs {size}",
                region.len()
            )));
        }
        region.fill(0);
        Ok(Self::init(params, store))
    }

    /// Adopts a store that already holds a table.
    ///
    /// The header is checked against the store before any other access: the
    /// dimensions must be non-negative, `fill` must not exceed `capacity`, and
    /// the region size they describe must equal the store length.
    pub fn from_store(store: S) -> Result<Self> {
        let region = store.as_ref();
        let header = Header::read_from(region).ok_or_else(|| {
            TableError::Corrupt(format!("{} bytes is too short for a header", region.len()))
        })?;
        let params = TableParams::try_from(header)?;
        let size = params.region_size()?;
        if size != region.len() {
            return Err(TableError::Corrupt(format!(
                "header describes {size} bytes but the region holds {}",
                region.len()
            )));
        }
        if header.fill < 0 || header.fill > header.capacity {
            return Err(TableError::Corrupt(format!(
                "fill {} outside 0..={}",
                header.fill, header.capacity
            )));
        }
        Ok(Self {
            store,
            params,
            _hasher: PhantomData,
        })
    }

    /// Inserts `key` -> `value`.
    ///
    /// No duplicate detection happens: inserting a key twice stores both
    /// items, and lookups find whichever sits earlier on the probe sequence.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let params = self.params;
        if key.len() != params.key_size {
            return Err(TableError::InvalidKey {
                key_size: params.key_size,
            });
        }
        if value.len() != params.value_size {
            return Err(TableError::InvalidValue {
                value_size: params.value_size,
            });
        }
        let fill = self.len();
        let region = self.store.bytes_mut().ok_or(TableError::ReadOnly)?;
        if fill >= params.capacity {
            return Err(TableError::NoCapacity);
        }

        let (fill_field, mut buckets, mut items) = views::split_mut(region, &params);
        let home = H::home_bucket(key, params.nbuckets);
        let mut bucket = home;
        while buckets.get(bucket) != Some(BUCKET_EMPTY) {
            bucket = (bucket + 1) % params.nbuckets;
            if bucket == home {
                return Err(TableError::NoBuckets);
            }
        }

        items.write(fill, key, value);
        // 1-based so that zeroed memory reads as empty.
        buckets.set(bucket, (fill + 1) as i32);
        fill_field.copy_from_slice(&((fill + 1) as i32).to_le_bytes());
        Ok(())
    }

    /// Looks up `key`, returning its value bytes inside the region.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        if key.len() != self.params.key_size {
            return None;
        }
        let nbuckets = self.params.nbuckets;
        let fill = self.len();
        let (buckets, items) = views::split(self.store.as_ref(), &self.params);

        let home = H::home_bucket(key, nbuckets);
        let mut bucket = home;
        loop {
            let slot = buckets.get(bucket)?;
            if slot == BUCKET_EMPTY {
                return None;
            }
            match item_index(slot, fill).and_then(|index| items.get(index)) {
                Some((stored_key, value)) if stored_key == key => return Some(value),
                Some(_) => {}
                None => warn!("Bucket {bucket} holds {slot}, outside 1..={fill}; skipping"),
            }
            bucket = (bucket + 1) % nbuckets;
            if bucket == home {
                return None;
            }
        }
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Stored items in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        let (_, items) = views::split(self.store.as_ref(), &self.params);
        Iter::new(items, self.len())
    }

    /// Number of stored items (the header's `fill`).
    pub fn len(&self) -> usize {
        let region = self.store.as_ref();
        region
            .get(FILL_OFFSET..FILL_OFFSET + 4)
            .and_then(|raw| <[u8; 4]>::try_from(raw).ok())
            .map_or(0, |raw| i32::from_le_bytes(raw).clamp(0, i32::MAX) as usize)
            .min(self.params.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn key_size(&self) -> usize {
        self.params.key_size
    }

    pub fn value_size(&self) -> usize {
        self.params.value_size
    }

    pub fn capacity(&self) -> usize {
        self.params.capacity
    }

    pub fn nbuckets(&self) -> usize {
        self.params.nbuckets
    }

    pub fn params(&self) -> TableParams {
        self.params
    }

    /// Stored items per bucket.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.params.nbuckets as f64
    }

    /// The header as currently stored in the region.
    pub fn header(&self) -> Header {
        Header {
            fill: self.len() as i32,
            ..self.params.empty_header()
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives up the table and returns the region it lives in.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Writes dirty pages of a file-backed table to disk.
    pub fn flush(&self) -> Result<()> {
        self.store.flush()?;
        Ok(())
    }

    /// Flushes and releases the region.
    ///
    /// The region size is recomputed from the header stored in the region; a
    /// mismatch with the actual region length is reported as `Corrupt` after
    /// the region has been released.
    pub fn close(self) -> Result<()> {
        let region = self.store.as_ref();
        let actual = region.len();
        let expected = Header::read_from(region)
            .ok_or_else(|| TableError::Corrupt("region lost its header".to_string()))
            .and_then(|header| header.region_size());
        let fill = self.len();

        self.store.flush()?;
        drop(self.store);

        let expected = expected?;
        if expected != actual {
            warn!("Closed table whose header describes {expected} bytes over a {actual} byte region");
            return Err(TableError::Corrupt(format!(
                "header describes {expected} bytes but the region held {actual}"
            )));
        }
        debug!("Closed table with {fill} items ({actual} bytes)");
        Ok(())
    }
}

/// Converts a 1-based bucket value to an item index, rejecting values past `fill`.
fn item_index(slot: i32, fill: usize) -> Option<usize> {
    let slot = usize::try_from(slot).ok()?;
    (1..=fill).contains(&slot).then(|| slot - 1)
}

impl<'a, S: ByteStore, H: BucketHasher> IntoIterator for &'a MappedHashTable<S, H> {
    type Item = (&'a [u8], &'a [u8]);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S: ByteStore, H: BucketHasher> fmt::Debug for MappedHashTable<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedHashTable")
            .field("params", &self.params)
            .field("fill", &self.len())
            .finish()
    }
}
