use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use crate::byte_store::{ByteStore, MMapFile};
use crate::error::{Result, TableError};
use crate::hash::{BucketHasher, PolyHash};
use crate::layout::TableParams;
use crate::table::MappedHashTable;
use crate::types::{BytesDecode, BytesEncode, F64s, FixedBytes, Str};

// Type aliases for common table shapes
pub type StrF64Table<BS = MMapFile> = TypedTable<Str, F64s, BS>;
pub type StrBytesTable<BS = MMapFile> = TypedTable<Str, FixedBytes, BS>;

/// A [`MappedHashTable`] with typed keys and values.
///
/// Keys and values are encoded to the table's fixed widths by the codecs `K`
/// and `V` (see [`crate::types`]). A key that does not fit is an
/// `InvalidKey` error, a value that does not fit an `InvalidValue` error;
/// neither reaches the underlying table.
pub struct TypedTable<K, V, BS = MMapFile, H = PolyHash>
where
    BS: ByteStore,
    H: BucketHasher,
{
    table: MappedHashTable<BS, H>,
    _marker: PhantomData<(K, V)>,
}

impl<K, V, H: BucketHasher> TypedTable<K, V, MMapFile, H> {
    /// Creates a table in `path`, or in an anonymous map when `path` is `None`.
    pub fn create(params: TableParams, path: Option<&Path>) -> Result<Self> {
        MappedHashTable::create(params, path).map(Self::from_table)
    }

    pub fn anonymous(params: TableParams) -> Result<Self> {
        MappedHashTable::anonymous(params).map(Self::from_table)
    }

    /// Maps an existing table file read-only.
    pub fn open(path: &Path) -> Result<Self> {
        MappedHashTable::open(path).map(Self::from_table)
    }

    /// Maps an existing table file read-write.
    pub fn open_mut(path: &Path) -> Result<Self> {
        MappedHashTable::open_mut(path).map(Self::from_table)
    }
}

impl<K, V, BS: ByteStore, H: BucketHasher> TypedTable<K, V, BS, H> {
    pub fn from_table(table: MappedHashTable<BS, H>) -> Self {
        Self {
            table,
            _marker: PhantomData,
        }
    }

    /// The untyped table underneath.
    pub fn raw(&self) -> &MappedHashTable<BS, H> {
        &self.table
    }

    pub fn into_inner(self) -> MappedHashTable<BS, H> {
        self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn flush(&self) -> Result<()> {
        self.table.flush()
    }

    pub fn close(self) -> Result<()> {
        self.table.close()
    }
}

impl<K, V, BS, H> TypedTable<K, V, BS, H>
where
    K: BytesEncode,
    V: BytesEncode,
    BS: ByteStore,
    H: BucketHasher,
{
    fn encode_key<'k>(&self, key: &'k K::EItem) -> Result<std::borrow::Cow<'k, [u8]>> {
        let key_size = self.table.key_size();
        K::bytes_encode(key, key_size).ok_or(TableError::InvalidKey { key_size })
    }

    /// Inserts `key` -> `value`; see [`MappedHashTable::insert`].
    pub fn insert(&mut self, key: &K::EItem, value: &V::EItem) -> Result<()> {
        let key = self.encode_key(key)?;
        let value_size = self.table.value_size();
        let value =
            V::bytes_encode(value, value_size).ok_or(TableError::InvalidValue { value_size })?;
        self.table.insert(&key, &value)
    }

    /// Looks up `key` and decodes its value.
    ///
    /// A key longer than the table's key size is an error; a key that was
    /// never inserted is `Ok(None)`.
    pub fn get<'a>(&'a self, key: &K::EItem) -> Result<Option<<V as BytesDecode<'a>>::DItem>>
    where
        V: BytesDecode<'a>,
    {
        let key = self.encode_key(key)?;
        self.table
            .get(&key)
            .map(|bytes| V::bytes_decode(bytes).map_err(TableError::from))
            .transpose()
    }

    pub fn contains_key(&self, key: &K::EItem) -> Result<bool> {
        let key = self.encode_key(key)?;
        Ok(self.table.contains_key(&key))
    }
}

impl<K, V, BS: ByteStore, H: BucketHasher> fmt::Debug for TypedTable<K, V, BS, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedTable").field(&self.table).finish()
    }
}
