//! A fixed-capacity hash table that lives in a single memory-mapped region.
//!
//! Keys and values have a fixed width chosen at creation. The region holds a
//! header, a bucket-index array and a flat item array, so lookups and inserts
//! run directly against the mapping and a file-backed table is persisted
//! simply by closing it.
//!
//! ```
//! use mappedtable::{MappedHashTable, TableParams};
//!
//! let params = TableParams::new(8, 8, 1000).with_nbuckets(2000);
//! let mut table: MappedHashTable = MappedHashTable::anonymous(params).unwrap();
//! table.insert(b"AAAAAAAA", &0x0102030405060708u64.to_be_bytes()).unwrap();
//!
//! assert_eq!(table.get(b"AAAAAAAA"), Some(&[1, 2, 3, 4, 5, 6, 7, 8][..]));
//! assert_eq!(table.get(b"BBBBBBBB"), None);
//! table.close().unwrap();
//! ```
pub mod byte_store;
pub mod error;
pub mod hash;
pub mod iter;
pub mod layout;
pub mod table;
pub mod typed;
pub mod types;
mod views;

pub use byte_store::{ByteStore, MMapFile};
pub use error::{Result, TableError};
pub use hash::{BucketHasher, FxBucketHasher, PolyHash};
pub use layout::{Header, TableParams};
pub use table::{HeapTable, MappedHashTable};
pub use typed::{StrBytesTable, StrF64Table, TypedTable};
pub use types::{Bytes, BytesDecode, BytesEncode, F64s, FixedBytes, Native, Str};
