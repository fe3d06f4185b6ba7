use std::io;
use thiserror::Error;

/// Errors that can occur when working with a mapped hash table
#[derive(Error, Debug)]
pub enum TableError {
    /// Creating, sizing, mapping, flushing or unmapping the region failed
    #[error("Allocation failed: {0}")]
    AllocationFailed(#[from] io::Error),

    /// Every item slot is taken
    #[error("The hash table is out of space for items")]
    NoCapacity,

    /// The probe sequence wrapped around without finding an empty bucket
    #[error("The hash table is out of buckets")]
    NoBuckets,

    /// The key does not fit the table's fixed key size
    #[error("Invalid key: expected at most {key_size} bytes")]
    InvalidKey { key_size: usize },

    /// The value does not match the table's fixed value size
    #[error("Invalid value: expected exactly {value_size} bytes")]
    InvalidValue { value_size: usize },

    /// Creation parameters that cannot describe a table
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The region does not hold a consistent table
    #[error("Corrupt table: {0}")]
    Corrupt(String),

    /// Insert against a table mapped read-only
    #[error("The hash table is mapped read-only")]
    ReadOnly,

    /// A stored slot could not be decoded into the requested type
    #[error("Decoding error: {0}")]
    Decoding(String),
}

pub type Result<T> = std::result::Result<T, TableError>;

impl From<Box<dyn std::error::Error + Send + Sync>> for TableError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        TableError::Decoding(err.to_string())
    }
}
