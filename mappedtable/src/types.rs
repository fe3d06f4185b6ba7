use std::borrow::Cow;
use std::error::Error;
use std::marker::PhantomData;

/// Trait for encoding types into a fixed-width slot
pub trait BytesEncode {
    type EItem: ?Sized;

    /// Encode an item into exactly `width` bytes, or `None` if it does not fit
    fn bytes_encode(item: &Self::EItem, width: usize) -> Option<Cow<'_, [u8]>>;
}

/// Trait for decoding types from a fixed-width slot
pub trait BytesDecode<'a> {
    type DItem: 'a;

    /// Decode bytes into an item
    fn bytes_decode(bytes: &'a [u8]) -> Result<Self::DItem, Box<dyn Error + Sync + Send>>;
}

/// Shorter input is padded with zero bytes, longer input is rejected.
fn zero_padded(bytes: &[u8], width: usize) -> Option<Cow<'_, [u8]>> {
    match bytes.len() {
        len if len == width => Some(Cow::Borrowed(bytes)),
        len if len < width => {
            let mut padded = vec![0u8; width];
            padded[..len].copy_from_slice(bytes);
            Some(Cow::Owned(padded))
        }
        _ => None,
    }
}

/// UTF-8 strings, zero-padded to the slot width.
///
/// Decoding strips the trailing NUL padding, so a string that itself ends in
/// NUL characters does not round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Str;

/// Raw bytes, zero-padded to the slot width. Meant for keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bytes;

/// Raw bytes whose length must equal the slot width exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FixedBytes;

/// Wrapper for native types that can be represented as bytes (numbers, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Native<T>(PhantomData<T>);

impl<T> Default for Native<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

/// A run of `f64`s whose byte length must equal the slot width exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct F64s;

impl BytesEncode for Str {
    type EItem = str;

    fn bytes_encode(item: &Self::EItem, width: usize) -> Option<Cow<'_, [u8]>> {
        zero_padded(item.as_bytes(), width)
    }
}

impl<'a> BytesDecode<'a> for Str {
    type DItem = &'a str;

    fn bytes_decode(bytes: &'a [u8]) -> Result<Self::DItem, Box<dyn Error + Sync + Send>> {
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        std::str::from_utf8(&bytes[..end]).map_err(|e| e.into())
    }
}

impl BytesEncode for Bytes {
    type EItem = [u8];

    fn bytes_encode(item: &Self::EItem, width: usize) -> Option<Cow<'_, [u8]>> {
        zero_padded(item, width)
    }
}

impl<'a> BytesDecode<'a> for Bytes {
    type DItem = &'a [u8];

    fn bytes_decode(bytes: &'a [u8]) -> Result<Self::DItem, Box<dyn Error + Sync + Send>> {
        Ok(bytes)
    }
}

impl BytesEncode for FixedBytes {
    type EItem = [u8];

    fn bytes_encode(item: &Self::EItem, width: usize) -> Option<Cow<'_, [u8]>> {
        (item.len() == width).then_some(Cow::Borrowed(item))
    }
}

impl<'a> BytesDecode<'a> for FixedBytes {
    type DItem = &'a [u8];

    fn bytes_decode(bytes: &'a [u8]) -> Result<Self::DItem, Box<dyn Error + Sync + Send>> {
        Ok(bytes)
    }
}

impl<T: bytemuck::Pod> BytesEncode for Native<T> {
    type EItem = T;

    fn bytes_encode(item: &Self::EItem, width: usize) -> Option<Cow<'_, [u8]>> {
        let bytes = bytemuck::bytes_of(item);
        (bytes.len() == width).then_some(Cow::Borrowed(bytes))
    }
}

impl<'a, T: bytemuck::Pod> BytesDecode<'a> for Native<T> {
    type DItem = T;

    fn bytes_decode(bytes: &'a [u8]) -> Result<Self::DItem, Box<dyn Error + Sync + Send>> {
        if bytes.len() != std::mem::size_of::<T>() {
            return Err(format!(
                "Invalid byte length for {}: expected {}, got {}",
                std::any::type_name::<T>(),
                std::mem::size_of::<T>(),
                bytes.len()
            )
            .into());
        }
        // Item slots carry no alignment guarantee.
        Ok(bytemuck::pod_read_unaligned(bytes))
    }
}

impl BytesEncode for F64s {
    type EItem = [f64];

    fn bytes_encode(item: &Self::EItem, width: usize) -> Option<Cow<'_, [u8]>> {
        let bytes: &[u8] = bytemuck::cast_slice(item);
        (bytes.len() == width).then_some(Cow::Borrowed(bytes))
    }
}

impl<'a> BytesDecode<'a> for F64s {
    type DItem = Vec<f64>;

    fn bytes_decode(bytes: &'a [u8]) -> Result<Self::DItem, Box<dyn Error + Sync + Send>> {
        const WIDTH: usize = std::mem::size_of::<f64>();
        if bytes.len() % WIDTH != 0 {
            return Err(format!("{} bytes is not a whole number of f64s", bytes.len()).into());
        }
        Ok(bytes
            .chunks_exact(WIDTH)
            .map(bytemuck::pod_read_unaligned::<f64>)
            .collect())
    }
}
