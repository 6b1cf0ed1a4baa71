//! Bounds-checked little-endian reads over an in-memory image.

use crate::error::{Error, Result};

/// Read-only view over image bytes.
///
/// Every read is checked against the image length and fails with
/// [`Error::OutOfBounds`] instead of truncating. The reader holds no cursor,
/// so one instance can be shared freely.
#[derive(Debug, Clone, Copy)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
}

impl<'a> BinaryReader<'a> {
    /// Wrap an image.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Image length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `offset..offset + width` lies inside the image.
    pub fn contains(&self, offset: usize, width: usize) -> bool {
        offset
            .checked_add(width)
            .is_some_and(|end| end <= self.data.len())
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        if !self.contains(offset, len) {
            return Err(Error::OutOfBounds {
                offset,
                width: len,
                len: self.data.len(),
            });
        }
        Ok(&self.data[offset..offset + len])
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(offset, N)?);
        Ok(out)
    }

    /// Read one byte.
    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.array::<1>(offset)?[0])
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        self.array(offset).map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        self.array(offset).map(u32::from_le_bytes)
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&self, offset: usize) -> Result<i32> {
        self.array(offset).map(i32::from_le_bytes)
    }

    /// Read a fixed-capacity text field.
    ///
    /// The whole field must lie inside the image. Text stops at the first
    /// zero byte (or at `capacity`) and is decoded as lossy UTF-8.
    pub fn read_fixed_string(&self, offset: usize, capacity: usize) -> Result<String> {
        let field = self.slice(offset, capacity)?;
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        Ok(String::from_utf8_lossy(&field[..end]).into_owned())
    }
}
