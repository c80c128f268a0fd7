use std::ops::Range;

use super::error::{DecodeError, LayerKind};

/// Big-endian field access over one layer's bytes.
pub struct LayerReader<'a> {
    layer: LayerKind,
    bytes: &'a [u8],
}

impl<'a> LayerReader<'a> {
    pub fn new(layer: LayerKind, bytes: &'a [u8]) -> Self {
        Self { layer, bytes }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), DecodeError> {
        if self.bytes.len() < needed {
            return Err(self.too_short(needed));
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, DecodeError> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or_else(|| self.too_short(offset + 1))
    }

    pub fn read_u16_be(&self, range: Range<usize>) -> Result<u16, DecodeError> {
        let bytes = self.read_array::<2>(range)?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn read_u32_be(&self, range: Range<usize>) -> Result<u32, DecodeError> {
        let bytes = self.read_array::<4>(range)?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn read_array<const N: usize>(&self, range: Range<usize>) -> Result<[u8; N], DecodeError> {
        let end = range.end;
        self.read_slice(range)?
            .try_into()
            .map_err(|_| self.too_short(end))
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], DecodeError> {
        self.bytes
            .get(range.clone())
            .ok_or_else(|| self.too_short(range.end))
    }

    fn too_short(&self, needed: usize) -> DecodeError {
        DecodeError::TooShort {
            layer: self.layer,
            needed,
            actual: self.bytes.len(),
        }
    }
}
