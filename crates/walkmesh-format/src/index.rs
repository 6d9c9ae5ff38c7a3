//! Index entries of the `idx0` chunk
//!
//! # Layout (24 bytes)
//! ```text
//! 0x00: name_begin   u32 (byte offset into str0)
//! 0x04: name_end     u32 (exclusive)
//! 0x08: vertex_begin u32 (global vertex ordinal)
//! 0x0C: tri_begin    u32 (global triangle ordinal)
//! 0x10: vertex_end   u32 (exclusive)
//! 0x14: tri_end      u32 (exclusive)
//! ```

use std::ops::Range;

use crate::error::FormatError;

/// Locates one mesh's name, vertices and triangles inside the shared chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    pub name_begin: u32,
    pub name_end: u32,
    pub vertex_begin: u32,
    pub tri_begin: u32,
    pub vertex_end: u32,
    pub tri_end: u32,
}

impl IndexEntry {
    pub const SIZE: usize = 24;

    /// Write entry to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let fields = [
            self.name_begin,
            self.name_end,
            self.vertex_begin,
            self.tri_begin,
            self.vertex_end,
            self.tri_end,
        ];
        let mut bytes = [0u8; Self::SIZE];
        for (slot, field) in bytes.chunks_exact_mut(4).zip(fields) {
            slot.copy_from_slice(&field.to_le_bytes());
        }
        bytes
    }

    /// Read entry from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let field = |i: usize| {
            u32::from_le_bytes([bytes[i * 4], bytes[i * 4 + 1], bytes[i * 4 + 2], bytes[i * 4 + 3]])
        };
        Some(Self {
            name_begin: field(0),
            name_end: field(1),
            vertex_begin: field(2),
            tri_begin: field(3),
            vertex_end: field(4),
            tri_end: field(5),
        })
    }

    pub fn name_range(&self) -> Range<usize> {
        self.name_begin as usize..self.name_end as usize
    }

    pub fn vertex_range(&self) -> Range<usize> {
        self.vertex_begin as usize..self.vertex_end as usize
    }

    pub fn triangle_range(&self) -> Range<usize> {
        self.tri_begin as usize..self.tri_end as usize
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_range().len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_range().len()
    }

    /// Check every range against the element counts of the other chunks.
    pub(crate) fn validate(
        &self,
        entry: usize,
        strings_len: usize,
        vertex_total: usize,
        triangle_total: usize,
    ) -> Result<(), FormatError> {
        let out_of_range = |detail: String| FormatError::IndexOutOfRange { entry, detail };

        if !(self.name_begin <= self.name_end && self.name_end as usize <= strings_len) {
            return Err(out_of_range(format!(
                "name range {}..{} outside {} string bytes",
                self.name_begin, self.name_end, strings_len
            )));
        }
        if !(self.vertex_begin <= self.vertex_end && self.vertex_end as usize <= vertex_total) {
            return Err(out_of_range(format!(
                "vertex range {}..{} outside {} vertices",
                self.vertex_begin, self.vertex_end, vertex_total
            )));
        }
        if !(self.tri_begin <= self.tri_end && self.tri_end as usize <= triangle_total) {
            return Err(out_of_range(format!(
                "triangle range {}..{} outside {} triangles",
                self.tri_begin, self.tri_end, triangle_total
            )));
        }
        Ok(())
    }
}

/// Split an `idx0` payload into entries.
pub(crate) fn parse_index(payload: &[u8]) -> Result<Vec<IndexEntry>, FormatError> {
    if payload.len() % IndexEntry::SIZE != 0 {
        return Err(FormatError::CorruptIndex {
            length: payload.len(),
        });
    }
    Ok(payload
        .chunks_exact(IndexEntry::SIZE)
        .filter_map(IndexEntry::from_bytes)
        .collect())
}
