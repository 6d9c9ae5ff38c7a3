//! Chunk framing
//!
//! # Layout
//! ```text
//! 0x00: tag     [u8; 4] (ASCII)
//! 0x04: length  u32 (payload bytes)
//! 0x08: payload (length bytes)
//! ```

use std::fmt;

use crate::error::FormatError;

/// The four chunk kinds, in the order they appear in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkTag {
    /// `vert`: 24-byte vertices
    Vertices,
    /// `tris`: 12-byte triangles with global indices
    Triangles,
    /// `str0`: concatenated mesh names
    Strings,
    /// `idx0`: 24-byte index entries
    Index,
}

impl ChunkTag {
    /// Fixed chunk order of a container
    pub const ORDER: [ChunkTag; 4] = [
        ChunkTag::Vertices,
        ChunkTag::Triangles,
        ChunkTag::Strings,
        ChunkTag::Index,
    ];

    pub const fn bytes(self) -> [u8; 4] {
        match self {
            ChunkTag::Vertices => *b"vert",
            ChunkTag::Triangles => *b"tris",
            ChunkTag::Strings => *b"str0",
            ChunkTag::Index => *b"idx0",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ChunkTag::Vertices => "vert",
            ChunkTag::Triangles => "tris",
            ChunkTag::Strings => "str0",
            ChunkTag::Index => "idx0",
        }
    }

    pub fn from_bytes(tag: [u8; 4]) -> Option<Self> {
        Self::ORDER.into_iter().find(|t| t.bytes() == tag)
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chunk header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: [u8; 4],
    pub length: u32,
}

impl ChunkHeader {
    pub const SIZE: usize = 8;

    pub fn new(tag: ChunkTag, length: u32) -> Self {
        Self {
            tag: tag.bytes(),
            length,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.tag);
        bytes[4..8].copy_from_slice(&self.length.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            tag: [bytes[0], bytes[1], bytes[2], bytes[3]],
            length: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

/// Append one framed chunk to `out`.
pub(crate) fn write_chunk(out: &mut Vec<u8>, tag: ChunkTag, payload: &[u8]) -> Result<(), FormatError> {
    let length = u32::try_from(payload.len()).map_err(|_| {
        FormatError::InternalConsistency(format!(
            "'{tag}' payload of {} bytes exceeds the u32 length field",
            payload.len()
        ))
    })?;
    out.extend_from_slice(&ChunkHeader::new(tag, length).to_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

/// Sequential reader over the chunks of a container.
pub(crate) struct ChunkReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ChunkReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Read the next chunk, which must carry `expected`, and return its payload.
    pub(crate) fn expect(&mut self, expected: ChunkTag) -> Result<&'a [u8], FormatError> {
        let rest = &self.bytes[self.offset..];
        let header = ChunkHeader::from_bytes(rest).ok_or(FormatError::TruncatedStream {
            chunk: expected,
            offset: self.offset,
            needed: ChunkHeader::SIZE,
            available: rest.len(),
        })?;

        if header.tag != expected.bytes() {
            return Err(FormatError::UnexpectedTag {
                expected,
                found: header.tag,
                offset: self.offset,
            });
        }

        let start = self.offset + ChunkHeader::SIZE;
        let length = header.length as usize;
        let available = self.bytes.len() - start;
        if length > available {
            return Err(FormatError::TruncatedStream {
                chunk: expected,
                offset: start,
                needed: length,
                available,
            });
        }

        self.offset = start + length;
        Ok(&self.bytes[start..self.offset])
    }

    /// Bytes left after the last chunk read
    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}
