use std::path::PathBuf;

use walkmesh_core::RecordError;

use crate::chunk::ChunkTag;

/// Errors that can occur while encoding or decoding a walk-mesh container.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("malformed record '{name}': {reason}")]
    MalformedRecord {
        name: String,
        #[source]
        reason: RecordError,
    },

    #[error("internal consistency check failed: {0}")]
    InternalConsistency(String),

    #[error("stream truncated in '{chunk}' chunk: needed {needed} bytes at offset {offset}, {available} available")]
    TruncatedStream {
        chunk: ChunkTag,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("unexpected chunk tag '{}' at offset {offset}, expected '{expected}'", .found.escape_ascii())]
    UnexpectedTag {
        expected: ChunkTag,
        found: [u8; 4],
        offset: usize,
    },

    #[error("'{chunk}' chunk is {length} bytes, not a multiple of {element_size}")]
    MisalignedChunk {
        chunk: ChunkTag,
        length: usize,
        element_size: usize,
    },

    #[error("index chunk is {length} bytes, not a multiple of 24")]
    CorruptIndex { length: usize },

    #[error("index entry {entry}: {detail}")]
    IndexOutOfRange { entry: usize, detail: String },

    #[error("index entry {entry}: mesh name is not valid UTF-8")]
    InvalidName {
        entry: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("mesh '{0}' not found")]
    NotFound(String),

    #[error("unknown walk mesh file type '{0}', expected a .pnt file")]
    UnsupportedExtension(PathBuf),

    #[error("I/O error on '{0}': {1}")]
    File(PathBuf, #[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
