use std::io::Write;

use tracing::debug;
use walkmesh_core::{MeshRecord, RecordError, Triangle, Vertex};

use crate::chunk::{write_chunk, ChunkHeader, ChunkTag};
use crate::error::FormatError;
use crate::index::IndexEntry;

/// Accumulates mesh records into the shared vertex, triangle and string
/// buffers, then frames them as a container.
#[derive(Debug, Default)]
pub struct Encoder {
    vertices: Vec<u8>,
    triangles: Vec<u8>,
    strings: Vec<u8>,
    index: Vec<IndexEntry>,
    vertex_count: u32,
    triangle_count: u32,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record. A rejected record leaves the encoder unchanged.
    pub fn push(&mut self, record: &MeshRecord) -> Result<IndexEntry, FormatError> {
        let malformed = |reason: RecordError| FormatError::MalformedRecord {
            name: record.name.clone(),
            reason,
        };

        record.validate().map_err(malformed)?;

        // validate() guarantees both counts fit in u32
        let vertex_end = self
            .vertex_count
            .checked_add(record.vertex_count() as u32)
            .filter(|&end| fits_u32(end as usize * Vertex::SIZE))
            .ok_or_else(|| {
                malformed(RecordError::TooLarge {
                    what: "total vertex",
                    count: self.vertex_count as usize + record.vertex_count(),
                })
            })?;
        let tri_end = self
            .triangle_count
            .checked_add(record.triangle_count() as u32)
            .filter(|&end| fits_u32(end as usize * Triangle::SIZE))
            .ok_or_else(|| {
                malformed(RecordError::TooLarge {
                    what: "total triangle",
                    count: self.triangle_count as usize + record.triangle_count(),
                })
            })?;
        let name_end = self.strings.len() + record.name.len();
        if !fits_u32(name_end) {
            return Err(malformed(RecordError::TooLarge {
                what: "name byte",
                count: name_end,
            }));
        }
        if !fits_u32((self.index.len() + 1) * IndexEntry::SIZE) {
            return Err(malformed(RecordError::TooLarge {
                what: "mesh",
                count: self.index.len() + 1,
            }));
        }

        let entry = IndexEntry {
            name_begin: self.strings.len() as u32,
            name_end: name_end as u32,
            vertex_begin: self.vertex_count,
            tri_begin: self.triangle_count,
            vertex_end,
            tri_end,
        };

        self.vertices.reserve(record.vertex_count() * Vertex::SIZE);
        for vertex in &record.vertices {
            for component in vertex.to_array() {
                self.vertices.extend_from_slice(&component.to_le_bytes());
            }
        }

        self.triangles.reserve(record.triangle_count() * Triangle::SIZE);
        for triangle in &record.triangles {
            // Local indices are < vertex_count and vertex_end fits in u32
            for index in triangle.indices() {
                self.triangles
                    .extend_from_slice(&(entry.vertex_begin + index).to_le_bytes());
            }
        }

        self.strings.extend_from_slice(record.name.as_bytes());
        self.index.push(entry);
        self.vertex_count = vertex_end;
        self.triangle_count = tri_end;

        debug!(
            "Encoded mesh '{}': {} vertices, {} triangles",
            record.name,
            record.vertex_count(),
            record.triangle_count()
        );
        Ok(entry)
    }

    /// Number of records pushed so far
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn triangle_count(&self) -> u32 {
        self.triangle_count
    }

    fn check_consistency(&self) -> Result<(), FormatError> {
        let expected_vertices = self.vertex_count as usize * Vertex::SIZE;
        if self.vertices.len() != expected_vertices {
            return Err(FormatError::InternalConsistency(format!(
                "vertex payload is {} bytes, expected {} for {} vertices",
                self.vertices.len(),
                expected_vertices,
                self.vertex_count
            )));
        }

        let expected_triangles = self.triangle_count as usize * Triangle::SIZE;
        if self.triangles.len() != expected_triangles {
            return Err(FormatError::InternalConsistency(format!(
                "triangle payload is {} bytes, expected {} for {} triangles",
                self.triangles.len(),
                expected_triangles,
                self.triangle_count
            )));
        }

        let last = self.index.last().copied().unwrap_or_default();
        if last.vertex_end != self.vertex_count
            || last.tri_end != self.triangle_count
            || last.name_end as usize != self.strings.len()
        {
            return Err(FormatError::InternalConsistency(format!(
                "last index entry {:?} does not end at the buffer totals",
                last
            )));
        }
        Ok(())
    }

    /// Frame the four chunks into one container.
    pub fn finish(self) -> Result<Vec<u8>, FormatError> {
        self.check_consistency()?;

        let index: Vec<u8> = self.index.iter().flat_map(IndexEntry::to_bytes).collect();

        let mut out = Vec::with_capacity(
            4 * ChunkHeader::SIZE
                + self.vertices.len()
                + self.triangles.len()
                + self.strings.len()
                + index.len(),
        );
        write_chunk(&mut out, ChunkTag::Vertices, &self.vertices)?;
        write_chunk(&mut out, ChunkTag::Triangles, &self.triangles)?;
        write_chunk(&mut out, ChunkTag::Strings, &self.strings)?;
        write_chunk(&mut out, ChunkTag::Index, &index)?;

        debug!(
            "Framed container: {} meshes, {} vertices, {} triangles, {} bytes",
            self.index.len(),
            self.vertex_count,
            self.triangle_count,
            out.len()
        );
        Ok(out)
    }

    /// Finish and write the container, returning the number of bytes written.
    pub fn write_to<W: Write>(self, mut writer: W) -> Result<usize, FormatError> {
        let bytes = self.finish()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(bytes.len())
    }
}

fn fits_u32(n: usize) -> bool {
    u32::try_from(n).is_ok()
}

/// Encode records, in order, into a container.
pub fn encode(records: &[MeshRecord]) -> Result<Vec<u8>, FormatError> {
    let mut encoder = Encoder::new();
    for record in records {
        encoder.push(record)?;
    }
    encoder.finish()
}

/// Encode records and write the container to `writer`.
///
/// Nothing is written if any record is rejected.
pub fn encode_to_writer<W: Write>(records: &[MeshRecord], writer: W) -> Result<usize, FormatError> {
    let mut encoder = Encoder::new();
    for record in records {
        encoder.push(record)?;
    }
    encoder.write_to(writer)
}
