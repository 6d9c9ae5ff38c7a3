use std::io::Read;

use tracing::debug;
use walkmesh_core::{MeshRecord, Triangle, Vertex};

use crate::chunk::{ChunkReader, ChunkTag};
use crate::error::FormatError;
use crate::index::{parse_index, IndexEntry};

/// How decoded triangle indices are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriangleIndexing {
    /// Rebased to the mesh's own vertex list (the shape the encoder accepts)
    #[default]
    Local,
    /// As stored, addressing the container-wide vertex array
    Global,
}

/// Zero-copy view over a parsed container.
///
/// Parsing validates the chunk framing, every index entry's ranges and the
/// mesh names. Vertex and triangle payloads are only read when a record is
/// materialized, so looking up one mesh does not touch the others.
#[derive(Debug, Clone)]
pub struct Container<'a> {
    vertices: &'a [u8],
    triangles: &'a [u8],
    strings: &'a [u8],
    index: Vec<IndexEntry>,
    trailing: usize,
}

impl<'a> Container<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FormatError> {
        let mut reader = ChunkReader::new(bytes);
        let vertices = reader.expect(ChunkTag::Vertices)?;
        let triangles = reader.expect(ChunkTag::Triangles)?;
        let strings = reader.expect(ChunkTag::Strings)?;
        let index_payload = reader.expect(ChunkTag::Index)?;

        check_alignment(ChunkTag::Vertices, vertices, Vertex::SIZE)?;
        check_alignment(ChunkTag::Triangles, triangles, Triangle::SIZE)?;
        let index = parse_index(index_payload)?;

        let vertex_total = vertices.len() / Vertex::SIZE;
        let triangle_total = triangles.len() / Triangle::SIZE;
        for (i, entry) in index.iter().enumerate() {
            entry.validate(i, strings.len(), vertex_total, triangle_total)?;
            std::str::from_utf8(&strings[entry.name_range()])
                .map_err(|source| FormatError::InvalidName { entry: i, source })?;
        }

        let trailing = reader.remaining();
        if trailing > 0 {
            debug!("{} trailing bytes after '{}' chunk", trailing, ChunkTag::Index);
        }

        Ok(Self {
            vertices,
            triangles,
            strings,
            index,
            trailing,
        })
    }

    /// Number of meshes in the index
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.index
    }

    pub fn entry(&self, i: usize) -> Option<&IndexEntry> {
        self.index.get(i)
    }

    /// Name of the `i`-th mesh
    pub fn name(&self, i: usize) -> Option<&'a str> {
        let entry = self.index.get(i)?;
        let strings: &'a [u8] = self.strings;
        std::str::from_utf8(&strings[entry.name_range()]).ok()
    }

    /// Mesh names in index order
    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        (0..self.index.len()).filter_map(move |i| self.name(i))
    }

    /// Position of the first mesh called `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names().position(|n| n == name)
    }

    /// Total vertices across all meshes
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / Vertex::SIZE
    }

    /// Total triangles across all meshes
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / Triangle::SIZE
    }

    /// Payload length of a chunk in bytes
    pub fn payload_len(&self, tag: ChunkTag) -> usize {
        match tag {
            ChunkTag::Vertices => self.vertices.len(),
            ChunkTag::Triangles => self.triangles.len(),
            ChunkTag::Strings => self.strings.len(),
            ChunkTag::Index => self.index.len() * IndexEntry::SIZE,
        }
    }

    /// Bytes after the `idx0` chunk. The format defines none.
    pub fn trailing_len(&self) -> usize {
        self.trailing
    }

    /// The container-wide vertex array
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + 'a {
        let vertices: &'a [u8] = self.vertices;
        vertices.chunks_exact(Vertex::SIZE).map(read_vertex)
    }

    /// The container-wide triangle array, with global indices
    pub fn global_triangles(&self) -> impl Iterator<Item = Triangle> + 'a {
        let triangles: &'a [u8] = self.triangles;
        triangles.chunks_exact(Triangle::SIZE).map(read_triangle)
    }

    /// Materialize the `i`-th mesh with local triangle indices.
    pub fn record(&self, i: usize) -> Result<MeshRecord, FormatError> {
        self.record_with(i, TriangleIndexing::Local)
    }

    pub fn record_with(&self, i: usize, indexing: TriangleIndexing) -> Result<MeshRecord, FormatError> {
        let entry = self.index.get(i).ok_or_else(|| FormatError::IndexOutOfRange {
            entry: i,
            detail: format!("container has {} entries", self.index.len()),
        })?;

        let name = std::str::from_utf8(&self.strings[entry.name_range()])
            .map_err(|source| FormatError::InvalidName { entry: i, source })?;

        let vertex_bytes =
            &self.vertices[entry.vertex_begin as usize * Vertex::SIZE..entry.vertex_end as usize * Vertex::SIZE];
        let vertices: Vec<Vertex> = vertex_bytes.chunks_exact(Vertex::SIZE).map(read_vertex).collect();

        let triangle_bytes = &self.triangles
            [entry.tri_begin as usize * Triangle::SIZE..entry.tri_end as usize * Triangle::SIZE];
        let mut triangles = Vec::with_capacity(entry.triangle_count());
        for (t, bytes) in triangle_bytes.chunks_exact(Triangle::SIZE).enumerate() {
            let stored = read_triangle(bytes);
            let local = stored
                .rebase(entry.vertex_begin)
                .filter(|local| local.indices().iter().all(|&v| (v as usize) < vertices.len()))
                .ok_or_else(|| FormatError::IndexOutOfRange {
                    entry: i,
                    detail: format!(
                        "triangle {} {:?} leaves vertex range {}..{}",
                        entry.tri_begin as usize + t,
                        stored.indices(),
                        entry.vertex_begin,
                        entry.vertex_end
                    ),
                })?;
            triangles.push(match indexing {
                TriangleIndexing::Local => local,
                TriangleIndexing::Global => stored,
            });
        }

        debug!(
            "Decoded mesh '{}': {} vertices, {} triangles",
            name,
            vertices.len(),
            triangles.len()
        );
        Ok(MeshRecord::new(name, vertices, triangles))
    }

    /// Materialize every mesh, in index order, with local indices.
    pub fn records(&self) -> Result<Vec<MeshRecord>, FormatError> {
        self.records_with(TriangleIndexing::Local)
    }

    pub fn records_with(&self, indexing: TriangleIndexing) -> Result<Vec<MeshRecord>, FormatError> {
        (0..self.index.len()).map(|i| self.record_with(i, indexing)).collect()
    }

    /// Materialize the first mesh called `name`, with local indices.
    pub fn lookup(&self, name: &str) -> Result<MeshRecord, FormatError> {
        self.lookup_with(name, TriangleIndexing::Local)
    }

    pub fn lookup_with(&self, name: &str, indexing: TriangleIndexing) -> Result<MeshRecord, FormatError> {
        let i = self
            .position(name)
            .ok_or_else(|| FormatError::NotFound(name.to_string()))?;
        self.record_with(i, indexing)
    }
}

fn check_alignment(chunk: ChunkTag, payload: &[u8], element_size: usize) -> Result<(), FormatError> {
    if payload.len() % element_size != 0 {
        return Err(FormatError::MisalignedChunk {
            chunk,
            length: payload.len(),
            element_size,
        });
    }
    Ok(())
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_vertex(bytes: &[u8]) -> Vertex {
    let mut components = [0.0f32; 6];
    for (i, c) in components.iter_mut().enumerate() {
        *c = read_f32(bytes, i * 4);
    }
    Vertex::from_array(components)
}

fn read_triangle(bytes: &[u8]) -> Triangle {
    Triangle::new(read_u32(bytes, 0), read_u32(bytes, 4), read_u32(bytes, 8))
}

/// Decode every record of a container, with local triangle indices.
pub fn decode(bytes: &[u8]) -> Result<Vec<MeshRecord>, FormatError> {
    Container::parse(bytes)?.records()
}

/// Read a whole container from `reader` and decode it.
pub fn decode_from_reader<R: Read>(mut reader: R) -> Result<Vec<MeshRecord>, FormatError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode(&bytes)
}

/// Decode only the first mesh called `name`.
pub fn lookup(bytes: &[u8], name: &str) -> Result<MeshRecord, FormatError> {
    Container::parse(bytes)?.lookup(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{write_chunk, ChunkHeader};
    use crate::encoder::encode;

    fn triangle_record(name: &str, z: f32) -> MeshRecord {
        MeshRecord::new(
            name,
            vec![
                Vertex::from_array([0.0, 0.0, z, 0.0, 0.0, 1.0]),
                Vertex::from_array([1.0, 0.0, z, 0.0, 0.0, 1.0]),
                Vertex::from_array([0.0, 1.0, z, 0.0, 0.0, 1.0]),
            ],
            vec![Triangle::new(0, 1, 2)],
        )
    }

    fn level() -> Vec<MeshRecord> {
        let mut stairs = MeshRecord::new(
            "Stairs",
            vec![
                Vertex::from_array([0.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
                Vertex::from_array([2.0, 0.5, 0.0, 0.0, 1.0, 0.0]),
                Vertex::from_array([2.0, 0.5, 2.0, 0.0, 1.0, 0.0]),
                Vertex::from_array([0.0, 0.0, 2.0, 0.0, 1.0, 0.0]),
            ],
            vec![Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)],
        );
        stairs.name.push_str("-Ü");
        vec![
            triangle_record("Floor", 0.0),
            stairs,
            MeshRecord::new("Empty", Vec::new(), Vec::new()),
            triangle_record("Roof", 3.0),
        ]
    }

    /// Byte offset where each chunk's payload ends
    fn payload_ends(bytes: &[u8]) -> Vec<usize> {
        let mut ends = Vec::new();
        let mut offset = 0;
        for _ in 0..4 {
            let header = ChunkHeader::from_bytes(&bytes[offset..]).unwrap();
            offset += ChunkHeader::SIZE + header.length as usize;
            ends.push(offset);
        }
        ends
    }

    /// Build a container from raw payloads
    fn raw_container(vert: &[u8], tris: &[u8], strings: &[u8], index: &[IndexEntry]) -> Vec<u8> {
        let index: Vec<u8> = index.iter().flat_map(IndexEntry::to_bytes).collect();
        let mut bytes = Vec::new();
        write_chunk(&mut bytes, ChunkTag::Vertices, vert).unwrap();
        write_chunk(&mut bytes, ChunkTag::Triangles, tris).unwrap();
        write_chunk(&mut bytes, ChunkTag::Strings, strings).unwrap();
        write_chunk(&mut bytes, ChunkTag::Index, &index).unwrap();
        bytes
    }

    #[test]
    fn test_round_trip() {
        let records = level();
        let bytes = encode(&records).unwrap();
        assert_eq!(decode(&bytes).unwrap(), records);
    }

    #[test]
    fn test_reencode_is_byte_identical() {
        let bytes = encode(&level()).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(encode(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_floor_scenario() {
        let floor = triangle_record("Floor", 0.0);
        let bytes = encode(std::slice::from_ref(&floor)).unwrap();
        let container = Container::parse(&bytes).unwrap();

        assert_eq!(container.payload_len(ChunkTag::Vertices), 72);
        assert_eq!(container.payload_len(ChunkTag::Triangles), 12);
        assert_eq!(container.payload_len(ChunkTag::Strings), 5);
        assert_eq!(container.payload_len(ChunkTag::Index), 24);
        assert_eq!(
            container.entries(),
            &[IndexEntry {
                name_begin: 0,
                name_end: 5,
                vertex_begin: 0,
                tri_begin: 0,
                vertex_end: 3,
                tri_end: 1,
            }]
        );
        assert_eq!(container.record(0).unwrap(), floor);
    }

    #[test]
    fn test_global_and_local_indexing() {
        let records = [triangle_record("A", 0.0), triangle_record("B", 1.0)];
        let bytes = encode(&records).unwrap();
        let container = Container::parse(&bytes).unwrap();

        let raw: Vec<Triangle> = container.global_triangles().collect();
        assert_eq!(raw[1], Triangle::new(3, 4, 5));

        let global = container.record_with(1, TriangleIndexing::Global).unwrap();
        assert_eq!(global.triangles, vec![Triangle::new(3, 4, 5)]);

        let local = container.record(1).unwrap();
        assert_eq!(local.triangles, vec![Triangle::new(0, 1, 2)]);
    }

    #[test]
    fn test_empty_container() {
        let bytes = encode(&[]).unwrap();
        let container = Container::parse(&bytes).unwrap();
        assert!(container.is_empty());
        for tag in ChunkTag::ORDER {
            assert_eq!(container.payload_len(tag), 0);
        }
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_lookup_by_name() {
        let bytes = encode(&level()).unwrap();
        let roof = lookup(&bytes, "Roof").unwrap();
        assert_eq!(roof, triangle_record("Roof", 3.0));
        assert_eq!(lookup(&bytes, "Stairs-Ü").unwrap().triangle_count(), 2);

        match lookup(&bytes, "Ceiling") {
            Err(FormatError::NotFound(name)) => assert_eq!(name, "Ceiling"),
            other => panic!("expected NotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_lookup_first_duplicate_wins() {
        let bytes = encode(&[triangle_record("Same", 0.0), triangle_record("Same", 5.0)]).unwrap();
        let found = lookup(&bytes, "Same").unwrap();
        assert_eq!(found.vertices[0].position.z, 0.0);
    }

    #[test]
    fn test_truncated_payload_is_detected() {
        let bytes = encode(&[triangle_record("Floor", 0.0)]).unwrap();
        for end in payload_ends(&bytes) {
            let result = Container::parse(&bytes[..end - 1]);
            assert!(
                matches!(result, Err(FormatError::TruncatedStream { .. })),
                "cut at {}: {:?}",
                end - 1,
                result
            );
        }
    }

    #[test]
    fn test_missing_chunks_are_truncation() {
        let bytes = encode(&[triangle_record("Floor", 0.0)]).unwrap();
        let ends = payload_ends(&bytes);
        match Container::parse(&bytes[..ends[2]]) {
            Err(FormatError::TruncatedStream { chunk, .. }) => assert_eq!(chunk, ChunkTag::Index),
            other => panic!("expected TruncatedStream, got: {:?}", other),
        }
        assert!(matches!(
            Container::parse(&[]),
            Err(FormatError::TruncatedStream { chunk: ChunkTag::Vertices, .. })
        ));
    }

    #[test]
    fn test_flipped_tag_is_detected() {
        let bytes = encode(&[triangle_record("Floor", 0.0)]).unwrap();
        let starts: Vec<usize> = std::iter::once(0)
            .chain(payload_ends(&bytes).into_iter().take(3))
            .collect();

        for (tag, start) in ChunkTag::ORDER.into_iter().zip(starts) {
            let mut corrupt = bytes.clone();
            corrupt[start] ^= 0xFF;
            match Container::parse(&corrupt) {
                Err(FormatError::UnexpectedTag { expected, offset, .. }) => {
                    assert_eq!(expected, tag);
                    assert_eq!(offset, start);
                }
                other => panic!("expected UnexpectedTag for '{}', got: {:?}", tag, other),
            }
        }
    }

    #[test]
    fn test_reordered_chunks_are_rejected() {
        let mut bytes = Vec::new();
        write_chunk(&mut bytes, ChunkTag::Triangles, &[]).unwrap();
        write_chunk(&mut bytes, ChunkTag::Vertices, &[]).unwrap();
        write_chunk(&mut bytes, ChunkTag::Strings, &[]).unwrap();
        write_chunk(&mut bytes, ChunkTag::Index, &[]).unwrap();
        assert!(matches!(
            Container::parse(&bytes),
            Err(FormatError::UnexpectedTag { expected: ChunkTag::Vertices, .. })
        ));
    }

    #[test]
    fn test_corrupt_index_length() {
        let mut bytes = Vec::new();
        write_chunk(&mut bytes, ChunkTag::Vertices, &[]).unwrap();
        write_chunk(&mut bytes, ChunkTag::Triangles, &[]).unwrap();
        write_chunk(&mut bytes, ChunkTag::Strings, &[]).unwrap();
        write_chunk(&mut bytes, ChunkTag::Index, &[0; 23]).unwrap();
        assert!(matches!(
            Container::parse(&bytes),
            Err(FormatError::CorruptIndex { length: 23 })
        ));
    }

    #[test]
    fn test_misaligned_vertex_chunk() {
        let bytes = raw_container(&[0; 25], &[], &[], &[]);
        assert!(matches!(
            Container::parse(&bytes),
            Err(FormatError::MisalignedChunk { chunk: ChunkTag::Vertices, length: 25, .. })
        ));
    }

    #[test]
    fn test_entry_past_vertex_chunk() {
        let entry = IndexEntry {
            name_begin: 0,
            name_end: 1,
            vertex_begin: 0,
            tri_begin: 0,
            vertex_end: 2,
            tri_end: 0,
        };
        let bytes = raw_container(&[0; 24], &[], b"A", &[entry]);
        assert!(matches!(
            Container::parse(&bytes),
            Err(FormatError::IndexOutOfRange { entry: 0, .. })
        ));
    }

    #[test]
    fn test_cross_mesh_triangle_is_rejected() {
        let a = IndexEntry {
            name_begin: 0,
            name_end: 1,
            vertex_begin: 0,
            tri_begin: 0,
            vertex_end: 3,
            tri_end: 1,
        };
        let b = IndexEntry {
            name_begin: 1,
            name_end: 2,
            vertex_begin: 3,
            tri_begin: 1,
            vertex_end: 6,
            tri_end: 2,
        };
        let tris: Vec<u8> = [0u32, 1, 2, 3, 4, 2]
            .iter()
            .flat_map(|i| i.to_le_bytes())
            .collect();
        let bytes = raw_container(&[0; 6 * 24], &tris, b"AB", &[a, b]);

        let container = Container::parse(&bytes).unwrap();
        assert!(container.record(0).is_ok());
        assert!(matches!(
            container.record(1),
            Err(FormatError::IndexOutOfRange { entry: 1, .. })
        ));
        assert!(container.lookup("A").is_ok());
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_invalid_utf8_name() {
        let entry = IndexEntry {
            name_end: 2,
            ..IndexEntry::default()
        };
        let bytes = raw_container(&[], &[], &[0xC3, 0x28], &[entry]);
        assert!(matches!(
            Container::parse(&bytes),
            Err(FormatError::InvalidName { entry: 0, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut bytes = encode(&level()).unwrap();
        bytes.extend_from_slice(b"junk");
        let container = Container::parse(&bytes).unwrap();
        assert_eq!(container.trailing_len(), 4);
        assert_eq!(container.records().unwrap(), level());
    }

    #[test]
    fn test_decode_from_reader() {
        let bytes = encode(&level()).unwrap();
        let records = decode_from_reader(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[2].name, "Empty");
    }

    #[test]
    fn test_container_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Container<'static>>();

        let bytes = encode(&level()).unwrap();
        let container = Container::parse(&bytes).unwrap();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..container.len())
                .map(|i| {
                    let container = &container;
                    s.spawn(move || container.record(i).unwrap())
                })
                .collect();
            let records: Vec<MeshRecord> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(records, level());
        });
    }
}
