use crate::binreader::Guid;
use crate::chunk::parse_chunk_with_limits;
use crate::chunk_list::Chunk;
use crate::error::{DecodeError, Result};
use crate::manifest::{BinaryManifest, DecodeLimits};
use std::collections::HashMap;
use std::io::{self, Read, Seek, Write};

/// Supplies decoded chunk payloads for file reconstruction.
pub trait ChunkSource {
    fn chunk_data(&mut self, chunk: &Chunk) -> Result<Vec<u8>>;
}

/// Payloads already held in memory, keyed by chunk GUID.
#[derive(Default)]
pub struct MemoryChunkSource {
    chunks: HashMap<Guid, Vec<u8>>,
}

impl MemoryChunkSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, guid: Guid, payload: Vec<u8>) {
        self.chunks.insert(guid, payload);
    }
}

impl ChunkSource for MemoryChunkSource {
    fn chunk_data(&mut self, chunk: &Chunk) -> Result<Vec<u8>> {
        self.chunks.get(&chunk.guid).cloned().ok_or(DecodeError::MissingChunk(chunk.guid))
    }
}

/// Opens chunk files through a closure and decodes them.
///
/// ```no_run
/// # use bpm_core::assemble::ChunkReaderSource;
/// # use bpm_core::chunk_list::Chunk;
/// let dir = std::path::PathBuf::from("mirror/ChunksV4");
/// let source = ChunkReaderSource::new(move |c: &Chunk| std::fs::File::open(c.path_in(&dir)));
/// ```
pub struct ChunkReaderSource<F> {
    open: F,
    limits: DecodeLimits,
}

impl<F> ChunkReaderSource<F> {
    pub fn new(open: F) -> Self {
        Self { open, limits: DecodeLimits::default() }
    }

    pub fn with_limits(open: F, limits: DecodeLimits) -> Self {
        Self { open, limits }
    }
}

impl<F, R> ChunkSource for ChunkReaderSource<F>
where
    F: FnMut(&Chunk) -> io::Result<R>,
    R: Read + Seek,
{
    fn chunk_data(&mut self, chunk: &Chunk) -> Result<Vec<u8>> {
        let reader = (self.open)(chunk)?;
        Ok(parse_chunk_with_limits(reader, &self.limits)?.into_bytes()?)
    }
}

/// Write the content of file `file_idx` to `out` by concatenating its chunk
/// parts in order. Returns the number of bytes written.
pub fn write_file<S: ChunkSource, W: Write>(
    manifest: &BinaryManifest,
    file_idx: usize,
    source: &mut S,
    out: &mut W,
) -> Result<u64> {
    let file = manifest
        .file_manifest_list
        .files
        .get(file_idx)
        .ok_or(DecodeError::NoSuchFile(file_idx))?;

    let mut cached: Option<(usize, Vec<u8>)> = None;
    let mut written = 0u64;
    for (part_idx, part) in file.chunk_parts.iter().enumerate() {
        let chunk = manifest.chunk(part).ok_or(DecodeError::UnresolvedChunk {
            file: file_idx,
            part: part_idx,
            guid: part.parent_guid,
        })?;
        let data = match cached.take() {
            Some((idx, data)) if idx == part.chunk_index => data,
            _ => source.chunk_data(chunk)?,
        };

        let end = u64::from(part.offset) + u64::from(part.size);
        if end > data.len() as u64 {
            return Err(DecodeError::FragmentOutOfRange {
                file: file_idx,
                part: part_idx,
                offset: part.offset,
                end,
                available: data.len(),
            });
        }
        out.write_all(&data[part.offset as usize..end as usize])?;
        written += u64::from(part.size);
        cached = Some((part.chunk_index, data));
    }
    tracing::debug!(file = %file.filename, bytes = written, "assembled file");
    Ok(written)
}

/// [`write_file`] into a fresh buffer.
pub fn file_bytes<S: ChunkSource>(
    manifest: &BinaryManifest,
    file_idx: usize,
    source: &mut S,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_file(manifest, file_idx, source, &mut out)?;
    Ok(out)
}
