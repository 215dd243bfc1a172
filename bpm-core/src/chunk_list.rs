use crate::binreader::{BinReader, Guid};
use crate::error::Result;
use crate::header::serialize_sha;
use crate::manifest::DecodeLimits;
use indexmap::IndexMap;
use serde::Serialize;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

/// Most records allocated ahead of reading them.
pub(crate) const PREALLOC_CAP: u32 = 1024;

/// One content-addressed chunk referenced by the manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub guid: Guid,
    /// Rolling hash, also used in the chunk file name.
    pub hash: u64,
    #[serde(serialize_with = "serialize_sha")]
    pub sha_hash: [u8; 20],
    pub group: u8,
    /// Nominal decompressed size of the chunk payload.
    pub window_size: u32,
    /// Size of the chunk file as downloaded.
    pub file_size: u64,
}

impl Chunk {
    /// File name of this chunk inside its group directory.
    pub fn file_name(&self) -> String {
        format!("{:016X}_{}.chunk", self.hash, hex::encode_upper(self.guid.as_bytes()))
    }

    /// Chunk location below a chunks directory URL, e.g.
    /// `https://host/Builds/App/CloudDir/ChunksV4`.
    pub fn url(&self, chunks_dir: &str) -> String {
        format!("{}/{:02}/{}", chunks_dir, self.group, self.file_name())
    }

    /// Same layout as [`Chunk::url`] for a local mirror.
    pub fn path_in(&self, chunks_dir: &Path) -> PathBuf {
        chunks_dir.join(format!("{:02}", self.group)).join(self.file_name())
    }
}

/// The chunk directory section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChunkDataList {
    pub data_size: u32,
    pub data_version: u8,
    pub count: u32,
    pub chunks: Vec<Chunk>,
    /// GUID to index into `chunks`, in first-seen order. A repeated GUID keeps
    /// its first position but points at the last record carrying it.
    #[serde(skip)]
    pub lookup: IndexMap<Guid, usize>,
}

impl ChunkDataList {
    /// Read the section. Records are stored column by column: every GUID,
    /// then every hash, then every SHA, group, window size and file size.
    pub fn read<R: Read + Seek>(r: &mut BinReader<R>, limits: &DecodeLimits) -> Result<Self> {
        let data_size = r.read_u32()?;
        let data_version = r.read_u8()?;
        let count = r.read_u32()?;
        limits.check_entries("chunk count", count)?;

        // Grown as GUIDs arrive; the declared count alone never sizes a buffer.
        let prealloc = count.min(PREALLOC_CAP) as usize;
        let mut chunks: Vec<Chunk> = Vec::with_capacity(prealloc);
        let mut lookup = IndexMap::with_capacity(prealloc);
        for idx in 0..count as usize {
            let guid = r.read_guid()?;
            if let Some(prev) = lookup.insert(guid, idx) {
                tracing::warn!(guid = %guid, first = prev, again = idx, "duplicate chunk GUID");
            }
            chunks.push(Chunk { guid, ..Chunk::default() });
        }
        for chunk in chunks.iter_mut() {
            chunk.hash = r.read_u64()?;
        }
        for chunk in chunks.iter_mut() {
            chunk.sha_hash = r.read_sha()?;
        }
        for chunk in chunks.iter_mut() {
            chunk.group = r.read_u8()?;
        }
        for chunk in chunks.iter_mut() {
            chunk.window_size = r.read_u32()?;
        }
        for chunk in chunks.iter_mut() {
            chunk.file_size = r.read_u64()?;
        }

        tracing::debug!(data_size, data_version, count, "read chunk data list");
        Ok(Self { data_size, data_version, count, chunks, lookup })
    }

    pub fn index_of(&self, guid: &Guid) -> Option<usize> {
        self.lookup.get(guid).copied()
    }

    pub fn get(&self, guid: &Guid) -> Option<&Chunk> {
        self.index_of(guid).map(|idx| &self.chunks[idx])
    }

    /// Sum of the download sizes of all chunks.
    pub fn total_file_size(&self) -> u64 {
        self.chunks.iter().map(|c| c.file_size).sum()
    }
}
