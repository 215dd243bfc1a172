use crate::binreader::{BinReader, Guid};
use crate::chunk_list::{ChunkDataList, PREALLOC_CAP};
use crate::error::{DecodeError, Result};
use crate::header::serialize_sha;
use crate::manifest::DecodeLimits;
use serde::Serialize;
use std::io::{Read, Seek};

/// A byte range inside one chunk's decompressed payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChunkPart {
    /// Serialized size of this part record.
    pub data_size: u32,
    pub parent_guid: Guid,
    pub offset: u32,
    pub size: u32,
    /// Index into [`ChunkDataList::chunks`], resolved from `parent_guid`.
    pub chunk_index: usize,
}

/// One file of the build. Its content is the concatenation of `chunk_parts`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct File {
    pub filename: String,
    /// Empty when the file is not a symlink.
    pub symlink_target: String,
    #[serde(serialize_with = "serialize_sha")]
    pub sha_hash: [u8; 20],
    pub meta_flags: u8,
    pub install_tags: Vec<String>,
    pub chunk_parts: Vec<ChunkPart>,
}

impl File {
    pub fn is_symlink(&self) -> bool {
        !self.symlink_target.is_empty()
    }

    /// File size as the sum of its parts.
    pub fn size(&self) -> u64 {
        self.chunk_parts.iter().map(|p| u64::from(p.size)).sum()
    }
}

/// The file manifest section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileManifestList {
    pub data_size: u32,
    pub data_version: u8,
    pub count: u32,
    pub files: Vec<File>,
}

impl FileManifestList {
    /// Read the section, resolving every chunk part against `chunks`.
    ///
    /// Columns in stream order: names, symlink targets, SHA hashes, meta
    /// flags, install tags, then each file's part list.
    pub fn read<R: Read + Seek>(
        r: &mut BinReader<R>,
        chunks: &ChunkDataList,
        limits: &DecodeLimits,
    ) -> Result<Self> {
        let data_size = r.read_u32()?;
        let data_version = r.read_u8()?;
        let count = r.read_u32()?;
        limits.check_entries("file count", count)?;

        let mut files = Vec::with_capacity(count.min(PREALLOC_CAP) as usize);
        for _ in 0..count {
            files.push(File { filename: r.read_fstring()?, ..File::default() });
        }
        for file in files.iter_mut() {
            file.symlink_target = r.read_fstring()?;
        }
        for file in files.iter_mut() {
            file.sha_hash = r.read_sha()?;
        }
        for file in files.iter_mut() {
            file.meta_flags = r.read_u8()?;
        }
        for file in files.iter_mut() {
            file.install_tags = r.read_fstring_array()?;
        }

        let mut total_parts = 0u64;
        for (file_idx, file) in files.iter_mut().enumerate() {
            let part_count = r.read_u32()?;
            limits.check_entries("chunk part count", part_count)?;
            let mut parts = Vec::with_capacity(part_count.min(PREALLOC_CAP) as usize);
            for part_idx in 0..part_count as usize {
                let data_size = r.read_u32()?;
                let parent_guid = r.read_guid()?;
                let chunk_index = chunks.index_of(&parent_guid).ok_or(
                    DecodeError::UnresolvedChunk { file: file_idx, part: part_idx, guid: parent_guid },
                )?;
                let offset = r.read_u32()?;
                let size = r.read_u32()?;
                parts.push(ChunkPart { data_size, parent_guid, offset, size, chunk_index });
            }
            total_parts += u64::from(part_count);
            file.chunk_parts = parts;
        }

        tracing::debug!(data_size, data_version, count, total_parts, "read file manifest list");
        Ok(Self { data_size, data_version, count, files })
    }

    pub fn find(&self, filename: &str) -> Option<&File> {
        self.files.iter().find(|f| f.filename == filename)
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(File::size).sum()
    }
}
