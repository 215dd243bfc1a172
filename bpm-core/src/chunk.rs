use crate::binreader::{BinReader, Guid};
use crate::error::{DecodeError, Result, SectionContext};
use crate::header::serialize_sha;
use crate::manifest::DecodeLimits;
use serde::Serialize;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

pub const CHUNK_HEADER_MAGIC: u32 = 0xB1FE_3AA2;
/// The only chunk header version this crate decodes.
pub const CHUNK_VERSION: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ChunkStoredAs {
    Plaintext,
    Compressed,
    Encrypted,
}

impl TryFrom<u8> for ChunkStoredAs {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0x00 => Ok(ChunkStoredAs::Plaintext),
            0x01 => Ok(ChunkStoredAs::Compressed),
            0x02 => Ok(ChunkStoredAs::Encrypted),
            other => Err(DecodeError::UnknownStorageMode(other)),
        }
    }
}

/// Fixed header at the start of every chunk file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChunkHeader {
    pub magic: u32,
    pub version: u32,
    pub header_size: u32,
    pub data_size_compressed: u32,
    pub guid: Guid,
    pub hash: u64,
    /// Raw storage byte; see [`ChunkHeader::storage`].
    pub stored_as: u8,
    #[serde(serialize_with = "serialize_sha")]
    pub sha_hash: [u8; 20],
    pub hash_type: u32,
}

impl ChunkHeader {
    pub fn storage(&self) -> Result<ChunkStoredAs> {
        ChunkStoredAs::try_from(self.stored_as)
    }
}

/// Read and validate the magic of a chunk header. The version is not checked here.
pub fn parse_chunk_header<R: Read + Seek>(reader: R) -> Result<ChunkHeader> {
    let mut r = BinReader::le(reader);
    let magic = r.read_u32()?;
    if magic != CHUNK_HEADER_MAGIC {
        return Err(DecodeError::BadMagic { expected: CHUNK_HEADER_MAGIC, found: magic });
    }
    Ok(ChunkHeader {
        magic,
        version: r.read_u32()?,
        header_size: r.read_u32()?,
        data_size_compressed: r.read_u32()?,
        guid: r.read_guid()?,
        hash: r.read_u64()?,
        stored_as: r.read_u8()?,
        sha_hash: r.read_sha()?,
        hash_type: r.read_u32()?,
    })
}

/// Decoded chunk payload. Positions are relative to the start of the payload
/// for both variants.
#[derive(Debug)]
pub enum ChunkPayload<R> {
    /// Stored uncompressed; reads go straight to the source stream.
    Plain { inner: R, base: u64 },
    /// Stored compressed; inflated into memory.
    Inflated(Cursor<Vec<u8>>),
}

impl<R: Read + Seek> ChunkPayload<R> {
    /// Read the rest of the payload from the current position.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.read_to_end(&mut out)?;
        Ok(out)
    }

    pub fn is_inflated(&self) -> bool {
        matches!(self, ChunkPayload::Inflated(_))
    }
}

impl<R: Read> Read for ChunkPayload<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ChunkPayload::Plain { inner, .. } => inner.read(buf),
            ChunkPayload::Inflated(c) => c.read(buf),
        }
    }
}

impl<R: Seek> Seek for ChunkPayload<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            ChunkPayload::Plain { inner, base } => {
                let pos = match pos {
                    SeekFrom::Start(n) => SeekFrom::Start(base.checked_add(n).ok_or_else(|| {
                        io::Error::new(io::ErrorKind::InvalidInput, "seek past end of addressable range")
                    })?),
                    other => other,
                };
                let abs = inner.seek(pos)?;
                abs.checked_sub(*base).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek before start of chunk payload")
                })
            }
            ChunkPayload::Inflated(c) => c.seek(pos),
        }
    }
}

/// Decode a chunk file with [`DecodeLimits::default`].
pub fn parse_chunk<R: Read + Seek>(reader: R) -> Result<ChunkPayload<R>> {
    parse_chunk_with_limits(reader, &DecodeLimits::default())
}

/// Validate the chunk header, move to its payload and return it as plaintext
/// or inflated bytes. Encrypted chunks are rejected.
pub fn parse_chunk_with_limits<R: Read + Seek>(
    mut reader: R,
    limits: &DecodeLimits,
) -> Result<ChunkPayload<R>> {
    let header = parse_chunk_header(&mut reader).section("chunk header")?;
    if header.version != CHUNK_VERSION {
        return Err(DecodeError::UnsupportedChunkVersion(header.version));
    }
    let base = u64::from(header.header_size);
    reader.seek(SeekFrom::Start(base))?;

    match header.storage()? {
        ChunkStoredAs::Plaintext => {
            tracing::debug!(guid = %header.guid, "chunk stored as plaintext");
            Ok(ChunkPayload::Plain { inner: reader, base })
        }
        ChunkStoredAs::Compressed => {
            let data = limits.inflate(&mut reader, "chunk payload")?;
            tracing::debug!(
                guid = %header.guid,
                compressed = header.data_size_compressed,
                uncompressed = data.len(),
                "inflated chunk payload"
            );
            Ok(ChunkPayload::Inflated(Cursor::new(data)))
        }
        ChunkStoredAs::Encrypted => Err(DecodeError::Encrypted("chunk")),
    }
}
