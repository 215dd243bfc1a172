use crate::binreader::BinReader;
use crate::chunk_list::{Chunk, ChunkDataList};
use crate::custom_fields::CustomFields;
use crate::error::{DecodeError, Result, SectionContext};
use crate::file_list::{ChunkPart, FileManifestList};
use crate::header::ManifestHeader;
use crate::meta::ManifestMeta;
use flate2::read::ZlibDecoder;
use serde::Serialize;
use std::io::{Cursor, Read, Seek, SeekFrom};

pub const BINARY_MANIFEST_MAGIC: u32 = 0x44BE_C00C;

/// Upper bounds applied while decoding untrusted input.
#[derive(Clone, Copy, Debug)]
pub struct DecodeLimits {
    /// Largest inflated manifest body or chunk payload accepted.
    pub max_uncompressed_bytes: usize,
    /// Largest record count accepted for any one section or part list.
    pub max_entries: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self { max_uncompressed_bytes: 512 * 1024 * 1024, max_entries: 10_000_000 }
    }
}

impl DecodeLimits {
    pub fn unlimited() -> Self {
        Self { max_uncompressed_bytes: usize::MAX, max_entries: usize::MAX }
    }

    pub(crate) fn check_entries(&self, what: &'static str, count: u32) -> Result<()> {
        if count as u64 > self.max_entries as u64 {
            return Err(DecodeError::LimitExceeded {
                what,
                declared: u64::from(count),
                limit: self.max_entries as u64,
            });
        }
        Ok(())
    }

    pub(crate) fn check_bytes(&self, what: &'static str, declared: u64) -> Result<()> {
        if declared > self.max_uncompressed_bytes as u64 {
            return Err(DecodeError::LimitExceeded {
                what,
                declared,
                limit: self.max_uncompressed_bytes as u64,
            });
        }
        Ok(())
    }

    /// Inflate a zlib stream fully into memory, refusing to grow past
    /// `max_uncompressed_bytes`.
    pub(crate) fn inflate<R: Read>(&self, src: R, what: &'static str) -> Result<Vec<u8>> {
        let cap = (self.max_uncompressed_bytes as u64).saturating_add(1);
        let mut out = Vec::new();
        ZlibDecoder::new(src)
            .take(cap)
            .read_to_end(&mut out)
            .map_err(|source| DecodeError::Inflate { what, source })?;
        self.check_bytes(what, out.len() as u64)?;
        Ok(out)
    }
}

/// A fully decoded binary manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BinaryManifest {
    pub header: ManifestHeader,
    pub meta: ManifestMeta,
    pub chunk_data_list: ChunkDataList,
    pub file_manifest_list: FileManifestList,
    pub custom_fields: CustomFields,
}

impl BinaryManifest {
    /// The chunk a part was resolved to.
    pub fn chunk(&self, part: &ChunkPart) -> Option<&Chunk> {
        self.chunk_data_list.chunks.get(part.chunk_index)
    }

    /// Chunk directory below a cloud directory, picked by the manifest's feature level.
    pub fn chunks_dir(&self, cloud_dir: &str) -> String {
        format!(
            "{}/{}",
            cloud_dir.trim_end_matches('/'),
            self.meta.feature_level.chunk_sub_dir()
        )
    }

    /// Download URL of every chunk below `cloud_dir`, in directory order.
    pub fn chunk_urls(&self, cloud_dir: &str) -> Vec<String> {
        let dir = self.chunks_dir(cloud_dir);
        self.chunk_data_list.chunks.iter().map(|c| c.url(&dir)).collect()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Decode a binary manifest with [`DecodeLimits::default`].
pub fn parse_manifest<R: Read + Seek>(reader: R) -> Result<BinaryManifest> {
    parse_manifest_with_limits(reader, &DecodeLimits::default())
}

/// Decode a binary manifest: magic, header, optional zlib body, then the
/// metadata, chunk directory, file list and custom field sections.
pub fn parse_manifest_with_limits<R: Read + Seek>(
    reader: R,
    limits: &DecodeLimits,
) -> Result<BinaryManifest> {
    let mut r = BinReader::le(reader);
    let magic = r.read_u32()?;
    if magic != BINARY_MANIFEST_MAGIC {
        return Err(DecodeError::BadMagic { expected: BINARY_MANIFEST_MAGIC, found: magic });
    }
    let header = ManifestHeader::read(&mut r).section("header")?;
    tracing::debug!(
        header_size = header.header_size,
        stored_as = %header.stored_as,
        version = %header.version,
        "read manifest header"
    );
    let header_size = u64::try_from(header.header_size)
        .map_err(|_| DecodeError::NegativeLength(i64::from(header.header_size)))?;
    r.seek(SeekFrom::Start(header_size))?;

    // Checked before inflating so encrypted bodies never reach the zlib decoder.
    if header.stored_as.encrypted {
        return Err(DecodeError::Encrypted("manifest file"));
    }

    let sections = if header.stored_as.compressed {
        let expected = i64::from(header.data_size_uncompressed);
        if expected > 0 {
            limits.check_bytes("manifest uncompressed size", expected as u64)?;
        }
        let data = limits.inflate(r.get_mut(), "manifest body")?;
        if data.len() as i64 != expected {
            return Err(DecodeError::SizeMismatch { expected, actual: data.len() });
        }
        tracing::debug!(
            compressed = header.data_size_compressed,
            uncompressed = data.len(),
            "inflated manifest body"
        );
        read_sections(&mut BinReader::le(Cursor::new(data)), limits)?
    } else {
        read_sections(&mut r, limits)?
    };

    let (meta, chunk_data_list, file_manifest_list, custom_fields) = sections;
    Ok(BinaryManifest { header, meta, chunk_data_list, file_manifest_list, custom_fields })
}

type Sections = (ManifestMeta, ChunkDataList, FileManifestList, CustomFields);

fn read_sections<R: Read + Seek>(r: &mut BinReader<R>, limits: &DecodeLimits) -> Result<Sections> {
    let start = r.position()?;
    let meta = ManifestMeta::read(r).section("metadata")?;
    let start = skip_section(r, start, meta.data_size, "metadata")?;

    let chunks = ChunkDataList::read(r, limits).section("chunk data list")?;
    let start = skip_section(r, start, chunks.data_size, "chunk data list")?;

    let files = FileManifestList::read(r, &chunks, limits).section("file manifest list")?;
    skip_section(r, start, files.data_size, "file manifest list")?;

    let custom = CustomFields::read(r, limits).section("custom fields")?;
    Ok((meta, chunks, files, custom))
}

/// Move to the end of a section as declared by its own size field, whatever
/// the decoder actually consumed. Returns the new position.
fn skip_section<R: Read + Seek>(
    r: &mut BinReader<R>,
    start: u64,
    data_size: u32,
    section: &'static str,
) -> Result<u64> {
    let end = start + u64::from(data_size);
    let pos = r.position()?;
    if pos > end {
        tracing::warn!(section, declared_end = end, consumed_to = pos, "section overran its declared size");
    }
    r.seek(SeekFrom::Start(end))
}
