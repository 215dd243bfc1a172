use crate::binreader::BinReader;
use crate::error::Result;
use crate::feature_level::FeatureLevel;
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::{Read, Seek};

const STORED_COMPRESSED: u8 = 0x01;
const STORED_ENCRYPTED: u8 = 0x02;

/// Storage bitmask of a manifest body. Unknown bits are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StorageFlags {
    pub compressed: bool,
    pub encrypted: bool,
}

impl StorageFlags {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            compressed: bits & STORED_COMPRESSED != 0,
            encrypted: bits & STORED_ENCRYPTED != 0,
        }
    }

    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.compressed {
            bits |= STORED_COMPRESSED;
        }
        if self.encrypted {
            bits |= STORED_ENCRYPTED;
        }
        bits
    }
}

impl fmt::Display for StorageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.compressed {
            names.push("Compressed");
        }
        if self.encrypted {
            names.push("Encrypted");
        }
        if names.is_empty() {
            f.write_str("Plain")
        } else {
            f.write_str(&names.join(" "))
        }
    }
}

/// Outer envelope following the manifest magic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ManifestHeader {
    pub header_size: i32,
    pub data_size_uncompressed: i32,
    pub data_size_compressed: i32,
    #[serde(serialize_with = "serialize_sha")]
    pub sha_hash: [u8; 20],
    pub stored_as: StorageFlags,
    pub version: FeatureLevel,
}

impl ManifestHeader {
    /// Read the header fields. The cursor must sit just past the magic.
    pub fn read<R: Read + Seek>(r: &mut BinReader<R>) -> Result<Self> {
        let header_size = r.read_i32()?;
        let data_size_uncompressed = r.read_i32()?;
        let data_size_compressed = r.read_i32()?;
        let sha_hash = r.read_sha()?;
        let stored_as = StorageFlags::from_bits(r.read_u8()?);
        let version = FeatureLevel(r.read_i32()?);
        Ok(Self {
            header_size,
            data_size_uncompressed,
            data_size_compressed,
            sha_hash,
            stored_as,
            version,
        })
    }
}

impl fmt::Display for ManifestHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Header Size: {} bytes", self.header_size)?;
        writeln!(f, "Compressed Data Size: {} bytes", self.data_size_compressed)?;
        writeln!(f, "Uncompressed Data Size: {} bytes", self.data_size_uncompressed)?;
        writeln!(f, "SHA hash: {}", hex::encode(self.sha_hash))?;
        writeln!(f, "Stored As: {}", self.stored_as)?;
        write!(f, "Version: {}", self.version)
    }
}

pub(crate) fn serialize_sha<S: Serializer>(sha: &[u8; 20], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(sha))
}
