pub mod assemble;
pub mod binreader;
pub mod chunk;
pub mod chunk_list;
pub mod custom_fields;
pub mod error;
pub mod feature_level;
pub mod file_list;
pub mod header;
pub mod manifest;
pub mod meta;

pub use error::{DecodeError, ErrorKind, Result};
pub use manifest::{parse_manifest, parse_manifest_with_limits, BinaryManifest, DecodeLimits};
