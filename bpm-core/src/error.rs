use crate::binreader::Guid;

/// Result alias used by every decoder in this crate.
pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

/// Coarse classification of a [`DecodeError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    UnsupportedFeature,
    IntegrityMismatch,
    UnresolvedReference,
    Truncated,
    Io,
}

/// Errors produced while decoding manifests and chunk files.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Seek or read failure from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a field could be read in full.
    #[error("unexpected end of stream while reading {wanted} bytes")]
    UnexpectedEof { wanted: usize },

    #[error("negative byte count: {0}")]
    NegativeLength(i64),

    /// A length-prefixed string did not end in a NUL byte.
    #[error("string of length {len} is not null terminated")]
    MalformedString { len: u32 },

    #[error("bad magic: expected 0x{expected:08X}, found 0x{found:08X}")]
    BadMagic { expected: u32, found: u32 },

    /// Inflating a manifest body or chunk payload failed, either on corrupt
    /// zlib data or on a read from the stream underneath.
    #[error("inflating {what}: {source}")]
    Inflate {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown storage mode {0}")]
    UnknownStorageMode(u8),

    #[error("unsupported chunk version {0}")]
    UnsupportedChunkVersion(u32),

    #[error("{0} is encrypted; encrypted payloads are not supported")]
    Encrypted(&'static str),

    /// Inflated data length disagrees with the declared size.
    #[error("decompressed data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: i64, actual: usize },

    #[error("in chunk part {part} for file {file}: parent GUID ({guid}) not found")]
    UnresolvedChunk { file: usize, part: usize, guid: Guid },

    #[error("{what} of {declared} exceeds limit {limit}")]
    LimitExceeded { what: &'static str, declared: u64, limit: u64 },

    #[error(
        "chunk part {part} for file {file} reads {offset}..{end} but chunk payload is {available} bytes"
    )]
    FragmentOutOfRange { file: usize, part: usize, offset: u32, end: u64, available: usize },

    #[error("no data available for chunk {0}")]
    MissingChunk(Guid),

    #[error("file index {0} is not in the manifest")]
    NoSuchFile(usize),

    /// Any of the above, raised while decoding a named section.
    #[error("decoding {section}: {source}")]
    Section {
        section: &'static str,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Io(_) => ErrorKind::Io,
            DecodeError::UnexpectedEof { .. } => ErrorKind::Truncated,
            DecodeError::NegativeLength(_)
            | DecodeError::MalformedString { .. }
            | DecodeError::BadMagic { .. }
            | DecodeError::UnknownStorageMode(_)
            | DecodeError::LimitExceeded { .. }
            | DecodeError::FragmentOutOfRange { .. } => ErrorKind::MalformedInput,
            DecodeError::UnsupportedChunkVersion(_) | DecodeError::Encrypted(_) => {
                ErrorKind::UnsupportedFeature
            }
            // The decoder reports bad zlib data as invalid data or input; anything
            // else came from the stream underneath it.
            DecodeError::Inflate { source, .. } => match source.kind() {
                std::io::ErrorKind::InvalidData | std::io::ErrorKind::InvalidInput => {
                    ErrorKind::MalformedInput
                }
                _ => ErrorKind::Io,
            },
            DecodeError::SizeMismatch { .. } => ErrorKind::IntegrityMismatch,
            DecodeError::UnresolvedChunk { .. }
            | DecodeError::MissingChunk(_)
            | DecodeError::NoSuchFile(_) => ErrorKind::UnresolvedReference,
            DecodeError::Section { source, .. } => source.kind(),
        }
    }

    /// Strip any section wrappers and return the innermost error.
    pub fn root(&self) -> &DecodeError {
        match self {
            DecodeError::Section { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Attach a section name to a decoder's error.
pub(crate) trait SectionContext<T> {
    fn section(self, section: &'static str) -> Result<T>;
}

impl<T> SectionContext<T> for Result<T> {
    fn section(self, section: &'static str) -> Result<T> {
        self.map_err(|e| DecodeError::Section { section, source: Box::new(e) })
    }
}
