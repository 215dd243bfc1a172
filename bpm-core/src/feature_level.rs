use serde::Serialize;
use std::fmt;

/// Manifest format version. Ordered: later values imply newer fields or storage.
///
/// Stored as the raw `i32` so that values outside the known table (and the
/// historical 255) survive decoding untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FeatureLevel(pub i32);

macro_rules! levels {
    ($($(#[$doc:meta])* $name:ident = $value:literal,)*) => {
        impl FeatureLevel {
            $($(#[$doc])* pub const $name: FeatureLevel = FeatureLevel($value);)*

            fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

levels! {
    /// First format version.
    ORIGINAL = 0,
    /// Support for custom fields.
    CUSTOM_FIELDS = 1,
    /// Started storing the version number.
    START_STORING_VERSION = 2,
    /// Data files renamed to include the hash value; chunks move to `ChunksV2`.
    DATA_FILE_RENAMES = 3,
    /// Whether the build was constructed with chunk or file data.
    STORES_IF_CHUNK_OR_FILE_DATA = 4,
    /// Group number stored for each chunk/file data.
    STORES_DATA_GROUP_NUMBERS = 5,
    /// Chunk compression support; chunks move to `ChunksV3`.
    CHUNK_COMPRESSION_SUPPORT = 6,
    STORES_PREREQUISITES_INFO = 7,
    STORES_CHUNK_FILE_SIZES = 8,
    STORED_AS_COMPRESSED_UCLASS = 9,
    UNUSED_0 = 10,
    UNUSED_1 = 11,
    STORES_CHUNK_DATA_SHA_HASHES = 12,
    STORES_PREREQUISITE_IDS = 13,
    /// First minimal binary format.
    STORED_AS_BINARY_DATA = 14,
    /// Dynamic window size chunks without serialized window info; chunks move to `ChunksV4`.
    VARIABLE_SIZE_CHUNKS_WITHOUT_WINDOW_SIZE_CHUNK_INFO = 15,
    VARIABLE_SIZE_CHUNKS = 16,
    STORES_UNIQUE_BUILD_ID = 17,
}

impl FeatureLevel {
    pub const LATEST: FeatureLevel = FeatureLevel::STORES_UNIQUE_BUILD_ID;
    pub const LATEST_NO_CHUNKS: FeatureLevel = FeatureLevel::STORES_CHUNK_FILE_SIZES;
    pub const LATEST_JSON: FeatureLevel = FeatureLevel::STORES_PREREQUISITE_IDS;
    pub const FIRST_OPTIMISED_DELTA: FeatureLevel = FeatureLevel::STORES_UNIQUE_BUILD_ID;
    /// JSON manifests written during a buggy range carry 255; read it as
    /// [`STORES_CHUNK_FILE_SIZES`](Self::STORES_CHUNK_FILE_SIZES).
    pub const BROKEN_JSON_VERSION: FeatureLevel = FeatureLevel(255);
    pub const INVALID: FeatureLevel = FeatureLevel(-1);

    /// The level used for every feature gate: 255 is folded onto
    /// `STORES_CHUNK_FILE_SIZES`, everything else passes through.
    pub fn effective(self) -> FeatureLevel {
        if self == Self::BROKEN_JSON_VERSION {
            Self::STORES_CHUNK_FILE_SIZES
        } else {
            self
        }
    }

    pub fn at_least(self, other: FeatureLevel) -> bool {
        self.effective() >= other
    }

    /// Chunk storage subdirectory for manifests of this level.
    pub fn chunk_sub_dir(self) -> &'static str {
        let level = self.effective();
        if level < Self::DATA_FILE_RENAMES {
            "Chunks"
        } else if level < Self::CHUNK_COMPRESSION_SUPPORT {
            "ChunksV2"
        } else if level < Self::VARIABLE_SIZE_CHUNKS_WITHOUT_WINDOW_SIZE_CHUNK_INFO {
            "ChunksV3"
        } else {
            "ChunksV4"
        }
    }

    pub fn is_known(self) -> bool {
        self.name().is_some()
    }
}

impl From<i32> for FeatureLevel {
    fn from(v: i32) -> Self {
        FeatureLevel(v)
    }
}

impl fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None if *self == Self::BROKEN_JSON_VERSION => f.write_str("BROKEN_JSON_VERSION"),
            None => write!(f, "Unknown({})", self.0),
        }
    }
}
