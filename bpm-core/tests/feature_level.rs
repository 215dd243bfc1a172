use bpm_core::feature_level::FeatureLevel;

#[test]
fn chunk_sub_dir_boundaries() {
    assert_eq!(FeatureLevel::ORIGINAL.chunk_sub_dir(), "Chunks");
    assert_eq!(FeatureLevel(2).chunk_sub_dir(), "Chunks");
    assert_eq!(FeatureLevel::DATA_FILE_RENAMES.chunk_sub_dir(), "ChunksV2");
    assert_eq!(FeatureLevel(5).chunk_sub_dir(), "ChunksV2");
    assert_eq!(FeatureLevel::CHUNK_COMPRESSION_SUPPORT.chunk_sub_dir(), "ChunksV3");
    assert_eq!(FeatureLevel(14).chunk_sub_dir(), "ChunksV3");
    assert_eq!(
        FeatureLevel::VARIABLE_SIZE_CHUNKS_WITHOUT_WINDOW_SIZE_CHUNK_INFO.chunk_sub_dir(),
        "ChunksV4"
    );
    assert_eq!(FeatureLevel::LATEST.chunk_sub_dir(), "ChunksV4");
}

#[test]
fn broken_json_version_acts_as_stores_chunk_file_sizes() {
    let broken = FeatureLevel(255);
    assert_eq!(broken, FeatureLevel::BROKEN_JSON_VERSION);
    assert_eq!(broken.effective(), FeatureLevel::STORES_CHUNK_FILE_SIZES);
    assert_eq!(broken.chunk_sub_dir(), FeatureLevel::STORES_CHUNK_FILE_SIZES.chunk_sub_dir());
    assert_eq!(broken.chunk_sub_dir(), "ChunksV3");
    assert!(broken.at_least(FeatureLevel::STORES_CHUNK_FILE_SIZES));
    assert!(!broken.at_least(FeatureLevel::STORED_AS_COMPRESSED_UCLASS));
}

#[test]
fn ordering_is_numeric() {
    assert!(FeatureLevel::ORIGINAL < FeatureLevel::CUSTOM_FIELDS);
    assert!(FeatureLevel::STORES_UNIQUE_BUILD_ID > FeatureLevel::VARIABLE_SIZE_CHUNKS);
    assert!(FeatureLevel::INVALID < FeatureLevel::ORIGINAL);
    assert_eq!(FeatureLevel::LATEST_JSON, FeatureLevel(13));
    assert_eq!(FeatureLevel::LATEST_NO_CHUNKS, FeatureLevel(8));
    assert_eq!(FeatureLevel::FIRST_OPTIMISED_DELTA, FeatureLevel::LATEST);
}

#[test]
fn display_names() {
    assert_eq!(FeatureLevel(17).to_string(), "STORES_UNIQUE_BUILD_ID");
    assert_eq!(FeatureLevel(0).to_string(), "ORIGINAL");
    assert_eq!(FeatureLevel(255).to_string(), "BROKEN_JSON_VERSION");
    assert_eq!(FeatureLevel(99).to_string(), "Unknown(99)");
    assert!(FeatureLevel(16).is_known());
    assert!(!FeatureLevel(99).is_known());
}
