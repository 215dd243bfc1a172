use crate::binreader::BinReader;
use crate::error::Result;
use crate::feature_level::FeatureLevel;
use serde::Serialize;
use std::fmt;
use std::io::{Read, Seek};

/// Data version from which the metadata section carries a build id.
const BUILD_ID_DATA_VERSION: u8 = 1;

/// Application identity and launch information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ManifestMeta {
    pub data_size: u32,
    pub data_version: u8,
    pub feature_level: FeatureLevel,
    pub is_file_data: bool,
    pub app_id: i32,
    pub app_name: String,
    pub build_version: String,
    pub launch_exe: String,
    pub launch_command: String,
    pub prereq_ids: Vec<String>,
    pub prereq_name: String,
    pub prereq_path: String,
    pub prereq_args: String,
    /// `None` when the section predates build ids (data version 0).
    pub build_id: Option<String>,
}

impl ManifestMeta {
    pub fn read<R: Read + Seek>(r: &mut BinReader<R>) -> Result<Self> {
        let data_size = r.read_u32()?;
        let data_version = r.read_u8()?;
        let feature_level = FeatureLevel(r.read_i32()?);
        let is_file_data = r.read_bool()?;
        let app_id = r.read_i32()?;
        let app_name = r.read_fstring()?;
        let build_version = r.read_fstring()?;
        let launch_exe = r.read_fstring()?;
        let launch_command = r.read_fstring()?;
        let prereq_ids = r.read_fstring_array()?;
        let prereq_name = r.read_fstring()?;
        let prereq_path = r.read_fstring()?;
        let prereq_args = r.read_fstring()?;
        let build_id = if data_version >= BUILD_ID_DATA_VERSION {
            Some(r.read_fstring()?)
        } else {
            None
        };
        tracing::debug!(
            data_size,
            data_version,
            %feature_level,
            app_name = %app_name,
            "read manifest metadata"
        );
        Ok(Self {
            data_size,
            data_version,
            feature_level,
            is_file_data,
            app_id,
            app_name,
            build_version,
            launch_exe,
            launch_command,
            prereq_ids,
            prereq_name,
            prereq_path,
            prereq_args,
            build_id,
        })
    }
}

impl fmt::Display for ManifestMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data size in file: {} bytes", self.data_size)?;
        writeln!(f, "Data version: {}", self.data_version)?;
        writeln!(f, "Feature Level: {}", self.feature_level)?;
        writeln!(f, "Is file data: {}", self.is_file_data)?;
        writeln!(f, "App ID: {}", self.app_id)?;
        writeln!(f, "App Name: {}", self.app_name)?;
        writeln!(f, "Build Version: {}", self.build_version)?;
        writeln!(f, "Launch Exe: {}", self.launch_exe)?;
        writeln!(f, "Launch Command: {}", self.launch_command)?;
        writeln!(f, "Prerequisite IDs: {:?}", self.prereq_ids)?;
        writeln!(f, "Prerequisite Name: {}", self.prereq_name)?;
        writeln!(f, "Prerequisite Path: {}", self.prereq_path)?;
        write!(f, "Prerequisite Args: {}", self.prereq_args)?;
        if let Some(build_id) = &self.build_id {
            write!(f, "\nBuild ID: {}", build_id)?;
        }
        Ok(())
    }
}
