use crate::binreader::BinReader;
use crate::chunk_list::PREALLOC_CAP;
use crate::error::Result;
use crate::manifest::DecodeLimits;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{Read, Seek};

/// Free-form key/value strings attached to a manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CustomFields {
    pub data_size: u32,
    pub data_version: u8,
    pub count: u32,
    pub fields: BTreeMap<String, String>,
}

impl CustomFields {
    /// All keys are stored first, then all values in the same order.
    pub fn read<R: Read + Seek>(r: &mut BinReader<R>, limits: &DecodeLimits) -> Result<Self> {
        let data_size = r.read_u32()?;
        let data_version = r.read_u8()?;
        let count = r.read_u32()?;
        limits.check_entries("custom field count", count)?;

        let mut keys = Vec::with_capacity(count.min(PREALLOC_CAP) as usize);
        for _ in 0..count {
            keys.push(r.read_fstring()?);
        }
        let mut fields = BTreeMap::new();
        for key in keys {
            let value = r.read_fstring()?;
            fields.insert(key, value);
        }

        tracing::debug!(data_size, data_version, count, "read custom fields");
        Ok(Self { data_size, data_version, count, fields })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}
