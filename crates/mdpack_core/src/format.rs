//! Format tags shared by the block assembler and the section writer/reader.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dictionary format version.
///
/// The version fixes the width of every integer in the record section
/// header and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FormatVersion {
    /// Version 1.2: 4-byte fields.
    #[serde(rename = "1.2")]
    V1_2,
    /// Version 2.0: 8-byte fields.
    #[default]
    #[serde(rename = "2.0")]
    V2_0,
}

impl FormatVersion {
    /// Width in bytes of every header and index integer.
    #[must_use]
    pub const fn field_width(self) -> usize {
        match self {
            Self::V1_2 => 4,
            Self::V2_0 => 8,
        }
    }

    /// Encodes one big-endian integer at this version's width.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if the value does not fit in
    /// a 4-byte field.
    pub fn put_int(self, buf: &mut Vec<u8>, value: u64) -> CoreResult<()> {
        match self {
            Self::V1_2 => {
                let narrow = u32::try_from(value).map_err(|_| {
                    CoreError::invalid_format(format!(
                        "value {value} does not fit a version 1.2 field"
                    ))
                })?;
                buf.extend_from_slice(&narrow.to_be_bytes());
            }
            Self::V2_0 => buf.extend_from_slice(&value.to_be_bytes()),
        }
        Ok(())
    }

    /// Decodes one big-endian integer at this version's width.
    ///
    /// The caller guarantees `bytes.len() >= self.field_width()`.
    #[must_use]
    pub fn get_int(self, bytes: &[u8]) -> u64 {
        match self {
            Self::V1_2 => u64::from(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Self::V2_0 => u64::from_be_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1_2 => f.write_str("1.2"),
            Self::V2_0 => f.write_str("2.0"),
        }
    }
}

impl FromStr for FormatVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.2" => Ok(Self::V1_2),
            "2.0" => Ok(Self::V2_0),
            other => Err(CoreError::invalid_config(format!(
                "unsupported format version {other:?}"
            ))),
        }
    }
}

/// Compression applied to each record block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    /// Stored as-is.
    None,
    /// LZO. Recognised when reading tags but not supported.
    Lzo,
    /// zlib (deflate with zlib framing).
    #[default]
    Zlib,
}

impl CompressionType {
    /// The little-endian tag stored at the front of each block.
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Lzo => 1,
            Self::Zlib => 2,
        }
    }

    /// Maps a stored tag back to a compression type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] for unknown tags.
    pub fn from_tag(tag: u32) -> CoreResult<Self> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::Lzo),
            2 => Ok(Self::Zlib),
            other => Err(CoreError::invalid_format(format!(
                "unknown compression tag {other}"
            ))),
        }
    }
}

impl FromStr for CompressionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "lzo" => Ok(Self::Lzo),
            "zlib" => Ok(Self::Zlib),
            other => Err(CoreError::invalid_config(format!(
                "unknown compression {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_widths() {
        assert_eq!(FormatVersion::V1_2.field_width(), 4);
        assert_eq!(FormatVersion::V2_0.field_width(), 8);
    }

    #[test]
    fn narrow_field_overflow() {
        let mut buf = Vec::new();
        FormatVersion::V1_2.put_int(&mut buf, 7).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 7]);

        let result = FormatVersion::V1_2.put_int(&mut buf, u64::from(u32::MAX) + 1);
        assert!(matches!(result, Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn wide_field_is_big_endian() {
        let mut buf = Vec::new();
        FormatVersion::V2_0.put_int(&mut buf, 0x0102).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(FormatVersion::V2_0.get_int(&buf), 0x0102);
    }

    #[test]
    fn compression_tags() {
        for kind in [CompressionType::None, CompressionType::Lzo, CompressionType::Zlib] {
            assert_eq!(CompressionType::from_tag(kind.tag()).unwrap(), kind);
        }
        assert!(CompressionType::from_tag(9).is_err());
    }
}
