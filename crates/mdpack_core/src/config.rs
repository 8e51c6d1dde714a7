//! Packing and staging configuration.

use crate::encoding::TextEncoding;
use crate::error::{CoreError, CoreResult};
use crate::format::{CompressionType, FormatVersion};
use serde::{Deserialize, Serialize};

/// Configuration for packing a dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Format version; selects 4- or 8-byte section fields.
    pub format_version: FormatVersion,

    /// Compression applied to every record block.
    pub compression: CompressionType,

    /// Maximum uncompressed bytes per record block.
    pub block_size: u64,

    /// Encoding of keys and textual records.
    pub encoding: TextEncoding,

    /// Locale tag used to collate keys (`"C"` for code-point order).
    pub collation: String,

    /// Pack binary resources instead of textual records.
    ///
    /// Resource dictionaries always use UTF-16 keys.
    pub resource_mode: bool,

    /// Dictionary title.
    pub title: String,

    /// Dictionary description.
    pub description: String,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            format_version: FormatVersion::V2_0,
            compression: CompressionType::Zlib,
            block_size: 64 * 1024, // 64 KiB
            encoding: TextEncoding::Utf8,
            collation: "und".to_string(),
            resource_mode: false,
            title: String::new(),
            description: String::new(),
        }
    }
}

impl PackConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the format version.
    #[must_use]
    pub const fn format_version(mut self, version: FormatVersion) -> Self {
        self.format_version = version;
        self
    }

    /// Sets the block compression.
    #[must_use]
    pub const fn compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the maximum uncompressed block size.
    #[must_use]
    pub const fn block_size(mut self, size: u64) -> Self {
        self.block_size = size;
        self
    }

    /// Sets the text encoding.
    #[must_use]
    pub const fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the collation locale tag.
    #[must_use]
    pub fn collation(mut self, tag: impl Into<String>) -> Self {
        self.collation = tag.into();
        self
    }

    /// Sets resource (binary blob) mode.
    #[must_use]
    pub const fn resource_mode(mut self, value: bool) -> Self {
        self.resource_mode = value;
        self
    }

    /// Sets the dictionary title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the dictionary description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The encoding keys are actually written in.
    #[must_use]
    pub const fn key_encoding(&self) -> TextEncoding {
        if self.resource_mode {
            TextEncoding::Utf16Le
        } else {
            self.encoding
        }
    }

    /// Checks values that cannot be expressed by the types alone.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for a zero block size or an
    /// unsupported compression.
    pub fn validate(&self) -> CoreResult<()> {
        if self.block_size == 0 {
            return Err(CoreError::invalid_config("block size must be positive"));
        }
        if self.compression == CompressionType::Lzo {
            return Err(CoreError::invalid_config("LZO compression is not supported"));
        }
        Ok(())
    }
}

/// Configuration for the text/staging bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Rows inserted per committed transaction.
    pub batch_size: usize,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            batch_size: 10 * 1024,
        }
    }
}

impl StagingConfig {
    /// Sets the batch size.
    #[must_use]
    pub const fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PackConfig::default();
        assert_eq!(config.format_version, FormatVersion::V2_0);
        assert_eq!(config.compression, CompressionType::Zlib);
        assert_eq!(config.block_size, 65536);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = PackConfig::new()
            .format_version(FormatVersion::V1_2)
            .block_size(1024)
            .collation("C")
            .title("Test");

        assert_eq!(config.format_version, FormatVersion::V1_2);
        assert_eq!(config.block_size, 1024);
        assert_eq!(config.collation, "C");
        assert_eq!(config.title, "Test");
    }

    #[test]
    fn resource_mode_forces_utf16_keys() {
        let config = PackConfig::new().encoding(TextEncoding::Gbk);
        assert_eq!(config.key_encoding(), TextEncoding::Gbk);
        assert_eq!(config.resource_mode(true).key_encoding(), TextEncoding::Utf16Le);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(PackConfig::new().block_size(0).validate().is_err());
        assert!(PackConfig::new()
            .compression(CompressionType::Lzo)
            .validate()
            .is_err());
    }

    #[test]
    fn json_with_partial_fields() {
        let config: PackConfig =
            serde_json::from_str(r#"{"format_version":"1.2","encoding":"GBK"}"#).unwrap();
        assert_eq!(config.format_version, FormatVersion::V1_2);
        assert_eq!(config.encoding, TextEncoding::Gbk);
        assert_eq!(config.block_size, 65536);
    }

    #[test]
    fn staging_defaults() {
        assert_eq!(StagingConfig::default().batch_size, 10240);
        assert_eq!(StagingConfig::default().batch_size(3).batch_size, 3);
    }
}
