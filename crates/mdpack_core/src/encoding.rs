//! Text encodings supported for keys and textual records.
//!
//! UTF-8 and UTF-16LE are handled directly; the legacy CJK encodings go
//! through `encoding_rs`. Encoding never substitutes characters: anything
//! the target cannot represent is an [`CoreError::Encoding`].

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text encoding of keys and textual records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8.
    #[default]
    #[serde(rename = "UTF-8", alias = "utf-8", alias = "utf8")]
    Utf8,
    /// UTF-16 little endian, two-byte code units.
    #[serde(rename = "UTF-16", alias = "utf-16", alias = "utf-16le")]
    Utf16Le,
    /// GBK (simplified Chinese).
    #[serde(rename = "GBK", alias = "gbk")]
    Gbk,
    /// GB18030.
    #[serde(rename = "GB18030", alias = "gb18030")]
    Gb18030,
    /// Big5 (traditional Chinese).
    #[serde(rename = "BIG5", alias = "big5")]
    Big5,
}

impl TextEncoding {
    /// Returns the canonical name written into dictionary metadata.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16Le => "UTF-16",
            Self::Gbk => "GBK",
            Self::Gb18030 => "GB18030",
            Self::Big5 => "BIG5",
        }
    }

    /// Width in bytes of one code unit.
    ///
    /// Key lengths are recorded in code units, so a UTF-16 key of four
    /// bytes has a length of two.
    #[must_use]
    pub const fn unit_width(self) -> usize {
        match self {
            Self::Utf16Le => 2,
            _ => 1,
        }
    }

    /// The encoded NUL terminator.
    #[must_use]
    pub const fn terminator(self) -> &'static [u8] {
        match self {
            Self::Utf16Le => &[0, 0],
            _ => &[0],
        }
    }

    /// Whether ASCII bytes (in particular `\n`) mean the same thing in this
    /// encoding. Line-oriented input requires it.
    #[must_use]
    pub const fn is_ascii_compatible(self) -> bool {
        !matches!(self, Self::Utf16Le)
    }

    /// Encodes text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Encoding`] if a character has no mapping.
    pub fn encode(self, text: &str) -> CoreResult<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            legacy => {
                let (bytes, _, had_errors) = legacy.codec().encode(text);
                if had_errors {
                    return Err(CoreError::encoding(format!(
                        "{text:?} cannot be represented in {}",
                        legacy.name()
                    )));
                }
                Ok(bytes.into_owned())
            }
        }
    }

    /// Encodes text followed by the terminator.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Encoding`] if a character has no mapping.
    pub fn encode_terminated(self, text: &str) -> CoreResult<Vec<u8>> {
        let mut bytes = self.encode(text)?;
        bytes.extend_from_slice(self.terminator());
        Ok(bytes)
    }

    /// Decodes bytes without replacement.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Encoding`] on malformed input.
    pub fn decode(self, bytes: &[u8]) -> CoreResult<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| CoreError::encoding(format!("invalid UTF-8: {e}"))),
            Self::Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return Err(CoreError::encoding("odd byte count for UTF-16 text"));
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units)
                    .map_err(|e| CoreError::encoding(format!("invalid UTF-16: {e}")))
            }
            legacy => legacy
                .codec()
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned())
                .ok_or_else(|| CoreError::encoding(format!("malformed {} text", legacy.name()))),
        }
    }

    fn codec(self) -> &'static encoding_rs::Encoding {
        match self {
            Self::Utf8 => encoding_rs::UTF_8,
            Self::Utf16Le => encoding_rs::UTF_16LE,
            Self::Gbk => encoding_rs::GBK,
            Self::Gb18030 => encoding_rs::GB18030,
            Self::Big5 => encoding_rs::BIG5,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-16" | "utf16" | "utf-16le" => Ok(Self::Utf16Le),
            "gbk" => Ok(Self::Gbk),
            "gb18030" => Ok(Self::Gb18030),
            "big5" => Ok(Self::Big5),
            other => Err(CoreError::invalid_config(format!(
                "unsupported encoding {other:?}"
            ))),
        }
    }
}
