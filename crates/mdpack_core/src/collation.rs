//! Key ordering.
//!
//! The key index written next to the record section is searched with a
//! locale collation, so records must be laid out in that same order.
//! `"C"` and `"POSIX"` select plain code-point order; any other tag is
//! handed to the ICU collator.

use crate::error::{CoreError, CoreResult};
use icu_collator::{Collator, CollatorOptions};
use icu_locid::Locale;
use std::cmp::Ordering;
use std::fmt;

/// Comparison used to sort dictionary keys.
pub enum KeyCollation {
    /// Unicode code-point order.
    CodePoint,
    /// ICU collation for a locale.
    Locale {
        /// The locale tag as given.
        tag: String,
        /// The collator built for it.
        collator: Box<Collator>,
    },
}

impl KeyCollation {
    /// Builds a collation from a locale tag such as `"en-US"`, `"zh_CN"` or `"C"`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the tag does not parse or
    /// no collation data is available for it.
    pub fn from_tag(tag: &str) -> CoreResult<Self> {
        if tag.is_empty() || tag == "C" || tag == "POSIX" {
            return Ok(Self::CodePoint);
        }

        let locale: Locale = tag
            .replace('_', "-")
            .parse()
            .map_err(|e| CoreError::invalid_config(format!("bad locale {tag:?}: {e}")))?;
        let collator = Collator::try_new(&locale.into(), CollatorOptions::new())
            .map_err(|e| CoreError::invalid_config(format!("no collation for {tag:?}: {e}")))?;

        Ok(Self::Locale {
            tag: tag.to_string(),
            collator: Box::new(collator),
        })
    }

    /// Compares two keys.
    #[must_use]
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::CodePoint => a.cmp(b),
            Self::Locale { collator, .. } => collator.compare(a, b),
        }
    }
}

impl fmt::Debug for KeyCollation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodePoint => f.write_str("KeyCollation::CodePoint"),
            Self::Locale { tag, .. } => write!(f, "KeyCollation::Locale({tag})"),
        }
    }
}
