use serde_derive::{Deserialize, Serialize};

use crate::error::Result;
use crate::mdict::encoding::TextEncoding;
use crate::mdict::ordering::KeyOrdering;

/// Options for `IndexBuilder`.
///
/// Usually filled from the dictionary header (`KeyCaseSensitive`, `StripKey`,
/// `Encoding`), or from JSON:
///
/// ```
/// use mdict_keyindex::IndexOptions;
///
/// let opts = IndexOptions::from_json(r#"{"allow_empty": false, "encoding": "utf16le"}"#).unwrap();
/// assert!(!opts.allow_empty);
/// assert!(!opts.allow_empty_keys);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// accept `""` as a headword
    pub allow_empty_keys: bool,
    /// let `finish()` return an index without records
    pub allow_empty: bool,
    pub ordering: KeyOrdering,
    /// encoding of the persisted key table
    pub encoding: TextEncoding,
    /// upper bound in bytes for key text plus per-record bookkeeping
    pub memory_limit: Option<usize>,
    /// record count from which the sort runs on rayon (feature `parallel`)
    pub parallel_threshold: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            allow_empty_keys: false,
            allow_empty: true,
            ordering: KeyOrdering::exact(),
            encoding: TextEncoding::Utf8,
            memory_limit: None,
            parallel_threshold: 64 * 1024,
        }
    }
}

impl IndexOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// options matching the mdict header attributes of a dictionary
    pub fn for_dictionary(key_case_sensitive: bool, strip_key: bool, encoding: TextEncoding) -> Self {
        IndexOptions {
            ordering: KeyOrdering {
                case_sensitive: key_case_sensitive,
                strip_key,
            },
            encoding,
            ..IndexOptions::default()
        }
    }
}

/// Checks applied by `KeyIndex::from_bytes_with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// reject files whose keys are not in non-decreasing order
    pub verify_order: bool,
    /// reject files whose body checksum does not match the header
    pub verify_checksum: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            verify_order: true,
            verify_checksum: true,
        }
    }
}

impl LoadOptions {
    /// trust the stored bytes, only structural checks remain
    pub fn trusted() -> Self {
        LoadOptions {
            verify_order: false,
            verify_checksum: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
