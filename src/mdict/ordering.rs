use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde_derive::{Deserialize, Serialize};

/// punctuation ignored when a dictionary declares `StripKey="Yes"`
static STRIP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[ _=,.;:!?@%&#~`()\[\]<>{}/\\$+\-*^'"\t|]"#).unwrap()
});

const FLAG_CASE_SENSITIVE: u8 = 0b01;
const FLAG_STRIP_KEY: u8 = 0b10;

/// How headwords are compared, mirroring the mdict header attributes
/// `KeyCaseSensitive` and `StripKey`.
///
/// Keys are first *folded* (punctuation stripped, lower-cased) and the folded
/// text is compared byte-wise. Byte order of UTF-8 is code point order, so all
/// keys sharing a folded prefix sit next to each other in a sorted index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyOrdering {
    pub case_sensitive: bool,
    pub strip_key: bool,
}

/// plain lexicographic order, see `KeyOrdering::exact`
impl Default for KeyOrdering {
    fn default() -> Self {
        KeyOrdering::exact()
    }
}

impl KeyOrdering {
    /// plain lexicographic order on the key text
    pub const fn exact() -> Self {
        KeyOrdering {
            case_sensitive: true,
            strip_key: false,
        }
    }

    /// what most mdict headers declare: `KeyCaseSensitive="No"`, `StripKey="Yes"`
    pub const fn mdict() -> Self {
        KeyOrdering {
            case_sensitive: false,
            strip_key: true,
        }
    }

    pub fn fold<'a>(&self, key: &'a str) -> Cow<'a, str> {
        let stripped = if self.strip_key {
            STRIP_PATTERN.replace_all(key, "")
        } else {
            Cow::Borrowed(key)
        };
        if self.case_sensitive || stripped.bytes().all(|b| b.is_ascii() && !b.is_ascii_uppercase()) {
            return stripped;
        }
        // char by char, so fold(a + b) == fold(a) + fold(b)
        Cow::Owned(stripped.chars().flat_map(char::to_lowercase).collect())
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.fold(a).cmp(&self.fold(b))
    }

    /// `folded_prefix` must already be folded with this ordering
    pub fn has_prefix(&self, key: &str, folded_prefix: &str) -> bool {
        self.fold(key).starts_with(folded_prefix)
    }

    pub(crate) fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.case_sensitive {
            flags |= FLAG_CASE_SENSITIVE;
        }
        if self.strip_key {
            flags |= FLAG_STRIP_KEY;
        }
        flags
    }

    /// `None` when unknown bits are set
    pub(crate) fn from_flags(flags: u8) -> Option<Self> {
        if flags & !(FLAG_CASE_SENSITIVE | FLAG_STRIP_KEY) != 0 {
            return None;
        }
        Some(KeyOrdering {
            case_sensitive: flags & FLAG_CASE_SENSITIVE != 0,
            strip_key: flags & FLAG_STRIP_KEY != 0,
        })
    }
}
