use std::borrow::Cow;
use std::fmt;

use encoding::all::{BIG5_2003, GB18030, UTF_16LE, UTF_8};
use encoding::label::encoding_from_whatwg_label;
use encoding::{DecoderTrap, EncoderTrap, EncodingRef};
use serde_derive::{Deserialize, Serialize};

/// Text encoding of the persisted key table.
///
/// These are the encodings mdict dictionaries declare in their `Encoding`
/// header attribute. GBK and GB2312 dictionaries are read as GB18030, which
/// is a superset of both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Gb18030,
    Big5,
}

impl TextEncoding {
    /// map an mdict header `Encoding` value, empty means UTF-8
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return Some(TextEncoding::Utf8);
        }
        let codec = encoding_from_whatwg_label(label)?;
        match codec.whatwg_name()? {
            "utf-8" => Some(TextEncoding::Utf8),
            "utf-16le" => Some(TextEncoding::Utf16Le),
            "gbk" | "gb18030" => Some(TextEncoding::Gb18030),
            "big5" => Some(TextEncoding::Big5),
            _ => None,
        }
    }

    pub(crate) fn tag(&self) -> u8 {
        match self {
            TextEncoding::Utf8 => 0,
            TextEncoding::Utf16Le => 1,
            TextEncoding::Gb18030 => 2,
            TextEncoding::Big5 => 3,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(TextEncoding::Utf8),
            1 => Some(TextEncoding::Utf16Le),
            2 => Some(TextEncoding::Gb18030),
            3 => Some(TextEncoding::Big5),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Utf16Le => "UTF-16LE",
            TextEncoding::Gb18030 => "GB18030",
            TextEncoding::Big5 => "BIG5",
        }
    }

    fn codec(&self) -> EncodingRef {
        let codec: EncodingRef = match self {
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Utf16Le => UTF_16LE,
            TextEncoding::Gb18030 => GB18030,
            TextEncoding::Big5 => BIG5_2003,
        };
        codec
    }

    /// every Unicode string has a UTF-8, UTF-16 and GB18030 form
    pub fn covers_unicode(&self) -> bool {
        !matches!(self, TextEncoding::Big5)
    }

    pub fn can_encode(&self, text: &str) -> bool {
        self.covers_unicode() || self.encode(text).is_ok()
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u8>, Cow<'static, str>> {
        self.codec().encode(text, EncoderTrap::Strict)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, Cow<'static, str>> {
        self.codec().decode(bytes, DecoderTrap::Strict)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
