use serde_derive::{Deserialize, Serialize};

/// 词条索引: 一个headword和它在record数据中的起始位置
///
/// `record_start` is a 64 bit offset so dictionaries larger than 4 GiB can be
/// addressed. Whether it is inside the data file is checked by the record
/// reader, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRecord {
    // start position of record
    record_start: u64,
    // headword text, may repeat across records
    key_word: String,
}

impl KeyRecord {
    pub fn new(key: impl Into<String>, offset: u64) -> Self {
        KeyRecord {
            record_start: offset,
            key_word: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key_word
    }

    pub fn offset(&self) -> u64 {
        self.record_start
    }

    pub fn into_parts(self) -> (String, u64) {
        (self.key_word, self.record_start)
    }
}
