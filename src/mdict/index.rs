use std::iter::FusedIterator;
use std::slice;

use crate::mdict::encoding::TextEncoding;
use crate::mdict::ordering::KeyOrdering;
use crate::mdict::record::KeyRecord;

/// Frozen, sorted key index of a dictionary.
///
/// Records live in one contiguous arena sorted by the index `KeyOrdering`;
/// records with equal keys keep the order they were added in. There is no
/// mutating API, so a `KeyIndex` can be shared between reader threads as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIndex {
    records: Vec<KeyRecord>,
    ordering: KeyOrdering,
    encoding: TextEncoding,
}

impl KeyIndex {
    /// `records` must already be sorted with `ordering`
    pub(crate) fn from_sorted(records: Vec<KeyRecord>, ordering: KeyOrdering, encoding: TextEncoding) -> Self {
        KeyIndex {
            records,
            ordering,
            encoding,
        }
    }

    /// offset of the first record filed under `key`, `None` when absent
    pub fn lookup(&self, key: &str) -> Option<u64> {
        self.lookup_all(key).next().map(KeyRecord::offset)
    }

    /// all records filed under `key`, in insertion order
    pub fn lookup_all(&self, key: &str) -> slice::Iter<'_, KeyRecord> {
        let target = self.ordering.fold(key);
        let start = self.lower_bound(&target);
        let len = self.records[start..].partition_point(|r| self.ordering.fold(r.key()) == target);
        self.records[start..start + len].iter()
    }

    /// records whose key starts with `prefix`, ascending
    pub fn lookup_range(&self, prefix: &str) -> PrefixRange<'_> {
        let prefix = self.ordering.fold(prefix);
        let start = self.lower_bound(&prefix);
        let len = self.records[start..].partition_point(|r| self.ordering.has_prefix(r.key(), &prefix));
        PrefixRange {
            inner: self.records[start..start + len].iter(),
        }
    }

    // first record whose folded key is not below `folded`
    fn lower_bound(&self, folded: &str) -> usize {
        self.records
            .partition_point(|r| &*self.ordering.fold(r.key()) < folded)
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&KeyRecord> {
        self.records.get(i)
    }

    pub fn iter(&self) -> slice::Iter<'_, KeyRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[KeyRecord] {
        &self.records
    }

    /// offsets in key order
    pub fn offsets(&self) -> impl ExactSizeIterator<Item = u64> + '_ {
        self.records.iter().map(KeyRecord::offset)
    }

    pub fn ordering(&self) -> KeyOrdering {
        self.ordering
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

impl<'a> IntoIterator for &'a KeyIndex {
    type Item = &'a KeyRecord;
    type IntoIter = slice::Iter<'a, KeyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Lazy iterator over the records matching a prefix, see `KeyIndex::lookup_range`.
#[derive(Debug, Clone)]
pub struct PrefixRange<'a> {
    inner: slice::Iter<'a, KeyRecord>,
}

impl<'a> PrefixRange<'a> {
    pub fn as_slice(&self) -> &'a [KeyRecord] {
        self.inner.as_slice()
    }
}

impl<'a> Iterator for PrefixRange<'a> {
    type Item = &'a KeyRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for PrefixRange<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl ExactSizeIterator for PrefixRange<'_> {}

impl FusedIterator for PrefixRange<'_> {}
