use std::borrow::Cow;
use std::cmp::Ordering;
use std::mem;

use log::debug;

use crate::config::IndexOptions;
use crate::error::{IndexError, Result};
use crate::mdict::index::KeyIndex;
use crate::mdict::record::KeyRecord;

// a record waiting for the final sort, `seq` is its insertion order
#[derive(Debug)]
struct Pending {
    seq: u64,
    record: KeyRecord,
}

/// Collects `(headword, offset)` pairs from a key block decoder, in any order,
/// and sorts them once into a `KeyIndex`.
///
/// ```
/// use mdict_keyindex::IndexBuilder;
///
/// let mut builder = IndexBuilder::new();
/// builder.add("apple", 100).unwrap();
/// builder.add("banana", 250).unwrap();
/// builder.add("apple", 400).unwrap();
/// let index = builder.finish().unwrap();
/// assert_eq!(index.lookup("apple"), Some(100));
/// ```
#[derive(Debug, Default)]
pub struct IndexBuilder {
    options: IndexOptions,
    pending: Vec<Pending>,
    next_seq: u64,
    used_bytes: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        IndexBuilder::default()
    }

    pub fn with_options(options: IndexOptions) -> Self {
        IndexBuilder {
            options,
            ..IndexBuilder::default()
        }
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn add(&mut self, key: impl Into<String>, offset: u64) -> Result<()> {
        let key = key.into();
        if key.is_empty() && !self.options.allow_empty_keys {
            return Err(IndexError::invalid_key(key, "empty key"));
        }
        if !self.options.encoding.can_encode(&key) {
            let reason = format!("not representable in {}", self.options.encoding);
            return Err(IndexError::invalid_key(key, reason));
        }

        let cost = key.len() + mem::size_of::<Pending>();
        if let Some(limit) = self.options.memory_limit {
            if self.used_bytes.saturating_add(cost) > limit {
                return Err(IndexError::OutOfMemory { requested: cost });
            }
        }
        self.pending
            .try_reserve(1)
            .map_err(|_| IndexError::OutOfMemory { requested: cost })?;

        self.pending.push(Pending {
            seq: self.next_seq,
            record: KeyRecord::new(key, offset),
        });
        self.next_seq += 1;
        self.used_bytes += cost;
        Ok(())
    }

    /// add every pair, stopping at the first rejected one
    pub fn extend<K, I>(&mut self, entries: I) -> Result<()>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, u64)>,
    {
        for (key, offset) in entries {
            self.add(key, offset)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Sort by folded key, then insertion order, and freeze.
    pub fn finish(self) -> Result<KeyIndex> {
        let IndexBuilder { options, pending, .. } = self;
        if pending.is_empty() && !options.allow_empty {
            return Err(IndexError::EmptyIndex);
        }

        let ordering = options.ordering;
        let parallel = pending.len() >= options.parallel_threshold;
        let order = {
            let folded: Vec<Cow<'_, str>> = pending.iter().map(|p| ordering.fold(p.record.key())).collect();
            let mut order: Vec<usize> = (0..pending.len()).collect();
            sort_order(
                &mut order,
                |&a, &b| {
                    folded[a]
                        .cmp(&folded[b])
                        .then_with(|| pending[a].seq.cmp(&pending[b].seq))
                },
                parallel,
            );
            order
        };

        let mut slots: Vec<Option<KeyRecord>> = pending.into_iter().map(|p| Some(p.record)).collect();
        let records: Vec<KeyRecord> = order.into_iter().filter_map(|i| slots[i].take()).collect();
        debug!(
            "key index built: {} records, {:?}, parallel sort {}",
            records.len(),
            ordering,
            parallel && cfg!(feature = "parallel")
        );
        Ok(KeyIndex::from_sorted(records, ordering, options.encoding))
    }
}

#[cfg(feature = "parallel")]
fn sort_order<F>(order: &mut [usize], compare: F, parallel: bool)
where
    F: Fn(&usize, &usize) -> Ordering + Sync,
{
    use rayon::prelude::*;

    if parallel {
        order.par_sort_unstable_by(compare);
    } else {
        order.sort_unstable_by(compare);
    }
}

#[cfg(not(feature = "parallel"))]
fn sort_order<F>(order: &mut [usize], compare: F, _parallel: bool)
where
    F: Fn(&usize, &usize) -> Ordering,
{
    order.sort_unstable_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdict::encoding::TextEncoding;
    use crate::mdict::ordering::KeyOrdering;

    fn pairs(index: &KeyIndex) -> Vec<(&str, u64)> {
        index.iter().map(|r| (r.key(), r.offset())).collect()
    }

    #[test]
    fn finish_sorts_and_keeps_duplicates_stable() -> anyhow::Result<()> {
        let mut builder = IndexBuilder::new();
        builder.add("apple", 100)?;
        builder.add("banana", 250)?;
        builder.add("apple", 400)?;
        assert_eq!(builder.len(), 3);

        let index = builder.finish()?;
        assert_eq!(pairs(&index), vec![("apple", 100), ("apple", 400), ("banana", 250)]);
        assert_eq!(index.lookup("apple"), Some(100));
        assert_eq!(index.lookup("APPLE"), None);
        assert_eq!(index.lookup("cherry"), None);
        Ok(())
    }

    #[test]
    fn folded_ties_keep_insertion_order() -> anyhow::Result<()> {
        let mut builder = IndexBuilder::with_options(IndexOptions {
            ordering: KeyOrdering::mdict(),
            ..IndexOptions::default()
        });
        builder.extend([("Zebra", 1), ("zebra", 2), ("ZEBRA", 3), ("ant", 4)])?;
        let index = builder.finish()?;
        assert_eq!(pairs(&index), vec![("ant", 4), ("Zebra", 1), ("zebra", 2), ("ZEBRA", 3)]);
        assert_eq!(index.lookup("zebra"), Some(1));
        Ok(())
    }

    #[test]
    fn empty_key_rejected_in_strict_mode() {
        let mut builder = IndexBuilder::new();
        let err = builder.add("", 1).unwrap_err();
        assert!(matches!(err, IndexError::InvalidKey { .. }));
        assert!(builder.is_empty());
    }

    #[test]
    fn empty_key_accepted_when_allowed() -> anyhow::Result<()> {
        let mut builder = IndexBuilder::with_options(IndexOptions {
            allow_empty_keys: true,
            ..IndexOptions::default()
        });
        builder.add("", 1)?;
        builder.add("a", 2)?;
        let index = builder.finish()?;
        assert_eq!(pairs(&index), vec![("", 1), ("a", 2)]);
        assert_eq!(index.lookup(""), Some(1));
        Ok(())
    }

    #[test]
    fn unencodable_key_rejected() {
        let mut builder = IndexBuilder::with_options(IndexOptions {
            encoding: TextEncoding::Big5,
            ..IndexOptions::default()
        });
        assert!(builder.add("字典", 1).is_ok());
        let err = builder.add("😀", 2).unwrap_err();
        assert!(matches!(err, IndexError::InvalidKey { ref key, .. } if key == "😀"));
    }

    #[test]
    fn empty_build() -> anyhow::Result<()> {
        let index = IndexBuilder::new().finish()?;
        assert_eq!(index.count(), 0);
        assert_eq!(index.lookup("a"), None);

        let strict = IndexBuilder::with_options(IndexOptions {
            allow_empty: false,
            ..IndexOptions::default()
        });
        assert!(matches!(strict.finish(), Err(IndexError::EmptyIndex)));
        Ok(())
    }

    #[test]
    fn memory_limit_surfaces_out_of_memory() {
        let per_record = "abcd".len() + mem::size_of::<Pending>();
        let mut builder = IndexBuilder::with_options(IndexOptions {
            memory_limit: Some(per_record * 2),
            ..IndexOptions::default()
        });
        assert!(builder.add("abcd", 1).is_ok());
        assert!(builder.add("efgh", 2).is_ok());
        let err = builder.add("ijkl", 3).unwrap_err();
        assert!(matches!(err, IndexError::OutOfMemory { .. }));
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn sort_path_is_independent_of_threshold() -> anyhow::Result<()> {
        let entries: Vec<(String, u64)> = (0..500u64).map(|i| (format!("w{}", i % 37), i)).collect();
        let build = |threshold| -> anyhow::Result<KeyIndex> {
            let mut builder = IndexBuilder::with_options(IndexOptions {
                ordering: KeyOrdering::exact(),
                parallel_threshold: threshold,
                ..IndexOptions::default()
            });
            builder.extend(entries.clone())?;
            Ok(builder.finish()?)
        };
        assert_eq!(build(0)?, build(usize::MAX)?);
        Ok(())
    }
}
