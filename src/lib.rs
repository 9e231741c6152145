//! Key index of mdict dictionaries: headwords mapped to the byte offset of
//! their entry in the record data.
//!
//! A key block decoder feeds `(headword, offset)` pairs into an
//! [`IndexBuilder`]; [`IndexBuilder::finish`] sorts them into a frozen
//! [`KeyIndex`] which answers exact and prefix lookups and can be persisted
//! with [`KeyIndex::to_bytes`] and reloaded with [`KeyIndex::from_bytes`].

pub mod config;
pub mod error;
pub mod mdict;
mod util;

pub use config::{IndexOptions, LoadOptions};
pub use error::{IndexError, Result};
pub use mdict::builder::IndexBuilder;
pub use mdict::encoding::TextEncoding;
pub use mdict::index::{KeyIndex, PrefixRange};
pub use mdict::ordering::KeyOrdering;
pub use mdict::persist::{scan_offsets, IndexHeader, OffsetScan};
pub use mdict::record::KeyRecord;
