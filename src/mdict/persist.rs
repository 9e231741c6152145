//! Persisted layout of a frozen `KeyIndex`.
//!
//! All numbers are big-endian, like the rest of the mdict container.
//!
//! ```text
//! offset   size  field
//! 0        4     magic b"MDKX"
//! 4        2     format version
//! 6        1     key text encoding tag
//! 7        1     ordering flags (bit 0 case sensitive, bit 1 strip key)
//! 8        8     record count N
//! 16       8     key table length K
//! 24       4     adler32 of everything after the header
//! 28       4     reserved, zero
//! 32       8*N   record offsets in key order
//! 32+8*N   K     key table, N * (u32 length, encoded key bytes)
//! ```
//!
//! Offsets and keys are kept apart so the offsets can be scanned without
//! decoding any text.

use std::io::{Read, Write};
use std::iter::FusedIterator;
use std::slice::ChunksExact;

use log::debug;
use nom::bytes::complete::tag;
use nom::multi::count;
use nom::number::complete::{be_u16, be_u32, be_u64, be_u8};
use nom::sequence::tuple;
use nom::IResult;

use crate::config::LoadOptions;
use crate::error::{IndexError, Result};
use crate::mdict::encoding::TextEncoding;
use crate::mdict::index::KeyIndex;
use crate::mdict::ordering::KeyOrdering;
use crate::mdict::record::KeyRecord;
use crate::util::checksum::{adler32, adler32_checksum};
use crate::util::key_text_parser;

pub const INDEX_MAGIC: [u8; 4] = *b"MDKX";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_LEN: usize = 32;

const OFFSET_WIDTH: usize = 8;
const KEY_LEN_WIDTH: usize = 4;

/// Fixed size header in front of a persisted index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    pub version: u16,
    pub encoding: TextEncoding,
    pub ordering: KeyOrdering,
    pub record_count: u64,
    pub key_table_len: u64,
    pub checksum: u32,
}

type RawHeader<'a> = (&'a [u8], u16, u8, u8, u64, u64, u32, u32);

fn raw_header_parser(input: &[u8]) -> IResult<&[u8], RawHeader<'_>> {
    tuple((
        tag(&INDEX_MAGIC[..]),
        be_u16,
        be_u8,
        be_u8,
        be_u64,
        be_u64,
        be_u32,
        be_u32,
    ))(input)
}

impl IndexHeader {
    /// parse and validate the header only, the body is not touched
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(IndexError::corrupt(format!(
                "{} bytes is shorter than the {} byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }
        if bytes[..INDEX_MAGIC.len()] != INDEX_MAGIC {
            return Err(IndexError::corrupt("bad magic"));
        }
        let (_, (_, version, encoding_tag, flags, record_count, key_table_len, checksum, reserved)) =
            raw_header_parser(bytes).map_err(|e| IndexError::corrupt(format!("unreadable header: {:?}", e)))?;

        if version != FORMAT_VERSION {
            return Err(IndexError::corrupt(format!("unsupported format version {}", version)));
        }
        let encoding = TextEncoding::from_tag(encoding_tag)
            .ok_or_else(|| IndexError::corrupt(format!("unknown text encoding tag {}", encoding_tag)))?;
        let ordering = KeyOrdering::from_flags(flags)
            .ok_or_else(|| IndexError::corrupt(format!("unknown ordering flags {:#04x}", flags)))?;
        if reserved != 0 {
            return Err(IndexError::corrupt("reserved header field is not zero"));
        }

        Ok(IndexHeader {
            version,
            encoding,
            ordering,
            record_count,
            key_table_len,
            checksum,
        })
    }

    /// total byte length the header announces, `None` on overflow
    pub fn total_len(&self) -> Option<u64> {
        self.record_count
            .checked_mul(OFFSET_WIDTH as u64)?
            .checked_add(self.key_table_len)?
            .checked_add(HEADER_LEN as u64)
    }

    // split the body into (offset array, key table) after checking the lengths
    fn split_body<'a>(&self, bytes: &'a [u8]) -> Result<(&'a [u8], &'a [u8])> {
        let total = self
            .total_len()
            .ok_or_else(|| IndexError::corrupt("record count overflows"))?;
        if total != bytes.len() as u64 {
            return Err(IndexError::corrupt(format!(
                "header announces {} bytes, got {}",
                total,
                bytes.len()
            )));
        }
        // every key carries at least its length prefix
        if self.key_table_len / (KEY_LEN_WIDTH as u64) < self.record_count {
            return Err(IndexError::corrupt(format!(
                "key table of {} bytes cannot hold {} keys",
                self.key_table_len, self.record_count
            )));
        }
        // total fits in the buffer, so these fit in usize
        let offsets_len = self.record_count as usize * OFFSET_WIDTH;
        let body = &bytes[HEADER_LEN..];
        Ok(body.split_at(offsets_len))
    }

    fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&INDEX_MAGIC);
        out[4..6].copy_from_slice(&self.version.to_be_bytes());
        out[6] = self.encoding.tag();
        out[7] = self.ordering.flags();
        out[8..16].copy_from_slice(&self.record_count.to_be_bytes());
        out[16..24].copy_from_slice(&self.key_table_len.to_be_bytes());
        out[24..28].copy_from_slice(&self.checksum.to_be_bytes());
        out
    }
}

impl KeyIndex {
    /// Encode the index; output only depends on records, ordering and
    /// encoding, so loading and saving again reproduces the same bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let encoding = self.encoding();
        let offsets_end = HEADER_LEN + self.count() * OFFSET_WIDTH;
        // header is patched in once the body is known
        let mut out = vec![0u8; HEADER_LEN];
        out.reserve(self.count() * OFFSET_WIDTH);
        for offset in self.offsets() {
            out.extend_from_slice(&offset.to_be_bytes());
        }
        for record in self.iter() {
            let encoded = encoding
                .encode(record.key())
                .map_err(|e| IndexError::invalid_key(record.key(), format!("cannot encode as {}: {}", encoding, e)))?;
            let len = u32::try_from(encoded.len())
                .map_err(|_| IndexError::invalid_key(record.key(), "key longer than 4 GiB"))?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&encoded);
        }

        let header = IndexHeader {
            version: FORMAT_VERSION,
            encoding,
            ordering: self.ordering(),
            record_count: self.count() as u64,
            key_table_len: (out.len() - offsets_end) as u64,
            checksum: adler32(&out[HEADER_LEN..]),
        };
        out[..HEADER_LEN].copy_from_slice(&header.encode());
        Ok(out)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// load with every check enabled
    pub fn from_bytes(bytes: &[u8]) -> Result<KeyIndex> {
        KeyIndex::from_bytes_with(bytes, LoadOptions::default())
    }

    /// Rebuild an index from `to_bytes` output.
    ///
    /// The stored order is trusted, nothing is re-sorted. Either the whole
    /// index is returned or an error, never a partial index.
    pub fn from_bytes_with(bytes: &[u8], options: LoadOptions) -> Result<KeyIndex> {
        let header = IndexHeader::parse(bytes)?;
        let (offsets_buf, key_table) = header.split_body(bytes)?;
        debug!(
            "loading key index: {} records, {}, {:?}",
            header.record_count, header.encoding, header.ordering
        );

        if options.verify_checksum && !adler32_checksum(&bytes[HEADER_LEN..], header.checksum) {
            return Err(IndexError::corrupt("body checksum mismatch"));
        }

        let n = header.record_count as usize;
        let (_, offsets) = count(be_u64::<&[u8], nom::error::Error<&[u8]>>, n)(offsets_buf)
            .map_err(|e| IndexError::corrupt(format!("unreadable offsets: {:?}", e)))?;
        let (remain, raw_keys) = count(key_text_parser, n)(key_table)
            .map_err(|_| IndexError::corrupt("key length prefix runs past the key table"))?;
        if !remain.is_empty() {
            return Err(IndexError::corrupt(format!("{} stray bytes after the key table", remain.len())));
        }

        let mut records = Vec::with_capacity(n);
        for (i, (raw, offset)) in raw_keys.into_iter().zip(offsets).enumerate() {
            let key = header
                .encoding
                .decode(raw)
                .map_err(|e| IndexError::corrupt(format!("key {} is not valid {}: {}", i, header.encoding, e)))?;
            records.push(KeyRecord::new(key, offset));
        }

        if options.verify_order {
            if let Some(i) = records
                .windows(2)
                .position(|w| header.ordering.compare(w[0].key(), w[1].key()).is_gt())
            {
                return Err(IndexError::corrupt(format!("keys out of order at record {}", i + 1)));
            }
        }

        Ok(KeyIndex::from_sorted(records, header.ordering, header.encoding))
    }

    pub fn read_from<R: Read>(mut reader: R, options: LoadOptions) -> Result<KeyIndex> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        KeyIndex::from_bytes_with(&bytes, options)
    }
}

/// Offsets of a persisted index, in key order, read without decoding keys.
///
/// Only the header and lengths are validated, not the checksum.
pub fn scan_offsets(bytes: &[u8]) -> Result<OffsetScan<'_>> {
    let header = IndexHeader::parse(bytes)?;
    let (offsets_buf, _) = header.split_body(bytes)?;
    Ok(OffsetScan {
        chunks: offsets_buf.chunks_exact(OFFSET_WIDTH),
    })
}

#[derive(Debug, Clone)]
pub struct OffsetScan<'a> {
    chunks: ChunksExact<'a, u8>,
}

impl Iterator for OffsetScan<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let chunk = self.chunks.next()?;
        be_u64::<&[u8], nom::error::Error<&[u8]>>(chunk).ok().map(|(_, offset)| offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for OffsetScan<'_> {}

impl FusedIterator for OffsetScan<'_> {}
