use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mdict_keyindex::{
    scan_offsets, IndexBuilder, IndexError, IndexHeader, IndexOptions, KeyIndex, KeyOrdering, LoadOptions,
    TextEncoding,
};

fn build(options: IndexOptions, n: usize, seed: u64) -> anyhow::Result<KeyIndex> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = IndexBuilder::with_options(options);
    for _ in 0..n {
        let len = rng.gen_range(1..8);
        let key: String = (0..len).map(|_| rng.gen_range(b'a'..=b'f') as char).collect();
        builder.add(key, rng.gen_range(0..u64::MAX))?;
    }
    Ok(builder.finish()?)
}

#[test]
fn round_trip_keeps_everything() -> anyhow::Result<()> {
    let _ = pretty_env_logger::try_init();
    for (seed, ordering, encoding) in [
        (1, KeyOrdering::default(), TextEncoding::Utf8),
        (2, KeyOrdering::exact(), TextEncoding::Utf16Le),
        (3, KeyOrdering::default(), TextEncoding::Gb18030),
        (4, KeyOrdering::exact(), TextEncoding::Big5),
    ] {
        let index = build(
            IndexOptions {
                ordering,
                encoding,
                ..IndexOptions::default()
            },
            250,
            seed,
        )?;
        let bytes = index.to_bytes()?;
        let loaded = KeyIndex::from_bytes(&bytes)?;

        assert_eq!(loaded.count(), index.count());
        assert_eq!(loaded.records(), index.records());
        assert_eq!(loaded.ordering(), ordering);
        assert_eq!(loaded.encoding(), encoding);
        // byte-for-byte stable across a reload
        assert_eq!(loaded.to_bytes()?, bytes);
    }
    Ok(())
}

#[test]
fn empty_index_round_trips() -> anyhow::Result<()> {
    let index = IndexBuilder::new().finish()?;
    let bytes = index.to_bytes()?;
    assert_eq!(bytes.len(), 32);
    let loaded = KeyIndex::from_bytes(&bytes)?;
    assert_eq!(loaded.count(), 0);
    assert_eq!(loaded.lookup("a"), None);
    assert_eq!(loaded.to_bytes()?, bytes);
    Ok(())
}

#[test]
fn every_truncation_is_corrupt() -> anyhow::Result<()> {
    let bytes = build(IndexOptions::default(), 40, 9)?.to_bytes()?;
    for len in 0..bytes.len() {
        let result = KeyIndex::from_bytes_with(&bytes[..len], LoadOptions::trusted());
        assert!(
            matches!(result, Err(IndexError::CorruptIndex(_))),
            "truncated to {} bytes",
            len
        );
    }
    Ok(())
}

#[test]
fn one_byte_short_is_corrupt() -> anyhow::Result<()> {
    for n in [0, 1, 17] {
        let bytes = build(IndexOptions::default(), n, 5)?.to_bytes()?;
        let result = KeyIndex::from_bytes(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(IndexError::CorruptIndex(_))));
    }
    Ok(())
}

// hand-assembled body with a correct checksum, so only the structural check can fail
fn assemble(count: u64, offsets: &[u64], key_table: &[u8], flags: u8) -> Vec<u8> {
    let mut body = Vec::new();
    for o in offsets {
        body.extend_from_slice(&o.to_be_bytes());
    }
    body.extend_from_slice(key_table);
    let mut adler = adler32::RollingAdler32::new();
    adler.update_buffer(&body);

    let mut out = Vec::new();
    out.extend_from_slice(b"MDKX");
    out.extend_from_slice(&1u16.to_be_bytes());
    out.push(0);
    out.push(flags);
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&(key_table.len() as u64).to_be_bytes());
    out.extend_from_slice(&adler.hash().to_be_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&body);
    out
}

#[test]
fn hand_assembled_file_loads() -> anyhow::Result<()> {
    let file = assemble(2, &[7, 3], b"\0\0\0\x01a\0\0\0\x01b", 0b01);
    let index = KeyIndex::from_bytes(&file)?;
    assert_eq!(index.lookup("a"), Some(7));
    assert_eq!(index.lookup("b"), Some(3));
    assert_eq!(index.ordering(), KeyOrdering::exact());
    assert_eq!(index.to_bytes()?, file);
    Ok(())
}

#[test]
fn length_prefix_past_the_end_is_corrupt() {
    let file = assemble(2, &[7, 3], b"\0\0\0\x01a\0\0\0\x09b", 0b01);
    assert!(matches!(KeyIndex::from_bytes(&file), Err(IndexError::CorruptIndex(_))));
}

#[test]
fn key_table_leftovers_are_corrupt() {
    let file = assemble(1, &[7], b"\0\0\0\x01ab", 0b01);
    assert!(matches!(KeyIndex::from_bytes(&file), Err(IndexError::CorruptIndex(_))));
}

#[test]
fn record_count_beyond_buffer_is_corrupt() {
    let file = assemble(u64::MAX, &[7], b"\0\0\0\x01a", 0b01);
    assert!(matches!(KeyIndex::from_bytes(&file), Err(IndexError::CorruptIndex(_))));
    let file = assemble(3, &[7], b"\0\0\0\x01a", 0b01);
    assert!(matches!(KeyIndex::from_bytes(&file), Err(IndexError::CorruptIndex(_))));
}

#[test]
fn invalid_text_is_corrupt() {
    let file = assemble(1, &[7], b"\0\0\0\x02\xff\xfe", 0b01);
    assert!(matches!(KeyIndex::from_bytes(&file), Err(IndexError::CorruptIndex(_))));
}

#[test]
fn tampered_order_is_detected_unless_trusted() -> anyhow::Result<()> {
    let file = assemble(2, &[3, 7], b"\0\0\0\x01b\0\0\0\x01a", 0b01);
    assert!(matches!(KeyIndex::from_bytes(&file), Err(IndexError::CorruptIndex(_))));

    let trusted = KeyIndex::from_bytes_with(
        &file,
        LoadOptions {
            verify_order: false,
            ..LoadOptions::default()
        },
    )?;
    // stored order is kept as is
    assert_eq!(trusted.get(0).map(|r| r.key()), Some("b"));
    Ok(())
}

#[test]
fn header_and_offsets_without_keys() -> anyhow::Result<()> {
    let index = build(IndexOptions::default(), 60, 13)?;
    let bytes = index.to_bytes()?;

    let header = IndexHeader::parse(&bytes)?;
    assert_eq!(header.version, 1);
    assert_eq!(header.record_count, 60);
    assert_eq!(header.encoding, TextEncoding::Utf8);
    assert_eq!(header.ordering, KeyOrdering::default());

    let offsets: Vec<u64> = scan_offsets(&bytes)?.collect();
    assert_eq!(offsets, index.offsets().collect::<Vec<_>>());
    assert!(matches!(scan_offsets(&bytes[..40]), Err(IndexError::CorruptIndex(_))));
    Ok(())
}

#[test]
fn shared_reader_threads() -> anyhow::Result<()> {
    let index = std::sync::Arc::new(build(IndexOptions::default(), 100, 21)?);
    let keys: Vec<String> = index.iter().map(|r| r.key().to_string()).collect();
    std::thread::scope(|s| {
        for chunk in keys.chunks(25) {
            let index = index.clone();
            s.spawn(move || {
                for key in chunk {
                    assert!(index.lookup(key).is_some());
                }
            });
        }
    });
    Ok(())
}
