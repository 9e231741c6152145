use anyhow::{Context, Result};
use log::info;

use mdict_keyindex::{scan_offsets, IndexBuilder, IndexOptions, KeyIndex, KeyRecord, TextEncoding};

// pairs as a key block decoder would hand them over, in file order
const ENTRIES: &[(&str, u64)] = &[
    ("abjure", 0),
    ("abrogate", 812),
    ("Abstemious", 1630),
    ("acumen", 2211),
    ("abjure", 2904),
    ("ice-cream", 3377),
    ("iceberg", 4020),
    ("字典", 5_000_000_000),
];

fn main() -> Result<()> {
    pretty_env_logger::init();

    let options = IndexOptions::for_dictionary(false, true, TextEncoding::Utf16Le);
    let mut builder = IndexBuilder::with_options(options);
    builder.extend(ENTRIES.iter().copied())?;
    let index = builder.finish()?;
    info!("built index with {} records", index.count());

    let mut bytes = Vec::new();
    index.write_to(&mut bytes)?;
    info!("persisted index is {} bytes", bytes.len());

    let offsets: Vec<u64> = scan_offsets(&bytes)?.collect();
    println!("offsets in key order: {:?}", offsets);

    let index = KeyIndex::from_bytes(&bytes).context("reload persisted index")?;
    for word in ["abjure", "ABSTEMIOUS", "ice cream", "字典", "zyzzyva"] {
        match index.lookup(word) {
            Some(offset) => println!("{:>12} -> {}", word, offset),
            None => println!("{:>12} -> not found", word),
        }
    }

    let matches: Vec<&KeyRecord> = index.lookup_range("ab").collect();
    println!("prefix \"ab\": {}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}
