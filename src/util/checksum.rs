use adler32::RollingAdler32;

pub fn adler32(contents: &[u8]) -> u32 {
    let mut rolling_adler32 = RollingAdler32::new();
    rolling_adler32.update_buffer(contents);
    rolling_adler32.hash()
}

pub fn adler32_checksum(contents: &[u8], expected: u32) -> bool {
    adler32(contents) == expected
}

#[test]
fn known_value() {
    //{0x118e038e, "abcdefghi", "adl\x01\x03\xd8\x01\x8b"},
    assert_eq!(adler32(b"abcdefghi"), 0x118e038e);
    assert!(adler32_checksum(b"abcdefghi", 0x118e038e));
    assert_eq!(adler32(b""), 1);
}
