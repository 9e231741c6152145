use nom::multi::length_data;
use nom::number::complete::be_u32;
use nom::IResult;

pub mod checksum;

/// nom parser for one key table entry: u32 byte length, then the text bytes
pub fn key_text_parser(input: &[u8]) -> IResult<&[u8], &[u8]> {
    length_data(be_u32)(input)
}

#[test]
fn key_text_parser_test() {
    let data = [0, 0, 0, 2, b'h', b'i', 0xff];
    let (remain, text) = key_text_parser(&data).unwrap();
    assert_eq!(text, b"hi");
    assert_eq!(remain, &[0xff]);
    assert!(key_text_parser(&[0, 0, 0, 5, b'a']).is_err());
}
