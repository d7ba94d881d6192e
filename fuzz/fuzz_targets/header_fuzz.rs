#![no_main]
use libfuzzer_sys::fuzz_target;
use oxihuff::tree;

fuzz_target!(|data: &[u8]| {
    // Any header that parses must serialize back to the bytes it came from.
    let mut reader = data;
    if let Ok(parsed) = tree::read_tree(&mut reader) {
        let consumed = data.len() - reader.len();
        assert_eq!(tree::serialize_tree(&parsed), &data[..consumed]);
    }
});
