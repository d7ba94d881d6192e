#![no_main]
use libfuzzer_sys::fuzz_target;
use oxihuff::codec::{compress_to_vec, decompress_to_vec};
use oxihuff::tree::{FrequencyTable, build_tree};

fuzz_target!(|data: &[u8]| {
    let tree = build_tree(&FrequencyTable::from_bytes(data)).unwrap();
    let packed = compress_to_vec(&tree, data).unwrap();
    let unpacked = decompress_to_vec(&packed).unwrap();
    assert_eq!(unpacked, data);
});
