#![no_main]
use libfuzzer_sys::fuzz_target;
use oxihuff::codec::{self, DecodeOptions};

fuzz_target!(|data: &[u8]| {
    // Arbitrary artifacts must only ever produce errors, never panics.
    let _ = codec::decompress_to_vec(data);
    let _ = codec::decompress_with(data, Vec::new(), DecodeOptions::strict());
});
