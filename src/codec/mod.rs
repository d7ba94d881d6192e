// Huffman stream codec.
//
// - `table`: tree -> symbol/code table (left = 0, right = 1)
// - `automaton`: one-symbol-per-call tree walk driven by single bits
// - `encoder`: HuffEncoder, writes header, payload codes, end-of-stream, padding
// - `decoder`: HuffDecoder, reads header, automaton loop until end-of-stream

pub mod automaton;
pub mod decoder;
pub mod encoder;
pub mod table;

pub use automaton::decode_one;
pub use decoder::{
    DecodeOptions, DecompressStats, HuffDecoder, decompress, decompress_to_vec, decompress_with,
};
pub use encoder::{CompressStats, HuffEncoder, compress, compress_to_vec};
pub use table::{Code, EncodingTable, build_table};
