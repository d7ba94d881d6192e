//! Oxihuff: a streaming Huffman codec with a self-describing tree header.
//!
//! The crate provides:
//! - MSB-first bit I/O (`bits`)
//! - The Huffman tree model, its header format and a frequency builder (`tree`)
//! - The encode/decode pipeline (`codec`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use oxihuff::codec::{compress_to_vec, decompress_to_vec};
//! use oxihuff::tree::{FrequencyTable, build_tree};
//!
//! let data = b"she sells sea shells";
//! let tree = build_tree(&FrequencyTable::from_bytes(data)).unwrap();
//! let packed = compress_to_vec(&tree, data).unwrap();
//! assert_eq!(decompress_to_vec(&packed).unwrap(), data);
//! ```

pub mod bits;
pub mod codec;
pub mod error;
pub mod io;
pub mod tree;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{CodecError, Result};
