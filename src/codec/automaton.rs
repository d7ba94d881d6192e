// Single-symbol decode automaton.
//
// States are tree nodes; the root is the start state, every leaf is a
// terminal state. Each transition consumes exactly one bit (0 = left,
// 1 = right). Nothing is carried between calls: the next call starts at
// the root again.

use std::io;

use crate::bits::BitSource;
use crate::error::{CodecError, Result};
use crate::tree::{Node, Symbol};

/// Decode one symbol by walking from `root` to a leaf.
///
/// Fails with `InvalidTree` if `root` is itself a leaf, and with
/// `TruncatedStream` if `bits` runs out before a leaf is reached (including
/// before the first bit).
pub fn decode_one<S: BitSource + ?Sized>(root: &Node, bits: &mut S) -> Result<Symbol> {
    if root.is_leaf() {
        return Err(CodecError::InvalidTree(
            "root is a leaf; nothing to decode".into(),
        ));
    }

    let mut node = root;
    loop {
        match node {
            Node::Leaf(symbol) => return Ok(*symbol),
            Node::Internal { left, right } => {
                let bit = match bits.read_bit() {
                    Ok(bit) => bit,
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                        return Err(CodecError::TruncatedStream);
                    }
                    Err(e) => return Err(CodecError::Io(e)),
                };
                node = if bit { right } else { left };
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
