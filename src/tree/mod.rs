// Huffman tree model.
//
// - `Symbol`: a byte value or the end-of-stream marker (index 256)
// - `Node`: owned binary tree, leaves carry symbols
// - `HuffmanTree`: a root `Node` that passed invariant checks
// - `header`: versioned, self-delimiting tree serialization
// - `build`: frequency table -> tree

pub mod build;
pub mod header;

use std::fmt;

use crate::bits::BitSource;
use crate::codec::automaton;
use crate::codec::table::{self, EncodingTable};
use crate::error::{CodecError, Result};

pub use build::{FrequencyTable, build_tree};
pub use header::{deserialize_tree, read_tree, serialize_tree, write_tree};

/// Number of distinct symbols: 256 byte values plus end-of-stream.
pub const SYMBOL_COUNT: usize = 257;

/// Dense index of the end-of-stream symbol.
pub const EOS_INDEX: u16 = 256;

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// Alphabet of the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Byte(u8),
    EndOfStream,
}

impl Symbol {
    /// Dense index in `0..=256`.
    #[inline]
    pub fn index(self) -> u16 {
        match self {
            Self::Byte(b) => u16::from(b),
            Self::EndOfStream => EOS_INDEX,
        }
    }

    /// Inverse of `index`. Returns `None` above 256.
    #[inline]
    pub fn from_index(index: u16) -> Option<Self> {
        match index {
            0..=255 => Some(Self::Byte(index as u8)),
            EOS_INDEX => Some(Self::EndOfStream),
            _ => None,
        }
    }

    pub fn is_end(self) -> bool {
        self == Self::EndOfStream
    }
}

impl From<u8> for Symbol {
    fn from(b: u8) -> Self {
        Self::Byte(b)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Byte(b) if b.is_ascii_graphic() => write!(f, "'{}'", b as char),
            Self::Byte(b) => write!(f, "{b:#04X}"),
            Self::EndOfStream => f.write_str("EOS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A node of a Huffman tree. Children are owned exclusively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(Symbol),
    Internal { left: Box<Node>, right: Box<Node> },
}

impl Node {
    pub fn leaf(symbol: impl Into<Symbol>) -> Self {
        Self::Leaf(symbol.into())
    }

    pub fn end_of_stream() -> Self {
        Self::Leaf(Symbol::EndOfStream)
    }

    pub fn internal(left: Node, right: Node) -> Self {
        Self::Internal {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Child reached by `bit` (false = left, true = right). `None` on a leaf.
    #[inline]
    pub fn child(&self, bit: bool) -> Option<&Node> {
        match self {
            Self::Leaf(_) => None,
            Self::Internal { left, right } => Some(if bit { right } else { left }),
        }
    }
}

// ---------------------------------------------------------------------------
// HuffmanTree
// ---------------------------------------------------------------------------

/// A validated Huffman tree.
///
/// Construction checks that the root is internal, that exactly one leaf
/// carries `EndOfStream`, and that no symbol appears on two leaves. With at
/// most 257 distinct leaves the depth is bounded by 256.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: Node,
    leaves: usize,
    depth: usize,
}

impl HuffmanTree {
    pub fn new(root: Node) -> Result<Self> {
        if root.is_leaf() {
            return Err(CodecError::InvalidTree(
                "root is a leaf; a tree needs at least two leaves".into(),
            ));
        }

        let mut seen = [false; SYMBOL_COUNT];
        let mut leaves = 0usize;
        let mut depth = 0usize;
        let mut stack = vec![(&root, 0usize)];
        while let Some((node, level)) = stack.pop() {
            match node {
                Node::Leaf(symbol) => {
                    let slot = &mut seen[symbol.index() as usize];
                    if *slot {
                        return Err(CodecError::InvalidTree(format!(
                            "symbol {symbol} appears on more than one leaf"
                        )));
                    }
                    *slot = true;
                    leaves += 1;
                    depth = depth.max(level);
                }
                Node::Internal { left, right } => {
                    stack.push((right, level + 1));
                    stack.push((left, level + 1));
                }
            }
        }

        if !seen[EOS_INDEX as usize] {
            return Err(CodecError::InvalidTree("no end-of-stream leaf".into()));
        }

        Ok(Self {
            root,
            leaves,
            depth,
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Derive the symbol -> code table.
    pub fn encoding_table(&self) -> EncodingTable {
        table::build_table(self)
    }

    /// Walk from the root to one leaf, consuming bits from `bits`.
    pub fn decode_one<S: BitSource + ?Sized>(&self, bits: &mut S) -> Result<Symbol> {
        automaton::decode_one(&self.root, bits)
    }
}

impl TryFrom<Node> for HuffmanTree {
    type Error = CodecError;

    fn try_from(root: Node) -> Result<Self> {
        Self::new(root)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
