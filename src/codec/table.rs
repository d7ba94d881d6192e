// Encoding table: symbol -> root-to-leaf bit path.
//
// Left edges contribute 0, right edges 1, root bit first. The decode
// automaton walks the tree with the same convention.

use std::fmt;
use std::io;

use crate::bits::BitWrite;
use crate::tree::{HuffmanTree, Node, SYMBOL_COUNT, Symbol};

/// Longest possible code: a chain tree over all 257 symbols.
pub const MAX_CODE_LEN: usize = SYMBOL_COUNT - 1;

const WORDS: usize = MAX_CODE_LEN.div_ceil(64);

// ---------------------------------------------------------------------------
// Code
// ---------------------------------------------------------------------------

/// A bit path of up to `MAX_CODE_LEN` bits, packed MSB-first into words.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Code {
    words: [u64; WORDS],
    len: u16,
}

impl Code {
    /// The empty path (the root).
    pub const EMPTY: Code = Code {
        words: [0; WORDS],
        len: 0,
    };

    /// This path extended by one edge.
    #[inline]
    fn push(mut self, bit: bool) -> Self {
        let i = self.len as usize;
        debug_assert!(i < MAX_CODE_LEN, "code longer than {MAX_CODE_LEN} bits");
        if bit {
            self.words[i / 64] |= 1 << (63 - i % 64);
        }
        self.len += 1;
        self
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit `i`, counted from the root.
    #[inline]
    pub fn bit(&self, i: usize) -> bool {
        assert!(i < self.len(), "bit {i} out of range for {}-bit code", self.len);
        (self.words[i / 64] >> (63 - i % 64)) & 1 == 1
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).map(|i| self.bit(i))
    }

    /// True if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && (0..self.len()).all(|i| self.bit(i) == other.bit(i))
    }

    /// Append this code to `w`, up to 64 bits per call.
    pub fn write_to<B: BitWrite>(&self, w: &mut B) -> io::Result<()> {
        let mut remaining = self.len();
        for &word in &self.words {
            if remaining == 0 {
                break;
            }
            let n = remaining.min(64);
            w.write(n as u32, word >> (64 - n))?;
            remaining -= n;
        }
        Ok(())
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({self})")
    }
}

// ---------------------------------------------------------------------------
// EncodingTable
// ---------------------------------------------------------------------------

/// Symbol -> code mapping, indexed by `Symbol::index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingTable {
    codes: Vec<Option<Code>>,
}

/// Flatten `tree` into an encoding table by depth-first traversal.
pub fn build_table(tree: &HuffmanTree) -> EncodingTable {
    let mut codes = vec![None; SYMBOL_COUNT];
    walk(tree.root(), Code::EMPTY, &mut codes);
    EncodingTable { codes }
}

fn walk(node: &Node, path: Code, codes: &mut [Option<Code>]) {
    match node {
        Node::Leaf(symbol) => codes[symbol.index() as usize] = Some(path),
        Node::Internal { left, right } => {
            walk(left, path.push(false), codes);
            walk(right, path.push(true), codes);
        }
    }
}

impl EncodingTable {
    pub fn get(&self, symbol: Symbol) -> Option<&Code> {
        self.codes[symbol.index() as usize].as_ref()
    }

    #[inline]
    pub fn byte(&self, b: u8) -> Option<&Code> {
        self.codes[b as usize].as_ref()
    }

    /// Number of symbols with a code.
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(symbol, code)` pairs in symbol order, end-of-stream last.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Code)> + '_ {
        self.codes.iter().enumerate().filter_map(|(i, code)| {
            let symbol = Symbol::from_index(i as u16)?;
            code.as_ref().map(|c| (symbol, c))
        })
    }

    pub fn max_code_len(&self) -> usize {
        self.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
