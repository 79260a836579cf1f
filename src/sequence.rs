//! The sequence being displayed: symbols, topology, and helpers that work on raw symbols.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::misc_types::SeqRange;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeqTopology {
    Linear,
    Circular,
}

impl Default for SeqTopology {
    fn default() -> Self {
        Self::Circular
    }
}

impl SeqTopology {
    pub fn to_string(self) -> String {
        match self {
            Self::Linear => "linear",
            Self::Circular => "circular",
        }
        .to_owned()
    }
}

/// The sequence string and its topology. Immutable for the duration of a render.
#[derive(Clone, Default, Debug)]
pub struct SeqData {
    pub name: String,
    /// Index 0: 5' end. Stored as given; symbols are not validated.
    pub seq: String,
    pub topology: SeqTopology,
}

impl SeqData {
    pub fn new(name: &str, seq: &str, topology: SeqTopology) -> Self {
        Self {
            name: name.to_owned(),
            seq: seq.to_owned(),
            topology,
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn is_circular(&self) -> bool {
        self.topology == SeqTopology::Circular
    }

    /// Symbol at a position, wrapping on circular sequences.
    pub fn symbol_at(&self, i: usize) -> Option<u8> {
        let bytes = self.seq.as_bytes();
        if bytes.is_empty() {
            return None;
        }

        if self.is_circular() {
            Some(bytes[i % bytes.len()])
        } else {
            bytes.get(i).copied()
        }
    }

    /// Sequence text of a half-open range, respecting wraparound on circular sequences.
    /// Returns an empty string for ranges that are out of bounds.
    pub fn subseq(&self, range: SeqRange) -> String {
        let len = self.len();
        if range.start >= len || range.end > len {
            return String::new();
        }

        let part = |a: usize, b: usize| self.seq.get(a..b).unwrap_or_default();

        if range.start <= range.end {
            part(range.start, range.end).to_owned()
        } else if self.is_circular() {
            let mut result = part(range.start, len).to_owned();
            result.push_str(part(0, range.end));
            result
        } else {
            String::new()
        }
    }

    /// Nucleic-acid sequences get a complement strand and codon translation at high zoom.
    pub fn is_nucleic_acid(&self) -> bool {
        !self.seq.is_empty()
            && self
                .seq
                .bytes()
                .all(|b| matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'U' | b'N'))
    }
}

/// Fixed pairing table. Case is preserved; anything outside A/C/G/T(U) pairs with N.
pub fn complement(symbol: u8) -> u8 {
    let result = match symbol.to_ascii_uppercase() {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        _ => b'N',
    };

    if symbol.is_ascii_lowercase() {
        result.to_ascii_lowercase()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complement() {
        assert_eq!(complement(b'A'), b'T');
        assert_eq!(complement(b'g'), b'c');
        assert_eq!(complement(b'U'), b'A');
        assert_eq!(complement(b'X'), b'N');
    }

    #[test]
    fn test_subseq_wraps_on_circular() {
        let data = SeqData::new("p", "AACCGGTT", SeqTopology::Circular);
        assert_eq!(data.subseq(SeqRange::new(2, 4)), "CC");
        assert_eq!(data.subseq(SeqRange::new(6, 2)), "TTAA");

        let linear = SeqData::new("l", "AACCGGTT", SeqTopology::Linear);
        assert_eq!(linear.subseq(SeqRange::new(6, 2)), "");
    }

    #[test]
    fn test_symbol_at() {
        let data = SeqData::new("p", "ACG", SeqTopology::Circular);
        assert_eq!(data.symbol_at(4), Some(b'C'));

        let linear = SeqData::new("l", "ACG", SeqTopology::Linear);
        assert_eq!(linear.symbol_at(4), None);
    }

    #[test]
    fn test_nucleic_detection() {
        assert!(SeqData::new("", "acgtn", SeqTopology::Linear).is_nucleic_acid());
        assert!(!SeqData::new("", "MKLV", SeqTopology::Linear).is_nucleic_acid());
    }
}
