//! The standard genetic code, used for the translated codon layer at high zoom.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AminoAcid {
    Arg,
    His,
    Lys,
    Asp,
    Glu,
    Ser,
    Thr,
    Asn,
    Gln,
    Cys,
    Gly,
    Pro,
    Ala,
    Val,
    Ile,
    Leu,
    Met,
    Phe,
    Tyr,
    Trp,
}

/// The result of translating one codon.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CodonTranslation {
    AminoAcid(AminoAcid),
    Stop,
    /// The codon contains a symbol outside A/C/G/T(U).
    Unknown,
}

impl AminoAcid {
    pub fn ident_single_letter(&self) -> char {
        match self {
            Self::Arg => 'R',
            Self::His => 'H',
            Self::Lys => 'K',
            Self::Asp => 'D',
            Self::Glu => 'E',
            Self::Ser => 'S',
            Self::Thr => 'T',
            Self::Asn => 'N',
            Self::Gln => 'Q',
            Self::Cys => 'C',
            Self::Gly => 'G',
            Self::Pro => 'P',
            Self::Ala => 'A',
            Self::Val => 'V',
            Self::Ile => 'I',
            Self::Leu => 'L',
            Self::Met => 'M',
            Self::Phe => 'F',
            Self::Tyr => 'Y',
            Self::Trp => 'W',
        }
    }
}

impl CodonTranslation {
    pub fn ident_single_letter(&self) -> char {
        match self {
            Self::AminoAcid(aa) => aa.ident_single_letter(),
            Self::Stop => '*',
            Self::Unknown => '?',
        }
    }

    pub fn is_stop(&self) -> bool {
        *self == Self::Stop
    }
}

/// Index of a nucleotide in TCAG order; U is read as T.
fn base_index(symbol: u8) -> Option<usize> {
    match symbol.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

// The standard code in TCAG order: first base selects a block of 16, second a block of 4.
const CODE: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

fn amino_acid_from_letter(letter: u8) -> Option<AminoAcid> {
    use AminoAcid::*;

    Some(match letter {
        b'R' => Arg,
        b'H' => His,
        b'K' => Lys,
        b'D' => Asp,
        b'E' => Glu,
        b'S' => Ser,
        b'T' => Thr,
        b'N' => Asn,
        b'Q' => Gln,
        b'C' => Cys,
        b'G' => Gly,
        b'P' => Pro,
        b'A' => Ala,
        b'V' => Val,
        b'I' => Ile,
        b'L' => Leu,
        b'M' => Met,
        b'F' => Phe,
        b'Y' => Tyr,
        b'W' => Trp,
        _ => return None,
    })
}

/// Translate a codon, 5' to 3'. Case-insensitive.
pub fn translate_codon(codon: [u8; 3]) -> CodonTranslation {
    let (Some(a), Some(b), Some(c)) = (
        base_index(codon[0]),
        base_index(codon[1]),
        base_index(codon[2]),
    ) else {
        return CodonTranslation::Unknown;
    };

    let letter = CODE[a * 16 + b * 4 + c];
    if letter == b'*' {
        return CodonTranslation::Stop;
    }

    match amino_acid_from_letter(letter) {
        Some(aa) => CodonTranslation::AminoAcid(aa),
        None => CodonTranslation::Unknown,
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = match self {
            Self::Arg => "Arg",
            Self::His => "His",
            Self::Lys => "Lys",
            Self::Asp => "Asp",
            Self::Glu => "Glu",
            Self::Ser => "Ser",
            Self::Thr => "Thr",
            Self::Asn => "Asn",
            Self::Gln => "Gln",
            Self::Cys => "Cys",
            Self::Gly => "Gly",
            Self::Pro => "Pro",
            Self::Ala => "Ala",
            Self::Val => "Val",
            Self::Ile => "Ile",
            Self::Leu => "Leu",
            Self::Met => "Met",
            Self::Phe => "Phe",
            Self::Tyr => "Tyr",
            Self::Trp => "Trp",
        };

        write!(f, "{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codons() {
        assert_eq!(
            translate_codon(*b"ATG"),
            CodonTranslation::AminoAcid(AminoAcid::Met)
        );
        assert_eq!(
            translate_codon(*b"tgg"),
            CodonTranslation::AminoAcid(AminoAcid::Trp)
        );
        assert_eq!(
            translate_codon(*b"GCU"),
            CodonTranslation::AminoAcid(AminoAcid::Ala)
        );
        assert_eq!(translate_codon(*b"ANG"), CodonTranslation::Unknown);
    }

    #[test]
    fn test_stop_codons() {
        for codon in [*b"TAA", *b"TAG", *b"TGA"] {
            assert!(translate_codon(codon).is_stop());
        }
    }

    #[test]
    fn test_table_is_complete() {
        let bases = [b'T', b'C', b'A', b'G'];
        let mut stops = 0;

        for a in bases {
            for b in bases {
                for c in bases {
                    match translate_codon([a, b, c]) {
                        CodonTranslation::Stop => stops += 1,
                        CodonTranslation::AminoAcid(_) => (),
                        CodonTranslation::Unknown => panic!("Unmapped codon"),
                    }
                }
            }
        }
        assert_eq!(stops, 3);
    }
}
