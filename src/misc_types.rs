//! This module contains fundamental data structures, eg related to features and ranges.

use eframe::egui::Color32;
use strum_macros::EnumIter;

use crate::sequence::SeqTopology;

pub type FeatureId = u64;

/// Default band thickness, in pixels, for kinds we don't recognize.
pub const DEFAULT_THICKNESS: f32 = 8.;

/// A closed set of feature kinds. Each carries its drawing thickness, palette color, and whether
/// it is drawn with an arrowhead.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter)]
pub enum FeatureKind {
    /// Ie, a coding region.
    CodingRegion,
    Gene,
    Transcript,
    Promoter,
    Terminator,
    RibosomeBindSite,
    Ori,
    PrimerBind,
    Regulatory,
    SignalPeptide,
    MiscBinding,
    /// Ie operators.
    ProteinBind,
    Utr5,
    Utr3,
    Generic,
    /// An open reading frame found by detection, rather than annotated by a person.
    Orf,
    /// We couldn't parse the type string.
    Unknown,
}

impl Default for FeatureKind {
    fn default() -> Self {
        Self::Generic
    }
}

impl FeatureKind {
    /// For displaying in the UI
    pub fn to_string(self) -> String {
        match self {
            Self::CodingRegion => "Coding region",
            Self::Gene => "Gene",
            Self::Transcript => "Transcript",
            Self::Promoter => "Promoter",
            Self::Terminator => "Terminator",
            Self::RibosomeBindSite => "Ribosome bind site",
            Self::Ori => "Origin of replication",
            Self::PrimerBind => "Primer bind",
            Self::Regulatory => "Regulatory",
            Self::SignalPeptide => "Signal peptide",
            Self::MiscBinding => "Binding site",
            Self::ProteinBind => "Operator",
            Self::Utr5 => "5' UTR",
            Self::Utr3 => "3' UTR",
            Self::Generic => "Generic",
            Self::Orf => "ORF",
            Self::Unknown => "Unknown",
        }
        .to_owned()
    }

    /// Parse from the type strings used by GenBank-derived feature lists.
    pub fn from_external_str(v: &str) -> Self {
        let v = &v.trim().to_lowercase();

        match v.as_ref() {
            "cds" => Self::CodingRegion,
            "gene" => Self::Gene,
            "mrna" | "transcript" => Self::Transcript,
            "promoter" => Self::Promoter,
            "terminator" => Self::Terminator,
            "rbs" => Self::RibosomeBindSite,
            "rep_origin" | "ori" => Self::Ori,
            "primer_bind" => Self::PrimerBind,
            "regulatory" => Self::Regulatory,
            "sig_peptide" => Self::SignalPeptide,
            "misc_binding" => Self::MiscBinding,
            "protein_bind" => Self::ProteinBind,
            "5'utr" => Self::Utr5,
            "3'utr" => Self::Utr3,
            "misc_feature" => Self::Generic,
            "orf" => Self::Orf,
            _ => Self::Unknown,
        }
    }

    /// Band thickness in pixels, at normal zoom.
    pub fn thickness(self) -> f32 {
        match self {
            Self::CodingRegion | Self::Gene => 12.,
            Self::Transcript | Self::Promoter | Self::Ori => 10.,
            Self::Terminator | Self::Regulatory | Self::SignalPeptide | Self::Generic => 8.,
            Self::RibosomeBindSite
            | Self::PrimerBind
            | Self::MiscBinding
            | Self::ProteinBind
            | Self::Utr5
            | Self::Utr3
            | Self::Orf => 6.,
            Self::Unknown => DEFAULT_THICKNESS,
        }
    }

    /// Directional kinds get an arrowhead pointing along their strand.
    pub fn is_directional(self) -> bool {
        matches!(
            self,
            Self::CodingRegion
                | Self::Gene
                | Self::Transcript
                | Self::Promoter
                | Self::PrimerBind
                | Self::SignalPeptide
                | Self::Orf
        )
    }

    /// Algorithmically generated kinds get the lowest label priority.
    pub fn is_generated(self) -> bool {
        self == Self::Orf
    }

    pub fn color(self) -> Color32 {
        match self {
            Self::CodingRegion | Self::Gene => Color32::from_rgb(0x4a, 0x90, 0xd9),
            Self::Transcript => Color32::from_rgb(0x34, 0x98, 0xdb),
            Self::Promoter => Color32::from_rgb(0x5c, 0xb8, 0x5c),
            Self::Terminator => Color32::from_rgb(0xd9, 0x53, 0x4f),
            Self::RibosomeBindSite => Color32::from_rgb(0xf0, 0xad, 0x4e),
            Self::Ori => Color32::from_rgb(0x9b, 0x59, 0xb6),
            Self::PrimerBind => Color32::from_rgb(0x1a, 0xbc, 0x9c),
            Self::Regulatory => Color32::from_rgb(0xe6, 0x7e, 0x22),
            Self::SignalPeptide => Color32::from_rgb(0x34, 0x98, 0xdb),
            Self::MiscBinding => Color32::from_rgb(0x16, 0xa0, 0x85),
            Self::ProteinBind => Color32::from_rgb(0x8e, 0x44, 0xad),
            Self::Utr5 => Color32::from_rgb(0x27, 0xae, 0x60),
            Self::Utr3 => Color32::from_rgb(0xc0, 0x39, 0x2b),
            Self::Orf => Color32::from_rgb(0x66, 0xb2, 0xff),
            Self::Generic | Self::Unknown => Color32::from_rgb(0x95, 0xa5, 0xa6),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl Strand {
    /// From the +1/-1 convention. Anything non-negative is forward.
    pub fn from_sign(v: i8) -> Self {
        if v < 0 {
            Self::Reverse
        } else {
            Self::Forward
        }
    }
}

/// A half-open range of positions, `[start, end)`. On circular sequences, `start > end` wraps
/// through the origin.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SeqRange {
    pub start: usize,
    pub end: usize,
}

impl SeqRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Build a selection; an empty selection is not representable, so `start == end` is `None`.
    pub fn selection(start: usize, end: usize) -> Option<Self> {
        if start == end {
            None
        } else {
            Some(Self { start, end })
        }
    }

    pub fn wraps(&self) -> bool {
        self.start > self.end
    }

    /// Number of positions covered. Wrapping ranges count through the origin; a reversed range on
    /// a linear sequence is degenerate, and has length 0.
    pub fn len(&self, seq_len: usize, topology: SeqTopology) -> usize {
        if self.start <= self.end {
            self.end - self.start
        } else if topology == SeqTopology::Circular {
            seq_len - self.start + self.end
        } else {
            0
        }
    }

    /// Wraparound-aware midpoint, as a fractional position in [0, seq_len).
    pub fn midpoint(&self, seq_len: usize, topology: SeqTopology) -> f32 {
        if seq_len == 0 {
            return 0.;
        }
        let mid = self.start as f32 + self.len(seq_len, topology) as f32 / 2.;
        mid % seq_len as f32
    }

    pub fn contains(&self, pos: usize, topology: SeqTopology) -> bool {
        if self.start <= self.end {
            pos >= self.start && pos < self.end
        } else if topology == SeqTopology::Circular {
            pos >= self.start || pos < self.end
        } else {
            false
        }
    }

    /// The same range as one or two non-wrapping pieces.
    #[cfg(test)]
    pub fn pieces(&self, seq_len: usize) -> Vec<(usize, usize)> {
        if self.start <= self.end {
            vec![(self.start, self.end)]
        } else {
            vec![(self.start, seq_len), (0, self.end)]
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    /// 0-based, half-open.
    pub range: SeqRange,
    pub strand: Strand,
    pub kind: FeatureKind,
    pub label: String,
    /// By default, we display features using kind-specific color. Allow the document
    /// to override this.
    pub color_override: Option<Color32>,
}

impl Feature {
    pub fn new(id: FeatureId, start: usize, end: usize, kind: FeatureKind) -> Self {
        Self {
            id,
            range: SeqRange::new(start, end),
            strand: Strand::Forward,
            kind,
            label: String::new(),
            color_override: None,
        }
    }

    pub fn label(&self) -> String {
        if self.label.is_empty() {
            self.kind.to_string()
        } else {
            self.label.clone()
        }
    }

    /// Get the color to draw; kind color, unless overridden.
    pub fn color(&self) -> Color32 {
        match self.color_override {
            Some(c) => c,
            None => self.kind.color(),
        }
    }

    pub fn span(&self, seq_len: usize, topology: SeqTopology) -> usize {
        self.range.len(seq_len, topology)
    }

    /// Formats the indexes, and size of this feature.
    pub fn location_descrip(&self, seq_len: usize, topology: SeqTopology) -> String {
        format!(
            "{}..{}  {} bp",
            self.range.start + 1,
            self.range.end,
            self.span(seq_len, topology)
        )
    }
}

/// A candidate interval that hasn't been committed as a feature, eg a detected ORF. Drawn as a
/// dashed preview; not laid out on tracks, and not hit-testable.
#[derive(Clone, Debug, PartialEq)]
pub struct GhostInterval {
    pub range: SeqRange,
    pub strand: Strand,
    pub color: Color32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraparound_length() {
        let feature = Feature::new(1, 900, 50, FeatureKind::Generic);
        assert_eq!(feature.span(1_000, SeqTopology::Circular), 150);
        assert_eq!(feature.span(1_000, SeqTopology::Linear), 0);
    }

    #[test]
    fn test_wraparound_midpoint() {
        let range = SeqRange::new(900, 50);
        assert!((range.midpoint(1_000, SeqTopology::Circular) - 975.).abs() < 1e-3);

        let range = SeqRange::new(950, 150);
        assert!((range.midpoint(1_000, SeqTopology::Circular) - 50.).abs() < 1e-3);
    }

    #[test]
    fn test_selection_collapse() {
        assert_eq!(SeqRange::selection(10, 10), None);
        assert_eq!(SeqRange::selection(10, 12), Some(SeqRange::new(10, 12)));
    }

    #[test]
    fn test_contains_wraps() {
        let range = SeqRange::new(900, 50);
        assert!(range.contains(950, SeqTopology::Circular));
        assert!(range.contains(10, SeqTopology::Circular));
        assert!(!range.contains(50, SeqTopology::Circular));
        assert!(!range.contains(500, SeqTopology::Circular));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(FeatureKind::from_external_str("CDS"), FeatureKind::CodingRegion);
        assert_eq!(FeatureKind::from_external_str("rep_origin"), FeatureKind::Ori);
        assert_eq!(FeatureKind::from_external_str("5'UTR"), FeatureKind::Utr5);
        assert_eq!(FeatureKind::from_external_str("mystery"), FeatureKind::Unknown);
        assert_eq!(FeatureKind::Unknown.thickness(), DEFAULT_THICKNESS);
        assert!(FeatureKind::Promoter.is_directional());
        assert!(!FeatureKind::Terminator.is_directional());
    }
}
