//! Reading map documents, and writing preferences and exports. Map documents are JSON: the
//! sequence, its topology, annotated features, and optionally ORF candidates to preview.

use std::{
    collections::HashSet,
    fs,
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    misc_types::{Feature, FeatureId, FeatureKind, GhostInterval, SeqRange, Strand},
    sequence::{SeqData, SeqTopology},
    util::color_from_hex,
};

pub mod save;
pub mod svg;

/// Used for ORF candidates that don't specify a color.
const DEFAULT_GHOST_COLOR: &str = "#888888";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid map document: {0}")]
    Parse(#[from] serde_json::Error),
}

fn default_strand() -> i8 {
    1
}

fn default_kind() -> String {
    "misc_feature".to_owned()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Assigned sequentially when missing.
    #[serde(default)]
    pub id: Option<FeatureId>,
    pub start: usize,
    pub end: usize,
    /// 1 or -1.
    #[serde(default = "default_strand")]
    pub strand: i8,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrfCandidate {
    pub start: usize,
    pub end: usize,
    #[serde(default = "default_strand")]
    pub strand: i8,
    #[serde(default)]
    pub color: Option<String>,
}

/// The on-disk shape.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MapDocument {
    #[serde(default)]
    pub name: String,
    pub sequence: String,
    #[serde(default)]
    pub topology: SeqTopology,
    #[serde(default)]
    pub features: Vec<FeatureRecord>,
    #[serde(default)]
    pub orf_candidates: Vec<OrfCandidate>,
}

/// A document, validated and converted to our own types.
#[derive(Clone, Debug, Default)]
pub struct LoadedMap {
    pub data: SeqData,
    pub features: Vec<Feature>,
    pub ghosts: Vec<GhostInterval>,
}

/// Check a span against the sequence. Reversed spans are only valid on circular sequences, where
/// they wrap through the origin.
fn check_span(start: usize, end: usize, seq_len: usize, topology: SeqTopology) -> Result<(), String> {
    if start == end {
        return Err("empty span".to_owned());
    }
    if start >= seq_len || end > seq_len {
        return Err(format!("outside the sequence (length {seq_len})"));
    }
    if start > end && topology == SeqTopology::Linear {
        return Err("start after end on a linear sequence".to_owned());
    }
    Ok(())
}

/// Sequences are indexed by byte. Non-ASCII symbols are replaced with `N`, one per character, so
/// positions still line up with the document's feature coordinates.
fn ascii_sequence(seq: &str) -> String {
    if seq.is_ascii() {
        return seq.to_owned();
    }

    let count = seq.chars().filter(|c| !c.is_ascii()).count();
    log::warn!("Replacing {count} non-ASCII symbols in the sequence with N");

    seq.chars()
        .map(|c| if c.is_ascii() { c } else { 'N' })
        .collect()
}

impl MapDocument {
    /// Convert to display types. Records with degenerate spans are skipped with a warning; bad
    /// colors fall back to the kind's palette color.
    pub fn into_map(self) -> LoadedMap {
        let data = SeqData::new(&self.name, &ascii_sequence(&self.sequence), self.topology);
        let seq_len = data.len();

        let mut features = Vec::with_capacity(self.features.len());

        // Records without an id get one past the highest given id; if that overflows, the
        // smallest unused one.
        let mut taken: HashSet<FeatureId> = self.features.iter().filter_map(|f| f.id).collect();
        let mut next_id = taken
            .iter()
            .max()
            .copied()
            .unwrap_or(0)
            .checked_add(1)
            .unwrap_or(0);

        for rec in self.features {
            if let Err(e) = check_span(rec.start, rec.end, seq_len, self.topology) {
                log::warn!(
                    "Skipping feature \"{}\" ({}..{}): {e}",
                    rec.label,
                    rec.start,
                    rec.end
                );
                continue;
            }

            let id = match rec.id {
                Some(id) => id,
                None => {
                    while taken.contains(&next_id) {
                        next_id = next_id.wrapping_add(1);
                    }
                    taken.insert(next_id);
                    next_id
                }
            };

            if features.iter().any(|f: &Feature| f.id == id) {
                log::warn!("Skipping feature with duplicate id {id}");
                continue;
            }

            let color_override = rec.color.as_deref().and_then(|c| match color_from_hex(c) {
                Ok(v) => Some(v),
                Err(_) => {
                    log::warn!("Invalid color \"{c}\" on feature {id}");
                    None
                }
            });

            features.push(Feature {
                id,
                range: SeqRange::new(rec.start, rec.end),
                strand: Strand::from_sign(rec.strand),
                kind: FeatureKind::from_external_str(&rec.kind),
                label: rec.label,
                color_override,
            });
        }

        let mut ghosts = Vec::with_capacity(self.orf_candidates.len());
        for orf in self.orf_candidates {
            if let Err(e) = check_span(orf.start, orf.end, seq_len, self.topology) {
                log::warn!("Skipping ORF candidate {}..{}: {e}", orf.start, orf.end);
                continue;
            }

            let color = orf
                .color
                .as_deref()
                .and_then(|c| color_from_hex(c).ok())
                .or_else(|| color_from_hex(DEFAULT_GHOST_COLOR).ok())
                .unwrap_or(FeatureKind::Orf.color());

            ghosts.push(GhostInterval {
                range: SeqRange::new(orf.start, orf.end),
                strand: Strand::from_sign(orf.strand),
                color,
            });
        }

        LoadedMap {
            data,
            features,
            ghosts,
        }
    }
}

pub fn parse_map_document(text: &str) -> Result<LoadedMap, LoadError> {
    let doc: MapDocument = serde_json::from_str(text)?;
    Ok(doc.into_map())
}

/// Load a map document from a JSON file.
pub fn load_map_document(path: &Path) -> Result<LoadedMap, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;

    let result = parse_map_document(&text)?;

    log::info!(
        "Loaded {} from {}: {} bp, {} features, {} ORF candidates",
        result.data.name,
        path.display(),
        result.data.len(),
        result.features.len(),
        result.ghosts.len()
    );
    Ok(result)
}

/// There's no name in the document; use the filename.
pub fn name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use eframe::egui::Color32;

    use super::*;

    const DOC: &str = r##"{
        "name": "pTest",
        "sequence": "ATGAAACCCGGGTTTTAA",
        "topology": "circular",
        "features": [
            {"id": 7, "start": 0, "end": 6, "strand": 1, "type": "CDS", "label": "lacZ", "color": "#ff0000"},
            {"start": 15, "end": 3, "strand": -1, "type": "promoter"},
            {"start": 4, "end": 4, "type": "gene", "label": "empty"},
            {"start": 2, "end": 40, "type": "gene", "label": "too long"},
            {"start": 9, "end": 12, "type": "mystery", "color": "not a color"}
        ],
        "orf_candidates": [
            {"start": 0, "end": 18, "strand": 1, "color": "#00ff00"},
            {"start": 5, "end": 5}
        ]
    }"##;

    #[test]
    fn test_parse_document() {
        let map = parse_map_document(DOC).unwrap();

        assert_eq!(map.data.name, "pTest");
        assert_eq!(map.data.len(), 18);
        assert_eq!(map.data.topology, SeqTopology::Circular);

        // The empty and out-of-range records are dropped.
        assert_eq!(map.features.len(), 3);

        let lacz = &map.features[0];
        assert_eq!(lacz.id, 7);
        assert_eq!(lacz.kind, FeatureKind::CodingRegion);
        assert_eq!(lacz.color(), Color32::from_rgb(255, 0, 0));

        let promoter = &map.features[1];
        assert_eq!(promoter.id, 8);
        assert_eq!(promoter.strand, Strand::Reverse);
        assert!(promoter.range.wraps());

        let unknown = &map.features[2];
        assert_eq!(unknown.kind, FeatureKind::Unknown);
        assert_eq!(unknown.color_override, None);

        assert_eq!(map.ghosts.len(), 1);
        assert_eq!(map.ghosts[0].color, Color32::from_rgb(0, 255, 0));
    }

    #[test]
    fn test_linear_rejects_reversed_span() {
        let doc = r#"{"sequence": "ACGTACGT", "topology": "linear",
            "features": [{"start": 6, "end": 2}, {"start": 2, "end": 6}]}"#;
        let map = parse_map_document(doc).unwrap();

        assert_eq!(map.features.len(), 1);
        assert_eq!(map.features[0].range, SeqRange::new(2, 6));
        assert_eq!(map.features[0].kind, FeatureKind::Generic);
    }

    #[test]
    fn test_assigned_id_after_max_id() {
        let doc = r#"{"sequence": "ACGTACGT", "features": [
            {"id": 18446744073709551615, "start": 1, "end": 3},
            {"start": 2, "end": 6},
            {"id": 0, "start": 4, "end": 5},
            {"start": 5, "end": 7}]}"#;
        let map = parse_map_document(doc).unwrap();

        let ids: Vec<FeatureId> = map.features.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![u64::MAX, 1, 0, 2]);
    }

    #[test]
    fn test_non_ascii_sequence() {
        let doc = r#"{"sequence": "ACGTµACGT", "features": [{"start": 3, "end": 6}]}"#;
        let map = parse_map_document(doc).unwrap();

        // One symbol per character.
        assert_eq!(map.data.len(), 9);
        assert_eq!(map.data.symbol_at(4), Some(b'N'));
        assert_eq!(map.data.subseq(map.features[0].range), "TNA");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_map_document("{\"name\": 3"),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = load_map_document(Path::new("/nonexistent/map.json"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        fs::write(&path, DOC).unwrap();

        let map = load_map_document(&path).unwrap();
        assert_eq!(map.features.len(), 3);
        assert_eq!(name_from_path(&path), "p");
    }
}
