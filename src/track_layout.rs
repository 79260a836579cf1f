//! Assigns features to non-overlapping lanes: concentric rings on circular maps, rows on linear
//! ones. This is greedy interval partitioning; with features sorted by start, first-fit uses the
//! minimum number of tracks.

use std::cmp::Reverse;

use crate::{misc_types::Feature, sequence::SeqTopology};

#[derive(Clone, Copy, Debug)]
pub struct TrackedFeature<'a> {
    pub feature: &'a Feature,
    pub track: usize,
}

#[derive(Clone, Debug, Default)]
pub struct TrackLayout<'a> {
    /// In placement order: ascending start.
    pub placed: Vec<TrackedFeature<'a>>,
    pub num_tracks: usize,
}

#[derive(Clone, Copy)]
struct Track {
    /// End of the last feature placed, unwrapped; may exceed the sequence length.
    end: usize,
    /// Start of the first feature placed; the lowest start on this track.
    first_start: usize,
}

/// Lay out features on tracks. Wrapping features are unwrapped to `[start, start + span)`; their
/// tail past the origin must not reach the first feature of the track they join.
pub fn layout_tracks(features: &[Feature], seq_len: usize, topology: SeqTopology) -> TrackLayout {
    let mut order: Vec<(&Feature, usize)> = features
        .iter()
        .map(|f| (f, f.span(seq_len, topology)))
        .collect();

    // Ties on start: longer features first, so short ones stack beside them predictably.
    order.sort_by_key(|(f, span)| (f.range.start, Reverse(*span)));

    let mut tracks: Vec<Track> = Vec::new();
    let mut placed = Vec::with_capacity(order.len());

    for (feature, span) in order {
        let start = feature.range.start;
        let end = start + span;
        let wrapped_tail = end.saturating_sub(seq_len);

        let fits = |t: &Track| t.end <= start && (wrapped_tail == 0 || t.first_start >= wrapped_tail);

        let track = match tracks.iter().position(fits) {
            Some(i) => {
                tracks[i].end = end;
                i
            }
            None => {
                tracks.push(Track {
                    end,
                    first_start: start,
                });
                tracks.len() - 1
            }
        };

        placed.push(TrackedFeature { feature, track });
    }

    log::trace!(
        "Laid out {} features on {} tracks",
        placed.len(),
        tracks.len()
    );

    TrackLayout {
        placed,
        num_tracks: tracks.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::misc_types::{FeatureId, FeatureKind, SeqRange};

    fn track_of(layout: &TrackLayout, id: FeatureId) -> Option<usize> {
        layout
            .placed
            .iter()
            .find(|p| p.feature.id == id)
            .map(|p| p.track)
    }

    fn feature(id: FeatureId, start: usize, end: usize) -> Feature {
        Feature::new(id, start, end, FeatureKind::Generic)
    }

    fn pieces_overlap(a: &SeqRange, b: &SeqRange, seq_len: usize) -> bool {
        for (a0, a1) in a.pieces(seq_len) {
            for (b0, b1) in b.pieces(seq_len) {
                if a0 < b1 && b0 < a1 {
                    return true;
                }
            }
        }
        false
    }

    fn assert_no_overlap(layout: &TrackLayout, seq_len: usize) {
        for (i, a) in layout.placed.iter().enumerate() {
            for b in &layout.placed[i + 1..] {
                if a.track == b.track {
                    assert!(
                        !pieces_overlap(&a.feature.range, &b.feature.range, seq_len),
                        "Features {} and {} share track {}",
                        a.feature.id,
                        b.feature.id,
                        a.track
                    );
                }
            }
        }
    }

    #[test]
    fn test_overlapping_pair() {
        let features = vec![feature(1, 100, 300), feature(2, 200, 400)];
        let layout = layout_tracks(&features, 1_000, SeqTopology::Circular);

        assert_eq!(track_of(&layout, 1), Some(0));
        assert_eq!(track_of(&layout, 2), Some(1));
        assert_eq!(layout.num_tracks, 2);
    }

    #[test]
    fn test_disjoint_chain_shares_one_track() {
        let features: Vec<Feature> = (0..5)
            .map(|i| feature(i, i as usize * 100, i as usize * 100 + 100))
            .collect();
        let layout = layout_tracks(&features, 1_000, SeqTopology::Linear);

        assert_eq!(layout.num_tracks, 1);
        assert!(layout.placed.iter().all(|p| p.track == 0));
    }

    #[test]
    fn test_pairwise_overlapping_needs_n_tracks() {
        let features: Vec<Feature> = (0..6).map(|i| feature(i, 10 * i as usize, 500)).collect();
        let layout = layout_tracks(&features, 1_000, SeqTopology::Linear);

        assert_eq!(layout.num_tracks, 6);
        assert_no_overlap(&layout, 1_000);
    }

    #[test]
    fn test_wrapping_feature_avoids_features_near_origin() {
        let features = vec![
            feature(1, 0, 40),
            feature(2, 100, 200),
            feature(3, 900, 50), // Wraps; overlaps feature 1.
            feature(4, 60, 90),
        ];
        let layout = layout_tracks(&features, 1_000, SeqTopology::Circular);

        assert_no_overlap(&layout, 1_000);
        assert_ne!(track_of(&layout, 1), track_of(&layout, 3));
    }

    #[test]
    fn test_wrapping_feature_can_share_when_clear() {
        let features = vec![feature(1, 100, 200), feature(2, 900, 50)];
        let layout = layout_tracks(&features, 1_000, SeqTopology::Circular);

        assert_eq!(layout.num_tracks, 1);
        assert_no_overlap(&layout, 1_000);
    }

    #[test]
    fn test_mixed_set_never_overlaps() {
        let seq_len = 5_000;
        let features: Vec<Feature> = (0..60)
            .map(|i| {
                let start = (i * 379) % seq_len;
                let end = (start + 150 + (i * 97) % 900) % seq_len;
                feature(i as FeatureId, start, end)
            })
            .collect();
        let layout = layout_tracks(&features, seq_len, SeqTopology::Circular);

        assert_eq!(layout.placed.len(), 60);
        assert_no_overlap(&layout, seq_len);
    }
}
