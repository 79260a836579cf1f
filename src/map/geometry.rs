//! Per-frame layout: where the backbone, lanes, sequence rows and each feature band sit. The draw
//! passes and hit testing both read from this, so what's clickable is always what's drawn.

use core::f32::consts::TAU;

use eframe::egui::{Pos2, Rect};

use crate::{
    labels::LabelRecord,
    map::MapConfig,
    misc_types::{Feature, FeatureId, FeatureKind, SeqRange, Strand, DEFAULT_THICKNESS},
    projection::{CircleFrame, LinearFrame, Projection},
    sequence::{SeqData, SeqTopology},
    track_layout::layout_tracks,
};

pub const TRACK_GAP: f32 = 4.;
/// Space between the backbone and the first lane.
pub const BACKBONE_CLEARANCE: f32 = 8.;
/// At high zoom, bands are at least this thick, so they stay easy to hit.
pub const HIGH_ZOOM_MIN_THICKNESS: f32 = 14.;

pub const BACKBONE_HIT_TOLERANCE: f32 = 10.;
pub const FEATURE_HIT_TOLERANCE: f32 = 2.;
/// Distance from an external label's anchor point that counts as a click on it.
pub const LABEL_HIT_RADIUS: f32 = 12.;

// Sequence letters are shown once each position gets this much room, past this zoom.
pub const SEQ_MIN_PX_PER_BP: f32 = 9.;
pub const SEQ_MIN_ZOOM: f32 = 8.;

// Distance of the sequence rows from the backbone: forward strand, reverse strand, translation.
pub const SEQ_ROW_OFFSETS_CIRCLE: [f32; 3] = [36., 50., 66.];
pub const SEQ_ROW_OFFSETS_LINEAR: [f32; 3] = [16., 30., 46.];
/// On linear maps with sequence shown, lanes start below the sequence rows.
const SEQ_BLOCK_LINEAR: f32 = 56.;

pub fn feature_thickness(kind: FeatureKind, high_zoom: bool) -> f32 {
    if high_zoom {
        kind.thickness().max(HIGH_ZOOM_MIN_THICKNESS)
    } else {
        kind.thickness()
    }
}

/// Where lanes go: lane `k` spans `origin + direction * [k, k + 1) * pitch`. Radii on circular
/// maps; y coordinates on linear ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneParams {
    pub origin: f32,
    pub pitch: f32,
    /// 1 for outward or downward, -1 for inward.
    pub direction: f32,
    pub high_zoom: bool,
}

impl LaneParams {
    /// The lane region's extent, `(low, high)`.
    pub fn extent(&self, num_tracks: usize) -> (f32, f32) {
        let far = self.origin + self.direction * num_tracks as f32 * self.pitch;
        (self.origin.min(far), self.origin.max(far))
    }
}

/// One feature's band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureGeom {
    pub id: FeatureId,
    pub track: usize,
    pub range: SeqRange,
    pub strand: Strand,
    pub directional: bool,
    pub thickness: f32,
    /// Band edges; radii or y coordinates, `lo < hi`.
    pub lo: f32,
    pub hi: f32,
}

impl FeatureGeom {
    pub fn mid(&self) -> f32 {
        (self.lo + self.hi) / 2.
    }
}

/// The band geometry of a feature on a track. Each feature is centered in its lane.
pub fn feature_geometry(params: &LaneParams, feature: &Feature, track: usize) -> FeatureGeom {
    let thickness = feature_thickness(feature.kind, params.high_zoom);
    let lane_mid = params.origin + params.direction * (track as f32 + 0.5) * params.pitch;

    FeatureGeom {
        id: feature.id,
        track,
        range: feature.range,
        strand: feature.strand,
        directional: feature.kind.is_directional(),
        thickness,
        lo: lane_mid - thickness / 2.,
        hi: lane_mid + thickness / 2.,
    }
}

#[derive(Clone, Debug)]
pub enum MapGeometry {
    Circle(CircleFrame),
    Linear(LinearFrame),
}

#[derive(Clone, Debug)]
pub struct FrameLayout {
    pub geometry: MapGeometry,
    pub topology: SeqTopology,
    pub seq_len: usize,
    pub lanes: LaneParams,
    pub num_tracks: usize,
    /// In track order, then by start.
    pub features: Vec<FeatureGeom>,
    /// Sequence letters and translation are drawn this frame.
    pub show_sequence: bool,
    /// External labels placed by the last render; filled in after the draw passes.
    pub labels: Vec<LabelRecord>,
}

impl FrameLayout {
    pub fn new(
        projection: &Projection,
        viewport: Rect,
        data: &SeqData,
        features: &[Feature],
        config: &MapConfig,
    ) -> Self {
        let seq_len = data.len();
        let topology = data.topology;

        let geometry = match topology {
            SeqTopology::Circular => {
                MapGeometry::Circle(CircleFrame::new(projection, viewport, seq_len))
            }
            SeqTopology::Linear => {
                MapGeometry::Linear(LinearFrame::new(projection, viewport, seq_len))
            }
        };

        let (high_zoom, px_per_bp, zoom) = match &geometry {
            MapGeometry::Circle(f) => (f.is_high_zoom(), f.px_per_bp(), f.zoom),
            MapGeometry::Linear(f) => (f.is_high_zoom(), f.px_per_bp(), f.zoom),
        };

        let show_sequence = config.show_sequence
            && zoom >= SEQ_MIN_ZOOM
            && px_per_bp >= SEQ_MIN_PX_PER_BP
            && data.is_nucleic_acid();

        let tracks = layout_tracks(features, seq_len, topology);

        let max_thickness = tracks
            .placed
            .iter()
            .map(|p| feature_thickness(p.feature.kind, high_zoom))
            .fold(0., f32::max);

        let pitch = if max_thickness > 0. {
            max_thickness + TRACK_GAP
        } else {
            DEFAULT_THICKNESS + TRACK_GAP
        };

        let lanes = match &geometry {
            MapGeometry::Circle(f) => {
                if high_zoom {
                    LaneParams {
                        origin: f.radius + BACKBONE_CLEARANCE,
                        pitch,
                        direction: 1.,
                        high_zoom,
                    }
                } else {
                    LaneParams {
                        origin: f.radius - BACKBONE_CLEARANCE,
                        pitch,
                        direction: -1.,
                        high_zoom,
                    }
                }
            }
            MapGeometry::Linear(f) => LaneParams {
                origin: f.backbone_y
                    + if show_sequence {
                        SEQ_BLOCK_LINEAR
                    } else {
                        BACKBONE_CLEARANCE
                    },
                pitch,
                direction: 1.,
                high_zoom,
            },
        };

        let mut geoms: Vec<FeatureGeom> = tracks
            .placed
            .iter()
            .map(|p| feature_geometry(&lanes, p.feature, p.track))
            .collect();
        geoms.sort_by_key(|g| (g.track, g.range.start));

        Self {
            geometry,
            topology,
            seq_len,
            lanes,
            num_tracks: tracks.num_tracks,
            features: geoms,
            show_sequence,
            labels: Vec::new(),
        }
    }

    pub fn feature(&self, id: FeatureId) -> Option<&FeatureGeom> {
        self.features.iter().find(|g| g.id == id)
    }

    /// The fractional sequence position under a screen point.
    pub fn position_at_f(&self, pos: Pos2) -> f32 {
        match &self.geometry {
            MapGeometry::Circle(f) => {
                let (angle, _) = f.angle_distance(pos);
                f.angle_to_position_f(angle)
            }
            MapGeometry::Linear(f) => f.x_to_position_f(pos.x),
        }
    }

    /// The sequence position under a screen point, rounded to the nearest boundary between
    /// positions.
    pub fn position_at(&self, pos: Pos2) -> usize {
        match &self.geometry {
            MapGeometry::Circle(f) => {
                let (angle, _) = f.angle_distance(pos);
                f.angle_to_position(angle)
            }
            MapGeometry::Linear(f) => f.x_to_position(pos.x),
        }
    }

    /// Radial distance from the center, or y coordinate; the axis lanes are laid out along.
    fn cross_axis(&self, pos: Pos2) -> f32 {
        match &self.geometry {
            MapGeometry::Circle(f) => f.angle_distance(pos).1,
            MapGeometry::Linear(_) => pos.y,
        }
    }

    fn in_sequence_bounds(&self, pos: Pos2) -> bool {
        match &self.geometry {
            MapGeometry::Circle(_) => true,
            MapGeometry::Linear(f) => pos.x >= f.left && pos.x <= f.right,
        }
    }

    /// The first feature, in track order, whose band contains the point.
    /// The feature whose band, or external label, is under a screen point.
    pub fn feature_at(&self, pos: Pos2) -> Option<FeatureId> {
        self.band_at(pos).or_else(|| self.label_at(pos))
    }

    fn band_at(&self, pos: Pos2) -> Option<FeatureId> {
        if self.seq_len == 0 || !self.in_sequence_bounds(pos) {
            return None;
        }

        let cross = self.cross_axis(pos);
        let bp = self.position_at_f(pos).floor() as usize;

        self.features
            .iter()
            .find(|g| {
                cross >= g.lo - FEATURE_HIT_TOLERANCE
                    && cross <= g.hi + FEATURE_HIT_TOLERANCE
                    && g.range.contains(bp, self.topology)
            })
            .map(|g| g.id)
    }

    /// The external label nearest a screen point, within the hit radius of its anchor.
    fn label_at(&self, pos: Pos2) -> Option<FeatureId> {
        let record = self
            .labels
            .iter()
            .map(|r| (r, r.screen_point.distance(pos)))
            .filter(|(_, d)| *d <= LABEL_HIT_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(r, _)| r)?;

        log::trace!(
            "Label hit for feature {} at {:.2}, offset {:.1}",
            record.feature_id,
            record.angle_or_x,
            record.offset_radius
        );
        Some(record.feature_id)
    }

    /// Is the point on the backbone band, where drag-selection starts.
    pub fn on_backbone(&self, pos: Pos2) -> bool {
        if self.seq_len == 0 || !self.in_sequence_bounds(pos) {
            return false;
        }

        let backbone = match &self.geometry {
            MapGeometry::Circle(f) => f.radius,
            MapGeometry::Linear(f) => f.backbone_y,
        };
        (self.cross_axis(pos) - backbone).abs() <= BACKBONE_HIT_TOLERANCE
    }

    /// Angular extent of a range, `(start, end)` with `end >= start`.
    pub fn range_angles(frame: &CircleFrame, range: SeqRange, topology: SeqTopology) -> (f32, f32) {
        let a0 = frame.position_to_angle(range.start as f32);
        let len = range.len(frame.seq_len, topology) as f32;
        (a0, a0 + len / frame.seq_len.max(1) as f32 * TAU)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;
    use crate::misc_types::FeatureKind;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800., 600.))
    }

    fn plasmid() -> (SeqData, Vec<Feature>) {
        let data = SeqData::new("p", &"ACGT".repeat(250), SeqTopology::Circular);
        let mut cds = Feature::new(1, 100, 300, FeatureKind::CodingRegion);
        cds.label = "bla".to_owned();
        let features = vec![
            cds,
            Feature::new(2, 200, 400, FeatureKind::Promoter),
            Feature::new(3, 900, 50, FeatureKind::Ori),
        ];
        (data, features)
    }

    #[test]
    fn test_lanes_inward_then_outward() {
        let (data, features) = plasmid();
        let mut proj = Projection::new(SeqTopology::Circular);
        let config = MapConfig::default();

        let low = FrameLayout::new(&proj, viewport(), &data, &features, &config);
        let MapGeometry::Circle(frame) = &low.geometry else {
            panic!("Expected a circular frame");
        };
        assert!(low.features.iter().all(|g| g.hi < frame.radius));

        proj.zoom_by(10.);
        let high = FrameLayout::new(&proj, viewport(), &data, &features, &config);
        let MapGeometry::Circle(frame) = &high.geometry else {
            panic!("Expected a circular frame");
        };
        assert!(high.features.iter().all(|g| g.lo > frame.radius));
        assert!(high
            .features
            .iter()
            .all(|g| g.thickness >= HIGH_ZOOM_MIN_THICKNESS));
    }

    #[test]
    fn test_hit_test_matches_drawn_band() {
        let (data, features) = plasmid();
        let proj = Projection::new(SeqTopology::Circular);
        let layout = FrameLayout::new(&proj, viewport(), &data, &features, &MapConfig::default());
        let MapGeometry::Circle(frame) = &layout.geometry else {
            panic!("Expected a circular frame");
        };

        for g in &layout.features {
            let mid = g.range.midpoint(1_000, SeqTopology::Circular);
            let point = frame.point_at(mid, g.mid());
            assert_eq!(layout.feature_at(point), Some(g.id));
        }

        // Between the lanes and the center, nothing.
        assert_eq!(layout.feature_at(frame.center), None);
    }

    #[test]
    fn test_wrapping_feature_hit_on_both_sides_of_origin() {
        let (data, features) = plasmid();
        let proj = Projection::new(SeqTopology::Circular);
        let layout = FrameLayout::new(&proj, viewport(), &data, &features, &MapConfig::default());
        let MapGeometry::Circle(frame) = &layout.geometry else {
            panic!("Expected a circular frame");
        };
        let g = layout.feature(3).unwrap();

        assert_eq!(layout.feature_at(frame.point_at(950., g.mid())), Some(3));
        assert_eq!(layout.feature_at(frame.point_at(25., g.mid())), Some(3));
        assert_eq!(layout.feature_at(frame.point_at(500., g.mid())), None);
    }

    #[test]
    fn test_backbone_band() {
        let (data, features) = plasmid();
        let proj = Projection::new(SeqTopology::Circular);
        let layout = FrameLayout::new(&proj, viewport(), &data, &features, &MapConfig::default());
        let MapGeometry::Circle(frame) = &layout.geometry else {
            panic!("Expected a circular frame");
        };

        assert!(layout.on_backbone(frame.point_at(600., frame.radius + 5.)));
        assert!(!layout.on_backbone(frame.point_at(600., frame.radius + 30.)));
        assert_eq!(layout.position_at(frame.point_at(600., frame.radius)), 600);
    }

    #[test]
    fn test_linear_lanes_below_backbone() {
        let data = SeqData::new("l", &"ACGT".repeat(250), SeqTopology::Linear);
        let features = vec![
            Feature::new(1, 100, 300, FeatureKind::Gene),
            Feature::new(2, 200, 400, FeatureKind::Gene),
        ];
        let proj = Projection::new(SeqTopology::Linear);
        let layout = FrameLayout::new(&proj, viewport(), &data, &features, &MapConfig::default());
        let MapGeometry::Linear(frame) = &layout.geometry else {
            panic!("Expected a linear frame");
        };

        let g1 = layout.feature(1).unwrap();
        let g2 = layout.feature(2).unwrap();
        assert!(g1.lo > frame.backbone_y);
        assert!(g2.lo >= g1.hi);

        let x = frame.position_to_x(150.);
        assert_eq!(layout.feature_at(pos2(x, g1.mid())), Some(1));
        assert_eq!(layout.feature_at(pos2(x, g2.mid())), None);
    }
}
