//! Feature label placement. A label is drawn inline, along the feature, when it fits; otherwise
//! it is placed outside the features with a leader line, searching outward for a spot that
//! doesn't collide with labels already placed.

use core::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{pos2, vec2, Align2, Color32, Pos2, Rect};

use crate::{misc_types::FeatureId, util::normalize_angle};

/// Room to spare around inline text, in pixels.
pub const INLINE_MARGIN: f32 = 8.;
/// Bands thinner than this never carry inline text.
pub const INLINE_MIN_THICKNESS: f32 = 8.;
pub const INLINE_MIN_FONT_SIZE: f32 = 7.;

/// Distance between successive external label candidates.
pub const LABEL_STEP: f32 = 16.;
pub const LABEL_MAX_ATTEMPTS: usize = 8;
/// Minimum distance between the centers of two external labels.
pub const LABEL_MIN_GAP: f32 = 14.;
/// Candidates further than this outside the view are culled.
pub const CULL_MARGIN: f32 = 200.;

/// Text metrics. The GUI measures with its fonts; headless rendering uses a fixed advance.
pub trait TextMeasure {
    fn char_width(&self, c: char, size: f32) -> f32;

    fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.char_width(c, size)).sum()
    }
}

/// Fixed-advance metrics, matching a typical monospace font.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonoMeasure;

impl TextMeasure for MonoMeasure {
    fn char_width(&self, _c: char, size: f32) -> f32 {
        size * 0.6
    }
}

/// Placement priority; lower sorts first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum LabelTier {
    Selected,
    Annotated,
    /// Eg detected ORFs.
    Generated,
}

/// Where a feature sits, for label purposes.
#[derive(Clone, Copy, Debug)]
pub enum LabelAnchor {
    Arc {
        /// The feature's angular midpoint.
        angle: f32,
        mid_radius: f32,
        /// The leader line starts here: the feature edge facing the labels.
        edge_radius: f32,
    },
    Row {
        x: f32,
        mid_y: f32,
        edge_y: f32,
    },
}

#[derive(Clone, Debug)]
pub struct LabelRequest {
    pub feature_id: FeatureId,
    pub text: String,
    pub tier: LabelTier,
    pub anchor: LabelAnchor,
    /// Length available along the feature for inline text, in pixels.
    pub inline_room: f32,
    pub thickness: f32,
    pub color: Color32,
}

/// Geometry shared by all labels of a frame.
#[derive(Clone, Copy, Debug)]
pub enum LabelSpace {
    Circle {
        center: Pos2,
        /// External labels start at this radius.
        base_radius: f32,
        /// At high zoom, glyph orientation follows the view-center angle rather than each
        /// label's own angle, so text doesn't flip while panning.
        flip_reference: Option<f32>,
    },
    Linear {
        /// External labels start at this y.
        base_y: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    /// Glyph center.
    pub pos: Pos2,
    /// Rotation, radians.
    pub angle: f32,
}

/// The per-frame record of an external label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRecord {
    pub feature_id: FeatureId,
    pub angle_or_x: f32,
    pub offset_radius: f32,
    pub screen_point: Pos2,
}

#[derive(Clone, Debug)]
pub enum LabelPlacement {
    Inline {
        feature_id: FeatureId,
        glyphs: Vec<PlacedGlyph>,
        size: f32,
        color: Color32,
    },
    External {
        record: LabelRecord,
        text: String,
        align: Align2,
        leader_from: Pos2,
        leader_to: Pos2,
        color: Color32,
        /// Placed despite a collision, because its feature is selected.
        forced: bool,
    },
}

impl LabelPlacement {
    pub fn feature_id(&self) -> FeatureId {
        match self {
            Self::Inline { feature_id, .. } => *feature_id,
            Self::External { record, .. } => record.feature_id,
        }
    }
}

/// Is the view-relative lower half; text there reads counter-clockwise to stay upright.
fn is_lower_half(angle: f32) -> bool {
    angle.sin() > 0.
}

/// Place glyphs one by one along an arc, centered on `angle`, oriented so they're never
/// upside-down.
pub fn glyphs_on_arc(
    text: &str,
    center: Pos2,
    angle: f32,
    radius: f32,
    size: f32,
    flip_reference: Option<f32>,
    measure: &dyn TextMeasure,
) -> Vec<PlacedGlyph> {
    let lower = is_lower_half(flip_reference.unwrap_or(angle));
    let dir = if lower { -1. } else { 1. };

    let total = measure.text_width(text, size);
    let mut s = -total / 2.;

    let mut result = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let w = measure.char_width(ch, size);
        let a = angle + dir * (s + w / 2.) / radius.max(1.);

        result.push(PlacedGlyph {
            ch,
            pos: pos2(center.x + radius * a.cos(), center.y + radius * a.sin()),
            angle: if lower { a - FRAC_PI_2 } else { a + FRAC_PI_2 },
        });
        s += w;
    }
    result
}

/// Place glyphs along a horizontal segment, centered on `x`.
pub fn glyphs_on_row(
    text: &str,
    x: f32,
    y: f32,
    size: f32,
    measure: &dyn TextMeasure,
) -> Vec<PlacedGlyph> {
    let total = measure.text_width(text, size);
    let mut s = x - total / 2.;

    let mut result = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let w = measure.char_width(ch, size);
        result.push(PlacedGlyph {
            ch,
            pos: pos2(s + w / 2., y),
            angle: 0.,
        });
        s += w;
    }
    result
}

/// Sort key within a tier: angle measured clockwise from the top, or x.
fn along(anchor: &LabelAnchor) -> f32 {
    match anchor {
        LabelAnchor::Arc { angle, .. } => normalize_angle(angle + FRAC_PI_2),
        LabelAnchor::Row { x, .. } => *x,
    }
}

struct Candidate {
    point: Pos2,
    /// Estimated center of the text box; used for collision checks.
    center: Pos2,
    align: Align2,
    offset: f32,
    leader_from: Pos2,
}

fn candidate(
    anchor: &LabelAnchor,
    space: &LabelSpace,
    k: usize,
    width: f32,
    size: f32,
) -> Candidate {
    let offset = k as f32 * LABEL_STEP;

    match (anchor, space) {
        (
            LabelAnchor::Arc {
                angle, edge_radius, ..
            },
            LabelSpace::Circle {
                center,
                base_radius,
                ..
            },
        ) => {
            let r = base_radius + offset;
            let dir = vec2(angle.cos(), angle.sin());
            let point = *center + dir * r;
            let (align, sign) = if dir.x >= 0. {
                (Align2::LEFT_CENTER, 1.)
            } else {
                (Align2::RIGHT_CENTER, -1.)
            };

            Candidate {
                point,
                center: point + vec2(sign * width / 2., 0.),
                align,
                offset: r,
                leader_from: *center + dir * *edge_radius,
            }
        }
        (LabelAnchor::Row { x, edge_y, .. }, LabelSpace::Linear { base_y }) => {
            let point = pos2(*x, base_y + offset);
            Candidate {
                point,
                center: point + vec2(0., size / 2.),
                align: Align2::CENTER_TOP,
                offset: base_y + offset,
                leader_from: pos2(*x, *edge_y),
            }
        }
        // Mismatched anchor and space; place at the anchor itself.
        (LabelAnchor::Arc { .. }, LabelSpace::Linear { base_y }) => {
            let point = pos2(0., *base_y);
            Candidate {
                point,
                center: point,
                align: Align2::CENTER_TOP,
                offset: *base_y,
                leader_from: point,
            }
        }
        (LabelAnchor::Row { x, mid_y, .. }, LabelSpace::Circle { .. }) => {
            let point = pos2(*x, *mid_y);
            Candidate {
                point,
                center: point,
                align: Align2::CENTER_CENTER,
                offset: 0.,
                leader_from: point,
            }
        }
    }
}

fn inline_placement(
    req: &LabelRequest,
    space: &LabelSpace,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Option<LabelPlacement> {
    if req.thickness < INLINE_MIN_THICKNESS {
        return None;
    }

    let size = (req.thickness - 2.).clamp(INLINE_MIN_FONT_SIZE, font_size);
    let width = measure.text_width(&req.text, size);
    if req.inline_room < width + INLINE_MARGIN {
        return None;
    }

    let glyphs = match (req.anchor, space) {
        (
            LabelAnchor::Arc {
                angle, mid_radius, ..
            },
            LabelSpace::Circle {
                center,
                flip_reference,
                ..
            },
        ) => {
            // Arcs longer than half the circle would curl back on themselves.
            if width / mid_radius.max(1.) > TAU / 2. {
                return None;
            }
            glyphs_on_arc(
                &req.text,
                *center,
                angle,
                mid_radius,
                size,
                *flip_reference,
                measure,
            )
        }
        (LabelAnchor::Row { x, mid_y, .. }, LabelSpace::Linear { .. }) => {
            glyphs_on_row(&req.text, x, mid_y, size, measure)
        }
        _ => return None,
    };

    Some(LabelPlacement::Inline {
        feature_id: req.feature_id,
        glyphs,
        size,
        color: Color32::WHITE,
    })
}

/// Choose inline or external placement for every label. Selected features are handled first,
/// then annotated ones, then generated ones; within a tier, in order around the map. External
/// labels that can't find a free spot are dropped, unless their feature is selected.
pub fn place_labels(
    mut requests: Vec<LabelRequest>,
    space: &LabelSpace,
    viewport: Rect,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Vec<LabelPlacement> {
    requests.sort_by(|a, b| {
        a.tier
            .cmp(&b.tier)
            .then(along(&a.anchor).total_cmp(&along(&b.anchor)))
    });

    let cull_rect = viewport.expand(CULL_MARGIN);
    let mut placed_centers: Vec<Pos2> = Vec::new();
    let mut result = Vec::new();

    for req in &requests {
        if req.text.is_empty() {
            continue;
        }

        if let Some(inline) = inline_placement(req, space, font_size, measure) {
            result.push(inline);
            continue;
        }

        let width = measure.text_width(&req.text, font_size);

        let first = candidate(&req.anchor, space, 0, width, font_size);
        if !cull_rect.contains(first.point) {
            continue;
        }

        let mut chosen = None;
        for k in 0..LABEL_MAX_ATTEMPTS {
            let cand = candidate(&req.anchor, space, k, width, font_size);
            if placed_centers
                .iter()
                .all(|c| (*c - cand.center).length() > LABEL_MIN_GAP)
            {
                chosen = Some((cand, false));
                break;
            }
        }

        if chosen.is_none() && req.tier == LabelTier::Selected {
            chosen = Some((first, true));
        }

        let Some((cand, forced)) = chosen else {
            log::trace!("Dropped label for feature {}", req.feature_id);
            continue;
        };

        placed_centers.push(cand.center);

        let angle_or_x = match req.anchor {
            LabelAnchor::Arc { angle, .. } => angle,
            LabelAnchor::Row { x, .. } => x,
        };

        // Stop the leader just short of the text.
        let leader_to = cand.leader_from + (cand.point - cand.leader_from) * 0.97;

        result.push(LabelPlacement::External {
            record: LabelRecord {
                feature_id: req.feature_id,
                angle_or_x,
                offset_radius: cand.offset,
                screen_point: cand.point,
            },
            text: req.text.clone(),
            align: cand.align,
            leader_from: cand.leader_from,
            leader_to,
            color: req.color,
            forced,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT: f32 = 12.;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800., 600.))
    }

    fn circle_space() -> LabelSpace {
        LabelSpace::Circle {
            center: pos2(400., 300.),
            base_radius: 240.,
            flip_reference: None,
        }
    }

    fn arc_request(id: FeatureId, angle: f32, tier: LabelTier, room: f32) -> LabelRequest {
        LabelRequest {
            feature_id: id,
            text: format!("feature {id}"),
            tier,
            anchor: LabelAnchor::Arc {
                angle,
                mid_radius: 190.,
                edge_radius: 196.,
            },
            inline_room: room,
            thickness: 12.,
            color: Color32::RED,
        }
    }

    fn externals(placements: &[LabelPlacement]) -> Vec<(FeatureId, bool)> {
        placements
            .iter()
            .filter_map(|p| match p {
                LabelPlacement::External { record, forced, .. } => {
                    Some((record.feature_id, *forced))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_inline_when_room() {
        let req = arc_request(1, -FRAC_PI_2, LabelTier::Annotated, 300.);
        let result = place_labels(vec![req], &circle_space(), viewport(), FONT, &MonoMeasure);

        assert_eq!(result.len(), 1);
        let LabelPlacement::Inline { glyphs, .. } = &result[0] else {
            panic!("Expected an inline label");
        };
        assert_eq!(glyphs.len(), "feature 1".len());

        // Centered on the feature midpoint, at the top: reads left to right.
        assert!(glyphs[0].pos.x < glyphs[glyphs.len() - 1].pos.x);
    }

    #[test]
    fn test_inline_upright_on_lower_half() {
        let glyphs = glyphs_on_arc(
            "abc",
            pos2(0., 0.),
            FRAC_PI_2,
            100.,
            FONT,
            None,
            &MonoMeasure,
        );
        // At the bottom of the circle, text still reads left to right, with no rotation.
        assert!(glyphs[0].pos.x < glyphs[2].pos.x);
        assert!(glyphs[1].angle.abs() < 1e-4);
    }

    #[test]
    fn test_external_when_too_short() {
        let req = arc_request(1, 0.3, LabelTier::Annotated, 10.);
        let result = place_labels(vec![req], &circle_space(), viewport(), FONT, &MonoMeasure);

        assert_eq!(externals(&result), vec![(1, false)]);
        let LabelPlacement::External { record, .. } = &result[0] else {
            unreachable!()
        };
        assert_eq!(record.offset_radius, 240.);
    }

    #[test]
    fn test_collision_pushes_outward() {
        let reqs = vec![
            arc_request(1, 0.3, LabelTier::Annotated, 0.),
            arc_request(2, 0.3, LabelTier::Annotated, 0.),
        ];
        let result = place_labels(reqs, &circle_space(), viewport(), FONT, &MonoMeasure);

        let radii: Vec<f32> = result
            .iter()
            .filter_map(|p| match p {
                LabelPlacement::External { record, .. } => Some(record.offset_radius),
                _ => None,
            })
            .collect();
        assert_eq!(radii, vec![240., 240. + LABEL_STEP]);
    }

    #[test]
    fn test_unplaceable_labels_dropped_unless_selected() {
        let n = LABEL_MAX_ATTEMPTS + 1;

        let reqs = (0..n)
            .map(|i| arc_request(i as FeatureId, 0.3, LabelTier::Annotated, 0.))
            .collect();
        let result = place_labels(reqs, &circle_space(), viewport(), FONT, &MonoMeasure);
        assert_eq!(externals(&result).len(), LABEL_MAX_ATTEMPTS);

        let reqs = (0..n)
            .map(|i| arc_request(i as FeatureId, 0.3, LabelTier::Selected, 0.))
            .collect();
        let result = place_labels(reqs, &circle_space(), viewport(), FONT, &MonoMeasure);
        let ext = externals(&result);
        assert_eq!(ext.len(), n);
        assert_eq!(ext.iter().filter(|(_, forced)| *forced).count(), 1);
    }

    #[test]
    fn test_selected_label_has_priority() {
        // The annotated label comes first around the circle, but the selected one is placed
        // first, and gets the closest spot.
        let reqs = vec![
            arc_request(1, 0.30, LabelTier::Annotated, 0.),
            arc_request(2, 0.31, LabelTier::Selected, 0.),
            arc_request(3, 0.29, LabelTier::Generated, 0.),
        ];
        let result = place_labels(reqs, &circle_space(), viewport(), FONT, &MonoMeasure);

        let order: Vec<FeatureId> = result.iter().map(|p| p.feature_id()).collect();
        assert_eq!(order, vec![2, 1, 3]);

        let LabelPlacement::External { record, .. } = &result[0] else {
            unreachable!()
        };
        assert_eq!(record.offset_radius, 240.);
    }

    #[test]
    fn test_offscreen_labels_culled() {
        let space = LabelSpace::Circle {
            center: pos2(400., 5_000.),
            base_radius: 4_800.,
            flip_reference: Some(-FRAC_PI_2),
        };
        // Pointing straight down, far below the view.
        let req = arc_request(1, FRAC_PI_2, LabelTier::Selected, 0.);
        let result = place_labels(vec![req], &space, viewport(), FONT, &MonoMeasure);
        assert!(result.is_empty());
    }

    #[test]
    fn test_linear_labels_stack_downward() {
        let space = LabelSpace::Linear { base_y: 200. };
        let row = |id: FeatureId, x: f32| LabelRequest {
            feature_id: id,
            text: "lacZ".to_owned(),
            tier: LabelTier::Annotated,
            anchor: LabelAnchor::Row {
                x,
                mid_y: 100.,
                edge_y: 106.,
            },
            inline_room: 5.,
            thickness: 12.,
            color: Color32::RED,
        };

        let result = place_labels(
            vec![row(1, 300.), row(2, 302.), row(3, 600.)],
            &space,
            viewport(),
            FONT,
            &MonoMeasure,
        );
        let ys: Vec<f32> = result
            .iter()
            .filter_map(|p| match p {
                LabelPlacement::External { record, .. } => Some(record.screen_point.y),
                _ => None,
            })
            .collect();
        assert_eq!(ys, vec![200., 200. + LABEL_STEP, 200.]);
    }
}
