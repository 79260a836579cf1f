//! The display list. Draw passes emit these primitives; the GUI converts them to egui shapes,
//! and the SVG exporter to SVG elements.

use core::f32::consts::TAU;

use eframe::egui::{pos2, Align2, Color32, Pos2, Rect, Stroke};

/// Arcs are tessellated with segments about this long, in pixels.
const ARC_SEGMENT_LEN: f32 = 4.;
const ARC_MAX_SEGMENTS: usize = 512;

/// The pointed end of a directional band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandTip {
    pub point: Pos2,
    /// True if the tip extends the last pair of edge points; false for the first.
    pub at_end: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MapShape {
    /// A filled strip between two edges; `edge_a[i]` pairs with `edge_b[i]`. Used for arcs,
    /// rectangles and arrows.
    Band {
        edge_a: Vec<Pos2>,
        edge_b: Vec<Pos2>,
        tip: Option<BandTip>,
        fill: Color32,
        stroke: Stroke,
        dashed: bool,
    },
    Polyline {
        points: Vec<Pos2>,
        stroke: Stroke,
        closed: bool,
        dashed: bool,
    },
    Segment {
        points: [Pos2; 2],
        stroke: Stroke,
    },
    Rect {
        rect: Rect,
        rounding: f32,
        fill: Color32,
        stroke: Stroke,
    },
    Text {
        pos: Pos2,
        anchor: Align2,
        text: String,
        size: f32,
        color: Color32,
        /// Rotation around `pos`, radians.
        angle: f32,
    },
}

impl MapShape {
    pub fn text(pos: Pos2, anchor: Align2, text: impl Into<String>, size: f32, color: Color32) -> Self {
        Self::Text {
            pos,
            anchor,
            text: text.into(),
            size,
            color,
            angle: 0.,
        }
    }

    pub fn segment(a: Pos2, b: Pos2, stroke: Stroke) -> Self {
        Self::Segment {
            points: [a, b],
            stroke,
        }
    }
}

/// The closed outline of a band: edge A forward, edge B backward, with the tip spliced in.
pub fn band_outline(edge_a: &[Pos2], edge_b: &[Pos2], tip: Option<BandTip>) -> Vec<Pos2> {
    let mut result = Vec::with_capacity(edge_a.len() + edge_b.len() + 1);

    result.extend_from_slice(edge_a);
    if let Some(t) = tip {
        if t.at_end {
            result.push(t.point);
        }
    }
    result.extend(edge_b.iter().rev());
    if let Some(t) = tip {
        if !t.at_end {
            result.push(t.point);
        }
    }
    result
}

/// Number of segments for an arc, given its angular extent and radius.
pub fn arc_segments(angle_span: f32, radius: f32) -> usize {
    let len = (angle_span.abs() * radius.abs()).max(0.);
    ((len / ARC_SEGMENT_LEN).ceil() as usize).clamp(1, ARC_MAX_SEGMENTS)
}

/// Points along an arc, from `a0` to `a1` inclusive.
pub fn arc_points(center: Pos2, radius: f32, a0: f32, a1: f32) -> Vec<Pos2> {
    let n = arc_segments(a1 - a0, radius);

    (0..=n)
        .map(|i| {
            let a = a0 + (a1 - a0) * i as f32 / n as f32;
            pos2(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

/// An annular sector between two radii. If `arrow` is set, it's `(length_rad, at_end)`: the
/// band narrows to a point over that angular distance at one end.
pub fn arc_band(
    center: Pos2,
    r_inner: f32,
    r_outer: f32,
    a0: f32,
    a1: f32,
    arrow: Option<(f32, bool)>,
    fill: Color32,
    stroke: Stroke,
) -> MapShape {
    let (body0, body1, tip) = match arrow {
        Some((len, true)) => {
            let a_tip = a1;
            (a0, (a1 - len).max(a0), Some(a_tip))
        }
        Some((len, false)) => ((a0 + len).min(a1), a1, Some(a0)),
        None => (a0, a1, None),
    };

    let r_mid = (r_inner + r_outer) / 2.;
    let tip = tip.map(|a| BandTip {
        point: pos2(center.x + r_mid * a.cos(), center.y + r_mid * a.sin()),
        at_end: matches!(arrow, Some((_, true))),
    });

    MapShape::Band {
        edge_a: arc_points(center, r_outer, body0, body1),
        edge_b: arc_points(center, r_inner, body0, body1),
        tip,
        fill,
        stroke,
        dashed: false,
    }
}

/// A horizontal band from `x0` to `x1`. `arrow` is `(length_px, at_end)`.
pub fn row_band(
    x0: f32,
    x1: f32,
    top: f32,
    bottom: f32,
    arrow: Option<(f32, bool)>,
    fill: Color32,
    stroke: Stroke,
) -> MapShape {
    let (body0, body1) = match arrow {
        Some((len, true)) => (x0, (x1 - len).max(x0)),
        Some((len, false)) => ((x0 + len).min(x1), x1),
        None => (x0, x1),
    };

    let mid = (top + bottom) / 2.;
    let tip = arrow.map(|(_, at_end)| BandTip {
        point: pos2(if at_end { x1 } else { x0 }, mid),
        at_end,
    });

    MapShape::Band {
        edge_a: vec![pos2(body0, top), pos2(body1, top)],
        edge_b: vec![pos2(body0, bottom), pos2(body1, bottom)],
        tip,
        fill,
        stroke,
        dashed: false,
    }
}

/// Mark a band shape as dashed.
pub fn dashed(mut shape: MapShape) -> MapShape {
    if let MapShape::Band { dashed, .. } | MapShape::Polyline { dashed, .. } = &mut shape {
        *dashed = true;
    }
    shape
}

/// A full circle as a closed polyline; cheaper than a band when only the stroke matters.
pub fn circle_outline(center: Pos2, radius: f32, stroke: Stroke) -> MapShape {
    let mut points = arc_points(center, radius, 0., TAU);
    points.pop();

    MapShape::Polyline {
        points,
        stroke,
        closed: true,
        dashed: false,
    }
}
