//! The render pipeline. Each call to `render_map` is one full, synchronous pass from the current
//! sequence, features and view state to a display list, plus the layout hit testing uses.

use std::collections::HashMap;

use bincode::{Decode, Encode};
use eframe::egui::{vec2, Align2, Color32, Pos2, Rect, Stroke};

use crate::{
    labels::{LabelPlacement, LabelRecord, LabelTier, TextMeasure},
    misc_types::{Feature, FeatureId, GhostInterval, SeqRange},
    projection::Projection,
    sequence::SeqData,
};

mod circle;
pub mod geometry;
mod lin_map;
pub mod prims;

use geometry::{FrameLayout, MapGeometry};
use prims::MapShape;

pub const BACKGROUND_COLOR: Color32 = Color32::from_rgb(16, 20, 24);
pub const BACKBONE_COLOR: Color32 = Color32::from_rgb(180, 180, 180);
pub const BACKBONE_WIDTH: f32 = 2.;
pub const TICK_COLOR: Color32 = Color32::from_rgb(180, 220, 220);
pub const TEXT_COLOR: Color32 = Color32::from_rgb(210, 210, 210);
pub const TEXT_COLOR_DIM: Color32 = Color32::from_rgb(140, 140, 140);

pub const SELECTION_FILL: Color32 = Color32::from_rgba_premultiplied(24, 34, 51, 50);
pub const SELECTION_STROKE: Color32 = Color32::from_rgb(120, 170, 255);
pub const STOP_CODON_COLOR: Color32 = Color32::from_rgb(200, 40, 40);

pub const FEATURE_ALPHA: u8 = 200;
/// Selected and hovered features are drawn opaque, with a soft glow behind them.
pub const FEATURE_GLOW_WIDTH: f32 = 3.;
pub const FEATURE_GLOW_ALPHA: u8 = 70;
pub const FEATURE_STROKE_WIDTH: f32 = 1.;
pub const FEATURE_STROKE_SELECTED: f32 = 2.;

/// Directional bands end in an arrowhead at most this long, in pixels.
pub const ARROW_LEN: f32 = 12.;
/// ...and never longer than this portion of the band.
pub const ARROW_MAX_PORTION: f32 = 0.4;

/// Target spacing between ruler ticks, in pixels.
pub const TICK_SPACING_PX: f32 = 60.;
/// Every nth tick is major, and labeled.
pub const MAJOR_TICK_EVERY: usize = 5;
pub const TICK_LEN_MINOR: f32 = 5.;
pub const TICK_LEN_MAJOR: f32 = 10.;
pub const TICK_FONT_SIZE: f32 = 10.;

pub const SEQ_FONT_SIZE: f32 = 12.;
pub const TOOLTIP_FONT_SIZE: f32 = 12.;

/// Display preferences. These are persisted between sessions.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct MapConfig {
    pub show_ruler: bool,
    /// Sequence letters (both strands) at high zoom.
    pub show_sequence: bool,
    /// The translated codon row, under the sequence letters.
    pub show_translation: bool,
    /// Reading frame of the translated row, 0-2, counted from position 0.
    pub translation_frame: u8,
    pub show_labels: bool,
    pub show_ghosts: bool,
    pub font_size: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            show_ruler: true,
            show_sequence: true,
            show_translation: true,
            translation_frame: 0,
            show_labels: true,
            show_ghosts: true,
            font_size: 12.,
        }
    }
}

/// The view state the pipeline reads; owned by the interaction controller.
#[derive(Clone, Copy, Debug)]
pub struct MapView<'a> {
    pub projection: &'a Projection,
    pub selection: Option<SeqRange>,
    pub selected: &'a [FeatureId],
    pub hovered: Option<FeatureId>,
}

impl MapView<'_> {
    pub fn is_selected(&self, id: FeatureId) -> bool {
        self.selected.contains(&id)
    }
}

/// Everything one frame is drawn from.
#[derive(Clone, Copy, Debug)]
pub struct MapInput<'a> {
    pub data: &'a SeqData,
    pub features: &'a [Feature],
    pub ghosts: &'a [GhostInterval],
    pub view: MapView<'a>,
}

impl<'a> MapInput<'a> {
    fn features_by_id(&self) -> HashMap<FeatureId, &'a Feature> {
        self.features.iter().map(|f| (f.id, f)).collect()
    }

    fn label_tier(&self, feature: &Feature) -> LabelTier {
        if self.view.is_selected(feature.id) {
            LabelTier::Selected
        } else if feature.kind.is_generated() {
            LabelTier::Generated
        } else {
            LabelTier::Annotated
        }
    }
}

/// The result of a render pass.
#[derive(Clone, Debug)]
pub struct MapFrame {
    pub viewport: Rect,
    pub shapes: Vec<MapShape>,
    /// `None` for the no-data frame.
    pub layout: Option<FrameLayout>,
}

/// Color, outline and optional glow for a feature band.
pub(crate) struct FeatureStyle {
    pub fill: Color32,
    pub stroke: Stroke,
    pub glow: Option<Color32>,
}

pub(crate) fn feature_style(feature: &Feature, view: &MapView) -> FeatureStyle {
    let color = feature.color();
    let selected = view.is_selected(feature.id);
    let emphasized = selected || view.hovered == Some(feature.id);

    let alpha = if emphasized { 255 } else { FEATURE_ALPHA };
    let fill = Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha);

    let stroke = if selected {
        Stroke::new(FEATURE_STROKE_SELECTED, Color32::from_white_alpha(200))
    } else {
        Stroke::new(FEATURE_STROKE_WIDTH, Color32::from_black_alpha(120))
    };

    let glow = emphasized.then(|| {
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), FEATURE_GLOW_ALPHA)
    });

    FeatureStyle { fill, stroke, glow }
}

/// Arrowhead length in pixels, for a band of a given length.
pub(crate) fn arrow_len(band_len_px: f32) -> f32 {
    ARROW_LEN.min(ARROW_MAX_PORTION * band_len_px)
}

/// A ruler interval from the 1-2-5 series, so ticks land roughly `TICK_SPACING_PX` apart.
pub fn nice_tick_interval(px_per_bp: f32) -> usize {
    if px_per_bp <= 0. || !px_per_bp.is_finite() {
        return 1;
    }

    let raw = TICK_SPACING_PX / px_per_bp;
    if raw <= 1. {
        return 1;
    }

    let magnitude = 10_usize.pow(raw.log10().floor().max(0.) as u32);
    for m in [1, 2, 5] {
        if (m * magnitude) as f32 >= raw {
            return m * magnitude;
        }
    }
    10 * magnitude
}

/// Multiples of `interval` in `[first, first + span)`, wrapping through the origin on circular
/// sequences.
pub(crate) fn tick_positions(
    first: usize,
    span: usize,
    seq_len: usize,
    interval: usize,
) -> Vec<usize> {
    let interval = interval.max(1);
    let end = first + span.min(seq_len);

    let mut pieces = vec![(first, end.min(seq_len))];
    if end > seq_len {
        pieces.push((0, (end - seq_len).min(first)));
    }

    let mut result = Vec::new();
    for (a, b) in pieces {
        let mut t = a.div_ceil(interval) * interval;
        while t < b {
            result.push(t);
            t += interval;
        }
    }
    result
}

/// Per-base letter colors for the sequence rows.
pub(crate) fn nt_color(symbol: u8) -> Color32 {
    match symbol.to_ascii_uppercase() {
        b'A' => Color32::from_rgb(100, 200, 100),
        b'T' | b'U' => Color32::from_rgb(230, 100, 100),
        b'G' => Color32::from_rgb(230, 200, 90),
        b'C' => Color32::from_rgb(110, 160, 240),
        _ => TEXT_COLOR_DIM,
    }
}

/// A tooltip: text on a rounded background, its bottom edge centered on `anchor`.
pub(crate) fn tooltip(
    anchor: Pos2,
    text: String,
    measure: &dyn TextMeasure,
) -> [MapShape; 2] {
    let width = measure.text_width(&text, TOOLTIP_FONT_SIZE) + 12.;
    let height = TOOLTIP_FONT_SIZE + 8.;

    let rect = Rect::from_center_size(
        anchor - vec2(0., height / 2.),
        vec2(width, height),
    );

    [
        MapShape::Rect {
            rect,
            rounding: 4.,
            fill: Color32::from_black_alpha(210),
            stroke: Stroke::new(1., TEXT_COLOR_DIM),
        },
        MapShape::text(
            rect.center(),
            Align2::CENTER_CENTER,
            text,
            TOOLTIP_FONT_SIZE,
            Color32::WHITE,
        ),
    ]
}

/// Glyphs for inline labels; leader lines and text for external ones.
pub(crate) fn label_shapes(
    placements: Vec<LabelPlacement>,
    font_size: f32,
) -> (Vec<MapShape>, Vec<LabelRecord>) {
    let mut shapes = Vec::new();
    let mut records = Vec::new();

    for placement in placements {
        match placement {
            LabelPlacement::Inline {
                glyphs,
                size,
                color,
                ..
            } => {
                for glyph in glyphs {
                    shapes.push(MapShape::Text {
                        pos: glyph.pos,
                        anchor: Align2::CENTER_CENTER,
                        text: glyph.ch.to_string(),
                        size,
                        color,
                        angle: glyph.angle,
                    });
                }
            }
            LabelPlacement::External {
                record,
                text,
                align,
                leader_from,
                leader_to,
                color,
                ..
            } => {
                shapes.push(MapShape::Polyline {
                    points: vec![leader_from, leader_to],
                    stroke: Stroke::new(1., color.gamma_multiply(0.5)),
                    closed: false,
                    dashed: true,
                });
                shapes.push(MapShape::text(
                    record.screen_point,
                    align,
                    text,
                    font_size,
                    color,
                ));
                records.push(record);
            }
        }
    }

    (shapes, records)
}

/// Draw one frame. With no sequence, this produces a "no data" frame and skips all projection
/// math.
pub fn render_map(
    input: &MapInput,
    viewport: Rect,
    config: &MapConfig,
    measure: &dyn TextMeasure,
) -> MapFrame {
    if input.data.is_empty() {
        return MapFrame {
            viewport,
            shapes: vec![MapShape::text(
                viewport.center(),
                Align2::CENTER_CENTER,
                "No sequence loaded",
                config.font_size + 4.,
                TEXT_COLOR_DIM,
            )],
            layout: None,
        };
    }

    let mut layout = FrameLayout::new(
        input.view.projection,
        viewport,
        input.data,
        input.features,
        config,
    );

    let (shapes, labels) = match &layout.geometry {
        MapGeometry::Circle(frame) => circle::draw(input, &layout, frame, config, measure),
        MapGeometry::Linear(frame) => lin_map::draw(input, &layout, frame, config, measure),
    };

    log::trace!(
        "Rendered {} shapes, {} external labels on {} tracks",
        shapes.len(),
        labels.len(),
        layout.num_tracks
    );

    layout.labels = labels;

    MapFrame {
        viewport,
        shapes,
        layout: Some(layout),
    }
}
