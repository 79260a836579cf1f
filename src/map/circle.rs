//! Draw passes for the circular map. At low zoom the whole circle is in view, with lanes nested
//! inside the backbone. Zoomed in, the top of the backbone sits mid-view, lanes grow outward, and
//! only the arc covering the viewport is drawn.

use core::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{vec2, Align2, Color32, Stroke};

use crate::{
    amino_acids::translate_codon,
    labels::{place_labels, LabelAnchor, LabelRecord, LabelRequest, LabelSpace, TextMeasure},
    map::{
        arrow_len, feature_style,
        geometry::{FeatureGeom, FrameLayout, SEQ_ROW_OFFSETS_CIRCLE},
        label_shapes, nice_tick_interval, nt_color,
        prims::{arc_band, arc_points, circle_outline, dashed, MapShape},
        tick_positions, tooltip, MapConfig, MapInput, BACKBONE_COLOR, BACKBONE_WIDTH,
        FEATURE_GLOW_WIDTH, MAJOR_TICK_EVERY, SELECTION_FILL, SELECTION_STROKE, SEQ_FONT_SIZE,
        STOP_CODON_COLOR, TEXT_COLOR, TEXT_COLOR_DIM, TICK_COLOR, TICK_FONT_SIZE, TICK_LEN_MAJOR,
        TICK_LEN_MINOR,
    },
    misc_types::{Feature, Strand},
    projection::CircleFrame,
    sequence::complement,
    util::{format_bp_short, format_thousands},
};

const TICK_LABEL_OFFSET: f32 = 18.;
/// External labels start this far outside the ruler, or the outermost lane.
const LABEL_CLEARANCE: f32 = 14.;
const GHOST_HALF_WIDTH: f32 = 5.;
const STOP_HIGHLIGHT_HALF_WIDTH: f32 = 8.;

type Window = Option<(f32, f32)>;

/// Intersect the arc `[a0, a1]` with the visible window. Returns the clipped arc, and the
/// multiple of τ the arc was shifted by to land in the window.
fn clip_arc(a0: f32, a1: f32, window: Window) -> Option<(f32, f32, f32)> {
    let Some((w0, w1)) = window else {
        return Some((a0, a1, 0.));
    };

    let mut best: Option<(f32, f32, f32)> = None;
    for k in -2..=2 {
        let shift = k as f32 * TAU;
        let s = (a0 + shift).max(w0);
        let e = (a1 + shift).min(w1);

        if e > s && best.map_or(true, |(bs, be, _)| e - s > be - bs) {
            best = Some((s, e, shift));
        }
    }
    best
}

/// The first visible position, and how many positions the window covers.
fn visible_positions(frame: &CircleFrame, window: Window) -> (usize, usize) {
    let seq_len = frame.seq_len;

    match window {
        Some((w0, w1)) => {
            let first = frame.angle_to_position_f(w0).floor() as usize;
            let count = ((w1 - w0) / TAU * seq_len as f32).ceil() as usize + 1;
            (first % seq_len, count.min(seq_len))
        }
        None => (0, seq_len),
    }
}

/// Anchor text outside the circle so it extends away from it.
fn radial_anchor(angle: f32) -> Align2 {
    let (sin, cos) = angle.sin_cos();

    if cos > 0.3 {
        Align2::LEFT_CENTER
    } else if cos < -0.3 {
        Align2::RIGHT_CENTER
    } else if sin < 0. {
        Align2::CENTER_BOTTOM
    } else {
        Align2::CENTER_TOP
    }
}

/// Ruler ticks, on the side of the backbone away from the lanes.
fn draw_ticks(frame: &CircleFrame, window: Window, outward: bool) -> Vec<MapShape> {
    let mut result = Vec::new();

    let interval = nice_tick_interval(frame.px_per_bp());
    let (first, count) = visible_positions(frame, window);
    let stroke = Stroke::new(1., TICK_COLOR);
    let r = frame.radius;

    for bp in tick_positions(first, count + 1, frame.seq_len, interval) {
        let major = bp % (interval * MAJOR_TICK_EVERY) == 0;
        let len = if major { TICK_LEN_MAJOR } else { TICK_LEN_MINOR };
        let angle = frame.position_to_angle(bp as f32);

        let (r0, r1) = if outward {
            (r + 2., r + 2. + len)
        } else {
            (r - 2., r - 2. - len)
        };
        result.push(MapShape::segment(
            frame.polar(angle, r0),
            frame.polar(angle, r1),
            stroke,
        ));

        if !major {
            continue;
        }

        if outward {
            result.push(MapShape::text(
                frame.polar(angle, r + TICK_LABEL_OFFSET),
                radial_anchor(angle),
                format_bp_short(bp),
                TICK_FONT_SIZE,
                TICK_COLOR,
            ));
        } else {
            result.push(MapShape::Text {
                pos: frame.polar(angle, r - TICK_LABEL_OFFSET - 4.),
                anchor: Align2::CENTER_CENTER,
                text: format_bp_short(bp),
                size: TICK_FONT_SIZE,
                color: TICK_COLOR,
                angle: angle + FRAC_PI_2,
            });
        }
    }

    result
}

fn draw_backbone(frame: &CircleFrame, window: Window) -> MapShape {
    let stroke = Stroke::new(BACKBONE_WIDTH, BACKBONE_COLOR);

    match window {
        Some((w0, w1)) => MapShape::Polyline {
            points: arc_points(frame.center, frame.radius, w0, w1),
            stroke,
            closed: false,
            dashed: false,
        },
        None => circle_outline(frame.center, frame.radius, stroke),
    }
}

/// Radial extent of the selection overlay: the lanes, the backbone, and the sequence rows.
fn selection_extent(layout: &FrameLayout, frame: &CircleFrame) -> (f32, f32) {
    let (lane_lo, lane_hi) = layout.lanes.extent(layout.num_tracks);
    let r = frame.radius;

    let inner_depth = if layout.show_sequence {
        SEQ_ROW_OFFSETS_CIRCLE[2] + 10.
    } else {
        6.
    };

    (lane_lo.min(r - inner_depth).max(0.), lane_hi.max(r + 6.))
}

fn draw_feature(
    input: &MapInput,
    frame: &CircleFrame,
    g: &FeatureGeom,
    feature: &Feature,
    window: Window,
) -> Vec<MapShape> {
    let mut result = Vec::new();

    let (a0, a1) = FrameLayout::range_angles(frame, g.range, input.data.topology);
    if a1 <= a0 {
        return result;
    }
    let Some((s, e, shift)) = clip_arc(a0, a1, window) else {
        return result;
    };

    let style = feature_style(feature, &input.view);
    let mid_r = g.mid().max(1.);

    // The arrowhead is only drawn if its end of the band is in view.
    let arrow = if g.directional {
        let len = arrow_len((a1 - a0) * mid_r) / mid_r;
        match g.strand {
            Strand::Forward if e >= a1 + shift => Some((len, true)),
            Strand::Reverse if s <= a0 + shift => Some((len, false)),
            _ => None,
        }
    } else {
        None
    };

    if let Some(glow) = style.glow {
        result.push(arc_band(
            frame.center,
            (g.lo - FEATURE_GLOW_WIDTH).max(0.),
            g.hi + FEATURE_GLOW_WIDTH,
            s,
            e,
            None,
            glow,
            Stroke::NONE,
        ));
    }

    result.push(arc_band(
        frame.center,
        g.lo.max(0.),
        g.hi,
        s,
        e,
        arrow,
        style.fill,
        style.stroke,
    ));

    result
}

fn letter(frame: &CircleFrame, bp: f32, radius: f32, ch: char, color: Color32) -> MapShape {
    let angle = frame.position_to_angle(bp);

    MapShape::Text {
        pos: frame.polar(angle, radius),
        anchor: Align2::CENTER_CENTER,
        text: ch.to_string(),
        size: SEQ_FONT_SIZE,
        color,
        angle: angle + FRAC_PI_2,
    }
}

/// Both strands, and the translation, for the visible positions.
fn draw_sequence(
    input: &MapInput,
    frame: &CircleFrame,
    window: Window,
    config: &MapConfig,
) -> Vec<MapShape> {
    let mut result = Vec::new();

    let data = input.data;
    let seq_len = frame.seq_len;
    let r = frame.radius;
    let [r_fwd, r_rev, r_aa] = SEQ_ROW_OFFSETS_CIRCLE.map(|o| r - o);

    // Pad the window so codons straddling its edges are included.
    let (first, count) = visible_positions(frame, window);
    let pad = seq_len.min(2);
    let start = (first + seq_len - pad) % seq_len;
    let count = (count + 2 * pad).min(seq_len);

    let frame_offset = config.translation_frame as usize % 3;

    for i in 0..count {
        let bp = (start + i) % seq_len;
        let Some(sym) = data.symbol_at(bp) else {
            continue;
        };

        let comp = complement(sym);
        result.push(letter(frame, bp as f32 + 0.5, r_fwd, sym as char, nt_color(sym)));
        result.push(letter(frame, bp as f32 + 0.5, r_rev, comp as char, nt_color(comp)));

        if !config.show_translation || bp % 3 != frame_offset {
            continue;
        }

        let (Some(b), Some(c)) = (data.symbol_at(bp + 1), data.symbol_at(bp + 2)) else {
            continue;
        };
        let aa = translate_codon([sym, b, c]);

        if aa.is_stop() {
            let a0 = frame.position_to_angle(bp as f32);
            let a1 = frame.position_to_angle(bp as f32 + 3.);
            result.push(arc_band(
                frame.center,
                r_aa - STOP_HIGHLIGHT_HALF_WIDTH,
                r_aa + STOP_HIGHLIGHT_HALF_WIDTH,
                a0,
                a1,
                None,
                STOP_CODON_COLOR.gamma_multiply(0.6),
                Stroke::NONE,
            ));
        }

        result.push(letter(
            frame,
            bp as f32 + 1.5,
            r_aa,
            aa.ident_single_letter(),
            if aa.is_stop() { Color32::WHITE } else { TEXT_COLOR },
        ));
    }

    result
}

fn label_requests(
    input: &MapInput,
    layout: &FrameLayout,
    frame: &CircleFrame,
    window: Window,
) -> Vec<LabelRequest> {
    let by_id = input.features_by_id();
    let mut result = Vec::new();

    for g in &layout.features {
        let Some(feature) = by_id.get(&g.id) else {
            continue;
        };

        let (a0, a1) = FrameLayout::range_angles(frame, g.range, input.data.topology);
        if a1 <= a0 {
            continue;
        }
        let Some((s, e, _)) = clip_arc(a0, a1, window) else {
            continue;
        };

        let mid_r = g.mid().max(1.);
        let arrow = if g.directional {
            arrow_len((a1 - a0) * mid_r)
        } else {
            0.
        };

        result.push(LabelRequest {
            feature_id: g.id,
            text: feature.label(),
            tier: input.label_tier(feature),
            anchor: LabelAnchor::Arc {
                angle: (s + e) / 2.,
                mid_radius: mid_r,
                edge_radius: g.hi,
            },
            inline_room: (e - s) * mid_r - arrow,
            thickness: g.thickness,
            color: TEXT_COLOR,
        });
    }

    result
}

/// Name, length and topology, in the middle of the circle.
fn draw_center_text(input: &MapInput, frame: &CircleFrame, config: &MapConfig) -> Vec<MapShape> {
    let mut result = Vec::new();
    let c = frame.center;

    if !input.data.name.is_empty() {
        result.push(MapShape::text(
            c - vec2(0., 14.),
            Align2::CENTER_CENTER,
            input.data.name.clone(),
            config.font_size + 4.,
            TEXT_COLOR,
        ));
    }

    result.push(MapShape::text(
        c + vec2(0., 8.),
        Align2::CENTER_CENTER,
        format!("{} bp", format_thousands(frame.seq_len)),
        config.font_size,
        TEXT_COLOR,
    ));
    result.push(MapShape::text(
        c + vec2(0., 26.),
        Align2::CENTER_CENTER,
        input.data.topology.to_string(),
        config.font_size - 1.,
        TEXT_COLOR_DIM,
    ));

    result
}

pub(super) fn draw(
    input: &MapInput,
    layout: &FrameLayout,
    frame: &CircleFrame,
    config: &MapConfig,
    measure: &dyn TextMeasure,
) -> (Vec<MapShape>, Vec<LabelRecord>) {
    let mut shapes = Vec::new();

    let window = frame.visible_arc();
    let high_zoom = layout.lanes.high_zoom;
    let topology = input.data.topology;

    if config.show_ruler {
        shapes.append(&mut draw_ticks(frame, window, !high_zoom));
    }

    shapes.push(draw_backbone(frame, window));

    if let Some(sel) = input.view.selection {
        let (a0, a1) = FrameLayout::range_angles(frame, sel, topology);
        if let Some((s, e, _)) = clip_arc(a0, a1, window) {
            let (lo, hi) = selection_extent(layout, frame);
            shapes.push(arc_band(
                frame.center,
                lo,
                hi,
                s,
                e,
                None,
                SELECTION_FILL,
                Stroke::new(1., SELECTION_STROKE),
            ));
        }
    }

    if config.show_ghosts {
        for ghost in input.ghosts {
            let (a0, a1) = FrameLayout::range_angles(frame, ghost.range, topology);
            let Some((s, e, _)) = clip_arc(a0, a1, window) else {
                continue;
            };
            let c = ghost.color;

            shapes.push(dashed(arc_band(
                frame.center,
                frame.radius - GHOST_HALF_WIDTH,
                frame.radius + GHOST_HALF_WIDTH,
                s,
                e,
                None,
                Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), 60),
                Stroke::new(1., c),
            )));
        }
    }

    let by_id = input.features_by_id();
    for g in &layout.features {
        if let Some(feature) = by_id.get(&g.id) {
            shapes.append(&mut draw_feature(input, frame, g, feature, window));
        }
    }

    if layout.show_sequence {
        shapes.append(&mut draw_sequence(input, frame, window, config));
    }

    let mut labels = Vec::new();
    if config.show_labels {
        let base_radius = if high_zoom {
            layout.lanes.extent(layout.num_tracks).1 + LABEL_CLEARANCE
        } else if config.show_ruler {
            frame.radius + TICK_LABEL_OFFSET + 2. * LABEL_CLEARANCE
        } else {
            frame.radius + LABEL_CLEARANCE
        };

        let space = LabelSpace::Circle {
            center: frame.center,
            base_radius,
            flip_reference: high_zoom.then(|| frame.view_angle()),
        };

        let placements = place_labels(
            label_requests(input, layout, frame, window),
            &space,
            frame.viewport,
            config.font_size,
            measure,
        );

        let (mut label_shapes, records) = label_shapes(placements, config.font_size);
        shapes.append(&mut label_shapes);
        labels = records;
    }

    if !high_zoom && frame.center_on_screen() {
        shapes.append(&mut draw_center_text(input, frame, config));
    }

    // Tooltip for the primary selected feature.
    if let Some(id) = input.view.selected.first() {
        if let (Some(g), Some(feature)) = (layout.feature(*id), by_id.get(id)) {
            let (a0, a1) = FrameLayout::range_angles(frame, g.range, topology);
            if let Some((s, e, _)) = clip_arc(a0, a1, window) {
                let anchor = frame.polar((s + e) / 2., g.mid()) - vec2(0., g.thickness / 2. + 6.);
                let text = format!(
                    "{}: {} bp",
                    feature.label(),
                    feature.span(frame.seq_len, topology)
                );
                shapes.extend(tooltip(anchor, text, measure));
            }
        }
    }

    (shapes, labels)
}
