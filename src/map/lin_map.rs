//! Draw passes for the linear map: a horizontal backbone with the ruler above it, optional sequence
//! rows under it, then feature rows stacking downward.

use eframe::egui::{pos2, vec2, Align2, Color32, Stroke};

use crate::{
    amino_acids::translate_codon,
    labels::{place_labels, LabelAnchor, LabelRecord, LabelRequest, LabelSpace, TextMeasure},
    map::{
        arrow_len, feature_style,
        geometry::{FeatureGeom, FrameLayout, SEQ_ROW_OFFSETS_LINEAR},
        label_shapes, nice_tick_interval, nt_color,
        prims::{dashed, row_band, MapShape},
        tooltip, MapConfig, MapInput, BACKBONE_COLOR, FEATURE_GLOW_WIDTH, MAJOR_TICK_EVERY,
        SELECTION_FILL, SELECTION_STROKE, SEQ_FONT_SIZE, STOP_CODON_COLOR, TEXT_COLOR,
        TEXT_COLOR_DIM, TICK_COLOR, TICK_FONT_SIZE, TICK_LEN_MAJOR, TICK_LEN_MINOR,
    },
    misc_types::{Feature, SeqRange, Strand},
    projection::LinearFrame,
    sequence::complement,
    util::{format_bp_short, format_thousands},
};

const BACKBONE_WIDTH: f32 = 3.;
const TICK_LABEL_GAP: f32 = 3.;
const LABEL_CLEARANCE: f32 = 12.;
const GHOST_HALF_HEIGHT: f32 = 5.;
const STOP_HIGHLIGHT_HALF_HEIGHT: f32 = 8.;

/// The x extent of a non-wrapping range, clipped to the drawable area. Also returns whether each
/// end is in view.
fn clip_range(frame: &LinearFrame, range: SeqRange) -> Option<(f32, f32, bool, bool)> {
    if range.end <= range.start {
        return None;
    }

    let x0 = frame.position_to_x(range.start as f32);
    let x1 = frame.position_to_x(range.end as f32);

    let s = x0.max(frame.left);
    let e = x1.min(frame.right);
    if e <= s {
        return None;
    }

    Some((s, e, x0 >= frame.left, x1 <= frame.right))
}

fn draw_ticks(frame: &LinearFrame) -> Vec<MapShape> {
    let mut result = Vec::new();

    let interval = nice_tick_interval(frame.px_per_bp());
    let (first, last) = frame.visible_range();
    let stroke = Stroke::new(1., TICK_COLOR);
    let y = frame.backbone_y;

    let mut bp = (first.max(0.) as usize).div_ceil(interval) * interval;
    while bp as f32 <= last && bp <= frame.seq_len {
        let major = bp % (interval * MAJOR_TICK_EVERY) == 0;
        let len = if major { TICK_LEN_MAJOR } else { TICK_LEN_MINOR };
        let x = frame.position_to_x(bp as f32);

        result.push(MapShape::segment(
            pos2(x, y - 3.),
            pos2(x, y - 3. - len),
            stroke,
        ));

        if major {
            result.push(MapShape::text(
                pos2(x, y - 3. - TICK_LEN_MAJOR - TICK_LABEL_GAP),
                Align2::CENTER_BOTTOM,
                format_bp_short(bp),
                TICK_FONT_SIZE,
                TICK_COLOR,
            ));
        }
        bp += interval;
    }

    result
}

fn draw_feature(
    input: &MapInput,
    frame: &LinearFrame,
    g: &FeatureGeom,
    feature: &Feature,
) -> Vec<MapShape> {
    let mut result = Vec::new();

    let Some((x0, x1, start_visible, end_visible)) = clip_range(frame, g.range) else {
        return result;
    };

    let style = feature_style(feature, &input.view);

    let arrow = if g.directional {
        let full_len = (g.range.end - g.range.start) as f32 * frame.px_per_bp();
        let len = arrow_len(full_len);
        match g.strand {
            Strand::Forward if end_visible => Some((len, true)),
            Strand::Reverse if start_visible => Some((len, false)),
            _ => None,
        }
    } else {
        None
    };

    if let Some(glow) = style.glow {
        result.push(row_band(
            x0 - FEATURE_GLOW_WIDTH,
            x1 + FEATURE_GLOW_WIDTH,
            g.lo - FEATURE_GLOW_WIDTH,
            g.hi + FEATURE_GLOW_WIDTH,
            None,
            glow,
            Stroke::NONE,
        ));
    }

    result.push(row_band(
        x0,
        x1,
        g.lo,
        g.hi,
        arrow,
        style.fill,
        style.stroke,
    ));

    result
}

fn letter(frame: &LinearFrame, bp: f32, y: f32, ch: char, color: Color32) -> MapShape {
    MapShape::text(
        pos2(frame.position_to_x(bp), y),
        Align2::CENTER_CENTER,
        ch.to_string(),
        SEQ_FONT_SIZE,
        color,
    )
}

fn draw_sequence(input: &MapInput, frame: &LinearFrame, config: &MapConfig) -> Vec<MapShape> {
    let mut result = Vec::new();

    let data = input.data;
    let [y_fwd, y_rev, y_aa] = SEQ_ROW_OFFSETS_LINEAR.map(|o| frame.backbone_y + o);
    let (first, last) = frame.visible_range();

    // Pad so codons straddling the edges are included.
    let start = (first.floor() as usize).saturating_sub(2);
    let end = ((last.ceil() as usize) + 2).min(frame.seq_len);

    let frame_offset = config.translation_frame as usize % 3;

    for bp in start..end {
        let Some(sym) = data.symbol_at(bp) else {
            continue;
        };
        let comp = complement(sym);
        let x_bp = bp as f32 + 0.5;

        result.push(letter(frame, x_bp, y_fwd, sym as char, nt_color(sym)));
        result.push(letter(frame, x_bp, y_rev, comp as char, nt_color(comp)));

        if !config.show_translation || bp % 3 != frame_offset {
            continue;
        }

        let (Some(b), Some(c)) = (data.symbol_at(bp + 1), data.symbol_at(bp + 2)) else {
            continue;
        };
        let aa = translate_codon([sym, b, c]);

        if aa.is_stop() {
            result.push(row_band(
                frame.position_to_x(bp as f32),
                frame.position_to_x(bp as f32 + 3.),
                y_aa - STOP_HIGHLIGHT_HALF_HEIGHT,
                y_aa + STOP_HIGHLIGHT_HALF_HEIGHT,
                None,
                STOP_CODON_COLOR.gamma_multiply(0.6),
                Stroke::NONE,
            ));
        }

        result.push(letter(
            frame,
            bp as f32 + 1.5,
            y_aa,
            aa.ident_single_letter(),
            if aa.is_stop() { Color32::WHITE } else { TEXT_COLOR },
        ));
    }

    result
}

fn label_requests(input: &MapInput, layout: &FrameLayout, frame: &LinearFrame) -> Vec<LabelRequest> {
    let by_id = input.features_by_id();
    let mut result = Vec::new();

    for g in &layout.features {
        let Some(feature) = by_id.get(&g.id) else {
            continue;
        };
        let Some((x0, x1, _, _)) = clip_range(frame, g.range) else {
            continue;
        };

        let arrow = if g.directional {
            arrow_len((g.range.end - g.range.start) as f32 * frame.px_per_bp())
        } else {
            0.
        };

        result.push(LabelRequest {
            feature_id: g.id,
            text: feature.label(),
            tier: input.label_tier(feature),
            anchor: LabelAnchor::Row {
                x: (x0 + x1) / 2.,
                mid_y: g.mid(),
                edge_y: g.hi,
            },
            inline_room: x1 - x0 - arrow,
            thickness: g.thickness,
            color: TEXT_COLOR,
        });
    }

    result
}

pub(super) fn draw(
    input: &MapInput,
    layout: &FrameLayout,
    frame: &LinearFrame,
    config: &MapConfig,
    measure: &dyn TextMeasure,
) -> (Vec<MapShape>, Vec<LabelRecord>) {
    let mut shapes = Vec::new();
    let y = frame.backbone_y;

    if config.show_ruler {
        shapes.append(&mut draw_ticks(frame));
    }

    let x_start = frame.position_to_x(0.).max(frame.left);
    let x_end = frame.position_to_x(frame.seq_len as f32).min(frame.right);
    shapes.push(MapShape::segment(
        pos2(x_start, y),
        pos2(x_end, y),
        Stroke::new(BACKBONE_WIDTH, BACKBONE_COLOR),
    ));

    if let Some(sel) = input.view.selection {
        // Linear selections never wrap; normalize one caught mid-drag.
        let sel = SeqRange::new(sel.start.min(sel.end), sel.start.max(sel.end));
        if let Some((x0, x1, _, _)) = clip_range(frame, sel) {
            let (_, lanes_bottom) = layout.lanes.extent(layout.num_tracks);
            shapes.push(row_band(
                x0,
                x1,
                y - 8.,
                lanes_bottom.max(y + 8.),
                None,
                SELECTION_FILL,
                Stroke::new(1., SELECTION_STROKE),
            ));
        }
    }

    if config.show_ghosts {
        for ghost in input.ghosts {
            let Some((x0, x1, _, _)) = clip_range(frame, ghost.range) else {
                continue;
            };
            let c = ghost.color;

            shapes.push(dashed(row_band(
                x0,
                x1,
                y - GHOST_HALF_HEIGHT,
                y + GHOST_HALF_HEIGHT,
                None,
                Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), 60),
                Stroke::new(1., c),
            )));
        }
    }

    let by_id = input.features_by_id();
    for g in &layout.features {
        if let Some(feature) = by_id.get(&g.id) {
            shapes.append(&mut draw_feature(input, frame, g, feature));
        }
    }

    if layout.show_sequence {
        shapes.append(&mut draw_sequence(input, frame, config));
    }

    let mut labels = Vec::new();
    if config.show_labels {
        let space = LabelSpace::Linear {
            base_y: layout.lanes.extent(layout.num_tracks).1 + LABEL_CLEARANCE,
        };

        let placements = place_labels(
            label_requests(input, layout, frame),
            &space,
            frame.viewport,
            config.font_size,
            measure,
        );

        let (mut label_shapes, records) = label_shapes(placements, config.font_size);
        shapes.append(&mut label_shapes);
        labels = records;
    }

    // Status line, top left.
    let mut status = format!(
        "{} bp  {}",
        format_thousands(frame.seq_len),
        input.data.topology.to_string()
    );
    if !input.data.name.is_empty() {
        status = format!("{}  {status}", input.data.name);
    }
    shapes.push(MapShape::text(
        frame.viewport.left_top() + vec2(8., 6.),
        Align2::LEFT_TOP,
        status,
        config.font_size - 1.,
        TEXT_COLOR_DIM,
    ));

    if let Some(id) = input.view.selected.first() {
        if let (Some(g), Some(feature)) = (layout.feature(*id), by_id.get(id)) {
            if let Some((x0, x1, _, _)) = clip_range(frame, g.range) {
                let anchor = pos2((x0 + x1) / 2., g.lo - 4.);
                let text = format!(
                    "{}: {} bp",
                    feature.label(),
                    feature.span(frame.seq_len, input.data.topology)
                );
                shapes.extend(tooltip(anchor, text, measure));
            }
        }
    }

    (shapes, labels)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Pos2, Rect};

    use super::*;
    use crate::projection::Projection;
    use crate::sequence::SeqTopology;

    #[test]
    fn test_clip_range() {
        let viewport = Rect::from_min_size(Pos2::ZERO, vec2(800., 600.));
        let mut proj = Projection::new(SeqTopology::Linear);
        proj.zoom_by(4.);
        proj.pan_by(200., viewport, 1_000);
        let frame = LinearFrame::new(&proj, viewport, 1_000);

        let (first, last) = frame.visible_range();
        assert!(first > 0.);

        // Starts before the view: start clipped, end visible.
        let range = SeqRange::new(0, (first + 10.) as usize);
        let (x0, _, start_visible, end_visible) = clip_range(&frame, range).unwrap();
        assert_eq!(x0, frame.left);
        assert!(!start_visible && end_visible);

        // Past the view.
        let range = SeqRange::new(last as usize + 5, 1_000);
        assert!(clip_range(&frame, range).is_none());

        // Degenerate.
        assert!(clip_range(&frame, SeqRange::new(500, 400)).is_none());
    }
}
