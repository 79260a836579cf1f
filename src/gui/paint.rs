//! Converts the map's display list to egui shapes.

use eframe::{
    egui::{Align2, Color32, FontId, Pos2, Shape, Stroke},
    emath::Rot2,
    epaint::{text::Fonts, Mesh, RectShape, TextShape},
};

use crate::{
    labels::TextMeasure,
    map::prims::{band_outline, MapShape},
};

const DASH_LEN: f32 = 5.;
const DASH_GAP: f32 = 4.;

/// Map text is set in the monospace font, so glyph widths here match the ones label placement
/// measured with.
pub fn map_font(size: f32) -> FontId {
    FontId::monospace(size)
}

impl TextMeasure for Fonts {
    fn char_width(&self, c: char, size: f32) -> f32 {
        self.glyph_width(&map_font(size), c)
    }
}

/// Fill a band as a triangle strip between its two edges, plus its tip.
fn band_mesh(edge_a: &[Pos2], edge_b: &[Pos2], tip: Option<(Pos2, bool)>, fill: Color32) -> Mesh {
    let mut mesh = Mesh::default();
    let n = edge_a.len().min(edge_b.len());
    if n == 0 {
        return mesh;
    }

    for i in 0..n {
        mesh.colored_vertex(edge_a[i], fill);
        mesh.colored_vertex(edge_b[i], fill);
    }

    for i in 0..n.saturating_sub(1) {
        let a = 2 * i as u32;
        mesh.add_triangle(a, a + 1, a + 2);
        mesh.add_triangle(a + 1, a + 3, a + 2);
    }

    if let Some((point, at_end)) = tip {
        let base = if at_end { 2 * (n - 1) as u32 } else { 0 };
        let tip_i = mesh.vertices.len() as u32;
        mesh.colored_vertex(point, fill);
        mesh.add_triangle(base, base + 1, tip_i);
    }

    mesh
}

fn outline(points: Vec<Pos2>, closed: bool, stroke: Stroke, dashed: bool, result: &mut Vec<Shape>) {
    if stroke.width <= 0. || points.len() < 2 {
        return;
    }

    if dashed {
        let mut points = points;
        if closed {
            if let Some(first) = points.first().copied() {
                points.push(first);
            }
        }
        result.extend(Shape::dashed_line(&points, stroke, DASH_LEN, DASH_GAP));
    } else if closed {
        result.push(Shape::closed_line(points, stroke));
    } else {
        result.push(Shape::line(points, stroke));
    }
}

fn text_shape(
    fonts: &Fonts,
    pos: Pos2,
    anchor: Align2,
    text: &str,
    size: f32,
    color: Color32,
    angle: f32,
) -> Shape {
    let galley = fonts.layout_no_wrap(text.to_owned(), map_font(size), color);

    // Anchor the unrotated text, then rotate its offset from the anchor point; egui rotates text
    // around the galley's top left corner.
    let rect = anchor.anchor_size(pos, galley.size());
    let offset = rect.min - pos;
    let top_left = if angle == 0. {
        rect.min
    } else {
        pos + Rot2::from_angle(angle) * offset
    };

    Shape::Text(TextShape::new(top_left, galley, color).with_angle(angle))
}

/// Convert a display list into egui shapes.
pub fn to_egui_shapes(shapes: &[MapShape], fonts: &Fonts) -> Vec<Shape> {
    let mut result = Vec::with_capacity(shapes.len());

    for shape in shapes {
        match shape {
            MapShape::Band {
                edge_a,
                edge_b,
                tip,
                fill,
                stroke,
                dashed,
            } => {
                if *fill != Color32::TRANSPARENT {
                    let mesh = band_mesh(edge_a, edge_b, tip.map(|t| (t.point, t.at_end)), *fill);
                    result.push(Shape::mesh(mesh));
                }
                outline(band_outline(edge_a, edge_b, *tip), true, *stroke, *dashed, &mut result);
            }
            MapShape::Polyline {
                points,
                stroke,
                closed,
                dashed,
            } => outline(points.clone(), *closed, *stroke, *dashed, &mut result),
            MapShape::Segment { points, stroke } => {
                result.push(Shape::line_segment(*points, *stroke))
            }
            MapShape::Rect {
                rect,
                rounding,
                fill,
                stroke,
            } => result.push(Shape::Rect(RectShape::new(*rect, *rounding, *fill, *stroke))),
            MapShape::Text {
                pos,
                anchor,
                text,
                size,
                color,
                angle,
            } => result.push(text_shape(fonts, *pos, *anchor, text, *size, *color, *angle)),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn test_band_mesh_with_tip() {
        let a = [pos2(0., 0.), pos2(10., 0.), pos2(20., 0.)];
        let b = [pos2(0., 10.), pos2(10., 10.), pos2(20., 10.)];

        let mesh = band_mesh(&a, &b, Some((pos2(26., 5.), true)), Color32::RED);
        assert_eq!(mesh.vertices.len(), 7);
        // Two triangles per quad, plus the tip.
        assert_eq!(mesh.indices.len(), 3 * 5);
        assert_eq!(&mesh.indices[12..], &[4, 5, 6]);

        let mesh = band_mesh(&a, &b, Some((pos2(-6., 5.), false)), Color32::RED);
        assert_eq!(&mesh.indices[12..], &[0, 1, 6]);
    }

    #[test]
    fn test_band_mesh_empty() {
        assert!(band_mesh(&[], &[], None, Color32::RED).vertices.is_empty());
    }
}
