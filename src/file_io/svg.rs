//! Exporting a rendered frame as SVG.

use std::{fs, io, path::Path as FilePath};

use eframe::egui::{Align, Color32, Pos2, Stroke};
use svg::{
    node::element::{path::Data, Line, Path, Rectangle, Text},
    Document,
};

use crate::{
    map::{prims::band_outline, prims::MapShape, MapFrame, BACKGROUND_COLOR},
    util::color_to_hex,
};

const DASH_PATTERN: &str = "4 3";

/// Color, and opacity in [0, 1].
fn paint(color: Color32) -> (String, f32) {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    (
        color_to_hex(Color32::from_rgb(r, g, b)),
        a as f32 / 255.,
    )
}

fn fill_attrs(fill: Color32) -> (String, f32) {
    if fill == Color32::TRANSPARENT {
        ("none".to_owned(), 1.)
    } else {
        paint(fill)
    }
}

fn stroke_attrs(stroke: Stroke) -> (String, f32, f32) {
    if stroke.width <= 0. || stroke.color == Color32::TRANSPARENT {
        ("none".to_owned(), 1., 0.)
    } else {
        let (color, opacity) = paint(stroke.color);
        (color, opacity, stroke.width)
    }
}

fn path_data(points: &[Pos2], closed: bool) -> Option<Data> {
    let (first, rest) = points.split_first()?;

    let mut data = Data::new().move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }
    if closed {
        data = data.close();
    }
    Some(data)
}

fn path(points: &[Pos2], closed: bool, fill: Color32, stroke: Stroke, dashed: bool) -> Option<Path> {
    let (fill, fill_opacity) = fill_attrs(fill);
    let (stroke_color, stroke_opacity, stroke_width) = stroke_attrs(stroke);

    let mut result = Path::new()
        .set("d", path_data(points, closed)?)
        .set("fill", fill)
        .set("fill-opacity", fill_opacity)
        .set("stroke", stroke_color)
        .set("stroke-opacity", stroke_opacity)
        .set("stroke-width", stroke_width)
        .set("stroke-linejoin", "round");

    if dashed {
        result = result.set("stroke-dasharray", DASH_PATTERN);
    }
    Some(result)
}

fn text(pos: Pos2, anchor: eframe::egui::Align2, content: &str, size: f32, color: Color32, angle: f32) -> Text {
    let text_anchor = match anchor.x() {
        Align::Min => "start",
        Align::Center => "middle",
        Align::Max => "end",
    };
    let baseline = match anchor.y() {
        Align::Min => "hanging",
        Align::Center => "central",
        Align::Max => "text-after-edge",
    };
    let (fill, opacity) = paint(color);

    let mut result = Text::new(content)
        .set("x", pos.x)
        .set("y", pos.y)
        .set("font-family", "monospace")
        .set("font-size", size)
        .set("text-anchor", text_anchor)
        .set("dominant-baseline", baseline)
        .set("fill", fill)
        .set("fill-opacity", opacity);

    if angle != 0. {
        result = result.set(
            "transform",
            format!("rotate({} {} {})", angle.to_degrees(), pos.x, pos.y),
        );
    }
    result
}

/// Build an SVG document from a frame's display list, one element per shape.
pub fn frame_to_svg(frame: &MapFrame) -> String {
    let vp = frame.viewport;
    let (bg, _) = paint(BACKGROUND_COLOR);

    let mut doc = Document::new()
        .set("viewBox", (vp.left(), vp.top(), vp.width(), vp.height()))
        .set("width", vp.width())
        .set("height", vp.height())
        .add(
            Rectangle::new()
                .set("x", vp.left())
                .set("y", vp.top())
                .set("width", vp.width())
                .set("height", vp.height())
                .set("fill", bg),
        );

    for shape in &frame.shapes {
        doc = match shape {
            MapShape::Band {
                edge_a,
                edge_b,
                tip,
                fill,
                stroke,
                dashed,
            } => {
                let outline = band_outline(edge_a, edge_b, *tip);
                match path(&outline, true, *fill, *stroke, *dashed) {
                    Some(p) => doc.add(p),
                    None => doc,
                }
            }
            MapShape::Polyline {
                points,
                stroke,
                closed,
                dashed,
            } => match path(points, *closed, Color32::TRANSPARENT, *stroke, *dashed) {
                Some(p) => doc.add(p),
                None => doc,
            },
            MapShape::Segment { points, stroke } => {
                let (color, opacity, width) = stroke_attrs(*stroke);
                doc.add(
                    Line::new()
                        .set("x1", points[0].x)
                        .set("y1", points[0].y)
                        .set("x2", points[1].x)
                        .set("y2", points[1].y)
                        .set("stroke", color)
                        .set("stroke-opacity", opacity)
                        .set("stroke-width", width),
                )
            }
            MapShape::Rect {
                rect,
                rounding,
                fill,
                stroke,
            } => {
                let (fill, fill_opacity) = fill_attrs(*fill);
                let (color, opacity, width) = stroke_attrs(*stroke);
                doc.add(
                    Rectangle::new()
                        .set("x", rect.left())
                        .set("y", rect.top())
                        .set("width", rect.width())
                        .set("height", rect.height())
                        .set("rx", *rounding)
                        .set("ry", *rounding)
                        .set("fill", fill)
                        .set("fill-opacity", fill_opacity)
                        .set("stroke", color)
                        .set("stroke-opacity", opacity)
                        .set("stroke-width", width),
                )
            }
            MapShape::Text {
                pos,
                anchor,
                text: content,
                size,
                color,
                angle,
            } => doc.add(text(*pos, *anchor, content, *size, *color, *angle)),
        };
    }

    doc.to_string()
}

pub fn export_svg(frame: &MapFrame, path: &FilePath) -> io::Result<()> {
    fs::write(path, frame_to_svg(frame))?;
    log::info!("Exported SVG to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2, Align2, Rect};

    use super::*;
    use crate::map::prims::{arc_band, circle_outline, dashed};

    fn frame(shapes: Vec<MapShape>) -> MapFrame {
        MapFrame {
            viewport: Rect::from_min_size(Pos2::ZERO, vec2(400., 300.)),
            shapes,
            layout: None,
        }
    }

    fn count(svg: &str, tag: &str) -> usize {
        svg.matches(&format!("<{tag} ")).count() + svg.matches(&format!("<{tag}>")).count()
    }

    #[test]
    fn test_one_element_per_shape() {
        let stroke = Stroke::new(1., Color32::BLACK);
        let shapes = vec![
            arc_band(
                pos2(200., 150.),
                80.,
                90.,
                0.,
                1.,
                Some((0.1, true)),
                Color32::RED,
                stroke,
            ),
            dashed(circle_outline(pos2(200., 150.), 100., stroke)),
            MapShape::segment(pos2(0., 0.), pos2(10., 10.), stroke),
            MapShape::Rect {
                rect: Rect::from_min_size(pos2(10., 10.), vec2(20., 10.)),
                rounding: 2.,
                fill: Color32::WHITE,
                stroke,
            },
            MapShape::Text {
                pos: pos2(50., 50.),
                anchor: Align2::CENTER_CENTER,
                text: "lacZ & <ori>".to_owned(),
                size: 12.,
                color: Color32::BLACK,
                angle: 0.5,
            },
        ];

        let svg = frame_to_svg(&frame(shapes));

        assert_eq!(count(&svg, "path"), 2);
        assert_eq!(count(&svg, "line"), 1);
        // The background, and the rect shape.
        assert_eq!(count(&svg, "rect"), 2);
        assert_eq!(count(&svg, "text"), 1);

        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("rotate("));
        assert!(svg.contains("text-anchor=\"middle\""));
        assert!(!svg.contains("<ori>"));
    }

    #[test]
    fn test_colors() {
        let (hex, opacity) = paint(Color32::from_rgba_unmultiplied(255, 0, 0, 51));
        assert_eq!(hex, "#ff0000");
        assert!((opacity - 0.2).abs() < 0.01);

        assert_eq!(fill_attrs(Color32::TRANSPARENT).0, "none");
    }
}
