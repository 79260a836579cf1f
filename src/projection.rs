//! Conversions between sequence position, angle or x coordinate, and screen coordinates. This
//! module owns the zoom, rotation and scroll state; it is only mutated through the methods here,
//! all of which re-clamp.

use core::f32::consts::{PI, TAU};
use core::f64::consts as f64_consts;

use eframe::egui::{pos2, Pos2, Rect};

use crate::{
    misc_types::{Feature, FeatureId},
    sequence::SeqTopology,
    util::{normalize_angle, smoothstep},
};

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 1_000.;
/// The linear view always shows at most the whole sequence.
const MIN_ZOOM_LINEAR: f32 = 1.;

// Between these zoom levels, the circle center slides from the viewport center down by one
// radius, so the top of the backbone ends up in the middle of the view.
pub const ZOOM_TRANSITION_START: f32 = 1.5;
pub const ZOOM_TRANSITION_END: f32 = 4.;

/// Radians per pixel of wheel delta.
pub const ROTATE_SPEED: f32 = 0.004;

// Of the available width or height (whichever is lower).
pub const CIRCLE_SIZE_RATIO: f32 = 0.35;

pub const LIN_MARGIN_X: f32 = 40.;
/// Distance from the top of the view to the linear backbone; leaves room for the ruler.
pub const LIN_BACKBONE_Y: f32 = 64.;

/// Return the angle in radians of a given sequence position. Position 0 is at the top
/// (12 o'clock) before rotation, and positions increase clockwise. Computed in `f64`, so every
/// integer position survives the round trip through `angle_to_position` on genome-sized
/// sequences; narrow to `f32` only for screen coordinates.
pub fn position_to_angle(bp: f64, seq_len: usize, rotation: f32) -> f64 {
    bp / seq_len as f64 * f64_consts::TAU - f64_consts::FRAC_PI_2 + rotation as f64
}

/// The fractional sequence position at an angle, in [0, seq_len).
pub fn angle_to_position_f(angle: f64, seq_len: usize, rotation: f32) -> f64 {
    let a = (angle + f64_consts::FRAC_PI_2 - rotation as f64).rem_euclid(f64_consts::TAU);
    let result = a * seq_len as f64 / f64_consts::TAU;

    if result >= seq_len as f64 {
        0.
    } else {
        result
    }
}

/// Inverse of `position_to_angle`, rounded to the nearest position.
pub fn angle_to_position(angle: f64, seq_len: usize, rotation: f32) -> usize {
    if seq_len == 0 {
        return 0;
    }
    let pos = angle_to_position_f(angle, seq_len, rotation).round() as usize;
    pos % seq_len
}

/// The zoom-dependent layout-origin easing; 0 at or below the transition start, 1 at or above
/// its end.
pub fn origin_ease(zoom: f32) -> f32 {
    let t = (zoom - ZOOM_TRANSITION_START) / (ZOOM_TRANSITION_END - ZOOM_TRANSITION_START);
    smoothstep(t)
}

/// Wrap an angle difference into (-π, π].
fn wrap_pi(angle: f32) -> f32 {
    let a = normalize_angle(angle);
    if a > PI {
        a - TAU
    } else {
        a
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    topology: SeqTopology,
    zoom: f32,
    /// Circular only. Radians, in [0, τ).
    rotation: f32,
    /// Linear only. The position at the left edge of the view.
    scroll_offset: f32,
    /// The feature the view was last auto-centered on. This keeps re-centering to once per
    /// selection change.
    last_centered: Option<FeatureId>,
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(SeqTopology::Circular)
    }
}

impl Projection {
    pub fn new(topology: SeqTopology) -> Self {
        Self {
            topology,
            zoom: 1.,
            rotation: 0.,
            scroll_offset: 0.,
            last_centered: None,
        }
    }

    pub fn topology(&self) -> SeqTopology {
        self.topology
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[cfg(test)]
    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn zoom_limits(&self) -> (f32, f32) {
        match self.topology {
            SeqTopology::Circular => (MIN_ZOOM, MAX_ZOOM),
            SeqTopology::Linear => (MIN_ZOOM_LINEAR, MAX_ZOOM),
        }
    }

    fn clamp_zoom(&mut self) {
        let (min, max) = self.zoom_limits();
        if !self.zoom.is_finite() {
            self.zoom = min;
        }
        self.zoom = self.zoom.clamp(min, max);
    }

    fn set_rotation(&mut self, rotation: f32) {
        if rotation.is_finite() {
            self.rotation = normalize_angle(rotation);
        }
    }

    /// Keep the visible window inside [0, seq_len].
    fn clamp_scroll(&mut self, seq_len: usize) {
        let visible = seq_len as f32 / self.zoom;
        let max = (seq_len as f32 - visible).max(0.);

        if !self.scroll_offset.is_finite() {
            self.scroll_offset = 0.;
        }
        self.scroll_offset = self.scroll_offset.clamp(0., max);
    }

    /// Multiplicative zoom.
    pub fn zoom_by(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0. {
            self.zoom *= factor;
        }
        self.clamp_zoom();
    }

    pub fn rotate_by(&mut self, delta: f32) {
        self.set_rotation(self.rotation + delta * ROTATE_SPEED);
    }

    /// Pan the linear view by a distance in pixels.
    pub fn pan_by(&mut self, delta_px: f32, viewport: Rect, seq_len: usize) {
        let frame = LinearFrame::new(self, viewport, seq_len);
        self.scroll_offset += delta_px * frame.bp_per_px;
        self.clamp_scroll(seq_len);
    }

    /// Zoom, keeping the sequence position under `point` fixed on screen.
    pub fn zoom_at(&mut self, factor: f32, point: Pos2, viewport: Rect, seq_len: usize) {
        if seq_len == 0 {
            self.zoom_by(factor);
            return;
        }

        match self.topology {
            SeqTopology::Circular => {
                let before = CircleFrame::new(self, viewport, seq_len);
                let (angle, _) = before.angle_distance(point);
                let pos = angle_to_position_f(angle as f64, seq_len, self.rotation);

                self.zoom_by(factor);

                // The center moves during the layout transition; re-measure the pointer angle
                // against the new center.
                let after = CircleFrame::new(self, viewport, seq_len);
                let (angle_after, _) = after.angle_distance(point);
                let rotation = angle_after as f64 + f64_consts::FRAC_PI_2
                    - pos / seq_len as f64 * f64_consts::TAU;
                self.set_rotation(rotation as f32);
            }
            SeqTopology::Linear => {
                let before = LinearFrame::new(self, viewport, seq_len);
                let pos = before.x_to_position_f(point.x);

                self.zoom_by(factor);

                let after = LinearFrame::new(self, viewport, seq_len);
                self.scroll_offset = pos - (point.x - after.left) * after.bp_per_px;
                self.clamp_scroll(seq_len);
            }
        }
    }

    /// Bring a position to the top of the circle, or the middle of the linear view.
    pub fn center_on(&mut self, pos: f32, seq_len: usize) {
        if seq_len == 0 {
            return;
        }

        match self.topology {
            SeqTopology::Circular => self.set_rotation(-pos / seq_len as f32 * TAU),
            SeqTopology::Linear => {
                let visible = seq_len as f32 / self.zoom;
                self.scroll_offset = pos - visible / 2.;
                self.clamp_scroll(seq_len);
            }
        }
    }

    /// Re-center on a newly selected feature. This runs at most once per selection change;
    /// returns true if it moved the view.
    pub fn auto_center(&mut self, selected: Option<&Feature>, seq_len: usize) -> bool {
        let Some(feature) = selected else {
            self.last_centered = None;
            return false;
        };

        if self.last_centered == Some(feature.id) {
            return false;
        }
        self.last_centered = Some(feature.id);

        let mid = feature.range.midpoint(seq_len, self.topology);
        self.center_on(mid, seq_len);
        true
    }

    /// Re-clamp against a possibly changed viewport or sequence.
    pub fn sync(&mut self, seq_len: usize) {
        self.clamp_zoom();
        if self.topology == SeqTopology::Linear {
            self.clamp_scroll(seq_len);
        }
    }
}

/// Per-frame circular geometry, derived from the projection state and the viewport.
#[derive(Clone, Debug)]
pub struct CircleFrame {
    pub seq_len: usize,
    pub rotation: f32,
    pub zoom: f32,
    pub viewport: Rect,
    pub radius: f32,
    pub center: Pos2,
    /// Layout transition progress, 0 (overview) to 1 (reading mode).
    pub ease: f32,
}

impl CircleFrame {
    pub fn new(projection: &Projection, viewport: Rect, seq_len: usize) -> Self {
        let base_radius = viewport.width().min(viewport.height()) * CIRCLE_SIZE_RATIO;
        let radius = base_radius * projection.zoom;
        let ease = origin_ease(projection.zoom);
        let vc = viewport.center();

        Self {
            seq_len,
            rotation: projection.rotation,
            zoom: projection.zoom,
            viewport,
            radius,
            center: pos2(vc.x, vc.y + ease * radius),
            ease,
        }
    }

    pub fn position_to_angle(&self, bp: f32) -> f32 {
        position_to_angle(bp as f64, self.seq_len, self.rotation) as f32
    }

    pub fn angle_to_position_f(&self, angle: f32) -> f32 {
        angle_to_position_f(angle as f64, self.seq_len, self.rotation) as f32
    }

    pub fn angle_to_position(&self, angle: f32) -> usize {
        angle_to_position(angle as f64, self.seq_len, self.rotation)
    }

    /// Screen point at an angle and radius.
    pub fn polar(&self, angle: f32, radius: f32) -> Pos2 {
        pos2(
            self.center.x + radius * angle.cos(),
            self.center.y + radius * angle.sin(),
        )
    }

    pub fn point_at(&self, bp: f32, radius: f32) -> Pos2 {
        self.polar(self.position_to_angle(bp), radius)
    }

    /// Angle (radians, screen convention) and distance of a screen point from the center.
    pub fn angle_distance(&self, pos: Pos2) -> (f32, f32) {
        let diff = pos - self.center;
        (diff.y.atan2(diff.x), diff.length())
    }

    pub fn px_per_bp(&self) -> f32 {
        self.radius * TAU / self.seq_len.max(1) as f32
    }

    /// Past the midpoint of the layout transition, tracks grow outward and text orientation
    /// follows the view rather than each label.
    pub fn is_high_zoom(&self) -> bool {
        self.ease >= 0.5
    }

    pub fn center_on_screen(&self) -> bool {
        self.viewport.contains(self.center)
    }

    /// The angle from the circle center towards the middle of the view.
    pub fn view_angle(&self) -> f32 {
        let (angle, _) = self.angle_distance(self.viewport.center());
        angle
    }

    /// The angular window that covers the viewport, as `(start, end)` with `end > start`.
    /// `None` when the center is on screen, ie everything may be visible.
    pub fn visible_arc(&self) -> Option<(f32, f32)> {
        let rect = self.viewport.expand(20.);
        if rect.contains(self.center) {
            return None;
        }

        let reference = self.view_angle();
        let mut min = f32::MAX;
        let mut max = f32::MIN;

        for corner in [
            rect.left_top(),
            rect.right_top(),
            rect.left_bottom(),
            rect.right_bottom(),
        ] {
            let (angle, _) = self.angle_distance(corner);
            let d = wrap_pi(angle - reference);
            min = min.min(d);
            max = max.max(d);
        }

        Some((reference + min, reference + max))
    }
}

/// Per-frame linear geometry.
#[derive(Clone, Debug)]
pub struct LinearFrame {
    pub seq_len: usize,
    pub zoom: f32,
    pub viewport: Rect,
    pub left: f32,
    pub right: f32,
    pub backbone_y: f32,
    pub bp_per_px: f32,
    pub scroll_offset: f32,
}

impl LinearFrame {
    pub fn new(projection: &Projection, viewport: Rect, seq_len: usize) -> Self {
        let left = viewport.left() + LIN_MARGIN_X;
        let right = (viewport.right() - LIN_MARGIN_X).max(left + 1.);
        let zoom = projection.zoom.max(MIN_ZOOM_LINEAR);
        let bp_per_px = seq_len as f32 / (right - left) / zoom;

        let visible = seq_len as f32 / zoom;
        let max_scroll = (seq_len as f32 - visible).max(0.);

        Self {
            seq_len,
            zoom,
            viewport,
            left,
            right,
            backbone_y: viewport.top() + LIN_BACKBONE_Y,
            bp_per_px,
            scroll_offset: projection.scroll_offset.clamp(0., max_scroll),
        }
    }

    pub fn position_to_x(&self, bp: f32) -> f32 {
        self.left + (bp - self.scroll_offset) / self.bp_per_px
    }

    pub fn x_to_position_f(&self, x: f32) -> f32 {
        (self.scroll_offset + (x - self.left) * self.bp_per_px).clamp(0., self.seq_len as f32)
    }

    /// Inverse of `position_to_x`, rounded, and clamped to the sequence.
    pub fn x_to_position(&self, x: f32) -> usize {
        (self.x_to_position_f(x).round() as usize).min(self.seq_len)
    }

    pub fn px_per_bp(&self) -> f32 {
        1. / self.bp_per_px
    }

    /// The visible positions, `(first, last)`.
    pub fn visible_range(&self) -> (f32, f32) {
        (
            self.scroll_offset,
            (self.scroll_offset + (self.right - self.left) * self.bp_per_px)
                .min(self.seq_len as f32),
        )
    }

    pub fn is_high_zoom(&self) -> bool {
        self.zoom >= ZOOM_TRANSITION_END
    }
}
