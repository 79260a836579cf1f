use core::f32::consts::TAU;
use std::num::ParseIntError;

use eframe::egui::Color32;

/// Hermite easing, `t²(3 − 2t)`, with `t` clamped to [0, 1].
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0., 1.);
    t * t * (3. - 2. * t)
}

/// Wrap an angle, in radians, into [0, τ).
pub fn normalize_angle(angle: f32) -> f32 {
    let result = angle.rem_euclid(TAU);
    // `rem_euclid` can return τ itself for tiny negative inputs, due to rounding.
    if result >= TAU {
        0.
    } else {
        result
    }
}

/// Parse a `#rrggbb` string. A missing leading `#` is tolerated.
pub fn color_from_hex(hex: &str) -> Result<Color32, ParseIntError> {
    let hex = hex.trim().trim_start_matches('#');

    // Route short or non-ASCII input through the integer parser so it produces a normal error.
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2).unwrap_or(""), 16);

    Ok(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

pub fn color_to_hex(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

/// Format a sequence position for ruler labels; values ≥1000 are shown in thousands, eg "12k".
pub fn format_bp_short(bp: usize) -> String {
    if bp < 1_000 {
        return bp.to_string();
    }

    if bp % 1_000 == 0 {
        format!("{}k", bp / 1_000)
    } else {
        let v = format!("{:.1}", bp as f32 / 1_000.);
        format!("{}k", v.trim_end_matches('0').trim_end_matches('.'))
    }
}

/// Add thousands separators, for status text.
pub fn format_thousands(val: usize) -> String {
    let digits = val.to_string();
    let mut result = String::new();

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}
