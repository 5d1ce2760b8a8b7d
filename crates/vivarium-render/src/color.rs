//! Packed colors, HSV conversion, and the color parameters.

use std::fmt;

/// An opaque color packed as `0xAARRGGBB`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

/// Color of dead cells.
pub const BACKGROUND: Color = Color::BLACK;

impl Color {
    /// Opaque black.
    pub const BLACK: Color = Color(0xFF00_0000);

    /// Build an opaque color from 8-bit channels.
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Color(0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// The `(r, g, b)` channels.
    pub const fn rgb(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:08X})", self.0)
    }
}

#[inline]
fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Convert hue (degrees), saturation and value (both `[0, 1]`) to a color.
///
/// Hue wraps modulo 360. Saturation and value are clamped.
pub fn hsv_to_color(hue: f32, saturation: f32, value: f32) -> Color {
    let s = saturation.clamp(0.0, 1.0);
    let v = value.clamp(0.0, 1.0);
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = v * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Color::from_rgb(channel(r + m), channel(g + m), channel(b + m))
}

/// Parameters of the age-to-color mapping.
///
/// Newborn cells are drawn at `new_brightness`; the oldest cells fade
/// towards `old_brightness`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorParams {
    /// Hue in degrees, `[0, 360)`. Default: 300.
    pub hue: f32,
    /// Saturation, `[0, 1]`. Default: 1.0.
    pub saturation: f32,
    /// Brightness of age-1 cells, `[0, 1]`. Default: 1.0.
    pub new_brightness: f32,
    /// Brightness approached by the oldest cells, `[0, 1]`. Default: 0.6.
    pub old_brightness: f32,
}

impl Default for ColorParams {
    fn default() -> Self {
        Self {
            hue: 300.0,
            saturation: 1.0,
            new_brightness: 1.0,
            old_brightness: 0.6,
        }
    }
}

impl ColorParams {
    /// Upper bound of the hue range.
    pub const MAX_HUE: f32 = 360.0;

    /// Whether every parameter is a finite number.
    pub fn is_finite(&self) -> bool {
        self.hue.is_finite()
            && self.saturation.is_finite()
            && self.new_brightness.is_finite()
            && self.old_brightness.is_finite()
    }

    /// Bring every parameter into range.
    ///
    /// Non-finite values fall back to the default; hue wraps into
    /// `[0, 360)`; the rest clamp to `[0, 1]`. Returns the result and
    /// whether anything was adjusted.
    pub fn sanitized(self) -> (Self, bool) {
        let defaults = Self::default();
        let unit = |v: f32, fallback: f32| {
            if v.is_finite() {
                v.clamp(0.0, 1.0)
            } else {
                fallback
            }
        };
        let hue = if self.hue.is_finite() {
            self.hue.rem_euclid(Self::MAX_HUE)
        } else {
            defaults.hue
        };
        let out = Self {
            hue,
            saturation: unit(self.saturation, defaults.saturation),
            new_brightness: unit(self.new_brightness, defaults.new_brightness),
            old_brightness: unit(self.old_brightness, defaults.old_brightness),
        };
        (out, out != self)
    }
}
