//! Lazily rebuilt age-to-color lookup table.

use vivarium_core::{CellAge, DEAD, MAX_AGE};

use crate::color::{hsv_to_color, Color, ColorParams, BACKGROUND};

/// Lookup table from cell age to display color.
///
/// Entry `i` holds the color of age `i + 1`. Brightness interpolates
/// linearly from `new_brightness` (age 1) towards `old_brightness`
/// (age [`MAX_AGE`]). Dead cells never touch the table; they map to
/// [`BACKGROUND`].
///
/// The table starts invalid. Callers check [`is_valid`](Self::is_valid)
/// and [`rebuild`](Self::rebuild) before coloring a frame.
#[derive(Clone, Debug)]
pub struct ColorTable {
    entries: Vec<Color>,
    params: ColorParams,
    valid: bool,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorTable {
    /// An invalid table sized for ages `1..=MAX_AGE`.
    pub fn new() -> Self {
        Self {
            entries: vec![BACKGROUND; MAX_AGE as usize],
            params: ColorParams::default(),
            valid: false,
        }
    }

    /// Whether the entries reflect the current parameters.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Mark the table stale; the next user must rebuild it.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Parameters the entries were last built from.
    pub fn params(&self) -> ColorParams {
        self.params
    }

    /// The raw entries, indexed by `age - 1`.
    pub fn entries(&self) -> &[Color] {
        &self.entries
    }

    /// Refill every entry from `params` and mark the table valid.
    ///
    /// Non-finite parameters are a caller bug; debug builds panic, release
    /// builds substitute defaults and clamp.
    pub fn rebuild(&mut self, params: ColorParams) {
        debug_assert!(params.is_finite(), "non-finite color params: {params:?}");
        let (params, _) = params.sanitized();
        let max = MAX_AGE as f32;
        let span = params.new_brightness - params.old_brightness;
        for (i, entry) in self.entries.iter_mut().enumerate() {
            let brightness = params.old_brightness + span * (max - i as f32) / max;
            *entry = hsv_to_color(params.hue, params.saturation, brightness);
        }
        self.params = params;
        self.valid = true;
    }

    /// Color for a cell of the given age.
    #[inline]
    pub fn color_for(&self, age: CellAge) -> Color {
        if age == DEAD {
            BACKGROUND
        } else {
            self.entries[usize::from(age.min(MAX_AGE)) - 1]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn built(params: ColorParams) -> ColorTable {
        let mut t = ColorTable::new();
        t.rebuild(params);
        t
    }

    #[test]
    fn starts_invalid_and_rebuild_validates() {
        let mut t = ColorTable::new();
        assert!(!t.is_valid());
        t.rebuild(ColorParams::default());
        assert!(t.is_valid());
        t.invalidate();
        assert!(!t.is_valid());
    }

    #[test]
    fn newborn_gets_new_brightness_and_oldest_nears_old() {
        let t = built(ColorParams::default());
        assert_eq!(t.color_for(1), hsv_to_color(300.0, 1.0, 1.0));
        let oldest = 0.6 + 0.4 / MAX_AGE as f32;
        assert_eq!(t.color_for(MAX_AGE), hsv_to_color(300.0, 1.0, oldest));
    }

    #[test]
    fn dead_is_background() {
        let t = built(ColorParams::default());
        assert_eq!(t.color_for(DEAD), BACKGROUND);
    }

    #[test]
    fn ages_above_max_use_last_entry() {
        let t = built(ColorParams::default());
        assert_eq!(t.color_for(u8::MAX), t.color_for(MAX_AGE));
    }

    #[test]
    fn brightness_is_monotone_in_age() {
        let t = built(ColorParams {
            hue: 0.0,
            saturation: 1.0,
            new_brightness: 1.0,
            old_brightness: 0.0,
        });
        let reds: Vec<u8> = t.entries().iter().map(|c| c.rgb().0).collect();
        assert!(reds.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(reds[0], 255);
    }

    fn arb_params() -> impl Strategy<Value = ColorParams> {
        (0.0f32..360.0, 0.5f32..=1.0, 0.5f32..=1.0, 0.5f32..=1.0).prop_map(|(h, s, n, o)| {
            ColorParams {
                hue: h,
                saturation: s,
                new_brightness: n,
                old_brightness: o,
            }
        })
    }

    proptest! {
        #[test]
        fn rebuild_is_deterministic(p in arb_params()) {
            let (a, b) = (built(p), built(p));
            prop_assert_eq!(a.entries(), b.entries());
        }

        #[test]
        fn each_parameter_affects_the_table(
            p in arb_params(),
            hue_shift in 60.0f32..300.0,
            delta in 0.25f32..0.5,
        ) {
            let base = built(p);
            let flip = |v: f32| if v - delta >= 0.0 { v - delta } else { v + delta };

            let hue = built(ColorParams { hue: (p.hue + hue_shift) % 360.0, ..p });
            prop_assert_ne!(base.entries(), hue.entries());

            let sat = built(ColorParams { saturation: flip(p.saturation), ..p });
            prop_assert_ne!(base.entries(), sat.entries());

            let new_b = built(ColorParams { new_brightness: flip(p.new_brightness), ..p });
            prop_assert_ne!(base.entries(), new_b.entries());

            let old_b = built(ColorParams { old_brightness: flip(p.old_brightness), ..p });
            prop_assert_ne!(base.entries(), old_b.entries());
        }
    }
}
