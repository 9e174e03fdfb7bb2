//! Colour model conversions.
//!
//! Three representations are used by the pipeline:
//!
//! - [`Rgb`]: device RGB as delivered by the remote framebuffer.
//! - [`Hsv`]: hue/saturation/value, with hue in 256 steps so that
//!   additive hue shifts are plain `u8` wrapping arithmetic.
//! - [`Tone`]: full-range YCbCr, the space every colour decision is
//!   made in. Distance is the sum of absolute channel differences.

// ── Rgb ──────────────────────────────────────────────────────────

/// An 8-bit-per-channel RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// RGB of a Spectrum colour code (`0bBGRB`: bright, green, red, blue).
    ///
    /// Bright channels sit at 240, normal ones at 200. Blue and bright
    /// blue get a +15 lift on the blue channel; the real ULA output for
    /// those two is noticeably brighter than a plain 200/240 level.
    pub fn from_spectrum(code: u8) -> Self {
        let level = if code & 8 != 0 { 240 } else { 200 };
        let on = |bit: u8| if code & bit != 0 { level } else { 0 };
        let mut rgb = Self::new(on(2), on(4), on(1));
        if code & 7 == 1 {
            rgb.b += 15;
        }
        rgb
    }

    /// RGB of a ULAplus palette byte (`GGGRRRBB`).
    ///
    /// The missing low blue bit is the OR of the two stored ones, as the
    /// ULAplus hardware does it.
    pub fn from_grb332(byte: u8) -> Self {
        let g = (byte >> 5) & 7;
        let r = (byte >> 2) & 7;
        let b2 = byte & 3;
        let b = (b2 << 1) | u8::from(b2 != 0);
        let widen = |v: u8| ((v as u16 * 255 + 3) / 7) as u8;
        Self::new(widen(r), widen(g), widen(b))
    }

    /// Nearest ULAplus palette byte for this colour.
    pub fn to_grb332(self) -> u8 {
        let narrow = |v: u8, levels: u16| ((v as u16 * levels + 127) / 255) as u8;
        (narrow(self.g, 7) << 5) | (narrow(self.r, 7) << 2) | narrow(self.b, 3)
    }

    /// Convert to the tone space.
    pub fn to_tone(self) -> Tone {
        let (r, g, b) = (self.r as f64, self.g as f64, self.b as f64);
        Tone {
            y: clamp_round(0.299 * r + 0.587 * g + 0.114 * b),
            cb: clamp_round(128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b),
            cr: clamp_round(128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b),
        }
    }

    /// Convert to hue/saturation/value.
    pub fn to_hsv(self) -> Hsv {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let chroma = (max - min) as f64;

        // Hue is undefined for greys; call it 0.
        let sector = if max == min {
            0.0
        } else if max == self.r {
            ((self.g as f64 - self.b as f64) / chroma).rem_euclid(6.0)
        } else if max == self.g {
            (self.b as f64 - self.r as f64) / chroma + 2.0
        } else {
            (self.r as f64 - self.g as f64) / chroma + 4.0
        };

        let s = if max == 0 {
            0
        } else {
            clamp_round(chroma * 255.0 / max as f64)
        };

        Hsv {
            h: ((sector * 256.0 / 6.0).round() as u32 % 256) as u8,
            s,
            v: max,
        }
    }
}

// ── Hsv ──────────────────────────────────────────────────────────

/// Hue/saturation/value. `h` covers the full circle in 256 steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub fn to_rgb(self) -> Rgb {
        let sector = self.h as f64 * 6.0 / 256.0;
        let chroma = self.s as f64 * self.v as f64 / 255.0;
        let x = chroma * (1.0 - ((sector % 2.0) - 1.0).abs());
        let m = self.v as f64 - chroma;

        let c = clamp_round(chroma + m);
        let x = clamp_round(x + m);
        let m = clamp_round(m);

        match sector as u8 {
            0 => Rgb::new(c, x, m),
            1 => Rgb::new(x, c, m),
            2 => Rgb::new(m, c, x),
            3 => Rgb::new(m, x, c),
            4 => Rgb::new(x, m, c),
            _ => Rgb::new(c, m, x),
        }
    }
}

// ── Tone ─────────────────────────────────────────────────────────

/// A colour in full-range YCbCr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tone {
    pub y: u8,
    pub cb: u8,
    pub cr: u8,
}

impl Tone {
    /// Tone of RGB black.
    pub const BLACK: Tone = Tone {
        y: 0,
        cb: 128,
        cr: 128,
    };

    pub const fn new(y: u8, cb: u8, cr: u8) -> Self {
        Self { y, cb, cr }
    }

    pub fn to_rgb(self) -> Rgb {
        let y = self.y as f64;
        let cb = self.cb as f64 - 128.0;
        let cr = self.cr as f64 - 128.0;
        Rgb {
            r: clamp_round(y + 1.402 * cr),
            g: clamp_round(y - 0.344_136 * cb - 0.714_136 * cr),
            b: clamp_round(y + 1.772 * cb),
        }
    }

    /// Perceptual distance: sum of absolute channel differences.
    #[inline]
    pub fn distance(self, other: Tone) -> u32 {
        self.y.abs_diff(other.y) as u32
            + self.cb.abs_diff(other.cb) as u32
            + self.cr.abs_diff(other.cr) as u32
    }

    #[inline]
    pub fn channels(self) -> [u8; 3] {
        [self.y, self.cb, self.cr]
    }

    #[inline]
    pub fn from_channels(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::BLACK
    }
}

impl From<Rgb> for Tone {
    fn from(rgb: Rgb) -> Self {
        rgb.to_tone()
    }
}

/// Round and clamp a channel value into `0..=255`.
#[inline]
pub(crate) fn clamp_round(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> impl Iterator<Item = Rgb> {
        (0..=255u8).step_by(15).flat_map(|r| {
            (0..=255u8)
                .step_by(15)
                .flat_map(move |g| (0..=255u8).step_by(15).map(move |b| Rgb::new(r, g, b)))
        })
    }

    #[test]
    fn spectrum_codes() {
        assert_eq!(Rgb::from_spectrum(0), Rgb::new(0, 0, 0));
        assert_eq!(Rgb::from_spectrum(2), Rgb::new(200, 0, 0));
        assert_eq!(Rgb::from_spectrum(7), Rgb::new(200, 200, 200));
        assert_eq!(Rgb::from_spectrum(15), Rgb::new(240, 240, 240));
        // blue lift
        assert_eq!(Rgb::from_spectrum(1), Rgb::new(0, 0, 215));
        assert_eq!(Rgb::from_spectrum(9), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::from_spectrum(3).b, 200);
    }

    #[test]
    fn tone_round_trip_within_one() {
        for rgb in samples() {
            let back = rgb.to_tone().to_rgb();
            assert!(rgb.r.abs_diff(back.r) <= 1, "{rgb:?} -> {back:?}");
            assert!(rgb.g.abs_diff(back.g) <= 1, "{rgb:?} -> {back:?}");
            assert!(rgb.b.abs_diff(back.b) <= 1, "{rgb:?} -> {back:?}");
        }
    }

    #[test]
    fn hsv_round_trip() {
        for rgb in samples() {
            let back = rgb.to_hsv().to_rgb();
            let max_in = rgb.r.max(rgb.g).max(rgb.b);
            let max_out = back.r.max(back.g).max(back.b);
            assert!(max_in.abs_diff(max_out) <= 1, "{rgb:?} -> {back:?}");
            // Hue rounds to half of a 1/256 turn, i.e. 3/256 of a sector.
            // The middle channel moves by chroma times that, under 3 at
            // full chroma. Saturation rounding shifts the minimum by less.
            assert!(rgb.r.abs_diff(back.r) <= 3, "{rgb:?} -> {back:?}");
            assert!(rgb.g.abs_diff(back.g) <= 3, "{rgb:?} -> {back:?}");
            assert!(rgb.b.abs_diff(back.b) <= 3, "{rgb:?} -> {back:?}");
        }
    }

    #[test]
    fn greys_have_zero_hue() {
        for v in [0u8, 1, 77, 128, 255] {
            let hsv = Rgb::new(v, v, v).to_hsv();
            assert_eq!(hsv.h, 0);
            assert_eq!(hsv.s, 0);
            assert_eq!(hsv.v, v);
            assert_eq!(hsv.to_rgb(), Rgb::new(v, v, v));
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Rgb::new(200, 0, 0).to_tone();
        let b = Rgb::new(0, 200, 240).to_tone();
        assert_eq!(a.distance(b), b.distance(a));
        assert_eq!(a.distance(a), 0);
        assert!(a.distance(b) > 0);
    }

    #[test]
    fn grb332_round_trip() {
        for byte in [0x00u8, 0xff, 0x1c, 0xe0, 0x03, 0x92] {
            assert_eq!(Rgb::from_grb332(byte).to_grb332(), byte);
        }
        assert_eq!(Rgb::from_grb332(0xff), Rgb::new(255, 255, 255));
    }
}
