//! Brightness / saturation / hue adjustment.
//!
//! Runs on every rectangle the RFB engine reports as damaged and writes
//! the adjusted tones into the working [`ToneFrame`]. Value and saturation
//! are rescaled and clamped; hue is shifted and wraps.

use serde::{Deserialize, Serialize};

use crate::render::color::{Hsv, Rgb, Tone, clamp_round};
use crate::render::frame::{Rect, RemoteFramebuffer, SCREEN_HEIGHT, SCREEN_WIDTH, ToneFrame};

/// Neutral setting for every shift and scale.
pub const NEUTRAL: u8 = 128;

// ── Tweak ────────────────────────────────────────────────────────

/// A (shift, scale) pair. 128/128 leaves the channel untouched.
///
/// `shift` moves the channel by `2 × (shift − 128)`; `scale` multiplies
/// it by `scale / (256 − scale)`, so 64 halves and 192 triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweak {
    pub shift: u8,
    pub scale: u8,
}

impl Tweak {
    pub const NEUTRAL: Tweak = Tweak {
        shift: NEUTRAL,
        scale: NEUTRAL,
    };

    pub const fn new(shift: u8, scale: u8) -> Self {
        Self { shift, scale }
    }

    fn offset(self) -> f64 {
        2.0 * (self.shift as f64 - NEUTRAL as f64)
    }

    fn gain(self) -> f64 {
        self.scale as f64 / (256.0 - self.scale as f64)
    }

    /// Rescale about the mid-grey point.
    fn apply_centred(self, v: u8) -> u8 {
        clamp_round((v as f64 + self.offset() - 127.5) * self.gain() + 127.5)
    }

    /// Rescale about zero.
    fn apply_from_zero(self, v: u8) -> u8 {
        clamp_round((v as f64 + self.offset()) * self.gain())
    }
}

impl Default for Tweak {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

// ── TonalAdjustment ──────────────────────────────────────────────

/// Process-wide tonal settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TonalAdjustment {
    pub value: Tweak,
    pub saturation: Tweak,
    /// Additive hue shift in 256ths of a turn, offset by 128.
    pub hue_shift: u8,
    /// Drop all saturation.
    pub monochrome: bool,
}

impl Default for TonalAdjustment {
    fn default() -> Self {
        Self {
            value: Tweak::NEUTRAL,
            saturation: Tweak::NEUTRAL,
            hue_shift: NEUTRAL,
            monochrome: false,
        }
    }
}

impl TonalAdjustment {
    /// Adjust one device colour and convert it to the tone space.
    pub fn adjust(&self, rgb: Rgb) -> Tone {
        let hsv = rgb.to_hsv();
        let adjusted = Hsv {
            h: hsv.h.wrapping_add(self.hue_shift.wrapping_sub(NEUTRAL)),
            s: if self.monochrome {
                0
            } else {
                self.saturation.apply_from_zero(hsv.s)
            },
            v: self.value.apply_centred(hsv.v),
        };
        adjusted.to_rgb().to_tone()
    }

    /// Adjust every pixel of `rect` from `source` into `frame`.
    ///
    /// The rectangle is clipped to both the Spectrum screen and the remote
    /// framebuffer. Returns the number of pixels written.
    pub fn apply(&self, frame: &mut ToneFrame, source: &RemoteFramebuffer, rect: Rect) -> usize {
        let width = SCREEN_WIDTH.min(source.width() as usize);
        let height = SCREEN_HEIGHT.min(source.height() as usize);
        let Some(rect) = rect.clip(width, height) else {
            return 0;
        };

        for y in rect.y as usize..(rect.y + rect.height) as usize {
            for x in rect.x as usize..(rect.x + rect.width) as usize {
                frame.set(x, y, self.adjust(source.pixel(x, y)));
            }
        }
        rect.area()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_tweak_is_identity() {
        for v in [0u8, 1, 64, 127, 128, 200, 255] {
            assert_eq!(Tweak::NEUTRAL.apply_centred(v), v);
            assert_eq!(Tweak::NEUTRAL.apply_from_zero(v), v);
        }
    }

    #[test]
    fn value_clamps() {
        let bright = Tweak::new(255, 128);
        assert_eq!(bright.apply_centred(200), 255);
        let dark = Tweak::new(0, 128);
        assert_eq!(dark.apply_centred(100), 0);
        let contrast = Tweak::new(128, 192);
        assert_eq!(contrast.apply_centred(250), 255);
        assert_eq!(contrast.apply_centred(10), 0);
    }

    #[test]
    fn hue_wraps_instead_of_clamping() {
        let rgb = Rgb::new(255, 0, 0);
        let shifted = TonalAdjustment {
            hue_shift: 0,
            ..Default::default()
        };
        // half a turn from red is cyan
        let out = shifted.adjust(rgb).to_rgb();
        assert!(out.r <= 2, "{out:?}");
        assert!(out.g >= 250 && out.b >= 250, "{out:?}");
    }

    #[test]
    fn monochrome_drops_saturation() {
        let mono = TonalAdjustment {
            monochrome: true,
            ..Default::default()
        };
        let tone = mono.adjust(Rgb::new(200, 30, 90));
        assert_eq!(tone.cb, 128);
        assert_eq!(tone.cr, 128);
    }

    #[test]
    fn apply_clips_to_source() {
        let mut source = RemoteFramebuffer::new(10, 10);
        source.write_raw(Rect::new(0, 0, 1, 1), &[255, 255, 255, 0]);
        let mut frame = ToneFrame::new();
        let written = TonalAdjustment::default().apply(&mut frame, &source, Rect::new(0, 0, 300, 300));
        assert_eq!(written, 100);
        assert_eq!(frame.get(0, 0), Rgb::new(255, 255, 255).to_tone());
        assert_eq!(frame.get(20, 20), Tone::BLACK);
    }

    #[test]
    fn apply_is_idempotent_per_rect() {
        let mut source = RemoteFramebuffer::new(16, 16);
        source.write_raw(Rect::new(2, 2, 1, 1), &[10, 120, 230, 0]);
        let tonal = TonalAdjustment {
            value: Tweak::new(150, 140),
            ..Default::default()
        };
        let mut once = ToneFrame::new();
        tonal.apply(&mut once, &source, Rect::new(0, 0, 8, 8));
        let mut twice = once.clone();
        tonal.apply(&mut twice, &source, Rect::new(0, 0, 8, 8));
        assert_eq!(once, twice);
    }
}
