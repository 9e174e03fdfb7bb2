//! Frame buffers shared between pipeline stages.
//!
//! [`RemoteFramebuffer`] is the RFB engine's copy of the remote screen.
//! [`ToneFrame`] is the Spectrum-sized working buffer the tonal stage
//! writes and the resolver/disperser read.

use crate::render::color::{Rgb, Tone};

/// Spectrum screen width in pixels.
pub const SCREEN_WIDTH: usize = 256;
/// Spectrum screen height in pixels.
pub const SCREEN_HEIGHT: usize = 192;

/// Bytes per pixel in the negotiated remote format (32-bit BGRX).
pub const REMOTE_BYTES_PER_PIXEL: usize = 4;

// ── Rect ─────────────────────────────────────────────────────────

/// A rectangular region of the remote framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge in pixels.
    pub x: u16,
    /// Top edge in pixels.
    pub y: u16,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersection with `0..width × 0..height`, or `None` when empty.
    pub fn clip(&self, width: usize, height: usize) -> Option<Rect> {
        let x0 = (self.x as usize).min(width);
        let y0 = (self.y as usize).min(height);
        let x1 = (self.x as usize + self.width as usize).min(width);
        let y1 = (self.y as usize + self.height as usize).min(height);
        if x0 == x1 || y0 == y1 {
            return None;
        }
        Some(Rect::new(
            x0 as u16,
            y0 as u16,
            (x1 - x0) as u16,
            (y1 - y0) as u16,
        ))
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

// ── RemoteFramebuffer ────────────────────────────────────────────

/// The remote screen in 32-bit little-endian BGRX.
#[derive(Debug, Clone)]
pub struct RemoteFramebuffer {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

impl RemoteFramebuffer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * REMOTE_BYTES_PER_PIXEL],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resize, clearing the contents.
    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Self::new(width, height);
    }

    /// Copy raw pixel rows for `rect` into the buffer.
    ///
    /// `pixels` holds `rect.height` rows of `rect.width` pixels. Parts of
    /// the rectangle outside the buffer are skipped.
    pub fn write_raw(&mut self, rect: Rect, pixels: &[u8]) {
        let Some(clipped) = rect.clip(self.width as usize, self.height as usize) else {
            return;
        };
        let src_row = rect.width as usize * REMOTE_BYTES_PER_PIXEL;
        let dst_row = self.width as usize * REMOTE_BYTES_PER_PIXEL;
        let copy = clipped.width as usize * REMOTE_BYTES_PER_PIXEL;

        for row in 0..clipped.height as usize {
            let src = row * src_row;
            if src + copy > pixels.len() {
                break;
            }
            let dst = (clipped.y as usize + row) * dst_row + clipped.x as usize * REMOTE_BYTES_PER_PIXEL;
            self.data[dst..dst + copy].copy_from_slice(&pixels[src..src + copy]);
        }
    }

    /// RGB of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let offset = (y * self.width as usize + x) * REMOTE_BYTES_PER_PIXEL;
        let px = &self.data[offset..offset + REMOTE_BYTES_PER_PIXEL];
        Rgb::new(px[2], px[1], px[0])
    }
}

// ── ToneFrame ────────────────────────────────────────────────────

/// A 256×192 tone-space snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneFrame {
    pixels: Vec<Tone>,
}

impl ToneFrame {
    /// An all-black frame.
    pub fn new() -> Self {
        Self::filled(Tone::BLACK)
    }

    pub fn filled(tone: Tone) -> Self {
        Self {
            pixels: vec![tone; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Tone {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, tone: Tone) {
        self.pixels[y * SCREEN_WIDTH + x] = tone;
    }

    /// Fill a rectangle (clipped to the screen) with one tone.
    pub fn fill_rect(&mut self, rect: Rect, tone: Tone) {
        let Some(rect) = rect.clip(SCREEN_WIDTH, SCREEN_HEIGHT) else {
            return;
        };
        for y in rect.y as usize..(rect.y + rect.height) as usize {
            for x in rect.x as usize..(rect.x + rect.width) as usize {
                self.set(x, y, tone);
            }
        }
    }
}

impl Default for ToneFrame {
    fn default() -> Self {
        Self::new()
    }
}
