//! Tile-constrained Floyd–Steinberg dithering.
//!
//! Each pixel picks the nearer of its tile's two colours; the residual is
//! pushed to the unvisited neighbours of a private working copy. Whether
//! error may leak into a neighbouring tile is decided by the
//! [`DiffusionPolicy`].

use serde::{Deserialize, Serialize};

use crate::render::clash::{TileGrid, TilePair};
use crate::render::color::Tone;
use crate::render::frame::{SCREEN_HEIGHT, SCREEN_WIDTH, ToneFrame};
use crate::render::palette::Palette;

/// Forward neighbours as `(dx, dy, weight / 16)`.
const KERNEL: [(isize, isize, i32); 4] = [(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)];

/// Bytes in one bitmap row.
pub const ROW_BYTES: usize = SCREEN_WIDTH / 8;

// ── DiffusionPolicy ──────────────────────────────────────────────

/// When quantisation error may cross into another tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffusionPolicy {
    /// Error flows freely across the whole screen.
    #[default]
    CrossTiles,
    /// Error only enters a neighbouring tile holding the same pair, which
    /// avoids dither seams along colour boundaries.
    MatchingAttributes,
}

impl DiffusionPolicy {
    fn allows(self, grid: &TileGrid, from: (usize, usize), to: (usize, usize)) -> bool {
        let source = grid.tile_of(from.0, from.1);
        let target = grid.tile_of(to.0, to.1);
        source == target
            || self == DiffusionPolicy::CrossTiles
            || grid.pair(source.0, source.1) == grid.pair(target.0, target.1)
    }
}

// ── Bitmap ───────────────────────────────────────────────────────

/// One bit per pixel, row-major, 32 bytes per row, MSB leftmost.
/// A set bit selects the tile's ink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bytes: Vec<u8>,
}

impl Bitmap {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; ROW_BYTES * SCREEN_HEIGHT],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bytes[y * ROW_BYTES + x / 8] & (0x80 >> (x % 8)) != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, ink: bool) {
        let byte = &mut self.bytes[y * ROW_BYTES + x / 8];
        let mask = 0x80 >> (x % 8);
        if ink {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    /// The eight pixels `column * 8 .. column * 8 + 8` of row `y`.
    #[inline]
    pub fn byte(&self, column: usize, y: usize) -> u8 {
        self.bytes[y * ROW_BYTES + column]
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}

// ── Disperser ────────────────────────────────────────────────────

/// Quantise `frame` against the tile assignments in `grid`.
///
/// `frame` itself is left untouched; error accumulates in a copy.
pub fn disperse(
    frame: &ToneFrame,
    grid: &TileGrid,
    palette: &Palette,
    policy: DiffusionPolicy,
) -> Bitmap {
    let mut work = frame.clone();
    let mut bitmap = Bitmap::new();

    for y in 0..SCREEN_HEIGHT {
        for x in 0..SCREEN_WIDTH {
            let TilePair { ink, paper } = grid.pair_at(x, y);
            let ink = palette.tone(ink);
            let paper = palette.tone(paper);
            let px = work.get(x, y);

            let use_ink = px.distance(ink) < px.distance(paper);
            bitmap.set(x, y, use_ink);

            let chosen = if use_ink { ink } else { paper };
            let error = residual(px, chosen);
            if error != [0; 3] {
                diffuse(&mut work, grid, policy, x, y, error);
            }
        }
    }
    bitmap
}

/// Signed per-channel error `pixel − reference`.
fn residual(pixel: Tone, reference: Tone) -> [i32; 3] {
    let p = pixel.channels();
    let r = reference.channels();
    [
        p[0] as i32 - r[0] as i32,
        p[1] as i32 - r[1] as i32,
        p[2] as i32 - r[2] as i32,
    ]
}

/// Push `error` from `(x, y)` into its forward neighbours.
///
/// Each share is truncated toward zero and the target clamped, so the
/// total change never exceeds `|error|` on any channel.
pub(crate) fn diffuse(
    work: &mut ToneFrame,
    grid: &TileGrid,
    policy: DiffusionPolicy,
    x: usize,
    y: usize,
    error: [i32; 3],
) {
    for (dx, dy, weight) in KERNEL {
        let Some(nx) = x.checked_add_signed(dx).filter(|&nx| nx < SCREEN_WIDTH) else {
            continue;
        };
        let Some(ny) = y.checked_add_signed(dy).filter(|&ny| ny < SCREEN_HEIGHT) else {
            continue;
        };
        if !policy.allows(grid, (x, y), (nx, ny)) {
            continue;
        }

        let mut channels = work.get(nx, ny).channels();
        for (channel, err) in channels.iter_mut().zip(error) {
            *channel = (*channel as i32 + err * weight / 16).clamp(0, 255) as u8;
        }
        work.set(nx, ny, Tone::from_channels(channels));
    }
}

// ── Tests ────────────────────────────────────────────────────────
