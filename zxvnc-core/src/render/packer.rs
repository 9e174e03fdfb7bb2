//! Serialisation into Spectrum screen memory layout.
//!
//! The display file is not linear: byte `i` of the 6 KiB bitmap holds
//! pixel row `((i & 0x1800) >> 5) | ((i & 0xe0) >> 2) | ((i & 0x700) >> 8)`,
//! column block `i & 0x1f`. The attribute file follows, then the ULAplus
//! palette when extended colour is on. The receiver has no length framing,
//! so every frame for a given mode is exactly [`frame_len`] bytes.

use bytes::{BufMut, Bytes, BytesMut};

use crate::render::clash::{TileGrid, TileLayout, TilePair};
use crate::render::dither::Bitmap;
use crate::render::palette::{EXTENDED_PALETTE_LEN, Palette};

/// Size of the display (bitmap) file.
pub const BITMAP_LEN: usize = 0x1800;
/// Attribute file size for 8×8 tiles.
pub const BLOCK_ATTR_LEN: usize = 0x300;
/// Attribute file size for 8×1 tiles.
pub const STRIP_ATTR_LEN: usize = 0x1800;

/// Classic screen size.
pub const CLASSIC_FRAME_LEN: usize = BITMAP_LEN + BLOCK_ATTR_LEN;

/// Exact packed size for a layout / palette combination.
pub const fn frame_len(layout: TileLayout, extended: bool) -> usize {
    let attrs = match layout {
        TileLayout::Block => BLOCK_ATTR_LEN,
        TileLayout::Strip => STRIP_ATTR_LEN,
    };
    BITMAP_LEN + attrs + if extended { EXTENDED_PALETTE_LEN } else { 0 }
}

/// Pixel row stored at display-file offset `i`.
#[inline]
pub const fn display_row(i: usize) -> usize {
    ((i & 0x1800) >> 5) | ((i & 0xe0) >> 2) | ((i & 0x700) >> 8)
}

// ── PackedFrame ──────────────────────────────────────────────────

/// A frame ready for the wire. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFrame {
    data: Bytes,
}

impl PackedFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Attribute byte of tile index `tile` (row-major).
    pub fn attribute(&self, tile: usize) -> u8 {
        self.data[BITMAP_LEN + tile]
    }
}

impl AsRef<[u8]> for PackedFrame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

// ── Attribute encoding ───────────────────────────────────────────

/// Classic attribute byte: ink bits 0–2, paper bits 3–5, bright bit 6.
#[inline]
pub fn classic_attribute(pair: TilePair) -> u8 {
    (pair.ink & 7) | ((pair.paper & 7) << 3) | (((pair.ink >> 3) & 1) << 6)
}

/// ULAplus attribute byte: ink entry bits 0–2, paper entry bits 0–2
/// shifted to 3–5, CLUT number in bits 6–7.
#[inline]
pub fn extended_attribute(pair: TilePair) -> u8 {
    (pair.ink & 7) | ((pair.paper & 7) << 3) | ((pair.ink & 0x30) << 2)
}

// ── Packing ──────────────────────────────────────────────────────

/// Pack bitmap, attributes and (if extended) palette into one frame.
pub fn pack(bitmap: &Bitmap, grid: &TileGrid, palette: &Palette) -> PackedFrame {
    let entries = palette.entries();
    let mut out = BytesMut::with_capacity(frame_len(grid.layout(), entries.is_some()));

    for i in 0..BITMAP_LEN {
        out.put_u8(bitmap.byte(i & 0x1f, display_row(i)));
    }

    let encode = if entries.is_some() {
        extended_attribute
    } else {
        classic_attribute
    };
    for &pair in grid.pairs() {
        out.put_u8(encode(pair));
    }

    if let Some(entries) = entries {
        out.put_slice(entries);
    }

    PackedFrame { data: out.freeze() }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_rows_follow_thirds_and_char_rows() {
        assert_eq!(display_row(0), 0);
        assert_eq!(display_row(0x20), 8);
        assert_eq!(display_row(0x100), 1);
        assert_eq!(display_row(0x800), 64);
        assert_eq!(display_row(0x17ff), 191);
        // every row appears exactly 32 times
        let mut seen = [0u32; 192];
        for i in 0..BITMAP_LEN {
            seen[display_row(i)] += 1;
        }
        assert!(seen.iter().all(|&n| n == 32));
    }

    #[test]
    fn frame_lengths() {
        assert_eq!(frame_len(TileLayout::Block, false), 6912);
        assert_eq!(frame_len(TileLayout::Strip, false), 12288);
        assert_eq!(frame_len(TileLayout::Block, true), 6976);
        assert_eq!(frame_len(TileLayout::Strip, true), 12352);
    }

    #[test]
    fn attribute_bytes() {
        assert_eq!(classic_attribute(TilePair::new(2, 0)), 0x02);
        assert_eq!(classic_attribute(TilePair::new(7, 1)), 0x0f);
        assert_eq!(classic_attribute(TilePair::new(15, 8)), 0x47);
        assert_eq!(extended_attribute(TilePair::new(7, 8)), 0x07);
        assert_eq!(extended_attribute(TilePair::new(0x35, 0x3a)), 0xd5);
    }

    #[test]
    fn pack_places_rows_by_display_address() {
        let mut bitmap = Bitmap::new();
        for x in 0..8 {
            bitmap.set(x, 1, true); // row 1 lives at 0x100
        }
        bitmap.set(255, 191, true);
        let grid = TileGrid::uniform(TileLayout::Block, TilePair::new(7, 0));
        let frame = pack(&bitmap, &grid, &Palette::classic());

        assert_eq!(frame.len(), CLASSIC_FRAME_LEN);
        assert_eq!(frame.as_bytes()[0x100], 0xff);
        assert_eq!(frame.as_bytes()[0], 0x00);
        assert_eq!(frame.as_bytes()[0x17ff], 0x01);
        assert_eq!(frame.attribute(0), 0x07);
        assert_eq!(frame.attribute(767), 0x07);
    }

    #[test]
    fn extended_frame_ends_with_palette() {
        let palette = Palette::extended_default();
        let grid = TileGrid::uniform(TileLayout::Strip, TilePair::new(7, 8));
        let frame = pack(&Bitmap::new(), &grid, &palette);
        assert_eq!(frame.len(), 12352);
        assert_eq!(&frame.as_bytes()[12288..], &palette.entries().unwrap()[..]);
    }
}
