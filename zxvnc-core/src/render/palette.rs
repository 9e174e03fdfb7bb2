//! Reference colour tables.
//!
//! A [`Palette`] is built once at startup and handed to the renderer; the
//! resolver and disperser only ever see it by reference.

use crate::error::ZxError;
use crate::render::color::{Rgb, Tone};

/// Number of entries in a ULAplus palette.
pub const EXTENDED_PALETTE_LEN: usize = 64;

/// Reference tones indexed by [`TilePair`](crate::render::clash::TilePair)
/// entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Palette {
    /// The 16 fixed Spectrum colours; index = colour + 8 × bright.
    Classic { tones: [Tone; 16] },
    /// A 64-entry ULAplus table: four CLUTs of eight ink then eight paper
    /// entries, stored as `GGGRRRBB` bytes.
    Extended {
        entries: [u8; EXTENDED_PALETTE_LEN],
        tones: [Tone; EXTENDED_PALETTE_LEN],
    },
}

impl Palette {
    /// The fixed Spectrum palette.
    pub fn classic() -> Self {
        let mut tones = [Tone::BLACK; 16];
        for (code, tone) in tones.iter_mut().enumerate() {
            *tone = Rgb::from_spectrum(code as u8).to_tone();
        }
        Palette::Classic { tones }
    }

    /// A ULAplus table that reproduces the classic colours: CLUTs 0 and 2
    /// hold the normal bank, CLUTs 1 and 3 the bright one.
    pub fn extended_default() -> Self {
        let mut entries = [0u8; EXTENDED_PALETTE_LEN];
        for (index, entry) in entries.iter_mut().enumerate() {
            let clut = index / 16;
            let colour = (index % 8) as u8;
            let bright = if clut % 2 == 1 { 8 } else { 0 };
            *entry = Rgb::from_spectrum(colour | bright).to_grb332();
        }
        Self::extended(entries)
    }

    /// A ULAplus table from raw `GGGRRRBB` bytes.
    pub fn extended(entries: [u8; EXTENDED_PALETTE_LEN]) -> Self {
        let mut tones = [Tone::BLACK; EXTENDED_PALETTE_LEN];
        for (tone, &entry) in tones.iter_mut().zip(entries.iter()) {
            *tone = Rgb::from_grb332(entry).to_tone();
        }
        Palette::Extended { entries, tones }
    }

    /// Build an extended palette from a configuration slice.
    pub fn extended_from_slice(entries: &[u8]) -> Result<Self, ZxError> {
        let entries: [u8; EXTENDED_PALETTE_LEN] = entries
            .try_into()
            .map_err(|_| ZxError::InvalidPalette(entries.len()))?;
        Ok(Self::extended(entries))
    }

    /// Reference tone of entry `index`.
    #[inline]
    pub fn tone(&self, index: u8) -> Tone {
        match self {
            Palette::Classic { tones } => tones[index as usize & 0x0f],
            Palette::Extended { tones, .. } => tones[index as usize & 0x3f],
        }
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, Palette::Extended { .. })
    }

    /// The raw table appended to extended-mode frames.
    pub fn entries(&self) -> Option<&[u8; EXTENDED_PALETTE_LEN]> {
        match self {
            Palette::Classic { .. } => None,
            Palette::Extended { entries, .. } => Some(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_black_banks_match() {
        let pal = Palette::classic();
        assert_eq!(pal.tone(0), pal.tone(8));
        assert_eq!(pal.tone(0), Tone::BLACK);
        assert_ne!(pal.tone(2), pal.tone(10));
    }

    #[test]
    fn extended_default_mirrors_classic_layout() {
        let pal = Palette::extended_default();
        let entries = pal.entries().unwrap();
        // ink and paper halves of a CLUT carry the same colours
        assert_eq!(entries[2], entries[10]);
        // CLUT 0 and 2 are both the normal bank
        assert_eq!(entries[5], entries[37]);
        // bright white is brighter than normal white
        assert!(pal.tone(23).y > pal.tone(7).y);
        assert_eq!(entries[0], 0);
    }

    #[test]
    fn extended_from_slice_checks_length() {
        assert!(matches!(
            Palette::extended_from_slice(&[0; 12]),
            Err(ZxError::InvalidPalette(12))
        ));
        let pal = Palette::extended_from_slice(&[0xff; 64]).unwrap();
        assert!(pal.is_extended());
        assert_eq!(pal.tone(63), Rgb::new(255, 255, 255).to_tone());
    }
}
