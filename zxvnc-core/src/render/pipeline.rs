//! Resolver → disperser → packer, over immutable tables built once.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::render::clash::{self, CandidateTable, TileLayout};
use crate::render::dither::{self, DiffusionPolicy};
use crate::render::frame::ToneFrame;
use crate::render::packer::{self, PackedFrame};
use crate::render::palette::Palette;

// ── RenderMode ───────────────────────────────────────────────────

/// Screen mode of the receiving machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// 8×8 attributes, 16 fixed colours.
    #[default]
    Classic,
    /// Timex 8×1 attributes.
    HiColour,
    /// ULAplus 64-entry palette.
    UlaPlus,
    /// Timex 8×1 attributes with the ULAplus palette.
    HiColourUlaPlus,
}

impl RenderMode {
    pub fn layout(self) -> TileLayout {
        match self {
            RenderMode::Classic | RenderMode::UlaPlus => TileLayout::Block,
            RenderMode::HiColour | RenderMode::HiColourUlaPlus => TileLayout::Strip,
        }
    }

    pub fn extended_palette(self) -> bool {
        matches!(self, RenderMode::UlaPlus | RenderMode::HiColourUlaPlus)
    }

    /// Bytes per transmitted frame.
    pub fn frame_len(self) -> usize {
        packer::frame_len(self.layout(), self.extended_palette())
    }
}

// ── RenderSettings ───────────────────────────────────────────────

/// Renderer knobs that come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSettings {
    pub mode: RenderMode,
    /// Skip the pair search and draw white ink on black paper.
    pub monochrome: bool,
    pub diffusion: DiffusionPolicy,
}

// ── Renderer ─────────────────────────────────────────────────────

/// Turns a [`ToneFrame`] into a [`PackedFrame`].
///
/// Owns the palette and candidate table; rendering the same frame twice
/// yields identical bytes.
#[derive(Debug, Clone)]
pub struct Renderer {
    settings: RenderSettings,
    palette: Palette,
    candidates: CandidateTable,
}

impl Renderer {
    /// Create a renderer. In extended modes `palette` overrides the default
    /// ULAplus table; in classic modes it is ignored.
    pub fn new(settings: RenderSettings, palette: Option<Palette>) -> Self {
        let palette = if settings.mode.extended_palette() {
            palette
                .filter(Palette::is_extended)
                .unwrap_or_else(Palette::extended_default)
        } else {
            Palette::classic()
        };
        let candidates = CandidateTable::for_palette(&palette);
        Self {
            settings,
            palette,
            candidates,
        }
    }

    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn frame_len(&self) -> usize {
        self.settings.mode.frame_len()
    }

    pub fn render(&self, frame: &ToneFrame) -> PackedFrame {
        let layout = self.settings.mode.layout();
        let grid = clash::resolve(
            frame,
            &self.palette,
            &self.candidates,
            layout,
            self.settings.monochrome,
        );
        let bitmap = dither::disperse(frame, &grid, &self.palette, self.settings.diffusion);
        let packed = packer::pack(&bitmap, &grid, &self.palette);
        trace!(bytes = packed.len(), ?layout, "frame rendered");
        packed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::color::Rgb;
    use crate::render::frame::Rect;

    fn busy_frame() -> ToneFrame {
        let mut frame = ToneFrame::new();
        for (i, x) in (0..256u16).step_by(16).enumerate() {
            let rgb = Rgb::new((i * 16) as u8, 255 - (i * 12) as u8, (i * 40 % 256) as u8);
            frame.fill_rect(Rect::new(x, (i * 7) as u16, 16, 100), rgb.to_tone());
        }
        frame
    }

    #[test]
    fn every_mode_has_its_exact_length() {
        let frame = busy_frame();
        for mode in [
            RenderMode::Classic,
            RenderMode::HiColour,
            RenderMode::UlaPlus,
            RenderMode::HiColourUlaPlus,
        ] {
            let renderer = Renderer::new(
                RenderSettings {
                    mode,
                    ..Default::default()
                },
                None,
            );
            assert_eq!(renderer.render(&frame).len(), mode.frame_len());
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let frame = busy_frame();
        let settings = RenderSettings {
            mode: RenderMode::HiColour,
            diffusion: DiffusionPolicy::MatchingAttributes,
            ..Default::default()
        };
        let a = Renderer::new(settings, None).render(&frame);
        let b = Renderer::new(settings, None).render(&frame);
        assert_eq!(a, b);
    }

    #[test]
    fn ula_plus_renders_clut_into_attributes() {
        use crate::render::packer::{BITMAP_LEN, BLOCK_ATTR_LEN};

        let renderer = Renderer::new(
            RenderSettings {
                mode: RenderMode::UlaPlus,
                ..Default::default()
            },
            None,
        );
        let palette = renderer.palette().clone();

        let red = renderer.render(&ToneFrame::filled(palette.tone(2)));
        assert!(red.as_bytes()[..BITMAP_LEN].iter().all(|&b| b == 0xff));
        assert!((0..BLOCK_ATTR_LEN).all(|tile| red.attribute(tile) == 0x02));

        // left column of tiles bright green (CLUT 1), the rest red
        let mut frame = ToneFrame::filled(palette.tone(2));
        frame.fill_rect(Rect::new(0, 0, 8, 192), palette.tone(20));
        let mixed = renderer.render(&frame);
        assert_eq!(mixed.attribute(0), 0x44);
        assert_eq!(mixed.attribute(0) >> 6, 1);
        assert_eq!(mixed.attribute(1), 0x02);
        assert_eq!(mixed.attribute(32), 0x44);
    }

    #[test]
    fn custom_palette_only_in_extended_modes() {
        let custom = Palette::extended_from_slice(&[0xff; 64]).unwrap();
        let classic = Renderer::new(RenderSettings::default(), Some(custom.clone()));
        assert!(!classic.palette().is_extended());

        let ula = Renderer::new(
            RenderSettings {
                mode: RenderMode::UlaPlus,
                ..Default::default()
            },
            Some(custom.clone()),
        );
        assert_eq!(ula.palette(), &custom);
    }
}
