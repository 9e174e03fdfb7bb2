//! # Frame conversion
//!
//! ```text
//! RemoteFramebuffer ──(damaged rect)──► TonalAdjustment ──► ToneFrame
//!                                                              │
//!                                      scheduler tick          ▼
//!                 PackedFrame ◄── pack ◄── disperse ◄── resolve
//! ```
//!
//! | Module     | Purpose                                            |
//! |------------|----------------------------------------------------|
//! | `color`    | RGB ↔ HSV ↔ tone conversions and distance          |
//! | `palette`  | Classic and ULAplus reference tables               |
//! | `frame`    | Remote framebuffer, working tone frame, rects      |
//! | `tonal`    | Brightness / saturation / hue adjustment           |
//! | `clash`    | Per-tile ink/paper selection                       |
//! | `dither`   | Tile-constrained error diffusion                   |
//! | `packer`   | Spectrum display + attribute file layout           |
//! | `pipeline` | `Renderer` tying resolve → dither → pack together  |

pub mod clash;
pub mod color;
pub mod dither;
pub mod frame;
pub mod packer;
pub mod palette;
pub mod pipeline;
pub mod tonal;

// ── Re-exports ───────────────────────────────────────────────────

pub use clash::{CandidateTable, TileGrid, TileLayout, TilePair};
pub use color::{Hsv, Rgb, Tone};
pub use dither::{Bitmap, DiffusionPolicy};
pub use frame::{Rect, RemoteFramebuffer, SCREEN_HEIGHT, SCREEN_WIDTH, ToneFrame};
pub use packer::PackedFrame;
pub use palette::Palette;
pub use pipeline::{RenderMode, RenderSettings, Renderer};
pub use tonal::{TonalAdjustment, Tweak};
