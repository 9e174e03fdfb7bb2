//! # zxvnc-core
//!
//! Core library for the VNC to ZX Spectrum bridge.
//!
//! This crate contains:
//! - **Render**: tonal adjustment, attribute-clash resolution, tile-aware
//!   dithering and packing into Spectrum display memory
//! - **Spectrum link**: `TransmissionScheduler` for outgoing frames and
//!   `TelemetryCodec` / `InputTracker` for incoming input
//! - **VNC**: `VncClient`, a small RFB client over `tokio_util` codecs
//! - **Error**: `ZxError`, the `thiserror`-based error type

pub mod error;
pub mod render;
pub mod spectrum;
pub mod vnc;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use error::ZxError;
pub use render::{
    Palette, PackedFrame, Rect, RenderMode, RenderSettings, Renderer, TonalAdjustment, ToneFrame,
    Tweak,
};
pub use spectrum::{InputEvent, InputRecord, InputTracker, TelemetryCodec, TransmissionScheduler};
pub use vnc::VncClient;
