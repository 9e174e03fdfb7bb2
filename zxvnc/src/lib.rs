//! # zxvnc: VNC to ZX Spectrum bridge
//!
//! Connects to a Spectrum (or emulator) listening on TCP, then to a VNC
//! server. Desktop updates are adjusted, reduced to the Spectrum's
//! attribute constraints and streamed as whole frames; keyboard and
//! Kempston mouse input coming back from the Spectrum is injected into
//! the desktop.

pub mod config;
pub mod service;
