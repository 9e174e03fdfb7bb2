//! # Remote desktop side
//!
//! A minimal RFB client: protocol 3.3 to 3.8, `None` security, Raw and
//! DesktopSize encodings, 32-bit true colour.
//!
//! | Module     | Purpose                                     |
//! |------------|---------------------------------------------|
//! | `protocol` | Wire types, client encoder, server decoder  |
//! | `client`   | Handshake and update loop                   |

pub mod client;
pub mod protocol;

// ── Re-exports ───────────────────────────────────────────────────

pub use client::{Handshake, VncClient};
pub use protocol::{ClientMessage, PixelFormat, RectBody, RectUpdate, ServerMessage, Version};
