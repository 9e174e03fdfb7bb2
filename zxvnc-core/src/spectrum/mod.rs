//! # Spectrum link
//!
//! A single TCP stream to the Spectrum carries packed frames one way and
//! input telemetry the other.
//!
//! ```text
//! bridge ──[PackedFrame, fixed length]──────► Spectrum
//! bridge ◄──[InputRecord, 6 bytes]────────── Spectrum
//! ```
//!
//! | Module      | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `scheduler` | Render-and-send loop driven by a watch channel |
//! | `telemetry` | Fixed-size input record codec                  |
//! | `input`     | Record deduplication, key and button mapping   |

pub mod input;
pub mod scheduler;
pub mod telemetry;

// ── Re-exports ───────────────────────────────────────────────────

pub use input::{ButtonMask, InputEvent, InputTracker};
pub use scheduler::TransmissionScheduler;
pub use telemetry::{InputRecord, TelemetryCodec};
