//! Input telemetry records sent by the Spectrum.
//!
//! Wire format (6 bytes, little-endian like the Z80):
//!
//! ```text
//! key:     u8   last key code, 0 = none
//! buttons: u8   Kempston mouse buttons
//! x:       u16
//! y:       u16
//! ```
//!
//! There is no framing beyond the fixed length, so the codec simply waits
//! for six bytes.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::debug;

use crate::error::ZxError;
use crate::spectrum::input::ButtonMask;

/// Size of one record on the wire.
pub const RECORD_LEN: usize = 6;

// ── InputRecord ──────────────────────────────────────────────────

/// One sample of the Spectrum's keyboard and mouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputRecord {
    pub key: u8,
    pub buttons: ButtonMask,
    pub x: u16,
    pub y: u16,
}

impl InputRecord {
    pub fn new(key: u8, buttons: ButtonMask, x: u16, y: u16) -> Self {
        Self { key, buttons, x, y }
    }
}

// ── TelemetryCodec ───────────────────────────────────────────────

/// Fixed-length codec for [`InputRecord`]s.
#[derive(Debug, Default)]
pub struct TelemetryCodec;

impl Decoder for TelemetryCodec {
    type Item = InputRecord;
    type Error = ZxError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < RECORD_LEN {
            src.reserve(RECORD_LEN - src.len());
            return Ok(None);
        }

        let key = src.get_u8();
        let buttons = ButtonMask::from_bits_retain(src.get_u8());
        let x = src.get_u16_le();
        let y = src.get_u16_le();
        Ok(Some(InputRecord { key, buttons, x, y }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(record) => Ok(Some(record)),
            None => {
                if !src.is_empty() {
                    debug!(bytes = src.len(), "discarding partial telemetry record");
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}
