//! RFB wire types (RFC 6143), limited to what the bridge needs.
//!
//! All multi-byte fields are big-endian. After the handshake the stream
//! carries [`ClientMessage`]s one way and [`ServerMessage`]s the other;
//! both sides are framed with `tokio_util` codecs so reads stay
//! cancel-safe inside `select!`.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ZxError;
use crate::render::frame::{REMOTE_BYTES_PER_PIXEL, Rect};

// ── Constants ────────────────────────────────────────────────────

pub const SECURITY_INVALID: u8 = 0;
pub const SECURITY_NONE: u8 = 1;

pub const ENCODING_RAW: i32 = 0;
pub const ENCODING_DESKTOP_SIZE: i32 = -223;

const MSG_FRAMEBUFFER_UPDATE: u8 = 0;
const MSG_SET_COLOUR_MAP: u8 = 1;
const MSG_BELL: u8 = 2;
const MSG_SERVER_CUT_TEXT: u8 = 3;

const MSG_SET_PIXEL_FORMAT: u8 = 0;
const MSG_SET_ENCODINGS: u8 = 2;
const MSG_UPDATE_REQUEST: u8 = 3;
const MSG_KEY_EVENT: u8 = 4;
const MSG_POINTER_EVENT: u8 = 5;

/// Size of a rectangle header inside a framebuffer update.
const RECT_HEADER_LEN: usize = 12;

/// Largest single server message accepted.
const MAX_MESSAGE_LEN: usize = 64 * 1024 * 1024;

// ── Version ──────────────────────────────────────────────────────

/// Protocol version negotiated during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Version {
    V3_3,
    V3_7,
    V3_8,
}

impl Version {
    /// Parse a 12-byte `RFB xxx.yyy\n` greeting and pick the highest
    /// version both sides speak.
    pub fn negotiate(greeting: &[u8; 12]) -> Result<Self, ZxError> {
        let text = std::str::from_utf8(greeting).map_err(|_| ZxError::InvalidVersion)?;
        let digits = text
            .strip_prefix("RFB ")
            .and_then(|t| t.strip_suffix('\n'))
            .ok_or(ZxError::InvalidVersion)?;
        let (major, minor) = digits.split_once('.').ok_or(ZxError::InvalidVersion)?;
        let major: u32 = major.parse().map_err(|_| ZxError::InvalidVersion)?;
        let minor: u32 = minor.parse().map_err(|_| ZxError::InvalidVersion)?;

        match (major, minor) {
            (3, 0..=2) | (0..=2, _) => Err(ZxError::UnsupportedVersion { major, minor }),
            // 3.4 and 3.6 are UltraVNC/TightVNC variants of 3.3
            (3, 3..=6) => Ok(Version::V3_3),
            (3, 7) => Ok(Version::V3_7),
            _ => Ok(Version::V3_8),
        }
    }

    pub fn greeting(self) -> &'static [u8; 12] {
        match self {
            Version::V3_3 => b"RFB 003.003\n",
            Version::V3_7 => b"RFB 003.007\n",
            Version::V3_8 => b"RFB 003.008\n",
        }
    }
}

// ── PixelFormat ──────────────────────────────────────────────────

/// The 16-byte RFB pixel format description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub bits_per_pixel: u8,
    pub depth: u8,
    pub big_endian: bool,
    pub true_colour: bool,
    pub red_max: u16,
    pub green_max: u16,
    pub blue_max: u16,
    pub red_shift: u8,
    pub green_shift: u8,
    pub blue_shift: u8,
}

impl PixelFormat {
    pub const LEN: usize = 16;

    /// 32-bit little-endian true colour, red in bits 16–23: bytes land in
    /// memory as B, G, R, X.
    pub const fn bgrx32() -> Self {
        Self {
            bits_per_pixel: 32,
            depth: 24,
            big_endian: false,
            true_colour: true,
            red_max: 255,
            green_max: 255,
            blue_max: 255,
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
        }
    }

    pub fn read(buf: &mut impl Buf) -> Self {
        let format = Self {
            bits_per_pixel: buf.get_u8(),
            depth: buf.get_u8(),
            big_endian: buf.get_u8() != 0,
            true_colour: buf.get_u8() != 0,
            red_max: buf.get_u16(),
            green_max: buf.get_u16(),
            blue_max: buf.get_u16(),
            red_shift: buf.get_u8(),
            green_shift: buf.get_u8(),
            blue_shift: buf.get_u8(),
        };
        buf.advance(3);
        format
    }

    pub fn write(&self, dst: &mut impl BufMut) {
        dst.put_u8(self.bits_per_pixel);
        dst.put_u8(self.depth);
        dst.put_u8(u8::from(self.big_endian));
        dst.put_u8(u8::from(self.true_colour));
        dst.put_u16(self.red_max);
        dst.put_u16(self.green_max);
        dst.put_u16(self.blue_max);
        dst.put_u8(self.red_shift);
        dst.put_u8(self.green_shift);
        dst.put_u8(self.blue_shift);
        dst.put_bytes(0, 3);
    }
}

// ── ServerInit ───────────────────────────────────────────────────

/// Fixed part of the ServerInit message (the desktop name follows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInit {
    pub width: u16,
    pub height: u16,
    pub format: PixelFormat,
    pub name_len: u32,
}

impl ServerInit {
    pub const LEN: usize = 4 + PixelFormat::LEN + 4;

    pub fn read(buf: &mut impl Buf) -> Self {
        Self {
            width: buf.get_u16(),
            height: buf.get_u16(),
            format: PixelFormat::read(buf),
            name_len: buf.get_u32(),
        }
    }
}

// ── ClientMessage ────────────────────────────────────────────────

/// Messages the bridge sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    SetPixelFormat(PixelFormat),
    SetEncodings(Vec<i32>),
    UpdateRequest { incremental: bool, rect: Rect },
    Key { down: bool, keysym: u32 },
    Pointer { buttons: u8, x: u16, y: u16 },
}

/// Encoder for [`ClientMessage`]s.
#[derive(Debug, Default)]
pub struct ClientCodec;

impl Encoder<ClientMessage> for ClientCodec {
    type Error = ZxError;

    fn encode(&mut self, item: ClientMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            ClientMessage::SetPixelFormat(format) => {
                dst.put_u8(MSG_SET_PIXEL_FORMAT);
                dst.put_bytes(0, 3);
                format.write(dst);
            }
            ClientMessage::SetEncodings(encodings) => {
                let count = u16::try_from(encodings.len())
                    .map_err(|_| ZxError::ProtocolViolation("too many encodings"))?;
                dst.put_u8(MSG_SET_ENCODINGS);
                dst.put_u8(0);
                dst.put_u16(count);
                for encoding in encodings {
                    dst.put_i32(encoding);
                }
            }
            ClientMessage::UpdateRequest { incremental, rect } => {
                dst.put_u8(MSG_UPDATE_REQUEST);
                dst.put_u8(u8::from(incremental));
                dst.put_u16(rect.x);
                dst.put_u16(rect.y);
                dst.put_u16(rect.width);
                dst.put_u16(rect.height);
            }
            ClientMessage::Key { down, keysym } => {
                dst.put_u8(MSG_KEY_EVENT);
                dst.put_u8(u8::from(down));
                dst.put_bytes(0, 2);
                dst.put_u32(keysym);
            }
            ClientMessage::Pointer { buttons, x, y } => {
                dst.put_u8(MSG_POINTER_EVENT);
                dst.put_u8(buttons);
                dst.put_u16(x);
                dst.put_u16(y);
            }
        }
        Ok(())
    }
}

// ── ServerMessage ────────────────────────────────────────────────

/// Pixel payload of one rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RectBody {
    /// `width × height` pixels in the negotiated format.
    Raw(Bytes),
    /// The remote desktop is now `width × height`.
    DesktopSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RectUpdate {
    pub rect: Rect,
    pub body: RectBody,
}

/// Messages the server sends to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    FramebufferUpdate(Vec<RectUpdate>),
    SetColourMapEntries,
    Bell,
    ServerCutText(Bytes),
}

/// Decoder for [`ServerMessage`]s, assuming the 32-bit pixel format the
/// client always requests.
#[derive(Debug, Default)]
pub struct ServerCodec;

impl ServerCodec {
    /// Total length of the message at the front of `src`, or `None` if
    /// more bytes are needed to tell.
    fn message_len(src: &[u8]) -> Result<Option<usize>, ZxError> {
        let Some(&kind) = src.first() else {
            return Ok(None);
        };
        match kind {
            MSG_FRAMEBUFFER_UPDATE => Self::update_len(src),
            MSG_SET_COLOUR_MAP => {
                if src.len() < 6 {
                    return Ok(None);
                }
                let count = u16::from_be_bytes([src[4], src[5]]) as usize;
                Ok(Some(6 + count * 6))
            }
            MSG_BELL => Ok(Some(1)),
            MSG_SERVER_CUT_TEXT => {
                if src.len() < 8 {
                    return Ok(None);
                }
                let len = u32::from_be_bytes([src[4], src[5], src[6], src[7]]) as usize;
                Ok(Some(8 + len))
            }
            other => Err(ZxError::UnknownMessage(other)),
        }
    }

    /// Walk the rectangle headers of a framebuffer update.
    fn update_len(src: &[u8]) -> Result<Option<usize>, ZxError> {
        if src.len() < 4 {
            return Ok(None);
        }
        let count = u16::from_be_bytes([src[2], src[3]]);
        let mut offset = 4;

        for _ in 0..count {
            let Some(header) = src.get(offset..offset + RECT_HEADER_LEN) else {
                return Ok(None);
            };
            let width = u16::from_be_bytes([header[4], header[5]]) as usize;
            let height = u16::from_be_bytes([header[6], header[7]]) as usize;
            let encoding = i32::from_be_bytes([header[8], header[9], header[10], header[11]]);
            offset += RECT_HEADER_LEN;

            offset += match encoding {
                ENCODING_RAW => width * height * REMOTE_BYTES_PER_PIXEL,
                ENCODING_DESKTOP_SIZE => 0,
                other => return Err(ZxError::UnsupportedEncoding(other)),
            };
            if offset > MAX_MESSAGE_LEN {
                return Err(ZxError::ProtocolViolation("server message too large"));
            }
        }
        Ok(Some(offset))
    }
}

impl Decoder for ServerCodec {
    type Item = ServerMessage;
    type Error = ZxError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(len) = Self::message_len(src)? else {
            return Ok(None);
        };
        if len > MAX_MESSAGE_LEN {
            return Err(ZxError::ProtocolViolation("server message too large"));
        }
        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        let mut msg = src.split_to(len).freeze();
        let kind = msg.get_u8();
        let message = match kind {
            MSG_FRAMEBUFFER_UPDATE => {
                msg.advance(1);
                let count = msg.get_u16();
                let mut rects = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let rect = Rect::new(msg.get_u16(), msg.get_u16(), msg.get_u16(), msg.get_u16());
                    let body = match msg.get_i32() {
                        ENCODING_RAW => RectBody::Raw(msg.split_to(rect.area() * REMOTE_BYTES_PER_PIXEL)),
                        _ => RectBody::DesktopSize,
                    };
                    rects.push(RectUpdate { rect, body });
                }
                ServerMessage::FramebufferUpdate(rects)
            }
            MSG_SET_COLOUR_MAP => ServerMessage::SetColourMapEntries,
            MSG_BELL => ServerMessage::Bell,
            _ => {
                msg.advance(7);
                ServerMessage::ServerCutText(msg)
            }
        };
        Ok(Some(message))
    }
}

// ── Tests ────────────────────────────────────────────────────────
