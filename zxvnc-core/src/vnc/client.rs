//! RFB client session.
//!
//! [`VncClient::connect`] runs the handshake on the raw stream, then
//! splits it into a framed reader and writer. After that the session is
//! message-driven: [`recv`](VncClient::recv) yields the next server
//! message, [`handle`](VncClient::handle) applies it to the local copy of
//! the remote framebuffer and asks for the next incremental update.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, trace};

use crate::error::ZxError;
use crate::render::frame::{RemoteFramebuffer, Rect, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::spectrum::input::InputEvent;
use crate::vnc::protocol::{
    ClientCodec, ClientMessage, ENCODING_DESKTOP_SIZE, ENCODING_RAW, PixelFormat, RectBody,
    SECURITY_INVALID, SECURITY_NONE, ServerCodec, ServerInit, ServerMessage, Version,
};

/// Longest failure reason or desktop name accepted from the server.
const MAX_TEXT_LEN: u32 = 64 * 1024;

/// What the server told us during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub version: Version,
    pub width: u16,
    pub height: u16,
    pub name: String,
}

// ── Handshake ────────────────────────────────────────────────────

/// Run the RFB handshake up to and including ServerInit.
///
/// Only the `None` security type is supported.
pub async fn handshake<S>(stream: &mut S, shared: bool) -> Result<Handshake, ZxError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut greeting = [0u8; 12];
    stream.read_exact(&mut greeting).await?;
    let version = Version::negotiate(&greeting)?;
    stream.write_all(version.greeting()).await?;
    debug!(?version, "protocol version agreed");

    match version {
        Version::V3_3 => match stream.read_u32().await? {
            t if t == SECURITY_NONE as u32 => {}
            t if t == SECURITY_INVALID as u32 => {
                return Err(ZxError::Refused(read_text(stream).await?));
            }
            t => return Err(ZxError::UnsupportedSecurity(vec![t as u8])),
        },
        Version::V3_7 | Version::V3_8 => {
            let count = stream.read_u8().await?;
            if count == 0 {
                return Err(ZxError::Refused(read_text(stream).await?));
            }
            let mut offered = vec![0u8; count as usize];
            stream.read_exact(&mut offered).await?;
            if !offered.contains(&SECURITY_NONE) {
                return Err(ZxError::UnsupportedSecurity(offered));
            }
            stream.write_u8(SECURITY_NONE).await?;

            if version == Version::V3_8 && stream.read_u32().await? != 0 {
                return Err(ZxError::Refused(read_text(stream).await?));
            }
        }
    }

    stream.write_u8(u8::from(shared)).await?;

    let mut init = [0u8; ServerInit::LEN];
    stream.read_exact(&mut init).await?;
    let init = ServerInit::read(&mut &init[..]);
    let name = read_text_of_len(stream, init.name_len).await?;

    Ok(Handshake {
        version,
        width: init.width,
        height: init.height,
        name,
    })
}

async fn read_text<S: AsyncRead + Unpin>(stream: &mut S) -> Result<String, ZxError> {
    let len = stream.read_u32().await?;
    read_text_of_len(stream, len).await
}

async fn read_text_of_len<S: AsyncRead + Unpin>(stream: &mut S, len: u32) -> Result<String, ZxError> {
    if len > MAX_TEXT_LEN {
        return Err(ZxError::ProtocolViolation("string too long"));
    }
    let mut text = vec![0u8; len as usize];
    stream.read_exact(&mut text).await?;
    Ok(String::from_utf8_lossy(&text).into_owned())
}

// ── VncClient ────────────────────────────────────────────────────

/// A connected RFB session.
pub struct VncClient {
    reader: FramedRead<OwnedReadHalf, ServerCodec>,
    writer: FramedWrite<OwnedWriteHalf, ClientCodec>,
    framebuffer: RemoteFramebuffer,
    name: String,
}

impl VncClient {
    /// Connect, authenticate and request the first full update.
    pub async fn connect(addr: &str, shared: bool, timeout: Duration) -> Result<Self, ZxError> {
        let (stream, handshake) = tokio::time::timeout(timeout, async {
            let mut stream = TcpStream::connect(addr).await?;
            stream.set_nodelay(true)?;
            let handshake = handshake(&mut stream, shared).await?;
            Ok::<_, ZxError>((stream, handshake))
        })
        .await
        .map_err(|_| ZxError::Timeout(timeout))??;

        info!(
            addr,
            name = %handshake.name,
            width = handshake.width,
            height = handshake.height,
            version = ?handshake.version,
            "connected to VNC server"
        );

        let (read_half, write_half) = stream.into_split();
        let mut client = Self {
            reader: FramedRead::new(read_half, ServerCodec),
            writer: FramedWrite::new(write_half, ClientCodec),
            framebuffer: RemoteFramebuffer::new(handshake.width, handshake.height),
            name: handshake.name,
        };

        client
            .send(ClientMessage::SetPixelFormat(PixelFormat::bgrx32()))
            .await?;
        client
            .send(ClientMessage::SetEncodings(vec![ENCODING_RAW, ENCODING_DESKTOP_SIZE]))
            .await?;
        client.request_update(false).await?;
        Ok(client)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn framebuffer(&self) -> &RemoteFramebuffer {
        &self.framebuffer
    }

    /// Next message from the server. Cancel-safe.
    pub async fn recv(&mut self) -> Result<ServerMessage, ZxError> {
        match self.reader.next().await {
            Some(msg) => msg,
            None => Err(ZxError::Closed("VNC server")),
        }
    }

    /// Apply `msg` and return the regions of the remote framebuffer it
    /// changed. A framebuffer update is followed by a request for the
    /// next one.
    pub async fn handle(&mut self, msg: ServerMessage) -> Result<Vec<Rect>, ZxError> {
        match msg {
            ServerMessage::FramebufferUpdate(rects) => {
                let mut damaged = Vec::with_capacity(rects.len());
                let mut resized = false;

                for update in rects {
                    match update.body {
                        RectBody::Raw(pixels) => {
                            self.framebuffer.write_raw(update.rect, &pixels);
                            damaged.push(update.rect);
                        }
                        RectBody::DesktopSize => {
                            info!(
                                width = update.rect.width,
                                height = update.rect.height,
                                "remote desktop resized"
                            );
                            self.framebuffer.resize(update.rect.width, update.rect.height);
                            damaged.push(Rect::new(0, 0, update.rect.width, update.rect.height));
                            resized = true;
                        }
                    }
                }

                trace!(rects = damaged.len(), "framebuffer update applied");
                self.request_update(!resized).await?;
                Ok(damaged)
            }
            ServerMessage::Bell => {
                debug!("bell");
                Ok(Vec::new())
            }
            ServerMessage::ServerCutText(text) => {
                debug!(bytes = text.len(), "ignoring server cut text");
                Ok(Vec::new())
            }
            ServerMessage::SetColourMapEntries => {
                debug!("ignoring colour map entries");
                Ok(Vec::new())
            }
        }
    }

    /// Inject a Spectrum input event into the remote session.
    pub async fn send_event(&mut self, event: &InputEvent) -> Result<(), ZxError> {
        let msg = match *event {
            InputEvent::Key { keysym, down } => ClientMessage::Key { down, keysym },
            InputEvent::Pointer { x, y, buttons } => ClientMessage::Pointer { buttons, x, y },
        };
        self.send(msg).await
    }

    /// Ask for the part of the desktop the Spectrum can show.
    async fn request_update(&mut self, incremental: bool) -> Result<(), ZxError> {
        let width = (self.framebuffer.width() as usize).min(SCREEN_WIDTH) as u16;
        let height = (self.framebuffer.height() as usize).min(SCREEN_HEIGHT) as u16;
        self.send(ClientMessage::UpdateRequest {
            incremental,
            rect: Rect::new(0, 0, width, height),
        })
        .await
    }

    async fn send(&mut self, msg: ClientMessage) -> Result<(), ZxError> {
        self.writer.send(msg).await
    }
}
