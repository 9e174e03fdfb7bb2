//! Frame transmission to the Spectrum.
//!
//! The scheduler watches the working [`ToneFrame`] published by the
//! session. Whenever a new version is available it takes a snapshot,
//! renders it and writes the whole packed frame; otherwise it sleeps for
//! the poll interval. Updates that land while a frame is being sent are
//! picked up on the next pass.

use std::time::{Duration, Instant};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::error::ZxError;
use crate::render::frame::ToneFrame;
use crate::render::pipeline::Renderer;

/// Default idle poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ── TransmissionScheduler ────────────────────────────────────────

/// Renders and streams frames to the Spectrum.
///
/// # Lifetime
///
/// [`run`](Self::run) returns `Ok` once every sender of the frame channel
/// has been dropped, and `Err` on the first failed write. A failed write
/// is final; nothing is retried.
pub struct TransmissionScheduler<W> {
    renderer: Renderer,
    frames: watch::Receiver<ToneFrame>,
    sink: W,
    poll_interval: Duration,
    frames_sent: u64,
}

impl<W: AsyncWrite + Unpin> TransmissionScheduler<W> {
    pub fn new(renderer: Renderer, frames: watch::Receiver<ToneFrame>, sink: W) -> Self {
        Self {
            renderer,
            frames,
            sink,
            poll_interval: DEFAULT_POLL_INTERVAL,
            frames_sent: 0,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the transmit loop. Returns the number of frames sent.
    pub async fn run(mut self) -> Result<u64, ZxError> {
        info!(
            bytes_per_frame = self.renderer.frame_len(),
            mode = ?self.renderer.settings().mode,
            "transmission scheduler started"
        );

        loop {
            match self.frames.has_changed() {
                Ok(true) => {
                    let frame = self.frames.borrow_and_update().clone();
                    self.transmit(&frame).await?;
                }
                Ok(false) => tokio::time::sleep(self.poll_interval).await,
                Err(_) => {
                    info!(frames = self.frames_sent, "frame source closed; scheduler done");
                    return Ok(self.frames_sent);
                }
            }
        }
    }

    /// Render `frame` and write it in full.
    async fn transmit(&mut self, frame: &ToneFrame) -> Result<(), ZxError> {
        let started = Instant::now();
        let packed = self.renderer.render(frame);

        // write_all keeps going after short writes until the frame is out.
        if let Err(e) = self.sink.write_all(packed.as_bytes()).await {
            error!(frame = self.frames_sent, "frame write failed: {e}");
            return Err(e.into());
        }
        self.sink.flush().await?;

        self.frames_sent += 1;
        debug!(
            frame = self.frames_sent,
            bytes = packed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "frame sent"
        );
        Ok(())
    }
}
