//! Bridge session.
//!
//! One session owns both connections. The control loop selects between
//! the RFB stream and the Spectrum's telemetry; the scheduler runs as its
//! own task and reads the working frame through a watch channel.

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, trace};

use zxvnc_core::render::frame::{SCREEN_HEIGHT, SCREEN_WIDTH};
use zxvnc_core::{
    InputTracker, Rect, Renderer, TelemetryCodec, ToneFrame, TransmissionScheduler, VncClient,
    ZxError,
};

use crate::config::BridgeConfig;

// ── BridgeService ────────────────────────────────────────────────

/// The top-level bridge.
pub struct BridgeService {
    config: BridgeConfig,
}

impl BridgeService {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Connect both ends and run until either side fails.
    ///
    /// 1. Connects to the Spectrum, then to the VNC server.
    /// 2. Publishes a full-screen pass of the desktop.
    /// 3. Spawns the [`TransmissionScheduler`] on the write half.
    /// 4. Applies damaged rectangles and injects Spectrum input until a
    ///    connection drops.
    pub async fn run(&self) -> Result<(), ZxError> {
        let timeout = self.config.connect_timeout();
        let renderer = Renderer::new(self.config.render_settings(), self.config.palette()?);
        let tonal = self.config.tonal_adjustment();
        let view_only = self.config.vnc.view_only;

        let spectrum_addr = &self.config.network.spectrum_address;
        info!("connecting to Spectrum at {spectrum_addr}");
        let spectrum = tokio::time::timeout(timeout, TcpStream::connect(spectrum_addr))
            .await
            .map_err(|_| ZxError::Timeout(timeout))??;
        spectrum.set_nodelay(true)?;
        let (spectrum_rx, spectrum_tx) = spectrum.into_split();

        let mut vnc =
            VncClient::connect(&self.config.network.vnc_address, self.config.vnc.shared, timeout)
                .await?;

        let (frames, frame_rx) = watch::channel(ToneFrame::new());
        frames.send_modify(|frame| {
            let screen = Rect::new(0, 0, SCREEN_WIDTH as u16, SCREEN_HEIGHT as u16);
            tonal.apply(frame, vnc.framebuffer(), screen);
        });

        let mut scheduler = tokio::spawn(
            TransmissionScheduler::new(renderer, frame_rx, spectrum_tx)
                .with_poll_interval(self.config.poll_interval())
                .run(),
        );

        let mut telemetry = FramedRead::new(spectrum_rx, TelemetryCodec);
        let mut tracker = InputTracker::new();

        info!(
            mode = ?self.config.render.mode,
            view_only,
            "bridge running"
        );

        loop {
            tokio::select! {
                msg = vnc.recv() => {
                    let damaged = vnc.handle(msg?).await?;
                    if damaged.is_empty() {
                        continue;
                    }
                    let source = vnc.framebuffer();
                    frames.send_modify(|frame| {
                        for rect in &damaged {
                            tonal.apply(frame, source, *rect);
                        }
                    });
                }

                record = telemetry.next() => {
                    let Some(record) = record else {
                        info!("Spectrum closed the connection");
                        scheduler.abort();
                        return Err(ZxError::Closed("Spectrum"));
                    };
                    for event in tracker.observe(record?) {
                        if view_only {
                            trace!(?event, "view-only; dropping input");
                            continue;
                        }
                        debug!(?event, "injecting input");
                        vnc.send_event(&event).await?;
                    }
                }

                result = &mut scheduler => {
                    return match result {
                        Ok(Ok(sent)) => {
                            info!(frames = sent, "scheduler finished");
                            Ok(())
                        }
                        Ok(Err(e)) => {
                            error!("frame transmission failed: {e}");
                            Err(e)
                        }
                        Err(e) => Err(ZxError::Other(format!("scheduler task failed: {e}"))),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal RFB 3.3 server: 256×192 desktop, then returns the stream
    /// once the client's setup messages are consumed.
    async fn fake_vnc(listener: TcpListener) -> TcpStream {
        let (mut s, _) = listener.accept().await.unwrap();
        s.write_all(b"RFB 003.003\n").await.unwrap();
        let mut version = [0u8; 12];
        s.read_exact(&mut version).await.unwrap();
        s.write_all(&[0, 0, 0, 1]).await.unwrap();
        s.read_u8().await.unwrap();

        let mut init = vec![1, 0, 0, 192];
        init.extend_from_slice(&[32, 24, 0, 1, 0, 255, 0, 255, 0, 255, 16, 8, 0, 0, 0, 0]);
        init.extend_from_slice(&[0, 0, 0, 0]);
        s.write_all(&init).await.unwrap();

        let mut setup = [0u8; 42];
        s.read_exact(&mut setup).await.unwrap();
        s
    }

    fn config_for(spectrum: &TcpListener, vnc: &TcpListener) -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.network.spectrum_address = spectrum.local_addr().unwrap().to_string();
        config.network.vnc_address = vnc.local_addr().unwrap().to_string();
        config.scheduler.poll_interval_ms = 1;
        config
    }

    #[tokio::test]
    async fn bridges_frames_and_input() {
        let spectrum_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let vnc_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = config_for(&spectrum_listener, &vnc_listener);

        let vnc = tokio::spawn(async move {
            let mut s = fake_vnc(vnc_listener).await;
            let mut key = [0u8; 8];
            s.read_exact(&mut key).await.unwrap();
            key
        });

        let spectrum = tokio::spawn(async move {
            let (mut s, _) = spectrum_listener.accept().await.unwrap();
            let mut frame = vec![0u8; 6912];
            s.read_exact(&mut frame).await.unwrap();
            s.write_all(&[b'a', 0, 0, 0, 0, 0]).await.unwrap();
            (s, frame)
        });

        let service = BridgeService::new(config);
        let run = tokio::spawn(async move { service.run().await });

        let key = tokio::time::timeout(Duration::from_secs(5), vnc)
            .await
            .expect("timeout")
            .unwrap();
        assert_eq!(key, [4, 1, 0, 0, 0, 0, 0, b'a']);

        let (stream, frame) = spectrum.await.unwrap();
        assert!(frame[..0x1800].iter().all(|&b| b == 0));

        drop(stream);
        let result = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("timeout")
            .unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn view_only_drops_input() {
        let spectrum_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let vnc_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = config_for(&spectrum_listener, &vnc_listener);
        config.vnc.view_only = true;

        let vnc = tokio::spawn(async move {
            let mut s = fake_vnc(vnc_listener).await;
            let mut buf = [0u8; 8];
            tokio::time::timeout(Duration::from_millis(200), s.read(&mut buf)).await
        });

        let spectrum = tokio::spawn(async move {
            let (mut s, _) = spectrum_listener.accept().await.unwrap();
            let mut frame = vec![0u8; 6912];
            s.read_exact(&mut frame).await.unwrap();
            s.write_all(&[13, 1, 5, 0, 5, 0]).await.unwrap();
            s
        });

        let service = BridgeService::new(config);
        let _run = tokio::spawn(async move { service.run().await });

        assert!(vnc.await.unwrap().is_err(), "no input reached the VNC server");
        drop(spectrum.await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_spectrum_fails_fast() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let mut config = BridgeConfig::default();
        config.network.spectrum_address = addr;
        let result = BridgeService::new(config).run().await;
        assert!(matches!(
            result,
            Err(ZxError::Connection(_)) | Err(ZxError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn bad_palette_is_reported_before_connecting() {
        let mut config = BridgeConfig::default();
        config.render.palette = Some(vec![0; 10]);
        let result = BridgeService::new(config).run().await;
        assert!(matches!(result, Err(ZxError::InvalidPalette(10))));
    }
}
