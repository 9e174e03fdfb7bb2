//! zxvnc entry point.
//!
//! ```text
//! zxvnc                          Run with zxvnc.toml (or defaults)
//! zxvnc --config <path>          Load a custom config TOML
//! zxvnc --vnc host:5901          Override the VNC server
//! zxvnc --mode hi-colour         Override the render mode
//! zxvnc --gen-config             Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use serde::de::IntoDeserializer;
use serde::de::value::{Error as ValueError, StrDeserializer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use zxvnc::config::BridgeConfig;
use zxvnc::service::BridgeService;
use zxvnc_core::RenderMode;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "zxvnc", about = "Show a VNC desktop on a ZX Spectrum")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "zxvnc.toml")]
    config: PathBuf,

    /// VNC server address (host:port).
    #[arg(long)]
    vnc: Option<String>,

    /// Spectrum address (host:port).
    #[arg(long)]
    spectrum: Option<String>,

    /// classic, hi-colour, ula-plus or hi-colour-ula-plus.
    #[arg(long, value_parser = parse_mode)]
    mode: Option<RenderMode>,

    /// Render in white on black only.
    #[arg(long)]
    monochrome: bool,

    /// Do not forward Spectrum input to the desktop.
    #[arg(long)]
    view_only: bool,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

fn parse_mode(s: &str) -> Result<RenderMode, String> {
    let de: StrDeserializer<'_, ValueError> = s.into_deserializer();
    RenderMode::deserialize(de).map_err(|e| e.to_string())
}

impl Cli {
    /// Command-line flags take precedence over the file.
    fn apply(&self, config: &mut BridgeConfig) {
        if let Some(vnc) = &self.vnc {
            config.network.vnc_address = vnc.clone();
        }
        if let Some(spectrum) = &self.spectrum {
            config.network.spectrum_address = spectrum.clone();
        }
        if let Some(mode) = self.mode {
            config.render.mode = mode;
        }
        config.render.monochrome |= self.monochrome;
        config.vnc.view_only |= self.view_only;
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&BridgeConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = BridgeConfig::load(&cli.config);
    cli.apply(&mut config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("zxvnc v{}", env!("CARGO_PKG_VERSION"));
    info!("VNC server: {}", config.network.vnc_address);
    info!("Spectrum: {}", config.network.spectrum_address);
    info!(
        "mode: {:?}, {} bytes per frame",
        config.render.mode,
        config.render.mode.frame_len()
    );

    let service = BridgeService::new(config);

    tokio::select! {
        result = service.run() => {
            if let Err(e) = result {
                error!("bridge stopped: {e}");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    Ok(())
}
