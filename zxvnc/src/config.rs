//! Configuration for the bridge.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use zxvnc_core::render::dither::DiffusionPolicy;
use zxvnc_core::render::tonal::NEUTRAL;
use zxvnc_core::spectrum::scheduler::DEFAULT_POLL_INTERVAL;
use zxvnc_core::{Palette, RenderMode, RenderSettings, TonalAdjustment, Tweak, ZxError};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub network: NetworkConfig,
    pub vnc: VncConfig,
    pub render: RenderConfig,
    pub tonal: TonalConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

/// Where the two ends of the bridge live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Spectrum (or emulator) frame/telemetry socket.
    pub spectrum_address: String,
    /// VNC server.
    pub vnc_address: String,
    /// Applies to each connection attempt, handshake included.
    pub connect_timeout_ms: u64,
}

/// RFB session options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VncConfig {
    /// Ask the server to leave other viewers connected.
    pub shared: bool,
    /// Never inject Spectrum input into the desktop.
    pub view_only: bool,
}

/// Frame conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// "classic", "hi-colour", "ula-plus" or "hi-colour-ula-plus".
    pub mode: RenderMode,
    pub monochrome: bool,
    /// "cross-tiles" or "matching-attributes".
    pub diffusion: DiffusionPolicy,
    /// Custom 64-entry ULAplus palette (GGGRRRBB bytes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<u8>>,
}

/// Tonal adjustment. 128 everywhere is neutral.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TonalConfig {
    pub value_shift: u8,
    pub value_scale: u8,
    pub saturation_shift: u8,
    pub saturation_scale: u8,
    pub hue_shift: u8,
}

/// Transmission scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Idle sleep between checks for a new frame.
    pub poll_interval_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            spectrum_address: "127.0.0.2:2000".into(),
            vnc_address: "127.0.0.1:5900".into(),
            connect_timeout_ms: 5000,
        }
    }
}

impl Default for TonalConfig {
    fn default() -> Self {
        Self {
            value_shift: NEUTRAL,
            value_scale: NEUTRAL,
            saturation_shift: NEUTRAL,
            saturation_scale: NEUTRAL,
            hue_shift: NEUTRAL,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl BridgeConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            mode: self.render.mode,
            monochrome: self.render.monochrome,
            diffusion: self.render.diffusion,
        }
    }

    /// The configured ULAplus palette, if any.
    pub fn palette(&self) -> Result<Option<Palette>, ZxError> {
        self.render
            .palette
            .as_deref()
            .map(Palette::extended_from_slice)
            .transpose()
    }

    pub fn tonal_adjustment(&self) -> TonalAdjustment {
        TonalAdjustment {
            value: Tweak::new(self.tonal.value_shift, self.tonal.value_scale),
            saturation: Tweak::new(self.tonal.saturation_shift, self.tonal.saturation_scale),
            hue_shift: self.tonal.hue_shift,
            monochrome: self.render.monochrome,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.scheduler.poll_interval_ms.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.network.connect_timeout_ms)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = toml::to_string_pretty(&BridgeConfig::default()).unwrap();
        assert!(text.contains("spectrum_address"));
        assert!(text.contains("mode = \"classic\""));
        assert!(text.contains("diffusion = \"cross-tiles\""));
        assert!(!text.contains("palette"));
    }

    #[test]
    fn roundtrip_config() {
        let text = toml::to_string_pretty(&BridgeConfig::default()).unwrap();
        let parsed: BridgeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.network.spectrum_address, "127.0.0.2:2000");
        assert_eq!(parsed.scheduler.poll_interval_ms, 10);
        assert_eq!(parsed.tonal_adjustment(), TonalAdjustment::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let parsed: BridgeConfig = toml::from_str(
            r#"
            [render]
            mode = "hi-colour-ula-plus"
            diffusion = "matching-attributes"
            monochrome = true

            [tonal]
            value_scale = 192
            "#,
        )
        .unwrap();

        assert_eq!(parsed.render.mode, RenderMode::HiColourUlaPlus);
        assert_eq!(parsed.render.diffusion, DiffusionPolicy::MatchingAttributes);
        assert_eq!(parsed.network.vnc_address, "127.0.0.1:5900");

        let tonal = parsed.tonal_adjustment();
        assert_eq!(tonal.value, Tweak::new(128, 192));
        assert!(tonal.monochrome);
        assert!(parsed.render_settings().monochrome);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let parsed: Result<BridgeConfig, _> = toml::from_str("[render]\nmode = \"timex\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn palette_length_is_checked() {
        let mut cfg = BridgeConfig::default();
        assert!(cfg.palette().unwrap().is_none());

        cfg.render.palette = Some(vec![0; 63]);
        assert!(matches!(cfg.palette(), Err(ZxError::InvalidPalette(63))));

        cfg.render.palette = Some((0..64).collect());
        let palette = cfg.palette().unwrap().unwrap();
        assert_eq!(palette.entries().unwrap()[63], 63);
    }

    #[test]
    fn zero_poll_interval_is_raised() {
        let mut cfg = BridgeConfig::default();
        cfg.scheduler.poll_interval_ms = 0;
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1));
    }
}
