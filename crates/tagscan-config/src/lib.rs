// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod telemetry;

pub use telemetry::init_tracing;

/// How the 4-byte frame size field of an ID3v2 frame is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameSizeEncoding {
    /// Plain 32-bit big-endian integer.
    #[default]
    Plain,
    /// 7 significant bits per byte, as ID3v2.4 writers emit it.
    Synchsafe,
}

impl FrameSizeEncoding {
    /// Decode a 4-byte size field.
    pub fn decode(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Plain => u32::from_be_bytes(bytes),
            Self::Synchsafe => {
                ((bytes[0] as u32 & 0x7F) << 21)
                    | ((bytes[1] as u32 & 0x7F) << 14)
                    | ((bytes[2] as u32 & 0x7F) << 7)
                    | (bytes[3] as u32 & 0x7F)
            }
        }
    }
}

/// What the frame scanner does when it meets a frame id it has no field for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFramePolicy {
    /// End the scan at the unknown frame without consuming it.
    #[default]
    Stop,
    /// Consume the unknown frame and keep scanning.
    Skip,
}

/// Single-byte code page of the ID3v1 trailer's text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyCodepage {
    Latin1,
    #[default]
    Windows1251,
}

/// How a frame with text encoding indicator `0` (ISO-8859-1) is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Latin1Direction {
    /// Payload is UTF-8 and must only hold characters up to U+00FF.
    #[default]
    FromUtf8,
    /// Payload is ISO-8859-1 bytes, widened to UTF-8.
    ToUtf8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReaderConfig {
    pub frame_size: FrameSizeEncoding,
    pub unknown_frames: UnknownFramePolicy,
    pub legacy_codepage: LegacyCodepage,
    pub latin1_direction: Latin1Direction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub reader: ReaderConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: TAGSCAN_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("TAGSCAN_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(
        target: "config",
        frame_size = ?config.reader.frame_size,
        unknown_frames = ?config.reader.unknown_frames,
        legacy_codepage = ?config.reader.legacy_codepage,
        latin1_direction = ?config.reader.latin1_direction,
        "configuration loaded"
    );
    Ok(config)
}
