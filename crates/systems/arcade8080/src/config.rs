//! Declarative per-game hardware description
//!
//! A [`HardwareConfig`] is parsed once from JSON and never mutated. Keys are
//! camelCase and port numbers are JSON object keys:
//!
//! ```json
//! {
//!   "name": "Space Invaders",
//!   "video": { "width": 224, "height": 256, "rotation": 90, "color": false },
//!   "memoryMap": {
//!     "rom": [{ "start": 0, "end": 2047, "size": 2048, "fileMatch": "invaders.h" }],
//!     "ram": [{ "start": 8192, "end": 9215, "size": 1024 }],
//!     "video": { "start": 9216, "end": 16383 }
//!   },
//!   "ports": { "in": { "3": "shift_register" }, "out": { "2": "shift_offset" } },
//!   "interrupts": [{ "vector": 2, "period": 1 }],
//!   "dipSettings": { "default": 8 }
//! }
//! ```

use crate::ArcadeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub video: DisplayConfig,
    pub memory_map: MemoryMap,
    #[serde(default)]
    pub ports: PortBindings,
    #[serde(default)]
    pub interrupts: Vec<InterruptSchedule>,
    #[serde(default)]
    pub dip_settings: DipSettings,
    #[serde(default)]
    pub timing: FrameTiming,
}

/// Monitor geometry as seen by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub rotation: u16,
    #[serde(default)]
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 224,
            rotation: 0,
            color: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMap {
    #[serde(default)]
    pub rom: Vec<RomRegion>,
    #[serde(default)]
    pub ram: Vec<RamRegion>,
    #[serde(default)]
    pub video: Option<VideoRegion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RomRegion {
    pub start: u16,
    pub end: u16,
    pub size: usize,
    /// Case-insensitive token searched for in ROM file names
    pub file_match: String,
}

impl RomRegion {
    pub fn matches(&self, file_name: &str) -> bool {
        file_name
            .to_ascii_lowercase()
            .contains(&self.file_match.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamRegion {
    pub start: u16,
    pub end: u16,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRegion {
    pub start: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilemap: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprites: Option<u16>,
    /// 16x16 sprite pattern data, 32 bytes per pattern
    #[serde(rename = "spritePatterns", default, skip_serializing_if = "Option::is_none")]
    pub sprite_patterns: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<VideoFormat>,
}

impl VideoRegion {
    /// Declared format, or a tilemap layout when only tile/sprite tables are given
    pub fn effective_format(&self) -> VideoFormat {
        match self.format {
            Some(format) => format,
            None if self.tilemap.is_some() || self.sprites.is_some() => VideoFormat::Tilemap,
            None => VideoFormat::Bitmap1bpp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoFormat {
    #[serde(rename = "1bpp")]
    Bitmap1bpp,
    #[serde(rename = "color", alias = "2bpp")]
    Color2bpp,
    #[serde(rename = "tilemap")]
    Tilemap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBindings {
    #[serde(rename = "in", default)]
    pub inputs: BTreeMap<u8, String>,
    #[serde(rename = "out", default)]
    pub outputs: BTreeMap<u8, String>,
}

/// Raise RST `vector` on every frame whose index is a multiple of `period`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptSchedule {
    pub vector: u8,
    pub period: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DipSettings {
    #[serde(default)]
    pub default: u8,
}

/// CPU clock and display refresh; together they fix the per-frame cycle budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTiming {
    pub clock_hz: u32,
    pub refresh_hz: u32,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            clock_hz: 2_000_000,
            refresh_hz: 60,
        }
    }
}

impl FrameTiming {
    pub fn cycles_per_frame(&self) -> u32 {
        self.clock_hz / self.refresh_hz.max(1)
    }
}

impl HardwareConfig {
    /// Parse and validate a JSON hardware description
    pub fn from_json(json: &str) -> Result<Self, ArcadeError> {
        let config: HardwareConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ArcadeError> {
        if self.video.width == 0 || self.video.height == 0 {
            return Err(ArcadeError::InvalidDisplay {
                width: self.video.width,
                height: self.video.height,
            });
        }

        if self.timing.clock_hz == 0
            || self.timing.refresh_hz == 0
            || self.timing.cycles_per_frame() == 0
        {
            return Err(ArcadeError::InvalidTiming {
                clock_hz: self.timing.clock_hz,
                refresh_hz: self.timing.refresh_hz,
            });
        }

        for rom in &self.memory_map.rom {
            check_region("ROM", rom.start, rom.end, rom.size)?;
            if rom.file_match.trim().is_empty() {
                return Err(ArcadeError::InvalidRegion {
                    kind: "ROM",
                    start: rom.start,
                    end: rom.end,
                    reason: "empty fileMatch".to_string(),
                });
            }
        }

        for ram in &self.memory_map.ram {
            check_region("RAM", ram.start, ram.end, ram.size)?;
        }

        if let Some(video) = &self.memory_map.video {
            if let Some(end) = video.end {
                if end < video.start {
                    return Err(ArcadeError::InvalidRegion {
                        kind: "video",
                        start: video.start,
                        end,
                        reason: "end before start".to_string(),
                    });
                }
            }
        }

        for irq in &self.interrupts {
            if irq.period == 0 {
                return Err(ArcadeError::InvalidInterruptPeriod { vector: irq.vector });
            }
        }

        Ok(())
    }

    /// Per-frame cycle budget
    pub fn cycles_per_frame(&self) -> u32 {
        self.timing.cycles_per_frame()
    }
}

fn check_region(kind: &'static str, start: u16, end: u16, size: usize) -> Result<(), ArcadeError> {
    if end < start {
        return Err(ArcadeError::InvalidRegion {
            kind,
            start,
            end,
            reason: "end before start".to_string(),
        });
    }
    let span = (end - start) as usize + 1;
    if size == 0 || size > span {
        return Err(ArcadeError::InvalidRegion {
            kind,
            start,
            end,
            reason: format!("size {} does not fit a {}-byte span", size, span),
        });
    }
    Ok(())
}
