//! Built-in game descriptions
//!
//! Each preset pairs a JSON hardware description with the handler overrides
//! its cabinet needs on top of the default registry.

use crate::adapter::HardwareAdapter;
use crate::config::HardwareConfig;
use crate::handlers::{HandlerOverrides, InHandler, OutHandler};
use crate::ArcadeError;

pub struct Preset {
    /// Short lookup key, e.g. "invaders"
    pub key: &'static str,
    config_json: &'static str,
    overrides: fn() -> HandlerOverrides,
}

impl Preset {
    pub fn config(&self) -> Result<HardwareConfig, ArcadeError> {
        HardwareConfig::from_json(self.config_json)
    }

    pub fn overrides(&self) -> HandlerOverrides {
        (self.overrides)()
    }

    pub fn adapter(&self) -> Result<HardwareAdapter, ArcadeError> {
        Ok(HardwareAdapter::with_overrides(
            self.config()?,
            self.overrides(),
        ))
    }
}

impl std::fmt::Debug for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preset").field("key", &self.key).finish()
    }
}

fn no_overrides() -> HandlerOverrides {
    HandlerOverrides::new()
}

fn invaders_overrides() -> HandlerOverrides {
    HandlerOverrides::new().with_in("dip_switches", InHandler::DipWithPlayer2)
}

fn alien_invasion_overrides() -> HandlerOverrides {
    HandlerOverrides::new().with_in("player_controls", InHandler::CabinetControls)
}

fn sea_wolf_overrides() -> HandlerOverrides {
    HandlerOverrides::new().with_in("player_1", InHandler::PeriscopePlayer1)
}

fn lupin3_overrides() -> HandlerOverrides {
    HandlerOverrides::new().with_out("color_bank", OutHandler::ColorBank)
}

fn stratovox_overrides() -> HandlerOverrides {
    HandlerOverrides::new()
        .with_out("speech", OutHandler::Speech)
        .with_out("speech_data", OutHandler::SpeechData)
}

fn galaxian_overrides() -> HandlerOverrides {
    HandlerOverrides::new().with_out("flip_screen", OutHandler::FlipScreen)
}

pub static PRESETS: &[Preset] = &[
    Preset {
        key: "invaders",
        config_json: include_str!("../configs/invaders.json"),
        overrides: invaders_overrides,
    },
    Preset {
        key: "alieninvasion",
        config_json: include_str!("../configs/alieninvasion.json"),
        overrides: alien_invasion_overrides,
    },
    Preset {
        key: "gunfight",
        config_json: include_str!("../configs/gunfight.json"),
        overrides: no_overrides,
    },
    Preset {
        key: "seawolf",
        config_json: include_str!("../configs/seawolf.json"),
        overrides: sea_wolf_overrides,
    },
    Preset {
        key: "lupin3",
        config_json: include_str!("../configs/lupin3.json"),
        overrides: lupin3_overrides,
    },
    Preset {
        key: "stratovox",
        config_json: include_str!("../configs/stratovox.json"),
        overrides: stratovox_overrides,
    },
    Preset {
        key: "spacefury",
        config_json: include_str!("../configs/spacefury.json"),
        overrides: no_overrides,
    },
    Preset {
        key: "galaxian",
        config_json: include_str!("../configs/galaxian.json"),
        overrides: galaxian_overrides,
    },
];

/// Case-insensitive lookup by key
pub fn find(key: &str) -> Result<&'static Preset, ArcadeError> {
    PRESETS
        .iter()
        .find(|p| p.key.eq_ignore_ascii_case(key))
        .ok_or_else(|| ArcadeError::UnknownPreset(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoFormat;
    use crate::handlers::{default_in_handler, default_out_handler};

    #[test]
    fn test_every_preset_parses() {
        for preset in PRESETS {
            let config = preset
                .config()
                .unwrap_or_else(|e| panic!("{} failed: {}", preset.key, e));
            assert!(!config.memory_map.rom.is_empty(), "{} has no ROM", preset.key);
            assert!(!config.interrupts.is_empty(), "{} has no interrupts", preset.key);
        }
    }

    #[test]
    fn test_override_names_are_bound_somewhere() {
        for preset in PRESETS {
            let config = preset.config().expect("valid preset");
            let overrides = preset.overrides();
            for name in config.ports.inputs.values() {
                assert!(
                    overrides.resolve_in(name).is_some() || default_in_handler(name).is_some(),
                    "{}: IN {} unresolved",
                    preset.key,
                    name
                );
            }
            for name in config.ports.outputs.values() {
                let resolved = overrides.resolve_out(name).or_else(|| default_out_handler(name));
                // Sea Wolf's torpedo launcher has no emulated device
                assert!(
                    resolved.is_some() || name == "torpedo_sound",
                    "{}: OUT {} unresolved",
                    preset.key,
                    name
                );
            }
        }
    }

    #[test]
    fn test_invaders_layout() {
        let config = find("invaders").and_then(|p| p.config()).expect("invaders");
        assert_eq!(config.video.rotation, 90);
        assert_eq!((config.video.width, config.video.height), (224, 256));
        assert_eq!(config.memory_map.rom.len(), 4);
        assert_eq!(config.memory_map.rom[3].start, 0x1800);
        assert_eq!(config.memory_map.ram[0].start, 0x2000);
        assert_eq!(config.memory_map.video.as_ref().map(|v| v.start), Some(0x2400));
        assert_eq!(config.dip_settings.default, 0x08);
    }

    #[test]
    fn test_galaxian_uses_tilemap() {
        let config = find("galaxian").and_then(|p| p.config()).expect("galaxian");
        let video = config.memory_map.video.expect("video region");
        assert_eq!(video.effective_format(), VideoFormat::Tilemap);
        assert_eq!(video.tilemap, Some(0x4400));
        assert_eq!(video.sprite_patterns, Some(0x5000));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find("GunFight").map(|p| p.key).ok(), Some("gunfight"));
        assert!(matches!(find("pacman"), Err(ArcadeError::UnknownPreset(_))));
    }
}
