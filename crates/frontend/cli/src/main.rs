use anyhow::{Context, Result};
use clap::Parser;
use emu_arcade8080::{
    buttons, presets, ArcadeSystem, DirRomSource, HardwareAdapter, HardwareConfig, InputState,
};
use emu_core::logging::{LogCategory, LogConfig, LogLevel};
use emu_core::System;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
struct Args {
    /// Game to run: a preset key ("invaders", "gunfight", ...) or a hardware config JSON file
    game: Option<String>,

    /// Directory holding the game's ROM images
    #[arg(long)]
    roms: Option<PathBuf>,

    /// Number of frames to run
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Hold a button for the whole run, e.g. --press coin1 (repeatable)
    #[arg(long = "press")]
    press: Vec<String>,

    /// Restore this save state before running
    #[arg(long)]
    load: Option<String>,

    /// Dump save-state to this file as JSON
    #[arg(long, default_value = "state.json")]
    save: String,

    /// Print per-frame pixel counts + debug_state
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Suppress all per-frame output (still writes --save)
    #[arg(long, default_value_t = false)]
    quiet: bool,

    /// Core log level for every category (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Per-category core log level, e.g. --log cpu=trace (repeatable)
    #[arg(long = "log")]
    log: Vec<String>,

    /// Write core logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// List the built-in presets and exit
    #[arg(long, default_value_t = false)]
    list: bool,
}

fn configure_logging(args: &Args) -> Result<()> {
    let config = LogConfig::global();
    let level = LogLevel::from_str(&args.log_level)
        .with_context(|| format!("Unknown log level: {}", args.log_level))?;
    config.set_global_level(level);

    for spec in &args.log {
        let (category, level) = spec
            .split_once('=')
            .with_context(|| format!("Expected CATEGORY=LEVEL, got {}", spec))?;
        let category = LogCategory::from_str(category)
            .with_context(|| format!("Unknown log category: {}", category))?;
        let level =
            LogLevel::from_str(level).with_context(|| format!("Unknown log level: {}", level))?;
        config.set_level(category, level);
    }

    if let Some(path) = &args.log_file {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("Cannot open log file {}", path.display()))?;
    }
    Ok(())
}

fn load_adapter(game: &str) -> Result<HardwareAdapter> {
    if let Ok(preset) = presets::find(game) {
        return Ok(preset.adapter()?);
    }
    let path = Path::new(game);
    if path.is_file() {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let config = HardwareConfig::from_json(&json)
            .with_context(|| format!("Invalid hardware config {}", path.display()))?;
        return Ok(HardwareAdapter::new(config));
    }
    anyhow::bail!("Unknown game: {} (not a preset or a config file)", game)
}

fn list_presets() -> Result<()> {
    for preset in presets::PRESETS {
        let config = preset.config()?;
        let roms: Vec<&str> = config
            .memory_map
            .rom
            .iter()
            .map(|r| r.file_match.as_str())
            .collect();
        println!(
            "{:<14} {} ({}, {}) roms: {}",
            preset.key,
            config.name,
            config.manufacturer.as_deref().unwrap_or("unknown"),
            config.year.map(|y| y.to_string()).unwrap_or_default(),
            roms.join(", ")
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list {
        return list_presets();
    }
    let Some(game) = args.game.as_deref() else {
        anyhow::bail!("No game given; use --list to see the presets");
    };

    configure_logging(&args)?;

    let mut sys = ArcadeSystem::new(load_adapter(game)?);
    log::info!(
        "Running {} for {} frames ({} cycles per frame)",
        sys.adapter().config().name,
        args.frames,
        sys.cycles_per_frame()
    );

    if let Some(dir) = &args.roms {
        let report = sys.load_roms_from(&DirRomSource::new(dir))?;
        for rom in &report.loaded {
            log::info!(
                "{} -> 0x{:04X} ({} bytes, {} ignored)",
                rom.file_name,
                rom.start,
                rom.bytes_loaded,
                rom.bytes_ignored
            );
        }
        for name in &report.skipped {
            log::warn!("{}: no ROM region matches, skipped", name);
        }
    }
    for mount in sys.mount_points() {
        if mount.required && !sys.is_mounted(&mount.id) {
            log::warn!("No ROM loaded for {} ({})", mount.id, mount.name);
        }
    }

    if let Some(path) = &args.load {
        let json = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path))?;
        let state: serde_json::Value = serde_json::from_str(&json)?;
        sys.load_state(&state)
            .with_context(|| format!("Cannot restore {}", path))?;
    }

    for button in &args.press {
        if !buttons::ALL.contains(&button.as_str()) {
            log::warn!("{} is not read by any default handler", button);
        }
    }
    let input: InputState = args.press.iter().map(|b| (b.as_str(), true)).collect();
    sys.set_input(input);

    for fnum in 1..=args.frames {
        let frame = sys.step_frame()?;
        if args.quiet {
            continue;
        }

        if args.debug {
            let lit = frame.pixels.iter().filter(|&&p| p != 0).count();
            println!(
                "Frame {}: {}x{}, {} lit pixels, {} cycles",
                fnum,
                frame.width,
                frame.height,
                lit,
                sys.last_frame_cycles()
            );
            println!(
                "DEBUG STATE (frame {}):\n{}",
                fnum,
                serde_json::to_string_pretty(&sys.debug_state())?
            );
        }
    }

    if !args.quiet {
        let info = sys.display_info();
        println!(
            "Ran {} frames of {} (rotation {}, {})",
            sys.frame_index(),
            sys.adapter().config().name,
            info.rotation,
            if info.color { "colour" } else { "monochrome" }
        );
    }

    let state = sys.save_state();
    let mut f = File::create(&args.save)?;
    write!(f, "{}", serde_json::to_string_pretty(&state)?)?;
    Ok(())
}
