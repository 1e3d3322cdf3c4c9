//! Video RAM decoding
//!
//! Bitmaps are packed MSB-first, one source row after another. The source
//! bitmap is stored in the monitor's native orientation, so on rotated
//! cabinets output pixel (x, y) is fetched from a rotated source position.
//!
//! Tilemap boards draw 8x8 two-plane tiles from a 32-column name table,
//! then up to 64 16x16 one-plane sprites on top.

use crate::bus::ArcadeBus;
use crate::config::{HardwareConfig, VideoFormat, VideoRegion};
use emu_core::cpu_8080::Memory8080;
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::types::Frame;

pub const PIXEL_ON: u32 = 255;
pub const PIXEL_OFF: u32 = 0;

const TILE_SIZE: u32 = 8;
const TILE_BYTES: u16 = 16;
const TILEMAP_COLUMNS: u32 = 32;
const SPRITE_SIZE: u32 = 16;
const SPRITE_BYTES: u16 = 32;
const SPRITE_COUNT: u16 = 64;
const SPRITE_SHADE: u8 = 3;

/// Decode the configured video region into a fresh frame
pub fn render(config: &HardwareConfig, bus: &ArcadeBus) -> Frame {
    let mut frame = Frame::new(config.video.width, config.video.height);
    let Some(region) = &config.memory_map.video else {
        return frame;
    };

    match region.effective_format() {
        VideoFormat::Bitmap1bpp => {
            render_packed(&mut frame, bus, region.start, config.video.rotation, 1, |v| {
                if v != 0 {
                    PIXEL_ON
                } else {
                    PIXEL_OFF
                }
            })
        }
        VideoFormat::Color2bpp => {
            let bank = u32::from(bus.devices.color_bank) << 2;
            render_packed(&mut frame, bus, region.start, config.video.rotation, 2, |v| {
                bank | u32::from(v)
            })
        }
        VideoFormat::Tilemap => {
            let color = config.video.color;
            render_tiles(&mut frame, bus, region, |v| {
                if color {
                    u32::from(v)
                } else {
                    PIXEL_ON
                }
            });
            if region.sprites.is_some() && region.sprite_patterns.is_none() {
                log(LogCategory::Stubs, LogLevel::Debug, || {
                    format!("{}: sprite table without pattern data, sprites skipped", config.name)
                });
            }
        }
    }

    if bus.devices.flip_screen {
        frame.pixels.reverse();
    }
    frame
}

/// Width in pixels of one stored row
fn source_row_pixels(rotation: u16, width: u32, height: u32) -> u32 {
    match rotation {
        90 | 270 => height,
        _ => width,
    }
}

/// Stored-bitmap coordinates for output pixel (x, y)
fn source_coords(rotation: u16, x: u32, y: u32, width: u32, height: u32) -> (u32, u32) {
    match rotation {
        90 => (height - 1 - y, x),
        180 => (width - 1 - x, height - 1 - y),
        270 => (y, width - 1 - x),
        _ => (x, y),
    }
}

fn render_packed<F: Fn(u8) -> u32>(
    frame: &mut Frame,
    bus: &ArcadeBus,
    start: u16,
    rotation: u16,
    bits_per_pixel: u32,
    color: F,
) {
    let (width, height) = (frame.width, frame.height);
    let pixels_per_byte = 8 / bits_per_pixel;
    let stride = source_row_pixels(rotation, width, height).div_ceil(pixels_per_byte);
    let mask = ((1u32 << bits_per_pixel) - 1) as u8;

    for y in 0..height {
        for x in 0..width {
            let (sx, sy) = source_coords(rotation, x, y, width, height);
            let offset = sy * stride + sx / pixels_per_byte;
            let byte = bus.read(start.wrapping_add(offset as u16));
            let shift = 8 - bits_per_pixel - (sx % pixels_per_byte) * bits_per_pixel;
            frame.set(x, y, color((byte >> shift) & mask));
        }
    }
}

/// Background tiles, then sprites; zero pixels stay transparent
fn render_tiles<F: Fn(u8) -> u32>(frame: &mut Frame, bus: &ArcadeBus, region: &VideoRegion, color: F) {
    if let Some(map) = region.tilemap {
        let rows = frame.height / TILE_SIZE;
        for ty in 0..rows {
            for tx in 0..TILEMAP_COLUMNS {
                let index = bus.read(map.wrapping_add((ty * TILEMAP_COLUMNS + tx) as u16));
                let data = region.start.wrapping_add(u16::from(index).wrapping_mul(TILE_BYTES));
                for py in 0..TILE_SIZE {
                    let plane0 = bus.read(data.wrapping_add((py * 2) as u16));
                    let plane1 = bus.read(data.wrapping_add((py * 2 + 1) as u16));
                    for px in 0..TILE_SIZE {
                        let bit = 0x80 >> px;
                        let v = u8::from(plane0 & bit != 0) | (u8::from(plane1 & bit != 0) << 1);
                        if v != 0 {
                            frame.set(tx * TILE_SIZE + px, ty * TILE_SIZE + py, color(v));
                        }
                    }
                }
            }
        }
    }

    let (Some(table), Some(patterns)) = (region.sprites, region.sprite_patterns) else {
        return;
    };
    for i in 0..SPRITE_COUNT {
        let entry = table.wrapping_add(i * 4);
        let y = bus.read(entry);
        let x = bus.read(entry.wrapping_add(1));
        if x == 0 || y == 0 {
            continue;
        }
        let pattern = bus.read(entry.wrapping_add(2));
        let data = patterns.wrapping_add(u16::from(pattern).wrapping_mul(SPRITE_BYTES));
        for py in 0..SPRITE_SIZE {
            for px in 0..SPRITE_SIZE {
                let byte = bus.read(data.wrapping_add((py * 2 + px / 8) as u16));
                if byte & (0x80 >> (px % 8)) == 0 {
                    continue;
                }
                frame.set(u32::from(x) + px, u32::from(y) + py, color(SPRITE_SHADE));
            }
        }
    }
}
