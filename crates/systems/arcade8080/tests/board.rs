use emu_arcade8080::{buttons, presets, ArcadeSystem, HardwareAdapter, HardwareConfig, InputState};
use emu_core::cpu_8080::{Memory8080, FLAG_C, FLAG_Z};
use emu_core::System;

fn preset_with_rom(key: &str, rom_name: &str, program: &[u8]) -> ArcadeSystem {
    let mut system = ArcadeSystem::from_preset(key).expect("preset");
    let report = system.load_roms(vec![(rom_name, program.to_vec())]);
    assert_eq!(report.loaded.len(), 1, "{} did not match {}", rom_name, key);
    system
}

#[test]
fn test_add_program_end_to_end() {
    let config = HardwareConfig::from_json(
        r#"{
            "name": "End To End",
            "memoryMap": { "rom": [{ "start": 0, "end": 255, "size": 256, "fileMatch": "prog" }] },
            "ports": { "out": { "0": "sound_1" } }
        }"#,
    )
    .expect("config");
    let mut system = ArcadeSystem::new(HardwareAdapter::new(config));
    // MVI A,5; MVI B,3; ADD B; OUT 0; HLT
    system.load_roms(vec![(
        "prog",
        vec![0x3Eu8, 0x05, 0x06, 0x03, 0x80, 0xD3, 0x00, 0x76],
    )]);

    let cpu = system.cpu_mut();
    let cycles: Vec<u32> = (0..4).map(|_| cpu.step()).collect();
    assert_eq!(cycles, vec![7, 7, 4, 10]);
    assert_eq!(cpu.memory.devices.sound[0], 0x08);
    assert_eq!(cpu.a, 0x08);
    assert!(!cpu.get_flag(FLAG_C));
    assert!(!cpu.get_flag(FLAG_Z));
    assert!(!cpu.halted);

    cpu.step();
    assert!(cpu.halted);

    let frame = system.step_frame().expect("frame");
    assert_eq!((frame.width, frame.height), (256, 224));
    assert!(system.cpu().halted);
}

#[test]
fn test_invaders_shift_register_to_screen() {
    let program = [
        0x3E, 0x03, // MVI A,3
        0xD3, 0x02, // OUT 2 (shift offset)
        0x3E, 0xAA, // MVI A,AAh
        0xD3, 0x04, // OUT 4 (shift data)
        0x3E, 0x55, // MVI A,55h
        0xD3, 0x04, // OUT 4
        0xDB, 0x03, // IN 3 (shift result)
        0x32, 0x00, 0x24, // STA 2400h
        0x76, // HLT
    ];
    let mut system = preset_with_rom("invaders", "invaders.h", &program);
    let frame = system.step_frame().expect("frame");

    assert_eq!(system.cpu().memory.read(0x2400), 0xAD);
    assert_eq!((frame.width, frame.height), (224, 256));
    // 0xAD = 1010_1101, first stored row runs up the left edge of the screen
    let column: Vec<u32> = (0..8).map(|i| frame.get(0, 255 - i).unwrap_or(0)).collect();
    assert_eq!(column, vec![255, 0, 255, 0, 255, 255, 0, 255]);
    assert_eq!(system.display_info().rotation, 90);
}

#[test]
fn test_invaders_interrupts_alternate() {
    let mut program = vec![
        0x31, 0x00, 0x24, // LXI SP,2400h
        0xFB, // EI
        0xC3, 0x04, 0x00, // JMP 0004
    ];
    program.resize(0x08, 0);
    program.extend_from_slice(&[0x04, 0xFB, 0xC9]); // RST 1: INR B; EI; RET
    program.resize(0x10, 0);
    program.extend_from_slice(&[0x0C, 0xFB, 0xC9]); // RST 2: INR C; EI; RET

    let mut system = preset_with_rom("invaders", "invaders.h", &program);
    for _ in 0..4 {
        system.step_frame().expect("frame");
    }

    // raised after frames 0..=3: 1, 2, 1, 2; the last is still pending
    assert_eq!(system.cpu().b, 2);
    assert_eq!(system.cpu().c, 1);
    assert_eq!(system.cpu().pending_interrupt(), Some(2));
    assert_eq!(system.frame_index(), 4);
}

#[test]
fn test_unknown_handler_is_a_stub() {
    let program = [
        0x3E, 0x7F, // MVI A,7Fh
        0xD3, 0x02, // OUT 2 (torpedo_sound, no device)
        0xDB, 0x05, // IN 5 (unbound)
        0x76, // HLT
    ];
    let mut system = preset_with_rom("seawolf", "seawolf.bin", &program);
    system.step_frame().expect("frame");
    assert_eq!(system.cpu().a, 0);
    assert!(system.cpu().memory.devices.sound.iter().all(|&s| s == 0));
}

#[test]
fn test_player_input_snapshot() {
    let program = [
        0xDB, 0x00, // IN 0 (player_1)
        0x47, // MOV B,A
        0xDB, 0x02, // IN 2 (coin)
        0x4F, // MOV C,A
        0x76, // HLT
    ];
    let mut system = preset_with_rom("gunfight", "gunfight.1", &program);
    system.set_input(
        InputState::new()
            .with(buttons::P1_LEFT)
            .with(buttons::P1_FIRE)
            .with(buttons::COIN1),
    );
    system.step_frame().expect("frame");
    assert_eq!(system.cpu().b, 0x14);
    assert_eq!(system.cpu().c, 0x01);
}

#[test]
fn test_lupin_color_bank() {
    let program = [
        0x3E, 0x02, // MVI A,2
        0xD3, 0x03, // OUT 3 (color bank)
        0x3E, 0xE4, // MVI A,E4h
        0x32, 0x00, 0x88, // STA 8800h
        0x76, // HLT
    ];
    let mut system = preset_with_rom("lupin3", "lupin.bin", &program);
    let frame = system.step_frame().expect("frame");
    assert!(system.display_info().color);
    // 0xE4 packs indices 3, 2, 1, 0
    assert_eq!(frame.get(0, 0), Some(0b1011));
    assert_eq!(frame.get(3, 0), Some(0b1000));
}

#[test]
fn test_rom_set_report() {
    let mut system = ArcadeSystem::from_preset("invaders").expect("preset");
    let names = ["invaders.h", "invaders.g", "INVADERS.F", "invaders.e", "readme.txt"];
    let files: Vec<(String, Vec<u8>)> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), vec![i as u8 + 1; 0x900]))
        .collect();

    let report = system.load_roms(files);
    assert_eq!(report.loaded.len(), 4);
    assert!(report.loaded.iter().all(|r| r.bytes_ignored == 0x100));
    assert_eq!(report.skipped, vec!["readme.txt".to_string()]);

    let cpu = system.cpu();
    assert_eq!(cpu.memory.read(0x0000), 1);
    assert_eq!(cpu.memory.read(0x0800), 2);
    assert_eq!(cpu.memory.read(0x1000), 3);
    assert_eq!(cpu.memory.read(0x1FFF), 4);
    assert_eq!(cpu.memory.read(0x2000), 0);
    assert!(system.mount_points().iter().all(|m| system.is_mounted(&m.id)));
}

#[test]
fn test_every_preset_runs_a_frame() {
    for preset in presets::PRESETS {
        let mut system = ArcadeSystem::new(preset.adapter().expect("adapter"));
        let frame = system.step_frame().expect("frame");
        let config = preset.config().expect("config");
        assert_eq!((frame.width, frame.height), (config.video.width, config.video.height));
        assert!(system.last_frame_cycles() >= system.cycles_per_frame());
    }
}
