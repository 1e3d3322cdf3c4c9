use emu_arcade8080::ArcadeSystem;
use emu_core::System;
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    let game = args.get(1).map(|s| s.as_str()).unwrap_or("invaders");

    match ArcadeSystem::from_preset(game) {
        Ok(mut sys) => {
            let frame = sys.step_frame().unwrap();
            println!("Headless {} frame: {}x{}", game, frame.width, frame.height);
            println!("Save-state: {}", serde_json::to_string_pretty(&sys.save_state()).unwrap());
        }
        Err(e) => eprintln!("{}", e),
    }
}
