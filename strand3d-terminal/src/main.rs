/// strand3d Terminal Demo - Growing Spiral
///
/// Tessellates a helix that grows one point at a time while its thickness
/// pulses, and renders it with the ASCII rasterizer.
/// Usage: strand3d-terminal [config.toml]
/// Controls:
///   - WASD / Arrow Keys: Rotate the model
///   - J: Toggle round/bevel joins
///   - Q/ESC: Quit

use std::env;
use strand3d_terminal::{PolylineViewer, ViewerConfig, ViewerError};

fn main() -> Result<(), ViewerError> {
    env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => {
            println!("Loading viewer config: {}", path);
            ViewerConfig::load(&path)?
        }
        None => ViewerConfig::default(),
    };

    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut viewer = PolylineViewer::new(config)?;
    viewer.run()?;

    println!("Thank you for using the strand3d terminal viewer!");
    Ok(())
}
