use std::env;
use std::path::PathBuf;

use shadow_raster::app;
use shadow_raster::config::Settings;

#[show_image::main]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Default values.
    let mut model_path: Option<PathBuf> = None;
    let mut texture_path: Option<PathBuf> = None;
    let mut normal_map_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut print_fps = false;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).map(PathBuf::from);
        match args[i].as_str() {
            "-p" => { model_path = value; i += 1; }
            "-t" => { texture_path = value; i += 1; }
            "-n" => { normal_map_path = value; i += 1; }
            "-c" => { config_path = value; i += 1; }
            "-o" => { output_path = value; i += 1; }
            "-f" => { print_fps = true; }
            other => log::warn!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    let settings = match config_path {
        Some(path) => Settings::from_ron_file(path)?,
        None => Settings::default(),
    };

    let params = app::Params {
        settings,
        print_fps,
        model_path,
        texture_path,
        normal_map_path,
    };

    match output_path {
        Some(path) => app::render_once(&params, path)?,
        None => app::run(params)?,
    }

    return Ok(());
}
