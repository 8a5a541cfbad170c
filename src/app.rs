use std::path::{Path, PathBuf};
use std::time;

use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageError, RgbaImage};
use nalgebra as na;
use na::{vector, Matrix4, Rotation3, Vector3};
use show_image::{create_window, event, ImageInfo, ImageView, WindowOptions};

use crate::config::Settings;
use crate::error::{RenderError, Result};
use crate::scene::{Camera, ColorBuffer, DirectionalLight, FrameDriver, Material, Mesh, Pose, Scene, Texture};

/// Radians per second the model turns around the y axis in the window.
const SPIN_SPEED: f32 = 0.5;

pub struct Params {
    pub settings: Settings,
    pub print_fps: bool,
    /// OBJ model, the built-in demo scene is used when absent.
    pub model_path: Option<PathBuf>,
    pub texture_path: Option<PathBuf>,
    pub normal_map_path: Option<PathBuf>,
}

/// What a key press asks the window loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Exit,
    ToggleRenderMode,
    ToggleTexture,
    ToggleLighting,
}

/// Maps key releases to commands: Escape exits, Space switches wireframe/shaded, L toggles the
/// texture and A toggles lighting.
fn key_command(window_event: event::WindowEvent) -> Option<Command> {
    if let event::WindowEvent::KeyboardInput(event) = window_event {
        if !event.input.state.is_released() {
            return None;
        }
        return match event.input.key_code {
            Some(event::VirtualKeyCode::Escape) => Some(Command::Exit),
            Some(event::VirtualKeyCode::Space) => Some(Command::ToggleRenderMode),
            Some(event::VirtualKeyCode::L) => Some(Command::ToggleTexture),
            Some(event::VirtualKeyCode::A) => Some(Command::ToggleLighting),
            _ => None,
        };
    }

    return None;
}

/// Loads the mesh and textures and places camera and light around the origin.
pub fn build_scene(params: &Params) -> Result<Scene> {
    let settings = &params.settings;
    let mesh = match &params.model_path {
        Some(path) => Mesh::load_obj(path, settings.vertex_color_seed)?,
        None => {
            log::info!("No model given, using the demo scene");
            Mesh::demo(settings.vertex_color_seed)
        }
    };

    let mut material = Material::new();
    if let Some(path) = &params.texture_path {
        material = material.with_base_color(Texture::open(path)?);
    }
    if let Some(path) = &params.normal_map_path {
        material = material.with_normal_map(Texture::open(path)?);
    }

    let camera = Camera {
        pose: Pose::look_at(vector![0.0, 2.5, -5.0], vector![0.0, 0.5, 0.0], Vector3::y()),
        fov_y: 60.0,
        aspect: settings.width as f32 / settings.height as f32,
        near: 0.1,
        far: 100.0,
    };
    let light = DirectionalLight::new(Pose::look_at(
        vector![3.0, 6.0, -2.0],
        Vector3::zeros(),
        Vector3::y(),
    ));

    return Ok(Scene { mesh, model: Matrix4::identity(), camera, light, material });
}

/// Writes the color buffer to an image file, format picked from the extension.
pub fn save_frame<P: AsRef<Path>>(buffer: &ColorBuffer, path: P) -> Result<()> {
    let image = RgbaImage::from_raw(buffer.width, buffer.height, buffer.to_rgba8()).ok_or_else(|| {
        RenderError::FrameSave(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        )))
    })?;
    image.save(path.as_ref()).map_err(RenderError::FrameSave)?;
    log::info!("Saved frame to {}", path.as_ref().display());
    return Ok(());
}

/// Renders a single frame without opening a window and saves it to `output_path`.
pub fn render_once<P: AsRef<Path>>(params: &Params, output_path: P) -> Result<()> {
    let scene = build_scene(params)?;
    let mut driver = FrameDriver::new(params.settings.clone());
    let stats = driver.render_frame(&scene)?;
    log::info!("{:?}", stats);
    return save_frame(driver.color_buffer(), output_path);
}

/// Actually launches the window, showing frames until Escape is released.
pub fn run(params: Params) -> Result<()> {
    let mut scene = build_scene(&params)?;
    let mut driver = FrameDriver::new(params.settings.clone());
    let (width, height) = (params.settings.width, params.settings.height);

    let window_options: WindowOptions = WindowOptions {
        size: Some([width, height]),
        ..Default::default()
    };
    let window = create_window("output", window_options).map_err(|e| RenderError::Window(e.to_string()))?;
    let event_channel = window.event_channel().map_err(|e| RenderError::Window(e.to_string()))?;

    let time_begin = time::Instant::now();
    let mut last_tick = time::Instant::now();
    let mut frame_counter_time_begin = time::Instant::now();
    let mut frame_counter: u32 = 0;
    loop {
        let now = time::Instant::now();
        let dt = now.duration_since(last_tick).as_secs_f32();
        last_tick = now;

        let passed_time = now.duration_since(time_begin).as_secs_f32();
        scene.model = Rotation3::from_axis_angle(&Vector3::y_axis(), passed_time * SPIN_SPEED).to_homogeneous();

        // Aborted frames are already logged by the driver, the window keeps the cleared buffer.
        let rendered = match driver.tick(dt, &scene) {
            Ok(stats) => stats.is_some(),
            Err(_) => true,
        };
        if rendered {
            let data = driver.color_buffer().to_rgba8();
            let image_view = ImageView::new(ImageInfo::rgba8(width, height), &data);
            window
                .set_image("image", image_view)
                .map_err(|e| RenderError::Window(e.to_string()))?;
            frame_counter += 1;
        }

        // Draining everything that has piled up in the event channel.
        for command in event_channel.try_iter().filter_map(key_command) {
            match command {
                Command::Exit => return Ok(()),
                Command::ToggleRenderMode => driver.toggle_render_mode(),
                Command::ToggleTexture => driver.toggle_texture(),
                Command::ToggleLighting => driver.toggle_lighting(),
            }
        }

        if params.print_fps {
            // Counting frames to print out stats every second.
            if time::Instant::now()
                .duration_since(frame_counter_time_begin)
                .as_secs_f32()
                > 1.0
            {
                log::info!("FPS --- {}", frame_counter);
                frame_counter_time_begin = time::Instant::now();
                frame_counter = 0;
            }
        }
    }
}
