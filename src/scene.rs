//! Software rasterization of a single mesh: transforms, shadow map, triangle fill and wireframe.

pub mod buffer;
pub mod camera;
pub mod driver;
pub mod geometry;
pub mod model;
pub mod raster;
pub mod shadow;
pub mod texture;
pub mod transform;
pub mod util;
pub mod wireframe;

pub use buffer::{ColorBuffer, DepthBuffer};
pub use camera::{Camera, DirectionalLight};
pub use driver::{FrameDriver, FrameStats, RenderMode, Scene};
pub use model::{Material, Mesh, Vertex};
pub use texture::Texture;
pub use transform::Pose;
pub use util::Color;
