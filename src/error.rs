use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a frame or the setup around it.
///
/// Render passes validate their inputs before touching any buffer, so when one of these is
/// returned from a pass the color and depth buffers are still in their cleared state.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A texture needed by the enabled shading branch was not supplied.
    #[error("missing resource: {resource} is required by the current shading mode")]
    MissingResource { resource: &'static str },

    /// The light-space bounding box collapsed on an axis, so no orthographic projection exists.
    #[error("degenerate projection: {axis} extent is empty (min {min}, max {max})")]
    DegenerateProjection { axis: char, min: f32, max: f32 },

    /// A camera or light pose whose forward and up vectors don't span a basis.
    #[error("degenerate view: {what} pose has no invertible view matrix")]
    DegenerateView { what: &'static str },

    /// A settings value the renderer cannot work with, e.g. a zero-sized buffer.
    #[error("invalid settings: {field} {reason}")]
    InvalidSettings { field: &'static str, reason: &'static str },

    /// An image with no texels, which has nothing to sample.
    #[error("empty texture: {width}x{height}")]
    EmptyTexture { width: u32, height: u32 },

    /// Triangle index pointing past the end of the vertex list.
    #[error("invalid mesh: index {index} out of range for {vertex_count} vertices")]
    InvalidMesh { index: usize, vertex_count: usize },

    #[error("failed to load mesh {path:?}: {source}")]
    MeshLoad {
        path: PathBuf,
        #[source]
        source: obj::ObjError,
    },

    #[error("failed to load texture {path:?}: {source}")]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to save frame: {0}")]
    FrameSave(#[source] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Config(#[from] ron::error::SpannedError),

    #[error("window error: {0}")]
    Window(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
