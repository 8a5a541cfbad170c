use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use nalgebra as na;
use na::{vector, Vector2, Vector3};
use obj::{load_obj, Obj, TexturedVertex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::texture::Texture;
use super::util::{rgba, Color};
use crate::error::{RenderError, Result};

/// Mesh vertex in model space. `color` is a per-vertex debug color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
    pub color: Color,
}

impl Vertex {
    pub fn new(position: Vector3<f32>, normal: Vector3<f32>, uv: Vector2<f32>) -> Self {
        return Self { position, normal, uv, color: rgba(1.0, 1.0, 1.0, 1.0) };
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        return self;
    }
}

/// Triangle mesh, immutable once loaded. Front faces have positive signed area in screen space
/// (see `edge_function`), which is clockwise when looking at the face from the outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    triangles: Vec<[usize; 3]>,
}

impl Mesh {
    /// Builds a mesh from vertices and a flat index list grouped in threes.
    /// A trailing incomplete triangle is dropped.
    pub fn new(vertices: Vec<Vertex>, indices: &[usize]) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&index| index >= vertices.len()) {
            return Err(RenderError::InvalidMesh { index, vertex_count: vertices.len() });
        }
        let triangles = indices
            .chunks_exact(3)
            .map(|chunk| [chunk[0], chunk[1], chunk[2]])
            .collect();
        return Ok(Self { vertices, triangles });
    }

    pub fn vertices(&self) -> &[Vertex] {
        return &self.vertices[..];
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        return &self.triangles[..];
    }

    /// Replaces every vertex color with a random opaque color. Same seed, same colors.
    pub fn with_debug_colors(mut self, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        for vertex in &mut self.vertices {
            vertex.color = rgba(rng.gen(), rng.gen(), rng.gen(), 1.0);
        }
        return self;
    }

    /// Converts a parsed OBJ model. Texture coordinates keep the OBJ convention of v growing up.
    pub fn from_obj(model: Obj<TexturedVertex, u32>) -> Result<Self> {
        let vertices = model
            .vertices
            .iter()
            .map(|v| {
                Vertex::new(
                    vector![v.position[0], v.position[1], v.position[2]],
                    vector![v.normal[0], v.normal[1], v.normal[2]],
                    vector![v.texture[0], v.texture[1]],
                )
            })
            .collect();
        let indices: Vec<usize> = model.indices.iter().map(|&index| index as usize).collect();
        return Self::new(vertices, &indices);
    }

    /// Loads an OBJ file and assigns seeded debug colors.
    pub fn load_obj<P: AsRef<Path>>(path: P, color_seed: u64) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let model: Obj<TexturedVertex, u32> = load_obj(reader).map_err(|source| {
            RenderError::MeshLoad { path: path.to_path_buf(), source }
        })?;
        let mesh = Self::from_obj(model)?.with_debug_colors(color_seed);
        log::info!("Number of vertices - {}", mesh.vertices.len());
        log::info!("Number of indices  - {}", 3 * mesh.triangles.len());
        return Ok(mesh);
    }

    /// Quad spanning `center +- u +- v`, facing along `v x u`.
    pub fn quad(center: Vector3<f32>, u: Vector3<f32>, v: Vector3<f32>) -> Self {
        let normal = v.cross(&u).normalize();
        let vertices = vec![
            Vertex::new(center - u - v, normal, vector![0.0, 0.0]),
            Vertex::new(center - u + v, normal, vector![0.0, 1.0]),
            Vertex::new(center + u + v, normal, vector![1.0, 1.0]),
            Vertex::new(center + u - v, normal, vector![1.0, 0.0]),
        ];
        return Self { vertices, triangles: vec![[0, 1, 2], [0, 2, 3]] };
    }

    /// Appends another mesh, shifting its indices.
    pub fn merge(mut self, other: Mesh) -> Self {
        let offset = self.vertices.len();
        self.vertices.extend(other.vertices);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );
        return self;
    }

    /// Axis aligned cube with the given half size, 4 vertices per face so normals and uvs are
    /// per face.
    pub fn cube(center: Vector3<f32>, half_size: f32) -> Self {
        let x = Vector3::x() * half_size;
        let y = Vector3::y() * half_size;
        let z = Vector3::z() * half_size;
        // (u, v) pairs chosen so that v x u points out of the cube.
        let faces = [(z, y), (y, z), (x, z), (z, x), (y, x), (x, y)];
        let normals = [x, -x, y, -y, z, -z];
        let mut cube = Mesh { vertices: Vec::new(), triangles: Vec::new() };
        for ((u, v), n) in faces.iter().zip(normals.iter()) {
            cube = cube.merge(Self::quad(center + n, *u, *v));
        }
        return cube;
    }

    /// Cube resting on a floor plane, used when no model is given.
    pub fn demo(color_seed: u64) -> Self {
        let floor = Self::quad(
            vector![0.0, 0.0, 0.0],
            Vector3::x() * 4.0,
            Vector3::z() * 4.0,
        );
        return Self::cube(vector![0.0, 0.75, 0.0], 0.75)
            .merge(floor)
            .with_debug_colors(color_seed);
    }
}

/// Surface description, resolved once when the scene is set up.
#[derive(Debug, Clone)]
pub struct Material {
    pub base_color: Option<Texture>,
    pub normal_map: Option<Texture>,
    /// Blends the specular tint from plain dielectric white towards the base color.
    pub metallic: Option<f32>,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        return Self::new();
    }
}

impl Material {
    pub fn new() -> Self {
        return Self { base_color: None, normal_map: None, metallic: None, shininess: 1.0 };
    }

    pub fn with_base_color(mut self, texture: Texture) -> Self {
        self.base_color = Some(texture);
        return self;
    }

    pub fn with_normal_map(mut self, texture: Texture) -> Self {
        self.normal_map = Some(texture);
        return self;
    }

    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = Some(metallic);
        return self;
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        return self;
    }
}
