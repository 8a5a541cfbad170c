//! Wireframe mode: triangle edges as Bresenham lines, no depth test.

use super::buffer::ColorBuffer;
use super::driver::FrameStats;
use super::geometry::TransformedVertex;
use super::model::Mesh;
use super::util::{color_lerp, Color};

/// Integer points on the line from (x0, y0) to (x1, y1), both endpoints included.
pub fn bresenham(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let (mut x0, mut y0, mut x1, mut y1) = (x0, y0, x1, y1);
    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let dy = (y1 - y0).abs();
    let mut error = dx / 2;
    let y_step = if y0 < y1 { 1 } else { -1 };
    let mut y = y0;

    let mut points = Vec::with_capacity(dx as usize + 1);
    for x in x0..=x1 {
        if steep {
            points.push((y, x));
        } else {
            points.push((x, y));
        }
        error -= dy;
        if error < 0 {
            y += y_step;
            error += dx;
        }
    }
    return points;
}

/// Liang-Barsky clip of the segment `from -> to` against the box [min, max].
/// Runs in f64 so endpoints far outside the box (vertices right at the camera plane) keep
/// enough precision. Returns None if nothing of the segment is inside or an endpoint is not
/// finite.
pub fn clip_segment(
    from: (f32, f32),
    to: (f32, f32),
    min: (f32, f32),
    max: (f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|c| c.is_finite()) {
        return None;
    }
    let (x0, y0) = (from.0 as f64, from.1 as f64);
    let (dx, dy) = (to.0 as f64 - x0, to.1 as f64 - y0);
    let (min_x, min_y) = (min.0 as f64, min.1 as f64);
    let (max_x, max_y) = (max.0 as f64, max.1 as f64);

    let mut t0 = 0.0;
    let mut t1 = 1.0;
    for (p, q) in [(-dx, x0 - min_x), (dx, max_x - x0), (-dy, y0 - min_y), (dy, max_y - y0)] {
        if p == 0.0 {
            // Parallel to this boundary, fully outside or no constraint.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = f64::max(t0, r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = f64::min(t1, r);
        }
    }

    let point = |t: f64| {
        (
            (x0 + t * dx).clamp(min_x, max_x) as f32,
            (y0 + t * dy).clamp(min_y, max_y) as f32,
        )
    };
    return Some((point(t0), point(t1)));
}

/// Draws a line between two screen positions. The segment is clipped to the buffer first, so
/// only pixels inside the buffer are ever visited. Returns the number of pixels written.
pub fn draw_line(buffer: &mut ColorBuffer, from: (f32, f32), to: (f32, f32), color: Color) -> u64 {
    if buffer.width == 0 || buffer.height == 0 {
        return 0;
    }
    let max = ((buffer.width - 1) as f32, (buffer.height - 1) as f32);
    let (from, to) = match clip_segment(from, to, (0.0, 0.0), max) {
        Some(segment) => segment,
        None => return 0,
    };

    let mut written = 0;
    for (x, y) in bresenham(from.0.round() as i32, from.1.round() as i32, to.0.round() as i32, to.1.round() as i32) {
        buffer.set(x as u32, y as u32, color);
        written += 1;
    }
    return written;
}

/// Draws the three edges of every triangle, colored with the average of the endpoint vertex
/// colors. Edges touching a vertex behind the camera are skipped.
pub fn draw_wireframe(mesh: &Mesh, vertices: &[TransformedVertex], buffer: &mut ColorBuffer, stats: &mut FrameStats) {
    debug_assert_eq!(vertices.len(), mesh.vertices().len());
    for triangle in mesh.triangles() {
        for (a, b) in [(triangle[0], triangle[1]), (triangle[1], triangle[2]), (triangle[2], triangle[0])] {
            let (va, vb) = (vertices[a], vertices[b]);
            if !(va.in_front() && vb.in_front()) {
                stats.culled_edges += 1;
                continue;
            }
            let color = color_lerp(mesh.vertices()[a].color, mesh.vertices()[b].color, 0.5);
            stats.line_pixels += draw_line(buffer, (va.screen.x, va.screen.y), (vb.screen.x, vb.screen.y), color);
            stats.edges_drawn += 1;
        }
    }
}
