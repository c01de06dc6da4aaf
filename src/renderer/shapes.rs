//! Shape generation for 2D primitives
//!
//! Outlines are returned as point lists so the draw context can fill or
//! stroke them. Triangle output is in the coordinates it was given.

use glam::Vec2;
use std::f32::consts::{FRAC_PI_2, PI};

use super::vertex::Vertex;

/// Outline of a circle, counter-clockwise from +X
pub fn circle_outline(center: Vec2, radius: f32, segments: u32) -> Vec<Vec2> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let theta = (i as f32 / segments as f32) * 2.0 * PI;
            Vec2::new(
                center.x + radius * theta.cos(),
                center.y + radius * theta.sin(),
            )
        })
        .collect()
}

/// Outline of a rectangle with rounded corners, counter-clockwise from the
/// bottom-left corner. A zero radius gives the four plain corners.
pub fn rounded_rect_outline(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    radius: f32,
    segments_per_corner: u32,
) -> Vec<Vec2> {
    let r = radius.clamp(0.0, width.min(height) / 2.0);
    if r <= 0.0 {
        return vec![
            Vec2::new(x, y),
            Vec2::new(x + width, y),
            Vec2::new(x + width, y + height),
            Vec2::new(x, y + height),
        ];
    }

    let corners = [
        (Vec2::new(x + r, y + r), PI),
        (Vec2::new(x + width - r, y + r), PI + FRAC_PI_2),
        (Vec2::new(x + width - r, y + height - r), 0.0),
        (Vec2::new(x + r, y + height - r), FRAC_PI_2),
    ];
    let n = segments_per_corner.max(1);
    let mut points = Vec::with_capacity(((n + 1) * 4) as usize);
    for (center, start) in corners {
        for i in 0..=n {
            let theta = start + (i as f32 / n as f32) * FRAC_PI_2;
            points.push(center + r * Vec2::new(theta.cos(), theta.sin()));
        }
    }
    points
}

/// Triangle fan for a convex polygon, one colour per outline point. The
/// hub sits at the centroid with the averaged colour.
pub fn convex_fan(points: &[Vec2], colors: &[[f32; 4]]) -> Vec<Vertex> {
    if points.len() < 3 || colors.len() != points.len() {
        return Vec::new();
    }

    let n = points.len() as f32;
    let centroid = points.iter().copied().sum::<Vec2>() / n;
    let mut hub_color = [0.0f32; 4];
    for c in colors {
        for (acc, v) in hub_color.iter_mut().zip(c) {
            *acc += v / n;
        }
    }

    let mut vertices = Vec::with_capacity(points.len() * 3);
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        vertices.push(Vertex::new(centroid.x, centroid.y, hub_color));
        vertices.push(Vertex::new(points[i].x, points[i].y, colors[i]));
        vertices.push(Vertex::new(points[j].x, points[j].y, colors[j]));
    }
    vertices
}

/// Quad of the given width centred on the segment a-b
pub fn thick_segment(a: Vec2, b: Vec2, width: f32, color: [f32; 4]) -> [Vertex; 6] {
    // Direction from a to b
    let dir = (b - a).normalize_or_zero();
    // Perpendicular for width
    let perp = Vec2::new(-dir.y, dir.x) * (width / 2.0);

    let a1 = a + perp;
    let a2 = a - perp;
    let b1 = b + perp;
    let b2 = b - perp;

    [
        Vertex::new(a1.x, a1.y, color),
        Vertex::new(a2.x, a2.y, color),
        Vertex::new(b1.x, b1.y, color),
        Vertex::new(b1.x, b1.y, color),
        Vertex::new(a2.x, a2.y, color),
        Vertex::new(b2.x, b2.y, color),
    ]
}

/// Stroke along a point list
pub fn polyline(points: &[Vec2], width: f32, color: [f32; 4], closed: bool) -> Vec<Vertex> {
    if points.len() < 2 {
        return Vec::new();
    }
    let segments = if closed {
        points.len()
    } else {
        points.len() - 1
    };
    let mut vertices = Vec::with_capacity(segments * 6);
    for i in 0..segments {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        vertices.extend_from_slice(&thick_segment(a, b, width, color));
    }
    vertices
}
