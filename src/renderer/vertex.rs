//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Parse a CSS hex colour (`#rgb`, `#rrggbb` or `#rrggbbaa`)
pub fn parse_hex(s: &str) -> Option<[f32; 4]> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize, len: usize| -> Option<f32> {
        let digits = hex.get(i * len..(i + 1) * len)?;
        let v = u8::from_str_radix(digits, 16).ok()?;
        // Short form repeats the digit: f -> ff
        let v = if len == 1 { v * 17 } else { v };
        Some(v as f32 / 255.0)
    };
    match hex.len() {
        3 => Some([channel(0, 1)?, channel(1, 1)?, channel(2, 1)?, 1.0]),
        6 => Some([channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, 1.0]),
        8 => Some([channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, channel(3, 2)?]),
        _ => None,
    }
}

/// Colors for game elements
pub mod colors {
    pub const BACKGROUND: [f32; 4] = [0.55, 0.75, 0.95, 1.0];
    pub const BORDER: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const OUTLINE: [f32; 4] = [0.05, 0.05, 0.08, 1.0];
    pub const SPIKE: [f32; 4] = [0.35, 0.35, 0.4, 1.0];
    pub const GOAL_TOP: [f32; 4] = [1.0, 0.95, 0.4, 1.0];
    pub const GOAL_BOTTOM: [f32; 4] = [0.2, 0.8, 0.3, 1.0];
    pub const PLAYER_TOP: [f32; 4] = [1.0, 0.4, 0.75, 1.0];
    pub const PLAYER_BOTTOM: [f32; 4] = [0.3, 0.5, 1.0, 1.0];
    pub const HIGHLIGHT: [f32; 4] = [1.0, 0.85, 0.1, 1.0];
    pub const TEXT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
}
