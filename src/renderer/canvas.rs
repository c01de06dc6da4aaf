//! Immediate-mode 2D drawing in world coordinates
//!
//! A small subset of a canvas-style context: a save/restore transform
//! stack, filled and stroked paths, rectangles and text. Paths are built in
//! local coordinates and tessellated into world-space triangles as soon as
//! they are filled or stroked. Text is collected for the host to lay out.

use glam::{Affine2, Vec2};

use super::shapes;
use super::vertex::Vertex;

/// How a path is filled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid([f32; 4]),
    /// Linear blend along local Y, clamped outside `from_y..to_y`
    VerticalGradient {
        from_y: f32,
        to_y: f32,
        from: [f32; 4],
        to: [f32; 4],
    },
}

impl Fill {
    fn color_at(&self, local_y: f32) -> [f32; 4] {
        match *self {
            Fill::Solid(color) => color,
            Fill::VerticalGradient {
                from_y,
                to_y,
                from,
                to,
            } => {
                let span = to_y - from_y;
                let t = if span.abs() < f32::EPSILON {
                    0.0
                } else {
                    ((local_y - from_y) / span).clamp(0.0, 1.0)
                };
                std::array::from_fn(|i| from[i] + (to[i] - from[i]) * t)
            }
        }
    }
}

/// A piece of text positioned in world coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Centre of the text
    pub pos: Vec2,
    pub text: String,
    pub size: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Affine2,
    alpha: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            alpha: 1.0,
        }
    }
}

/// Collects one frame of geometry
#[derive(Debug, Default)]
pub struct DrawContext {
    state: DrawState,
    stack: Vec<DrawState>,
    vertices: Vec<Vertex>,
    text: Vec<TextRun>,
}

impl DrawContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame
    pub fn clear(&mut self) {
        self.state = DrawState::default();
        self.stack.clear();
        self.vertices.clear();
        self.text.clear();
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    pub fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => log::warn!("DrawContext::restore without matching save"),
        }
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform * Affine2::from_translation(Vec2::new(x, y));
    }

    pub fn rotate(&mut self, angle: f32) {
        self.state.transform = self.state.transform * Affine2::from_angle(angle);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform * Affine2::from_scale(Vec2::new(x, y));
    }

    /// Opacity applied to everything drawn until the next restore
    pub fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Local point to world coordinates
    pub fn to_world(&self, p: Vec2) -> Vec2 {
        self.state.transform.transform_point2(p)
    }

    pub fn round_rect_path(&self, x: f32, y: f32, w: f32, h: f32, radius: f32) -> Vec<Vec2> {
        shapes::rounded_rect_outline(x, y, w, h, radius, 4)
    }

    pub fn circle_path(&self, cx: f32, cy: f32, radius: f32, segments: u32) -> Vec<Vec2> {
        shapes::circle_outline(Vec2::new(cx, cy), radius, segments)
    }

    /// Fill a convex path given in local coordinates
    pub fn fill_path(&mut self, path: &[Vec2], fill: Fill) {
        let colors: Vec<[f32; 4]> = path.iter().map(|p| fill.color_at(p.y)).collect();
        let local = shapes::convex_fan(path, &colors);
        self.push_local(local);
    }

    pub fn stroke_path(&mut self, path: &[Vec2], width: f32, color: [f32; 4], closed: bool) {
        let local = shapes::polyline(path, width, color, closed);
        self.push_local(local);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
        let rect = shapes::rounded_rect_outline(x, y, w, h, 0.0, 1);
        self.fill_path(&rect, Fill::Solid(color));
    }

    /// Queue text centred on a local point
    pub fn text(&mut self, x: f32, y: f32, text: &str, size: f32, color: [f32; 4]) {
        let pos = self.to_world(Vec2::new(x, y));
        let mut color = color;
        color[3] *= self.state.alpha;
        self.text.push(TextRun {
            pos,
            text: text.to_string(),
            size,
            color,
        });
    }

    fn push_local(&mut self, local: Vec<Vertex>) {
        let state = self.state;
        self.vertices.extend(local.into_iter().map(|v| {
            let p = state.transform.transform_point2(Vec2::from(v.position));
            let mut color = v.color;
            color[3] *= state.alpha;
            Vertex::new(p.x, p.y, color)
        }));
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn text_runs(&self) -> &[TextRun] {
        &self.text
    }
}
