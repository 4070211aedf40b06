//! Draw-callback contract handed to the rendering collaborator.
//!
//! Rasterization stays outside this crate: a [`Canvas`] receives transforms and
//! "draw this path with this paint" requests, nothing more.

use crate::animation::mobject::MobjectSnapshot;
use crate::ecs::components::MaterialComponent;
use crate::foundation::core::{Affine, BezPath, Rgba8};

/// Resolved paint for one path.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Paint {
    /// Straight-alpha color with opacity already folded into `a`.
    pub color: Rgba8,
    /// Fill the interior.
    pub fill: bool,
    /// Stroke width, when stroking.
    pub stroke: Option<f64>,
    /// Anti-aliasing hint.
    pub anti_aliased: bool,
    /// Opaque shader handle.
    pub shader: Option<String>,
    /// Opaque filter handle.
    pub filter: Option<String>,
}

impl Paint {
    pub fn from_material(m: &MaterialComponent) -> Self {
        Self {
            color: m.color,
            fill: m.is_filled,
            stroke: m.is_stroked.then_some(m.stroke_width),
            anti_aliased: m.anti_aliased,
            shader: None,
            filter: None,
        }
    }

    pub fn from_snapshot(s: &MobjectSnapshot) -> Self {
        Self {
            color: s.style.color.with_opacity(s.style.opacity),
            fill: s.style.filled,
            stroke: s.style.stroked.then_some(s.style.stroke_width),
            anti_aliased: true,
            shader: s.style.shader.clone(),
            filter: s.style.filter.clone(),
        }
    }
}

/// Opaque drawing surface supplied by the rendering collaborator.
pub trait Canvas {
    /// Push the current transform.
    fn save(&mut self);
    /// Pop back to the last saved transform. Unbalanced restores are ignored.
    fn restore(&mut self);
    /// Post-multiply the current transform.
    fn transform(&mut self, affine: Affine);
    /// Draw `path` under the current transform.
    fn draw_path(&mut self, path: &BezPath, paint: &Paint);
}

/// Draw evaluated snapshots in order.
pub fn draw_snapshots<'a>(
    canvas: &mut dyn Canvas,
    snapshots: impl IntoIterator<Item = &'a MobjectSnapshot>,
) {
    for snapshot in snapshots {
        canvas.draw_path(&snapshot.path, &Paint::from_snapshot(snapshot));
    }
}

/// One recorded draw request.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct DrawCall {
    /// Transform in effect when the path was drawn.
    pub transform: Affine,
    /// Path in local coordinates, as SVG path data.
    pub path: String,
    /// Paint used.
    pub paint: Paint,
}

/// Canvas that records draw calls instead of rasterizing.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    current: Affine,
    stack: Vec<Affine>,
    calls: Vec<DrawCall>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<DrawCall> {
        self.calls
    }

    /// Current save depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Canvas for RecordingCanvas {
    fn save(&mut self) {
        self.stack.push(self.current);
    }

    fn restore(&mut self) {
        if let Some(prev) = self.stack.pop() {
            self.current = prev;
        }
    }

    fn transform(&mut self, affine: Affine) {
        self.current *= affine;
    }

    fn draw_path(&mut self, path: &BezPath, paint: &Paint) {
        self.calls.push(DrawCall {
            transform: self.current,
            path: path.to_svg(),
            paint: paint.clone(),
        });
    }
}
