//! Plain component value types.
//!
//! Field names double as the document wire contract, so serde renames here are load-bearing.

use std::path::PathBuf;

use crate::foundation::core::{Affine, Rgba8, Vec2};

/// Human-readable entity name.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NameComponent(pub String);

/// Position, rotation (radians), and non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformComponent {
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Rotation in radians.
    pub rotation: f64,
    /// Horizontal scale.
    pub sx: f64,
    /// Vertical scale.
    pub sy: f64,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            sx: 1.0,
            sy: 1.0,
        }
    }
}

impl TransformComponent {
    /// Transform placed at `(x, y)` with no rotation or scale.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Canonical order: `T(translate) * R(rotation) * S(scale)`.
    pub fn to_affine(self) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y))
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.sx, self.sy)
    }
}

/// Paint attributes for an entity's shape.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialComponent {
    /// Fill and stroke color.
    pub color: Rgba8,
    /// Fill the shape interior.
    pub is_filled: bool,
    /// Stroke the shape outline.
    pub is_stroked: bool,
    /// Stroke width in scene units.
    pub stroke_width: f64,
    /// Request anti-aliased rasterization.
    pub anti_aliased: bool,
}

impl Default for MaterialComponent {
    fn default() -> Self {
        Self {
            color: Rgba8::WHITE,
            is_filled: true,
            is_stroked: false,
            stroke_width: 1.0,
            anti_aliased: true,
        }
    }
}

/// Visibility window; outside `[entry_time, exit_time]` the entity is not drawn.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationComponent {
    /// First visible time.
    pub entry_time: f64,
    /// Last visible time.
    pub exit_time: f64,
}

impl AnimationComponent {
    /// Whether `time` falls inside the window (inclusive on both ends).
    pub fn is_visible_at(&self, time: f64) -> bool {
        self.entry_time <= time && time <= self.exit_time
    }
}

/// Interpreted script binding: a source path plus named entry points.
///
/// Interpreted scripts have no draw hook; custom drawing belongs to native behaviors.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptComponent {
    /// Script source, absolute or relative to the configured script root.
    pub script_path: PathBuf,
    /// Called once after the environment is instantiated.
    #[serde(default = "default_start_function")]
    pub start_function: String,
    /// Called every tick.
    #[serde(default = "default_update_function")]
    pub update_function: String,
    /// Called when the binding is removed.
    #[serde(default = "default_destroy_function")]
    pub destroy_function: String,
}

impl ScriptComponent {
    /// Binding with the conventional `on_start` / `on_update` / `on_destroy` entry points.
    pub fn new(script_path: impl Into<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            start_function: default_start_function(),
            update_function: default_update_function(),
            destroy_function: default_destroy_function(),
        }
    }
}

fn default_start_function() -> String {
    "on_start".to_string()
}

fn default_update_function() -> String {
    "on_update".to_string()
}

fn default_destroy_function() -> String {
    "on_destroy".to_string()
}

/// Native plugin binding: the plugin's source file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NativeScriptComponent {
    /// Plugin source file.
    pub source_path: PathBuf,
}

impl NativeScriptComponent {
    /// Binding for the plugin at `source_path`.
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
        }
    }
}

/// Tag: drawn in the background bucket, before every other entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneBackground;
