use kurbo::Shape as _;

use crate::foundation::core::{Affine, BezPath, Point, Rgba8};

/// Renderable unit: path geometry plus paint-like style.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MobjectSnapshot {
    /// Possibly multi-contour outline.
    #[serde(with = "svg_path")]
    pub path: BezPath,
    /// Paint attributes.
    #[serde(default)]
    pub style: MobjectStyle,
}

/// Paint attributes of a mobject.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MobjectStyle {
    /// Fill and stroke color.
    pub color: Rgba8,
    /// Opacity multiplier applied on top of `color.a`.
    pub opacity: f64,
    /// Stroke width.
    pub stroke_width: f64,
    /// Fill the interior.
    pub filled: bool,
    /// Stroke the outline.
    pub stroked: bool,
    /// Opaque shader handle resolved by the rendering collaborator.
    pub shader: Option<String>,
    /// Opaque filter handle resolved by the rendering collaborator.
    pub filter: Option<String>,
}

impl Default for MobjectStyle {
    fn default() -> Self {
        Self {
            color: Rgba8::WHITE,
            opacity: 1.0,
            stroke_width: 2.0,
            filled: false,
            stroked: true,
            shader: None,
            filter: None,
        }
    }
}

impl MobjectSnapshot {
    /// Snapshot with default style.
    pub fn new(path: BezPath) -> Self {
        Self {
            path,
            style: MobjectStyle::default(),
        }
    }

    /// Replace the style.
    pub fn with_style(mut self, style: MobjectStyle) -> Self {
        self.style = style;
        self
    }

    /// Center of the bounding box; the origin for empty paths.
    pub fn center(&self) -> Point {
        if self.path.elements().is_empty() {
            return Point::ZERO;
        }
        self.path.bounding_box().center()
    }

    /// Copy with `affine` applied to the geometry.
    pub fn transformed(&self, affine: Affine) -> Self {
        Self {
            path: affine * self.path.clone(),
            style: self.style.clone(),
        }
    }
}

mod svg_path {
    use kurbo::BezPath;
    use serde::{Deserialize as _, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(path: &BezPath, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&path.to_svg())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BezPath, D::Error> {
        let text = String::deserialize(d)?;
        BezPath::from_svg(&text).map_err(serde::de::Error::custom)
    }
}
