use kurbo::Shape as _;

use crate::foundation::core::{BezPath, Point, Rect, Vec2};
use crate::foundation::error::{SceneError, SceneResult};

const PATH_TOLERANCE: f64 = 0.1;

/// Shape geometry drawn for an entity, centered on the entity origin.
///
/// On the wire this is `{ "kind": ..., "properties": { ... } }`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "properties")]
pub enum ShapeComponent {
    /// Axis-aligned rectangle.
    Rectangle {
        /// Width.
        width: f64,
        /// Height.
        height: f64,
    },
    /// Circle.
    Circle {
        /// Radius.
        radius: f64,
    },
    /// Axis-aligned ellipse.
    Ellipse {
        /// Horizontal radius.
        rx: f64,
        /// Vertical radius.
        ry: f64,
    },
    /// Horizontal segment.
    Line {
        /// Segment length.
        length: f64,
    },
    /// Equilateral triangle, pointing up.
    Triangle {
        /// Side length.
        size: f64,
    },
    /// Regular polygon.
    Polygon {
        /// Number of sides (`>= 3`).
        sides: u32,
        /// Circumradius.
        radius: f64,
    },
    /// Arbitrary path as SVG path data.
    Path {
        /// SVG `d` attribute.
        d: String,
    },
}

/// Shape kinds accepted by `Scene::create_shape`, each with default properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShapeKind {
    /// 100x100 square.
    Rectangle,
    /// Radius 50.
    Circle,
    /// 60x40 radii.
    Ellipse,
    /// Length 100.
    Line,
    /// Side 100.
    Triangle,
    /// Hexagon, radius 50.
    Polygon,
}

impl ShapeKind {
    /// Shape with this kind's default properties.
    pub fn default_shape(self) -> ShapeComponent {
        match self {
            Self::Rectangle => ShapeComponent::Rectangle {
                width: 100.0,
                height: 100.0,
            },
            Self::Circle => ShapeComponent::Circle { radius: 50.0 },
            Self::Ellipse => ShapeComponent::Ellipse { rx: 60.0, ry: 40.0 },
            Self::Line => ShapeComponent::Line { length: 100.0 },
            Self::Triangle => ShapeComponent::Triangle { size: 100.0 },
            Self::Polygon => ShapeComponent::Polygon {
                sides: 6,
                radius: 50.0,
            },
        }
    }
}

impl ShapeComponent {
    /// Reject non-finite or non-positive dimensions and unparsable path data.
    pub fn validate(&self) -> SceneResult<()> {
        fn positive(name: &str, v: f64) -> SceneResult<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(SceneError::validation(format!(
                    "shape {name} must be finite and > 0"
                )))
            }
        }

        match self {
            Self::Rectangle { width, height } => {
                positive("width", *width)?;
                positive("height", *height)
            }
            Self::Circle { radius } => positive("radius", *radius),
            Self::Ellipse { rx, ry } => {
                positive("rx", *rx)?;
                positive("ry", *ry)
            }
            Self::Line { length } => positive("length", *length),
            Self::Triangle { size } => positive("size", *size),
            Self::Polygon { sides, radius } => {
                if *sides < 3 {
                    return Err(SceneError::validation("polygon needs at least 3 sides"));
                }
                positive("radius", *radius)
            }
            Self::Path { d } => BezPath::from_svg(d)
                .map(|_| ())
                .map_err(|e| SceneError::validation(format!("invalid path data: {e}"))),
        }
    }

    /// Build the local-space outline.
    pub fn to_path(&self) -> BezPath {
        match self {
            Self::Rectangle { width, height } => {
                Rect::from_center_size(Point::ZERO, (*width, *height)).to_path(PATH_TOLERANCE)
            }
            Self::Circle { radius } => kurbo::Circle::new(Point::ZERO, *radius).to_path(PATH_TOLERANCE),
            Self::Ellipse { rx, ry } => {
                kurbo::Ellipse::new(Point::ZERO, Vec2::new(*rx, *ry), 0.0).to_path(PATH_TOLERANCE)
            }
            Self::Line { length } => {
                let mut p = BezPath::new();
                p.move_to((-length / 2.0, 0.0));
                p.line_to((length / 2.0, 0.0));
                p
            }
            Self::Triangle { size } => regular_polygon(3, size / 3f64.sqrt()),
            Self::Polygon { sides, radius } => regular_polygon(*sides, *radius),
            Self::Path { d } => match BezPath::from_svg(d) {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(error = %err, "unparsable shape path data; drawing nothing");
                    BezPath::new()
                }
            },
        }
    }
}

fn regular_polygon(sides: u32, radius: f64) -> BezPath {
    let mut p = BezPath::new();
    let n = sides.max(3);
    for i in 0..n {
        // First vertex straight up (negative y in screen space).
        let angle = -std::f64::consts::FRAC_PI_2 + std::f64::consts::TAU * f64::from(i) / f64::from(n);
        let pt = Point::new(radius * angle.cos(), radius * angle.sin());
        if i == 0 {
            p.move_to(pt);
        } else {
            p.line_to(pt);
        }
    }
    p.close_path();
    p
}

#[cfg(test)]
#[path = "../../tests/unit/scene/shapes.rs"]
mod tests;
