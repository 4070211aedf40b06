use crate::{
    animation::mobject::{MobjectSnapshot, MobjectStyle},
    animation::path::{is_closed, last_point, partial, polyline, resample, subpaths},
    foundation::core::{Affine, BezPath, Lerp, Point, Vec2},
    foundation::error::{SceneError, SceneResult},
};

/// Points each contour is resampled to before a [`Animation::Transform`] morph.
pub const MORPH_SAMPLES: usize = 128;

/// Composable animation function: `(initial snapshot, eased progress) -> snapshot`.
///
/// `apply` is pure; the same inputs always produce the same snapshot.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "params")]
pub enum Animation {
    /// Leave the snapshot untouched.
    Identity,
    /// Ramp the opacity multiplier linearly from `from` to `to`.
    Fade {
        /// Opacity multiplier at `e = 0`.
        from: f64,
        /// Opacity multiplier at `e = 1`.
        to: f64,
    },
    /// Translate by a fraction of `by`.
    Shift {
        /// Full displacement.
        by: Vec2,
    },
    /// Move the center linearly toward `target`.
    MoveTo {
        /// Final center.
        target: Point,
    },
    /// Scale about the center from `1` toward `factor`.
    Scale {
        /// Final scale factor.
        factor: f64,
    },
    /// Rotate about the center from `0` toward `angle` radians.
    Rotate {
        /// Final angle in radians.
        angle: f64,
    },
    /// Reveal a prefix of the outline proportional to progress.
    ShowCreation,
    /// Morph geometry and paint toward `target`.
    Transform {
        /// Final snapshot.
        target: Box<MobjectSnapshot>,
    },
    /// Strictly sequential playback: each child gets an equal slice of `[0, 1]`.
    Chain(Vec<Animation>),
    /// Simultaneous playback: every child sees the same progress, applied in order.
    Group(Vec<Animation>),
}

impl Animation {
    /// Apply at eased progress `e` to `start`.
    pub fn apply(&self, start: &MobjectSnapshot, e: f64) -> MobjectSnapshot {
        match self {
            Self::Identity => start.clone(),
            Self::Fade { from, to } => {
                let mut out = start.clone();
                out.style.opacity = start.style.opacity * Lerp::lerp(from, to, e);
                out
            }
            Self::Shift { by } => start.transformed(Affine::translate(*by * e)),
            Self::MoveTo { target } => {
                let offset = (*target - start.center()) * e;
                start.transformed(Affine::translate(offset))
            }
            Self::Scale { factor } => {
                let s = Lerp::lerp(&1.0, factor, e);
                start.transformed(about(start.center(), Affine::scale(s)))
            }
            Self::Rotate { angle } => {
                start.transformed(about(start.center(), Affine::rotate(angle * e)))
            }
            Self::ShowCreation => MobjectSnapshot {
                path: partial(&start.path, e),
                style: start.style.clone(),
            },
            Self::Transform { target } => morph(start, target, e),
            Self::Chain(children) => apply_chain(children, start, e),
            Self::Group(children) => children
                .iter()
                .fold(start.clone(), |acc, child| child.apply(&acc, e)),
        }
    }

    /// Reject non-finite parameters anywhere in the tree.
    pub fn validate(&self) -> SceneResult<()> {
        fn finite(name: &str, v: f64) -> SceneResult<()> {
            if v.is_finite() {
                Ok(())
            } else {
                Err(SceneError::animation(format!("{name} must be finite")))
            }
        }

        match self {
            Self::Identity | Self::ShowCreation => Ok(()),
            Self::Fade { from, to } => {
                finite("fade from", *from)?;
                finite("fade to", *to)
            }
            Self::Shift { by } => {
                finite("shift x", by.x)?;
                finite("shift y", by.y)
            }
            Self::MoveTo { target } => {
                finite("move target x", target.x)?;
                finite("move target y", target.y)
            }
            Self::Scale { factor } => finite("scale factor", *factor),
            Self::Rotate { angle } => finite("rotate angle", *angle),
            Self::Transform { target } => finite("target opacity", target.style.opacity),
            Self::Chain(children) | Self::Group(children) => {
                children.iter().try_for_each(Animation::validate)
            }
        }
    }
}

fn about(center: Point, affine: Affine) -> Affine {
    Affine::translate(center.to_vec2()) * affine * Affine::translate(-center.to_vec2())
}

fn apply_chain(children: &[Animation], start: &MobjectSnapshot, e: f64) -> MobjectSnapshot {
    let Some(last) = children.len().checked_sub(1) else {
        return start.clone();
    };
    let scaled = e.clamp(0.0, 1.0) * children.len() as f64;
    let active = (scaled.floor() as usize).min(last);
    let local = (scaled - active as f64).clamp(0.0, 1.0);

    let settled = children[..active]
        .iter()
        .fold(start.clone(), |acc, child| child.apply(&acc, 1.0));
    children[active].apply(&settled, local)
}

/// Contours morph pairwise in drawing order. When one side has fewer contours, the extras grow
/// out of (or shrink into) the end point of its last contour.
fn morph(start: &MobjectSnapshot, target: &MobjectSnapshot, e: f64) -> MobjectSnapshot {
    if e <= 0.0 {
        return start.clone();
    }
    if e >= 1.0 {
        return target.clone();
    }

    let from = subpaths(&start.path);
    let to = subpaths(&target.path);
    let mut path = BezPath::new();
    for i in 0..from.len().max(to.len()) {
        let (a, a_closed) = contour_samples(&from, i);
        let (b, b_closed) = contour_samples(&to, i);
        let points: Vec<Point> = a
            .iter()
            .zip(&b)
            .map(|(a, b)| Lerp::lerp(a, b, e))
            .collect();
        path.extend(polyline(&points, a_closed && b_closed).elements().iter().copied());
    }

    MobjectSnapshot {
        path,
        style: blend_style(&start.style, &target.style, e),
    }
}

/// Resampled contour `i` and whether it is closed. A missing contour collapses to a point and
/// takes its counterpart's closedness.
fn contour_samples(contours: &[BezPath], i: usize) -> (Vec<Point>, bool) {
    match contours.get(i) {
        Some(contour) => (resample(contour, MORPH_SAMPLES), is_closed(contour)),
        None => {
            let anchor = contours.last().and_then(last_point).unwrap_or(Point::ZERO);
            (vec![anchor; MORPH_SAMPLES], true)
        }
    }
}

/// Continuous attributes interpolate; discrete ones switch at the midpoint.
fn blend_style(a: &MobjectStyle, b: &MobjectStyle, e: f64) -> MobjectStyle {
    let discrete = if e < 0.5 { a } else { b };
    MobjectStyle {
        color: Lerp::lerp(&a.color, &b.color, e),
        opacity: Lerp::lerp(&a.opacity, &b.opacity, e).clamp(0.0, 1.0),
        stroke_width: Lerp::lerp(&a.stroke_width, &b.stroke_width, e).max(0.0),
        filled: discrete.filled,
        stroked: discrete.stroked,
        shader: discrete.shader.clone(),
        filter: discrete.filter.clone(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/anim.rs"]
mod tests;
