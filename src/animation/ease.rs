use std::f64::consts::PI;

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;

/// Closed-form easing curves over normalized progress.
///
/// Every curve maps `0 -> 0` and `1 -> 1` exactly; inputs outside `[0, 1]` are clamped first.
/// The `Back` family overshoots inside the interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Identity.
    #[default]
    Linear,
    /// Quadratic, accelerating.
    InQuad,
    /// Quadratic, decelerating.
    OutQuad,
    /// Quadratic, both ends.
    InOutQuad,
    /// Cubic, accelerating.
    InCubic,
    /// Cubic, decelerating.
    OutCubic,
    /// Cubic, both ends.
    InOutCubic,
    /// Sinusoidal, accelerating.
    InSine,
    /// Sinusoidal, decelerating.
    OutSine,
    /// Sinusoidal, both ends.
    InOutSine,
    /// Exponential, accelerating.
    InExpo,
    /// Exponential, decelerating.
    OutExpo,
    /// Exponential, both ends.
    InOutExpo,
    /// Pulls back before accelerating.
    InBack,
    /// Overshoots before settling.
    OutBack,
    /// Pulls back and overshoots.
    InOutBack,
}

impl Ease {
    /// All curves, in declaration order.
    pub const ALL: [Ease; 16] = [
        Ease::Linear,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
        Ease::InSine,
        Ease::OutSine,
        Ease::InOutSine,
        Ease::InExpo,
        Ease::OutExpo,
        Ease::InOutExpo,
        Ease::InBack,
        Ease::OutBack,
        Ease::InOutBack,
    ];

    /// Map progress `t` through the curve.
    pub fn apply(self, t: f64) -> f64 {
        // Pin the endpoints: cos(PI/2) and 2^-10 style terms would otherwise leave drift.
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InSine => 1.0 - (t * PI / 2.0).cos(),
            Self::OutSine => (t * PI / 2.0).sin(),
            Self::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::InExpo => 2f64.powf(10.0 * t - 10.0),
            Self::OutExpo => 1.0 - 2f64.powf(-10.0 * t),
            Self::InOutExpo => {
                if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Self::InBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Self::OutBack => {
                let u = t - 1.0;
                1.0 + BACK_C3 * u.powi(3) + BACK_C1 * u.powi(2)
            }
            Self::InOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0)
                        / 2.0
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
