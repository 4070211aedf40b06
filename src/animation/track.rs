use crate::{
    animation::anim::Animation,
    animation::ease::Ease,
    animation::mobject::MobjectSnapshot,
    foundation::error::{SceneError, SceneResult},
};

/// One mobject's timed animation: initial snapshot, animation function, easing, and window.
///
/// Tracks are immutable once built; `duration` is always finite and strictly positive.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "TrackDef")]
pub struct AnimationTrack {
    initial: MobjectSnapshot,
    animation: Animation,
    ease: Ease,
    start: f64,
    duration: f64,
}

#[derive(serde::Deserialize)]
struct TrackDef {
    initial: MobjectSnapshot,
    animation: Animation,
    #[serde(default)]
    ease: Ease,
    #[serde(default)]
    start: f64,
    duration: f64,
}

impl TryFrom<TrackDef> for AnimationTrack {
    type Error = SceneError;

    fn try_from(def: TrackDef) -> SceneResult<Self> {
        Self::new(def.initial, def.animation, def.ease, def.start, def.duration)
    }
}

impl AnimationTrack {
    /// Build a track, rejecting degenerate windows and non-finite animation parameters.
    pub fn new(
        initial: MobjectSnapshot,
        animation: Animation,
        ease: Ease,
        start: f64,
        duration: f64,
    ) -> SceneResult<Self> {
        if !start.is_finite() {
            return Err(SceneError::animation("track start must be finite"));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(SceneError::animation(format!(
                "track duration must be finite and > 0, got {duration}"
            )));
        }
        animation.validate()?;
        Ok(Self {
            initial,
            animation,
            ease,
            start,
            duration,
        })
    }

    /// Snapshot the animation starts from.
    pub fn initial(&self) -> &MobjectSnapshot {
        &self.initial
    }

    /// Animation function.
    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    /// Easing curve.
    pub fn ease(&self) -> Ease {
        self.ease
    }

    /// Start time in seconds.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// `start + duration`.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Eased progress at `t`: `None` before the start, `1` from the end onward.
    pub fn progress(&self, t: f64) -> Option<f64> {
        let u = (t - self.start) / self.duration;
        if u.is_nan() || u < 0.0 {
            return None;
        }
        Some(self.ease.apply(u.min(1.0)))
    }

    /// Snapshot at `t`, or `None` before the track starts.
    pub fn sample(&self, t: f64) -> Option<MobjectSnapshot> {
        self.progress(t)
            .map(|e| self.animation.apply(&self.initial, e))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/track.rs"]
mod tests;
