use crate::{
    animation::anim::Animation,
    animation::ease::Ease,
    animation::mobject::MobjectSnapshot,
    animation::track::AnimationTrack,
    foundation::error::{SceneError, SceneResult},
};

/// Sequential track authoring: each `play` starts where the cursor is and advances it.
///
/// ```
/// use mobscene::animation::{ops, timeline::TimelineBuilder};
/// use mobscene::animation::mobject::MobjectSnapshot;
///
/// let dot = MobjectSnapshot::new(kurbo::BezPath::from_svg("M0 0 L1 0").unwrap());
/// let tracks = TimelineBuilder::new()
///     .play(dot.clone(), ops::show_creation(), 1.0)?
///     .wait(0.5)?
///     .play(dot, ops::fade_out(), 1.0)?
///     .build();
/// assert_eq!(tracks[1].start(), 1.5);
/// # Ok::<(), mobscene::SceneError>(())
/// ```
#[derive(Debug, Default)]
pub struct TimelineBuilder {
    cursor: f64,
    ease: Ease,
    tracks: Vec<AnimationTrack>,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Easing used by [`TimelineBuilder::play`].
    pub fn default_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Time the next track will start at.
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn play(
        self,
        initial: MobjectSnapshot,
        animation: Animation,
        duration: f64,
    ) -> SceneResult<Self> {
        let ease = self.ease;
        self.play_eased(initial, animation, ease, duration)
    }

    pub fn play_eased(
        mut self,
        initial: MobjectSnapshot,
        animation: Animation,
        ease: Ease,
        duration: f64,
    ) -> SceneResult<Self> {
        let track = AnimationTrack::new(initial, animation, ease, self.cursor, duration)?;
        self.cursor = track.end();
        self.tracks.push(track);
        Ok(self)
    }

    /// Add a track at the cursor without advancing it, so it overlaps the next `play`.
    pub fn add_parallel(
        mut self,
        initial: MobjectSnapshot,
        animation: Animation,
        duration: f64,
    ) -> SceneResult<Self> {
        let track = AnimationTrack::new(initial, animation, self.ease, self.cursor, duration)?;
        self.tracks.push(track);
        Ok(self)
    }

    pub fn wait(mut self, seconds: f64) -> SceneResult<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(SceneError::validation(format!(
                "wait duration must be finite and >= 0, got {seconds}"
            )));
        }
        self.cursor += seconds;
        Ok(self)
    }

    pub fn build(self) -> Vec<AnimationTrack> {
        self.tracks
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timeline.rs"]
mod tests;
