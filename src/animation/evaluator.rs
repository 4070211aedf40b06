use crate::{
    animation::mobject::MobjectSnapshot,
    animation::track::AnimationTrack,
    foundation::error::{SceneError, SceneResult},
};

/// One track's contribution at a query time.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct EvaluatedSnapshot {
    /// Index of the producing track in the input slice.
    pub track: usize,
    /// Eased progress the animation was applied at.
    pub progress: f64,
    /// Resulting mobject.
    pub snapshot: MobjectSnapshot,
}

/// Pure `(tracks, t) -> snapshots` resolution.
pub struct Evaluator;

impl Evaluator {
    /// Resolve every started track at `t`, in input order.
    ///
    /// Tracks that have not started contribute nothing; finished tracks stay frozen at `e = 1`.
    #[tracing::instrument(skip(tracks), fields(tracks = tracks.len()))]
    pub fn eval(tracks: &[AnimationTrack], t: f64) -> SceneResult<Vec<EvaluatedSnapshot>> {
        if !t.is_finite() {
            return Err(SceneError::evaluation(format!("query time must be finite, got {t}")));
        }

        Ok(tracks
            .iter()
            .enumerate()
            .filter_map(|(index, track)| {
                let progress = track.progress(t)?;
                Some(EvaluatedSnapshot {
                    track: index,
                    progress,
                    snapshot: track.animation().apply(track.initial(), progress),
                })
            })
            .collect())
    }
}

/// Snapshots of every started track at `t`; a non-finite `t` yields nothing.
pub fn evaluate(tracks: &[AnimationTrack], t: f64) -> Vec<MobjectSnapshot> {
    Evaluator::eval(tracks, t)
        .map(|nodes| nodes.into_iter().map(|n| n.snapshot).collect())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/animation/evaluator.rs"]
mod tests;
