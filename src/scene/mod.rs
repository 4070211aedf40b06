//! The scene facade and its frame pipeline.
//!
//! [`scene::Scene`] owns the shared [`context::SceneContext`] and a
//! [`scheduler::FrameScheduler`] whose stages are the native plugin host and the interpreted
//! script host, in that order. Persistence goes through [`document::SceneDocument`].

pub mod context;
pub mod document;
pub mod render;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod scheduler;
pub mod shapes;
