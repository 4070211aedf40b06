//! mobscene is a scene runtime for scripted motion graphics.
//!
//! Entities live in an [`EntityStore`] and may carry one behavior binding each: a natively
//! compiled plugin or an interpreted script. A [`Scene`] drives both through one frame pipeline
//! (native updates, then interpreted updates, then draw) and persists to a JSON document.
//! Timeline animation is separate and pure: see [`animation::evaluator::Evaluator`].
#![deny(unsafe_code)]

pub mod animation;
pub mod ecs;
pub mod foundation;
pub mod native;
pub mod scene;
pub mod script;

pub use crate::animation::ease::Ease;
pub use crate::animation::evaluator::Evaluator;
pub use crate::animation::mobject::MobjectSnapshot;
pub use crate::animation::track::AnimationTrack;
pub use crate::ecs::store::{Entity, EntityStore};
pub use crate::foundation::config::{HostCrate, SceneOpts};
pub use crate::foundation::core::{Affine, BezPath, Point, Rgba8, Size, Vec2};
pub use crate::foundation::error::{PluginError, SceneError, SceneResult, ScriptError};
pub use crate::native::abi::Behavior;
pub use crate::scene::context::SceneContext;
pub use crate::scene::render::{Canvas, Paint, RecordingCanvas};
pub use crate::scene::scene::Scene;
