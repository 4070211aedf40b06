//! Time-parameterized animation of path-based mobjects.
//!
//! Everything here is pure: evaluating the same tracks at the same time always yields the same
//! snapshots, independent of the entity store.

pub mod anim;
pub mod ease;
pub mod evaluator;
pub mod mobject;
pub mod ops;
pub mod path;
pub mod timeline;
pub mod track;
