//! Sandboxed interpreted scripts, one isolated environment per entity.
//!
//! Scripts are [rhai](https://rhai.rs) sources. Each defines optional entry points named by its
//! [`ScriptComponent`](crate::ecs::components::ScriptComponent); every entry point receives the
//! entity id and a `Scene` handle, and `this` is a map private to that entity.

pub mod api;
pub mod host;
