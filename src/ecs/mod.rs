//! Entity identity and typed component storage.

pub mod components;
pub mod store;
