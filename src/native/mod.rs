//! Natively compiled behavior plugins.
//!
//! A plugin source is built into a library ([`build`]), opened ([`loader`]), and its exported
//! factory instantiated into a [`abi::BehaviorObject`]. [`host::NativePluginHost`] drives the
//! objects and owns the teardown order. [`registry::StaticRegistry`] serves statically linked
//! behaviors through the same contract without a compiler.

pub mod abi;
pub mod build;
pub mod host;
pub mod loader;
pub mod registry;
