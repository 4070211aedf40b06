//! The factory/destructor contract a compiled behavior plugin exports.
//!
//! A plugin exports two unmangled functions:
//!
//! ```text
//! create_script()      -> *mut c_void   // owned behavior object, or null on failure
//! destroy_script(ptr)                   // frees exactly one create_script result
//! ```
//!
//! The pointer is a `Box<Box<dyn Behavior>>` in disguise. Because the host calls straight into the
//! trait object, a plugin must be built by the same compiler against the same `mobscene` build as
//! the host.

#![allow(unsafe_code)]

use std::ffi::c_void;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::ptr::NonNull;

use crate::ecs::store::Entity;
use crate::foundation::error::PluginError;
use crate::scene::context::SceneContext;
use crate::scene::render::Canvas;

/// Exported factory symbol.
pub const CREATE_SYMBOL: &str = "create_script";
/// Exported destructor symbol.
pub const DESTROY_SYMBOL: &str = "destroy_script";

pub type CreateScriptFn = unsafe extern "C" fn() -> *mut c_void;
pub type DestroyScriptFn = unsafe extern "C" fn(*mut c_void);

/// Native behavior bound to one entity.
pub trait Behavior {
    /// Called once, right after instantiation.
    fn on_start(&mut self, _entity: Entity, _ctx: &mut SceneContext) {}

    /// Called every update with the frame delta and absolute scene time.
    fn on_update(&mut self, _entity: Entity, _ctx: &mut SceneContext, _dt: f64, _time: f64) {}

    /// Called during draw, with the entity transform already applied to `canvas`.
    fn on_draw(&mut self, _entity: Entity, _ctx: &mut SceneContext, _canvas: &mut dyn Canvas) {}
}

/// Resolved factory/destructor pair.
#[derive(Clone, Copy, Debug)]
pub struct PluginSymbols {
    create: CreateScriptFn,
    destroy: DestroyScriptFn,
}

impl PluginSymbols {
    /// # Safety
    ///
    /// `create` must return null or a pointer produced by [`into_raw`] (or an equivalent layout),
    /// `destroy` must free such a pointer, and both must stay callable for as long as any
    /// [`BehaviorObject`] built from them is alive.
    pub unsafe fn new(create: CreateScriptFn, destroy: DestroyScriptFn) -> Self {
        Self { create, destroy }
    }

    /// Symbols for a behavior type linked into the host.
    pub fn for_type<T: Behavior + Default + 'static>() -> Self {
        Self {
            create: create_typed::<T>,
            destroy: destroy_boxed,
        }
    }

    /// Call the factory and take ownership of its result.
    pub fn instantiate(&self, library: &Path) -> Result<BehaviorObject, PluginError> {
        // SAFETY: upheld by the contract of `PluginSymbols::new`.
        let raw = unsafe { (self.create)() };
        NonNull::new(raw.cast::<Box<dyn Behavior>>())
            .map(|ptr| BehaviorObject {
                ptr,
                destroy: self.destroy,
            })
            .ok_or_else(|| PluginError::NullObject {
                path: library.to_path_buf(),
            })
    }
}

/// An instantiated behavior. Dropping it calls the plugin's destructor.
pub struct BehaviorObject {
    ptr: NonNull<Box<dyn Behavior>>,
    destroy: DestroyScriptFn,
}

impl BehaviorObject {
    pub fn behavior(&mut self) -> &mut dyn Behavior {
        // SAFETY: `ptr` came from the paired factory and is freed only in `drop`.
        unsafe { &mut **self.ptr.as_mut() }
    }
}

impl Drop for BehaviorObject {
    fn drop(&mut self) {
        // SAFETY: called exactly once with the factory's pointer.
        unsafe { (self.destroy)(self.ptr.as_ptr().cast()) }
    }
}

/// Box a behavior into the pointer `create_script` returns.
pub fn into_raw(behavior: Box<dyn Behavior>) -> *mut c_void {
    Box::into_raw(Box::new(behavior)).cast()
}

/// Factory for a host-linked behavior type. A panicking constructor yields null.
pub extern "C" fn create_typed<T: Behavior + Default + 'static>() -> *mut c_void {
    catch_unwind(AssertUnwindSafe(|| into_raw(Box::new(T::default()))))
        .unwrap_or(std::ptr::null_mut())
}

/// Destructor matching [`into_raw`].
///
/// # Safety
///
/// `ptr` must be null or an [`into_raw`] result that has not been freed yet.
pub unsafe extern "C" fn destroy_boxed(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: guaranteed by the caller.
    let boxed = unsafe { Box::from_raw(ptr.cast::<Box<dyn Behavior>>()) };
    let _ = catch_unwind(AssertUnwindSafe(move || drop(boxed)));
}

/// Export `create_script` / `destroy_script` for a `Behavior + Default` type.
///
/// ```ignore
/// #[derive(Default)]
/// struct Spin;
/// impl mobscene::native::abi::Behavior for Spin {}
/// mobscene::export_behavior!(Spin);
/// ```
#[macro_export]
macro_rules! export_behavior {
    ($ty:ty) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn create_script() -> *mut ::std::ffi::c_void {
            $crate::native::abi::create_typed::<$ty>()
        }

        /// # Safety
        ///
        /// `ptr` must come from `create_script` and be freed at most once.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn destroy_script(ptr: *mut ::std::ffi::c_void) {
            unsafe { $crate::native::abi::destroy_boxed(ptr) }
        }
    };
}

#[cfg(test)]
#[path = "../../tests/unit/native/abi.rs"]
mod tests;
