//! Opening compiled plugins and resolving their exports.

#![allow(unsafe_code)]

use std::path::{Path, PathBuf};

use crate::foundation::error::PluginError;
use crate::native::abi::{
    CREATE_SYMBOL, CreateScriptFn, DESTROY_SYMBOL, DestroyScriptFn, PluginSymbols,
};

/// An open plugin library. Exclusively owned by the binding that opened it.
pub trait PluginLibrary {
    fn path(&self) -> &Path;

    /// Resolve the factory/destructor pair.
    fn symbols(&self) -> Result<PluginSymbols, PluginError>;

    /// Unload the library. Every object created from it must already be destroyed.
    fn close(self: Box<Self>) -> Result<(), PluginError>;
}

/// Turns a built artifact into an open [`PluginLibrary`].
pub trait PluginLoader {
    fn open(&mut self, path: &Path) -> Result<Box<dyn PluginLibrary>, PluginError>;
}

/// Loads shared libraries from disk.
#[derive(Debug, Default)]
pub struct DylibLoader;

impl PluginLoader for DylibLoader {
    fn open(&mut self, path: &Path) -> Result<Box<dyn PluginLibrary>, PluginError> {
        // SAFETY: running library initializers is inherent to loading plugins; the artifact was
        // produced by our own builder.
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| PluginError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "opened plugin library");
        Ok(Box::new(Dylib {
            path: path.to_path_buf(),
            library,
        }))
    }
}

struct Dylib {
    path: PathBuf,
    library: libloading::Library,
}

impl Dylib {
    fn lookup<T: Copy>(&self, name: &'static str) -> Result<T, PluginError> {
        // SAFETY: the symbol types are fixed by the plugin contract, and the copied function
        // pointer is only used while `self.library` stays open.
        unsafe { self.library.get::<T>(name.as_bytes()) }
            .map(|symbol| *symbol)
            .map_err(|_| PluginError::MissingSymbol {
                path: self.path.clone(),
                symbol: name,
            })
    }
}

impl PluginLibrary for Dylib {
    fn path(&self) -> &Path {
        &self.path
    }

    fn symbols(&self) -> Result<PluginSymbols, PluginError> {
        let create = self.lookup::<CreateScriptFn>(CREATE_SYMBOL)?;
        let destroy = self.lookup::<DestroyScriptFn>(DESTROY_SYMBOL)?;
        // SAFETY: the exports follow the plugin contract; the host keeps the library open until
        // every object from it is destroyed.
        Ok(unsafe { PluginSymbols::new(create, destroy) })
    }

    fn close(self: Box<Self>) -> Result<(), PluginError> {
        let Self { path, library } = *self;
        library.close().map_err(|e| PluginError::Close {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "closed plugin library");
        Ok(())
    }
}
