use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::foundation::error::PluginError;
use crate::native::abi::{Behavior, PluginSymbols};
use crate::native::build::PluginBuilder;
use crate::native::loader::{PluginLibrary, PluginLoader};

const SCHEME: &str = "static:";

/// Statically linked behaviors served under the plugin contract, keyed by source file stem.
///
/// Serves as both builder and loader: "building" `plugins/orbit.rs` resolves to the artifact
/// `static:orbit`, and opening that artifact hands out the registered symbols.
#[derive(Clone, Debug, Default)]
pub struct StaticRegistry {
    entries: BTreeMap<String, PluginSymbols>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `stem`, replacing any earlier entry.
    pub fn register<T: Behavior + Default + 'static>(&mut self, stem: impl Into<String>) -> &mut Self {
        self.entries.insert(stem.into(), PluginSymbols::for_type::<T>());
        self
    }

    /// Register an already-resolved symbol pair, e.g. one produced by `export_behavior!`.
    pub fn register_symbols(&mut self, stem: impl Into<String>, symbols: PluginSymbols) -> &mut Self {
        self.entries.insert(stem.into(), symbols);
        self
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.entries.contains_key(stem)
    }

    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl PluginBuilder for StaticRegistry {
    fn build(&mut self, source: &Path) -> Result<PathBuf, PluginError> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if !self.contains(stem) {
            return Err(PluginError::Compile {
                source_path: source.to_path_buf(),
                stderr: format!("no statically registered behavior named '{stem}'"),
            });
        }
        Ok(PathBuf::from(format!("{SCHEME}{stem}")))
    }
}

impl PluginLoader for StaticRegistry {
    fn open(&mut self, path: &Path) -> Result<Box<dyn PluginLibrary>, PluginError> {
        let symbols = path
            .to_str()
            .and_then(|p| p.strip_prefix(SCHEME))
            .and_then(|stem| self.entries.get(stem))
            .copied()
            .ok_or_else(|| PluginError::Open {
                path: path.to_path_buf(),
                reason: "not a registered static behavior".to_string(),
            })?;
        Ok(Box::new(StaticLibrary {
            path: path.to_path_buf(),
            symbols,
        }))
    }
}

struct StaticLibrary {
    path: PathBuf,
    symbols: PluginSymbols,
}

impl PluginLibrary for StaticLibrary {
    fn path(&self) -> &Path {
        &self.path
    }

    fn symbols(&self) -> Result<PluginSymbols, PluginError> {
        Ok(self.symbols)
    }

    fn close(self: Box<Self>) -> Result<(), PluginError> {
        Ok(())
    }
}
