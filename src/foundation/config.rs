use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{SceneError, SceneResult};

/// Scene-wide runtime options.
///
/// Every field has a default, so a JSON config only needs the keys it overrides.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneOpts {
    /// Base directory for relative interpreted script paths.
    ///
    /// `None` resolves relative paths against the directory of the running executable.
    pub script_root: Option<PathBuf>,
    /// Viewport size of the rendering collaborator, used by view control.
    pub viewport: (f64, f64),
    /// Interpreter limits.
    pub scripts: ScriptOpts,
    /// Native plugin compiler profile.
    pub native: NativeOpts,
}

impl Default for SceneOpts {
    fn default() -> Self {
        Self {
            script_root: None,
            viewport: (1280.0, 720.0),
            scripts: ScriptOpts::default(),
            native: NativeOpts::default(),
        }
    }
}

impl SceneOpts {
    /// Load options from a JSON file.
    pub fn from_path(path: &Path) -> SceneResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read scene config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Parse options from JSON text.
    pub fn from_json_str(text: &str) -> SceneResult<Self> {
        let opts: Self = serde_json::from_str(text).map_err(|e| SceneError::serde(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> SceneResult<()> {
        let (w, h) = self.viewport;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(SceneError::validation("viewport must be finite and positive"));
        }
        if self.native.compiler.as_os_str().is_empty() {
            return Err(SceneError::validation("native compiler must be non-empty"));
        }
        if let Some(host) = &self.native.host {
            if host.crate_name.is_empty() {
                return Err(SceneError::validation("host crate name must be non-empty"));
            }
            if host.rlib.as_os_str().is_empty() {
                return Err(SceneError::validation("host crate rlib must be non-empty"));
            }
        }
        Ok(())
    }
}

/// Limits applied to the shared interpreter.
///
/// Both default to unlimited: a script that never returns halts the scene.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScriptOpts {
    /// Maximum interpreter operations per call.
    pub max_operations: Option<u64>,
    /// Maximum nested function call depth.
    pub max_call_levels: Option<usize>,
}

/// Compiler profile used to build native behavior plugins.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NativeOpts {
    /// Compiler executable.
    pub compiler: PathBuf,
    /// Rust edition passed to the compiler.
    pub edition: String,
    /// `-C opt-level` value.
    pub opt_level: String,
    /// Extra arguments appended to every plugin build (search paths, `--extern`, cfgs).
    pub extra_args: Vec<String>,
    /// Directory receiving built libraries and the prelude artifact.
    pub out_dir: PathBuf,
    /// Shared prelude crate compiled once and linked into every plugin.
    pub prelude: Option<PreludeSpec>,
    /// Compiled host crate plugins implement [`Behavior`](crate::native::abi::Behavior) against.
    ///
    /// Without it only plugins that need nothing from the host compile; set it (or
    /// [`HostCrate::discover`]) before attaching `export_behavior!` plugins.
    pub host: Option<HostCrate>,
}

impl Default for NativeOpts {
    fn default() -> Self {
        Self {
            compiler: PathBuf::from("rustc"),
            edition: "2021".to_string(),
            opt_level: "2".to_string(),
            extra_args: Vec::new(),
            out_dir: std::env::temp_dir().join("mobscene-plugins"),
            prelude: None,
            host: None,
        }
    }
}

/// The shared, precompiled context for native plugins.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PreludeSpec {
    /// Root source file of the prelude crate.
    pub source: PathBuf,
    /// Crate name plugins refer to it by.
    pub crate_name: String,
}

/// Where plugin builds find the compiled host crate.
///
/// Emitted as `-L dependency=<dir>` for each search directory and `--extern <crate_name>=<rlib>`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HostCrate {
    /// Name plugins import the host under.
    #[serde(default = "default_host_crate_name")]
    pub crate_name: String,
    /// The host crate's `rlib`.
    pub rlib: PathBuf,
    /// Directories holding the host's own dependencies. Empty means the `rlib`'s directory.
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,
}

impl HostCrate {
    pub fn new(rlib: impl Into<PathBuf>) -> Self {
        Self {
            crate_name: default_host_crate_name(),
            rlib: rlib.into(),
            search_dirs: Vec::new(),
        }
    }

    /// Newest `libmobscene-*.rlib` in a cargo `deps` directory, such as `target/debug/deps`.
    pub fn discover(deps_dir: &Path) -> Option<Self> {
        let prefix = format!("lib{}-", default_host_crate_name());
        std::fs::read_dir(deps_dir)
            .ok()?
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with(&prefix) && name.ends_with(".rlib")
            })
            .filter_map(|entry| {
                let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
                Some((modified, entry.path()))
            })
            .max_by_key(|(modified, _)| *modified)
            .map(|(_, rlib)| Self::new(rlib))
    }

    /// Search directories to pass, falling back to the `rlib`'s own directory.
    pub fn dependency_dirs(&self) -> Vec<PathBuf> {
        if !self.search_dirs.is_empty() {
            return self.search_dirs.clone();
        }
        self.rlib
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| vec![dir.to_path_buf()])
            .unwrap_or_default()
    }
}

fn default_host_crate_name() -> String {
    env!("CARGO_CRATE_NAME").to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
