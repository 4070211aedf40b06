//! Compiling plugin sources into loadable libraries.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread::JoinHandle;
use std::time::SystemTime;

use crate::foundation::config::{HostCrate, NativeOpts, PreludeSpec};
use crate::foundation::error::PluginError;

/// Turns a plugin source file into a loadable artifact path.
pub trait PluginBuilder {
    fn build(&mut self, source: &Path) -> Result<PathBuf, PluginError>;
}

/// Builds plugins with `rustc` as `cdylib`s, using the fixed profile from [`NativeOpts`].
///
/// Each build gets a fresh file name, so rebuilding a plugin never collides with a copy that is
/// still loaded. The configured host crate and prelude are linked into every build.
pub struct RustcBuilder {
    opts: NativeOpts,
    builds: u64,
    prelude: Option<PreludeCache>,
}

impl RustcBuilder {
    pub fn new(opts: NativeOpts) -> Self {
        let prelude = opts
            .prelude
            .clone()
            .map(|spec| PreludeCache::new(spec, &opts.out_dir));
        Self {
            opts,
            builds: 0,
            prelude,
        }
    }

    pub fn opts(&self) -> &NativeOpts {
        &self.opts
    }

    /// Whether the precompiled prelude is current and no rebuild is in flight.
    pub fn prelude_ready(&self) -> bool {
        self.prelude.as_ref().is_some_and(PreludeCache::is_ready)
    }

    /// Wait for an in-flight prelude rebuild, if any.
    pub fn wait_for_prelude(&mut self) {
        if let Some(prelude) = &mut self.prelude {
            prelude.join();
        }
    }

    /// Unique crate name and artifact path for the next build of `source`.
    fn next_output(&mut self, source: &Path) -> Result<(String, PathBuf), PluginError> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PluginError::Io {
                path: source.to_path_buf(),
                reason: "plugin source has no usable file name".to_string(),
            })?;
        self.builds += 1;
        let name = format!("{}_{}", crate_name(stem), self.builds);
        let path = self.opts.out_dir.join(format!(
            "{}{name}{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_SUFFIX
        ));
        Ok((name, path))
    }
}

impl PluginBuilder for RustcBuilder {
    #[tracing::instrument(skip(self), fields(source = %source.display()))]
    fn build(&mut self, source: &Path) -> Result<PathBuf, PluginError> {
        if !source.is_file() {
            return Err(PluginError::Io {
                path: source.to_path_buf(),
                reason: "plugin source does not exist".to_string(),
            });
        }
        std::fs::create_dir_all(&self.opts.out_dir).map_err(|e| PluginError::Io {
            path: self.opts.out_dir.clone(),
            reason: e.to_string(),
        })?;

        if self.opts.host.is_none() {
            tracing::debug!("no host crate configured; plugin cannot use the behavior ABI types");
        }
        let prelude = match &mut self.prelude {
            Some(prelude) => {
                prelude.refresh(&self.opts);
                prelude.usable()
            }
            None => None,
        };

        let (name, output) = self.next_output(source)?;

        let mut cmd = Command::new(&self.opts.compiler);
        cmd.args(["--crate-type", "cdylib", "--edition"])
            .arg(&self.opts.edition)
            .arg("-C")
            .arg(format!("opt-level={}", self.opts.opt_level))
            .arg("--crate-name")
            .arg(&name)
            .arg("-o")
            .arg(&output);
        if let Some(host) = &self.opts.host {
            link_host(&mut cmd, host);
        }
        if let Some((prelude_name, artifact)) = prelude {
            cmd.arg("-L")
                .arg(&self.opts.out_dir)
                .arg("--extern")
                .arg(format!("{prelude_name}={}", artifact.display()));
        }
        cmd.args(&self.opts.extra_args).arg(source);

        run_compiler(cmd, &self.opts.compiler, source)?;
        tracing::info!(output = %output.display(), "built native plugin");
        Ok(output)
    }
}

fn run_compiler(mut cmd: Command, compiler: &Path, source: &Path) -> Result<(), PluginError> {
    let out = cmd.output().map_err(|e| PluginError::Spawn {
        compiler: compiler.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !out.status.success() {
        return Err(PluginError::Compile {
            source_path: source.to_path_buf(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }
    Ok(())
}

fn link_host(cmd: &mut Command, host: &HostCrate) {
    for dir in host.dependency_dirs() {
        cmd.arg("-L").arg(format!("dependency={}", dir.display()));
    }
    cmd.arg("--extern")
        .arg(format!("{}={}", crate_name(&host.crate_name), host.rlib.display()));
}

/// `rustc` crate names allow ASCII alphanumerics and `_` only.
fn crate_name(stem: &str) -> String {
    let name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

/// Precompiled prelude rlib shared by every plugin build.
///
/// Rebuilds compile into a staging file and replace the artifact only on success, so the last
/// good rlib stays linkable while a stale one rebuilds.
struct PreludeCache {
    spec: PreludeSpec,
    artifact: PathBuf,
    staging: PathBuf,
    fresh: bool,
    rebuild: Option<JoinHandle<Result<(), PluginError>>>,
    /// Source mtime of the last rebuild attempt; cleared once one succeeds.
    failed_for: Option<Option<SystemTime>>,
}

impl PreludeCache {
    fn new(spec: PreludeSpec, out_dir: &Path) -> Self {
        let file = format!("lib{}.rlib", crate_name(&spec.crate_name));
        Self {
            artifact: out_dir.join(&file),
            staging: out_dir.join("prelude-staging").join(file),
            spec,
            fresh: false,
            rebuild: None,
            failed_for: None,
        }
    }

    fn is_ready(&self) -> bool {
        self.fresh && self.rebuild.is_none()
    }

    /// Crate name and rlib to link, waiting for the first build when no rlib exists yet.
    ///
    /// `None` only when the prelude has never built successfully.
    fn usable(&mut self) -> Option<(String, PathBuf)> {
        if !self.artifact.is_file() {
            self.join();
        }
        self.artifact
            .is_file()
            .then(|| (crate_name(&self.spec.crate_name), self.artifact.clone()))
    }

    /// Reap a finished rebuild, then start a new one if the artifact is stale.
    ///
    /// Never blocks on the compiler.
    fn refresh(&mut self, opts: &NativeOpts) {
        if self.rebuild.as_ref().is_some_and(JoinHandle::is_finished) {
            self.join();
        }
        if self.rebuild.is_some() {
            return;
        }

        let source_mtime = modified(&self.spec.source);
        let stale = match (source_mtime, modified(&self.artifact)) {
            (Some(src), Some(art)) => src > art,
            (_, None) => true,
            (None, Some(_)) => false,
        };
        if !stale {
            self.fresh = true;
            return;
        }
        self.fresh = false;
        if self.failed_for == Some(source_mtime) {
            return;
        }
        self.failed_for = Some(source_mtime);

        let mut cmd = Command::new(&opts.compiler);
        cmd.args(["--crate-type", "rlib", "--edition"])
            .arg(&opts.edition)
            .arg("-C")
            .arg(format!("opt-level={}", opts.opt_level))
            .arg("--crate-name")
            .arg(crate_name(&self.spec.crate_name))
            .arg("-o")
            .arg(&self.staging);
        if let Some(host) = &opts.host {
            link_host(&mut cmd, host);
        }
        cmd.args(&opts.extra_args).arg(&self.spec.source);
        let compiler = opts.compiler.clone();
        let source = self.spec.source.clone();
        let staging = self.staging.clone();
        let artifact = self.artifact.clone();

        tracing::info!(source = %source.display(), "prelude is stale, rebuilding in background");
        self.rebuild = Some(std::thread::spawn(move || {
            let io_err = |path: &Path, e: std::io::Error| PluginError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            };
            if let Some(dir) = staging.parent() {
                std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
            }
            run_compiler(cmd, &compiler, &source)?;
            std::fs::rename(&staging, &artifact).map_err(|e| io_err(&artifact, e))
        }));
    }

    fn join(&mut self) {
        let Some(handle) = self.rebuild.take() else {
            return;
        };
        match handle.join() {
            Ok(Ok(())) => {
                self.fresh = true;
                self.failed_for = None;
                tracing::info!(artifact = %self.artifact.display(), "prelude rebuilt");
            }
            Ok(Err(e)) => {
                self.fresh = false;
                tracing::warn!(error = %e, "prelude rebuild failed; linking the last good build, if any");
            }
            Err(_) => {
                self.fresh = false;
                tracing::warn!("prelude rebuild thread panicked");
            }
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
#[path = "../../tests/unit/native/build.rs"]
mod tests;
