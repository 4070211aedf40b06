use std::path::PathBuf;

use crate::ecs::store::Entity;

/// Convenience result type used across mobscene.
pub type SceneResult<T> = Result<T, SceneError>;

/// Top-level error taxonomy used by scene APIs.
///
/// None of these are fatal to a running scene: per-tick failures are logged and swallowed by the
/// hosts, and only the operation that produced them reports an error.
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Invalid user-provided or document data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while constructing or applying animations.
    #[error("animation error: {0}")]
    Animation(String),

    /// Errors while evaluating timeline state.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Native plugin build, load, or lifecycle failure.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Interpreted script load or runtime failure.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// An entity may carry one behavior binding at a time.
    #[error("entity {entity:?} already has a {existing} binding")]
    BindingConflict {
        /// Entity the attach was attempted on.
        entity: Entity,
        /// Kind of the binding already present.
        existing: &'static str,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneError {
    /// Build a [`SceneError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SceneError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`SceneError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`SceneError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// Failures of the native plugin pipeline (build, open, resolve, instantiate, run, close).
#[derive(thiserror::Error, Debug)]
pub enum PluginError {
    /// The compiler ran and rejected the source.
    #[error("failed to compile '{}': {stderr}", .source_path.display())]
    Compile {
        /// Plugin source file.
        source_path: PathBuf,
        /// Captured compiler diagnostics.
        stderr: String,
    },

    /// The compiler process could not be started.
    #[error("failed to spawn compiler '{}': {reason}", .compiler.display())]
    Spawn {
        /// Compiler executable.
        compiler: PathBuf,
        /// OS-level reason.
        reason: String,
    },

    /// Preparing the build directory or inspecting sources failed.
    #[error("plugin io error at '{}': {reason}", .path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// IO reason.
        reason: String,
    },

    /// The dynamic library could not be opened.
    #[error("failed to open plugin library '{}': {reason}", .path.display())]
    Open {
        /// Library path.
        path: PathBuf,
        /// Loader-level reason.
        reason: String,
    },

    /// A required export is missing from the library.
    #[error("plugin library '{}' does not export `{symbol}`", .path.display())]
    MissingSymbol {
        /// Library path.
        path: PathBuf,
        /// Name of the missing export.
        symbol: &'static str,
    },

    /// The factory returned a null behavior object.
    #[error("plugin factory in '{}' returned null", .path.display())]
    NullObject {
        /// Library path.
        path: PathBuf,
    },

    /// Unloading the library failed.
    #[error("failed to close plugin library '{}': {reason}", .path.display())]
    Close {
        /// Library path.
        path: PathBuf,
        /// Loader-level reason.
        reason: String,
    },

    /// A behavior callback panicked.
    #[error("plugin behavior panicked in {phase}: {message}")]
    Panicked {
        /// Callback that panicked.
        phase: &'static str,
        /// Panic payload, when it was a string.
        message: String,
    },
}

/// Failures of the interpreted script pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ScriptError {
    /// The resolved script path does not exist.
    #[error("script '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    /// The resolved script path is a directory or other non-file.
    #[error("script '{}' is not a file", .0.display())]
    NotAFile(PathBuf),

    /// Reading the script failed.
    #[error("failed to read script '{}': {reason}", .path.display())]
    Io {
        /// Script path.
        path: PathBuf,
        /// IO reason.
        reason: String,
    },

    /// The script failed to parse or its top level failed to run.
    #[error("failed to load script '{}': {reason}", .path.display())]
    Load {
        /// Script path.
        path: PathBuf,
        /// Interpreter message.
        reason: String,
    },

    /// A named entry point raised an error.
    #[error("script function `{function}` failed: {reason}")]
    Runtime {
        /// Entry point name.
        function: String,
        /// Interpreter message.
        reason: String,
    },
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
