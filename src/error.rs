// error.rs — 配置错误与资源加载错误

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::SceneId;

/// A tour that refers to scenes it does not define, or asks for one at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("scene not found: {0}")]
    UnknownScene(SceneId),
    #[error("scene {scene} has a hotspot pointing at missing scene {target}")]
    DanglingHotspot { scene: SceneId, target: SceneId },
    #[error("scene id {0} is defined more than once")]
    DuplicateScene(SceneId),
    #[error("start scene {0} is not defined")]
    UnknownStartScene(SceneId),
    #[error("tour defines no scenes")]
    EmptyCatalog,
}

/// Failure to turn an image reference into pixels.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("loading {path} timed out after {after:?}")]
    TimedOut { path: PathBuf, after: Duration },
    #[error("image worker disconnected")]
    Disconnected,
}

/// Errors reading a tour file from disk.
#[derive(Debug, Error)]
pub enum TourError {
    #[error("failed to read tour file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed tour file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}
