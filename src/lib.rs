// lib.rs — 全景导览核心：场景表、视角、输入判定、热点与场景切换

pub mod asset;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hotspot;
pub mod i18n;
pub mod input;
pub mod loader;
pub mod navigation;
pub mod orientation;

pub use catalog::{SceneCatalog, SceneId, Tour};
pub use error::{AssetLoadError, ConfigurationError, TourError};
pub use navigation::NavigationController;
