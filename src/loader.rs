// loader.rs — 场景切换：请求图片，完成后整体替换全景与热点

use std::path::PathBuf;
use std::time::{Duration, Instant};

use glam::Vec3;

use crate::asset::{LoadOutcome, LoadRequest, PanoramaImage};
use crate::catalog::{SceneCatalog, SceneId};
use crate::error::{AssetLoadError, ConfigurationError};
use crate::hotspot::{HotspotRegistry, HotspotStyle};
use crate::orientation::{OrientationModel, ViewSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading {
        generation: u64,
        scene: SceneId,
        image_ref: PathBuf,
        started: Instant,
    },
    Failed {
        scene: SceneId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indicator {
    Hidden,
    Loading,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ActiveScene {
    pub id: SceneId,
    pub display_name: String,
    pub panorama: PanoramaImage,
    // 每次替换（包括重新载入同一场景）都会变
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    /// Outcome of a load that has since been superseded or timed out.
    Stale,
}

#[derive(Debug)]
pub struct SceneLoader {
    state: LoadState,
    generation: u64,
    active: Option<ActiveScene>,
    hotspots: HotspotRegistry,
    style: HotspotStyle,
    rollback: Option<ViewSnapshot>,
    timeout: Option<Duration>,
    indicator: Indicator,
    scene_name: String,
}

impl SceneLoader {
    pub fn new(style: HotspotStyle, timeout: Option<Duration>) -> Self {
        Self {
            state: LoadState::Idle,
            generation: 0,
            active: None,
            hotspots: HotspotRegistry::new(),
            style,
            rollback: None,
            timeout,
            indicator: Indicator::Hidden,
            scene_name: String::new(),
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading { .. })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active(&self) -> Option<&ActiveScene> {
        self.active.as_ref()
    }

    pub fn current_scene(&self) -> Option<&SceneId> {
        self.active.as_ref().map(|a| &a.id)
    }

    pub fn hotspots(&self) -> &HotspotRegistry {
        &self.hotspots
    }

    pub fn face_hotspots(&mut self, camera_position: Vec3) {
        self.hotspots.face_camera(camera_position);
    }

    pub fn indicator(&self) -> &Indicator {
        &self.indicator
    }

    pub fn scene_name(&self) -> &str {
        &self.scene_name
    }

    pub fn style(&self) -> HotspotStyle {
        self.style
    }

    // 只影响之后创建的热点
    pub fn set_style(&mut self, style: HotspotStyle) {
        self.style = style;
    }

    /// Begins a transition to `id` and returns the image request to dispatch.
    ///
    /// The view jumps to the target's initial angles immediately. A load that
    /// is already in flight is superseded: its outcome will be reported as
    /// [`Completion::Stale`].
    pub fn load(
        &mut self,
        catalog: &SceneCatalog,
        id: &SceneId,
        orientation: &mut OrientationModel,
    ) -> Result<LoadRequest, ConfigurationError> {
        let record = catalog
            .get(id)
            .ok_or_else(|| ConfigurationError::UnknownScene(id.clone()))?;

        self.generation += 1;
        // 连续切换时保留第一次切换前的视角
        if !self.is_loading() {
            self.rollback = Some(orientation.snapshot());
        }
        orientation.reset_to(record.initial_view);

        self.state = LoadState::Loading {
            generation: self.generation,
            scene: record.id.clone(),
            image_ref: record.image_ref.clone(),
            started: Instant::now(),
        };
        self.indicator = Indicator::Loading;
        self.scene_name = record.display_name.clone();

        log::info!(
            "{}",
            crate::i18n::tr_with(
                "log.scene_requested",
                &[
                    ("scene", record.id.to_string()),
                    ("generation", self.generation.to_string())
                ]
            )
        );

        Ok(LoadRequest {
            generation: self.generation,
            scene: record.id.clone(),
            image_ref: record.image_ref.clone(),
        })
    }

    /// Applies an image outcome. Success swaps panorama and hotspots in one step.
    pub fn complete(
        &mut self,
        catalog: &SceneCatalog,
        outcome: LoadOutcome,
        orientation: &mut OrientationModel,
    ) -> Completion {
        let current = match &self.state {
            LoadState::Loading { generation, .. } => *generation,
            _ => 0,
        };
        if current == 0 || outcome.generation != current {
            log::debug!(
                "{}",
                crate::i18n::tr_with(
                    "log.stale_completion",
                    &[
                        ("scene", outcome.scene.to_string()),
                        ("generation", outcome.generation.to_string())
                    ]
                )
            );
            return Completion::Stale;
        }

        let image = match outcome.result {
            Ok(image) => image,
            Err(err) => {
                self.fail(outcome.scene, &err, orientation);
                return Completion::Failed;
            }
        };
        let Some(record) = catalog.get(&outcome.scene) else {
            // 目录在加载期间被替换
            let err = ConfigurationError::UnknownScene(outcome.scene.clone());
            self.fail(outcome.scene, &err, orientation);
            return Completion::Failed;
        };

        let previous = self.active.take();
        let released = self.hotspots.clear();
        drop(previous);

        self.active = Some(ActiveScene {
            id: record.id.clone(),
            display_name: record.display_name.clone(),
            panorama: image,
            revision: outcome.generation,
        });
        self.hotspots
            .create_all(&record.hotspots, &record.id, self.style);
        self.state = LoadState::Idle;
        self.indicator = Indicator::Hidden;
        self.scene_name = record.display_name.clone();
        self.rollback = None;

        log::info!(
            "{}",
            crate::i18n::tr_with(
                "log.scene_loaded",
                &[
                    ("name", record.display_name.clone()),
                    ("count", self.hotspots.len().to_string()),
                    ("released", released.to_string())
                ]
            )
        );
        Completion::Applied
    }

    /// Fails a load that has been pending longer than the configured timeout.
    pub fn expire(&mut self, now: Instant, orientation: &mut OrientationModel) -> bool {
        let Some(timeout) = self.timeout else {
            return false;
        };
        let LoadState::Loading {
            scene,
            image_ref,
            started,
            ..
        } = &self.state
        else {
            return false;
        };
        if now.saturating_duration_since(*started) < timeout {
            return false;
        }

        let err = AssetLoadError::TimedOut {
            path: image_ref.clone(),
            after: timeout,
        };
        let scene = scene.clone();
        self.fail(scene, &err, orientation);
        true
    }

    pub fn dismiss_failure(&mut self) {
        if let LoadState::Failed { .. } = self.state {
            self.state = LoadState::Idle;
            self.indicator = Indicator::Hidden;
        }
    }

    // 失败时回滚视角与场景名，当前场景的全景和热点保持不变
    fn fail(
        &mut self,
        scene: SceneId,
        err: &dyn std::error::Error,
        orientation: &mut OrientationModel,
    ) {
        log::error!(
            "{}",
            crate::i18n::tr_with(
                "error.scene_load_failed",
                &[("scene", scene.to_string()), ("err", err.to_string())]
            )
        );
        if let Some(snapshot) = self.rollback.take() {
            orientation.restore(snapshot);
        }
        self.scene_name = self
            .active
            .as_ref()
            .map(|a| a.display_name.clone())
            .unwrap_or_default();
        let message = err.to_string();
        self.indicator = Indicator::Failed(message.clone());
        self.state = LoadState::Failed { scene, message };
    }
}
