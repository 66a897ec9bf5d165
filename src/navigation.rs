// navigation.rs — 顶层控制器：输入事件 → 视角 / 点击 → 场景切换

use std::time::{Duration, Instant};

use glam::Vec2;

use crate::asset::{AssetFetcher, LoadOutcome};
use crate::catalog::{SceneId, Tour};
use crate::error::ConfigurationError;
use crate::hotspot::{HotspotInstance, HotspotStyle};
use crate::input::{hit_test, ClickKind, InputDisambiguator};
use crate::loader::{Completion, SceneLoader};
use crate::orientation::{OrientationModel, ViewCamera};

#[derive(Debug, Clone, Default)]
pub struct ControllerSettings {
    pub auto_rotate: bool,
    pub load_timeout: Option<Duration>,
    pub hotspot_style: Option<HotspotStyle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    pub current_scene: Option<SceneId>,
    pub is_dragging: bool,
    pub auto_rotate: bool,
}

#[derive(Debug)]
pub struct ViewerState {
    pub orientation: OrientationModel,
    pub input: InputDisambiguator,
    pub loader: SceneLoader,
    pub auto_rotate: bool,
    pub viewport: Vec2,
    pub cursor: Option<Vec2>,
}

pub struct NavigationController {
    tour: Tour,
    state: ViewerState,
    fetcher: Box<dyn AssetFetcher>,
    settings: ControllerSettings,
}

impl NavigationController {
    pub fn new(tour: Tour, fetcher: Box<dyn AssetFetcher>, settings: ControllerSettings) -> Self {
        let style = settings.hotspot_style.unwrap_or(tour.hotspot_style);
        let state = ViewerState {
            orientation: OrientationModel::new(),
            input: InputDisambiguator::new(),
            loader: SceneLoader::new(style, settings.load_timeout),
            auto_rotate: settings.auto_rotate,
            viewport: Vec2::new(1280.0, 720.0),
            cursor: None,
        };
        Self {
            tour,
            state,
            fetcher,
            settings,
        }
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn orientation(&self) -> &OrientationModel {
        &self.state.orientation
    }

    pub fn loader(&self) -> &SceneLoader {
        &self.state.loader
    }

    pub fn navigation_state(&self) -> NavigationState {
        NavigationState {
            current_scene: self.state.loader.current_scene().cloned(),
            is_dragging: self.state.orientation.is_dragging(),
            auto_rotate: self.state.auto_rotate,
        }
    }

    pub fn camera(&self) -> ViewCamera {
        let aspect = if self.state.viewport.y > 0.0 {
            self.state.viewport.x / self.state.viewport.y
        } else {
            1.0
        };
        self.state.orientation.camera(aspect)
    }

    pub fn start(&mut self) -> Result<(), ConfigurationError> {
        let start = self.tour.start.clone();
        self.load(&start)
    }

    /// Starts a transition. Unknown ids are logged and leave everything untouched.
    pub fn load(&mut self, id: &SceneId) -> Result<(), ConfigurationError> {
        let state = &mut self.state;
        match state.loader.load(&self.tour.catalog, id, &mut state.orientation) {
            Ok(request) => {
                self.fetcher.fetch(request);
                Ok(())
            }
            Err(err) => {
                log::error!(
                    "{}",
                    crate::i18n::tr_with("error.scene_not_found", &[("scene", id.to_string())])
                );
                Err(err)
            }
        }
    }

    pub fn receive(&mut self, outcome: LoadOutcome) -> Completion {
        let state = &mut self.state;
        state
            .loader
            .complete(&self.tour.catalog, outcome, &mut state.orientation)
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        let state = &mut self.state;
        state.input.pointer_down(x, y, &mut state.orientation);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let state = &mut self.state;
        state.cursor = Some(Vec2::new(x, y));
        state.input.pointer_move(x, y, &mut state.orientation);
    }

    pub fn pointer_up(&mut self) {
        let state = &mut self.state;
        state.input.pointer_up(&mut state.orientation);
    }

    // 命中热点时返回目标场景
    pub fn click(&mut self, x: f32, y: f32) -> Option<SceneId> {
        if self.state.input.classify_click(x, y) == ClickKind::Drag {
            log::debug!("{}", crate::i18n::tr("log.click_was_drag"));
            return None;
        }

        let target = self.hotspot_at(Vec2::new(x, y))?.target.clone();
        log::info!(
            "{}",
            crate::i18n::tr_with("log.hotspot_clicked", &[("scene", target.to_string())])
        );
        self.load(&target).ok().map(|()| target)
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.state.orientation.zoom(delta_y);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.state.viewport = Vec2::new(width, height);
        }
    }

    // 每帧绘制前调用一次
    pub fn tick(&mut self, now: Instant) {
        let state = &mut self.state;
        state.orientation.tick(state.auto_rotate);
        state.loader.expire(now, &mut state.orientation);
        state.loader.face_hotspots(ViewCamera::POSITION);
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.state.auto_rotate = !self.state.auto_rotate;
        log::info!(
            "{}",
            crate::i18n::tr_with(
                "log.auto_rotate",
                &[("state", if self.state.auto_rotate { "on" } else { "off" }.to_string())]
            )
        );
        self.state.auto_rotate
    }

    pub fn switch_room(&mut self) -> Option<SceneId> {
        let target = self
            .tour
            .quick_switch_target(self.state.loader.current_scene())?
            .clone();
        self.load(&target).ok().map(|()| target)
    }

    pub fn return_to_lobby(&mut self) -> Option<SceneId> {
        let lobby = self.tour.lobby.clone()?;
        self.load(&lobby).ok().map(|()| lobby)
    }

    pub fn reset_view(&mut self) {
        let view = self
            .state
            .loader
            .current_scene()
            .and_then(|id| self.tour.catalog.get(id))
            .map(|record| record.initial_view)
            .unwrap_or_default();
        self.state.orientation.reset_to(view);
    }

    pub fn dismiss_failure(&mut self) {
        self.state.loader.dismiss_failure();
    }

    /// Swaps in a different tour and loads its start scene.
    pub fn replace_tour(&mut self, tour: Tour) -> Result<(), ConfigurationError> {
        let style = self.settings.hotspot_style.unwrap_or(tour.hotspot_style);
        // 旧场景保持可见，直到新导览的起始场景载入完成
        self.state.loader.set_style(style);
        self.tour = tour;
        self.start()
    }

    pub fn hovered(&self) -> Option<&HotspotInstance> {
        if self.state.orientation.is_dragging() {
            return None;
        }
        self.hotspot_at(self.state.cursor?)
    }

    fn hotspot_at(&self, pixel: Vec2) -> Option<&HotspotInstance> {
        let viewport = self.state.viewport;
        let ndc = ViewCamera::ndc_from_pixel(pixel.x, pixel.y, viewport.x, viewport.y);
        hit_test(&self.camera(), ndc, self.state.loader.hotspots())
    }
}
