// hotspot.rs — 当前场景的可点击热点

use std::fmt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::catalog::{HotspotDescriptor, SceneId};
use crate::input::{ray_quad, ray_sphere};

/// World size of a labeled plane for a descriptor of size 30.
const PLANE_SIZE_AT_30: Vec2 = Vec2::new(80.0, 40.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HotspotStyle {
    // 面向相机的文字面板
    #[default]
    LabeledPlane,
    // 脉动光点
    PulsingMarker,
}

impl HotspotStyle {
    pub fn visual(self, size: f32) -> Box<dyn HotspotVisual> {
        match self {
            HotspotStyle::LabeledPlane => Box::new(LabeledPlane {
                extent: PLANE_SIZE_AT_30 * (size / 30.0),
            }),
            HotspotStyle::PulsingMarker => Box::new(PulsingMarker { radius: size * 0.5 }),
        }
    }
}

/// Shape-specific behaviour shared by every hotspot look.
pub trait HotspotVisual: fmt::Debug {
    fn style(&self) -> HotspotStyle;

    fn extent(&self) -> Vec2;

    /// Ray parameter of the nearest hit on a visual centred at `center`,
    /// oriented so its front faces along `facing`.
    fn intersect(&self, center: Vec3, facing: Vec3, origin: Vec3, dir: Vec3) -> Option<f32>;
}

#[derive(Debug, Clone, Copy)]
pub struct LabeledPlane {
    extent: Vec2,
}

impl HotspotVisual for LabeledPlane {
    fn style(&self) -> HotspotStyle {
        HotspotStyle::LabeledPlane
    }

    fn extent(&self) -> Vec2 {
        self.extent
    }

    fn intersect(&self, center: Vec3, facing: Vec3, origin: Vec3, dir: Vec3) -> Option<f32> {
        ray_quad(origin, dir, center, facing, self.extent * 0.5)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PulsingMarker {
    radius: f32,
}

impl PulsingMarker {
    /// Scale factor of the glow at `seconds` since the scene appeared.
    pub fn pulse(seconds: f32) -> f32 {
        1.0 + 0.15 * (seconds * std::f32::consts::TAU * 0.8).sin()
    }
}

impl HotspotVisual for PulsingMarker {
    fn style(&self) -> HotspotStyle {
        HotspotStyle::PulsingMarker
    }

    fn extent(&self) -> Vec2 {
        Vec2::splat(self.radius * 2.0)
    }

    fn intersect(&self, center: Vec3, _facing: Vec3, origin: Vec3, dir: Vec3) -> Option<f32> {
        ray_sphere(origin, dir, center, self.radius)
    }
}

#[derive(Debug)]
pub struct HotspotInstance {
    pub target: SceneId,
    pub label: String,
    pub position: Vec3,
    facing: Vec3,
    visual: Box<dyn HotspotVisual>,
}

impl HotspotInstance {
    fn new(descriptor: &HotspotDescriptor, style: HotspotStyle) -> Self {
        let mut instance = Self {
            target: descriptor.target.clone(),
            label: descriptor.label.clone(),
            position: descriptor.position,
            facing: Vec3::Z,
            visual: style.visual(descriptor.size),
        };
        instance.face(Vec3::ZERO);
        instance
    }

    fn face(&mut self, camera_position: Vec3) {
        self.facing = (camera_position - self.position).normalize_or(self.facing);
    }

    pub fn facing(&self) -> Vec3 {
        self.facing
    }

    pub fn visual(&self) -> &dyn HotspotVisual {
        self.visual.as_ref()
    }

    pub fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        self.visual
            .intersect(self.position, self.facing, origin, dir)
    }
}

/// Live hotspots of the loaded scene. At most one scene's set exists at a time.
#[derive(Debug, Default)]
pub struct HotspotRegistry {
    scene: Option<SceneId>,
    instances: Vec<HotspotInstance>,
}

impl HotspotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // 返回释放的数量
    pub fn clear(&mut self) -> usize {
        let released = self.instances.len();
        self.instances.clear();
        self.scene = None;
        released
    }

    /// Builds one instance per descriptor, in declaration order.
    ///
    /// Any set left over from a previous scene is released first.
    pub fn create_all(
        &mut self,
        descriptors: &[HotspotDescriptor],
        scene: &SceneId,
        style: HotspotStyle,
    ) {
        if !self.instances.is_empty() {
            log::warn!(
                "hotspots of {:?} were still live when creating {scene}'s",
                self.scene
            );
            self.clear();
        }
        self.instances
            .extend(descriptors.iter().map(|d| HotspotInstance::new(d, style)));
        self.scene = Some(scene.clone());
    }

    pub fn face_camera(&mut self, camera_position: Vec3) {
        for instance in &mut self.instances {
            instance.face(camera_position);
        }
    }

    pub fn all(&self) -> &[HotspotInstance] {
        &self.instances
    }

    pub fn scene(&self) -> Option<&SceneId> {
        self.scene.as_ref()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn pick(&self, origin: Vec3, dir: Vec3) -> Option<&HotspotInstance> {
        self.instances
            .iter()
            .filter_map(|h| h.intersect(origin, dir).map(|t| (t, h)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, h)| h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(target: &str, position: Vec3, label: &str) -> HotspotDescriptor {
        HotspotDescriptor {
            target: target.into(),
            position,
            label: label.to_string(),
            size: 30.0,
        }
    }

    fn lobby_descriptors() -> Vec<HotspotDescriptor> {
        vec![
            descriptor("ktv", Vec3::new(-100.0, -20.0, -250.0), "房間1"),
            descriptor("lobby", Vec3::new(200.0, -20.0, 0.0), "回大廳"),
            descriptor("aisle", Vec3::new(-100.0, -20.0, 10.0), "廊道1"),
        ]
    }

    #[test]
    fn create_all_keeps_declaration_order() {
        let mut reg = HotspotRegistry::new();
        reg.create_all(&lobby_descriptors(), &"lobby2".into(), HotspotStyle::LabeledPlane);
        let labels: Vec<_> = reg.all().iter().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, ["房間1", "回大廳", "廊道1"]);
        let targets: Vec<_> = reg.all().iter().map(|h| h.target.as_str()).collect();
        assert_eq!(targets, ["ktv", "lobby", "aisle"]);
        assert_eq!(reg.scene(), Some(&SceneId::from("lobby2")));
    }

    #[test]
    fn clear_empties_registry() {
        let mut reg = HotspotRegistry::new();
        reg.create_all(&lobby_descriptors(), &"lobby2".into(), HotspotStyle::PulsingMarker);
        assert_eq!(reg.clear(), 3);
        assert!(reg.all().is_empty());
        assert!(reg.scene().is_none());
    }

    #[test]
    fn create_all_never_accumulates() {
        let mut reg = HotspotRegistry::new();
        reg.create_all(&lobby_descriptors(), &"lobby2".into(), HotspotStyle::LabeledPlane);
        reg.create_all(
            &[descriptor("lobby2", Vec3::new(-200.0, -20.0, 0.0), "梯廳")],
            &"lobby".into(),
            HotspotStyle::LabeledPlane,
        );
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.all()[0].label, "梯廳");
    }

    #[test]
    fn instances_face_the_camera() {
        let mut reg = HotspotRegistry::new();
        reg.create_all(&lobby_descriptors(), &"lobby2".into(), HotspotStyle::LabeledPlane);
        for h in reg.all() {
            let expected = (-h.position).normalize();
            assert!(h.facing().abs_diff_eq(expected, 1e-5));
        }

        let eye = Vec3::new(0.0, 0.0, 0.1);
        reg.face_camera(eye);
        let h = &reg.all()[1];
        assert!(h.facing().abs_diff_eq((eye - h.position).normalize(), 1e-5));
    }

    #[test]
    fn pick_returns_nearest_hit() {
        let mut reg = HotspotRegistry::new();
        reg.create_all(
            &[
                descriptor("far", Vec3::new(-300.0, 0.0, 0.0), "far"),
                descriptor("near", Vec3::new(-100.0, 0.0, 0.0), "near"),
            ],
            &"a".into(),
            HotspotStyle::LabeledPlane,
        );
        let hit = reg.pick(Vec3::ZERO, Vec3::NEG_X).unwrap();
        assert_eq!(hit.target.as_str(), "near");
        assert!(reg.pick(Vec3::ZERO, Vec3::X).is_none());
    }

    #[test]
    fn plane_and_marker_have_distinct_footprints() {
        let plane = HotspotStyle::LabeledPlane.visual(30.0);
        assert_eq!(plane.extent(), Vec2::new(80.0, 40.0));
        let marker = HotspotStyle::PulsingMarker.visual(30.0);
        assert_eq!(marker.extent(), Vec2::splat(30.0));

        // 偏离中心 30 单位：平面（半宽 40）命中，球（半径 15）不命中
        let center = Vec3::new(-200.0, 0.0, 0.0);
        let facing = Vec3::X;
        let dir = (Vec3::new(-200.0, 0.0, 30.0)).normalize();
        assert!(plane.intersect(center, facing, Vec3::ZERO, dir).is_some());
        assert!(marker.intersect(center, facing, Vec3::ZERO, dir).is_none());
    }
}
