// input.rs — 拖拽 / 点击判定与射线求交

use glam::{Vec2, Vec3};

use crate::hotspot::{HotspotInstance, HotspotRegistry};
use crate::orientation::{OrientationModel, ViewCamera};

/// Pointer travel (per axis, in pixels) above which a click counts as a drag.
pub const CLICK_THRESHOLD: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Click,
    Drag,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressState {
    Idle,
    PressedPending { press: Vec2 },
}

/// Splits pointer activity into orientation drags and hotspot clicks.
///
/// The windowing system delivers the click separately from the release, so
/// the press position outlives the press itself and is used to classify the
/// click after the fact.
#[derive(Debug, Clone)]
pub struct InputDisambiguator {
    state: PressState,
    last_press: Option<Vec2>,
}

impl Default for InputDisambiguator {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDisambiguator {
    pub fn new() -> Self {
        Self {
            state: PressState::Idle,
            last_press: None,
        }
    }

    pub fn state(&self) -> PressState {
        self.state
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, orientation: &mut OrientationModel) {
        let press = Vec2::new(x, y);
        self.state = PressState::PressedPending { press };
        self.last_press = Some(press);
        orientation.begin_drag(x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, orientation: &mut OrientationModel) {
        if let PressState::PressedPending { .. } = self.state {
            orientation.update_drag(x, y);
        }
    }

    pub fn pointer_up(&mut self, orientation: &mut OrientationModel) {
        self.state = PressState::Idle;
        orientation.end_drag();
    }

    /// Classifies a click at `(x, y)` against the last press position.
    pub fn classify_click(&self, x: f32, y: f32) -> ClickKind {
        let Some(press) = self.last_press else {
            return ClickKind::Click;
        };
        let delta = (Vec2::new(x, y) - press).abs();
        if delta.x > CLICK_THRESHOLD || delta.y > CLICK_THRESHOLD {
            ClickKind::Drag
        } else {
            ClickKind::Click
        }
    }
}

/// Casts a ray from the camera through `ndc` and returns the nearest hotspot.
pub fn hit_test<'a>(
    camera: &ViewCamera,
    ndc: Vec2,
    hotspots: &'a HotspotRegistry,
) -> Option<&'a HotspotInstance> {
    hotspots.pick(ViewCamera::POSITION, camera.ray(ndc))
}

#[inline]
pub fn ray_sphere(ray_origin: Vec3, ray_dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// Ray against a rectangle centred at `center` with front normal `normal`.
///
/// The rectangle's horizontal axis stays level (perpendicular to world Y),
/// as for a billboard turned toward the viewer. Both faces are hittable.
#[inline]
pub fn ray_quad(
    ray_origin: Vec3,
    ray_dir: Vec3,
    center: Vec3,
    normal: Vec3,
    half_extent: Vec2,
) -> Option<f32> {
    let denom = ray_dir.dot(normal);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (center - ray_origin).dot(normal) / denom;
    if t < 0.0 {
        return None;
    }

    let axis_x = Vec3::Y.cross(normal).normalize_or(Vec3::X);
    let axis_y = normal.cross(axis_x);
    let local = ray_origin + ray_dir * t - center;
    let inside = local.dot(axis_x).abs() <= half_extent.x && local.dot(axis_y).abs() <= half_extent.y;
    inside.then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{HotspotDescriptor, ViewAngles};
    use crate::hotspot::HotspotStyle;

    #[test]
    fn press_move_release_drives_orientation() {
        let mut input = InputDisambiguator::new();
        let mut o = OrientationModel::new();

        input.pointer_move(50.0, 50.0, &mut o);
        assert_eq!(o.yaw(), 0.0);

        input.pointer_down(100.0, 100.0, &mut o);
        assert!(o.is_dragging());
        assert!(matches!(input.state(), PressState::PressedPending { .. }));
        input.pointer_move(80.0, 100.0, &mut o);
        assert!((o.yaw() - 2.0).abs() < 1e-4);

        input.pointer_up(&mut o);
        assert_eq!(input.state(), PressState::Idle);
        assert!(!o.is_dragging());
        input.pointer_move(0.0, 0.0, &mut o);
        assert!((o.yaw() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn click_threshold_is_inclusive() {
        let mut input = InputDisambiguator::new();
        let mut o = OrientationModel::new();
        input.pointer_down(200.0, 200.0, &mut o);
        input.pointer_up(&mut o);

        assert_eq!(input.classify_click(200.0, 200.0), ClickKind::Click);
        assert_eq!(input.classify_click(205.0, 195.0), ClickKind::Click);
        assert_eq!(input.classify_click(205.5, 200.0), ClickKind::Drag);
        assert_eq!(input.classify_click(200.0, 193.0), ClickKind::Drag);
    }

    #[test]
    fn click_without_press_is_a_click() {
        let input = InputDisambiguator::new();
        assert_eq!(input.classify_click(999.0, 999.0), ClickKind::Click);
    }

    #[test]
    fn ray_sphere_hits_front_surface() {
        let t = ray_sphere(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, 5.0), 2.0).unwrap();
        assert!((t - 3.0).abs() < 1e-5);
        assert!(ray_sphere(Vec3::ZERO, Vec3::X, Vec3::new(0.0, 0.0, 5.0), 2.0).is_none());
        assert!(ray_sphere(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, 5.0), 2.0).is_none());
    }

    #[test]
    fn ray_quad_respects_extent() {
        let center = Vec3::new(0.0, 0.0, -100.0);
        let normal = Vec3::Z;
        let half = Vec2::new(40.0, 20.0);
        let t = ray_quad(Vec3::ZERO, Vec3::NEG_Z, center, normal, half).unwrap();
        assert!((t - 100.0).abs() < 1e-4);

        let inside = Vec3::new(39.0, 19.0, -100.0).normalize();
        assert!(ray_quad(Vec3::ZERO, inside, center, normal, half).is_some());
        let outside = Vec3::new(0.0, 21.0, -100.0).normalize();
        assert!(ray_quad(Vec3::ZERO, outside, center, normal, half).is_none());
        assert!(ray_quad(Vec3::ZERO, Vec3::X, center, normal, half).is_none());
    }

    #[test]
    fn hit_test_through_screen_center() {
        let position = Vec3::new(-200.0, 25.0, -35.0);
        let mut registry = HotspotRegistry::new();
        registry.create_all(
            &[HotspotDescriptor {
                target: "ktv2".into(),
                position,
                label: "房間2".to_string(),
                size: 30.0,
            }],
            &"ktv".into(),
            HotspotStyle::LabeledPlane,
        );

        let mut o = OrientationModel::new();
        o.reset_to(ViewAngles::toward(position));
        let camera = o.camera(16.0 / 9.0);
        let hit = hit_test(&camera, Vec2::ZERO, &registry).unwrap();
        assert_eq!(hit.target.as_str(), "ktv2");

        // 看向反方向则无命中
        o.reset_to(ViewAngles::toward(-position));
        let camera = o.camera(16.0 / 9.0);
        assert!(hit_test(&camera, Vec2::ZERO, &registry).is_none());
    }
}
