// orientation.rs — 视角参数：拖拽、缩放、自动旋转与相机朝向

use glam::{Vec2, Vec3};

use crate::catalog::ViewAngles;

/// Degrees of yaw/pitch per pixel of pointer travel.
pub const DRAG_SENSITIVITY: f32 = 0.1;
/// Degrees of field of view per unit of wheel `deltaY`.
pub const ZOOM_SENSITIVITY: f32 = 0.05;
pub const MIN_FOV: f32 = 80.0;
pub const MAX_FOV: f32 = 120.0;
/// Field of view every scene load starts from.
pub const DEFAULT_FOV: f32 = 80.0;
pub const PITCH_LIMIT: f32 = 85.0;
/// Yaw added per render tick while auto-rotating.
pub const AUTO_ROTATE_STEP: f32 = 0.1;
/// Radius of the panorama sphere; hotspot positions live in the same units.
pub const SPHERE_RADIUS: f32 = 500.0;

/// Folds an angle in degrees into [-180, 180).
pub fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct DragAnchor {
    yaw: f32,
    pitch: f32,
    pointer: Vec2,
}

/// Saved yaw/pitch/fov, used to undo a view reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSnapshot {
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
}

#[derive(Debug, Clone)]
pub struct OrientationModel {
    yaw: f32,
    pitch: f32,
    fov: f32,
    dragging: bool,
    anchor: DragAnchor,
}

impl Default for OrientationModel {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationModel {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov: DEFAULT_FOV,
            dragging: false,
            anchor: DragAnchor::default(),
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn begin_drag(&mut self, pointer_x: f32, pointer_y: f32) {
        self.anchor = DragAnchor {
            yaw: self.yaw,
            pitch: self.pitch,
            pointer: Vec2::new(pointer_x, pointer_y),
        };
        self.dragging = true;
    }

    /// 相对按下点的位移换算角度（不是逐帧累加）
    pub fn update_drag(&mut self, pointer_x: f32, pointer_y: f32) {
        if !self.dragging {
            return;
        }
        self.yaw = wrap_degrees(
            self.anchor.yaw + (self.anchor.pointer.x - pointer_x) * DRAG_SENSITIVITY,
        );
        self.pitch = self.anchor.pitch + (pointer_y - self.anchor.pointer.y) * DRAG_SENSITIVITY;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    pub fn zoom(&mut self, delta_y: f32) {
        self.fov = (self.fov + delta_y * ZOOM_SENSITIVITY).clamp(MIN_FOV, MAX_FOV);
    }

    /// Per-frame step: auto-rotate, then fold pitch back into range.
    pub fn tick(&mut self, auto_rotate: bool) {
        if auto_rotate && !self.dragging {
            // 不回绕的话 f32 yaw 变大后步长会被舍入吞掉
            self.yaw = wrap_degrees(self.yaw + AUTO_ROTATE_STEP);
        }
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Jumps to a scene's initial view with the default field of view.
    pub fn reset_to(&mut self, view: ViewAngles) {
        self.yaw = view.yaw;
        self.pitch = view.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.fov = DEFAULT_FOV;
        self.reanchor();
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            yaw: self.yaw,
            pitch: self.pitch,
            fov: self.fov,
        }
    }

    pub fn restore(&mut self, snapshot: ViewSnapshot) {
        self.yaw = snapshot.yaw;
        self.pitch = snapshot.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.fov = snapshot.fov.clamp(MIN_FOV, MAX_FOV);
        self.reanchor();
    }

    // 进行中的拖拽以新视角为锚点继续
    fn reanchor(&mut self) {
        if self.dragging {
            self.anchor.yaw = self.yaw;
            self.anchor.pitch = self.pitch;
        }
    }

    /// Point on the panorama sphere the camera looks at.
    ///
    /// Polar angle is `90° - pitch`, azimuth is `yaw`; y is up.
    pub fn look_direction(&self) -> Vec3 {
        let pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let phi = (90.0 - pitch).to_radians();
        let theta = self.yaw.to_radians();

        Vec3::new(
            SPHERE_RADIUS * phi.sin() * theta.cos(),
            SPHERE_RADIUS * phi.cos(),
            SPHERE_RADIUS * phi.sin() * theta.sin(),
        )
    }

    pub fn camera(&self, aspect: f32) -> ViewCamera {
        ViewCamera::new(self.look_direction(), self.fov, aspect)
    }
}

/// Camera sitting at the sphere center, derived once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCamera {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
}

impl ViewCamera {
    pub const POSITION: Vec3 = Vec3::ZERO;
    const NEAR: f32 = 1.0;

    pub fn new(target: Vec3, fov: f32, aspect: f32) -> Self {
        let forward = target.normalize_or(Vec3::X);
        // pitch 被限制在 ±85°，forward 不会与 Y 轴平行
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::Z);
        let up = right.cross(forward);
        Self {
            forward,
            right,
            up,
            fov,
            aspect: if aspect > 0.0 { aspect } else { 1.0 },
        }
    }

    fn tan_half(&self) -> f32 {
        (self.fov.to_radians() * 0.5).tan()
    }

    /// Normalized device coordinates (x right, y up, both in [-1, 1]) of a pixel.
    pub fn ndc_from_pixel(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
        if width <= 0.0 || height <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(x / width * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
    }

    /// World-space direction of the ray through `ndc`.
    pub fn ray(&self, ndc: Vec2) -> Vec3 {
        let t = self.tan_half();
        (self.forward + self.right * (ndc.x * t * self.aspect) + self.up * (ndc.y * t)).normalize()
    }

    /// Projects a world point to NDC; `None` when it is behind the camera.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let rel = point - Self::POSITION;
        let depth = rel.dot(self.forward);
        if depth < Self::NEAR {
            return None;
        }
        let t = self.tan_half();
        Some(Vec2::new(
            rel.dot(self.right) / (depth * t * self.aspect),
            rel.dot(self.up) / (depth * t),
        ))
    }

    /// Screen pixels covered by one world unit at `depth`, for a viewport `height` px tall.
    pub fn pixels_per_unit(&self, depth: f32, height: f32) -> f32 {
        height / (2.0 * depth.max(Self::NEAR) * self.tan_half())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn drag_moves_relative_to_anchor() {
        let mut o = OrientationModel::new();
        o.reset_to(ViewAngles::new(180.0, 0.0));
        o.begin_drag(100.0, 100.0);
        o.update_drag(150.0, 80.0);
        assert!(approx(o.yaw(), 175.0));
        assert!(approx(o.pitch(), -2.0));
        // 第二次移动仍以按下点为基准
        o.update_drag(90.0, 100.0);
        assert!(approx(o.yaw(), -179.0));
        assert!(approx(o.pitch(), 0.0));
    }

    #[test]
    fn update_after_end_is_noop() {
        let mut o = OrientationModel::new();
        o.begin_drag(0.0, 0.0);
        o.update_drag(-30.0, 20.0);
        o.end_drag();
        let before = o.snapshot();
        o.update_drag(500.0, 500.0);
        assert_eq!(o.snapshot(), before);
        o.end_drag();
        assert!(!o.is_dragging());
    }

    #[test]
    fn zoom_clamps_fov() {
        let mut o = OrientationModel::new();
        o.zoom(10_000.0);
        assert_eq!(o.fov(), MAX_FOV);
        o.zoom(-10_000.0);
        assert_eq!(o.fov(), MIN_FOV);
        o.zoom(100.0);
        assert!(approx(o.fov(), 85.0));
    }

    #[test]
    fn tick_clamps_pitch_for_any_drag() {
        for dy in [-100_000.0, -851.0, -3.0, 0.0, 7.5, 849.0, 100_000.0] {
            let mut o = OrientationModel::new();
            o.begin_drag(0.0, 0.0);
            o.update_drag(dy, dy);
            o.tick(false);
            assert!((-PITCH_LIMIT..=PITCH_LIMIT).contains(&o.pitch()));
            assert!((MIN_FOV..=MAX_FOV).contains(&o.fov()));
        }
    }

    #[test]
    fn auto_rotate_pauses_while_dragging() {
        let mut o = OrientationModel::new();
        o.tick(true);
        o.tick(true);
        assert!(approx(o.yaw(), 2.0 * AUTO_ROTATE_STEP));

        o.begin_drag(10.0, 10.0);
        let yaw = o.yaw();
        o.tick(true);
        assert_eq!(o.yaw(), yaw);

        o.end_drag();
        o.tick(false);
        assert_eq!(o.yaw(), yaw);
    }

    #[test]
    fn auto_rotate_keeps_stepping_after_wrap() {
        let mut o = OrientationModel::new();
        o.reset_to(ViewAngles::new(179.95, 0.0));
        o.tick(true);
        assert!(approx(o.yaw(), -179.95));

        // 长时间拖拽后的大角度
        o.begin_drag(0.0, 0.0);
        o.update_drag(-30_000_000.0, 0.0);
        o.end_drag();
        assert!((-180.0..180.0).contains(&o.yaw()));
        let before = o.yaw();
        o.tick(true);
        assert!(approx(wrap_degrees(o.yaw() - before), AUTO_ROTATE_STEP));
    }

    #[test]
    fn restore_during_drag_moves_the_anchor() {
        let mut o = OrientationModel::new();
        o.reset_to(ViewAngles::new(20.0, 5.0));
        let saved = o.snapshot();
        o.begin_drag(100.0, 100.0);
        o.reset_to(ViewAngles::new(-115.0, 0.0));
        o.restore(saved);

        o.update_drag(101.0, 100.0);
        assert!(approx(o.yaw(), 19.9));
        assert!(approx(o.pitch(), 5.0));
    }

    #[test]
    fn look_direction_follows_yaw_and_pitch() {
        let mut o = OrientationModel::new();
        let d = o.look_direction();
        assert!(approx(d.x, SPHERE_RADIUS) && approx(d.y, 0.0) && approx(d.z, 0.0));

        o.reset_to(ViewAngles::new(90.0, 0.0));
        let d = o.look_direction();
        assert!(approx(d.z, SPHERE_RADIUS));

        o.reset_to(ViewAngles::new(0.0, 89.0));
        let d = o.look_direction();
        assert!(approx(d.y, SPHERE_RADIUS * 85f32.to_radians().sin()));
    }

    #[test]
    fn center_ray_matches_forward_and_projects_back() {
        let o = OrientationModel::new();
        let cam = o.camera(16.0 / 9.0);
        let ray = cam.ray(Vec2::ZERO);
        assert!(ray.abs_diff_eq(cam.forward, 1e-5));

        let p = cam.ray(Vec2::new(0.5, -0.25)) * 300.0;
        let ndc = cam.project(p).unwrap();
        assert!(ndc.abs_diff_eq(Vec2::new(0.5, -0.25), 1e-4));

        assert!(cam.project(-cam.forward * 100.0).is_none());
    }

    #[test]
    fn ndc_from_pixel_flips_y() {
        let ndc = ViewCamera::ndc_from_pixel(0.0, 0.0, 800.0, 600.0);
        assert_eq!(ndc, Vec2::new(-1.0, 1.0));
        let ndc = ViewCamera::ndc_from_pixel(400.0, 300.0, 800.0, 600.0);
        assert_eq!(ndc, Vec2::ZERO);
    }
}
