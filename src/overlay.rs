// overlay.rs — 用 egui 在全景上叠加热点（文字面板 / 脉动光点）

use egui::{Align2, Color32, FontId, LayerId, Order, Pos2, Rect, Stroke, Vec2 as UiVec2};
use glam::Vec2;
use tour_viewer::hotspot::{HotspotInstance, HotspotStyle, PulsingMarker};
use tour_viewer::orientation::ViewCamera;
use tour_viewer::NavigationController;

const LABEL_GREEN: Color32 = Color32::from_rgba_premultiplied(0, 230, 0, 230);
const MARKER_CYAN: [u8; 3] = [0, 255, 170];

/// Where a hotspot lands on screen, in egui points.
struct Placement {
    center: Pos2,
    size: UiVec2,
}

fn place(camera: &ViewCamera, hotspot: &HotspotInstance, viewport: Vec2, ppp: f32) -> Option<Placement> {
    let ndc = camera.project(hotspot.position)?;
    let depth = (hotspot.position - ViewCamera::POSITION).dot(camera.forward);
    let px_per_unit = camera.pixels_per_unit(depth, viewport.y);
    let extent = hotspot.visual().extent() * px_per_unit / ppp;

    let x = (ndc.x + 1.0) * 0.5 * viewport.x / ppp;
    let y = (1.0 - ndc.y) * 0.5 * viewport.y / ppp;
    Some(Placement {
        center: Pos2::new(x, y),
        size: UiVec2::new(extent.x, extent.y),
    })
}

pub fn paint_hotspots(ctx: &egui::Context, controller: &NavigationController, seconds: f32) {
    let painter = ctx.layer_painter(LayerId::new(Order::Background, egui::Id::new("hotspots")));
    let ppp = ctx.pixels_per_point();
    let camera = controller.camera();
    let viewport = controller.state().viewport;
    let hovered = controller.hovered();

    for hotspot in controller.loader().hotspots().all() {
        let Some(at) = place(&camera, hotspot, viewport, ppp) else {
            continue;
        };
        let is_hovered = hovered.is_some_and(|h| std::ptr::eq(h, hotspot));

        match hotspot.visual().style() {
            HotspotStyle::LabeledPlane => {
                let rect = Rect::from_center_size(at.center, at.size);
                let backing = if is_hovered { 110 } else { 45 };
                painter.rect_filled(rect, 6.0, Color32::from_black_alpha(backing));
                if is_hovered {
                    painter.rect_stroke(rect, 6.0, Stroke::new(2.0, LABEL_GREEN));
                }
                painter.text(
                    at.center,
                    Align2::CENTER_CENTER,
                    &hotspot.label,
                    FontId::proportional((at.size.y * 0.45).max(8.0)),
                    LABEL_GREEN,
                );
            }
            HotspotStyle::PulsingMarker => {
                let [r, g, b] = MARKER_CYAN;
                let radius = at.size.x * 0.5 * PulsingMarker::pulse(seconds);
                for ring in (1..=3u8).rev() {
                    let alpha = (if is_hovered { 140 } else { 90 }) / ring;
                    painter.circle_filled(
                        at.center,
                        radius * (1.0 + 0.35 * f32::from(ring)),
                        Color32::from_rgba_unmultiplied(r, g, b, alpha),
                    );
                }
                painter.circle_filled(at.center, radius, Color32::from_rgb(r, g, b));
                painter.text(
                    at.center + UiVec2::new(0.0, radius * 2.0 + 4.0),
                    Align2::CENTER_TOP,
                    &hotspot.label,
                    FontId::proportional(16.0),
                    Color32::WHITE,
                );
            }
        }
    }
}
