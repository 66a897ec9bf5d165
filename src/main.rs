// main.rs — 窗口、事件循环与界面：把输入交给 NavigationController，每帧绘制当前场景

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // 在 Release 模式下隐藏控制台窗口

mod fonts;
mod overlay;
mod renderer;

use renderer::Renderer;

use anyhow::Context;
use clap::Parser;
use tour_viewer::asset::ThreadedImageFetcher;
use tour_viewer::config::Args;
use tour_viewer::i18n::{self, tr, tr_with};
use tour_viewer::loader::Indicator;
use tour_viewer::{NavigationController, Tour};

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowBuilder},
};

use std::sync::Arc;
use std::time::Instant;

/// Browser-style wheel units per winit line step.
const WHEEL_LINE_PIXELS: f32 = 100.0;

/// Things the UI asked for during a frame, applied once the frame is drawn.
#[derive(Default)]
struct UiActions {
    switch_room: bool,
    toggle_auto_rotate: bool,
    return_to_lobby: bool,
    toggle_fullscreen: bool,
    reset_view: bool,
    dismiss_failure: bool,
    open_tour: bool,
    language: Option<String>,
    exit: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    i18n::init(args.lang.clone());
    let tour = args.resolve_tour().context("loading tour")?;

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(tr("app.title"))
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)
            .context("creating window")?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;

    let (fetcher, outcomes) = ThreadedImageFetcher::new(args.assets.clone());
    let mut controller =
        NavigationController::new(tour, Box::new(fetcher), args.controller_settings());
    controller.resize(renderer.size.width as f32, renderer.size.height as f32);
    // 起始场景已在 resolve_tour 中校验
    if let Err(err) = controller.start() {
        log::error!("{}", tr_with("error.tour_load_failed", &[("err", err.to_string())]));
    }

    let mut cursor = PhysicalPosition::new(0.0f64, 0.0f64);
    let mut is_fullscreen = false;
    let mut scene_shown_at = Instant::now();

    // FPS 计算
    let mut last_fps_time = Instant::now();
    let mut frame_count = 0u32;
    let mut fps = 0.0f32;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        // 图片解码结果只在两帧之间应用
        while let Ok(outcome) = outcomes.try_recv() {
            controller.receive(outcome);
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    // 松开落在按钮上时也要结束拖拽
                    if let WindowEvent::MouseInput {
                        state: ElementState::Released,
                        button: MouseButton::Left,
                        ..
                    } = event
                    {
                        controller.pointer_up();
                    }
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        controller.resize(new_size.width as f32, new_size.height as f32);
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                        controller.resize(new_inner_size.width as f32, new_inner_size.height as f32);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            let mut actions = UiActions::default();
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::F11) => actions.toggle_fullscreen = true,
                                Some(VirtualKeyCode::Space) => actions.toggle_auto_rotate = true,
                                Some(VirtualKeyCode::Home) => actions.return_to_lobby = true,
                                Some(VirtualKeyCode::Tab) => actions.switch_room = true,
                                Some(VirtualKeyCode::R) => actions.reset_view = true,
                                Some(VirtualKeyCode::O) => actions.open_tour = true,
                                _ => {}
                            }
                            apply_actions(actions, &mut controller, &window, &mut is_fullscreen, control_flow);
                        }
                    }

                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => {
                        let (x, y) = (cursor.x as f32, cursor.y as f32);
                        match state {
                            ElementState::Pressed => controller.pointer_down(x, y),
                            ElementState::Released => {
                                controller.pointer_up();
                                // winit 没有 click 事件：松开即视为一次点击
                                controller.click(x, y);
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = position;
                        controller.pointer_move(position.x as f32, position.y as f32);
                    }

                    WindowEvent::CursorLeft { .. } => {
                        controller.pointer_up();
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        // 换算成浏览器 deltaY：向下滚为正
                        let delta_y = match delta {
                            MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINE_PIXELS,
                            MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                        };
                        controller.wheel(delta_y);
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                frame_count += 1;
                let now = Instant::now();
                let elapsed = now.duration_since(last_fps_time).as_secs_f32();
                if elapsed >= 1.0 {
                    fps = frame_count as f32 / elapsed;
                    frame_count = 0;
                    last_fps_time = now;
                }

                controller.tick(now);

                if let Some(active) = controller.loader().active() {
                    if renderer.installed_revision() != Some(active.revision) {
                        renderer.install_panorama(&active.panorama, active.revision);
                        scene_shown_at = now;
                    }
                }
                renderer.update_camera(&controller.camera());

                let seconds = now.duration_since(scene_shown_at).as_secs_f32();
                let mut actions = UiActions::default();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    overlay::paint_hotspots(ctx, &controller, seconds);
                    draw_ui(ctx, &controller, &mut actions, fps, is_fullscreen);
                });

                apply_actions(actions, &mut controller, &window, &mut is_fullscreen, control_flow);

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    })
}

fn apply_actions(
    actions: UiActions,
    controller: &mut NavigationController,
    window: &Window,
    is_fullscreen: &mut bool,
    control_flow: &mut ControlFlow,
) {
    if actions.switch_room {
        controller.switch_room();
    }
    if actions.return_to_lobby {
        controller.return_to_lobby();
    }
    if actions.toggle_auto_rotate {
        controller.toggle_auto_rotate();
    }
    if actions.reset_view {
        controller.reset_view();
    }
    if actions.dismiss_failure {
        controller.dismiss_failure();
    }
    if actions.toggle_fullscreen {
        *is_fullscreen = !*is_fullscreen;
        if *is_fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        } else {
            window.set_fullscreen(None);
        }
    }
    if actions.open_tour {
        open_tour(controller);
    }
    if let Some(lang) = actions.language {
        i18n::init(lang);
        window.set_title(&tr("app.title"));
    }
    if actions.exit {
        *control_flow = ControlFlow::Exit;
    }
}

fn open_tour(controller: &mut NavigationController) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter(&tr("file.filter.tour"), &["json"])
        .pick_file()
    else {
        return;
    };

    match Tour::load(&path) {
        Ok(tour) => {
            log::info!(
                "{}",
                tr_with(
                    "log.tour_opened",
                    &[
                        ("path", path.display().to_string()),
                        ("count", tour.catalog.len().to_string())
                    ]
                )
            );
            if let Err(err) = controller.replace_tour(tour) {
                log::error!("{}", tr_with("error.tour_load_failed", &[("err", err.to_string())]));
            }
        }
        Err(err) => log::error!("{}", tr_with("error.tour_load_failed", &[("err", err.to_string())])),
    }
}

fn draw_ui(
    ctx: &egui::Context,
    controller: &NavigationController,
    actions: &mut UiActions,
    fps: f32,
    is_fullscreen: bool,
) {
    let nav = controller.navigation_state();
    let loader = controller.loader();

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(tr("menu.file"), |ui| {
                if ui.button(tr("menu.open_tour")).clicked() {
                    actions.open_tour = true;
                    ui.close_menu();
                }
                if ui.button(tr("menu.exit")).clicked() {
                    actions.exit = true;
                }
            });

            ui.menu_button(tr("menu.view"), |ui| {
                if ui.button(tr("view.reset")).clicked() {
                    actions.reset_view = true;
                    ui.close_menu();
                }
                if ui.selectable_label(is_fullscreen, tr("button.fullscreen")).clicked() {
                    actions.toggle_fullscreen = true;
                    ui.close_menu();
                }
            });

            ui.menu_button(tr("menu.language"), |ui| {
                let current = i18n::current_lang();
                for (code, name) in i18n::LANGUAGES {
                    if ui.radio(current == code, name).clicked() {
                        actions.language = Some(code.to_string());
                        ui.close_menu();
                    }
                }
            });
        });
    });

    // 场景控制按钮
    egui::Area::new("scene_controls")
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 36.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    if controller.tour().quick_switch.is_some()
                        && ui.button(tr("button.switch_room")).clicked()
                    {
                        actions.switch_room = true;
                    }
                    if ui
                        .selectable_label(nav.auto_rotate, tr("button.auto_rotate"))
                        .clicked()
                    {
                        actions.toggle_auto_rotate = true;
                    }
                    if controller.tour().lobby.is_some()
                        && ui.button(tr("button.return_lobby")).clicked()
                    {
                        actions.return_to_lobby = true;
                    }
                });
            });
        });

    match loader.indicator() {
        Indicator::Hidden => {}
        Indicator::Loading => {
            egui::Area::new("loading")
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(tr("status.loading"));
                        });
                    });
                });
        }
        Indicator::Failed(message) => {
            egui::Window::new(tr("status.load_failed").replace("{err}", ""))
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(
                        egui::RichText::new(tr_with("status.load_failed", &[("err", message.clone())]))
                            .color(egui::Color32::LIGHT_RED),
                    );
                    ui.label(egui::RichText::new(tr("status.check_path")).small());
                    if ui.button(tr("button.dismiss")).clicked() {
                        actions.dismiss_failure = true;
                    }
                });
        }
    }

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if loader.is_loading() {
                ui.label(egui::RichText::new(tr("status.loading")).color(egui::Color32::YELLOW));
                ui.label("|");
            }

            ui.label(egui::RichText::new(loader.scene_name()).strong());
            ui.label("|");
            ui.label(tr_with(
                "status.hotspots",
                &[("count", loader.hotspots().len().to_string())],
            ));
            if let Some(hotspot) = controller.hovered() {
                ui.label("|");
                ui.label(
                    egui::RichText::new(tr_with("status.hover", &[("label", hotspot.label.clone())]))
                        .color(egui::Color32::GREEN),
                );
            }

            let orientation = controller.orientation();
            ui.label("|");
            ui.label(format!("FOV: {:.1}°", orientation.fov()));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", orientation.yaw()));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", orientation.pitch()));
            ui.label("|");
            ui.label(egui::RichText::new(format!("FPS: {:.1}", fps)).color(egui::Color32::GREEN));
        });
    });
}
