// main.rs — window shell: event loop, input wiring, menu and status bar.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod assets;
mod camera;
mod error;
mod mesh;
mod picking;
mod renderer;
mod scene;
mod tween;
mod viewer;

use renderer::Renderer;
use scene::Tour;
use viewer::{ViewerController, ViewerEvent};

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, WindowBuilder},
};

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;

use crate::error::AssetError;

/// A released press that moved less than this many pixels counts as a
/// click rather than a drag.
const CLICK_SLOP_PX: f64 = 4.0;

fn tour_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--tour" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

fn main() {
    env_logger::init();

    let tour = match tour_from_args() {
        Some(path) => match Tour::load(&path) {
            Ok(tour) => tour,
            Err(e) => {
                log::error!("{e}; falling back to the built-in demo tour");
                Tour::demo()
            }
        },
        None => Tour::demo(),
    };

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Panorama Tour")
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)
            .unwrap(),
    );

    let size = window.inner_size();
    let mut viewer = match ViewerController::new(tour, size.width, size.height) {
        Ok(viewer) => viewer,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let sphere = mesh::build_sphere(scene::PANORAMA_RADIUS, 32, 32);
    let icon = assets::load_marker_icon(Path::new("resources/Information.png"));
    let mut renderer = pollster::block_on(Renderer::new(window.clone(), &sphere, &icon));

    // Interaction state
    let mut mouse_pressed = false;
    let mut last_mouse_pos: Option<PhysicalPosition<f64>> = None;
    let mut cursor_pos = PhysicalPosition::new(0.0f64, 0.0f64);
    let mut drag_distance = 0.0f64;
    let mut is_fullscreen = false;

    // Frame timing / FPS
    let mut last_frame_time = Instant::now();
    let mut fps_timer = Instant::now();
    let mut frame_count = 0;
    let mut fps = 0.0;
    let mut show_fps = false;

    // UI state
    let mut is_loading = true;
    let mut last_error: Option<String> = None;

    // Panoramas decode off-thread and arrive over this channel, tagged
    // with the path they were decoded from.
    let (tx, rx): (
        Sender<(PathBuf, Result<RgbaImage, AssetError>)>,
        Receiver<(PathBuf, Result<RgbaImage, AssetError>)>,
    ) = channel();

    assets::spawn_load_panorama(PathBuf::from(viewer.current_image()), tx.clone());

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        // A finished background decode? Results that no longer match the
        // current sphere (a swap or tour reload happened meanwhile) are
        // stale and dropped; the decode they were superseded by is still
        // in flight.
        if let Ok((path, result)) = rx.try_recv() {
            if viewer.accepts_texture(&path) {
                match result {
                    Ok(rgba) => {
                        renderer.load_panorama(rgba);
                        viewer.texture_ready();
                        last_error = None;
                    }
                    Err(e) => {
                        last_error = Some(e.to_string());
                        viewer.texture_failed();
                    }
                }
                is_loading = false;
            } else {
                log::debug!("dropping stale decode of {}", path.display());
            }
        }

        match event {
            Event::WindowEvent { event, .. } => {
                // Let egui claim the event first.
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        viewer.on_resize(new_size.width, new_size.height);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = rfd::FileDialog::new()
                                        .add_filter("Tour files", &["json"])
                                        .pick_file()
                                    {
                                        open_tour(
                                            &path,
                                            &mut viewer,
                                            &renderer,
                                            &tx,
                                            &mut is_loading,
                                            &mut last_error,
                                        );
                                    }
                                }
                                Some(VirtualKeyCode::F11) => {
                                    is_fullscreen = !is_fullscreen;
                                    if is_fullscreen {
                                        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                                    } else {
                                        window.set_fullscreen(None);
                                    }
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            if state == ElementState::Pressed {
                                mouse_pressed = true;
                                drag_distance = 0.0;
                                last_mouse_pos = Some(cursor_pos);
                            } else {
                                mouse_pressed = false;
                                last_mouse_pos = None;
                                if drag_distance < CLICK_SLOP_PX {
                                    viewer.on_click(cursor_pos.x as f32, cursor_pos.y as f32);
                                }
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor_pos = position;
                        if mouse_pressed {
                            if let Some(last_pos) = last_mouse_pos {
                                let dx = (position.x - last_pos.x) as f32;
                                let dy = (position.y - last_pos.y) as f32;
                                drag_distance += dx.abs() as f64 + dy.abs() as f64;
                                viewer.on_drag(dx, dy);
                            }
                            last_mouse_pos = Some(position);
                        } else {
                            viewer.on_pointer_move(position.x as f32, position.y as f32);
                        }
                    }

                    WindowEvent::DroppedFile(path) => {
                        open_tour(
                            &path,
                            &mut viewer,
                            &renderer,
                            &tx,
                            &mut is_loading,
                            &mut last_error,
                        );
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame_time).as_secs_f32();
                last_frame_time = now;

                frame_count += 1;
                if now.duration_since(fps_timer).as_secs_f32() >= 1.0 {
                    fps = frame_count as f32 / now.duration_since(fps_timer).as_secs_f32();
                    frame_count = 0;
                    fps_timer = now;
                }

                for request in viewer.update(dt) {
                    match request {
                        ViewerEvent::LoadPanorama(image) => {
                            is_loading = true;
                            assets::spawn_load_panorama(PathBuf::from(image), tx.clone());
                        }
                    }
                }

                renderer.update_scene(&viewer.camera, viewer.sphere.opacity, &viewer.markers);

                let mut next_tour: Option<PathBuf> = None;
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(
                        ctx,
                        &mut viewer,
                        &mut next_tour,
                        &mut show_fps,
                        fps,
                        is_loading,
                        &last_error,
                        &window,
                        &mut is_fullscreen,
                    );
                });

                if let Some(path) = next_tour {
                    open_tour(
                        &path,
                        &mut viewer,
                        &renderer,
                        &tx,
                        &mut is_loading,
                        &mut last_error,
                    );
                }

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
    });
}

/// Loads a tour file, replaces the controller, and kicks off the decode
/// of its starting panorama. On failure the current tour stays up.
fn open_tour(
    path: &Path,
    viewer: &mut ViewerController,
    renderer: &Renderer,
    tx: &Sender<(PathBuf, Result<RgbaImage, AssetError>)>,
    is_loading: &mut bool,
    last_error: &mut Option<String>,
) {
    let tour = match Tour::load(path) {
        Ok(tour) => tour,
        Err(e) => {
            log::error!("{e}");
            *last_error = Some(e.to_string());
            return;
        }
    };

    match ViewerController::new(tour, renderer.size.width, renderer.size.height) {
        Ok(new_viewer) => {
            *viewer = new_viewer;
            *is_loading = true;
            assets::spawn_load_panorama(PathBuf::from(viewer.current_image()), tx.clone());
        }
        Err(e) => {
            log::error!("{e}");
            *last_error = Some(e.to_string());
        }
    }
}

fn draw_ui(
    ctx: &egui::Context,
    viewer: &mut ViewerController,
    next_tour: &mut Option<PathBuf>,
    show_fps: &mut bool,
    fps: f32,
    is_loading: bool,
    last_error: &Option<String>,
    window: &winit::window::Window,
    is_fullscreen: &mut bool,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Tour…").clicked() {
                    ui.close_menu();
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Tour files", &["json"])
                        .pick_file()
                    {
                        *next_tour = Some(path);
                    }
                }
                if ui.button("Exit").clicked() {
                    std::process::exit(0);
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Reset View").clicked() {
                    viewer.camera.yaw = 0.0;
                    viewer.camera.pitch = 0.0;
                    viewer.camera.fov = camera::DEFAULT_FOV_DEG;
                    ui.close_menu();
                }

                if ui
                    .button(if *is_fullscreen {
                        "Exit Fullscreen"
                    } else {
                        "Enter Fullscreen"
                    })
                    .clicked()
                {
                    *is_fullscreen = !*is_fullscreen;
                    if *is_fullscreen {
                        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                    } else {
                        window.set_fullscreen(None);
                    }
                    ui.close_menu();
                }

                ui.separator();
                if ui.checkbox(show_fps, "Show FPS").clicked() {
                    ui.close_menu();
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if is_loading {
                ui.label(egui::RichText::new("Loading panorama…").color(egui::Color32::YELLOW));
                ui.label("|");
            }

            ui.label(format!("Panorama: {}", viewer.current_panorama()));
            ui.label("|");
            ui.label(format!("FOV: {:.1}°", viewer.camera.fov));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", viewer.camera.yaw));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", viewer.camera.pitch));

            if viewer.is_transitioning() {
                ui.label("|");
                ui.label("Swapping…");
            }

            if let Some(err) = last_error {
                ui.label("|");
                ui.label(egui::RichText::new(err).color(egui::Color32::LIGHT_RED));
            }

            if *show_fps {
                ui.label("|");
                ui.label(
                    egui::RichText::new(format!("FPS: {fps:.1}")).color(egui::Color32::GREEN),
                );
            }
        });
    });

    // Tooltip for the hovered marker, anchored to its screen projection.
    if let Some(tip) = &viewer.tooltip {
        let ppp = ctx.pixels_per_point();
        egui::Area::new(egui::Id::new("marker_tooltip"))
            .order(egui::Order::Tooltip)
            .interactable(false)
            .fixed_pos(egui::pos2(tip.x / ppp + 14.0, tip.y / ppp - 10.0))
            .show(ctx, |ui| {
                egui::Frame::popup(&ctx.style()).show(ui, |ui| {
                    ui.label(&tip.text);
                });
            });
    }
}
