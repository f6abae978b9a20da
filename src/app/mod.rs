mod input;
mod timing;

use crate::assets::{self, CharacterAsset};
use crate::render::{DragGesture, FrameParams, MeshFrame, OrbitCamera, RenderContext, UiFrame};
use crate::scene::CharacterScene;
use crate::ui::{self, ControlIntent};
use crate::viewer::{Frameloop, ModelCatalog, ThemeMode, ViewerController};
use input::InputAction;
use timing::FrameTiming;

use glam::Mat4;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Pedestal";
const CHARACTER_BASE_COLOR: [f32; 3] = [0.72, 0.72, 0.75];
/// Clamp animation steps after long stalls so the pose never jumps.
const MAX_FRAME_DT: f32 = 0.1;

/// Result of a background model load. Delivered through the event loop
/// proxy so a loop parked in `ControlFlow::Wait` still wakes up.
enum LoadEvent {
    Ready {
        generation: u64,
        asset: Box<CharacterAsset>,
    },
    Failed {
        generation: u64,
    },
}

pub struct App {
    window: Option<Arc<Window>>,
    render: Option<RenderContext>,
    egui_ctx: egui::Context,
    egui_state: Option<egui_winit::State>,
    controller: ViewerController,
    scene: CharacterScene,
    camera: OrbitCamera,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
    last_cursor: Option<(f32, f32)>,
    proxy: EventLoopProxy<LoadEvent>,
}

impl App {
    fn new(proxy: EventLoopProxy<LoadEvent>) -> Self {
        Self {
            window: None,
            render: None,
            egui_ctx: egui::Context::default(),
            egui_state: None,
            controller: ViewerController::new(ModelCatalog::new(), Instant::now()),
            scene: CharacterScene::new(),
            camera: OrbitCamera::new(),
            timing: FrameTiming::new(WINDOW_TITLE.to_string()),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
            last_cursor: None,
            proxy,
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    /// Any pointer or touch activity re-arms the dock timer. Redraw only
    /// when this brings a hidden dock back.
    fn note_activity(&mut self) {
        let was_visible = self.controller.state().dock.visible();
        self.controller.notify_activity(Instant::now());
        if !was_visible {
            self.request_redraw();
        }
    }

    fn sync_egui_theme(&self) {
        let visuals = match self.controller.state().theme {
            ThemeMode::Dark => egui::Visuals::dark(),
            ThemeMode::Light => egui::Visuals::light(),
        };
        self.egui_ctx.set_visuals(visuals);
    }

    /// Hands the queued load request, if any, to a worker thread. The
    /// result comes back tagged with its generation via the proxy.
    fn dispatch_pending_load(&mut self) {
        let Some(request) = self.controller.take_pending_load() else {
            return;
        };
        log::info!(
            "Loading model '{}' from {}",
            request.model,
            request.path.display()
        );
        let proxy = self.proxy.clone();
        std::thread::spawn(move || {
            let event = match assets::load_character(&request.model, &request.path) {
                Ok(asset) => LoadEvent::Ready {
                    generation: request.generation,
                    asset: Box::new(asset),
                },
                Err(err) => {
                    log::warn!("Loading model '{}' failed: {err}", request.model);
                    LoadEvent::Failed {
                        generation: request.generation,
                    }
                }
            };
            if proxy.send_event(event).is_err() {
                log::debug!("Event loop already closed; dropping load result");
            }
        });
    }

    fn apply_intent(&mut self, intent: ControlIntent) {
        match intent {
            ControlIntent::SelectModel(id) => match self.controller.select_model(&id) {
                Ok(()) => {
                    self.scene.clear();
                    self.dispatch_pending_load();
                }
                Err(err) => log::warn!("Model selection rejected: {err}"),
            },
            ControlIntent::SelectAnimation(name) => {
                if let Err(err) = self.controller.select_animation(&name) {
                    log::warn!("Animation selection rejected: {err}");
                }
            }
            ControlIntent::TogglePlayPause => self.controller.toggle_play_pause(),
            ControlIntent::ToggleTurntable => self.controller.toggle_turntable(),
            ControlIntent::CycleLighting => self.controller.cycle_lighting(),
            ControlIntent::ToggleTheme => {
                self.controller.toggle_theme();
                self.sync_egui_theme();
            }
            ControlIntent::ResetCamera => self.camera.reset(),
            ControlIntent::TakeScreenshot => self.take_screenshot(),
        }
    }

    fn take_screenshot(&mut self) {
        if !self.render.as_ref().map_or(false, |r| r.has_rendered()) {
            log::info!("Screenshot skipped: nothing has been rendered yet");
            return;
        }
        let default_name = format!("{}-screenshot.png", self.controller.state().selected_model);
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name(default_name)
            .save_file()
        else {
            return;
        };
        let Self {
            render,
            scene,
            camera,
            controller,
            ..
        } = self;
        let Some(render) = render.as_mut() else {
            return;
        };
        let (width, height) = render.surface_size();
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let params = compose_frame(controller, camera, scene, aspect);
        match render.capture_png(&path, params) {
            Ok(()) => log::info!("Saved screenshot to {}", path.display()),
            Err(err) => log::warn!("Screenshot failed: {err}"),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if self.render.is_none() {
            return;
        }

        let now = Instant::now();
        self.timing.update(Some(window.as_ref()), now);
        let dt = self.timing.frame_dt.min(MAX_FRAME_DT);

        let Some(egui_state) = self.egui_state.as_mut() else {
            return;
        };
        let raw_input = egui_state.take_egui_input(&window);
        let mut intents = Vec::new();
        let controller = &self.controller;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            intents = ui::control_dock(ctx, controller.state(), controller.catalog());
        });
        egui_state.handle_platform_output(&window, full_output.platform_output);
        let ui_repaint = full_output
            .viewport_output
            .values()
            .any(|out| out.repaint_delay.is_zero());
        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let ui_frame = UiFrame {
            primitives,
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        };

        for intent in intents {
            self.apply_intent(intent);
        }

        self.scene
            .apply_clip_directive(self.controller.active_clip());
        self.scene.spin(self.controller.turntable_delta(dt));
        self.scene.advance(dt);

        let Self {
            render,
            scene,
            camera,
            controller,
            ..
        } = self;
        let Some(render) = render.as_mut() else {
            return;
        };
        let (width, height) = render.surface_size();
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let params = compose_frame(controller, camera, scene, aspect);
        if let Err(err) = render.render_frame(params, ui_frame) {
            log::error!("Rendering failed: {err}");
            event_loop.exit();
            return;
        }

        if ui_repaint {
            window.request_redraw();
        }
    }
}

/// Gathers everything one frame needs from the viewer state, camera, and
/// scene. Field-level borrows so the caller can keep the renderer mutable.
fn compose_frame<'a>(
    controller: &ViewerController,
    camera: &OrbitCamera,
    scene: &'a mut CharacterScene,
    aspect: f32,
) -> FrameParams<'a> {
    let state = controller.state();
    let yaw = scene.root_yaw();
    let mesh = scene
        .mesh()
        .map(|(positions, indices)| MeshFrame { positions, indices });
    FrameParams {
        view_proj: camera.view_proj(aspect),
        model: Mat4::from_rotation_y(yaw),
        light: state.lighting.rig(),
        base_color: CHARACTER_BASE_COLOR,
        background: state.theme.tokens().background,
        mesh,
    }
}

impl ApplicationHandler<LoadEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        match RenderContext::new(window.clone()) {
            Ok(render) => self.render = Some(render),
            Err(err) => {
                log::error!("Renderer initialization failed: {err}");
                event_loop.exit();
                return;
            }
        }

        self.egui_state = Some(egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            None,
        ));
        self.sync_egui_theme();
        self.update_target_frame_duration(&window);
        window.request_redraw();
        self.window = Some(window);

        self.dispatch_pending_load();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: LoadEvent) {
        match event {
            LoadEvent::Ready { generation, asset } => {
                if generation != self.controller.generation() {
                    log::debug!("Dropping superseded load result (generation {generation})");
                    return;
                }
                let names = asset.clip_names();
                let (center, half_extent) = asset.bounds();
                log::info!(
                    "Model '{}' ready: {} vertices, {} clips",
                    asset.name,
                    asset.positions.len(),
                    names.len()
                );
                self.scene.install(*asset);
                self.camera.frame_bounds(center, half_extent);
                self.controller.animations_loaded(generation, names);
                self.request_redraw();
            }
            LoadEvent::Failed { generation } => {
                self.controller.load_failed(generation);
                self.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        if let Some(egui_state) = self.egui_state.as_mut() {
            let response = egui_state.on_window_event(&window, &event);
            if response.repaint {
                window.request_redraw();
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.last_cursor = None;
                    if self.camera.end_drag() {
                        self.controller.notify_interaction_end();
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match input::shortcut(event.physical_key) {
                    Some(InputAction::TogglePlayPause) => {
                        self.controller.toggle_play_pause();
                        window.request_redraw();
                    }
                    Some(InputAction::ResetCamera) => {
                        self.camera.reset();
                        window.request_redraw();
                    }
                    Some(InputAction::Quit) => {
                        event_loop.exit();
                    }
                    None => {}
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(render) = &mut self.render {
                    render.resize(new_size);
                }
                self.update_target_frame_duration(&window);
                window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(render) = &mut self.render {
                    render.resize(window.inner_size());
                }
            }
            WindowEvent::Moved(_) => {
                self.update_target_frame_duration(&window);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.note_activity();
                let pos = (position.x as f32, position.y as f32);
                if self.camera.is_dragging() {
                    if let Some((last_x, last_y)) = self.last_cursor {
                        self.camera.drag_by(pos.0 - last_x, pos.1 - last_y);
                    }
                    window.request_redraw();
                }
                self.last_cursor = Some(pos);
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                if self.camera.end_drag() {
                    self.controller.notify_interaction_end();
                    window.request_redraw();
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.note_activity();
                let pressed = state == ElementState::Pressed;
                let gesture = match button {
                    MouseButton::Left => Some(DragGesture::Orbit),
                    MouseButton::Right => Some(DragGesture::Pan),
                    _ => None,
                };
                if let Some(gesture) = gesture {
                    if pressed {
                        if !self.egui_ctx.wants_pointer_input() {
                            self.camera.begin_drag(gesture);
                            self.controller.notify_interaction_start();
                        }
                    } else if self.camera.end_drag() {
                        self.controller.notify_interaction_end();
                        window.request_redraw();
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.note_activity();
                if !self.egui_ctx.wants_pointer_input() {
                    let steps = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                    };
                    if steps != 0.0 {
                        self.camera.zoom(steps);
                        window.request_redraw();
                    }
                }
            }
            WindowEvent::Touch(touch) => {
                if touch.phase == TouchPhase::Started {
                    self.note_activity();
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if self.controller.tick_dock(now) {
            self.request_redraw();
        }
        match self.controller.frameloop() {
            Frameloop::Continuous => {
                if now >= self.next_frame_time {
                    self.request_redraw();
                    self.next_frame_time = now + self.target_frame_duration;
                }
                event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
            }
            Frameloop::OnDemand => {
                self.next_frame_time = now;
                match self.controller.state().dock.deadline() {
                    Some(deadline) => {
                        event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
                    }
                    None => event_loop.set_control_flow(ControlFlow::Wait),
                }
            }
        }
    }
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("🚀 Pedestal character viewer");
    log::info!("   Space toggles playback, R recenters the camera, ESC exits");

    let event_loop = EventLoop::<LoadEvent>::with_user_event()
        .build()
        .expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(event_loop.create_proxy());
    event_loop.run_app(&mut app).expect("Event loop error");

    log::info!("👋 Goodbye!");
}
