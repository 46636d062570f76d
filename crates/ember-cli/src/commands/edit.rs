//! Interactive scene editor window with optional hot-reload

use super::load_store;
use crate::config::EmberConfig;
use anyhow::{Context, Result};
use ember_render::{Camera, RenderContext, SceneRenderer};
use ember_scene::{Editor, LightKind, MeshKind, PickResult};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Window, WindowId};

pub fn run(scene_path: &Path, watch: bool, config: EmberConfig) -> Result<()> {
    let store = load_store(scene_path, &config)?;
    println!("Loaded scene: {}", scene_path.display());
    println!("Objects: {}, lights: {}", store.entity_count(), store.light_count());

    let needs_reload = Arc::new(AtomicBool::new(false));

    // Set up file watcher if requested
    let _watcher = if watch {
        let flag = Arc::clone(&needs_reload);
        let (tx, rx) = mpsc::channel();

        let mut debouncer = new_debouncer(Duration::from_millis(500), tx)
            .context("Failed to create file watcher")?;

        debouncer
            .watcher()
            .watch(scene_path, RecursiveMode::NonRecursive)
            .context("Failed to watch scene file")?;

        std::thread::spawn(move || {
            for result in rx {
                match result {
                    Ok(_events) => flag.store(true, Ordering::SeqCst),
                    Err(e) => log::warn!("Watch error: {:?}", e),
                }
            }
        });

        println!("Watching for changes...");
        Some(debouncer)
    } else {
        None
    };

    println!("Left click: select/drag  Right drag: orbit  Middle drag: pan  Wheel: zoom");
    println!("1-5: add Cube/Sphere/Cylinder/Plane/Pyramid  P/D: add point/directional light");
    println!("L: lit/unlit  Delete: remove selection  Ctrl+S: save  Esc: quit");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = EditApp::new(
        Editor::new(store, config.picking),
        scene_path.to_path_buf(),
        config,
        needs_reload,
    );
    event_loop.run_app(&mut app)?;

    Ok(())
}

struct EditApp {
    editor: Editor,
    scene_path: PathBuf,
    config: EmberConfig,
    needs_reload: Arc<AtomicBool>,
    /// Our own save touches the watched file; skip the reload it triggers
    ignore_next_reload: bool,

    window: Option<Arc<Window>>,
    render_context: Option<RenderContext>,
    scene_renderer: Option<SceneRenderer>,
    camera: Camera,

    // Input state
    cursor: Option<PhysicalPosition<f64>>,
    left_pressed: bool,
    right_pressed: bool,
    middle_pressed: bool,
    modifiers: ModifiersState,
}

impl EditApp {
    fn new(
        editor: Editor,
        scene_path: PathBuf,
        config: EmberConfig,
        needs_reload: Arc<AtomicBool>,
    ) -> Self {
        Self {
            editor,
            scene_path,
            config,
            needs_reload,
            ignore_next_reload: false,
            window: None,
            render_context: None,
            scene_renderer: None,
            camera: Camera::new(),
            cursor: None,
            left_pressed: false,
            right_pressed: false,
            middle_pressed: false,
            modifiers: ModifiersState::empty(),
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title(format!("Ember - {}", self.scene_path.display()))
            .with_inner_size(PhysicalSize::new(1280, 720));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("Failed to create window")?,
        );

        let render_context = pollster::block_on(RenderContext::new(window.clone()))
            .context("Failed to create render context")?;

        self.camera.aspect = render_context.aspect_ratio();
        self.camera.update_orbit();

        let mut renderer = SceneRenderer::for_context(&render_context, self.config.render.clone());
        if let Some(dir) = self.scene_path.parent() {
            renderer.set_texture_base_dir(dir);
        }

        self.window = Some(window);
        self.render_context = Some(render_context);
        self.scene_renderer = Some(renderer);
        Ok(())
    }

    fn render(&mut self) {
        let (Some(context), Some(renderer)) = (&mut self.render_context, &mut self.scene_renderer)
        else {
            return;
        };

        let grabbed = self.editor.grabbed_axis();
        match renderer.render(context, &self.camera, &mut self.editor.store, grabbed) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = context.size;
                context.resize(size);
            }
            Err(e) => log::error!("Surface error: {:?}", e),
        }
    }

    fn check_reload(&mut self) {
        if !self.needs_reload.swap(false, Ordering::SeqCst) {
            return;
        }
        if self.ignore_next_reload {
            self.ignore_next_reload = false;
            return;
        }
        match self.editor.load(&self.scene_path) {
            Ok(()) => println!(
                "Reloaded scene: {} objects, {} lights",
                self.editor.store.entity_count(),
                self.editor.store.light_count()
            ),
            Err(e) => log::error!("Failed to reload scene, keeping current one: {}", e),
        }
    }

    fn screen_size(&self) -> (f32, f32) {
        self.render_context
            .as_ref()
            .map(|c| (c.size.width.max(1) as f32, c.size.height.max(1) as f32))
            .unwrap_or((1.0, 1.0))
    }

    fn cursor_ray(&self) -> Option<ember_core::Ray> {
        let cursor = self.cursor?;
        let (width, height) = self.screen_size();
        Some(
            self.camera
                .ray_from_screen(cursor.x as f32, cursor.y as f32, width, height),
        )
    }

    fn handle_left_press(&mut self) {
        let Some(ray) = self.cursor_ray() else {
            return;
        };
        match self.editor.mouse_down(&ray, self.camera.forward()) {
            PickResult::Axis(grab) => log::debug!("Grabbed {:?} axis", grab.axis),
            PickResult::Entity { id, .. } => {
                if let Some(entity) = self.editor.store.entity(id) {
                    println!("Selected {}", entity.name);
                }
            }
            PickResult::Light { index, .. } => {
                println!("Selected {}", ember_scene::EntityStore::light_name(index));
            }
            PickResult::Nothing => log::debug!("Selection cleared"),
        }
    }

    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let last = self.cursor.replace(position);

        if self.left_pressed && self.editor.is_dragging() {
            if let Some(ray) = self.cursor_ray() {
                self.editor.mouse_move(&ray);
            }
        }

        let Some(last) = last else {
            return;
        };
        let dx = (position.x - last.x) as f32;
        let dy = (position.y - last.y) as f32;

        if self.right_pressed {
            self.camera.orbit(-dx * 0.01, dy * 0.01);
        }
        if self.middle_pressed {
            self.camera.pan(-dx * 0.02, dy * 0.02);
        }
    }

    /// Editor shortcuts. Returns false for keys it doesn't handle.
    fn handle_key(&mut self, key: KeyCode) -> bool {
        let ctrl = self.modifiers.control_key();
        match key {
            KeyCode::KeyS if ctrl => self.save_scene(),
            KeyCode::KeyL => {
                if let Some(renderer) = &mut self.scene_renderer {
                    let mode = renderer.toggle_shading();
                    println!("Shading: {:?}", mode);
                }
            }
            KeyCode::Delete | KeyCode::Backspace => {
                if self.editor.delete_selected() {
                    println!("Deleted selection");
                }
            }
            KeyCode::Digit1 | KeyCode::Digit2 | KeyCode::Digit3 | KeyCode::Digit4 | KeyCode::Digit5 => {
                let kind = match key {
                    KeyCode::Digit1 => MeshKind::Cube,
                    KeyCode::Digit2 => MeshKind::Sphere,
                    KeyCode::Digit3 => MeshKind::Cylinder,
                    KeyCode::Digit4 => MeshKind::Plane,
                    _ => MeshKind::Pyramid,
                };
                let id = self.editor.add_object(kind);
                if let Some(entity) = self.editor.store.entity(id) {
                    println!("Added {}", entity.name);
                }
            }
            KeyCode::KeyP => {
                let index = self.editor.add_light(LightKind::Point);
                println!("Added point light {}", ember_scene::EntityStore::light_name(index));
            }
            KeyCode::KeyD => {
                let index = self.editor.add_light(LightKind::Directional);
                println!(
                    "Added directional light {}",
                    ember_scene::EntityStore::light_name(index)
                );
            }
            _ => return false,
        }
        true
    }

    fn save_scene(&mut self) {
        match self.editor.save(&self.scene_path) {
            Ok(()) => {
                println!("Saved {}", self.scene_path.display());
                self.ignore_next_reload = true;
            }
            Err(e) => log::error!("Failed to save scene: {}", e),
        }
    }
}

impl ApplicationHandler for EditApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.initialize(event_loop) {
                log::error!("{:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(context) = &mut self.render_context {
                    context.resize(new_size);
                    self.camera.aspect = context.aspect_ratio();
                }
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        if code == KeyCode::Escape {
                            event_loop.exit();
                        } else {
                            self.handle_key(code);
                        }
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => {
                        self.left_pressed = pressed;
                        if pressed {
                            self.handle_left_press();
                        } else {
                            self.editor.mouse_up();
                        }
                    }
                    MouseButton::Right => self.right_pressed = pressed,
                    MouseButton::Middle => self.middle_pressed = pressed,
                    _ => {}
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor_moved(position);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.camera.zoom(scroll);
            }

            WindowEvent::RedrawRequested => {
                self.check_reload();
                self.render();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
