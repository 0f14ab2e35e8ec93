/// Terminal trackball viewer: mouse drags rotate an ASCII-rendered mesh
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use nalgebra::{Matrix4, Point3};
use std::cell::Cell;
use std::io::{self, stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};
use trackball_core::{Camera, Mesh, PointerInput, SurfaceSize, TrackballRotator};

pub mod config;
pub mod renderer;

pub use config::{ConfigError, ViewerConfig};
pub use renderer::AsciiRenderer;

/// Rows taken by the status line above the picture.
const STATUS_ROWS: u16 = 1;

/// Closest the eye may be zoomed in.
const MIN_VIEW_DISTANCE: f64 = 0.5;

/// Main application struct for the terminal trackball viewer
pub struct TerminalApp {
    mesh: Mesh,
    /// Moves the mesh centroid onto the origin.
    model: Matrix4<f32>,
    rotator: TrackballRotator<SurfaceSize>,
    camera: Camera,
    renderer: AsciiRenderer,
    config: ViewerConfig,
    fitted_distance: f64,
    needs_redraw: Rc<Cell<bool>>,
    running: bool,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(mesh: Mesh, config: ViewerConfig) -> anyhow::Result<Self> {
        let (width, height) = terminal::size()?;
        Self::with_size(mesh, config, width, height)
    }

    /// Build the viewer for a terminal of `width` x `height` cells.
    pub fn with_size(
        mesh: Mesh,
        config: ViewerConfig,
        width: u16,
        height: u16,
    ) -> anyhow::Result<Self> {
        let centroid = mesh.centroid();
        let model = Matrix4::new_translation(&-centroid.coords);
        let camera = Camera::new(width as u32, height.saturating_sub(STATUS_ROWS) as u32);
        let fitted_distance = fit_distance(&mesh, &centroid, camera.fov);

        let needs_redraw = Rc::new(Cell::new(true));
        let flag = Rc::clone(&needs_redraw);
        let rotator = TrackballRotator::with_view(
            surface_size(width, height, config.cell_aspect),
            Some(config.view.direction()),
            Some(config.view.up()),
            Some(config.view.distance.unwrap_or(fitted_distance)),
        )?
        .with_redraw(move |_| flag.set(true));

        let mut app = Self {
            mesh,
            model,
            rotator,
            camera,
            renderer: AsciiRenderer::new(width as usize, height.saturating_sub(STATUS_ROWS) as usize),
            config,
            fitted_distance,
            needs_redraw,
            running: true,
            last_fps_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        };
        app.rotator.set_rotation_center(app.config.rotation_center());
        log::info!(
            "viewer ready: {} triangles, {}x{} cells",
            app.mesh.triangles.len(),
            width,
            height
        );
        Ok(app)
    }

    pub fn rotator(&self) -> &TrackballRotator<SurfaceSize> {
        &self.rotator
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        execute!(
            stdout(),
            cursor::Show,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / u64::from(self.config.fps.max(1)));

        while self.running {
            let frame_start = Instant::now();

            // drain every pending event so a fast drag is applied in full
            while event::poll(Duration::ZERO)? {
                let event = event::read()?;
                self.handle_event(event);
            }

            if self.needs_redraw.replace(false) {
                self.render()?;
                self.frame_count += 1;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                // wake early for input instead of sleeping blindly
                event::poll(target_frame_time - elapsed)?;
            }

            let now = Instant::now();
            let window = now - self.last_fps_sample;
            if window.as_secs() >= 1 {
                self.fps = self.frame_count as f32 / window.as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        Ok(())
    }

    /// Apply one terminal event to the viewer state.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(-self.config.zoom_step),
            KeyCode::Char('-') => self.zoom(self.config.zoom_step),
            KeyCode::Char('r') => self.reset_view(),
            KeyCode::Char('c') => self.toggle_rotation_center(),
            KeyCode::Char('p') => {
                self.camera.mode = self.camera.mode.toggled();
                self.needs_redraw.set(true);
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let aspect = self.config.cell_aspect;
        let x = f64::from(mouse.column) + 0.5;
        let y = (f64::from(mouse.row.saturating_sub(STATUS_ROWS)) + 0.5) * aspect;
        let input = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => PointerInput::MouseDown { x, y },
            MouseEventKind::Drag(MouseButton::Left) => PointerInput::MouseMove { x, y },
            MouseEventKind::Up(MouseButton::Left) => PointerInput::MouseUp,
            _ => return,
        };
        self.rotator.handle(input);
    }

    fn resize(&mut self, width: u16, height: u16) {
        let rows = height.saturating_sub(STATUS_ROWS);
        log::debug!("terminal resized to {width}x{height}");
        *self.rotator.surface_mut() = surface_size(width, height, self.config.cell_aspect);
        self.camera.resize(u32::from(width), u32::from(rows));
        self.renderer.resize(usize::from(width), usize::from(rows));
        self.needs_redraw.set(true);
    }

    fn zoom(&mut self, delta: f64) {
        let current = self.rotator.view_distance().unwrap_or(self.fitted_distance);
        let distance = (current + delta).max(MIN_VIEW_DISTANCE);
        self.rotator.set_view_distance(Some(distance));
        self.needs_redraw.set(true);
    }

    fn reset_view(&mut self) {
        let view = &self.config.view;
        let distance = view.distance.unwrap_or(self.fitted_distance);
        // the configured view was accepted at startup, so this cannot fail
        if let Err(err) = self
            .rotator
            .set_view(Some(view.direction()), Some(view.up()), Some(distance))
        {
            log::warn!("could not reset view: {err}");
        }
        self.needs_redraw.set(true);
    }

    fn toggle_rotation_center(&mut self) {
        let configured = self.config.rotation_center();
        let next = if self.rotator.rotation_center() == Point3::origin() {
            configured
        } else {
            None
        };
        self.rotator.set_rotation_center(next);
        self.needs_redraw.set(true);
    }

    fn render(&mut self) -> io::Result<()> {
        let distance = self.rotator.view_distance().unwrap_or(self.fitted_distance) as f32;
        self.camera.ortho_height = 2.0 * distance * (self.camera.fov / 2.0).tan();
        let model_view = self.rotator.view_matrix().cast::<f32>() * self.model;

        self.renderer.clear();
        self.renderer.render_mesh(&self.mesh, &model_view, &self.camera);

        let mut stdout = stdout();
        self.renderer.draw(&mut stdout, STATUS_ROWS)?;

        let center = self.rotator.rotation_center();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Trackball | FPS: {:.1} | dist {:.2} | center ({:.1}, {:.1}, {:.1}) | {:?} | drag=rotate +/-=zoom c=center p=proj r=reset q=quit",
                self.fps,
                distance,
                center.x,
                center.y,
                center.z,
                self.camera.mode
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Trackball surface for the picture area, with rows stretched to the
/// cell aspect so the silhouette is round on screen.
fn surface_size(width: u16, height: u16, cell_aspect: f64) -> SurfaceSize {
    SurfaceSize::new(
        f64::from(width),
        f64::from(height.saturating_sub(STATUS_ROWS)) * cell_aspect,
    )
}

/// Eye distance at which the whole mesh fits the vertical field of view.
fn fit_distance(mesh: &Mesh, center: &Point3<f32>, fov: f32) -> f64 {
    let radius = mesh.bounding_radius(center).max(0.5);
    f64::from(radius / (fov / 2.0).sin() * 1.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use nalgebra::Vector3;

    fn app() -> TerminalApp {
        TerminalApp::with_size(Mesh::cube(2.0), ViewerConfig::default(), 81, 41).unwrap()
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn test_initial_view_fits_mesh() {
        let app = app();
        let distance = app.rotator().view_distance().unwrap();
        assert!(distance > 3f64.sqrt());
        assert_eq!(app.rotator().state().forward(), Vector3::z());
    }

    #[test]
    fn test_mouse_drag_rotates() {
        let mut app = app();
        app.needs_redraw.set(false);
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 40, 21));
        assert!(app.rotator().is_dragging());
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 50, 21));
        assert!(app.needs_redraw.get());
        // dragging right swings the eye to the left
        assert!(app.rotator().state().forward().x < 0.0);

        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 50, 21));
        assert!(!app.rotator().is_dragging());
    }

    #[test]
    fn test_right_button_is_ignored() {
        let mut app = app();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Right), 40, 21));
        assert!(!app.rotator().is_dragging());
    }

    #[test]
    fn test_zoom_keys() {
        let mut app = app();
        let start = app.rotator().view_distance().unwrap();
        app.handle_event(key('-'));
        assert!((app.rotator().view_distance().unwrap() - (start + 0.5)).abs() < 1e-9);
        for _ in 0..100 {
            app.handle_event(key('+'));
        }
        assert_eq!(app.rotator().view_distance(), Some(MIN_VIEW_DISTANCE));
    }

    #[test]
    fn test_reset_restores_configured_view() {
        let mut app = app();
        let initial = *app.rotator().state();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 40, 21));
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 60, 10));
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 60, 10));
        app.handle_event(key('-'));
        assert_ne!(*app.rotator().state(), initial);

        app.handle_event(key('r'));
        let state = app.rotator().state();
        assert!((state.forward() - initial.forward()).norm() < 1e-9);
        assert_eq!(state.view_distance(), initial.view_distance());
    }

    #[test]
    fn test_rotation_center_toggle() {
        let config = ViewerConfig {
            rotation_center: Some([1.0, 2.0, 3.0]),
            ..ViewerConfig::default()
        };
        let mut app = TerminalApp::with_size(Mesh::cube(2.0), config, 81, 41).unwrap();
        assert_eq!(app.rotator().rotation_center(), Point3::new(1.0, 2.0, 3.0));
        app.handle_event(key('c'));
        assert_eq!(app.rotator().rotation_center(), Point3::origin());
        app.handle_event(key('c'));
        assert_eq!(app.rotator().rotation_center(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_resize_updates_surface() {
        let mut app = app();
        app.handle_event(Event::Resize(121, 31));
        assert_eq!(*app.rotator().surface(), SurfaceSize::new(121.0, 60.0));
        assert!((app.camera().aspect - 121.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_toggle_and_quit() {
        let mut app = app();
        app.handle_event(key('p'));
        assert_eq!(app.camera().mode, trackball_core::ProjectionMode::Orthographic);
        assert!(app.is_running());
        app.handle_event(key('q'));
        assert!(!app.is_running());
    }

    #[test]
    fn test_degenerate_config_is_rejected() {
        let mut config = ViewerConfig::default();
        config.view.direction = [0.0, 5.0, 0.0];
        assert!(TerminalApp::with_size(Mesh::cube(2.0), config, 80, 40).is_err());
    }
}
