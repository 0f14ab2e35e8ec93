/// Press/drag/release state machine driving the trackball
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::RotatorError;
use crate::trackball::{SurfaceSize, TrackballSphere};
use crate::transform::RotationState;
use crate::transvection::apply_transvection;

/// Anything a pointer can be dragged across. The size is re-read on every
/// press so resizes between drags are honored.
pub trait Surface {
    fn size(&self) -> SurfaceSize;
}

impl Surface for SurfaceSize {
    fn size(&self) -> SurfaceSize {
        *self
    }
}

/// Which kind of input started the active drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    Mouse,
    Touch,
}

/// A host input event in surface-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput<'a> {
    MouseDown { x: f64, y: f64 },
    MouseMove { x: f64, y: f64 },
    MouseUp,
    TouchStart(&'a [(f64, f64)]),
    TouchMove(&'a [(f64, f64)]),
    TouchEnd,
    TouchCancel,
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    source: DragSource,
    previous: (f64, f64),
    sphere: TrackballSphere,
}

/// Called after every drag update with the new orientation.
pub type RedrawCallback = Box<dyn FnMut(&RotationState)>;

/// Arcball rotation controller bound to a surface.
///
/// Every move of an active drag rotates the view immediately and then
/// invokes the redraw callback; there is no batching. Releasing or
/// cancelling keeps whatever rotation was already applied.
pub struct TrackballRotator<S> {
    surface: S,
    state: RotationState,
    session: Option<DragSession>,
    redraw: Option<RedrawCallback>,
}

impl<S: Surface> TrackballRotator<S> {
    /// Create a rotator with the default view.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            // the default direction and up are never collinear
            state: RotationState::new(None, None, None).unwrap_or_default(),
            session: None,
            redraw: None,
        }
    }

    /// Create a rotator looking along `direction` with the given `up` and
    /// eye `distance`. Missing values fall back to the `set_view` defaults.
    pub fn with_view(
        surface: S,
        direction: Option<Vector3<f64>>,
        up: Option<Vector3<f64>>,
        distance: Option<f64>,
    ) -> Result<Self, RotatorError> {
        Ok(Self {
            surface,
            state: RotationState::new(direction, up, distance)?,
            session: None,
            redraw: None,
        })
    }

    /// Install the redraw callback.
    pub fn with_redraw(mut self, redraw: impl FnMut(&RotationState) + 'static) -> Self {
        self.redraw = Some(Box::new(redraw));
        self
    }

    pub fn set_redraw(&mut self, redraw: Option<RedrawCallback>) {
        self.redraw = redraw;
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn state(&self) -> &RotationState {
        &self.state
    }

    pub fn view_matrix(&self) -> Matrix4<f64> {
        self.state.view_matrix()
    }

    /// Column-major view matrix for upload to a renderer.
    pub fn view_matrix_f32(&self) -> [f32; 16] {
        self.state.view_matrix_f32()
    }

    pub fn set_view_matrix(&mut self, matrix: &[f64]) -> Result<(), RotatorError> {
        self.state.set_view_matrix(matrix)
    }

    pub fn set_view(
        &mut self,
        direction: Option<Vector3<f64>>,
        up: Option<Vector3<f64>>,
        distance: Option<f64>,
    ) -> Result<(), RotatorError> {
        self.state.set_view(direction, up, distance)
    }

    pub fn view_distance(&self) -> Option<f64> {
        self.state.view_distance()
    }

    pub fn set_view_distance(&mut self, distance: Option<f64>) {
        self.state.set_view_distance(distance);
    }

    pub fn rotation_center(&self) -> Point3<f64> {
        self.state.rotation_center()
    }

    pub fn set_rotation_center(&mut self, center: Option<Point3<f64>>) {
        self.state.set_rotation_center(center);
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn drag_source(&self) -> Option<DragSource> {
        self.session.map(|session| session.source)
    }

    /// Dispatch a host event. Returns `true` when the view changed.
    pub fn handle(&mut self, input: PointerInput<'_>) -> bool {
        match input {
            PointerInput::MouseDown { x, y } => {
                self.mouse_down(x, y);
                false
            }
            PointerInput::MouseMove { x, y } => self.mouse_move(x, y),
            PointerInput::MouseUp => {
                self.mouse_up();
                false
            }
            PointerInput::TouchStart(touches) => {
                self.touch_start(touches);
                false
            }
            PointerInput::TouchMove(touches) => self.touch_move(touches),
            PointerInput::TouchEnd => {
                self.touch_end();
                false
            }
            PointerInput::TouchCancel => {
                self.touch_cancel();
                false
            }
        }
    }

    /// Start a mouse drag. Ignored while any drag is active.
    pub fn mouse_down(&mut self, x: f64, y: f64) {
        if self.session.is_some() {
            return;
        }
        self.begin(DragSource::Mouse, x, y);
    }

    pub fn mouse_move(&mut self, x: f64, y: f64) -> bool {
        self.drag_to(DragSource::Mouse, x, y)
    }

    pub fn mouse_up(&mut self) {
        self.end(DragSource::Mouse);
    }

    /// Start a touch drag. Anything but a single touch cancels instead.
    pub fn touch_start(&mut self, touches: &[(f64, f64)]) {
        let &[(x, y)] = touches else {
            self.touch_cancel();
            return;
        };
        if self.drag_source() == Some(DragSource::Mouse) {
            return;
        }
        self.begin(DragSource::Touch, x, y);
    }

    /// Continue a touch drag. A second finger cancels the session.
    pub fn touch_move(&mut self, touches: &[(f64, f64)]) -> bool {
        let &[(x, y)] = touches else {
            self.touch_cancel();
            return false;
        };
        if self.drag_source() != Some(DragSource::Touch) {
            return false;
        }
        self.drag_to(DragSource::Touch, x, y)
    }

    pub fn touch_end(&mut self) {
        self.touch_cancel();
    }

    pub fn touch_cancel(&mut self) {
        self.end(DragSource::Touch);
    }

    fn begin(&mut self, source: DragSource, x: f64, y: f64) {
        let size = self.surface.size();
        let sphere = TrackballSphere::from_surface(size);
        log::trace!(
            "{source:?} drag started at ({x}, {y}) on {}x{} surface",
            size.width,
            size.height
        );
        self.session = Some(DragSession {
            source,
            previous: (x, y),
            sphere,
        });
    }

    fn drag_to(&mut self, source: DragSource, x: f64, y: f64) -> bool {
        let Some(session) = self.session.as_mut().filter(|s| s.source == source) else {
            return false;
        };

        let (prev_x, prev_y) = session.previous;
        let from = session.sphere.project(prev_x, prev_y, &self.state);
        let to = session.sphere.project(x, y, &self.state);
        if x.is_finite() && y.is_finite() {
            session.previous = (x, y);
        }

        let changed = apply_transvection(&mut self.state, &from, &to);
        if let Some(redraw) = self.redraw.as_mut() {
            redraw(&self.state);
        }
        changed
    }

    fn end(&mut self, source: DragSource) {
        if self.drag_source() == Some(source) {
            log::trace!("{source:?} drag ended");
            self.session = None;
        }
    }
}
