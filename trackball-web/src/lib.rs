/// Trackball Web - arcball rotation for an HTML canvas
///
/// Wires canvas mouse and touch events into the core rotator and exposes the
/// view accessors to JavaScript. Mouse moves and releases are tracked on the
/// document while a drag is active, so drags that leave the canvas keep
/// rotating.

use nalgebra::{Point3, Vector3};
use std::rc::{Rc, Weak};
use trackball_core::{PointerInput, Surface, SurfaceSize, TrackballRotator};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, EventTarget, HtmlCanvasElement, MouseEvent, TouchEvent};

mod dispatch;

use dispatch::{Dispatch, Dispatcher, ListenerChange, ListenerGroup};

/// Reads the canvas drawing-buffer size on every press.
struct CanvasSurface(HtmlCanvasElement);

impl Surface for CanvasSurface {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(f64::from(self.0.width()), f64::from(self.0.height()))
    }
}

type MouseListener = Closure<dyn FnMut(MouseEvent)>;
type TouchListener = Closure<dyn FnMut(TouchEvent)>;

struct Listeners {
    mouse_down: MouseListener,
    mouse_move: MouseListener,
    mouse_up: MouseListener,
    touch_start: TouchListener,
    touch_move: TouchListener,
    touch_end: TouchListener,
    touch_cancel: TouchListener,
}

impl Listeners {
    fn new(shared: &Weak<Shared>) -> Self {
        Self {
            mouse_down: mouse_listener(shared, Shared::on_mouse_down),
            mouse_move: mouse_listener(shared, Shared::on_mouse_move),
            mouse_up: mouse_listener(shared, Shared::on_mouse_up),
            touch_start: touch_listener(shared, Shared::on_touch_start),
            touch_move: touch_listener(shared, Shared::on_touch_move),
            touch_end: touch_listener(shared, Shared::on_touch_end),
            touch_cancel: touch_listener(shared, Shared::on_touch_cancel),
        }
    }
}

fn mouse_listener(shared: &Weak<Shared>, handler: fn(&Shared, MouseEvent)) -> MouseListener {
    let shared = shared.clone();
    Closure::new(move |evt: MouseEvent| {
        if let Some(shared) = shared.upgrade() {
            handler(&shared, evt);
        }
    })
}

fn touch_listener(shared: &Weak<Shared>, handler: fn(&Shared, TouchEvent)) -> TouchListener {
    let shared = shared.clone();
    Closure::new(move |evt: TouchEvent| {
        if let Some(shared) = shared.upgrade() {
            handler(&shared, evt);
        }
    })
}

fn add_listener<T: ?Sized>(target: &EventTarget, kind: &str, listener: &Closure<T>) {
    if let Err(err) = target.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref()) {
        log::warn!("failed to add {kind} listener: {err:?}");
    }
}

fn remove_listener<T: ?Sized>(target: &EventTarget, kind: &str, listener: &Closure<T>) {
    if let Err(err) = target.remove_event_listener_with_callback(kind, listener.as_ref().unchecked_ref()) {
        log::warn!("failed to remove {kind} listener: {err:?}");
    }
}

struct Shared {
    canvas: HtmlCanvasElement,
    document: Document,
    dispatcher: Dispatcher<CanvasSurface>,
    callback: Option<js_sys::Function>,
    listeners: Listeners,
}

impl Shared {
    /// Dispatch outside any rotator borrow, then sync listeners and redraw.
    fn dispatch(&self, input: PointerInput<'_>) {
        let Dispatch { handled, redraw, changes } = self.dispatcher.dispatch(input);
        if !handled {
            return;
        }
        for change in changes {
            match change {
                ListenerChange::Attach(group) => self.attach(group),
                ListenerChange::Detach(group) => self.detach(group),
            }
        }
        if redraw {
            if let Some(callback) = &self.callback {
                if let Err(err) = callback.call0(&JsValue::NULL) {
                    log::warn!("redraw callback failed: {err:?}");
                }
            }
        }
    }

    fn attach(&self, group: ListenerGroup) {
        match group {
            ListenerGroup::DocumentMouse => {
                let document: &EventTarget = &self.document;
                add_listener(document, "mousemove", &self.listeners.mouse_move);
                add_listener(document, "mouseup", &self.listeners.mouse_up);
            }
            ListenerGroup::CanvasTouch => {
                let canvas: &EventTarget = &self.canvas;
                add_listener(canvas, "touchmove", &self.listeners.touch_move);
                add_listener(canvas, "touchend", &self.listeners.touch_end);
                add_listener(canvas, "touchcancel", &self.listeners.touch_cancel);
            }
        }
    }

    fn detach(&self, group: ListenerGroup) {
        match group {
            ListenerGroup::DocumentMouse => {
                let document: &EventTarget = &self.document;
                remove_listener(document, "mousemove", &self.listeners.mouse_move);
                remove_listener(document, "mouseup", &self.listeners.mouse_up);
            }
            ListenerGroup::CanvasTouch => {
                let canvas: &EventTarget = &self.canvas;
                remove_listener(canvas, "touchmove", &self.listeners.touch_move);
                remove_listener(canvas, "touchend", &self.listeners.touch_end);
                remove_listener(canvas, "touchcancel", &self.listeners.touch_cancel);
            }
        }
    }

    fn local_point(&self, client_x: i32, client_y: i32) -> (f64, f64) {
        let rect = self.canvas.get_bounding_client_rect();
        (f64::from(client_x) - rect.left(), f64::from(client_y) - rect.top())
    }

    fn touch_points(&self, evt: &TouchEvent) -> Vec<(f64, f64)> {
        let touches = evt.touches();
        (0..touches.length())
            .filter_map(|i| touches.get(i))
            .map(|touch| self.local_point(touch.client_x(), touch.client_y()))
            .collect()
    }

    fn on_mouse_down(&self, evt: MouseEvent) {
        let (x, y) = self.local_point(evt.client_x(), evt.client_y());
        self.dispatch(PointerInput::MouseDown { x, y });
    }

    fn on_mouse_move(&self, evt: MouseEvent) {
        let (x, y) = self.local_point(evt.client_x(), evt.client_y());
        self.dispatch(PointerInput::MouseMove { x, y });
    }

    fn on_mouse_up(&self, _evt: MouseEvent) {
        self.dispatch(PointerInput::MouseUp);
    }

    fn on_touch_start(&self, evt: TouchEvent) {
        let points = self.touch_points(&evt);
        if points.len() == 1 {
            evt.prevent_default();
        }
        self.dispatch(PointerInput::TouchStart(&points));
    }

    fn on_touch_move(&self, evt: TouchEvent) {
        let points = self.touch_points(&evt);
        if points.len() == 1 {
            evt.prevent_default();
        }
        self.dispatch(PointerInput::TouchMove(&points));
    }

    fn on_touch_end(&self, _evt: TouchEvent) {
        self.dispatch(PointerInput::TouchEnd);
    }

    fn on_touch_cancel(&self, _evt: TouchEvent) {
        self.dispatch(PointerInput::TouchCancel);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        for group in self.dispatcher.attached() {
            self.detach(group);
        }
        let canvas: &EventTarget = &self.canvas;
        remove_listener(canvas, "mousedown", &self.listeners.mouse_down);
        remove_listener(canvas, "touchstart", &self.listeners.touch_start);
    }
}

/// Arcball rotator attached to a canvas.
#[wasm_bindgen]
pub struct WebTrackball {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl WebTrackball {
    /// Attach to `canvas`. `callback` runs after every drag update.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        callback: Option<js_sys::Function>,
        direction: Option<Vec<f64>>,
        up: Option<Vec<f64>>,
        distance: Option<f64>,
    ) -> Result<WebTrackball, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document available"))?;
        let direction = vector_arg(direction, "direction").map_err(js_error)?;
        let up = vector_arg(up, "up").map_err(js_error)?;

        let rotator = TrackballRotator::with_view(CanvasSurface(canvas.clone()), direction, up, distance)
            .map_err(|err| js_error(err.to_string()))?;

        let shared = Rc::new_cyclic(|weak| Shared {
            canvas,
            document,
            dispatcher: Dispatcher::new(rotator),
            callback,
            listeners: Listeners::new(weak),
        });
        let canvas: &EventTarget = &shared.canvas;
        add_listener(canvas, "mousedown", &shared.listeners.mouse_down);
        add_listener(canvas, "touchstart", &shared.listeners.touch_start);

        Ok(WebTrackball { shared })
    }

    /// Column-major view matrix, ready for `uniformMatrix4fv`.
    #[wasm_bindgen(js_name = getViewMatrix)]
    pub fn get_view_matrix(&self) -> Vec<f32> {
        self.shared.dispatcher.rotator().view_matrix_f32().to_vec()
    }

    #[wasm_bindgen(js_name = setViewMatrix)]
    pub fn set_view_matrix(&self, matrix: Vec<f64>) -> Result<(), JsValue> {
        self.shared
            .dispatcher
            .rotator_mut()
            .set_view_matrix(&matrix)
            .map_err(|err| js_error(err.to_string()))
    }

    #[wasm_bindgen(js_name = setView)]
    pub fn set_view(
        &self,
        direction: Option<Vec<f64>>,
        up: Option<Vec<f64>>,
        distance: Option<f64>,
    ) -> Result<(), JsValue> {
        let direction = vector_arg(direction, "direction").map_err(js_error)?;
        let up = vector_arg(up, "up").map_err(js_error)?;
        self.shared
            .dispatcher
            .rotator_mut()
            .set_view(direction, up, distance)
            .map_err(|err| js_error(err.to_string()))
    }

    #[wasm_bindgen(js_name = getViewDistance)]
    pub fn get_view_distance(&self) -> Option<f64> {
        self.shared.dispatcher.rotator().view_distance()
    }

    #[wasm_bindgen(js_name = setViewDistance)]
    pub fn set_view_distance(&self, distance: Option<f64>) {
        self.shared.dispatcher.rotator_mut().set_view_distance(distance);
    }

    #[wasm_bindgen(js_name = getRotationCenter)]
    pub fn get_rotation_center(&self) -> Vec<f64> {
        let center = self.shared.dispatcher.rotator().rotation_center();
        vec![center.x, center.y, center.z]
    }

    #[wasm_bindgen(js_name = setRotationCenter)]
    pub fn set_rotation_center(&self, center: Option<Vec<f64>>) -> Result<(), JsValue> {
        let center = vector_arg(center, "rotation center").map_err(js_error)?;
        self.shared
            .dispatcher
            .rotator_mut()
            .set_rotation_center(center.map(Point3::from));
        Ok(())
    }

    #[wasm_bindgen(js_name = isDragging)]
    pub fn is_dragging(&self) -> bool {
        self.shared.dispatcher.rotator().is_dragging()
    }
}

fn js_error(message: String) -> JsValue {
    JsValue::from_str(&message)
}

/// Accept an optional JS array of exactly three numbers.
fn vector_arg(values: Option<Vec<f64>>, name: &str) -> Result<Option<Vector3<f64>>, String> {
    match values.as_deref() {
        None => Ok(None),
        Some(&[x, y, z]) => Ok(Some(Vector3::new(x, y, z))),
        Some(other) => Err(format!("{name} needs 3 components, got {}", other.len())),
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_arg() {
        assert_eq!(vector_arg(None, "up"), Ok(None));
        assert_eq!(
            vector_arg(Some(vec![1.0, 2.0, 3.0]), "up"),
            Ok(Some(Vector3::new(1.0, 2.0, 3.0)))
        );
        assert_eq!(
            vector_arg(Some(vec![1.0, 2.0]), "up"),
            Err("up needs 3 components, got 2".to_string())
        );
    }
}
