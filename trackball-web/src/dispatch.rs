/// Pointer dispatch for the canvas host, independent of the DOM
///
/// Owns the rotator behind a `RefCell`, drops events that arrive while an
/// update is running, and reports which listener groups must be attached or
/// detached so that they always match the rotator's drag state.
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;
use trackball_core::{DragSource, PointerInput, Surface, TrackballRotator};

/// Listeners that only exist while a drag is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerGroup {
    /// `mousemove` and `mouseup` on the document.
    DocumentMouse,
    /// `touchmove`, `touchend` and `touchcancel` on the canvas.
    CanvasTouch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerChange {
    Attach(ListenerGroup),
    Detach(ListenerGroup),
}

/// What the host has to do after an event.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Dispatch {
    /// False when the event was dropped as re-entrant.
    pub handled: bool,
    /// The view changed and the page should redraw.
    pub redraw: bool,
    pub changes: Vec<ListenerChange>,
}

pub(crate) struct Dispatcher<S> {
    rotator: RefCell<TrackballRotator<S>>,
    redraw_pending: Rc<Cell<bool>>,
    document_mouse: Cell<bool>,
    canvas_touch: Cell<bool>,
}

impl<S: Surface> Dispatcher<S> {
    pub fn new(rotator: TrackballRotator<S>) -> Self {
        let redraw_pending = Rc::new(Cell::new(false));
        let flag = Rc::clone(&redraw_pending);
        Self {
            rotator: RefCell::new(rotator.with_redraw(move |_| flag.set(true))),
            redraw_pending,
            document_mouse: Cell::new(false),
            canvas_touch: Cell::new(false),
        }
    }

    pub fn rotator(&self) -> Ref<'_, TrackballRotator<S>> {
        self.rotator.borrow()
    }

    pub fn rotator_mut(&self) -> RefMut<'_, TrackballRotator<S>> {
        self.rotator.borrow_mut()
    }

    /// Feed one pointer event to the rotator.
    pub fn dispatch(&self, input: PointerInput<'_>) -> Dispatch {
        let handled = match self.rotator.try_borrow_mut() {
            Ok(mut rotator) => {
                rotator.handle(input);
                true
            }
            Err(_) => {
                log::debug!("dropping re-entrant pointer event");
                false
            }
        };
        Dispatch {
            handled,
            redraw: self.redraw_pending.replace(false),
            changes: if handled { self.sync_listeners() } else { Vec::new() },
        }
    }

    /// Groups currently attached, for teardown.
    pub fn attached(&self) -> Vec<ListenerGroup> {
        let mut groups = Vec::new();
        if self.document_mouse.get() {
            groups.push(ListenerGroup::DocumentMouse);
        }
        if self.canvas_touch.get() {
            groups.push(ListenerGroup::CanvasTouch);
        }
        groups
    }

    fn sync_listeners(&self) -> Vec<ListenerChange> {
        let Ok(rotator) = self.rotator.try_borrow() else {
            return Vec::new();
        };
        let source = rotator.drag_source();
        let mut changes = Vec::new();
        for (group, attached, wanted) in [
            (
                ListenerGroup::DocumentMouse,
                &self.document_mouse,
                source == Some(DragSource::Mouse),
            ),
            (
                ListenerGroup::CanvasTouch,
                &self.canvas_touch,
                source == Some(DragSource::Touch),
            ),
        ] {
            if attached.replace(wanted) != wanted {
                changes.push(if wanted {
                    ListenerChange::Attach(group)
                } else {
                    ListenerChange::Detach(group)
                });
            }
        }
        changes
    }
}
