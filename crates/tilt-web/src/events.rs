use std::cell::{Cell, RefCell};
use tilt_core::{
    EventHandler, EventKind, EventSource, Propagation, SubscriptionId, TiltError, TiltEvent,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

use crate::dom::host_err;

#[inline]
pub fn event_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Enter => "mouseenter",
        EventKind::Move => "mousemove",
        EventKind::Leave => "mouseleave",
        EventKind::TouchStart => "touchstart",
        EventKind::TouchMove => "touchmove",
        EventKind::TouchEnd => "touchend",
        EventKind::Orientation => "deviceorientation",
        EventKind::Resize => "resize",
    }
}

/// Reads the payload a controller needs out of a native event.
pub fn translate(kind: EventKind, ev: &web::Event) -> Option<TiltEvent> {
    match kind {
        EventKind::Enter => Some(TiltEvent::Enter),
        EventKind::Leave => Some(TiltEvent::Leave),
        EventKind::TouchStart => Some(TiltEvent::TouchStart),
        EventKind::TouchEnd => Some(TiltEvent::TouchEnd),
        EventKind::Resize => Some(TiltEvent::Resize),
        EventKind::Move => {
            let m = ev.dyn_ref::<web::MouseEvent>()?;
            Some(TiltEvent::Move {
                x: m.client_x() as f64,
                y: m.client_y() as f64,
            })
        }
        EventKind::TouchMove => {
            let touch = ev.dyn_ref::<web::TouchEvent>()?.target_touches().get(0)?;
            Some(TiltEvent::TouchMove {
                x: touch.client_x() as f64,
                y: touch.client_y() as f64,
            })
        }
        EventKind::Orientation => {
            let o = ev.dyn_ref::<web::DeviceOrientationEvent>()?;
            Some(TiltEvent::Orientation {
                gamma: o.gamma()?,
                beta: o.beta()?,
            })
        }
    }
}

/// Runs `handler` for a native event; a consumed event is cancelled.
fn deliver(kind: EventKind, ev: &web::Event, handler: &EventHandler) {
    let Some(event) = translate(kind, ev) else {
        return;
    };
    if handler(&event) == Propagation::Consume {
        ev.prevent_default();
        ev.stop_propagation();
    }
}

struct Listener {
    id: SubscriptionId,
    target: web::EventTarget,
    name: &'static str,
    closure: Closure<dyn FnMut(web::Event)>,
}

/// Element events go to the element; orientation and resize to the window.
pub struct DomEvents {
    element: web::HtmlElement,
    window: web::Window,
    next_id: Cell<u32>,
    listeners: RefCell<Vec<Listener>>,
}

impl DomEvents {
    pub fn new(element: web::HtmlElement, window: web::Window) -> Self {
        Self {
            element,
            window,
            next_id: Cell::new(1),
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn target_for(&self, kind: EventKind) -> web::EventTarget {
        match kind {
            EventKind::Orientation | EventKind::Resize => self.window.clone().into(),
            _ => self.element.clone().into(),
        }
    }
}

impl EventSource for DomEvents {
    fn supports(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Orientation => {
                js_sys::Reflect::has(&self.window, &JsValue::from_str("ondeviceorientation"))
                    .unwrap_or(false)
            }
            _ => true,
        }
    }

    fn subscribe(
        &self,
        kind: EventKind,
        handler: EventHandler,
    ) -> Result<SubscriptionId, TiltError> {
        let target = self.target_for(kind);
        let name = event_name(kind);
        let closure = Closure::wrap(Box::new(move |ev: web::Event| {
            deliver(kind, &ev, &handler);
        }) as Box<dyn FnMut(web::Event)>);

        // touchmove must stay cancelable to suppress scrolling
        let options = web::AddEventListenerOptions::new();
        options.set_passive(kind != EventKind::TouchMove);
        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                name,
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(host_err)?;

        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            target,
            name,
            closure,
        });
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            listeners
                .iter()
                .position(|l| l.id == id)
                .map(|pos| listeners.swap_remove(pos))
        };
        if let Some(l) = removed {
            _ = l
                .target
                .remove_event_listener_with_callback(l.name, l.closure.as_ref().unchecked_ref());
        }
    }
}
