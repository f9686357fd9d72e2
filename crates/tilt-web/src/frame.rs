use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tilt_core::{FrameHandle, FrameScheduler, Timer, TimerHandle};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

struct Slot {
    id: i32,
    fired: Rc<Cell<bool>>,
    _closure: Closure<dyn FnMut()>,
}

/// Owns the JS callbacks handed to the browser until they run or are cancelled.
///
/// A closure is never dropped while it executes: ones that already ran are
/// swept on the next `arm` or `release`.
#[derive(Default)]
struct Slots {
    slots: RefCell<Vec<Slot>>,
}

impl Slots {
    fn arm(
        &self,
        callback: Box<dyn FnOnce()>,
        register: impl FnOnce(&js_sys::Function) -> Result<i32, JsValue>,
    ) -> Result<i32, JsValue> {
        self.sweep();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let closure: Closure<dyn FnMut()> = Closure::once(move || {
            callback();
            flag.set(true);
        });
        let id = register(closure.as_ref().unchecked_ref())?;
        self.slots.borrow_mut().push(Slot {
            id,
            fired,
            _closure: closure,
        });
        Ok(id)
    }

    fn release(&self, id: i32) {
        self.slots
            .borrow_mut()
            .retain(|s| s.id != id && !s.fired.get());
    }

    fn sweep(&self) {
        self.slots.borrow_mut().retain(|s| !s.fired.get());
    }

    fn len(&self) -> usize {
        self.slots.borrow().len()
    }
}

/// `requestAnimationFrame` / `cancelAnimationFrame`.
pub struct AnimationFrames {
    window: web::Window,
    slots: Slots,
}

impl AnimationFrames {
    pub fn new(window: web::Window) -> Self {
        Self {
            window,
            slots: Slots::default(),
        }
    }

    /// Callbacks still held on the Rust side.
    pub fn retained(&self) -> usize {
        self.slots.len()
    }
}

impl FrameScheduler for AnimationFrames {
    fn schedule(&self, callback: Box<dyn FnOnce()>) -> FrameHandle {
        match self
            .slots
            .arm(callback, |f| self.window.request_animation_frame(f))
        {
            Ok(id) => FrameHandle(id),
            Err(e) => {
                log::warn!("[tilt] requestAnimationFrame failed: {:?}", e);
                FrameHandle(0)
            }
        }
    }

    fn cancel(&self, handle: FrameHandle) {
        _ = self.window.cancel_animation_frame(handle.0);
        self.slots.release(handle.0);
    }
}

/// `setTimeout` / `clearTimeout`.
pub struct WindowTimers {
    window: web::Window,
    slots: Slots,
}

impl WindowTimers {
    pub fn new(window: web::Window) -> Self {
        Self {
            window,
            slots: Slots::default(),
        }
    }

    pub fn retained(&self) -> usize {
        self.slots.len()
    }
}

impl Timer for WindowTimers {
    fn after(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let delay = delay_ms.min(i32::MAX as u32) as i32;
        let armed = self.slots.arm(callback, |f| {
            self.window
                .set_timeout_with_callback_and_timeout_and_arguments_0(f, delay)
        });
        match armed {
            Ok(id) => TimerHandle(id),
            Err(e) => {
                log::warn!("[tilt] setTimeout failed: {:?}", e);
                TimerHandle(0)
            }
        }
    }

    fn cancel(&self, handle: TimerHandle) {
        self.window.clear_timeout_with_handle(handle.0);
        self.slots.release(handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn cancelled_frames_release_their_callbacks() {
        let frames = AnimationFrames::new(web::window().unwrap());
        let mut handle = frames.schedule(Box::new(|| {}));
        for _ in 0..10 {
            frames.cancel(handle);
            handle = frames.schedule(Box::new(|| {}));
        }
        assert_eq!(frames.retained(), 1);
        frames.cancel(handle);
        assert_eq!(frames.retained(), 0);
    }

    #[wasm_bindgen_test]
    fn cancelled_timers_release_their_callbacks() {
        let timers = WindowTimers::new(web::window().unwrap());
        let handles: Vec<_> = (0..10)
            .map(|_| timers.after(60_000, Box::new(|| {})))
            .collect();
        assert_eq!(timers.retained(), 10);
        for handle in handles {
            timers.cancel(handle);
        }
        assert_eq!(timers.retained(), 0);
    }

    #[wasm_bindgen_test]
    async fn fired_timer_is_swept_on_next_arm() {
        let timers = WindowTimers::new(web::window().unwrap());
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        timers.after(0, Box::new(move || flag.set(true)));
        sleep(20).await;
        assert!(ran.get());
        timers.after(60_000, Box::new(|| {}));
        assert_eq!(timers.retained(), 1);
    }

    async fn sleep(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            _ = web::window()
                .unwrap()
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        });
        _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }
}
