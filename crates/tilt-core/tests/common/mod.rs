// Recording fakes for the controller's collaborators.
// Frames and timers only run when the test says so, which makes every
// scheduling race reproducible.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tilt_core::*;

pub struct GlareLog {
    pub sizes: RefCell<Vec<f64>>,
    pub states: RefCell<Vec<GlareState>>,
    pub transitions: RefCell<Vec<Option<Transition>>>,
}

impl GlareLog {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            sizes: RefCell::new(Vec::new()),
            states: RefCell::new(Vec::new()),
            transitions: RefCell::new(Vec::new()),
        })
    }

    pub fn last_state(&self) -> Option<GlareState> {
        self.states.borrow().last().copied()
    }

    pub fn last_transition(&self) -> Option<Transition> {
        self.transitions.borrow().last().cloned().flatten()
    }
}

struct FakeGlare(Rc<GlareLog>);

impl GlareLayer for FakeGlare {
    fn set_size(&self, side_px: f64) {
        self.0.sizes.borrow_mut().push(side_px);
    }
    fn write(&self, state: &GlareState) {
        self.0.states.borrow_mut().push(*state);
    }
    fn write_transition(&self, transition: Option<&Transition>) {
        self.0.transitions.borrow_mut().push(transition.cloned());
    }
}

pub struct FakeSurface {
    pub geometry: Cell<Geometry>,
    pub attributes: RefCell<Vec<(String, String)>>,
    pub transforms: RefCell<Vec<Transform>>,
    pub transitions: RefCell<Vec<Option<Transition>>>,
    pub will_change_hints: Cell<u32>,
    pub measures: Cell<u32>,
    pub prerendered_glare: Cell<bool>,
    pub glare: RefCell<Option<Rc<GlareLog>>>,
}

impl FakeSurface {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Cell::new(geometry),
            attributes: RefCell::new(Vec::new()),
            transforms: RefCell::new(Vec::new()),
            transitions: RefCell::new(Vec::new()),
            will_change_hints: Cell::new(0),
            measures: Cell::new(0),
            prerendered_glare: Cell::new(false),
            glare: RefCell::new(None),
        }
    }

    pub fn declare(&self, attribute: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .push((attribute.to_owned(), value.to_owned()));
    }

    pub fn last_transform(&self) -> Option<Transform> {
        self.transforms.borrow().last().copied()
    }

    pub fn transition(&self) -> Option<Transition> {
        self.transitions.borrow().last().cloned().flatten()
    }

    pub fn glare_log(&self) -> Rc<GlareLog> {
        self.glare.borrow().clone().expect("glare layer was never created")
    }
}

impl Surface for FakeSurface {
    fn measure(&self) -> Geometry {
        self.measures.set(self.measures.get() + 1);
        self.geometry.get()
    }

    fn declared_override(&self, attribute: &str) -> Option<String> {
        self.attributes
            .borrow()
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, value)| value.clone())
    }

    fn write_transform(&self, transform: &Transform) {
        self.transforms.borrow_mut().push(*transform);
    }

    fn write_transition(&self, transition: Option<&Transition>) {
        self.transitions.borrow_mut().push(transition.cloned());
    }

    fn hint_will_change(&self) {
        self.will_change_hints.set(self.will_change_hints.get() + 1);
    }

    fn create_glare(&self) -> Result<Box<dyn GlareLayer>, TiltError> {
        let log = GlareLog::new();
        *self.glare.borrow_mut() = Some(log.clone());
        Ok(Box::new(FakeGlare(log)))
    }

    fn find_glare(&self) -> Option<Box<dyn GlareLayer>> {
        if !self.prerendered_glare.get() {
            return None;
        }
        let log = GlareLog::new();
        *self.glare.borrow_mut() = Some(log.clone());
        Some(Box::new(FakeGlare(log)))
    }
}

pub struct FakeEvents {
    next_id: Cell<u32>,
    pub orientation_supported: Cell<bool>,
    subscriptions: RefCell<Vec<(SubscriptionId, EventKind, EventHandler)>>,
}

impl FakeEvents {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            orientation_supported: Cell::new(true),
            subscriptions: RefCell::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.subscriptions.borrow().iter().map(|(_, k, _)| *k).collect()
    }

    /// Delivers an event to every matching subscriber; Consume wins.
    pub fn emit(&self, event: TiltEvent) -> Propagation {
        let handlers: Vec<EventHandler> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind())
            .map(|(_, _, h)| h.clone())
            .collect();
        let mut out = Propagation::Continue;
        for handler in handlers {
            if handler(&event) == Propagation::Consume {
                out = Propagation::Consume;
            }
        }
        out
    }
}

impl EventSource for FakeEvents {
    fn supports(&self, kind: EventKind) -> bool {
        kind != EventKind::Orientation || self.orientation_supported.get()
    }

    fn subscribe(
        &self,
        kind: EventKind,
        handler: EventHandler,
    ) -> Result<SubscriptionId, TiltError> {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscriptions.borrow_mut().push((id, kind, handler));
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.borrow_mut().retain(|(sid, _, _)| *sid != id);
    }
}

type FrameCallback = (FrameHandle, Box<dyn FnOnce()>);

pub struct ManualFrames {
    next: Cell<i32>,
    pending: RefCell<Vec<FrameCallback>>,
    pub scheduled: Cell<u32>,
    pub cancelled: Cell<u32>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self {
            next: Cell::new(1),
            pending: RefCell::new(Vec::new()),
            scheduled: Cell::new(0),
            cancelled: Cell::new(0),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Runs everything queued before this call; returns how many callbacks ran.
    pub fn run_frame(&self) -> usize {
        let batch: Vec<FrameCallback> = self.pending.borrow_mut().drain(..).collect();
        let n = batch.len();
        for (_, callback) in batch {
            callback();
        }
        n
    }
}

impl FrameScheduler for ManualFrames {
    fn schedule(&self, callback: Box<dyn FnOnce()>) -> FrameHandle {
        let handle = FrameHandle(self.next.get());
        self.next.set(handle.0 + 1);
        self.scheduled.set(self.scheduled.get() + 1);
        self.pending.borrow_mut().push((handle, callback));
        handle
    }

    fn cancel(&self, handle: FrameHandle) {
        let mut pending = self.pending.borrow_mut();
        let before = pending.len();
        pending.retain(|(h, _)| *h != handle);
        if pending.len() != before {
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }
}

type TimerCallback = (TimerHandle, u64, Box<dyn FnOnce()>);

pub struct ManualTimers {
    next: Cell<i32>,
    now_ms: Cell<u64>,
    pending: RefCell<Vec<TimerCallback>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self {
            next: Cell::new(1),
            now_ms: Cell::new(0),
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Moves the clock forward and fires every timer that came due, in order.
    pub fn advance(&self, ms: u64) {
        let now = self.now_ms.get() + ms;
        self.now_ms.set(now);
        loop {
            let due = {
                let mut pending = self.pending.borrow_mut();
                let next = pending
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, at, _))| *at <= now)
                    .min_by_key(|(_, (_, at, _))| *at)
                    .map(|(i, _)| i);
                next.map(|i| pending.remove(i))
            };
            match due {
                Some((_, _, callback)) => callback(),
                None => break,
            }
        }
    }
}

impl Timer for ManualTimers {
    fn after(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let handle = TimerHandle(self.next.get());
        self.next.set(handle.0 + 1);
        let due = self.now_ms.get() + delay_ms as u64;
        self.pending.borrow_mut().push((handle, due, callback));
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        self.pending.borrow_mut().retain(|(h, _, _)| *h != handle);
    }
}

#[derive(Default)]
pub struct RecordingChanges {
    pub values: RefCell<Vec<TiltValues>>,
}

impl ChangeSink for RecordingChanges {
    fn tilt_changed(&self, values: &TiltValues) {
        self.values.borrow_mut().push(*values);
    }
}

pub struct Fixture {
    pub surface: Rc<FakeSurface>,
    pub events: Rc<FakeEvents>,
    pub frames: Rc<ManualFrames>,
    pub timers: Rc<ManualTimers>,
    pub changes: Rc<RecordingChanges>,
}

impl Fixture {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            surface: Rc::new(FakeSurface::new(geometry)),
            events: Rc::new(FakeEvents::new()),
            frames: Rc::new(ManualFrames::new()),
            timers: Rc::new(ManualTimers::new()),
            changes: Rc::new(RecordingChanges::default()),
        }
    }

    /// 200x100 box at the origin.
    pub fn card() -> Self {
        Self::new(Geometry::new(0.0, 0.0, 200.0, 100.0))
    }

    pub fn host(&self) -> Host {
        Host {
            surface: self.surface.clone(),
            events: self.events.clone(),
            frames: self.frames.clone(),
            timers: self.timers.clone(),
            changes: Some(self.changes.clone()),
        }
    }

    pub fn controller(&self, options: &TiltOptions) -> TiltController {
        TiltController::new(self.host(), options).expect("controller")
    }
}
