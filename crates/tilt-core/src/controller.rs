//! The tilt controller: one per bound target.
//!
//! Input handlers only update the sampled state. Writes happen in at most one
//! frame-scheduled callback, and transition fields are cleared by at most one
//! timer; both are cancelled before being re-issued.

use crate::constants::GLARE_SIZE_FACTOR;
use crate::error::TiltError;
use crate::host::{
    EventHandler, EventKind, GlareLayer, Host, Propagation, SubscriptionId, TiltEvent,
};
use crate::settings::{TiltOptions, TiltSettings};
use crate::state::{GyroSample, InteractionState, PendingWrite, Phase};
use crate::values::{
    compute, gyro_to_pointer, wrap_gyro, Geometry, GlareState, TiltValues, Transform, Transition,
};
use glam::DVec2;
use std::cell::RefCell;
use std::rc::Rc;

struct Inner {
    host: Host,
    settings: TiltSettings,
    state: InteractionState,
    glare: Option<Box<dyn GlareLayer>>,
    subscriptions: Vec<SubscriptionId>,
    destroyed: bool,
}

impl Inner {
    fn current_values(&self) -> TiltValues {
        compute(self.state.pointer, &self.state.geometry, &self.settings)
    }

    fn measure(&mut self) {
        self.state.geometry = self.host.surface.measure();
    }

    fn write_values(&self, values: &TiltValues) {
        self.host
            .surface
            .write_transform(&Transform::from_values(values, &self.settings));
        if let Some(glare) = &self.glare {
            glare.write(&GlareState::from_values(values, &self.settings));
        }
    }

    fn write_neutral(&self) {
        self.host
            .surface
            .write_transform(&Transform::neutral(&self.settings));
        if let Some(glare) = &self.glare {
            glare.write(&GlareState::NEUTRAL);
        }
    }

    fn write_transition(&self, on: bool) {
        let target = on.then(|| Transition::for_target(&self.settings));
        self.host.surface.write_transition(target.as_ref());
        if let Some(glare) = &self.glare {
            let t = on.then(|| Transition::for_glare(&self.settings));
            glare.write_transition(t.as_ref());
        }
    }
}

#[derive(Clone)]
pub struct TiltController {
    inner: Rc<RefCell<Inner>>,
}

impl TiltController {
    /// Resolves settings, prepares glare markup and subscribes to every input.
    pub fn new(host: Host, options: &TiltOptions) -> Result<Self, TiltError> {
        let surface = host.surface.clone();
        let settings = TiltSettings::resolve(options, |attr| surface.declared_override(attr));
        let glare = if settings.glare {
            Some(prepare_glare(&host, &settings)?)
        } else {
            None
        };
        log::debug!(
            "[tilt] new controller max={} speed={}ms glare={}",
            settings.max,
            settings.speed_ms,
            settings.glare
        );

        let controller = Self {
            inner: Rc::new(RefCell::new(Inner {
                host,
                settings,
                state: InteractionState::default(),
                glare,
                subscriptions: Vec::new(),
                destroyed: false,
            })),
        };
        controller.bind()?;
        Ok(controller)
    }

    /// Subscribes to the event source. No-op when already bound or destroyed.
    pub fn bind(&self) -> Result<(), TiltError> {
        let (events, with_resize) = {
            let inner = self.inner.borrow();
            if inner.destroyed || !inner.subscriptions.is_empty() {
                return Ok(());
            }
            (inner.host.events.clone(), inner.glare.is_some())
        };

        let mut kinds = vec![
            EventKind::Enter,
            EventKind::Move,
            EventKind::Leave,
            EventKind::TouchStart,
            EventKind::TouchMove,
            EventKind::TouchEnd,
        ];
        if with_resize {
            kinds.push(EventKind::Resize);
        }
        if events.supports(EventKind::Orientation) {
            kinds.push(EventKind::Orientation);
        }

        let mut ids = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let weak = Rc::downgrade(&self.inner);
            let handler: EventHandler = Rc::new(move |event: &TiltEvent| match weak.upgrade() {
                Some(inner) => dispatch(&inner, event),
                None => Propagation::Continue,
            });
            match events.subscribe(kind, handler) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    for id in ids {
                        events.unsubscribe(id);
                    }
                    return Err(e);
                }
            }
        }
        log::debug!("[tilt] bound {} listeners", ids.len());
        self.inner.borrow_mut().subscriptions = ids;
        Ok(())
    }

    /// Removes every subscription. Pending work is left alone.
    pub fn unbind(&self) {
        let (events, ids) = {
            let mut inner = self.inner.borrow_mut();
            (
                inner.host.events.clone(),
                std::mem::take(&mut inner.subscriptions),
            )
        };
        for id in ids {
            events.unsubscribe(id);
        }
    }

    /// Cancels pending work, writes the neutral state and unsubscribes.
    /// Safe to call repeatedly.
    pub fn destroy(&self) {
        {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            if let Some(handle) = inner.state.transition_timeout.take() {
                inner.host.timers.cancel(handle);
            }
            if let Some((handle, _)) = inner.state.scheduled_write.take() {
                inner.host.frames.cancel(handle);
            }
            inner.write_transition(false);
            inner.write_neutral();
            inner.state.touch_engaged = false;
            inner.state.phase = Phase::Idle;
        }
        self.unbind();
        log::debug!("[tilt] destroyed");
    }

    /// Feeds one input event, as a bound event source would.
    pub fn handle(&self, event: &TiltEvent) -> Propagation {
        dispatch(&self.inner, event)
    }

    /// Writes the neutral transform and glare immediately.
    pub fn reset(&self) {
        self.inner.borrow().write_neutral();
    }

    /// Values for the current sample, without writing anything.
    pub fn values(&self) -> TiltValues {
        self.inner.borrow().current_values()
    }

    pub fn settings(&self) -> TiltSettings {
        self.inner.borrow().settings.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.borrow().state.phase
    }

    pub fn geometry(&self) -> Geometry {
        self.inner.borrow().state.geometry
    }

    pub fn is_touch_engaged(&self) -> bool {
        self.inner.borrow().state.touch_engaged
    }

    pub fn has_pending_write(&self) -> bool {
        self.inner.borrow().state.scheduled_write.is_some()
    }

    pub fn has_pending_transition(&self) -> bool {
        self.inner.borrow().state.transition_timeout.is_some()
    }

    pub fn is_bound(&self) -> bool {
        !self.inner.borrow().subscriptions.is_empty()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }

    /// True when both handles drive the same controller.
    pub fn ptr_eq(&self, other: &TiltController) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

fn prepare_glare(host: &Host, settings: &TiltSettings) -> Result<Box<dyn GlareLayer>, TiltError> {
    if settings.glare_prerender {
        return host
            .surface
            .find_glare()
            .ok_or(TiltError::MissingGlareMarkup);
    }
    let layer = host.surface.create_glare()?;
    layer.set_size(host.surface.measure().width * GLARE_SIZE_FACTOR);
    layer.write(&GlareState::NEUTRAL);
    Ok(layer)
}

fn dispatch(rc: &Rc<RefCell<Inner>>, event: &TiltEvent) -> Propagation {
    if rc.borrow().destroyed {
        return Propagation::Continue;
    }
    match *event {
        TiltEvent::Enter => on_enter(rc),
        TiltEvent::Move { x, y } => on_move(rc, x, y),
        TiltEvent::Leave => on_leave(rc),
        TiltEvent::TouchStart => on_touch_start(rc),
        TiltEvent::TouchMove { x, y } => return on_touch_move(rc, x, y),
        TiltEvent::TouchEnd => on_touch_end(rc),
        TiltEvent::Orientation { gamma, beta } => on_orientation(rc, gamma, beta),
        TiltEvent::Resize => on_resize(rc),
    }
    Propagation::Continue
}

fn on_enter(rc: &Rc<RefCell<Inner>>) {
    rc.borrow_mut().state.phase = Phase::Entered;
    begin_interaction(rc);
}

fn on_move(rc: &Rc<RefCell<Inner>>, x: f64, y: f64) {
    {
        let mut inner = rc.borrow_mut();
        inner.state.pointer = DVec2::new(x, y);
        inner.state.phase = Phase::Tracking;
    }
    schedule_write(rc, PendingWrite::Update);
}

fn on_leave(rc: &Rc<RefCell<Inner>>) {
    rc.borrow_mut().state.phase = Phase::Idle;
    end_interaction(rc);
}

fn on_touch_start(rc: &Rc<RefCell<Inner>>) {
    {
        let mut inner = rc.borrow_mut();
        inner.state.touch_engaged = true;
        inner.state.phase = Phase::Touching;
    }
    begin_interaction(rc);
}

fn on_touch_move(rc: &Rc<RefCell<Inner>>, x: f64, y: f64) -> Propagation {
    let scroll = {
        let mut inner = rc.borrow_mut();
        inner.state.touch_engaged = true;
        inner.state.phase = Phase::Touching;
        inner.state.pointer = DVec2::new(x, y);
        inner.settings.scroll
    };
    schedule_write(rc, PendingWrite::Update);
    if scroll {
        Propagation::Consume
    } else {
        Propagation::Continue
    }
}

fn on_touch_end(rc: &Rc<RefCell<Inner>>) {
    {
        let mut inner = rc.borrow_mut();
        inner.state.touch_engaged = false;
        inner.state.phase = Phase::Idle;
    }
    end_interaction(rc);
}

fn on_orientation(rc: &Rc<RefCell<Inner>>, gamma: f64, beta: f64) {
    let delta = rc.borrow_mut().state.sample_gyro(gamma, beta);
    if delta.is_motion() {
        begin_interaction(rc);
    }

    {
        let mut guard = rc.borrow_mut();
        let inner = &mut *guard;
        if inner.state.touch_engaged || !delta.is_significant() {
            return;
        }
        // the wrapped angles become the baseline for the next delta
        let gamma = wrap_gyro(gamma);
        let beta = wrap_gyro(beta);
        inner.state.gyro = GyroSample { gamma, beta };
        inner.state.pointer = gyro_to_pointer(gamma, beta, &inner.state.geometry);
    }
    schedule_write(rc, PendingWrite::Update);
}

fn on_resize(rc: &Rc<RefCell<Inner>>) {
    let inner = rc.borrow();
    if let Some(glare) = &inner.glare {
        glare.set_size(inner.host.surface.measure().width * GLARE_SIZE_FACTOR);
    }
}

fn begin_interaction(rc: &Rc<RefCell<Inner>>) {
    {
        let mut inner = rc.borrow_mut();
        inner.measure();
        inner.host.surface.hint_will_change();
    }
    arm_transition(rc);
}

fn end_interaction(rc: &Rc<RefCell<Inner>>) {
    arm_transition(rc);
    if rc.borrow().settings.reset {
        schedule_write(rc, PendingWrite::Reset);
    }
}

fn arm_transition(rc: &Rc<RefCell<Inner>>) {
    let mut guard = rc.borrow_mut();
    let inner = &mut *guard;
    if !inner.settings.transition {
        return;
    }
    let timers = inner.host.timers.clone();
    if let Some(handle) = inner.state.transition_timeout.take() {
        timers.cancel(handle);
    }
    inner.write_transition(true);

    let weak = Rc::downgrade(rc);
    let handle = timers.after(
        inner.settings.speed_ms,
        Box::new(move || {
            if let Some(rc) = weak.upgrade() {
                clear_transition(&rc);
            }
        }),
    );
    inner.state.transition_timeout = Some(handle);
}

fn clear_transition(rc: &Rc<RefCell<Inner>>) {
    let mut inner = rc.borrow_mut();
    if inner.state.transition_timeout.take().is_none() {
        return;
    }
    inner.write_transition(false);
}

fn schedule_write(rc: &Rc<RefCell<Inner>>, kind: PendingWrite) {
    let mut guard = rc.borrow_mut();
    let inner = &mut *guard;
    let frames = inner.host.frames.clone();
    if let Some((handle, _)) = inner.state.scheduled_write.take() {
        frames.cancel(handle);
    }

    let weak = Rc::downgrade(rc);
    let handle = frames.schedule(Box::new(move || {
        if let Some(rc) = weak.upgrade() {
            run_write(&rc);
        }
    }));
    inner.state.scheduled_write = Some((handle, kind));
}

fn run_write(rc: &Rc<RefCell<Inner>>) {
    let notify = {
        let mut guard = rc.borrow_mut();
        let inner = &mut *guard;
        let Some((_, kind)) = inner.state.scheduled_write.take() else {
            return;
        };
        if inner.destroyed {
            return;
        }
        match kind {
            PendingWrite::Reset => {
                inner.write_neutral();
                None
            }
            PendingWrite::Update => {
                let values = inner.current_values();
                log::trace!(
                    "[tilt] write x={} y={} angle={:.1}",
                    values.tilt_x,
                    values.tilt_y,
                    values.angle
                );
                inner.write_values(&values);
                inner.host.changes.clone().map(|sink| (sink, values))
            }
        }
    };
    if let Some((sink, values)) = notify {
        sink.tilt_changed(&values);
    }
}
