//! Collaborators the controller is built against. The web crate implements
//! them over DOM objects; tests implement them with recording fakes.

use crate::error::TiltError;
use crate::values::{Geometry, GlareState, TiltValues, Transform, Transition};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u32);

/// Input delivered to a bound controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TiltEvent {
    Enter,
    Move { x: f64, y: f64 },
    Leave,
    TouchStart,
    TouchMove { x: f64, y: f64 },
    TouchEnd,
    Orientation { gamma: f64, beta: f64 },
    Resize,
}

impl TiltEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TiltEvent::Enter => EventKind::Enter,
            TiltEvent::Move { .. } => EventKind::Move,
            TiltEvent::Leave => EventKind::Leave,
            TiltEvent::TouchStart => EventKind::TouchStart,
            TiltEvent::TouchMove { .. } => EventKind::TouchMove,
            TiltEvent::TouchEnd => EventKind::TouchEnd,
            TiltEvent::Orientation { .. } => EventKind::Orientation,
            TiltEvent::Resize => EventKind::Resize,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Enter,
    Move,
    Leave,
    TouchStart,
    TouchMove,
    TouchEnd,
    Orientation,
    Resize,
}

/// What the event source should do with the native event after handling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Propagation {
    #[default]
    Continue,
    /// Suppress the default action and stop propagation (touch scrolling).
    Consume,
}

pub type EventHandler = Rc<dyn Fn(&TiltEvent) -> Propagation>;

/// The bound target: geometry, declared overrides and the presentation sink.
pub trait Surface {
    fn measure(&self) -> Geometry;
    /// Attribute text by full name, e.g. `data-tilt-max`.
    fn declared_override(&self, attribute: &str) -> Option<String>;
    fn write_transform(&self, transform: &Transform);
    /// `None` clears the transition.
    fn write_transition(&self, transition: Option<&Transition>);
    fn hint_will_change(&self);
    /// Builds the wrapper + inner glare markup under the target.
    fn create_glare(&self) -> Result<Box<dyn GlareLayer>, TiltError>;
    /// Locates pre-rendered glare markup.
    fn find_glare(&self) -> Option<Box<dyn GlareLayer>>;
}

pub trait GlareLayer {
    fn set_size(&self, side_px: f64);
    fn write(&self, state: &GlareState);
    fn write_transition(&self, transition: Option<&Transition>);
}

pub trait ChangeSink {
    fn tilt_changed(&self, values: &TiltValues);
}

pub trait EventSource {
    fn supports(&self, _kind: EventKind) -> bool {
        true
    }
    fn subscribe(
        &self,
        kind: EventKind,
        handler: EventHandler,
    ) -> Result<SubscriptionId, TiltError>;
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Runs a callback once before the next repaint; never after `cancel`.
pub trait FrameScheduler {
    fn schedule(&self, callback: Box<dyn FnOnce()>) -> FrameHandle;
    fn cancel(&self, handle: FrameHandle);
}

pub trait Timer {
    fn after(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle;
    fn cancel(&self, handle: TimerHandle);
}

/// Everything one controller needs from its environment.
#[derive(Clone)]
pub struct Host {
    pub surface: Rc<dyn Surface>,
    pub events: Rc<dyn EventSource>,
    pub frames: Rc<dyn FrameScheduler>,
    pub timers: Rc<dyn Timer>,
    pub changes: Option<Rc<dyn ChangeSink>>,
}
