pub mod constants;
pub mod controller;
pub mod error;
pub mod host;
pub mod registry;
pub mod settings;
pub mod state;
pub mod values;

pub use controller::TiltController;
pub use error::TiltError;
pub use host::*;
pub use registry::TiltRegistry;
pub use settings::{Axis, SettingKey, TiltOptions, TiltSettings};
pub use state::Phase;
pub use values::{compute, Geometry, GlareState, TiltValues, Transform, Transition};
