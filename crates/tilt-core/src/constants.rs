// Tuning constants and fixed markup/attribute contracts shared with the web frontend.

// Declared per-element overrides live under this attribute prefix, e.g. `data-tilt-max`
pub const ATTRIBUTE_PREFIX: &str = "data-tilt-";
// Marker attribute scanned by the bulk bootstrap
pub const BOOTSTRAP_ATTRIBUTE: &str = "data-tilt";

// Orientation input
pub const GYRO_DELTA_THRESHOLD: f64 = 0.2; // degrees; smaller changes are sensor jitter
pub const GYRO_RANGE_MIN: f64 = -90.0;
pub const GYRO_RANGE_MAX: f64 = 90.0;

// Neutral presentation state
pub const NEUTRAL_GLARE_ROTATION_DEG: f64 = 180.0;
pub const NEUTRAL_GLARE_OPACITY: f64 = 0.0;

// Glare layer is a square this many times the target width, so rotation never shows its edges
pub const GLARE_SIZE_FACTOR: f64 = 2.0;

// Glare markup contract (auto-created or pre-rendered)
pub const GLARE_WRAPPER_CLASS: &str = "js-tilt-glare";
pub const GLARE_INNER_CLASS: &str = "js-tilt-glare-inner";

// Change notification event name dispatched on the target
pub const CHANGE_EVENT: &str = "tiltChange";

// Built-in defaults
pub const DEFAULT_MAX: f64 = 35.0;
pub const DEFAULT_PERSPECTIVE: f64 = 1000.0;
pub const DEFAULT_EASING: &str = "cubic-bezier(.03,.98,.52,.99)";
pub const DEFAULT_SCALE: f64 = 1.0;
pub const DEFAULT_SPEED_MS: u32 = 300;
pub const DEFAULT_MAX_GLARE: f64 = 1.0;
