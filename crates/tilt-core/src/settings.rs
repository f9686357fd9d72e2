//! Settings resolution.
//!
//! Every recognized key resolves in the order: explicit option, declared
//! `data-tilt-<key>` attribute on the target, built-in default. Attribute text
//! is read as a JSON literal when it parses and as a raw string otherwise, so
//! `data-tilt-glare` (empty) and `data-tilt-easing="ease-out"` both work.

use crate::constants::*;
use crate::error::TiltError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Restricts tilt to a single rotation axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Axis {
    #[default]
    None,
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKey {
    Reverse,
    Max,
    Perspective,
    Easing,
    Scale,
    Speed,
    Transition,
    Axis,
    Glare,
    MaxGlare,
    GlarePrerender,
    Reset,
    Scroll,
}

impl SettingKey {
    pub const ALL: [SettingKey; 13] = [
        SettingKey::Reverse,
        SettingKey::Max,
        SettingKey::Perspective,
        SettingKey::Easing,
        SettingKey::Scale,
        SettingKey::Speed,
        SettingKey::Transition,
        SettingKey::Axis,
        SettingKey::Glare,
        SettingKey::MaxGlare,
        SettingKey::GlarePrerender,
        SettingKey::Reset,
        SettingKey::Scroll,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SettingKey::Reverse => "reverse",
            SettingKey::Max => "max",
            SettingKey::Perspective => "perspective",
            SettingKey::Easing => "easing",
            SettingKey::Scale => "scale",
            SettingKey::Speed => "speed",
            SettingKey::Transition => "transition",
            SettingKey::Axis => "axis",
            SettingKey::Glare => "glare",
            SettingKey::MaxGlare => "max-glare",
            SettingKey::GlarePrerender => "glare-prerender",
            SettingKey::Reset => "reset",
            SettingKey::Scroll => "scroll",
        }
    }

    /// camelCase spelling accepted in option bags coming from JavaScript.
    pub fn alias(self) -> Option<&'static str> {
        match self {
            SettingKey::MaxGlare => Some("maxGlare"),
            SettingKey::GlarePrerender => Some("glarePrerender"),
            _ => None,
        }
    }

    pub fn attribute_name(self) -> String {
        format!("{ATTRIBUTE_PREFIX}{}", self.name())
    }
}

/// Explicit option bag. Partial; unknown keys are carried but ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TiltOptions(Map<String, Value>);

impl TiltOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object. `null` and empty input mean "no options".
    pub fn from_json(text: &str) -> Result<Self, TiltError> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(TiltError::InvalidOptions(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    pub fn get(&self, key: SettingKey) -> Option<&Value> {
        self.0
            .get(key.name())
            .or_else(|| key.alias().and_then(|alias| self.0.get(alias)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fully resolved, immutable settings snapshot for one controller.
#[derive(Clone, Debug, PartialEq)]
pub struct TiltSettings {
    pub reverse: bool,
    pub max: f64,
    pub perspective: f64,
    pub easing: String,
    pub scale: f64,
    pub speed_ms: u32,
    pub transition: bool,
    pub axis: Axis,
    pub glare: bool,
    pub max_glare: f64,
    pub glare_prerender: bool,
    pub reset: bool,
    pub scroll: bool,
}

impl Default for TiltSettings {
    fn default() -> Self {
        Self {
            reverse: false,
            max: DEFAULT_MAX,
            perspective: DEFAULT_PERSPECTIVE,
            easing: DEFAULT_EASING.to_owned(),
            scale: DEFAULT_SCALE,
            speed_ms: DEFAULT_SPEED_MS,
            transition: true,
            axis: Axis::None,
            glare: false,
            max_glare: DEFAULT_MAX_GLARE,
            glare_prerender: false,
            reset: true,
            scroll: true,
        }
    }
}

impl TiltSettings {
    /// Merges explicit options over declared attribute overrides over defaults.
    ///
    /// `declared` looks up an attribute by its full name (`data-tilt-max`).
    /// Never fails: a value that cannot be used for its key falls back to the
    /// default and is logged.
    pub fn resolve(options: &TiltOptions, declared: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: SettingKey| -> Option<Value> {
            options.get(key).cloned().or_else(|| {
                declared(&key.attribute_name()).map(|text| parse_literal(&text))
            })
        };
        let defaults = Self::default();

        Self {
            reverse: pick(SettingKey::Reverse, &lookup, coerce_flag, defaults.reverse),
            max: pick(SettingKey::Max, &lookup, coerce_number, defaults.max),
            perspective: pick(
                SettingKey::Perspective,
                &lookup,
                coerce_number,
                defaults.perspective,
            ),
            easing: pick(SettingKey::Easing, &lookup, coerce_text, defaults.easing),
            scale: pick(SettingKey::Scale, &lookup, coerce_number, defaults.scale),
            speed_ms: pick(SettingKey::Speed, &lookup, coerce_millis, defaults.speed_ms),
            transition: pick(
                SettingKey::Transition,
                &lookup,
                coerce_flag,
                defaults.transition,
            ),
            axis: pick(SettingKey::Axis, &lookup, coerce_axis, defaults.axis),
            glare: pick(SettingKey::Glare, &lookup, coerce_flag, defaults.glare),
            max_glare: pick(SettingKey::MaxGlare, &lookup, coerce_unit, defaults.max_glare),
            glare_prerender: pick(
                SettingKey::GlarePrerender,
                &lookup,
                coerce_flag,
                defaults.glare_prerender,
            ),
            reset: pick(SettingKey::Reset, &lookup, coerce_flag, defaults.reset),
            scroll: pick(SettingKey::Scroll, &lookup, coerce_flag, defaults.scroll),
        }
    }

    #[inline]
    pub fn reverse_sign(&self) -> f64 {
        if self.reverse {
            -1.0
        } else {
            1.0
        }
    }
}

/// Typed literal when the text is valid JSON, the raw text otherwise.
pub fn parse_literal(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

fn pick<T>(
    key: SettingKey,
    lookup: impl Fn(SettingKey) -> Option<Value>,
    coerce: impl Fn(&Value) -> Option<T>,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => coerce(&raw).unwrap_or_else(|| {
            log::warn!("tilt setting `{}` ignores unusable value {raw}", key.name());
            default
        }),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn coerce_millis(value: &Value) -> Option<u32> {
    coerce_number(value)
        .filter(|ms| *ms >= 0.0)
        .map(|ms| ms.round().min(u32::MAX as f64) as u32)
}

fn coerce_unit(value: &Value) -> Option<f64> {
    coerce_number(value).map(|n| n.clamp(0.0, 1.0))
}

fn coerce_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null => Some(false),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim() {
            "" | "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_axis(value: &Value) -> Option<Axis> {
    match value {
        Value::Null => Some(Axis::None),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "" | "null" | "none" => Some(Axis::None),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
