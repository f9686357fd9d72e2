use thiserror::Error;

/// Construction and wiring failures. Interaction itself never fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TiltError {
    #[error("can't initialize tilt because {0} is not an element")]
    InvalidTarget(String),

    #[error("glare-prerender is set but .js-tilt-glare / .js-tilt-glare-inner markup is missing")]
    MissingGlareMarkup,

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("host call failed: {0}")]
    Host(String),
}

impl From<serde_json::Error> for TiltError {
    fn from(err: serde_json::Error) -> Self {
        TiltError::InvalidOptions(err.to_string())
    }
}
