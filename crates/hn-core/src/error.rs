use thiserror::Error;

pub type HnResult<T> = Result<T, HnError>;

#[derive(Error, Debug)]
pub enum HnError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-positive value for {what}: {value}")]
    NonPositive { what: &'static str, value: f64 },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}
