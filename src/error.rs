//! Error types.
//!
//! Construction errors (bad probabilities, malformed update text, ill-formed
//! programs) abort building the [`Update`][crate::update::Update] or
//! [`Program`][crate::program::Program] entirely. Solver errors are
//! unrecoverable for the EVAR being solved: the engine has no fallback
//! strategy, so an exact closed form is either produced or the call fails.

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("branch probabilities for `{variable}` sum up to {sum}, not 1")]
    ProbabilityMismatch { variable: String, sum: String },

    #[error("invalid probability for `{variable}`: {message}")]
    InvalidProbability { variable: String, message: String },

    #[error("cannot parse `{input}`: {message}")]
    Parse { input: String, message: String },

    #[error("unknown distribution `{0}`")]
    UnknownDistribution(String),

    #[error("invalid parameters for distribution `{distribution}`: {message}")]
    InvalidDistribution {
        distribution: String,
        message: String,
    },

    #[error("`{0}` is reserved for the iteration index")]
    ReservedSymbol(String),

    #[error("variable `{0}` is declared twice")]
    DuplicateVariable(String),

    #[error("variable `{0}` has no {1}")]
    MissingUpdate(String, &'static str),

    #[error("`{0}` is not a program variable")]
    UnknownVariable(String),

    #[error("`{0}` is not a polynomial in the program variables")]
    NotPolynomial(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("EVAR `{0}` depends on itself through its inhomogeneous part")]
    CyclicDependency(String),

    #[error("dependency chain deeper than {0} EVARs")]
    DepthExceeded(usize),
}

impl Error {
    pub(crate) fn parse(input: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            input: input.into(),
            message: message.into(),
        }
    }
}
