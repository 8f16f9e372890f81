use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Anything that can go wrong while reading, normalising, or writing a
/// database. Every error is fatal to the pass that produced it; nothing is
/// retried and a partially built database is discarded by the caller.
#[derive(Debug)]
pub enum Error {
    // A label already taken by a symbol, an assertion, or a hypothesis.
    DuplicateLabel(String),

    // An expression refers to a math symbol that was never declared.
    UnknownSymbol(String),

    // A $f statement whose body is not exactly a constant and a variable,
    // or whose variable is already typed by another $f in scope.
    MalformedFloatingHypothesis(String),

    // A $d statement whose operands are not two distinct variables.
    MalformedDisjointRestriction(String),

    // Mismatched ${ / $}, or a labelled scope.
    BadScopeBoundary(String),

    // A proof step label that is neither an assertion nor a hypothesis
    // visible from the theorem.
    UnrecognisedStep(String),

    // An invalid character or misplaced Z / ? in a compressed proof.
    CompressedProofSyntax(String),

    // A compressed-proof number beyond the addressable range.
    NumberOutOfRange { number: usize, limit: usize },

    // The post-order stack simulation underflowed or finished with more
    // than one entry.
    ArityViolation(String),

    // A malformed statement stream: unexpected token or end of input.
    Syntax(String),

    Io(io::Error),

    // A broken invariant inside the engine. Always a bug in this crate.
    Internal(String),
}

impl Error {
    pub fn syntax(message: impl Into<String>) -> Error {
        Error::Syntax(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Error {
        Error::Internal(message.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateLabel(label) => {
                write!(f, "label \"{}\" is already in use", label)
            }
            Error::UnknownSymbol(token) => {
                write!(f, "unknown math symbol \"{}\"", token)
            }
            Error::MalformedFloatingHypothesis(detail) => {
                write!(f, "malformed floating hypothesis: {}", detail)
            }
            Error::MalformedDisjointRestriction(detail) => {
                write!(f, "malformed disjoint variable restriction: {}", detail)
            }
            Error::BadScopeBoundary(detail) => {
                write!(f, "bad scope boundary: {}", detail)
            }
            Error::UnrecognisedStep(label) => {
                write!(f, "proof step \"{}\" is not a known assertion or hypothesis", label)
            }
            Error::CompressedProofSyntax(detail) => {
                write!(f, "invalid compressed proof: {}", detail)
            }
            Error::NumberOutOfRange { number, limit } => {
                write!(
                    f,
                    "compressed proof number {} out of range (at most {} steps are addressable)",
                    number, limit
                )
            }
            Error::ArityViolation(detail) => {
                write!(f, "proof is not a valid post-order tree: {}", detail)
            }
            Error::Syntax(detail) => write!(f, "syntax error: {}", detail),
            Error::Io(e) => write!(f, "{}", e),
            Error::Internal(detail) => write!(f, "internal error: {}", detail),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}
