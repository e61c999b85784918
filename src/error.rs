// Error types for boundary computation and conformance checking.
// Every variant is fatal for the configuration that produced it; the oracle
// stops at the first one and hands it back unchanged.

use crate::formats::{FloatKind, IntKind};
use std::fmt;

/// Type alias for conformance operation results
pub type ConformanceResult<T> = Result<T, ConformanceError>;

/// A (source float, destination integer) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypePair {
    pub float: FloatKind,
    pub int: IntKind,
}

impl TypePair {
    pub const fn new(float: FloatKind, int: IntKind) -> Self {
        TypePair { float, int }
    }
}

impl fmt::Display for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.float, self.int)
    }
}

/// Which lanes of an interleaved input hold the contaminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanePosition {
    Even,
    Odd,
}

impl fmt::Display for LanePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanePosition::Even => f.write_str("even"),
            LanePosition::Odd => f.write_str("odd"),
        }
    }
}

/// Errors reported by the boundary calculator and the conformance oracle.
///
/// Offending values are rendered to strings at the point of failure so the
/// error stays independent of the float and integer types under test.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConformanceError {
    #[error("boundary invariant violated for {pair}: {detail}")]
    BoundaryInvariantViolation { pair: TypePair, detail: String },

    #[error("{configuration} [{stage}]: lane {lane} converted {input} to {actual}, expected {expected}")]
    ExactnessMismatch {
        configuration: String,
        stage: String,
        lane: usize,
        input: String,
        expected: String,
        actual: String,
    },

    #[error("{configuration} [{stage}]: backend returned {actual} lanes, expected {expected}")]
    LaneCountMismatch {
        configuration: String,
        stage: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "{configuration} [{stage}]: lane {lane} converted {input} to {actual} with {contaminant} in the {position} lanes, expected {expected}"
    )]
    LaneIsolationViolation {
        configuration: String,
        stage: String,
        lane: usize,
        input: String,
        contaminant: String,
        position: LanePosition,
        expected: String,
        actual: String,
    },

    #[error("{configuration} [{stage}]: lane {lane} out-of-range input {input} produced {actual}, {check}")]
    RelaxedContractViolation {
        configuration: String,
        stage: String,
        lane: usize,
        input: String,
        actual: String,
        check: String,
    },

    #[error("{configuration}: invalid configuration: {detail}")]
    InvalidConfiguration { configuration: String, detail: String },
}

impl ConformanceError {
    pub(crate) fn boundary(pair: TypePair, detail: impl Into<String>) -> Self {
        ConformanceError::BoundaryInvariantViolation {
            pair,
            detail: detail.into(),
        }
    }

    /// Short name of the error kind, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ConformanceError::BoundaryInvariantViolation { .. } => "BoundaryInvariantViolation",
            ConformanceError::ExactnessMismatch { .. } => "ExactnessMismatch",
            ConformanceError::LaneCountMismatch { .. } => "LaneCountMismatch",
            ConformanceError::LaneIsolationViolation { .. } => "LaneIsolationViolation",
            ConformanceError::RelaxedContractViolation { .. } => "RelaxedContractViolation",
            ConformanceError::InvalidConfiguration { .. } => "InvalidConfiguration",
        }
    }
}
