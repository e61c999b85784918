//! # f2i-conformance
//!
//! Boundary calculator and randomized conformance oracle for "fast"
//! float-to-integer conversions in a portable vector-math layer.
//!
//! A fast conversion skips saturation and NaN handling and is only defined
//! for inputs inside a type-pair-specific safe range. This crate computes
//! that range exactly for every (float, integer) pair and checks a
//! conversion backend against it:
//!
//! - in-range lanes convert exactly (truncation toward zero),
//! - NaN or infinity in one lane never disturbs another lane,
//! - finite out-of-range lanes produce some readable result without trapping.
//!
//! ```rust
//! use f2i_conformance::{compute_boundary, verify_configuration, OracleConfig, ScalarBackend};
//!
//! let boundary = compute_boundary::<f32, i32>().unwrap();
//! assert_eq!(boundary.lowest, -2147483648.0);
//! assert_eq!(boundary.highest, 2147483520.0);
//!
//! verify_configuration::<f32, i64, _>(&ScalarBackend, 4, &OracleConfig::default()).unwrap();
//! ```

pub mod backend;
pub mod boundary;
pub mod config;
pub mod error;
pub mod formats;
pub mod lanes;
pub mod oracle;
pub mod random;
pub mod reference;
pub mod suite;
pub mod synthesis;

// Re-export core types for easy access
pub use backend::{ConversionFamily, ConversionVariant, ScalarBackend};
pub use boundary::{
    compute_boundary, highest_in_range, i64_to_rounded_down_f64, largest_below_one, lowest_in_range,
    round_down_to_precision, rounded_down_sum, supported_pairs, u64_to_rounded_down_f64, BoundaryTable,
    ConversionBoundary,
};
pub use config::{OracleConfig, RepetitionMode};
pub use error::{ConformanceError, ConformanceResult, LanePosition, TypePair};
pub use formats::{DestInt, FloatFormat, FloatKind, IntFormat, IntKind, SourceFloat};
pub use lanes::LaneVector;
pub use oracle::{Configuration, ConformanceOracle, Contaminant, OracleStats, Stage};
pub use random::RandomStream;
pub use reference::ReferenceConverter;
pub use suite::{assert_conforms, verify_all, verify_configuration};
pub use synthesis::{InRangeSampler, OutOfRangeSynthesizer, SignChoice};
