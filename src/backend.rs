//! The fast conversion family under test.
//!
//! A vector-math backend exposes seven ways of turning a vector of floats
//! into a vector of integers. They differ in how destination width relates
//! to source width and in which source lanes reach the output:
//!
//! | Variant       | Widths            | Output lanes | Source lane of output `i` |
//! |---------------|-------------------|--------------|---------------------------|
//! | `Reinterpret` | equal             | `N`          | `i`                       |
//! | `Widen`       | dest wider        | `N`          | `i`                       |
//! | `Narrow`      | dest narrower     | `N`          | `i`                       |
//! | `LowerHalf`   | dest twice source | `N / 2`      | `i`                       |
//! | `UpperHalf`   | dest twice source | `N / 2`      | `N / 2 + i`               |
//! | `Even`        | dest twice source | `N / 2`      | `2 i`                     |
//! | `Odd`         | dest twice source | `N / 2`      | `2 i + 1`                 |
//!
//! The variant is chosen once per configuration and passed explicitly to the
//! backend.

use crate::formats::{DestInt, SourceFloat};
use crate::lanes::LaneVector;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionVariant {
    /// Same lane width; numeric conversion lane for lane.
    Reinterpret,
    Widen,
    Narrow,
    LowerHalf,
    UpperHalf,
    Even,
    Odd,
}

impl ConversionVariant {
    /// The lane-preserving variant for a pair of element widths.
    pub fn for_widths(source_bits: u32, dest_bits: u32) -> Self {
        if dest_bits == source_bits {
            ConversionVariant::Reinterpret
        } else if dest_bits > source_bits {
            ConversionVariant::Widen
        } else {
            ConversionVariant::Narrow
        }
    }

    /// Every variant a backend offers for these widths at `lanes` lanes.
    ///
    /// The half and even/odd extractions need a destination exactly twice as
    /// wide as the source and an even lane count of at least two.
    pub fn applicable(source_bits: u32, dest_bits: u32, lanes: usize) -> Vec<Self> {
        let mut variants = vec![ConversionVariant::for_widths(source_bits, dest_bits)];
        if dest_bits == 2 * source_bits && lanes >= 2 && lanes % 2 == 0 {
            variants.extend_from_slice(&[
                ConversionVariant::LowerHalf,
                ConversionVariant::UpperHalf,
                ConversionVariant::Even,
                ConversionVariant::Odd,
            ]);
        }
        variants
    }

    pub fn is_split(self) -> bool {
        matches!(
            self,
            ConversionVariant::LowerHalf
                | ConversionVariant::UpperHalf
                | ConversionVariant::Even
                | ConversionVariant::Odd
        )
    }

    pub fn output_lanes(self, input_lanes: usize) -> usize {
        if self.is_split() {
            input_lanes / 2
        } else {
            input_lanes
        }
    }

    /// Index of the input lane that output lane `output` is converted from.
    pub fn source_lane(self, output: usize, input_lanes: usize) -> usize {
        match self {
            ConversionVariant::Reinterpret
            | ConversionVariant::Widen
            | ConversionVariant::Narrow
            | ConversionVariant::LowerHalf => output,
            ConversionVariant::UpperHalf => input_lanes / 2 + output,
            ConversionVariant::Even => 2 * output,
            ConversionVariant::Odd => 2 * output + 1,
        }
    }

    /// Gathers per-input-lane values into the variant's output order.
    pub fn select<T: Copy>(self, per_input: &LaneVector<T>) -> LaneVector<T> {
        let input_lanes = per_input.len();
        LaneVector::from_fn(self.output_lanes(input_lanes), |i| {
            per_input.lane(self.source_lane(i, input_lanes))
        })
    }
}

impl fmt::Display for ConversionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A family of fast float-to-integer conversions.
///
/// Implementations may do anything for inputs outside the safe range except
/// trap; inside it every output lane must equal the truncated input lane.
pub trait ConversionFamily {
    fn name(&self) -> &str;

    fn fast_convert<F: SourceFloat, I: DestInt>(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
    ) -> LaneVector<I>;
}

/// Portable lane-by-lane implementation of every variant.
///
/// Out-of-range lanes saturate and NaN converts to zero, following the
/// language cast.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarBackend;

impl ConversionFamily for ScalarBackend {
    fn name(&self) -> &str {
        "scalar"
    }

    fn fast_convert<F: SourceFloat, I: DestInt>(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
    ) -> LaneVector<I> {
        variant
            .select(from)
            .map(|lane| I::from_f64_truncating(lane.to_f64()))
    }
}
