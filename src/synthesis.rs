// Random inputs on either side of a conversion boundary.
//
// Both generators work on bit patterns: for non-negative floats the bit
// pattern order matches the numeric order, so "one above the boundary's bits"
// is the next representable value outside the range.

use crate::boundary::ConversionBoundary;
use crate::formats::{IntFormat, SourceFloat};
use crate::random::RandomStream;
use std::marker::PhantomData;

/// Draws random values that every fast conversion to some integer type must
/// handle exactly.
///
/// One random word feeds each sample: mantissa bits (and for signed
/// destinations the sign bit) come straight from the word, the exponent
/// field is drawn from the band of exponents whose values stay below
/// `2^value_bits` of the destination.
#[derive(Debug, Clone, Copy)]
pub struct InRangeSampler<F> {
    exponent_band: u64,
    mantissa_and_sign_mask: u64,
    _source: PhantomData<F>,
}

impl<F: SourceFloat> InRangeSampler<F> {
    pub fn new(dest: IntFormat) -> Self {
        let format = F::FORMAT;
        let exponent_band = (format.bias() + dest.value_bits()).min(format.max_biased_exponent());
        let sign_bits = if dest.signed {
            format.width_mask()
        } else {
            format.magnitude_mask()
        };

        InRangeSampler {
            exponent_band: u64::from(exponent_band),
            mantissa_and_sign_mask: !format.exponent_mask() & sign_bits,
            _source: PhantomData,
        }
    }

    /// Number of biased exponents samples are drawn from, starting at zero.
    pub fn exponent_band(&self) -> u64 {
        self.exponent_band
    }

    pub fn sample(&self, rng: &mut RandomStream) -> F {
        let mantissa_bits = F::FORMAT.mantissa_bits;
        let word = rng.next_word();
        let exponent = ((word >> mantissa_bits) % self.exponent_band) << mantissa_bits;
        F::from_raw_bits((word & self.mantissa_and_sign_mask) | exponent)
    }
}

/// Signs an out-of-range value may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignChoice {
    Either,
    NegativeOnly,
    PositiveOnly,
}

/// Draws random finite values outside a conversion boundary.
#[derive(Debug, Clone, Copy)]
pub struct OutOfRangeSynthesizer<F> {
    boundary: ConversionBoundary<F>,
    min_magnitude: u64,
    max_magnitude: u64,
    signs: SignChoice,
}

impl<F: SourceFloat> OutOfRangeSynthesizer<F> {
    /// `None` when every finite value of `F` lies inside `boundary`.
    ///
    /// The smallest magnitude drawn is one above the larger of the two
    /// boundary magnitudes, so both signs are out of range. When that leaves
    /// no finite values, only the side that still has some is used.
    pub fn new(boundary: ConversionBoundary<F>) -> Option<Self> {
        let format = F::FORMAT;
        let max_magnitude = format.max_finite_bits();
        let below_lowest = (boundary.lowest_bits() & format.magnitude_mask()) + 1;
        let above_highest = boundary.highest_bits() + 1;
        let symmetric = below_lowest.max(above_highest);

        let (min_magnitude, signs) = if symmetric <= max_magnitude {
            (symmetric, SignChoice::Either)
        } else if below_lowest <= max_magnitude {
            (below_lowest, SignChoice::NegativeOnly)
        } else if above_highest <= max_magnitude {
            (above_highest, SignChoice::PositiveOnly)
        } else {
            return None;
        };

        Some(OutOfRangeSynthesizer {
            boundary,
            min_magnitude,
            max_magnitude,
            signs,
        })
    }

    pub fn boundary(&self) -> &ConversionBoundary<F> {
        &self.boundary
    }

    pub fn min_magnitude_bits(&self) -> u64 {
        self.min_magnitude
    }

    pub fn max_magnitude_bits(&self) -> u64 {
        self.max_magnitude
    }

    pub fn signs(&self) -> SignChoice {
        self.signs
    }

    pub fn synthesize(&self, rng: &mut RandomStream) -> F {
        let magnitude = rng.uniform_inclusive(self.min_magnitude, self.max_magnitude);
        let negative = match self.signs {
            SignChoice::Either => rng.coin(),
            SignChoice::NegativeOnly => true,
            SignChoice::PositiveOnly => false,
        };
        let sign = if negative { F::FORMAT.sign_mask() } else { 0 };
        F::from_raw_bits(magnitude | sign)
    }
}
