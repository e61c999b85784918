// Safe-range computation for fast float-to-integer conversion.
//
// A fast conversion is only defined for inputs whose truncated value fits the
// destination integer. The bounds are the float values closest to
// IntMin - 1 and IntMax + 1 from the inside, computed with round-to-nearest
// binary64 arithmetic patched up to truncate instead of round.

use crate::error::{ConformanceError, ConformanceResult, TypePair};
use crate::formats::{describe_float, DestInt, FloatKind, IntKind, SourceFloat};
use half::f16;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const TOP_BITS_MASK: u64 = 0xFFE0_0000_0000_0000;
const BOTTOM_BITS_MASK: u64 = 0x001F_FFFF_FFFF_FFFF;

/// 2^64, the first binary64 value no `u64` reaches.
const TWO_POW_64: f64 = 18446744073709551616.0;

/// The greatest value of `F` strictly below one.
///
/// `1.0 - ulp` rounds straight back to one, so this steps the bit pattern.
pub fn largest_below_one<F: SourceFloat>() -> F {
    F::from_raw_bits(F::from_f64(1.0).to_raw_bits() - 1)
}

/// `hi + lo` truncated to a binary64 value no larger in magnitude than the
/// exact sum.
///
/// Requires `hi.abs() >= lo.abs()` or `hi == 0`. The rounding error of the
/// nearest sum is recovered exactly; when it points back toward zero the sum
/// overshot, and one ulp comes off its magnitude.
pub fn rounded_down_sum(hi: f64, lo: f64) -> f64 {
    debug_assert!(hi.abs() >= lo.abs() || hi == 0.0);

    let sum = hi + lo;
    let carry = (hi - sum) + lo;

    let sum_bits = sum.to_bits();
    let carry_bits = carry.to_bits();
    let overshot = ((sum_bits ^ carry_bits) >> 63) & u64::from(carry != 0.0);

    f64::from_bits(sum_bits - overshot)
}

/// Converts `value` to binary64 without ever rounding up.
pub fn u64_to_rounded_down_f64(value: u64) -> f64 {
    rounded_down_sum(
        (value & TOP_BITS_MASK) as f64,
        (value & BOTTOM_BITS_MASK) as f64,
    )
}

/// Converts `value` to binary64, never exceeding it in magnitude.
pub fn i64_to_rounded_down_f64(value: i64) -> f64 {
    let bits = value as u64;
    rounded_down_sum(
        (bits & TOP_BITS_MASK) as i64 as f64,
        (bits & BOTTOM_BITS_MASK) as f64,
    )
}

/// Clears the mantissa bits of `value` that a format with `bit_precision`
/// significant bits cannot hold, truncating the magnitude.
pub fn round_down_to_precision(value: f64, bit_precision: u32) -> f64 {
    debug_assert!(bit_precision > 0);

    let zeroed = f64::FORMAT.precision().saturating_sub(bit_precision);
    let mask = (1u64 << zeroed) - 1;
    f64::from_bits(value.to_bits() & !mask)
}

fn pair_of<F: SourceFloat, I: DestInt>() -> TypePair {
    TypePair::new(F::KIND, I::KIND)
}

fn ensure(pair: TypePair, condition: bool, detail: &str) -> ConformanceResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ConformanceError::boundary(pair, detail))
    }
}

fn narrow_exactly<F: SourceFloat>(pair: TypePair, value: f64) -> ConformanceResult<F> {
    let narrowed = F::from_f64(value);
    if narrowed.to_f64() == value {
        Ok(narrowed)
    } else {
        Err(ConformanceError::boundary(
            pair,
            format!("{} is not exactly representable as {}", value, F::KIND),
        ))
    }
}

/// The lowest finite `F` whose truncation is at least `I`'s minimum.
pub fn lowest_in_range<F: SourceFloat, I: DestInt>() -> ConformanceResult<F> {
    let pair = pair_of::<F, I>();
    let precision = F::FORMAT.precision();

    let lowest_from = F::lowest_finite().to_f64();
    let lowest_to = round_down_to_precision(
        rounded_down_sum(
            i64_to_rounded_down_f64(I::FORMAT.min),
            -largest_below_one::<f64>(),
        ),
        precision,
    );
    let lowest = lowest_from.max(lowest_to);

    ensure(
        pair,
        lowest.is_finite() && lowest >= i64::MIN as f64,
        "lowest in-range value must be finite and at least i64::MIN",
    )?;
    ensure(pair, lowest < 0.0, "lowest in-range value must be less than zero")?;

    let truncated = lowest as i64;
    ensure(
        pair,
        truncated <= 0,
        "lowest in-range value must truncate to at most zero",
    )?;
    ensure(
        pair,
        truncated >= I::FORMAT.min,
        "lowest in-range value must truncate to at least the destination minimum",
    )?;

    narrow_exactly(pair, lowest)
}

/// The highest finite `F` whose truncation is at most `I`'s maximum.
pub fn highest_in_range<F: SourceFloat, I: DestInt>() -> ConformanceResult<F> {
    let pair = pair_of::<F, I>();
    let precision = F::FORMAT.precision();

    let highest_from = F::max_finite().to_f64();
    let highest_to = round_down_to_precision(
        rounded_down_sum(
            u64_to_rounded_down_f64(I::FORMAT.max),
            largest_below_one::<f64>(),
        ),
        precision,
    );
    let highest = highest_from.min(highest_to);

    ensure(
        pair,
        highest.is_finite() && highest < TWO_POW_64,
        "highest in-range value must be finite and below 2^64",
    )?;
    ensure(pair, highest > 0.0, "highest in-range value must be greater than zero")?;

    let truncated = highest as u64;
    ensure(
        pair,
        truncated > 0,
        "highest in-range value must truncate to more than zero",
    )?;
    ensure(
        pair,
        truncated <= I::FORMAT.max,
        "highest in-range value must truncate to at most the destination maximum",
    )?;

    narrow_exactly(pair, highest)
}

/// Inclusive range of `F` values a fast conversion to some integer type
/// accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionBoundary<F> {
    pub lowest: F,
    pub highest: F,
}

impl<F: SourceFloat> ConversionBoundary<F> {
    /// True for finite values in `[lowest, highest]`. NaN is never contained.
    pub fn contains(&self, value: F) -> bool {
        value.is_finite_value() && value >= self.lowest && value <= self.highest
    }

    pub fn lowest_bits(&self) -> u64 {
        self.lowest.to_raw_bits()
    }

    pub fn highest_bits(&self) -> u64 {
        self.highest.to_raw_bits()
    }

    fn widen(self) -> ConversionBoundary<f64> {
        ConversionBoundary {
            lowest: self.lowest.to_f64(),
            highest: self.highest.to_f64(),
        }
    }
}

/// Computes and validates the safe range of `F -> I` conversions.
pub fn compute_boundary<F: SourceFloat, I: DestInt>() -> ConformanceResult<ConversionBoundary<F>> {
    let boundary = ConversionBoundary {
        lowest: lowest_in_range::<F, I>()?,
        highest: highest_in_range::<F, I>()?,
    };
    log::debug!(
        "{}: in-range values are [{}, {}]",
        pair_of::<F, I>(),
        describe_float(boundary.lowest),
        describe_float(boundary.highest)
    );
    Ok(boundary)
}

/// Validated boundaries of every supported type pair, widened to binary64.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryTable {
    entries: BTreeMap<TypePair, ConversionBoundary<f64>>,
}

macro_rules! for_each_int {
    ($table:ident, $float:ty) => {
        $table.insert::<$float, i16>()?;
        $table.insert::<$float, u16>()?;
        $table.insert::<$float, i32>()?;
        $table.insert::<$float, u32>()?;
        $table.insert::<$float, i64>()?;
        $table.insert::<$float, u64>()?;
    };
}

impl BoundaryTable {
    /// Computes every supported pair, failing on the first invariant violation.
    pub fn build() -> ConformanceResult<Self> {
        let mut table = BoundaryTable {
            entries: BTreeMap::new(),
        };
        for_each_int!(table, f16);
        for_each_int!(table, f32);
        for_each_int!(table, f64);
        log::info!("boundary table built for {} type pairs", table.entries.len());
        Ok(table)
    }

    /// The process-wide table, built on first use.
    pub fn global() -> ConformanceResult<&'static BoundaryTable> {
        static TABLE: OnceLock<ConformanceResult<BoundaryTable>> = OnceLock::new();
        TABLE.get_or_init(BoundaryTable::build).as_ref().map_err(Clone::clone)
    }

    fn insert<F: SourceFloat, I: DestInt>(&mut self) -> ConformanceResult<()> {
        let boundary = compute_boundary::<F, I>()?;
        self.entries.insert(pair_of::<F, I>(), boundary.widen());
        Ok(())
    }

    pub fn get(&self, pair: TypePair) -> Option<ConversionBoundary<f64>> {
        self.entries.get(&pair).copied()
    }

    /// Typed lookup, computing the boundary when the pair is not cached.
    pub fn boundary<F: SourceFloat, I: DestInt>(&self) -> ConformanceResult<ConversionBoundary<F>> {
        match self.get(pair_of::<F, I>()) {
            Some(cached) => Ok(ConversionBoundary {
                lowest: F::from_f64(cached.lowest),
                highest: F::from_f64(cached.highest),
            }),
            None => compute_boundary::<F, I>(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every pair `BoundaryTable::build` covers.
pub fn supported_pairs() -> impl Iterator<Item = TypePair> {
    IntoIterator::into_iter(FloatKind::ALL).flat_map(|float| {
        IntoIterator::into_iter(IntKind::ALL).map(move |int| TypePair::new(float, int))
    })
}
