// IEEE 754 source formats and integer destination formats.
// This module describes the bit layout of every float type a fast conversion
// reads from and every integer type it writes to, and provides the explicit
// bit-reinterpretation primitives the rest of the crate builds on.

use half::f16;
use std::fmt;

/// Source floating point type of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloatKind {
    F16,
    F32,
    F64,
}

impl FloatKind {
    pub const ALL: [FloatKind; 3] = [FloatKind::F16, FloatKind::F32, FloatKind::F64];

    pub const fn format(self) -> FloatFormat {
        match self {
            FloatKind::F16 => FloatFormat::BINARY16,
            FloatKind::F32 => FloatFormat::BINARY32,
            FloatKind::F64 => FloatFormat::BINARY64,
        }
    }
}

impl fmt::Display for FloatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FloatKind::F16 => "f16",
            FloatKind::F32 => "f32",
            FloatKind::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// Destination integer type of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntKind {
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl IntKind {
    pub const ALL: [IntKind; 6] = [
        IntKind::I16,
        IntKind::U16,
        IntKind::I32,
        IntKind::U32,
        IntKind::I64,
        IntKind::U64,
    ];

    pub const fn format(self) -> IntFormat {
        match self {
            IntKind::I16 => IntFormat::signed(16),
            IntKind::U16 => IntFormat::unsigned(16),
            IntKind::I32 => IntFormat::signed(32),
            IntKind::U32 => IntFormat::unsigned(32),
            IntKind::I64 => IntFormat::signed(64),
            IntKind::U64 => IntFormat::unsigned(64),
        }
    }
}

impl fmt::Display for IntKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntKind::I16 => "i16",
            IntKind::U16 => "u16",
            IntKind::I32 => "i32",
            IntKind::U32 => "u32",
            IntKind::I64 => "i64",
            IntKind::U64 => "u64",
        };
        f.write_str(name)
    }
}

/// Bit layout of an IEEE 754 binary format.
///
/// `mantissa_bits` counts the stored fraction bits only; the implied leading
/// one is added by [`FloatFormat::precision`]. All masks are returned in the
/// low `bits` of a `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatFormat {
    pub bits: u32,
    pub exponent_bits: u32,
    pub mantissa_bits: u32,
}

impl FloatFormat {
    pub const BINARY16: FloatFormat = FloatFormat {
        bits: 16,
        exponent_bits: 5,
        mantissa_bits: 10,
    };
    pub const BINARY32: FloatFormat = FloatFormat {
        bits: 32,
        exponent_bits: 8,
        mantissa_bits: 23,
    };
    pub const BINARY64: FloatFormat = FloatFormat {
        bits: 64,
        exponent_bits: 11,
        mantissa_bits: 52,
    };

    /// Significant bits including the implied leading one.
    pub const fn precision(self) -> u32 {
        self.mantissa_bits + 1
    }

    pub const fn bias(self) -> u32 {
        self.max_biased_exponent() >> 1
    }

    /// Exponent field value of infinities and NaNs.
    pub const fn max_biased_exponent(self) -> u32 {
        (1 << self.exponent_bits) - 1
    }

    pub const fn sign_bit(self) -> u32 {
        self.bits - 1
    }

    pub const fn width_mask(self) -> u64 {
        u64::MAX >> (64 - self.bits)
    }

    pub const fn sign_mask(self) -> u64 {
        1u64 << self.sign_bit()
    }

    /// Every bit except the sign bit.
    pub const fn magnitude_mask(self) -> u64 {
        self.width_mask() >> 1
    }

    pub const fn mantissa_mask(self) -> u64 {
        (1u64 << self.mantissa_bits) - 1
    }

    pub const fn exponent_mask(self) -> u64 {
        (self.max_biased_exponent() as u64) << self.mantissa_bits
    }

    /// Bit pattern of the largest finite positive value.
    pub const fn max_finite_bits(self) -> u64 {
        self.exponent_mask() - 1
    }
}

/// Layout of a two's complement or unsigned integer destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntFormat {
    pub bits: u32,
    pub signed: bool,
    pub min: i64,
    pub max: u64,
}

impl IntFormat {
    pub const fn signed(bits: u32) -> IntFormat {
        IntFormat {
            bits,
            signed: true,
            min: i64::MIN >> (64 - bits),
            max: u64::MAX >> (65 - bits),
        }
    }

    pub const fn unsigned(bits: u32) -> IntFormat {
        IntFormat {
            bits,
            signed: false,
            min: 0,
            max: u64::MAX >> (64 - bits),
        }
    }

    pub const fn all_ones(self) -> u64 {
        u64::MAX >> (64 - self.bits)
    }

    /// Value bits available to a non-negative result.
    pub const fn value_bits(self) -> u32 {
        self.bits - self.signed as u32
    }
}

/// A floating point type that fast conversions read from.
///
/// Bit patterns travel as `u64` holding the value's bits in the low
/// `FORMAT.bits` positions, so `from_raw_bits(to_raw_bits(x))` is the
/// identity for every `x`, NaN payloads included.
pub trait SourceFloat: Copy + PartialOrd + fmt::Debug + fmt::Display + Send + Sync + 'static {
    const KIND: FloatKind;
    const FORMAT: FloatFormat;

    fn to_raw_bits(self) -> u64;

    /// Reinterprets the low `FORMAT.bits` of `bits`; higher bits are ignored.
    fn from_raw_bits(bits: u64) -> Self;

    /// Exact widening; every source format embeds in binary64.
    fn to_f64(self) -> f64;

    /// Native round-to-nearest narrowing.
    fn from_f64(value: f64) -> Self;

    fn max_finite() -> Self {
        Self::from_raw_bits(Self::FORMAT.max_finite_bits())
    }

    fn lowest_finite() -> Self {
        Self::from_raw_bits(Self::FORMAT.max_finite_bits() | Self::FORMAT.sign_mask())
    }

    fn is_finite_value(self) -> bool {
        self.to_f64().is_finite()
    }
}

impl SourceFloat for f16 {
    const KIND: FloatKind = FloatKind::F16;
    const FORMAT: FloatFormat = FloatFormat::BINARY16;

    fn to_raw_bits(self) -> u64 {
        u64::from(f16::to_bits(self))
    }

    fn from_raw_bits(bits: u64) -> Self {
        f16::from_bits(bits as u16)
    }

    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    fn from_f64(value: f64) -> Self {
        f16::from_f64(value)
    }
}

impl SourceFloat for f32 {
    const KIND: FloatKind = FloatKind::F32;
    const FORMAT: FloatFormat = FloatFormat::BINARY32;

    fn to_raw_bits(self) -> u64 {
        u64::from(f32::to_bits(self))
    }

    fn from_raw_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl SourceFloat for f64 {
    const KIND: FloatKind = FloatKind::F64;
    const FORMAT: FloatFormat = FloatFormat::BINARY64;

    fn to_raw_bits(self) -> u64 {
        f64::to_bits(self)
    }

    fn from_raw_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

/// An integer type that fast conversions write to.
pub trait DestInt: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    const KIND: IntKind;
    const FORMAT: IntFormat;

    /// Language cast: truncates toward zero, saturates out of range, NaN is 0.
    fn from_f64_truncating(value: f64) -> Self;

    /// Zero-extended two's complement bit pattern.
    fn to_raw_bits(self) -> u64;

    /// Keeps the low `FORMAT.bits` of `bits`.
    fn from_raw_bits(bits: u64) -> Self;
}

macro_rules! impl_dest_int {
    ($($ty:ident => $kind:ident, $format:expr, $unsigned:ty;)+) => {
        $(
            impl DestInt for $ty {
                const KIND: IntKind = IntKind::$kind;
                const FORMAT: IntFormat = $format;

                fn from_f64_truncating(value: f64) -> Self {
                    value as $ty
                }

                fn to_raw_bits(self) -> u64 {
                    u64::from(self as $unsigned)
                }

                fn from_raw_bits(bits: u64) -> Self {
                    bits as $unsigned as $ty
                }
            }
        )+
    };
}

impl_dest_int! {
    i16 => I16, IntFormat::signed(16), u16;
    u16 => U16, IntFormat::unsigned(16), u16;
    i32 => I32, IntFormat::signed(32), u32;
    u32 => U32, IntFormat::unsigned(32), u32;
    i64 => I64, IntFormat::signed(64), u64;
    u64 => U64, IntFormat::unsigned(64), u64;
}

/// Bit pattern of a float for diagnostics, e.g. `-1.5 (0xbfc00000)`.
pub fn describe_float<F: SourceFloat>(value: F) -> String {
    let digits = (F::FORMAT.bits / 4) as usize;
    format!("{} ({:#0width$x})", value, value.to_raw_bits(), width = digits + 2)
}
