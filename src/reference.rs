// Ground-truth conversion for in-range inputs.

use crate::boundary::ConversionBoundary;
use crate::formats::{DestInt, SourceFloat};
use std::marker::PhantomData;

/// Truncating scalar conversion, valid only inside the boundary it was built
/// for.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceConverter<F, I> {
    boundary: ConversionBoundary<F>,
    _dest: PhantomData<I>,
}

impl<F: SourceFloat, I: DestInt> ReferenceConverter<F, I> {
    pub fn new(boundary: ConversionBoundary<F>) -> Self {
        ReferenceConverter {
            boundary,
            _dest: PhantomData,
        }
    }

    pub fn boundary(&self) -> &ConversionBoundary<F> {
        &self.boundary
    }

    /// `value` truncated toward zero. `value` must lie inside the boundary.
    pub fn convert(&self, value: F) -> I {
        debug_assert!(
            self.boundary.contains(value),
            "reference conversion of out-of-range value {}",
            value
        );
        // Widening to f64 is exact, so the cast truncates the input value.
        I::from_f64_truncating(value.to_f64())
    }
}
