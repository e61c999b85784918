// Owned lane buffers and the handful of vector primitives the oracle needs.
// A LaneVector is scratch storage for one check: inputs, expectations and
// backend results all travel as LaneVectors.

use crate::formats::DestInt;
use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LaneVector<T> {
    lanes: Vec<T>,
}

impl<T: Copy> LaneVector<T> {
    pub fn from_lanes(lanes: Vec<T>) -> Self {
        LaneVector { lanes }
    }

    pub fn splat(value: T, count: usize) -> Self {
        LaneVector {
            lanes: vec![value; count],
        }
    }

    pub fn from_fn(count: usize, f: impl FnMut(usize) -> T) -> Self {
        LaneVector {
            lanes: (0..count).map(f).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn lanes(&self) -> &[T] {
        &self.lanes
    }

    pub fn lane(&self, index: usize) -> T {
        self.lanes[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.lanes.iter().copied()
    }

    pub fn map<U: Copy>(&self, f: impl FnMut(T) -> U) -> LaneVector<U> {
        LaneVector {
            lanes: self.lanes.iter().copied().map(f).collect(),
        }
    }

    /// Odd lanes from `odd`, even lanes from `even`.
    pub fn odd_even(odd: &Self, even: &Self) -> Self {
        debug_assert_eq!(odd.len(), even.len());
        LaneVector::from_fn(odd.len(), |i| if i % 2 == 1 { odd.lanes[i] } else { even.lanes[i] })
    }
}

impl<T: DestInt> LaneVector<T> {
    /// Ascending lane indices `0, 1, 2, ...`, wrapping at the type's width.
    pub fn iota(count: usize) -> Self {
        LaneVector::from_fn(count, |i| T::from_raw_bits(i as u64))
    }

    pub fn and(&self, mask: T) -> Self {
        let mask = mask.to_raw_bits();
        self.map(|lane| T::from_raw_bits(lane.to_raw_bits() & mask))
    }

    pub fn wrapping_add(&self, addend: T) -> Self {
        let addend = addend.to_raw_bits();
        self.map(|lane| T::from_raw_bits(lane.to_raw_bits().wrapping_add(addend)))
    }
}

impl<T> Index<usize> for LaneVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.lanes[index]
    }
}
