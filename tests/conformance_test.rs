//! # Conformance Oracle Test Suite
//!
//! End-to-end checks of the oracle against the portable scalar backend and
//! against deliberately broken backends.
//!
//! ## Test Strategy
//!
//! 1. **Conforming Backend**: every stage passes for every supported pair
//! 2. **Lane Mapping**: the half and even/odd extractions select the right lanes
//! 3. **Broken Backends**: each contract violation surfaces as its own error kind
//! 4. **Determinism**: a seed reproduces a run exactly

use f2i_conformance::{
    assert_conforms, compute_boundary, verify_all, verify_configuration, ConformanceError,
    ConformanceOracle, ConversionFamily, ConversionVariant, DestInt, LanePosition, LaneVector,
    OracleConfig, RepetitionMode, ScalarBackend, SourceFloat,
};
use half::f16;

/// Test helper to create a small, deterministic configuration
fn quick_config() -> OracleConfig {
    OracleConfig {
        seed: 42,
        trials: 32,
        repetition: RepetitionMode::Standard,
        lane_counts: vec![1, 2, 4, 8],
    }
}

/// Rounds to nearest instead of truncating.
struct RoundingBackend;

impl ConversionFamily for RoundingBackend {
    fn name(&self) -> &str {
        "rounding"
    }

    fn fast_convert<F: SourceFloat, I: DestInt>(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
    ) -> LaneVector<I> {
        variant
            .select(from)
            .map(|lane| I::from_f64_truncating(lane.to_f64().round()))
    }
}

/// Zeroes the whole vector as soon as any lane is NaN or infinite.
struct LeakyBackend;

impl ConversionFamily for LeakyBackend {
    fn name(&self) -> &str {
        "leaky"
    }

    fn fast_convert<F: SourceFloat, I: DestInt>(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
    ) -> LaneVector<I> {
        if from.iter().any(|lane| !lane.is_finite_value()) {
            LaneVector::splat(I::from_raw_bits(0), variant.output_lanes(from.len()))
        } else {
            ScalarBackend.fast_convert(variant, from)
        }
    }
}

/// Returns the upper half for `LowerHalf` and vice versa.
struct SwappedHalvesBackend;

impl ConversionFamily for SwappedHalvesBackend {
    fn name(&self) -> &str {
        "swapped-halves"
    }

    fn fast_convert<F: SourceFloat, I: DestInt>(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
    ) -> LaneVector<I> {
        let swapped = match variant {
            ConversionVariant::LowerHalf => ConversionVariant::UpperHalf,
            ConversionVariant::UpperHalf => ConversionVariant::LowerHalf,
            other => other,
        };
        ScalarBackend.fast_convert(swapped, from)
    }
}

/// Drops the last output lane.
struct ShortBackend;

impl ConversionFamily for ShortBackend {
    fn name(&self) -> &str {
        "short"
    }

    fn fast_convert<F: SourceFloat, I: DestInt>(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
    ) -> LaneVector<I> {
        let full: LaneVector<I> = ScalarBackend.fast_convert(variant, from);
        let mut lanes = full.lanes().to_vec();
        lanes.pop();
        LaneVector::from_lanes(lanes)
    }
}

/// Returns zero for the highest in-range value.
struct EdgeBackend;

impl ConversionFamily for EdgeBackend {
    fn name(&self) -> &str {
        "edge"
    }

    fn fast_convert<F: SourceFloat, I: DestInt>(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
    ) -> LaneVector<I> {
        let highest = compute_boundary::<F, I>().unwrap().highest;
        variant.select(from).map(|lane| {
            if lane == highest {
                I::from_raw_bits(0)
            } else {
                I::from_f64_truncating(lane.to_f64())
            }
        })
    }
}

/// The `Odd` extraction zeroes its output when any even lane is NaN or infinite.
struct OddLeakBackend;

impl ConversionFamily for OddLeakBackend {
    fn name(&self) -> &str {
        "odd-leak"
    }

    fn fast_convert<F: SourceFloat, I: DestInt>(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
    ) -> LaneVector<I> {
        let even_poisoned = from.iter().step_by(2).any(|lane| !lane.is_finite_value());
        if variant == ConversionVariant::Odd && even_poisoned {
            LaneVector::splat(I::from_raw_bits(0), variant.output_lanes(from.len()))
        } else {
            ScalarBackend.fast_convert(variant, from)
        }
    }
}

/// Panics on finite input whose truncated value does not fit the destination.
struct TrappingBackend;

impl ConversionFamily for TrappingBackend {
    fn name(&self) -> &str {
        "trapping"
    }

    fn fast_convert<F: SourceFloat, I: DestInt>(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
    ) -> LaneVector<I> {
        variant.select(from).map(|lane| {
            let truncated = lane.to_f64().trunc();
            if lane.is_finite_value()
                && (truncated < I::FORMAT.min as f64 || truncated > I::FORMAT.max as f64)
            {
                panic!("{} does not fit {}", lane, I::KIND);
            }
            I::from_f64_truncating(truncated)
        })
    }
}

/// Panics on any NaN lane.
struct NanTrapBackend;

impl ConversionFamily for NanTrapBackend {
    fn name(&self) -> &str {
        "nan-trap"
    }

    fn fast_convert<F: SourceFloat, I: DestInt>(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
    ) -> LaneVector<I> {
        if from.iter().any(|lane| lane.to_f64().is_nan()) {
            panic!("NaN input");
        }
        ScalarBackend.fast_convert(variant, from)
    }
}

// === CONFORMING BACKEND ===

#[test]
fn test_scalar_backend_passes_full_matrix() {
    let config = quick_config();
    let stats = verify_all(&ScalarBackend, &config).unwrap();

    assert_eq!(stats.configurations, 18 * config.lane_counts.len() as u64);
    assert!(stats.in_range_lanes > 0);
    assert!(stats.isolation_lanes > 0);
    assert!(stats.out_of_range_lanes > 0);
}

#[test]
fn test_scalar_backend_common_configurations() {
    for &lanes in &[1, 2, 4, 8, 16] {
        assert_conforms::<f16, i16, _>(&ScalarBackend, lanes);
        assert_conforms::<f16, u16, _>(&ScalarBackend, lanes);
        assert_conforms::<f32, i32, _>(&ScalarBackend, lanes);
        assert_conforms::<f32, u32, _>(&ScalarBackend, lanes);
        assert_conforms::<f32, i64, _>(&ScalarBackend, lanes);
        assert_conforms::<f32, u64, _>(&ScalarBackend, lanes);
        assert_conforms::<f64, i32, _>(&ScalarBackend, lanes);
        assert_conforms::<f64, u32, _>(&ScalarBackend, lanes);
        assert_conforms::<f64, i64, _>(&ScalarBackend, lanes);
        assert_conforms::<f64, u64, _>(&ScalarBackend, lanes);
    }
}

#[test]
fn test_out_of_range_stage_counts_lanes() {
    let stats = verify_configuration::<f64, i32, _>(&ScalarBackend, 4, &quick_config()).unwrap();
    assert_eq!(stats.out_of_range_lanes, 32 * 4);
    assert_eq!(stats.vacuous_out_of_range_stages, 0);
}

// === LANE MAPPING ===

#[test]
fn test_promote_halves_and_even_odd_lanes() {
    let from = LaneVector::from_lanes(vec![1.0f32, 2.0, 3.0, 4.0]);

    let lower: LaneVector<i64> = ScalarBackend.fast_convert(ConversionVariant::LowerHalf, &from);
    let upper: LaneVector<i64> = ScalarBackend.fast_convert(ConversionVariant::UpperHalf, &from);
    let even: LaneVector<i64> = ScalarBackend.fast_convert(ConversionVariant::Even, &from);
    let odd: LaneVector<i64> = ScalarBackend.fast_convert(ConversionVariant::Odd, &from);

    assert_eq!(lower.lanes(), &[1, 2]);
    assert_eq!(upper.lanes(), &[3, 4]);
    assert_eq!(even.lanes(), &[1, 3]);
    assert_eq!(odd.lanes(), &[2, 4]);
}

#[test]
fn test_split_variants_need_even_lane_count() {
    let stats = verify_configuration::<f32, u64, _>(&ScalarBackend, 1, &quick_config()).unwrap();
    assert_eq!(stats.variants, 1);

    let stats = verify_configuration::<f32, u64, _>(&ScalarBackend, 8, &quick_config()).unwrap();
    assert_eq!(stats.variants, 5);
}

// === BROKEN BACKENDS ===

#[test]
fn test_rounding_backend_fails_exactness() {
    let error = verify_configuration::<f32, i32, _>(&RoundingBackend, 4, &quick_config()).unwrap_err();
    match error {
        ConformanceError::ExactnessMismatch {
            configuration,
            stage,
            expected,
            actual,
            ..
        } => {
            assert_eq!(configuration, "f32 -> i32 x4 Reinterpret");
            assert_eq!(stage, "RandomInRangeTrials");
            assert_ne!(expected, actual);
        }
        other => panic!("expected an exactness mismatch, got {}", other),
    }
}

#[test]
fn test_leaky_backend_fails_lane_isolation() {
    let error = verify_configuration::<f32, i32, _>(&LeakyBackend, 4, &quick_config()).unwrap_err();
    match error {
        ConformanceError::LaneIsolationViolation {
            contaminant,
            expected,
            actual,
            ..
        } => {
            // Every contaminant poisons the whole vector, so the first one fails.
            assert_eq!(contaminant, "+Inf");
            assert_eq!(actual, "0");
            assert_ne!(expected, "0");
        }
        other => panic!("expected a lane isolation violation, got {}", other),
    }
}

#[test]
fn test_edge_backend_fails_at_highest_value() {
    let error = verify_configuration::<f32, i32, _>(&EdgeBackend, 4, &quick_config()).unwrap_err();
    match error {
        ConformanceError::ExactnessMismatch {
            configuration,
            stage,
            lane,
            expected,
            actual,
            ..
        } => {
            assert_eq!(configuration, "f32 -> i32 x4 Reinterpret");
            assert_eq!(stage, "ScalarEdgeCheck");
            assert_eq!(lane, 0);
            assert_eq!(expected, "2147483520");
            assert_eq!(actual, "0");
        }
        other => panic!("expected an exactness mismatch, got {}", other),
    }
}

#[test]
fn test_odd_extraction_fails_lane_isolation() {
    let error = verify_configuration::<f32, i64, _>(&OddLeakBackend, 4, &quick_config()).unwrap_err();
    match error {
        ConformanceError::LaneIsolationViolation {
            configuration,
            stage,
            lane,
            contaminant,
            position,
            expected,
            actual,
            ..
        } => {
            assert_eq!(configuration, "f32 -> i64 x4 Odd");
            assert_eq!(stage, "RandomInRangeTrials");
            assert!(lane < 2);
            assert_eq!(contaminant, "+Inf");
            // With the contaminant in the odd lanes every output lane is skipped.
            assert_eq!(position, LanePosition::Even);
            assert_eq!(actual, "0");
            assert_ne!(expected, "0");
        }
        other => panic!("expected a lane isolation violation, got {}", other),
    }
}

#[test]
fn test_trap_on_out_of_range_input_is_reported() {
    let error = verify_configuration::<f32, i32, _>(&TrappingBackend, 4, &quick_config()).unwrap_err();
    match error {
        ConformanceError::RelaxedContractViolation {
            configuration,
            stage,
            lane,
            actual,
            check,
            ..
        } => {
            assert_eq!(configuration, "f32 -> i32 x4 Reinterpret");
            assert_eq!(stage, "RandomOutOfRangeTrials");
            assert_eq!(lane, 0);
            assert!(actual.starts_with("a trap ("), "{}", actual);
            assert!(actual.contains("does not fit i32"), "{}", actual);
            assert_eq!(check, "conversion must not trap");
        }
        other => panic!("expected a relaxed contract violation, got {}", other),
    }
}

#[test]
fn test_trap_on_contaminant_is_reported_as_isolation_violation() {
    let error = verify_configuration::<f32, i32, _>(&NanTrapBackend, 4, &quick_config()).unwrap_err();
    match error {
        ConformanceError::LaneIsolationViolation {
            stage,
            lane,
            contaminant,
            position,
            expected,
            actual,
            ..
        } => {
            assert_eq!(stage, "RandomInRangeTrials");
            assert_eq!(contaminant, "+NaN");
            assert_eq!(position, LanePosition::Even);
            assert_eq!(lane, 0);
            assert_eq!(expected, "no trap");
            assert_eq!(actual, "a trap (NaN input)");
        }
        other => panic!("expected a lane isolation violation, got {}", other),
    }
}

#[test]
fn test_trapping_backend_conforms_in_range_only() {
    // f16 -> i32 has no finite out-of-range values, so nothing traps.
    let stats = verify_configuration::<f16, i32, _>(&TrappingBackend, 4, &quick_config()).unwrap();
    assert_eq!(stats.vacuous_out_of_range_stages, 1);
}

#[test]
fn test_swapped_halves_fail_pattern_check() {
    let error = verify_configuration::<f32, i64, _>(&SwappedHalvesBackend, 4, &quick_config()).unwrap_err();
    match error {
        ConformanceError::ExactnessMismatch {
            configuration,
            stage,
            lane,
            expected,
            actual,
            ..
        } => {
            assert_eq!(configuration, "f32 -> i64 x4 LowerHalf");
            assert_eq!(stage, "PatternCheck");
            assert_eq!(lane, 0);
            assert_eq!(expected, "1");
            assert_eq!(actual, "3");
        }
        other => panic!("expected a pattern mismatch, got {}", other),
    }
}

#[test]
fn test_swapped_halves_pass_without_split_variants() {
    verify_configuration::<f32, i32, _>(&SwappedHalvesBackend, 4, &quick_config()).unwrap();
}

#[test]
fn test_short_backend_fails_lane_count() {
    let error = verify_configuration::<f64, u64, _>(&ShortBackend, 4, &quick_config()).unwrap_err();
    assert_eq!(
        error,
        ConformanceError::LaneCountMismatch {
            configuration: "f64 -> u64 x4 Reinterpret".to_string(),
            stage: "ScalarEdgeCheck".to_string(),
            expected: 4,
            actual: 3,
        }
    );
}

#[test]
#[should_panic(expected = "rounding backend")]
fn test_assert_conforms_panics_with_diagnostic() {
    assert_conforms::<f32, i32, _>(&RoundingBackend, 8);
}

#[test]
fn test_violation_stops_the_oracle() {
    let config = quick_config();
    let mut oracle = ConformanceOracle::new(&RoundingBackend, config);
    assert!(oracle.verify::<f32, i32>(4).is_err());
    assert_eq!(oracle.stats().configurations, 0);
}

// === DETERMINISM ===

#[test]
fn test_same_seed_reproduces_stats() {
    let first = verify_configuration::<f32, i64, _>(&ScalarBackend, 8, &quick_config()).unwrap();
    let second = verify_configuration::<f32, i64, _>(&ScalarBackend, 8, &quick_config()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_same_seed_reproduces_failure() {
    let first = verify_configuration::<f32, i32, _>(&RoundingBackend, 8, &quick_config()).unwrap_err();
    let second = verify_configuration::<f32, i32, _>(&RoundingBackend, 8, &quick_config()).unwrap_err();
    assert_eq!(first, second);
}
