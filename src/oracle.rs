//! ConformanceOracle - checks a conversion family against the safe-range contract
//!
//! One verification covers a (source float, destination integer, lane count)
//! configuration and walks a fixed sequence of stages:
//!
//! 1. `Init` - boundary lookup, reference converter, samplers, fresh random stream
//! 2. `ScalarEdgeCheck` - 0, 1, -1 (signed only) and both boundary values
//! 3. `PatternCheck` - masked iota, validating the lane mapping of each variant
//! 4. `RandomInRangeTrials` - exactness plus lane isolation against NaN/Inf
//! 5. `RandomOutOfRangeTrials` - the relaxed contract for finite out-of-range input
//! 6. `Done`
//!
//! Every stage runs over all variants applicable to the configuration. The
//! first violation ends the verification and is returned to the caller. A
//! backend that panics is treated as trapping: the panic is caught and
//! reported as a violation of the stage it happened in.

use crate::backend::{ConversionFamily, ConversionVariant};
use crate::boundary::{BoundaryTable, ConversionBoundary};
use crate::config::OracleConfig;
use crate::error::{ConformanceError, ConformanceResult, LanePosition, TypePair};
use crate::formats::{describe_float, DestInt, FloatFormat, SourceFloat};
use crate::lanes::LaneVector;
use crate::random::RandomStream;
use crate::reference::ReferenceConverter;
use crate::synthesis::{InRangeSampler, OutOfRangeSynthesizer};
use log::{debug, error, info, warn};
use std::any::Any;
use std::fmt;
use std::hint::black_box;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Verification stage of one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    ScalarEdgeCheck,
    PatternCheck,
    RandomInRangeTrials,
    RandomOutOfRangeTrials,
    Done,
}

impl Stage {
    pub fn next(self) -> Stage {
        match self {
            Stage::Init => Stage::ScalarEdgeCheck,
            Stage::ScalarEdgeCheck => Stage::PatternCheck,
            Stage::PatternCheck => Stage::RandomInRangeTrials,
            Stage::RandomInRangeTrials => Stage::RandomOutOfRangeTrials,
            Stage::RandomOutOfRangeTrials | Stage::Done => Stage::Done,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A type pair at a lane count, converted through one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Configuration {
    pub pair: TypePair,
    pub lanes: usize,
    pub variant: ConversionVariant,
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{} {}", self.pair, self.lanes, self.variant)
    }
}

/// Special values planted next to in-range lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contaminant {
    PositiveInfinity,
    NegativeInfinity,
    /// All mantissa bits set.
    PositiveNan,
    /// All bits set.
    NegativeNan,
    /// Alternating mantissa bits.
    AlternatingNan,
}

impl Contaminant {
    pub const ALL: [Contaminant; 5] = [
        Contaminant::PositiveInfinity,
        Contaminant::NegativeInfinity,
        Contaminant::PositiveNan,
        Contaminant::NegativeNan,
        Contaminant::AlternatingNan,
    ];

    pub fn bits(self, format: FloatFormat) -> u64 {
        match self {
            Contaminant::PositiveInfinity => format.exponent_mask(),
            Contaminant::NegativeInfinity => format.exponent_mask() | format.sign_mask(),
            Contaminant::PositiveNan => format.magnitude_mask(),
            Contaminant::NegativeNan => format.width_mask(),
            Contaminant::AlternatingNan => {
                format.exponent_mask() | (0x5555_5555_5555_5555 & format.mantissa_mask())
            }
        }
    }

    fn value<F: SourceFloat>(self) -> F {
        // Opaque so the conversion cannot be specialised on a constant.
        F::from_raw_bits(black_box(self.bits(F::FORMAT)))
    }
}

impl fmt::Display for Contaminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Contaminant::PositiveInfinity => "+Inf",
            Contaminant::NegativeInfinity => "-Inf",
            Contaminant::PositiveNan => "+NaN",
            Contaminant::NegativeNan => "-NaN",
            Contaminant::AlternatingNan => "NaN(0x55..)",
        };
        f.write_str(name)
    }
}

/// Statistics about verification runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleStats {
    /// Configurations that reached `Done`
    pub configurations: u64,

    /// (configuration, variant) combinations verified
    pub variants: u64,

    /// Output lanes compared during the edge-value stage
    pub edge_lanes: u64,

    /// Output lanes compared during the pattern stage
    pub pattern_lanes: u64,

    /// Output lanes compared for in-range exactness
    pub in_range_lanes: u64,

    /// Output lanes compared next to a contaminated lane
    pub isolation_lanes: u64,

    /// Output lanes checked against the relaxed contract
    pub out_of_range_lanes: u64,

    /// Out-of-range stages skipped because the source format has no finite
    /// out-of-range values
    pub vacuous_out_of_range_stages: u64,
}

impl OracleStats {
    pub fn merge(&mut self, other: &OracleStats) {
        self.configurations += other.configurations;
        self.variants += other.variants;
        self.edge_lanes += other.edge_lanes;
        self.pattern_lanes += other.pattern_lanes;
        self.in_range_lanes += other.in_range_lanes;
        self.isolation_lanes += other.isolation_lanes;
        self.out_of_range_lanes += other.out_of_range_lanes;
        self.vacuous_out_of_range_stages += other.vacuous_out_of_range_stages;
    }
}

/// A backend call that panicked instead of returning.
struct Trap {
    /// Input lane that traps when converted on its own, if any does.
    lane: Option<usize>,
    input: String,
    message: String,
}

impl Trap {
    fn lane(&self) -> usize {
        self.lane.unwrap_or(0)
    }

    fn result(&self) -> String {
        format!("a trap ({})", self.message)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn describe_lanes<F: SourceFloat>(lanes: &LaneVector<F>) -> String {
    let described: Vec<String> = lanes.iter().map(describe_float).collect();
    format!("[{}]", described.join(", "))
}

/// Runs configurations one after another against a single backend.
pub struct ConformanceOracle<'a, B> {
    backend: &'a B,
    config: OracleConfig,
    stats: OracleStats,
}

impl<'a, B: ConversionFamily> ConformanceOracle<'a, B> {
    pub fn new(backend: &'a B, config: OracleConfig) -> Self {
        ConformanceOracle {
            backend,
            config,
            stats: OracleStats::default(),
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn stats(&self) -> &OracleStats {
        &self.stats
    }

    /// Verifies `F -> I` conversions at `lanes` lanes through every
    /// applicable variant.
    pub fn verify<F: SourceFloat, I: DestInt>(&mut self, lanes: usize) -> ConformanceResult<()> {
        let pair = TypePair::new(F::KIND, I::KIND);
        info!(
            "verifying {} x{} on the {} backend",
            pair,
            lanes,
            self.backend.name()
        );

        match self.run_stages::<F, I>(lanes) {
            Ok(stats) => {
                info!(
                    "{} x{} conforms: {} variants, {} in-range lanes, {} out-of-range lanes",
                    pair, lanes, stats.variants, stats.in_range_lanes, stats.out_of_range_lanes
                );
                self.stats.merge(&stats);
                Ok(())
            }
            Err(violation) => {
                error!("{}: {}", violation.kind(), violation);
                Err(violation)
            }
        }
    }

    fn run_stages<F: SourceFloat, I: DestInt>(&self, lanes: usize) -> ConformanceResult<OracleStats> {
        let mut run = ConfigurationRun::<F, I, B>::init(self.backend, &self.config, lanes)?;

        let mut stage = Stage::Init.next();
        while stage != Stage::Done {
            debug!("{} x{}: entering {}", run.pair, lanes, stage);
            run.stage = stage;
            match stage {
                Stage::ScalarEdgeCheck => run.scalar_edge_check()?,
                Stage::PatternCheck => run.pattern_check()?,
                Stage::RandomInRangeTrials => run.random_in_range_trials()?,
                Stage::RandomOutOfRangeTrials => run.random_out_of_range_trials()?,
                Stage::Init | Stage::Done => {}
            }
            stage = stage.next();
        }

        run.stats.configurations += 1;
        run.stats.variants += run.variants.len() as u64;
        Ok(run.stats)
    }
}

/// State of one configuration between `Init` and `Done`.
struct ConfigurationRun<'a, F, I, B> {
    backend: &'a B,
    pair: TypePair,
    lanes: usize,
    variants: Vec<ConversionVariant>,
    boundary: ConversionBoundary<F>,
    reference: ReferenceConverter<F, I>,
    sampler: InRangeSampler<F>,
    synthesizer: Option<OutOfRangeSynthesizer<F>>,
    rng: RandomStream,
    trials: usize,
    stage: Stage,
    stats: OracleStats,
}

impl<'a, F: SourceFloat, I: DestInt, B: ConversionFamily> ConfigurationRun<'a, F, I, B> {
    fn init(backend: &'a B, config: &OracleConfig, lanes: usize) -> ConformanceResult<Self> {
        let pair = TypePair::new(F::KIND, I::KIND);
        let variants = ConversionVariant::applicable(F::FORMAT.bits, I::FORMAT.bits, lanes);

        if lanes == 0 {
            return Err(ConformanceError::InvalidConfiguration {
                configuration: format!("{} x0", pair),
                detail: "a vector needs at least one lane".to_string(),
            });
        }

        let boundary = BoundaryTable::global()?.boundary::<F, I>()?;
        debug!(
            "{} x{}: boundary [{}, {}], variants {:?}",
            pair,
            lanes,
            describe_float(boundary.lowest),
            describe_float(boundary.highest),
            variants
        );

        Ok(ConfigurationRun {
            backend,
            pair,
            lanes,
            variants,
            boundary,
            reference: ReferenceConverter::new(boundary),
            sampler: InRangeSampler::new(I::FORMAT),
            synthesizer: OutOfRangeSynthesizer::new(boundary),
            rng: RandomStream::new(config.seed),
            trials: config.adjusted_trials(),
            stage: Stage::Init,
            stats: OracleStats::default(),
        })
    }

    fn configuration(&self, variant: ConversionVariant) -> Configuration {
        Configuration {
            pair: self.pair,
            lanes: self.lanes,
            variant,
        }
    }

    fn call_backend(&self, variant: ConversionVariant, from: &LaneVector<F>) -> Result<LaneVector<I>, String> {
        let backend = self.backend;
        catch_unwind(AssertUnwindSafe(|| backend.fast_convert::<F, I>(variant, from)))
            .map_err(|payload| panic_message(payload.as_ref()))
    }

    /// Narrows a trap down to the first input lane that traps on its own.
    fn locate_trap(&self, variant: ConversionVariant, from: &LaneVector<F>, message: String) -> Trap {
        let culprit = (0..from.len()).find(|&lane| {
            let alone = LaneVector::splat(from.lane(lane), from.len());
            self.call_backend(variant, &alone).is_err()
        });

        match culprit {
            Some(lane) => Trap {
                lane: Some(lane),
                input: describe_float(from.lane(lane)),
                message,
            },
            None => Trap {
                lane: None,
                input: describe_lanes(from),
                message,
            },
        }
    }

    /// Runs the backend, turning a trap into the error `trapped` builds and
    /// a short result into `LaneCountMismatch`.
    fn convert(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
        trapped: impl FnOnce(Trap) -> ConformanceError,
    ) -> ConformanceResult<LaneVector<I>> {
        let actual = match self.call_backend(variant, from) {
            Ok(actual) => actual,
            Err(message) => {
                debug!("{} trapped: {}", self.configuration(variant), message);
                return Err(trapped(self.locate_trap(variant, from, message)));
            }
        };
        let expected = variant.output_lanes(from.len());
        if actual.len() != expected {
            return Err(ConformanceError::LaneCountMismatch {
                configuration: self.configuration(variant).to_string(),
                stage: self.stage.to_string(),
                expected,
                actual: actual.len(),
            });
        }
        Ok(actual)
    }

    /// Converts `from` and compares every output lane with the expectation of
    /// the input lane it comes from. Returns the number of lanes compared.
    fn check_exact(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
        expected_per_input: &LaneVector<I>,
    ) -> ConformanceResult<u64> {
        let actual = self.convert(variant, from, |trap| ConformanceError::ExactnessMismatch {
            configuration: self.configuration(variant).to_string(),
            stage: self.stage.to_string(),
            lane: trap.lane(),
            input: trap.input.clone(),
            expected: "no trap".to_string(),
            actual: trap.result(),
        })?;
        for (lane, got) in actual.iter().enumerate() {
            let source = variant.source_lane(lane, from.len());
            let want = expected_per_input.lane(source);
            if got != want {
                return Err(ConformanceError::ExactnessMismatch {
                    configuration: self.configuration(variant).to_string(),
                    stage: self.stage.to_string(),
                    lane,
                    input: describe_float(from.lane(source)),
                    expected: want.to_string(),
                    actual: got.to_string(),
                });
            }
        }
        Ok(actual.len() as u64)
    }

    fn scalar_edge_check(&mut self) -> ConformanceResult<()> {
        let mut values = vec![F::from_f64(0.0), F::from_f64(1.0)];
        if I::FORMAT.signed {
            values.push(F::from_f64(-1.0));
        }
        values.push(self.boundary.lowest);
        values.push(self.boundary.highest);

        for &value in &values {
            let from = LaneVector::splat(value, self.lanes);
            let expected = LaneVector::splat(self.reference.convert(value), self.lanes);
            for &variant in &self.variants {
                self.stats.edge_lanes += self.check_exact(variant, &from, &expected)?;
            }
        }
        Ok(())
    }

    fn pattern_check(&mut self) -> ConformanceResult<()> {
        let mask = F::FORMAT.mantissa_mask() & (I::FORMAT.max / 2);
        let pattern = LaneVector::<u64>::iota(self.lanes).and(mask).wrapping_add(1);

        let from = pattern.map(|value| F::from_f64(value as f64));
        let expected = pattern.map(I::from_raw_bits);
        for &variant in &self.variants {
            self.stats.pattern_lanes += self.check_exact(variant, &from, &expected)?;
        }
        Ok(())
    }

    fn random_in_range_trials(&mut self) -> ConformanceResult<()> {
        for _ in 0..self.trials {
            let sampler = self.sampler;
            let rng = &mut self.rng;
            let from = LaneVector::from_fn(self.lanes, |_| sampler.sample(rng));

            if let Some(stray) = from.iter().find(|&value| !self.boundary.contains(value)) {
                return Err(ConformanceError::boundary(
                    self.pair,
                    format!("in-range sample {} lies outside the boundary", describe_float(stray)),
                ));
            }

            let reference = self.reference;
            let expected = from.map(|value| reference.convert(value));
            for &variant in &self.variants {
                self.stats.in_range_lanes += self.check_exact(variant, &from, &expected)?;
                for &contaminant in &Contaminant::ALL {
                    self.stats.isolation_lanes +=
                        self.check_isolation(variant, &from, &expected, contaminant)?;
                }
            }
        }
        Ok(())
    }

    /// Plants `contaminant` in the even lanes, then in the odd lanes, and
    /// checks the output lanes sourced from the untouched inputs.
    fn check_isolation(
        &self,
        variant: ConversionVariant,
        from: &LaneVector<F>,
        expected_per_input: &LaneVector<I>,
        contaminant: Contaminant,
    ) -> ConformanceResult<u64> {
        let poison = LaneVector::splat(contaminant.value::<F>(), from.len());
        let mut checked = 0;

        for &position in &[LanePosition::Even, LanePosition::Odd] {
            let mixed = match position {
                LanePosition::Even => LaneVector::odd_even(from, &poison),
                LanePosition::Odd => LaneVector::odd_even(&poison, from),
            };
            let actual = self.convert(variant, &mixed, |trap| ConformanceError::LaneIsolationViolation {
                configuration: self.configuration(variant).to_string(),
                stage: self.stage.to_string(),
                lane: trap.lane(),
                input: trap.input.clone(),
                contaminant: contaminant.to_string(),
                position,
                expected: "no trap".to_string(),
                actual: trap.result(),
            })?;

            for (lane, got) in actual.iter().enumerate() {
                let source = variant.source_lane(lane, from.len());
                let poisoned = match position {
                    LanePosition::Even => source % 2 == 0,
                    LanePosition::Odd => source % 2 == 1,
                };
                if poisoned {
                    continue;
                }

                let want = expected_per_input.lane(source);
                if got != want {
                    return Err(ConformanceError::LaneIsolationViolation {
                        configuration: self.configuration(variant).to_string(),
                        stage: self.stage.to_string(),
                        lane,
                        input: describe_float(from.lane(source)),
                        contaminant: contaminant.to_string(),
                        position,
                        expected: want.to_string(),
                        actual: got.to_string(),
                    });
                }
                checked += 1;
            }
        }
        Ok(checked)
    }

    fn random_out_of_range_trials(&mut self) -> ConformanceResult<()> {
        let synthesizer = match self.synthesizer {
            Some(synthesizer) => synthesizer,
            None => {
                warn!(
                    "{}: every finite {} converts in range, no out-of-range trials",
                    self.pair,
                    F::KIND
                );
                self.stats.vacuous_out_of_range_stages += 1;
                return Ok(());
            }
        };

        let all_ones = I::FORMAT.all_ones();
        for _ in 0..self.trials {
            let rng = &mut self.rng;
            let from = LaneVector::from_fn(self.lanes, |_| synthesizer.synthesize(rng));

            if let Some(stray) = from
                .iter()
                .find(|&value| !value.is_finite_value() || synthesizer.boundary().contains(value))
            {
                return Err(ConformanceError::boundary(
                    self.pair,
                    format!("out-of-range sample {} is not a finite out-of-range value", describe_float(stray)),
                ));
            }

            for &variant in &self.variants {
                let actual = self.convert(variant, &from, |trap| ConformanceError::RelaxedContractViolation {
                    configuration: self.configuration(variant).to_string(),
                    stage: self.stage.to_string(),
                    lane: trap.lane(),
                    input: trap.input.clone(),
                    actual: trap.result(),
                    check: "conversion must not trap".to_string(),
                })?;
                let sentinel = black_box(0u64);

                for (lane, result) in actual.iter().enumerate() {
                    let bits = result.to_raw_bits();
                    let check = if bits & sentinel != 0 {
                        Some("AND with the zero sentinel is not zero")
                    } else if (bits | !sentinel) & all_ones != all_ones {
                        Some("OR with the complemented sentinel is not all-ones")
                    } else {
                        None
                    };

                    if let Some(check) = check {
                        let source = variant.source_lane(lane, from.len());
                        return Err(ConformanceError::RelaxedContractViolation {
                            configuration: self.configuration(variant).to_string(),
                            stage: self.stage.to_string(),
                            lane,
                            input: describe_float(from.lane(source)),
                            actual: format!("{:#x}", bits),
                            check: check.to_string(),
                        });
                    }
                }
                self.stats.out_of_range_lanes += actual.len() as u64;
            }
        }
        Ok(())
    }
}
