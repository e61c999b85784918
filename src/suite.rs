// Verification entry points.
// `verify_configuration` checks one type pair at one lane count;
// `verify_all` builds the boundary table up front and then sweeps every
// supported pair across the configured lane counts.

use crate::backend::ConversionFamily;
use crate::boundary::BoundaryTable;
use crate::config::OracleConfig;
use crate::error::ConformanceResult;
use crate::formats::{DestInt, SourceFloat};
use crate::oracle::{ConformanceOracle, OracleStats};
use half::f16;

/// Verifies `F -> I` conversions of `backend` at `lanes` lanes.
pub fn verify_configuration<F: SourceFloat, I: DestInt, B: ConversionFamily>(
    backend: &B,
    lanes: usize,
    config: &OracleConfig,
) -> ConformanceResult<OracleStats> {
    BoundaryTable::global()?;
    let mut oracle = ConformanceOracle::new(backend, config.clone());
    oracle.verify::<F, I>(lanes)?;
    Ok(oracle.stats().clone())
}

macro_rules! verify_pairs {
    ($oracle:ident, $lanes:expr; $($float:ty => $($int:ty),+;)+) => {
        $($(
            $oracle.verify::<$float, $int>($lanes)?;
        )+)+
    };
}

/// Verifies every supported type pair at every lane count in `config`.
///
/// Boundary invariants are checked for all pairs before the first
/// conversion runs; the first violation of any kind ends the sweep.
pub fn verify_all<B: ConversionFamily>(backend: &B, config: &OracleConfig) -> ConformanceResult<OracleStats> {
    let table = BoundaryTable::global()?;
    log::info!(
        "verifying {} type pairs at lane counts {:?} on the {} backend",
        table.len(),
        config.lane_counts,
        backend.name()
    );

    let mut oracle = ConformanceOracle::new(backend, config.clone());
    for &lanes in &config.lane_counts {
        verify_pairs! { oracle, lanes;
            f16 => i16, u16, i32, u32, i64, u64;
            f32 => i16, u16, i32, u32, i64, u64;
            f64 => i16, u16, i32, u32, i64, u64;
        }
    }
    Ok(oracle.stats().clone())
}

/// Like [`verify_configuration`] with default settings, panicking with the
/// diagnostic on the first violation.
pub fn assert_conforms<F: SourceFloat, I: DestInt, B: ConversionFamily>(backend: &B, lanes: usize) {
    if let Err(violation) = verify_configuration::<F, I, B>(backend, lanes, &OracleConfig::default()) {
        panic!("{} backend: {}", backend.name(), violation);
    }
}
