//! Synthetic growth curves.
//!
//! Each replicate follows logistic growth after a lag phase,
//!
//! `N(t) = K / (1 + (K/N0 - 1) e^(-r (t - lag)))` for `t >= lag`, `N0` before,
//!
//! with multiplicative log-normal measurement noise. Generation is seeded, so a
//! given configuration always yields the same table.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Replicate, Sample};
use crate::error::AppError;

/// Parameters of a simulated plate.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub replicates: usize,
    pub points: usize,
    /// Time between consecutive samples.
    pub dt: f64,
    /// Initial OD.
    pub n0: f64,
    /// Carrying capacity.
    pub capacity: f64,
    /// Intrinsic growth rate.
    pub rate: f64,
    pub lag: f64,
    /// Standard deviation of the log-normal noise factor.
    pub noise_sigma: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            replicates: 3,
            points: 25,
            dt: 0.5,
            n0: 0.05,
            capacity: 1.5,
            rate: 0.7,
            lag: 2.0,
            noise_sigma: 0.03,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.replicates == 0 || self.points == 0 {
            return Err(AppError::new(2, "Replicate and point counts must be > 0."));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(AppError::new(2, format!("Time step must be > 0 (got {}).", self.dt)));
        }
        if !(self.n0.is_finite() && self.capacity.is_finite() && self.n0 > 0.0 && self.capacity > self.n0) {
            return Err(AppError::new(
                2,
                format!(
                    "Need 0 < N0 < K (got N0={}, K={}).",
                    self.n0, self.capacity
                ),
            ));
        }
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(AppError::new(2, format!("Growth rate must be > 0 (got {}).", self.rate)));
        }
        if !(self.lag.is_finite() && self.lag >= 0.0) {
            return Err(AppError::new(2, format!("Lag must be >= 0 (got {}).", self.lag)));
        }
        if !(self.noise_sigma.is_finite() && self.noise_sigma >= 0.0) {
            return Err(AppError::new(
                2,
                format!("Noise sigma must be >= 0 (got {}).", self.noise_sigma),
            ));
        }
        Ok(())
    }

    /// Noise-free OD at time `t`.
    pub fn logistic_od(&self, t: f64) -> f64 {
        let elapsed = (t - self.lag).max(0.0);
        let k = self.capacity;
        k / (1.0 + (k / self.n0 - 1.0) * (-self.rate * elapsed).exp())
    }
}

/// Generate `config.replicates` noisy replicates named `R1`, `R2`, ...
pub fn simulate(config: &SimulationConfig) -> Result<Vec<Replicate>, AppError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let replicates = (0..config.replicates)
        .map(|r| {
            let samples = (0..config.points)
                .map(|i| {
                    let t = i as f64 * config.dt;
                    let z: f64 = normal.sample(&mut rng);
                    Sample::new(t, config.logistic_od(t) * (config.noise_sigma * z).exp())
                })
                .collect();
            Replicate {
                name: format!("R{}", r + 1),
                samples,
            }
        })
        .collect();

    Ok(replicates)
}

/// Write replicates as a wide CSV (`time,R1,R2,...`), the layout ingest reads.
///
/// All replicates are expected to share the same time points.
pub fn write_simulated<W: Write>(writer: W, replicates: &[Replicate]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["time".to_string()];
    header.extend(replicates.iter().map(|r| r.name.clone()));
    wtr.write_record(&header)
        .map_err(|e| AppError::new(4, format!("Failed to write CSV header: {e}")))?;

    let rows = replicates.first().map(|r| r.samples.len()).unwrap_or(0);
    for i in 0..rows {
        let mut record = vec![format!("{:.4}", replicates[0].samples[i].time)];
        record.extend(
            replicates
                .iter()
                .map(|r| r.samples.get(i).map(|s| format!("{:.6}", s.od)).unwrap_or_default()),
        );
        wtr.write_record(&record)
            .map_err(|e| AppError::new(4, format!("Failed to write CSV row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush CSV: {e}")))?;
    Ok(())
}

/// Simulate and write straight to `path`.
pub fn write_simulated_csv(path: &Path, config: &SimulationConfig) -> Result<Vec<Replicate>, AppError> {
    let replicates = simulate(config)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", path.display())))?;
    write_simulated(file, &replicates)?;
    log::info!(
        "wrote {} ({} replicate(s) x {} point(s), seed {})",
        path.display(),
        config.replicates,
        config.points,
        config.seed
    );
    Ok(replicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SelectionConfig, Window};
    use crate::fit::{fit_growth_rate, select_exponential_phase};
    use crate::io::ingest::parse_growth_table;

    #[test]
    fn same_seed_same_table() {
        let cfg = SimulationConfig::default();
        assert_eq!(simulate(&cfg).unwrap(), simulate(&cfg).unwrap());

        let other = SimulationConfig { seed: 7, ..cfg.clone() };
        assert_ne!(simulate(&cfg).unwrap(), simulate(&other).unwrap());
    }

    #[test]
    fn logistic_starts_at_n0_and_approaches_capacity() {
        let cfg = SimulationConfig::default();
        assert!((cfg.logistic_od(0.0) - cfg.n0).abs() < 1e-12);
        assert!((cfg.logistic_od(cfg.lag) - cfg.n0).abs() < 1e-12);
        assert!((cfg.logistic_od(100.0) - cfg.capacity).abs() < 1e-9);
    }

    #[test]
    fn written_csv_is_readable_and_growth_rate_is_recovered() {
        let cfg = SimulationConfig {
            noise_sigma: 0.0,
            ..SimulationConfig::default()
        };
        let reps = simulate(&cfg).unwrap();
        let mut buf = Vec::new();
        write_simulated(&mut buf, &reps).unwrap();

        let table = parse_growth_table(buf.as_slice()).unwrap();
        assert_eq!(table.replicates.len(), 3);
        assert!(table.row_errors.is_empty());

        let samples = &table.replicates[0].samples;
        assert_eq!(samples.len(), cfg.points);
        let phase =
            select_exponential_phase(samples, &Window::unbounded(), &SelectionConfig::new(3, 7)).unwrap();
        let fit = fit_growth_rate(&phase.samples).unwrap();
        assert!(
            (fit.growth_rate - cfg.rate).abs() / cfg.rate < 0.15,
            "rate {}",
            fit.growth_rate
        );
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let bad = SimulationConfig {
            capacity: 0.01,
            ..SimulationConfig::default()
        };
        assert_eq!(simulate(&bad).unwrap_err().exit_code(), 2);
    }
}
