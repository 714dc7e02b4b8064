//! Shared configuration for a synthesis run.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration shared by every category of a run, read-only once the
/// pipeline starts.
///
/// `limit / step` defines the bin count used by every PCF of the run; target
/// and current statistics of the same category always agree on it (see
/// [`SynthesisParams::n_steps`]).
#[non_exhaustive]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynthesisParams {
    /// Radius bin width as a fraction of rmax.
    pub step: f32,
    /// Gaussian kernel bandwidth.
    pub sigma: f32,
    /// Maximum radius multiple covered by the PCF.
    pub limit: f32,
    /// Edge length of the output domain.
    pub domain_length: f32,
    /// Refinement iteration cap (reserved; refinement is currently a no-op).
    pub max_iter: usize,
    /// Refinement acceptance threshold (reserved).
    pub threshold: f32,
    /// Error tolerance added per consecutive dart-throw failure.
    pub error_delta: f32,
    /// Interpret `threshold` as a distance during refinement (reserved).
    pub distance_threshold: bool,
    /// Path of the example file this run was loaded from, if any.
    pub example_filename: Option<String>,
    /// Consecutive dart-throw failures before the grid-search fallback engages.
    pub max_fails: usize,
    /// Cells per axis of the fallback search lattice.
    pub grid_resolution: usize,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            step: 0.1,
            sigma: 0.25,
            limit: 5.0,
            domain_length: 1.0,
            max_iter: 100,
            threshold: 0.001,
            error_delta: 0.001,
            distance_threshold: false,
            example_filename: None,
            max_fails: 1000,
            grid_resolution: 100,
        }
    }
}

impl SynthesisParams {
    /// Creates a new [`SynthesisParams`] with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the radius bin width.
    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Sets the Gaussian kernel bandwidth.
    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = sigma;
        self
    }

    /// Sets the maximum radius multiple.
    pub fn with_limit(mut self, limit: f32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the output domain edge length.
    pub fn with_domain_length(mut self, domain_length: f32) -> Self {
        self.domain_length = domain_length;
        self
    }

    /// Sets the per-failure error tolerance increment.
    pub fn with_error_delta(mut self, error_delta: f32) -> Self {
        self.error_delta = error_delta;
        self
    }

    /// Sets the dart-throw failure budget before grid search.
    pub fn with_max_fails(mut self, max_fails: usize) -> Self {
        self.max_fails = max_fails;
        self
    }

    /// Sets the fallback lattice resolution.
    pub fn with_grid_resolution(mut self, grid_resolution: usize) -> Self {
        self.grid_resolution = grid_resolution;
        self
    }

    /// Records the example file the run was loaded from.
    pub fn with_example_filename(mut self, filename: impl Into<String>) -> Self {
        self.example_filename = Some(filename.into());
        self
    }

    /// Number of radius bins used by every PCF of the run.
    pub fn n_steps(&self) -> usize {
        (self.limit / self.step) as usize
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !(self.step > 0.0) {
            return Err(Error::InvalidConfig("step must be > 0".into()));
        }
        if !(self.sigma > 0.0) {
            return Err(Error::InvalidConfig("sigma must be > 0".into()));
        }
        if self.limit < self.step {
            return Err(Error::InvalidConfig(
                "limit must cover at least one step".into(),
            ));
        }
        if !(self.domain_length > 0.0) {
            return Err(Error::InvalidConfig("domain_length must be > 0".into()));
        }
        if !(self.error_delta > 0.0) {
            return Err(Error::InvalidConfig("error_delta must be > 0".into()));
        }
        if self.grid_resolution < 2 {
            return Err(Error::InvalidConfig(
                "grid_resolution must be at least 2".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        let params = SynthesisParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.n_steps(), 50);
    }

    #[test]
    fn builder_overrides_fields() {
        let params = SynthesisParams::new()
            .with_step(0.2)
            .with_limit(4.0)
            .with_domain_length(2.0)
            .with_grid_resolution(50);
        assert_eq!(params.n_steps(), 20);
        assert_eq!(params.domain_length, 2.0);
        assert_eq!(params.grid_resolution, 50);
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        assert!(SynthesisParams::new().with_step(0.0).validate().is_err());
        assert!(SynthesisParams::new().with_sigma(-1.0).validate().is_err());
        assert!(SynthesisParams::new().with_limit(0.05).validate().is_err());
        assert!(SynthesisParams::new()
            .with_domain_length(0.0)
            .validate()
            .is_err());
        assert!(SynthesisParams::new()
            .with_grid_resolution(1)
            .validate()
            .is_err());
    }
}
