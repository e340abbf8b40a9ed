//! Generator tunables, loadable from a JSON settings file. Fields left out of the file keep their
//! defaults.

use instant::Duration;
use serde::{Deserialize, Serialize};

use crate::difficulty::ScoreNormalization;
use crate::errors::SettingsError;
use crate::solver::SolverLimits;

/// Tunables for the generator. Every field has a default, so a settings file only needs to name
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// How many candidate templates a single request may try.
    #[serde(default = "default_max_templates")]
    pub max_templates: usize,

    /// Difficulty bands tried per template, the last being unrestricted.
    #[serde(default = "default_band_tries")]
    pub band_tries: usize,

    #[serde(default = "default_band_widen_step")]
    pub band_widen_step: f64,

    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,

    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    #[serde(default = "default_max_ac3_iterations")]
    pub max_ac3_iterations: usize,

    /// `(grid size, attempt budget)` pairs, sorted by size.
    #[serde(default = "default_attempt_budgets")]
    pub attempt_budgets: Vec<(usize, u64)>,

    #[serde(default)]
    pub normalization: ScoreNormalization,
}

fn default_max_templates() -> usize {
    8
}
fn default_band_tries() -> usize {
    4
}
fn default_band_widen_step() -> f64 {
    2.0
}
fn default_time_budget_ms() -> u64 {
    3_000
}
fn default_max_candidates() -> usize {
    40
}
fn default_max_ac3_iterations() -> usize {
    10_000
}
fn default_attempt_budgets() -> Vec<(usize, u64)> {
    vec![(7, 2_000), (9, 5_000), (11, 8_000), (13, 12_000), (15, 15_000)]
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        GeneratorSettings {
            max_templates: default_max_templates(),
            band_tries: default_band_tries(),
            band_widen_step: default_band_widen_step(),
            time_budget_ms: default_time_budget_ms(),
            max_candidates: default_max_candidates(),
            max_ac3_iterations: default_max_ac3_iterations(),
            attempt_budgets: default_attempt_budgets(),
            normalization: ScoreNormalization::default(),
        }
    }
}

impl GeneratorSettings {
    pub fn from_json(json: &str) -> Result<GeneratorSettings, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Native-only convenience: read a JSON settings file from disk.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<GeneratorSettings, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Solver attempt budget for a grid size. Sizes between table entries are interpolated
    /// linearly; sizes outside the table use the nearest entry.
    pub fn attempt_budget(&self, grid_size: usize) -> u64 {
        let mut table = self.attempt_budgets.clone();
        table.sort_by_key(|&(size, _)| size);

        let (Some(&first), Some(&last)) = (table.first(), table.last()) else {
            return SolverLimits::default().max_attempts;
        };
        if grid_size <= first.0 {
            return first.1;
        }
        if grid_size >= last.0 {
            return last.1;
        }

        for pair in table.windows(2) {
            let ((low_size, low_budget), (high_size, high_budget)) = (pair[0], pair[1]);
            if grid_size == low_size {
                return low_budget;
            }
            if grid_size < high_size {
                let fraction = (grid_size - low_size) as f64 / (high_size - low_size) as f64;
                let budget = low_budget as f64 + fraction * (high_budget as f64 - low_budget as f64);
                return budget.round() as u64;
            }
        }

        last.1
    }

    pub fn solver_limits(&self, grid_size: usize) -> SolverLimits {
        SolverLimits {
            max_attempts: self.attempt_budget(grid_size),
            time_budget: Duration::from_millis(self.time_budget_ms),
            max_candidates: self.max_candidates,
            max_ac3_iterations: self.max_ac3_iterations,
        }
    }
}
