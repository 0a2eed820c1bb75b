//! run settings for trimimic
//! these can come from a JSON file and be overridden on the command line

use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::EngineInit;
use crate::error::{EvolveError, Result};
use crate::mutation_config::{MutateConfig, MutationOdds};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// triangles per candidate, fixed for the whole run
    pub num_triangles: usize,
    pub population_size: usize,
    /// couples bred per generation = floor(crossover_rate * population_size)
    pub crossover_rate: f64,
    /// per-triangle chance a child is mutated
    pub mutation_rate: f64,
    pub generations: u64,

    /// color the triangles are composited over
    pub background: [u8; 3],
    /// `None` draws a fresh seed each run (it is logged so the run can be repeated)
    pub seed: Option<u64>,
    pub mutation_odds: MutationOdds,

    /// also write the best genome as JSON next to every checkpoint image
    pub save_genome: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            num_triangles: 50,
            population_size: 50,
            crossover_rate: 0.5,
            mutation_rate: 0.05,
            generations: 1_000,
            background: [0, 0, 0], // black, like the classic script
            seed: None,
            mutation_odds: MutationOdds::default(),
            save_genome: false,
        }
    }
}

impl RunSettings {
    /// save settings to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// load settings from a JSON file, or return defaults if it can't be read or parsed
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("failed to parse {}: {}. using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                if path.exists() {
                    warn!("failed to read {}: {}. using defaults.", path.display(), e);
                }
                Self::default()
            }
        }
    }

    /// strict variant for callers that want a bad file to be fatal
    pub fn load_strict(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn validate(&self) -> Result<()> {
        fn rate_ok(r: f64) -> bool {
            r.is_finite() && (0.0..=1.0).contains(&r)
        }

        if self.num_triangles == 0 {
            return Err(EvolveError::InvalidSettings("num_triangles must be > 0".into()));
        }
        if self.population_size == 0 {
            return Err(EvolveError::InvalidSettings("population_size must be > 0".into()));
        }
        if self.generations == 0 {
            return Err(EvolveError::InvalidSettings("generations must be > 0".into()));
        }
        if !rate_ok(self.crossover_rate) {
            return Err(EvolveError::InvalidSettings(format!(
                "crossover_rate must be in [0, 1], got {}",
                self.crossover_rate
            )));
        }
        if !rate_ok(self.mutation_rate) {
            return Err(EvolveError::InvalidSettings(format!(
                "mutation_rate must be in [0, 1], got {}",
                self.mutation_rate
            )));
        }
        if !self.mutation_odds.is_valid() {
            return Err(EvolveError::InvalidSettings(format!(
                "mutation_odds must satisfy color_below <= points_below <= span, span > 0; got {:?}",
                self.mutation_odds
            )));
        }
        Ok(())
    }

    /// convert to MutateConfig for the genetic operators
    pub fn to_mutate_config(&self) -> MutateConfig {
        MutateConfig {
            mutation_rate: self.mutation_rate,
            crossover_rate: self.crossover_rate,
            odds: self.mutation_odds,
        }
    }

    /// engine parameters; `seed` is the resolved seed (from settings or freshly drawn)
    pub fn to_engine_init(&self, seed: u64) -> EngineInit {
        EngineInit {
            num_triangles: self.num_triangles,
            population_size: self.population_size,
            generations: self.generations,
            cfg: self.to_mutate_config(),
            seed,
        }
    }
}
