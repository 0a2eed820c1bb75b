use serde::{Deserialize, Serialize};

/// How a triangle picked for mutation is changed.
///
/// A discriminator is drawn uniformly from `0..span`:
/// - `< color_below` recolors one channel
/// - `< points_below` moves one vertex
/// - otherwise does both
///
/// The defaults `{20, 40, 51}` are the historical thresholds. They are *not* a
/// 40/40/20 split: 20/51 ≈ 39.2 % color, 20/51 ≈ 39.2 % points, 11/51 ≈ 21.6 % both.
/// They are kept exact so runs stay comparable; change them here to re-weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOdds {
    pub color_below: u32,
    pub points_below: u32,
    pub span: u32,
}

impl Default for MutationOdds {
    fn default() -> Self {
        Self { color_below: 20, points_below: 40, span: 51 }
    }
}

impl MutationOdds {
    pub fn is_valid(&self) -> bool {
        self.span > 0 && self.color_below <= self.points_below && self.points_below <= self.span
    }

    /// (color, points, both) probabilities
    pub fn probabilities(&self) -> (f64, f64, f64) {
        let span = self.span as f64;
        (
            self.color_below as f64 / span,
            (self.points_below - self.color_below) as f64 / span,
            (self.span - self.points_below) as f64 / span,
        )
    }
}

/// per-run genetic operator parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MutateConfig {
    pub mutation_rate: f64,  // chance each child triangle is mutated, 0..=1
    pub crossover_rate: f64, // couples per generation = floor(rate * population size)
    pub odds: MutationOdds,
}

impl Default for MutateConfig {
    fn default() -> Self {
        Self { mutation_rate: 0.05, crossover_rate: 0.5, odds: MutationOdds::default() }
    }
}
