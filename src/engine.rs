use image::RgbImage;
use log::{debug, info};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::error::{EvolveError, Result};
use crate::fitness::{MetricsSnapshot, Target};
use crate::mutation_config::MutateConfig;
use crate::population::{Candidate, GenerationReport, Population};

/// everything the engine needs besides the target
#[derive(Clone, Copy, Debug)]
pub struct EngineInit {
    pub num_triangles: usize,
    pub population_size: usize,
    pub generations: u64,
    pub cfg: MutateConfig,
    pub seed: u64,
}

/// handed to the caller whenever a checkpoint generation completes
#[derive(Debug)]
pub struct Checkpoint<'a> {
    pub generation: u64,
    pub best: &'a Candidate,
    pub metrics: MetricsSnapshot,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub generations: u64,
    pub initial_best: f64,
    pub final_best: f64,
    pub checkpoints: usize,
}

/// checkpoints fire every `generations / 3` generations (at least every one)
#[inline]
pub fn checkpoint_interval(generations: u64) -> u64 {
    (generations / 3).max(1)
}

/// `generation` is 0-based; the last one always checkpoints
#[inline]
pub fn is_checkpoint(generation: u64, generations: u64) -> bool {
    generation % checkpoint_interval(generations) == 0 || generation + 1 == generations
}

/// Owns the population, the target and the run's RNG. Performs no I/O:
/// persistence happens in the checkpoint callback.
pub struct Engine {
    rng: Pcg32,
    cfg: MutateConfig,
    target: Target,
    population: Population,
    generations: u64,
    generation: u64, // completed generations
}

impl Engine {
    /// seeds the RNG and builds the initial random population
    pub fn new(target: Target, init: EngineInit) -> Result<Self> {
        profiling::scope!("Engine::new");
        let mut rng = Pcg32::seed_from_u64(init.seed);
        let population = Population::initialize(&target, init.population_size, init.num_triangles, &mut rng)?;

        if let Some(best) = population.best() {
            info!(
                "initial population: {} candidates x {} triangles, best fitness {:.2}",
                population.len(),
                init.num_triangles,
                best.fitness()
            );
        }

        Ok(Self {
            rng,
            cfg: init.cfg,
            target,
            population,
            generations: init.generations,
            generation: 0,
        })
    }

    /// generations completed so far
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[inline]
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.population.best()
    }

    /// the candidate's pixels, for the caller to encode
    pub fn render(&self, candidate: &Candidate) -> Result<RgbImage> {
        self.target.render(candidate.genome())
    }

    /// run exactly one generation step
    pub fn step(&mut self) -> Result<GenerationReport> {
        profiling::scope!("Engine::step");
        let report = self.population.step(&self.target, &self.cfg, &mut self.rng)?;
        self.generation += 1;
        Ok(report)
    }

    /// Runs the remaining generations. After each checkpoint generation the
    /// current best candidate is passed to `on_checkpoint`; an error from the
    /// callback stops the run.
    pub fn run<F>(&mut self, mut on_checkpoint: F) -> Result<RunSummary>
    where
        F: FnMut(Checkpoint<'_>) -> Result<()>,
    {
        profiling::scope!("Engine::run");
        let initial_best = self.best_fitness()?;
        let mut checkpoints = 0;

        while self.generation < self.generations {
            let gen = self.generation;
            let report = self.step()?;
            debug!(
                "generation {}/{}: {} couples, best {:.2}, worst {:.2}",
                gen + 1,
                self.generations,
                report.couples,
                report.best_fitness,
                report.worst_fitness
            );

            if is_checkpoint(gen, self.generations) {
                let best = self.population.best().ok_or(EvolveError::PopulationTooSmall { len: 0 })?;
                let metrics = self.target.metrics(best.fitness());
                info!(
                    "checkpoint at generation {gen}: fitness {:.2}, rmse {:.2}, psnr {:.2} dB",
                    best.fitness(),
                    metrics.rmse,
                    metrics.psnr
                );
                on_checkpoint(Checkpoint { generation: gen, best, metrics })?;
                checkpoints += 1;
            }
        }

        Ok(RunSummary {
            generations: self.generation,
            initial_best,
            final_best: self.best_fitness()?,
            checkpoints,
        })
    }

    fn best_fitness(&self) -> Result<f64> {
        self.population
            .best()
            .map(Candidate::fitness)
            .ok_or(EvolveError::PopulationTooSmall { len: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn engine(seed: u64, generations: u64) -> Engine {
        let mut img = RgbImage::from_pixel(6, 6, Rgb([200, 200, 200]));
        for y in 0..3 {
            for x in 0..6 {
                img.put_pixel(x, y, Rgb([30, 60, 90]));
            }
        }
        let target = Target::new(img, Rgb([0, 0, 0])).unwrap();
        let init = EngineInit {
            num_triangles: 4,
            population_size: 8,
            generations,
            cfg: MutateConfig { mutation_rate: 0.2, crossover_rate: 0.5, ..MutateConfig::default() },
            seed,
        };
        Engine::new(target, init).unwrap()
    }

    #[test]
    fn test_checkpoint_schedule() {
        let hits: Vec<u64> = (0..9).filter(|&g| is_checkpoint(g, 9)).collect();
        assert_eq!(hits, vec![0, 3, 6, 8]);

        let hits: Vec<u64> = (0..10).filter(|&g| is_checkpoint(g, 10)).collect();
        assert_eq!(hits, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_short_runs_checkpoint_every_generation() {
        assert_eq!(checkpoint_interval(2), 1);
        assert!((0..2).all(|g| is_checkpoint(g, 2)));
        assert!(is_checkpoint(0, 1));
    }

    #[test]
    fn test_run_reports_checkpoints_in_order() {
        let mut engine = engine(42, 7);
        let mut seen = Vec::new();
        let summary = engine
            .run(|cp| {
                seen.push((cp.generation, cp.best.fitness()));
                Ok(())
            })
            .unwrap();

        assert_eq!(summary.generations, 7);
        assert_eq!(seen.iter().map(|s| s.0).collect::<Vec<_>>(), vec![0, 2, 4, 6]);
        assert_eq!(summary.checkpoints, 4);
        // best fitness never goes up
        assert!(seen.windows(2).all(|w| w[1].1 <= w[0].1));
        assert!(summary.final_best <= summary.initial_best);
        assert_eq!(engine.population().len(), 8);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = engine(7, 5);
        let mut b = engine(7, 5);
        let sa = a.run(|_| Ok(())).unwrap();
        let sb = b.run(|_| Ok(())).unwrap();
        assert_eq!(sa, sb);
        assert_eq!(a.best().unwrap().genome(), b.best().unwrap().genome());
    }

    #[test]
    fn test_callback_error_stops_run() {
        let mut engine = engine(1, 9);
        let err = engine
            .run(|_| Err(EvolveError::InvalidSettings("stop".into())))
            .unwrap_err();
        assert!(matches!(err, EvolveError::InvalidSettings(_)));
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn test_render_best_matches_fitness() {
        let engine = engine(3, 1);
        let best = engine.best().unwrap();
        let pixels = engine.render(best).unwrap();
        let again = crate::fitness::l2_rgb_parallel(engine.target().image(), &pixels).unwrap();
        assert_eq!(again, best.fitness());
    }
}
