use log::trace;
use rand::Rng;
use rayon::prelude::*;

use crate::dna::Genome;
use crate::error::{EvolveError, Result};
use crate::fitness::Target;
use crate::mutate::{crossover, mutate};
use crate::mutation_config::MutateConfig;

/// A genome together with the fitness of exactly that genome.
///
/// Only `Target::evaluate` builds one, and the genome can't be changed
/// afterwards, so the cached fitness is never stale. Operators work on
/// `Genome` values and get re-evaluated into new candidates.
#[derive(Clone, Debug)]
pub struct Candidate {
    genome: Genome,
    fitness: f64,
}

impl Candidate {
    pub(crate) fn scored(genome: Genome, fitness: f64) -> Self {
        Self { genome, fitness }
    }

    #[inline]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// L2 distance to the target; lower is better
    #[inline]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }
}

/// what one generation step did, for logging
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GenerationReport {
    pub couples: usize,
    pub best_fitness: f64,
    pub worst_fitness: f64,
}

/// Candidates evolved together. Identity is position in the list; the list
/// order is stable (removal shifts, never swaps) so ties resolve the same
/// way every time.
#[derive(Clone, Debug, Default)]
pub struct Population {
    candidates: Vec<Candidate>,
}

impl Population {
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    /// `size` random genomes of `num_triangles` each, rendered and scored.
    /// genomes are drawn sequentially from `rng` (deterministic for a seed),
    /// scoring runs in parallel.
    pub fn initialize<R: Rng>(target: &Target, size: usize, num_triangles: usize, rng: &mut R) -> Result<Self> {
        profiling::scope!("Population::initialize");
        let genomes: Vec<Genome> = (0..size)
            .map(|_| Genome::random(rng, target.width(), target.height(), num_triangles))
            .collect();

        let candidates = genomes
            .into_par_iter()
            .map(|genome| target.evaluate(genome))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { candidates })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[inline]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// crate-only: the candidate must have been scored against the same target
    pub(crate) fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    fn require_pair(&self) -> Result<()> {
        if self.candidates.len() < 2 {
            return Err(EvolveError::PopulationTooSmall { len: self.candidates.len() });
        }
        Ok(())
    }

    /// index of the first candidate with the lowest fitness, skipping `exclude`
    fn position_of_best(&self, exclude: Option<usize>) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, c) in self.candidates.iter().enumerate() {
            if Some(i) == exclude {
                continue;
            }
            match best {
                Some(b) if c.fitness >= self.candidates[b].fitness => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// index of the first candidate with the highest fitness
    fn position_of_worst(&self) -> Option<usize> {
        let mut worst: Option<usize> = None;
        for (i, c) in self.candidates.iter().enumerate() {
            match worst {
                Some(w) if c.fitness <= self.candidates[w].fitness => {}
                _ => worst = Some(i),
            }
        }
        worst
    }

    /// The two fittest candidates as two distinct indices, best first.
    ///
    /// Two separate passes: the global minimum, then the minimum of everything
    /// else. Equal fitness goes to whichever comes first in the list.
    pub fn select_parents(&self) -> Result<(usize, usize)> {
        self.require_pair()?;
        let first = self.position_of_best(None).ok_or(EvolveError::PopulationTooSmall { len: 0 })?;
        let second = self
            .position_of_best(Some(first))
            .ok_or(EvolveError::PopulationTooSmall { len: 1 })?;
        Ok((first, second))
    }

    /// Remove the single worst candidate (first one on ties) and return it.
    pub fn remove_worst(&mut self) -> Result<Candidate> {
        self.require_pair()?;
        let worst = self.position_of_worst().ok_or(EvolveError::PopulationTooSmall { len: 0 })?;
        Ok(self.candidates.remove(worst))
    }

    /// Drop the two worst candidates, one at a time so the second is picked
    /// from what remains after the first is gone.
    pub fn remove_worst_two(&mut self) -> Result<[Candidate; 2]> {
        let a = self.remove_worst()?;
        let b = self.remove_worst()?;
        Ok([a, b])
    }

    /// fittest candidate (first one on ties), or `None` when empty
    pub fn best(&self) -> Option<&Candidate> {
        self.position_of_best(None).map(|i| &self.candidates[i])
    }

    pub fn worst(&self) -> Option<&Candidate> {
        self.position_of_worst().map(|i| &self.candidates[i])
    }

    /// Breed one couple: select the two fittest, cross them over, mutate both
    /// children, score them, append them, then cull the two worst.
    /// Size is unchanged afterwards.
    pub fn breed_couple<R: Rng>(&mut self, target: &Target, cfg: &MutateConfig, rng: &mut R) -> Result<()> {
        profiling::scope!("breed_couple");
        let (i, j) = self.select_parents()?;
        let (a, b) = crossover(self.candidates[i].genome(), self.candidates[j].genome())?;
        let a = mutate(&a, cfg.mutation_rate, &cfg.odds, rng);
        let b = mutate(&b, cfg.mutation_rate, &cfg.odds, rng);

        let (a, b) = rayon::join(|| target.evaluate(a), || target.evaluate(b));
        let (a, b) = (a?, b?);
        trace!(
            "parents #{i} ({:.2}) x #{j} ({:.2}) -> children {:.2}, {:.2}",
            self.candidates[i].fitness,
            self.candidates[j].fitness,
            a.fitness,
            b.fitness
        );

        self.push(a);
        self.push(b);
        self.remove_worst_two()?;
        Ok(())
    }

    /// One generation: `floor(crossover_rate * len)` couples, each followed by
    /// replacement of the two worst. The couple count uses the size at the
    /// start of the step.
    pub fn step<R: Rng>(&mut self, target: &Target, cfg: &MutateConfig, rng: &mut R) -> Result<GenerationReport> {
        profiling::scope!("Population::step");
        let couples = (cfg.crossover_rate * self.candidates.len() as f64).floor() as usize;
        for _ in 0..couples {
            self.breed_couple(target, cfg, rng)?;
        }

        Ok(GenerationReport {
            couples,
            best_fitness: self.best().map_or(f64::NAN, Candidate::fitness),
            worst_fitness: self.worst().map_or(f64::NAN, Candidate::fitness),
        })
    }
}
