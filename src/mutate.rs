use rand::Rng;

use crate::dna::{random_point, Genome, Triangle};
use crate::error::{EvolveError, Result};
use crate::mutation_config::MutationOdds;

/// what happened to a single triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Color,
    Points,
    Both,
}

impl MutationOdds {
    /// map a discriminator in `0..span` onto a mutation kind
    #[inline]
    pub fn classify(&self, value: u32) -> MutationKind {
        if value < self.color_below {
            MutationKind::Color
        } else if value < self.points_below {
            MutationKind::Points
        } else {
            MutationKind::Both
        }
    }
}

/// Single-point crossover at `len / 2`.
///
/// `a = left[..pivot] ++ right[pivot..]`, `b = right[..pivot] ++ left[pivot..]`.
/// Both children own fresh copies of their triangles, so mutating a child never
/// reaches back into a parent.
pub fn crossover(left: &Genome, right: &Genome) -> Result<(Genome, Genome)> {
    profiling::scope!("crossover");
    if left.len() != right.len() {
        return Err(EvolveError::MismatchedGenomeLength { left: left.len(), right: right.len() });
    }
    let pivot = left.len() / 2;

    let splice = |head: &[Triangle], tail: &[Triangle]| {
        let mut triangles = Vec::with_capacity(left.len());
        triangles.extend_from_slice(head);
        triangles.extend_from_slice(tail);
        Genome::new(left.width, left.height, triangles)
    };

    let a = splice(&left.triangles[..pivot], &right.triangles[pivot..]);
    let b = splice(&right.triangles[..pivot], &left.triangles[pivot..]);
    Ok((a, b))
}

/// Returns a mutated copy; `genome` itself is untouched.
///
/// Every triangle independently rolls `u ~ U[0,1)` and mutates when
/// `u <= mutation_rate`. The kind of mutation comes from `odds`.
pub fn mutate<R: Rng>(genome: &Genome, mutation_rate: f64, odds: &MutationOdds, rng: &mut R) -> Genome {
    profiling::scope!("mutate");
    let mut out = genome.clone();
    let (width, height) = (out.width, out.height);

    for tri in &mut out.triangles {
        let roll: f64 = rng.random();
        if roll > mutation_rate {
            continue;
        }
        match odds.classify(rng.random_range(0..odds.span)) {
            MutationKind::Color => mutate_color(tri, rng),
            MutationKind::Points => mutate_point(tri, rng, width, height),
            MutationKind::Both => {
                mutate_color(tri, rng);
                mutate_point(tri, rng, width, height);
            }
        }
    }

    out
}

/// one uniformly chosen channel gets a fresh uniform value (may coincide with the old one)
pub fn mutate_color<R: Rng>(tri: &mut Triangle, rng: &mut R) {
    let channel = rng.random_range(0..4);
    tri.set_channel(channel, rng.random());
}

/// one uniformly chosen vertex jumps to a fresh point in `[0,width] x [0,height]`
pub fn mutate_point<R: Rng>(tri: &mut Triangle, rng: &mut R, width: u32, height: u32) {
    let vertex = rng.random_range(0..3);
    tri.set_point(vertex, random_point(rng, width, height));
}
