//! Global L2 distance on RGB (alpha is never part of the score).
//! Not normalized by pixel count: values grow with resolution, so only compare
//! candidates rendered at the same size. Lower is better, 0 is a pixel-exact match.

use image::{Rgb, RgbImage};
use rayon::prelude::*;

use crate::dna::Genome;
use crate::error::{EvolveError, Result};
use crate::population::Candidate;
use crate::render::CpuRenderer;

/// sqrt of the summed squared channel differences over every pixel.
/// rows are reduced in parallel; the sum is exact (integer) before the root.
pub fn l2_rgb_parallel(target: &RgbImage, current: &RgbImage) -> Result<f64> {
    profiling::scope!("l2_rgb_parallel");
    if target.dimensions() != current.dimensions() {
        return Err(EvolveError::DimensionMismatch {
            expected: target.dimensions(),
            actual: current.dimensions(),
        });
    }

    let row_bytes = target.width() as usize * 3;
    if row_bytes == 0 {
        return Ok(0.0);
    }

    let total: u64 = target
        .par_chunks(row_bytes)
        .zip(current.par_chunks(row_bytes))
        .map(|(t_row, c_row)| {
            t_row
                .iter()
                .zip(c_row)
                .map(|(&t, &c)| {
                    let d = t.abs_diff(c) as u64;
                    d * d
                })
                .sum::<u64>()
        })
        .sum();

    Ok((total as f64).sqrt())
}

/// the decoded image being approximated, plus the background candidates are painted on.
/// everything that turns a `Genome` into a scored `Candidate` goes through here.
#[derive(Clone, Debug)]
pub struct Target {
    image: RgbImage,
    background: Rgb<u8>,
}

impl Target {
    pub fn new(image: RgbImage, background: Rgb<u8>) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(EvolveError::EmptyTarget);
        }
        Ok(Self { image, background })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    #[inline]
    pub fn background(&self) -> Rgb<u8> {
        self.background
    }

    pub fn num_pixels(&self) -> usize {
        self.image.width() as usize * self.image.height() as usize
    }

    /// render a genome at the target's size over the target's background
    pub fn render(&self, genome: &Genome) -> Result<RgbImage> {
        let actual = (genome.width, genome.height);
        if actual != self.image.dimensions() {
            return Err(EvolveError::DimensionMismatch { expected: self.image.dimensions(), actual });
        }
        CpuRenderer::render(genome, self.background)
    }

    pub fn score(&self, genome: &Genome) -> Result<f64> {
        profiling::scope!("Target::score");
        let rendered = self.render(genome)?;
        l2_rgb_parallel(&self.image, &rendered)
    }

    /// render + score, producing a candidate whose cached fitness matches its triangles
    pub fn evaluate(&self, genome: Genome) -> Result<Candidate> {
        let fitness = self.score(&genome)?;
        Ok(Candidate::scored(genome, fitness))
    }

    pub fn metrics(&self, fitness: f64) -> MetricsSnapshot {
        MetricsSnapshot::from_l2(fitness, self.num_pixels(), 255.0)
    }
}

//─────────────────────────────────────────────────────────────────────────────
// resolution-invariant metrics (RMSE, PSNR) for progress logs
//─────────────────────────────────────────────────────────────────────────────

/// number of channels that take part in the fitness
pub const FITNESS_CHANNELS_F64: f64 = 3.0;

/// PSNR (peak signal-to-noise ratio) in decibels.
/// higher is better: ~30 dB acceptable, ~35 dB good, 40+ dB very good
#[inline]
pub fn psnr_from_mse(mse: f64, peak: f64) -> f64 {
    let mse = mse.max(1e-12);
    10.0 * ((peak * peak) / mse).log10()
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// root mean squared error per channel, 0..=255
    pub rmse: f64,
    pub psnr: f64,
}

impl MetricsSnapshot {
    /// the fitness is sqrt(SSE), so mse = fitness^2 / (pixels * 3)
    pub fn from_l2(fitness: f64, num_pixels: usize, peak: f64) -> Self {
        let samples = (num_pixels as f64 * FITNESS_CHANNELS_F64).max(1.0);
        let mse = fitness * fitness / samples;
        Self { rmse: mse.sqrt(), psnr: psnr_from_mse(mse, peak) }
    }
}
