//! Approximate an image with a fixed number of semi-transparent triangles,
//! evolved by selection, single-point crossover, mutation and replacement.
//!
//! The library is pure: it takes a decoded RGB target and hands back scored
//! candidates and rendered pixel buffers. Decoding, encoding and file naming
//! live in the binary.

pub mod dna;
pub mod engine;
pub mod error;
pub mod fitness;
pub mod geom;
pub mod mutate;
pub mod mutation_config;
pub mod population;
pub mod render;
pub mod settings;

pub use dna::{Genome, Point, Triangle};
pub use engine::{Checkpoint, Engine, EngineInit, RunSummary};
pub use error::{EvolveError, Result, TriangleError};
pub use fitness::{l2_rgb_parallel, MetricsSnapshot, Target};
pub use mutate::{crossover, mutate};
pub use mutation_config::{MutateConfig, MutationOdds};
pub use population::{Candidate, GenerationReport, Population};
pub use render::CpuRenderer;
pub use settings::RunSettings;
