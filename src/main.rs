use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use image::Rgb;
use log::{error, info};
use rand::Rng;

use trimimic::{Checkpoint, CpuRenderer, Engine, Result, RunSettings, Target};

/// Evolve a set of semi-transparent triangles that looks like IMAGE.
#[derive(Parser, Debug)]
#[command(name = "trimimic", version, about)]
struct Cli {
    /// image to approximate
    image: PathBuf,
    /// triangles per candidate
    num_triangles: usize,
    /// candidates in the population
    population_size: usize,
    /// fraction of the population bred each generation (0..=1)
    crossover_rate: f64,
    /// per-triangle mutation chance for children (0..=1)
    mutation_rate: f64,
    /// number of generations to run
    generations: u64,

    /// JSON settings used as a base (background, seed, mutation odds, ...)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// RNG seed; a random one is drawn and logged when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// background color as r,g,b
    #[arg(long, value_parser = parse_rgb)]
    background: Option<[u8; 3]>,
    /// where checkpoint images go (default: next to IMAGE)
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// also write the best genome as JSON at every checkpoint
    #[arg(long)]
    save_genome: bool,
}

fn parse_rgb(s: &str) -> std::result::Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected r,g,b, got '{s}'"));
    }
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|e| format!("bad channel '{part}': {e}"))?;
    }
    Ok(rgb)
}

impl Cli {
    /// settings file (if any) with command-line values on top
    fn to_settings(&self) -> RunSettings {
        let mut settings = match &self.settings {
            Some(path) => RunSettings::load(path),
            None => RunSettings::default(),
        };
        settings.num_triangles = self.num_triangles;
        settings.population_size = self.population_size;
        settings.crossover_rate = self.crossover_rate;
        settings.mutation_rate = self.mutation_rate;
        settings.generations = self.generations;
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if let Some(bg) = self.background {
            settings.background = bg;
        }
        settings.save_genome |= self.save_genome;
        settings
    }
}

/// `gen-{generation}_{file name}` inside `out_dir`
fn checkpoint_path(out_dir: &Path, image: &Path, generation: u64) -> PathBuf {
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out.png".to_owned());
    out_dir.join(format!("gen-{generation}_{name}"))
}

fn write_checkpoint(cp: &Checkpoint<'_>, background: Rgb<u8>, out_dir: &Path, image: &Path, save_genome: bool) -> Result<()> {
    let path = checkpoint_path(out_dir, image, cp.generation);
    let pixels = CpuRenderer::render(cp.best.genome(), background)?;
    pixels.save(&path)?;
    info!("wrote {}", path.display());

    if save_genome {
        let json_path = path.with_extension("json");
        std::fs::write(&json_path, serde_json::to_string_pretty(cp.best.genome())?)?;
        info!("wrote {}", json_path.display());
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let settings = cli.to_settings();
    settings.validate()?;

    info!("loading {}", cli.image.display());
    let pixels = image::open(&cli.image)?.to_rgb8();
    info!("target is {}x{}", pixels.width(), pixels.height());
    let target = Target::new(pixels, Rgb(settings.background))?;

    let seed = settings.seed.unwrap_or_else(|| rand::rng().random());
    info!("seed {seed} (pass --seed {seed} to repeat this run)");

    let out_dir = match &cli.out_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => cli.image.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let background = target.background();
    let mut engine = Engine::new(target, settings.to_engine_init(seed))?;
    let summary = engine.run(|cp| write_checkpoint(&cp, background, &out_dir, &cli.image, settings.save_genome))?;

    info!(
        "done: {} generations, best fitness {:.2} -> {:.2}, {} checkpoints",
        summary.generations, summary.initial_best, summary.final_best, summary.checkpoints
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // configure Rayon's global thread pool once at startup so worker threads get nice names like "rayon-0".
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        process::exit(1);
    }
}
