//! Command line front end for the predator/prey simulation.

mod interactive;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use eco_core::{GeneratorConfig, Parameters, RunConfig, TieBreak};
use eco_world::{
    read_world, render_grid, render_stats, save_initial_world, save_world, Simulation,
    SimulationResult, World,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "ecosim")]
#[command(about = "Rabbits, foxes and rocks on a grid")]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a world file and write the final world
    Run(RunArgs),
    /// Write a random world file
    Generate(GenerateArgs),
    /// Print the default run configuration as JSON
    DumpDefaultConfig,
}

#[derive(Args)]
struct RunArgs {
    /// World file to read
    input: PathBuf,

    /// Where to write the final world
    output: PathBuf,

    /// Redraw every generation and accept keyboard commands
    #[arg(long)]
    interactive: bool,

    /// Run configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads, 0 for one per core, 1 for sequential
    #[arg(long)]
    workers: Option<usize>,

    /// Animals handed to a worker at a time
    #[arg(long)]
    partition_size: Option<usize>,

    /// How full ties are settled: scan or arrival
    #[arg(long)]
    tie_break: Option<TieBreak>,

    /// Write a JSON summary of the run
    #[arg(long)]
    summary_json: Option<PathBuf>,

    #[command(flatten)]
    parameters: ParameterArgs,
}

#[derive(Args)]
struct GenerateArgs {
    /// Where to write the world file
    output: PathBuf,

    #[arg(long)]
    rows: i32,

    #[arg(long)]
    cols: i32,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = GeneratorConfig::default().rock_density)]
    rock_density: f32,

    #[arg(long, default_value_t = GeneratorConfig::default().rabbit_density)]
    rabbit_density: f32,

    #[arg(long, default_value_t = GeneratorConfig::default().fox_density)]
    fox_density: f32,

    #[command(flatten)]
    parameters: ParameterArgs,
}

/// Life-cycle overrides shared by `run` and `generate`
#[derive(Args)]
struct ParameterArgs {
    #[arg(long)]
    rabbit_maturity: Option<u32>,

    #[arg(long)]
    fox_maturity: Option<u32>,

    #[arg(long)]
    fox_starvation: Option<u32>,

    #[arg(long)]
    generations: Option<u64>,
}

impl ParameterArgs {
    fn apply(&self, base: Parameters) -> Parameters {
        Parameters {
            rabbit_maturity_age: self.rabbit_maturity.unwrap_or(base.rabbit_maturity_age),
            fox_maturity_age: self.fox_maturity.unwrap_or(base.fox_maturity_age),
            fox_starvation_threshold: self
                .fox_starvation
                .unwrap_or(base.fox_starvation_threshold),
            generation_count: self.generations.unwrap_or(base.generation_count),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Interactive runs own the terminal; keep the log quiet unless asked
    let quiet = matches!(&cli.command, Commands::Run(args) if args.interactive);
    telemetry::init_telemetry(cli.log_json, quiet)?;

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Generate(args) => generate(args),
        Commands::DumpDefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&RunConfig::default())?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            RunConfig::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))
        }
        None => Ok(RunConfig::default()),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(workers) = args.workers {
        config.scheduler.workers = workers;
    }
    if let Some(partition_size) = args.partition_size {
        config.scheduler.partition_size = partition_size;
    }
    if let Some(tie_break) = args.tie_break {
        config.scheduler.tie_break = tie_break;
    }
    if args.interactive {
        config.progress_interval = 0;
    }

    let file = read_world(&args.input)
        .with_context(|| format!("failed to load world {}", args.input.display()))?;
    let params = args
        .parameters
        .apply(config.parameters.unwrap_or(file.parameters));

    info!(
        input = %args.input.display(),
        rabbit_maturity_age = params.rabbit_maturity_age,
        fox_maturity_age = params.fox_maturity_age,
        fox_starvation_threshold = params.fox_starvation_threshold,
        generations = params.generation_count,
        "World loaded"
    );

    let mut sim = Simulation::new(file.world, params, &config)?;

    let started = Instant::now();
    let result = if args.interactive {
        let mut pacer = interactive::TerminalPacer::new(&config.pacing)?;
        sim.run_with(&mut pacer)?
    } else {
        sim.run()?
    };
    let elapsed = started.elapsed();

    print!("{}", render_grid(sim.grid(), sim.generation()));
    print!(
        "{}",
        render_stats(sim.generation(), sim.rabbits().len(), sim.foxes().len())
    );

    save_world(&args.output, &params, &sim.snapshot())
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    if let Some(path) = &args.summary_json {
        write_summary(path, &result)?;
    }

    println!("Execution time: {:.6} seconds", elapsed.as_secs_f64());
    info!(
        output = %args.output.display(),
        generations = result.generations_run,
        cancelled = result.cancelled,
        elapsed_ms = elapsed.as_millis() as u64,
        "Run complete"
    );
    Ok(())
}

fn write_summary(path: &Path, result: &SimulationResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn generate(args: GenerateArgs) -> Result<()> {
    let config = GeneratorConfig {
        rows: args.rows,
        cols: args.cols,
        rock_density: args.rock_density,
        rabbit_density: args.rabbit_density,
        fox_density: args.fox_density,
        seed: args.seed,
    };
    let params = args.parameters.apply(Parameters::default());

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let world = World::generate(&config, &mut rng)?;

    save_initial_world(&args.output, &params, &world.snapshot(0))
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        rows = config.rows,
        cols = config.cols,
        rabbits = world.rabbits.len(),
        foxes = world.foxes.len(),
        rocks = world.rock_count(),
        seed = config.seed,
        "World generated"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_parse() {
        let cli = Cli::try_parse_from([
            "ecosim",
            "run",
            "in.txt",
            "out.txt",
            "--workers",
            "4",
            "--tie-break",
            "arrival",
            "--generations",
            "20",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.workers, Some(4));
                assert_eq!(args.tie_break, Some(TieBreak::ArrivalOrder));
                let params = args.parameters.apply(Parameters::default());
                assert_eq!(params.generation_count, 20);
                assert_eq!(params.rabbit_maturity_age, 2);
            }
            _ => panic!("expected the run subcommand"),
        }
    }

    #[test]
    fn test_generate_then_run_round_trip() {
        let dir = std::env::temp_dir().join(format!("ecosim-cli-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let world_path = dir.join("world.txt");
        let output_path = dir.join("final.txt");
        let summary_path = dir.join("summary.json");

        generate(GenerateArgs {
            output: world_path.clone(),
            rows: 6,
            cols: 7,
            seed: 3,
            rock_density: 0.1,
            rabbit_density: 0.3,
            fox_density: 0.1,
            parameters: ParameterArgs {
                rabbit_maturity: None,
                fox_maturity: None,
                fox_starvation: None,
                generations: Some(5),
            },
        })
        .unwrap();

        run(RunArgs {
            input: world_path,
            output: output_path.clone(),
            interactive: false,
            config: None,
            workers: Some(2),
            partition_size: Some(2),
            tie_break: None,
            summary_json: Some(summary_path.clone()),
            parameters: ParameterArgs {
                rabbit_maturity: None,
                fox_maturity: None,
                fox_starvation: None,
                generations: None,
            },
        })
        .unwrap();

        let written = read_world(&output_path).unwrap();
        assert_eq!(written.parameters.generation_count, 0);
        assert_eq!((written.world.grid.rows, written.world.grid.cols), (6, 7));

        let summary: SimulationResult =
            serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
        assert_eq!(summary.generations_run, 5);
        assert_eq!(summary.rabbits, written.world.rabbits.len());

        fs::remove_dir_all(&dir).ok();
    }
}
