use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use bdc_network::models::network::{NetworkModel, PunctualityForm};
use bdc_network::oracle;
use bdc_network::pareto::{ParetoTracer, TracerConfig};
use bdc_network::problem::{Problem, ProblemData};

#[derive(Parser)]
#[clap(author, version, about = "Blood supply network design and its cost/punctuality tradeoff")]
struct Cli {
    /// Raise the log level (-v debug, -vv trace). RUST_LOG takes precedence.
    #[clap(short, long, global = true, parse(from_occurrences))]
    verbose: usize,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trace the Pareto front between network cost and punctuality
    Trace(TraceArgs),
    /// Write the model of an instance in LP format
    Export(ExportArgs),
    /// Write a random valid instance
    Generate(GenerateArgs),
}

#[derive(Args)]
struct TraceArgs {
    /// Instance file (JSON)
    #[clap(parse(from_os_str))]
    instance: PathBuf,
    /// Tracer configuration file (JSON)
    #[clap(long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Number of bound values per sweep, overrides the configuration file
    #[clap(long)]
    grid_points: Option<usize>,
    /// Time limit per solve in seconds, overrides the configuration file
    #[clap(long)]
    time_limit: Option<f64>,
    #[clap(long, default_value = "microlp")]
    solver: String,
    #[clap(long, default_value = "indexed")]
    punctuality: PunctualityForm,
    /// Report file, printed to stdout when absent
    #[clap(long, parse(from_os_str))]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct ExportArgs {
    #[clap(parse(from_os_str))]
    instance: PathBuf,
    #[clap(long, default_value = "indexed")]
    punctuality: PunctualityForm,
    #[clap(long, parse(from_os_str))]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct GenerateArgs {
    #[clap(long)]
    hospitals: usize,
    #[clap(long)]
    bdcs: usize,
    #[clap(long)]
    seed: Option<u64>,
    #[clap(long, parse(from_os_str))]
    out: Option<PathBuf>,
}

fn read_problem(path: &Path) -> Result<Problem, Box<dyn Error>> {
    let reader = BufReader::new(File::open(path)?);
    let problem: Problem = serde_json::from_reader(reader)?;
    info!(
        "Loaded {} with {} hospitals and {} BDCs",
        path.display(),
        problem.hospitals().len(),
        problem.bdcs().len()
    );
    Ok(problem)
}

fn output(path: &Option<PathBuf>) -> Result<Box<dyn Write>, Box<dyn Error>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    })
}

fn trace(args: TraceArgs) -> Result<(), Box<dyn Error>> {
    let mut config: TracerConfig = match &args.config {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => TracerConfig::default(),
    };
    if let Some(n) = args.grid_points {
        config.grid_points = n;
    }
    if let Some(limit) = args.time_limit {
        config.options.time_limit = Some(limit);
    }

    let data: ProblemData = serde_json::from_reader(BufReader::new(File::open(&args.instance)?))?;
    info!(
        "Loaded {} with {} hospitals and {} BDCs",
        args.instance.display(),
        data.hospitals.len(),
        data.bdcs.len()
    );
    let mut oracle = oracle::from_name(&args.solver, config.options.clone())
        .map_err(|e| format!("{} (available: {})", e, oracle::available().join(", ")))?;

    let tracer = ParetoTracer::network(data, args.punctuality, config)?;
    let report = tracer.run(oracle.as_mut())?;
    info!(
        "Found {} distinct tradeoff points in run {}",
        report.pareto.len(),
        report.run_id
    );

    let mut out = output(&args.out)?;
    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;
    Ok(())
}

fn export(args: ExportArgs) -> Result<(), Box<dyn Error>> {
    let problem = read_problem(&args.instance)?;
    let network = NetworkModel::create_instance(&problem, args.punctuality);
    let mut out = output(&args.out)?;
    network.model.write_lp(&mut out)?;
    out.flush()?;
    Ok(())
}

fn generate(args: GenerateArgs) -> Result<(), Box<dyn Error>> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let problem = Problem::random(args.hospitals, args.bdcs, &mut rng)?;
    let mut out = output(&args.out)?;
    serde_json::to_writer_pretty(&mut out, &problem)?;
    writeln!(out)?;
    Ok(())
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Command::Trace(args) => trace(args),
        Command::Export(args) => export(args),
        Command::Generate(args) => generate(args),
    }
}
