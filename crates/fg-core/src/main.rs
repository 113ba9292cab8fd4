//! `fg`: command-line front end for factor graph inference.
//!
//! Results go to stdout as JSON; logs and error reports go to stderr.

use clap::{Args, Parser, Subcommand};
use fg_core::config::{self, ResolvedConfig};
use fg_core::exit_codes::ExitCode;
use fg_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use fg_core::{
    document, Assignment, ErrorReport, Model, OrderingHeuristic, Result, VarId, VariableElimination,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

/// Exact inference over discrete factor graphs
#[derive(Parser)]
#[command(name = "fg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Engine config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Log format on stderr (human, json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Posterior distribution of query variables given evidence
    Query(QueryArgs),
    /// Most probable assignment of all unobserved variables
    Mpe(MpeArgs),
    /// Validate a model document and summarise it
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct ModelArg {
    /// Model document (JSON)
    #[arg(long, short = 'm')]
    model: PathBuf,
}

#[derive(Args, Debug)]
struct EvidenceArg {
    /// Observed value, as var=value (repeatable)
    #[arg(long, short = 'e', value_name = "VAR=VALUE")]
    evidence: Vec<String>,
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[command(flatten)]
    model: ModelArg,

    /// Query variable (repeatable or comma separated)
    #[arg(long = "query", short = 'Q', required = true, value_delimiter = ',')]
    queries: Vec<String>,

    #[command(flatten)]
    evidence: EvidenceArg,

    /// Override the configured elimination ordering
    #[arg(long)]
    ordering: Option<OrderingHeuristic>,
}

#[derive(Args, Debug)]
struct MpeArgs {
    #[command(flatten)]
    model: ModelArg,

    #[command(flatten)]
    evidence: EvidenceArg,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    model: ModelArg,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    model: &'a str,
    nodes: usize,
    edges: usize,
    factors: usize,
    partition_function: f64,
    unnormalized_marginals: Vec<VarId>,
    config_source: String,
}

fn main() {
    let cli = Cli::parse();

    let level = LogLevel::default().adjusted(cli.global.verbose, cli.global.quiet);
    let cli_level = (cli.global.verbose > 0 || cli.global.quiet > 0).then_some(level);
    let log_config = LogConfig::from_env(cli_level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            let report = ErrorReport::from(&err);
            match serde_json::to_string_pretty(&report) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("error: {err}"),
            }
            ExitCode::from(&err)
        }
    };
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let resolved = config::load(cli.global.config.as_deref())?;
    match &cli.command {
        Commands::Query(args) => run_query(&resolved, args),
        Commands::Mpe(args) => run_mpe(&resolved, args),
        Commands::Check(args) => run_check(&resolved, args),
    }
}

fn load_model(arg: &ModelArg) -> Result<Model> {
    debug!(path = %arg.model.display(), "loading model");
    document::load_model(&arg.model)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_query(resolved: &ResolvedConfig, args: &QueryArgs) -> Result<ExitCode> {
    let model = load_model(&args.model)?;
    let evidence = model.parse_evidence(&args.evidence.evidence)?;
    let queries: BTreeSet<VarId> = args.queries.iter().map(|q| VarId::from(q.trim())).collect();

    let mut engine = VariableElimination::new(&model).with_config(resolved.config.clone());
    if let Some(ordering) = args.ordering {
        engine = engine.with_ordering(ordering);
    }
    let posterior = engine.posterior(&queries, &evidence)?;
    print_json(&posterior)?;
    Ok(ExitCode::Ok)
}

fn run_mpe(resolved: &ResolvedConfig, args: &MpeArgs) -> Result<ExitCode> {
    let model = load_model(&args.model)?;
    let evidence = model.parse_evidence(&args.evidence.evidence)?;
    let engine = VariableElimination::new(&model).with_config(resolved.config.clone());
    let mpe = engine.most_probable_explanation(&evidence)?;
    print_json(&mpe)?;
    Ok(ExitCode::Ok)
}

fn run_check(resolved: &ResolvedConfig, args: &CheckArgs) -> Result<ExitCode> {
    let model = load_model(&args.model)?;
    let engine = VariableElimination::new(&model).with_config(resolved.config.clone());
    let unnormalized = model.unnormalized_marginals(resolved.config.marginal_tolerance);
    let report = CheckReport {
        model: model.id(),
        nodes: model.nodes().count(),
        edges: model.edges().len(),
        factors: model.factors().len(),
        partition_function: engine.partition_function(&Assignment::new())?,
        unnormalized_marginals: unnormalized,
        config_source: resolved.source.to_string(),
    };
    print_json(&report)?;
    if report.unnormalized_marginals.is_empty() {
        Ok(ExitCode::Ok)
    } else {
        Ok(ExitCode::Warnings)
    }
}
