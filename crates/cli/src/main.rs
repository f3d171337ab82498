use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use textbook_chunker::{Pipeline, RawText};

mod input;
mod output;

#[derive(Parser)]
#[command(name = "textbook")]
#[command(about = "Recover a heading tree from a plain-text textbook and chunk it for retrieval", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write chunks, ToC and manifest
    Chunk(ChunkArgs),

    /// Print the recovered table of contents as JSON
    Toc(InputArgs),

    /// Print the run manifest as JSON
    Stats(InputArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Text parts, concatenated in the order given
    #[arg(required = true)]
    parts: Vec<PathBuf>,

    /// Pipeline config (JSON or TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ChunkArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory for chunks.jsonl, toc.json and manifest.json
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Chunk(args) => run_chunk(args),
        Commands::Toc(args) => run_toc(args),
        Commands::Stats(args) => run_stats(args),
    }
}

fn prepare(args: &InputArgs) -> Result<(Pipeline, RawText)> {
    let config = input::load_config(args.config.as_deref())?;
    let pipeline = Pipeline::new(config)?;
    let raw = input::load_parts(&args.parts)?;
    log::info!(
        "Loaded {} part(s), {} bytes",
        raw.parts().len(),
        raw.len()
    );
    Ok((pipeline, raw))
}

fn run_chunk(args: ChunkArgs) -> Result<()> {
    let (pipeline, raw) = prepare(&args.input)?;
    let result = pipeline.run(&raw);
    output::write_outputs(&args.out_dir, &result)?;
    log::info!(
        "Wrote {} chunks to {}",
        result.records.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn run_toc(args: InputArgs) -> Result<()> {
    let (pipeline, raw) = prepare(&args)?;
    output::print_json(&pipeline.toc(&raw))
}

fn run_stats(args: InputArgs) -> Result<()> {
    let (pipeline, raw) = prepare(&args)?;
    output::print_json(&pipeline.run(&raw).manifest)
}
