use anyhow::{Context, Result};
use clap::Parser;
use desglose::cli::{AllocsCommand, Cli, Command, OutputFormat, ParseArgs};
use desglose::{csv_output, dump, json_output, pretty_output, query};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Memory-map the dump file; the decoder wants the whole buffer up front.
fn map_dump(path: &Path) -> Result<memmap2::Mmap> {
    if !path.exists() {
        anyhow::bail!("Dump file does not exist: {}", path.display());
    }

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open dump: {}", path.display()))?;

    let mmap =
        unsafe { memmap2::Mmap::map(&file) }.context("Failed to memory-map dump file")?;

    Ok(mmap)
}

/// Decode, query, render: the `allocs parse` command.
fn run_parse(args: &ParseArgs) -> Result<()> {
    // Every spec is parsed before the dump is opened, so operator typos
    // fail fast.
    let params = args.query_params()?;

    let mmap = map_dump(&args.file)?;
    let records = dump::decode(&mmap)
        .with_context(|| format!("Failed to decode dump: {}", args.file.display()))?;
    tracing::debug!("decoded {} records from {}", records.len(), args.file.display());

    let output = query::run_query(records, &params)?;

    let rendered = match args.format {
        OutputFormat::Pretty => pretty_output::render(&output),
        OutputFormat::Csv => csv_output::render(&output),
        OutputFormat::Json => json_output::JsonOutput::from_query(&output).to_json()?,
    };
    print!("{}", rendered);

    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    match &args.command {
        Command::Allocs { action } => match action {
            AllocsCommand::Parse(parse_args) => run_parse(parse_args)?,
        },
    }

    Ok(())
}
