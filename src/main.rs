use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sample_catalog::cancel::CancelToken;
use sample_catalog::completeness::{check_metadata, CompletenessReport};
use sample_catalog::discovery::discover_wav_files;
use sample_catalog::persist::{load_catalog, save_catalog};
use sample_catalog::progress::{create_spinner, format_duration, set_log_only, Phase};
use sample_catalog::query::{
    find_patterns_in_filenames, read_filename_list, write_filename_list, FilenamePattern,
    MatchAllPolicy, QueryOptions,
};
use sample_catalog::safety::validate_output_path;
use sample_catalog::thumbnail::{generate_thumbnails, ThumbnailRecipe};
use sample_catalog::validate::validate_into_catalog;
use sample_catalog::Catalog;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sample-catalog")]
#[command(about = "Catalog a WAV sample library, track analysis artifacts, query by filename and render spectrogram thumbnails")]
struct Cli {
    /// Catalog table (CSV) read and written by every command
    #[arg(long, global = true, env = "SAMPLE_CATALOG_FILE", default_value = "sample_catalog.csv")]
    catalog: PathBuf,

    /// Worker threads (0 = one per core)
    #[arg(long, global = true, default_value = "0")]
    workers: usize,

    /// Hide progress bars and log progress lines instead
    #[arg(long, global = true)]
    log_only: bool,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover and validate every .wav under a root, check metadata, save the catalog
    Scan(ScanArgs),

    /// Re-run the metadata completeness check on the saved catalog
    CheckMetadata,

    /// Select catalog filenames by case-insensitive regex
    Query(QueryArgs),

    /// Render spectrogram thumbnails next to the audio files
    Thumbnails(ThumbnailArgs),
}

#[derive(Parser, Debug)]
struct ScanArgs {
    /// Library root directory
    #[arg(env = "SAMPLE_CATALOG_ROOT")]
    root: PathBuf,

    /// Skip the metadata completeness pass
    #[arg(long)]
    no_metadata: bool,

    /// Write a JSON run summary here
    #[arg(long)]
    stats_json: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
struct SelectionArgs {
    /// Only keep entries whose three analysis artifacts were all found
    #[arg(long)]
    metadata_required: bool,

    /// Make an empty pattern honor --metadata-required too
    #[arg(long)]
    strict_match_all: bool,

    /// Keep only the first N results
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Parser, Debug)]
struct QueryArgs {
    /// Regex searched in each full filename; empty matches everything
    #[arg(default_value = "")]
    pattern: String,

    /// Write the result as a single-column Filename CSV
    #[arg(long)]
    export: Option<PathBuf>,

    #[command(flatten)]
    select: SelectionArgs,
}

#[derive(Parser, Debug)]
struct ThumbnailArgs {
    /// Take files from a Filename CSV (e.g. a query export) instead of the catalog
    #[arg(long, conflicts_with = "pattern")]
    list: Option<PathBuf>,

    /// Regex filter over the catalog
    #[arg(long)]
    pattern: Option<String>,

    #[command(flatten)]
    select: SelectionArgs,
}

#[derive(Serialize)]
struct RejectedFile {
    path: PathBuf,
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ScanStats {
    root: PathBuf,
    discovered: usize,
    valid: usize,
    rejected: Vec<RejectedFile>,
    metadata_checked: bool,
    complete: usize,
    missing_artifacts: usize,
    elapsed_secs: f64,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    set_log_only(cli.log_only);

    if cli.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    match cli.cmd {
        Command::Scan(ref args) => cmd_scan(&cli, args),
        Command::CheckMetadata => cmd_check_metadata(&cli),
        Command::Query(ref args) => cmd_query(&cli, args),
        Command::Thumbnails(ref args) => cmd_thumbnails(&cli, args),
    }
}

fn print_banner(title: &str, lines: &[String], start: Instant) {
    println!("\n{:=<60}", "");
    println!("{}", title);
    for line in lines {
        println!("  {}", line);
    }
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");
}

fn run_metadata_pass(catalog: &mut Catalog) -> CompletenessReport {
    let report = check_metadata(catalog, None);
    info!(
        "Metadata: {} of {} files complete, {} artifacts missing",
        report.complete_count(),
        report.files.len(),
        report.missing.len()
    );
    report
}

fn cmd_scan(cli: &Cli, args: &ScanArgs) -> Result<()> {
    let start = Instant::now();
    validate_output_path(&cli.catalog, &[])?;

    let spinner = create_spinner(Phase::Discovery);
    let discovered = discover_wav_files(&args.root);
    spinner.finish_with_message(format!("Discovered {} .wav files", discovered.len()));

    let (mut catalog, validation) = validate_into_catalog(&discovered);

    let completeness = if args.no_metadata {
        None
    } else {
        Some(run_metadata_pass(&mut catalog))
    };

    save_catalog(&catalog, &cli.catalog)?;

    let complete = catalog.complete_count();
    let missing_artifacts = completeness.as_ref().map_or(0, |r| r.missing.len());

    if let Some(path) = &args.stats_json {
        validate_output_path(path, &[&cli.catalog])?;
        let stats = ScanStats {
            root: args.root.clone(),
            discovered: discovered.len(),
            valid: validation.valid.len(),
            rejected: validation
                .rejected
                .iter()
                .map(|(p, e)| RejectedFile {
                    path: p.clone(),
                    code: e.code(),
                    message: e.to_string(),
                })
                .collect(),
            metadata_checked: completeness.is_some(),
            complete,
            missing_artifacts,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        let json = serde_json::to_string_pretty(&stats)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    print_banner(
        "Scan complete!",
        &[
            format!("Discovered: {}", discovered.len()),
            format!("Valid: {}", validation.valid.len()),
            format!("Rejected: {}", validation.rejected.len()),
            format!("Metadata complete: {}", complete),
            format!("Catalog: {}", cli.catalog.display()),
        ],
        start,
    );
    Ok(())
}

fn cmd_check_metadata(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let mut catalog = load_catalog(&cli.catalog)?;
    let report = run_metadata_pass(&mut catalog);
    save_catalog(&catalog, &cli.catalog)?;

    print_banner(
        "Metadata check complete!",
        &[
            format!("Files: {}", report.files.len()),
            format!("Complete: {}", report.complete_count()),
            format!("Missing artifacts: {}", report.missing.len()),
        ],
        start,
    );
    Ok(())
}

fn query_options(select: &SelectionArgs) -> QueryOptions {
    QueryOptions {
        metadata_is_necessary: select.metadata_required,
        match_all: if select.strict_match_all {
            MatchAllPolicy::HonorMetadata
        } else {
            MatchAllPolicy::BypassMetadata
        },
    }
}

fn select(catalog: &Catalog, pattern: &str, args: &SelectionArgs) -> Result<Vec<PathBuf>> {
    let pattern = FilenamePattern::parse(pattern)?;
    let mut files = find_patterns_in_filenames(catalog, &pattern, query_options(args));
    if let Some(n) = args.limit {
        files.truncate(n);
    }
    Ok(files)
}

fn cmd_query(cli: &Cli, args: &QueryArgs) -> Result<()> {
    let catalog = load_catalog(&cli.catalog)?;
    let files = select(&catalog, &args.pattern, &args.select)?;

    match &args.export {
        Some(out) => {
            validate_output_path(out, &[&cli.catalog])?;
            write_filename_list(out, &files)?;
            info!("Exported {} filenames to {}", files.len(), out.display());
        }
        None => {
            for f in &files {
                println!("{}", f.display());
            }
        }
    }
    info!("{} of {} catalog entries matched", files.len(), catalog.len());
    Ok(())
}

fn thumbnail_sources(cli: &Cli, args: &ThumbnailArgs) -> Result<Vec<PathBuf>> {
    if let Some(list) = &args.list {
        let mut files = read_filename_list(list)?;
        if let Some(n) = args.select.limit {
            files.truncate(n);
        }
        return Ok(files);
    }
    let catalog = load_catalog(&cli.catalog)?;
    select(&catalog, args.pattern.as_deref().unwrap_or(""), &args.select)
}

fn cmd_thumbnails(cli: &Cli, args: &ThumbnailArgs) -> Result<()> {
    let start = Instant::now();
    let files = thumbnail_sources(cli, args)?;
    info!("Rendering thumbnails for {} files", files.len());

    let report = generate_thumbnails(&files, &ThumbnailRecipe::default(), cli.workers, &CancelToken::new());

    print_banner(
        "Thumbnails complete!",
        &[
            format!("Requested: {}", files.len()),
            format!("Written: {}", report.written.len()),
            format!("Skipped: {}", report.skipped.len()),
        ],
        start,
    );
    Ok(())
}
