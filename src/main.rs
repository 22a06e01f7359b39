use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uuid::Uuid;

use recon_lib::ingest::{load_records, stamp_upload, write_csv, ColumnMapping};
use recon_lib::utils::db_connect::WarehouseConfig;
use recon_lib::utils::env::load_env;
use recon_lib::utils::progress_bars::logging::{log_run_completion, log_run_phase, log_run_start};
use recon_lib::utils::progress_bars::progress_config::ProgressConfig;
use recon_lib::warehouse::WarehouseClient;
use recon_lib::{MatchingConfig, RecordSet, Resolver};

#[derive(Parser)]
#[command(author, version, about = "Reconcile DSO practice rosters against the customer registry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Match an uploaded roster against the registry
    Match(MatchArgs),
    /// List submitting organizations known to the warehouse
    Sources,
}

#[derive(Args)]
struct MatchArgs {
    /// Uploaded roster (.csv or .json)
    #[arg(long)]
    source: PathBuf,

    /// Organization that submitted the roster
    #[arg(long)]
    source_name: String,

    /// JSON object mapping uploaded headers to canonical column names
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// Registry extract (.csv or .json)
    #[arg(long, conflicts_with = "reference_from_warehouse", required_unless_present = "reference_from_warehouse")]
    reference: Option<PathBuf>,

    /// Load the registry from the warehouse instead of a file
    #[arg(long)]
    reference_from_warehouse: bool,

    /// Minimum number of agreeing fields (overrides MATCH_MIN_SCORE)
    #[arg(long)]
    min_score: Option<i32>,

    /// Where to write the matched CSV (defaults to <source>_matched.csv)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Insert the matched rows into dso_recon.matched_data
    #[arg(long)]
    upload: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();

    let cli = Cli::parse();
    match cli.command {
        Command::Match(args) => run_match(args).await,
        Command::Sources => run_sources().await,
    }
}

async fn run_sources() -> Result<()> {
    let client = WarehouseClient::connect(&WarehouseConfig::from_env())
        .await
        .context("Failed to connect to warehouse")?;
    let organizations = client.list_source_organizations().await?;
    info!("Found {} submitting organizations", organizations.len());
    for organization in organizations {
        println!("{}", organization);
    }
    Ok(())
}

async fn run_match(args: MatchArgs) -> Result<()> {
    let run_id = Uuid::new_v4().to_string();
    let file_name = args
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.source.display().to_string());
    log_run_start(&run_id, &args.source_name, &file_name);

    let mut config = MatchingConfig::from_env();
    if let Some(min_score) = args.min_score {
        config = config.with_min_score(min_score);
    }
    config.log_config();

    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );
    let multi_progress = progress_config.create_multi_progress();
    let main_pb = multi_progress.as_ref().map(|mp| {
        let pb = mp.add(ProgressBar::new(4));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        pb.set_message("Loading inputs...");
        pb
    });

    let warehouse_needed = args.reference_from_warehouse || args.upload;
    let warehouse = if warehouse_needed {
        let client = WarehouseClient::connect(&WarehouseConfig::from_env())
            .await
            .context("Failed to connect to warehouse")?;
        info!("Successfully connected to the warehouse");
        Some(client)
    } else {
        None
    };

    let mut phase_times: Vec<(&str, Duration)> = Vec::new();

    // Phase 1: inputs
    let phase_start = Instant::now();
    log_run_phase("Phase 1: Loading inputs", Some(&file_name));
    let upload = load_records(&args.source)?;
    let mapping = match &args.mapping {
        Some(path) => ColumnMapping::from_json_file(path)?,
        None => ColumnMapping::new(),
    };
    let source = mapping.apply(&upload, &args.source_name);
    let reference = load_reference(&args, warehouse.as_ref()).await?;
    phase_times.push(("Loading inputs", phase_start.elapsed()));
    advance(&main_pb, "Resolving records...");

    // Phase 2: resolution
    let phase_start = Instant::now();
    log_run_phase(
        "Phase 2: Resolving records",
        Some(&format!("{} source vs {} reference", source.len(), reference.len())),
    );
    let resolver = Resolver::new(config).with_progress(
        multi_progress
            .clone()
            .filter(|_| progress_config.should_show_detailed()),
    );
    let mut batch = tokio::task::spawn_blocking(move || resolver.resolve(&source, &reference))
        .await
        .context("Resolution task panicked")??;
    phase_times.push(("Resolving records", phase_start.elapsed()));
    advance(&main_pb, "Writing output...");

    // Phase 3: output
    let phase_start = Instant::now();
    stamp_upload(&mut batch.table, &file_name, Utc::now());
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.source));
    log_run_phase("Phase 3: Writing output", Some(&output.display().to_string()));
    write_csv(&batch.table, &output)?;
    phase_times.push(("Writing output", phase_start.elapsed()));
    advance(&main_pb, "Uploading...");

    // Phase 4: upload
    if let Some(client) = warehouse.as_ref().filter(|_| args.upload) {
        let phase_start = Instant::now();
        log_run_phase("Phase 4: Uploading matched rows", None);
        let inserted = client
            .insert_matched_rows(&batch.table)
            .await
            .context("Failed to upload matched rows")?;
        info!("Uploaded {} rows", inserted);
        phase_times.push(("Uploading matched rows", phase_start.elapsed()));
    } else {
        log_run_phase("Phase 4: Upload skipped", Some("--upload not set"));
    }
    advance(&main_pb, "Done");
    if let Some(pb) = &main_pb {
        pb.finish_with_message("Reconciliation complete");
    }

    log_run_completion(&phase_times, batch.len(), batch.matched_count());
    Ok(())
}

async fn load_reference(args: &MatchArgs, warehouse: Option<&WarehouseClient>) -> Result<RecordSet> {
    match (&args.reference, warehouse) {
        (Some(path), _) => load_records(path),
        (None, Some(client)) if args.reference_from_warehouse => client.fetch_reference_records().await,
        _ => bail!("No reference registry given; pass --reference or --reference-from-warehouse"),
    }
}

fn default_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "roster".to_string());
    source.with_file_name(format!("{}_matched.csv", stem))
}

fn advance(pb: &Option<ProgressBar>, message: &'static str) {
    if let Some(pb) = pb {
        pb.inc(1);
        pb.set_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/tmp/uploads/roster.csv")),
            PathBuf::from("/tmp/uploads/roster_matched.csv")
        );
    }

    #[test]
    fn test_match_requires_a_reference() {
        let parsed = Cli::try_parse_from(["dso_recon", "match", "--source", "a.csv", "--source-name", "Smile"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "dso_recon", "match", "--source", "a.csv", "--source-name", "Smile",
            "--reference", "r.csv", "--reference-from-warehouse",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "dso_recon", "match", "--source", "a.csv", "--source-name", "Smile",
            "--reference", "r.csv", "--min-score", "3",
        ]);
        assert!(parsed.is_ok());
    }
}
