use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chequera_core::{Column, ConfidenceTier};
use chequera_ocr::{
    intake, CheckPipeline, DocumentOutcome, Gazetteer, ResponseCache, SidecarRecognizer,
    TemplateRegistry,
};
use chequera_storage::{DbPool, LedgerEntry};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "chequera")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reads scanned bank checks into a ledger with per-field confidence", long_about = None)]
struct Cli {
    /// Configuration file (defaults to config.toml in the platform config directory)
    #[arg(long, global = true, env = "CHEQUERA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every PDF waiting in the unprocessed folder
    Process,
    /// Process the folder, then keep processing PDFs as they arrive
    Watch,
    /// Print stored checks with their confidence tiers
    Ledger {
        /// Drop confidence rows whose check was removed first
        #[arg(long)]
        prune: bool,
    },
    /// Print the active bank templates
    Templates,
}

/// Everything a document run needs, opened once per invocation.
struct AppState {
    config: Config,
    db: DbPool,
    pipeline: CheckPipeline<SidecarRecognizer>,
}

impl AppState {
    async fn open(config: Config) -> anyhow::Result<Self> {
        for dir in [&config.unprocessed_dir, &config.processed_dir, &config.cache_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }

        let db = open_db(&config).await?;
        let gazetteer = Gazetteer::load_or_create(&config.gazetteer)?;
        if gazetteer.is_empty() {
            tracing::warn!("Gazetteer {} is empty; no city will be verified", config.gazetteer.display());
        }
        let registry = config.load_registry()?;

        let pipeline = CheckPipeline::new(SidecarRecognizer, registry, Arc::new(gazetteer))
            .with_strategy(config.detection)
            .with_cache(ResponseCache::new(&config.cache_dir));

        Ok(Self { config, db, pipeline })
    }
}

async fn open_db(config: &Config) -> anyhow::Result<DbPool> {
    if let Some(parent) = config.database.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    chequera_storage::create_db(&config.database)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.display()))
}

/// What happened to one document in the intake folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Stored,
    AlreadyProcessed,
    Skipped,
}

async fn process_document(state: &AppState, path: &Path) -> anyhow::Result<Disposition> {
    let id = intake::document_id(path)
        .with_context(|| format!("No document id in {}", path.display()))?;

    if chequera_storage::is_processed(&state.db, &id).await? {
        intake::move_processed(path, &state.config.processed_dir, &id).await?;
        tracing::info!(document = %id, "Already in ledger, moved");
        return Ok(Disposition::AlreadyProcessed);
    }

    let outcome = tokio::time::timeout(state.config.document_timeout(), state.pipeline.process_file(path))
        .await
        .with_context(|| format!("Timed out processing {}", path.display()))??;

    match outcome {
        DocumentOutcome::Processed(check) => {
            chequera_storage::insert_check(&state.db, &check.row, &check.confidence)
                .await
                .with_context(|| format!("Failed to store check {id}"))?;
            let dest = intake::move_processed(path, &state.config.processed_dir, &id).await?;
            tracing::info!(document = %id, bank = %check.bank_code, "Stored, moved to {}", dest.display());
            Ok(Disposition::Stored)
        }
        DocumentOutcome::Skipped => Ok(Disposition::Skipped),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct BatchSummary {
    stored: usize,
    already_processed: usize,
    skipped: usize,
    failed: usize,
}

impl BatchSummary {
    fn record(&mut self, result: &anyhow::Result<Disposition>) {
        match result {
            Ok(Disposition::Stored) => self.stored += 1,
            Ok(Disposition::AlreadyProcessed) => self.already_processed += 1,
            Ok(Disposition::Skipped) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

async fn process_folder(state: &AppState) -> anyhow::Result<BatchSummary> {
    let pending = intake::list_pending(&state.config.unprocessed_dir)
        .await
        .with_context(|| format!("Failed to list {}", state.config.unprocessed_dir.display()))?;

    let mut summary = BatchSummary::default();
    for path in pending {
        let result = process_document(state, &path).await;
        if let Err(e) = &result {
            tracing::warn!("Failed to process {}: {e:#}", path.display());
        }
        summary.record(&result);
    }

    tracing::info!(
        stored = summary.stored,
        already_processed = summary.already_processed,
        skipped = summary.skipped,
        failed = summary.failed,
        "Batch complete"
    );
    Ok(summary)
}

async fn watch_folder(state: &AppState) -> anyhow::Result<()> {
    process_folder(state).await?;

    // The channel bridges the notify watcher thread and the async processor.
    let (tx, mut rx) = mpsc::channel::<PathBuf>(64);
    let _watcher = intake::spawn_intake_watcher(&state.config.unprocessed_dir, tx)
        .context("Failed to start intake folder watcher")?;
    tracing::info!("Watching intake folder: {}", state.config.unprocessed_dir.display());

    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(path) = received else { break };
                if let Err(e) = process_document(state, &path).await {
                    tracing::warn!("Failed to process {}: {e:#}", path.display());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping watcher");
                break;
            }
        }
    }
    Ok(())
}

fn format_entry(entry: &LedgerEntry) -> String {
    Column::ALL
        .iter()
        .map(|&column| {
            let value = entry.row.cell(column);
            match entry.confidence.get(column) {
                Some(confidence) => format!("{value} [{}]", ConfidenceTier::of(confidence)),
                None => value,
            }
        })
        .collect::<Vec<_>>()
        .join("\t")
}

fn print_ledger(entries: &[LedgerEntry]) {
    let header: Vec<_> = Column::ALL.iter().map(|c| c.header()).collect();
    println!("{}", header.join("\t"));
    for entry in entries {
        println!("{}", format_entry(entry));
    }
}

fn print_templates(registry: &TemplateRegistry) {
    for template in registry.templates() {
        println!(
            "{} ({}) account name lines: {}",
            template.code, template.display_name, template.account_name_lines
        );
        for kind in chequera_core::FieldKind::ALL {
            let b = template.boxes.get(kind);
            println!(
                "  {:<16} width={:.2} height={:.2} left={:.2} top={:.2}",
                kind.as_str(),
                b.width,
                b.height,
                b.left,
                b.top
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Templates => print_templates(&*config.load_registry()?),
        Commands::Ledger { prune } => {
            let db = open_db(&config).await?;
            if prune {
                let removed = chequera_storage::prune_orphan_confidences(&db).await?;
                tracing::info!("Pruned {removed} orphan confidence rows");
            }
            print_ledger(&chequera_storage::get_all_checks(&db).await?);
        }
        Commands::Process => {
            let state = AppState::open(config).await?;
            process_folder(&state).await?;
        }
        Commands::Watch => {
            let state = AppState::open(config).await?;
            watch_folder(&state).await?;
        }
    }
    Ok(())
}
