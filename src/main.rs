use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rto_verifier::config::Config;
use rto_verifier::document_store::DocumentStore;
use rto_verifier::pipeline;

/// Preview length for `extract`.
const PREVIEW_CHARS: usize = 2000;

#[derive(Parser)]
#[command(name = "rto-verify")]
#[command(about = "Verify vehicle registration documents against a master sheet")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(
        long,
        global = true,
        env = "RTO_VERIFIER_CONFIG",
        default_value = ".config/rto_verifier.toml"
    )]
    config: PathBuf,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a master sheet against a folder of documents
    Verify {
        /// Master sheet (.csv, .xlsx, .xls, .ods)
        #[arg(long, short)]
        master: PathBuf,

        /// Folder of .pdf / .txt documents
        #[arg(long, short)]
        documents: PathBuf,

        /// Report file (.csv, .json or .xlsx); JSON on stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show the text and fields extracted from one document
    Extract { file: PathBuf },
    /// Show document cache statistics
    CacheStats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // init tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let cfg = Config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Verify {
            master,
            documents,
            output,
        } => {
            let outcome = pipeline::run(&cfg, &master, &documents, output.as_deref()).await?;

            if output.is_none() {
                println!("{}", serde_json::to_string_pretty(&outcome.rows)?);
            }
            for note in &outcome.notes {
                eprintln!("⚠ {}: {}", note.file.display(), note.reason);
            }
            let s = outcome.summary;
            eprintln!(
                "{} records: {} approve, {} hold, {} reject, {} ineligible",
                s.total(),
                s.approve,
                s.hold,
                s.reject,
                s.ineligible
            );
        }
        Commands::Extract { file } => {
            info!(file = %file.display(), "Testing single document");
            let (acquired, document) = pipeline::extract_single(&file, &cfg).await?;

            match &acquired.note {
                None => {
                    let preview: String = acquired.text.chars().take(PREVIEW_CHARS).collect();
                    println!("\n--- Extracted Text ({}) ---", acquired.kind.as_str());
                    println!("{preview}");
                    println!("--- End ---\n");
                }
                Some(note) => println!("\n✗ No text ({}): {note}\n", acquired.kind.as_str()),
            }

            let (filled, total) = document.coverage();
            println!("--- Heuristic Extraction ---");
            println!("{}", serde_json::to_string_pretty(&document)?);
            println!("--- End Heuristics ({filled}/{total} fields) ---");
        }
        Commands::CacheStats => {
            let store = DocumentStore::new(&cfg.db_path)?;
            let counts = store.get_counts()?;
            info!(
                total = counts.total,
                text = counts.text,
                ocr = counts.ocr,
                scanned = counts.scanned,
                error = counts.error,
                "Document cache statistics"
            );
            println!(
                "{} cached documents: {} text, {} ocr, {} scanned, {} error",
                counts.total, counts.text, counts.ocr, counts.scanned, counts.error
            );
        }
    }

    Ok(())
}
