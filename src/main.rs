use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use luxe_migrate::import::ImportConfig;
use luxe_migrate::{config, extract, import, restore};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "luxe-migrate")]
#[command(about = "Migrate the Luxe catalog between dump, JSON, and live-database form")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a PostgreSQL logical dump into the JSON catalog
    Extract(ExtractArgs),
    /// Regenerate an idempotent SQL upsert script from the catalog
    Restore(RestoreArgs),
    /// Load the catalog directly into a live PostgreSQL database
    Import(ImportArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Path to the logical dump file
    #[arg(short, long)]
    input: String,

    /// Path for the generated catalog
    #[arg(short, long, default_value = config::DEFAULT_CATALOG_PATH)]
    output: String,

    /// Limit number of product rows to process (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Dry run - don't write the catalog
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct RestoreArgs {
    /// Path to the catalog file
    #[arg(short, long, default_value = config::DEFAULT_CATALOG_PATH)]
    input: String,

    /// Path for the generated SQL script
    #[arg(short, long, default_value = config::DEFAULT_RESTORE_PATH)]
    output: String,
}

#[derive(Args)]
struct ImportArgs {
    /// Path to the catalog file
    #[arg(short, long, default_value = config::DEFAULT_CATALOG_PATH)]
    input: String,

    /// PostgreSQL connection string for the target database
    #[arg(long, default_value = config::DEFAULT_DB_URL)]
    db_url: String,

    /// Truncate the target catalog tables before importing
    #[arg(long)]
    clean: bool,
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    info!(input = %args.input, "Starting extraction pass");
    let start = Instant::now();
    let stats = extract::run_extraction(&args.input, &args.output, args.limit, args.dry_run)?;
    let duration = start.elapsed();

    println!();
    println!("=== Summary ===");
    println!("Extraction time:    {:.2}s", duration.as_secs_f64());
    println!();
    println!("Product rows:       {}", stats.product_rows);
    println!("Variant rows:       {}", stats.variant_rows);
    println!("Price rows:         {}", stats.price_rows);
    println!("Image rows:         {}", stats.image_rows);
    println!("Category rows:      {}", stats.category_rows);
    println!("Category joins:     {}", stats.category_join_rows);
    println!();
    println!("Products written:   {}", stats.products_written);
    println!("Products skipped:   {}", stats.products_skipped);
    for reason in stats.skip_samples() {
        println!("  skipped: {}", reason);
    }

    Ok(())
}

fn run_restore(args: RestoreArgs) -> Result<()> {
    info!(input = %args.input, "Generating restore script");
    let start = Instant::now();
    let summary = restore::run_restore(&args.input, &args.output)?;
    let duration = start.elapsed();

    println!();
    println!("=== Summary ===");
    println!("Generation time:    {:.2}s", duration.as_secs_f64());
    println!();
    println!("Products:           {}", summary.products);
    println!("Variants:           {}", summary.variants);
    println!("Prices:             {}", summary.prices);
    println!("Images:             {}", summary.images);
    println!("Statements:         {}", summary.statements);
    println!();
    println!("Script written to:  {}", args.output);

    Ok(())
}

fn run_import(args: ImportArgs) -> Result<()> {
    let config = ImportConfig {
        catalog_path: args.input,
        db_url: args.db_url,
        clean: args.clean,
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("luxe-import-worker")
        .enable_io()
        .enable_time()
        .build()?;
    rt.block_on(import::run_import(config))?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Restore(args) => run_restore(args),
        Commands::Import(args) => run_import(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
