use clap::Parser;
use colored::*;
use polars::prelude::{col, lit};
use sh95_processor::cli::{Cli, Command, IngestArgs, InitArgs, QueryArgs};
use sh95_processor::{DatabaseWriter, DatasetProcessor, Result, Sh95Error, TableQuery};
use std::process;
use tracing::debug;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = run(cli.command) => result,
            Ok(()) = tokio::signal::ctrl_c() => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(Sh95Error::Interrupted)
            }
        }
    });

    if let Err(error) = result {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sh95_processor={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Ingest(args) => ingest(args).await,
        Command::Init(args) => init(args),
        Command::Remove(args) => {
            let config = args.to_config();
            config.validate()?;
            let writer = DatabaseWriter::new(config);
            writer.remove()?;
            println!(
                "{} {}",
                "Removed".bright_green(),
                writer.database_path().display()
            );
            Ok(())
        }
        Command::Query(args) => query(args).await,
    }
}

async fn ingest(args: IngestArgs) -> Result<()> {
    let config = args.to_config();
    let processor = DatasetProcessor::new(args.data_dir, config)?;
    processor.process().await?;
    Ok(())
}

fn init(args: InitArgs) -> Result<()> {
    let config = args.database.to_config();
    config.validate()?;
    let writer = DatabaseWriter::new(config);
    writer.initialise(args.replace)?;
    println!(
        "{} {}",
        "Initialised".bright_green(),
        writer.database_path().display()
    );
    Ok(())
}

async fn query(args: QueryArgs) -> Result<()> {
    let config = args.database.to_config();
    let mut query = TableQuery::new(config.database_path())
        .from(args.kind)
        .select(args.columns)
        .limit(args.limit);

    if let Some(rec_case) = args.rec_case {
        query = query.filter(col("rec_case").eq(lit(rec_case.letter().to_string())));
    }
    for (column, value) in [("z", args.z), ("n_u", args.n_u), ("n_l", args.n_l)] {
        if let Some(value) = value {
            query = query.filter(col(column).eq(lit(i64::from(value))));
        }
    }
    if let Some(column) = args.order_by {
        query = query.order_by(column, args.descending);
    }

    let df = query.collect_async().await?;
    println!("{}", df);
    Ok(())
}
