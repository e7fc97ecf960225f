use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chain_ingest::{
    BatchWriter, Concurrency, HttpRpcClient, IndexLayout, IngestConfig, ParquetSink,
    ProgressReporter, RangeCoordinator, RetryingFetcher, RpcClient, progress_channel,
};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "chain-index")]
#[command(about = "Index blocks, transactions and messages into parquet segments")]
#[command(version)]
struct Args {
    /// First block to index. Defaults to the block after the last indexed one.
    #[arg(short, long)]
    start: Option<u64>,

    /// Last block to index. Defaults to the chain height minus one.
    #[arg(short, long)]
    end: Option<u64>,

    /// Concurrent chunk workers. Defaults to the core count minus four.
    #[arg(short = 'j', long)]
    n_cores: Option<usize>,

    /// Node RPC base url.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Directory the index is written to.
    #[arg(short = 'd', long, default_value = "./index")]
    index_dir: PathBuf,

    /// Blocks per segment file.
    #[arg(short, long, default_value_t = 250)]
    batch_size: u64,

    /// Retry budget for each block header and each block's transactions.
    #[arg(long, default_value_t = 100)]
    retries: i64,
}

impl Args {
    fn config(&self) -> IngestConfig {
        IngestConfig {
            rpc_url: self.url.clone(),
            batch_size: self.batch_size,
            concurrency: self.n_cores.map_or(Concurrency::Auto, Concurrency::Value),
            retries: self.retries,
            ..IngestConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config();
    config.validate().context("invalid arguments")?;

    let layout = IndexLayout::new(&args.index_dir);
    layout
        .ensure_dirs()
        .with_context(|| format!("prepare index dir {}", args.index_dir.display()))?;
    let start = match args.start {
        Some(start) => start,
        None => layout.last_indexed().context("find resume point")? + 1,
    };

    let client = Arc::new(
        HttpRpcClient::new(&config.rpc_url, config.request_timeout()).context("build rpc client")?,
    );
    let end = match args.end {
        Some(end) => end,
        None => client
            .get_height()
            .await
            .context("query chain height")?
            .saturating_sub(1),
    };
    if start > end {
        tracing::info!(start, end, "nothing to index");
        return Ok(ExitCode::SUCCESS);
    }

    let workers = config.concurrency.resolve();
    tracing::info!(
        batch_size = config.batch_size,
        index_dir = %args.index_dir.display(),
        "writing segments"
    );
    tracing::info!(start, end, url = %config.rpc_url, workers, "indexing");

    let (progress_tx, progress_rx, depth) =
        progress_channel(config.progress_queue_capacity).context("progress channel")?;
    let reporter = tokio::spawn(ProgressReporter::new(progress_rx, std::io::stdout()).run());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; finishing in-flight blocks");
                cancel.cancel();
            }
        }
    });

    let fetcher = RetryingFetcher::new(client, config.retries)
        .with_per_page(config.txs_per_page)
        .with_progress(progress_tx);
    let sink = Arc::new(ParquetSink::new(layout.root()));
    let writer = BatchWriter::new(fetcher, sink, config.batch_size)
        .context("build batch writer")?
        .with_cancellation(cancel);
    let coordinator = RangeCoordinator::new(writer, workers);
    let summary = coordinator.run(start, end).await.context("run ingestion")?;
    // Last progress sender goes with the coordinator; the reporter then sees
    // the channel close.
    drop(coordinator);

    let totals = reporter.await.context("progress reporter")?;
    tracing::info!(
        blocks = totals.blocks,
        txs = totals.txs,
        errors = totals.errors,
        unrecognized_msgs = summary.unrecognized_msgs,
        progress_queue_max = depth.max(),
        "done"
    );

    for failure in &summary.failures {
        tracing::error!(range = %failure.range, error = %failure.message, "chunk not indexed");
    }
    if !summary.cancelled.is_empty() {
        tracing::warn!(chunks = summary.cancelled.len(), "chunks left unindexed after interrupt");
    }
    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
