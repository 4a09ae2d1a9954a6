use chain::events::LedgerEvent;
use chain::ledger::{BlockRange, Ledger};
use engine::{
    backfill,
    checkpointer::Checkpointer,
    confirmation::Confirmed,
    engine::Engine,
    live::sink::{handle::Sink, reconciler::ReconcilerSink},
    live::source::{handle::Source, ledger::LedgerSource},
    reconciler::Reconciler,
};
use eyre::{Result, eyre};
use std::sync::Arc;

use crate::cli::engine::args::{Args, Reconcile};
use crate::cli::response::print_json;

pub async fn start(args: &Args) -> Result<()> {
    let engine_args = args.engine_args();

    let node = args.node.client()?;
    tracing::info!("Following contract {}", node.contract_address());
    let ledger: Arc<dyn Ledger> = Arc::new(node);
    let source: Arc<dyn Source<Item = Confirmed<LedgerEvent>>> =
        Arc::new(LedgerSource::new(ledger, engine_args.min_confirmations));

    let client = args.database.client().await?;
    let checkpointer = Checkpointer::new(client.clone());
    let reconciler =
        Reconciler::new(client, engine_args.min_confirmations, engine_args.retry.clone());
    let sink: Arc<dyn Sink<Item = Confirmed<LedgerEvent>>> =
        Arc::new(ReconcilerSink::new(Arc::new(reconciler)));

    tracing::info!("Starting the engine {engine_args:?}");

    let engine = Engine::start(&engine_args, source, &checkpointer, sink).await?;
    let mut stopped = engine.subscribe_shutdown();

    // Wait for user to request shutdown (SIGINT), or for the engine to give up
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutting down engine...");
        }
        _ = stopped.recv() => {
            tracing::warn!("Engine stopped on its own, shutting down...");
        }
    }

    // Gracefully shutdown
    engine.shutdown().await
}

pub async fn reconcile(args: &Reconcile) -> Result<()> {
    if args.from_block > args.to_block {
        return Err(eyre!("--from-block {} is past --to-block {}", args.from_block, args.to_block));
    }

    let min_confirmations = args.tuning.min_confirmations;
    let ledger: Arc<dyn Ledger> = Arc::new(args.node.client()?);
    let source = LedgerSource::new(ledger, min_confirmations);

    let client = args.database.client().await?;
    let reconciler = Reconciler::new(client, min_confirmations, args.tuning.retry_policy());
    let sink = ReconcilerSink::new(Arc::new(reconciler));

    let range = BlockRange::new(args.from_block, args.to_block);
    let report = backfill::reconcile_range(&source, &sink, range, args.chunk_size).await?;
    print_json(&report)
}
