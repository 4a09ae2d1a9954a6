use crate::args::Args;
use crate::backfill;
use crate::checkpointer::Checkpointer;
use crate::live::pubsub::{publisher, subscriber};
use crate::live::sink::handle::Sink;
use crate::live::source::handle::{Source, SourceInput};
use crate::live::state::event::Events;
use crate::live::state::logic::State;
use eyre::{Result, eyre};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

pub struct Engine {
    shutdown_tx: broadcast::Sender<()>,
    consumer_handle: JoinHandle<Result<()>>,
    producer_handle: JoinHandle<()>,
}

fn channel_size(args: &Args) -> usize {
    // safety multiplier to handle bursts
    let burst_factor: usize = 2;
    // each message carries one range of blocks plus its checkpoint
    let ranges_in_flight: usize = 16;
    std::cmp::max(args.min_confirmations as usize, ranges_in_flight) * burst_factor
}

impl Engine {
    pub async fn start<T>(
        args: &Args,
        source: Arc<dyn Source<Item = T>>,
        checkpointer: &Checkpointer,
        sink: Arc<dyn Sink<Item = T>>,
    ) -> Result<Engine>
    where
        T: SourceInput + Debug + Send + Sync + 'static,
    {
        // Apply confirmed history in chunks (backfill)
        let next_block_number =
            backfill::chunked_backfill(args, source.as_ref(), checkpointer, sink.as_ref()).await?;

        let state = State::new(next_block_number);

        // Follow newly confirmed blocks (live tail)
        let (tx, rx) = mpsc::channel::<Events<T>>(channel_size(args));

        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let consumer_handle = subscriber::spawn_event_consumer(
            rx,
            shutdown_tx.clone(),
            Arc::new(checkpointer.clone()),
            Arc::clone(&sink),
        );

        let producer_handle = publisher::spawn_event_producer(
            args,
            state,
            tx,
            shutdown_tx.clone(),
            Arc::clone(&source),
        );

        tracing::info!("Engine live from block {next_block_number}");

        Ok(Self { shutdown_tx, consumer_handle, producer_handle })
    }

    /// Fires when either task asks the engine to stop.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    // Send shutdown signal and wait for both producer and consumer to finish
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        self.producer_handle.await.map_err(|e| eyre!("Producer task failed: {e}"))?;
        self.consumer_handle.await.map_err(|e| eyre!("Consumer task failed: {e}"))?
    }
}
