use crate::{
    checkpointer::Checkpointer,
    live::{
        sink::handle::Sink,
        state::event::{Event, Events},
    },
};
use eyre::Result;
use std::fmt::Debug;
use std::sync::Arc;
use sync::consumer::Consumer;
use tokio::sync::{broadcast, mpsc};

pub async fn consume_event<T: Debug + Send + Sync>(
    event: Event<T>,
    checkpointer: &Checkpointer,
    sink: &dyn Sink<Item = T>,
) -> Result<()> {
    match event {
        Event::Checkpoint(block) => {
            tracing::info!("Consumer consumed checkpoint: {}", block.number);
            let pending_from = sink.pending_from().await;
            checkpointer.checkpoint_before(&block, pending_from).await.map(|_| ())
        }
        Event::Elements(elements) => {
            tracing::info!("Consumer consumed {} element(s)", elements.len());
            match elements.as_slice() {
                [] => Ok(()),
                [element] => sink.process(element).await,
                _ => sink.process_batch(&elements).await,
            }
        }
    }
}

pub fn spawn_event_consumer<T>(
    rx: mpsc::Receiver<Events<T>>,
    shutdown_tx: broadcast::Sender<()>,
    checkpointer: Arc<Checkpointer>,
    sink: Arc<dyn Sink<Item = T>>,
) -> tokio::task::JoinHandle<Result<()>>
where
    T: Debug + Send + Sync + 'static,
{
    // A closure that returns a future.
    let consumer_callback = move |Events(events): Events<T>| {
        let checkpointer_for_consumer: Arc<Checkpointer> = Arc::clone(&checkpointer);
        let sink_for_consumer: Arc<dyn Sink<Item = T>> = Arc::clone(&sink);
        async move {
            for event in events {
                consume_event(event, checkpointer_for_consumer.as_ref(), sink_for_consumer.as_ref())
                    .await?;
            }
            Ok(())
        }
    };

    // Spawn consumer: applies events from rx (producer) in order;
    // a failure stops both tasks
    Consumer::spawn(rx, shutdown_tx, consumer_callback)
}
