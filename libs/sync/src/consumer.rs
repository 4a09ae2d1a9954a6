use eyre::Result;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio::sync::{broadcast, mpsc};

pub type ConsumerCallback<T> =
    dyn Fn(T) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync + 'static;

pub struct Consumer<T: 'static> {
    consumer_callback: Arc<ConsumerCallback<T>>,
    rx: mpsc::Receiver<T>,
    shutdown_tx: broadcast::Sender<()>,
}

impl<T> Consumer<T> {
    pub fn new(
        consumer_callback: Arc<ConsumerCallback<T>>,
        rx: mpsc::Receiver<T>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self { consumer_callback, rx, shutdown_tx }
    }
}

impl<T: Send + Sync + 'static> Consumer<T> {
    pub fn spawn<F, Fut>(
        rx: mpsc::Receiver<T>,
        shutdown_tx: broadcast::Sender<()>,
        consumer_callback_factory: F,
    ) -> tokio::task::JoinHandle<Result<()>>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let consumer_callback: Arc<ConsumerCallback<T>> =
            Arc::new(move |msg: T| Box::pin(consumer_callback_factory(msg)));

        let mut consumer = Consumer::new(consumer_callback, rx, shutdown_tx);

        tokio::spawn(async move { consumer.run().await })
    }
}

impl<T> Consumer<T> {
    /// Applies messages in arrival order. A failed message stops the consumer
    /// and broadcasts shutdown, so nothing after it is applied out of order.
    pub async fn run(&mut self) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                maybe_msg = self.rx.recv() => {
                    match maybe_msg {
                        Some(data) => {
                            let consumer_callback = Arc::clone(&self.consumer_callback);
                            if let Err(e) = consumer_callback(data).await {
                                tracing::error!("Consumer: callback failed, shutting down - reason {e:?}");
                                let _ = self.shutdown_tx.send(());
                                return Err(e);
                            }
                        }
                        None => {
                            // Channel closed
                            break
                        },
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Consumer: shutdown signal received");
                    break
                }
            }
        }

        Ok(())
    }
}
