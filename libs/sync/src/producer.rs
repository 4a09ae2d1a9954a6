use eyre::Result;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio::sync::{broadcast, mpsc};

/// Produces the next message, `None` when there is nothing to send this round.
pub type ProducerCallback<T> =
    dyn Fn() -> Pin<Box<dyn Future<Output = Result<Option<T>>> + Send>> + Send + Sync + 'static;

pub struct Producer<T: 'static> {
    producer_callback: Arc<ProducerCallback<T>>,
    tx: mpsc::Sender<T>,
    shutdown_tx: broadcast::Sender<()>,
}

impl<T> Producer<T> {
    pub fn new(
        producer_callback: Arc<ProducerCallback<T>>,
        tx: mpsc::Sender<T>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self { producer_callback, tx, shutdown_tx }
    }
}

impl<T: Send + Sync + 'static> Producer<T> {
    pub fn spawn<F, Fut>(
        tx: mpsc::Sender<T>,
        shutdown_tx: broadcast::Sender<()>,
        producer_callback_factory: F,
    ) -> tokio::task::JoinHandle<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<T>>> + Send + 'static,
    {
        let producer_callback: Arc<ProducerCallback<T>> =
            Arc::new(move || Box::pin(producer_callback_factory()));

        let producer = Producer::new(producer_callback, tx, shutdown_tx);

        tokio::spawn(async move { producer.run().await })
    }
}

impl<T> Producer<T> {
    /// Runs until shutdown or until the receiver is dropped. Callback errors
    /// are logged and the next round proceeds.
    pub async fn run(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                produced = async {
                    let callback = Arc::clone(&self.producer_callback);
                    callback().await
                } => {
                    match produced {
                        Ok(Some(message)) => {
                            if self.tx.send(message).await.is_err() {
                                tracing::info!("Producer: receiver dropped, stopping");
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => tracing::error!("Producer: callback failed - reason {e:?}"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Producer: shutdown signal received");
                    break
                }
            }
        }
    }
}
