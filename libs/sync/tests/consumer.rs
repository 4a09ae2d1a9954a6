use eyre::eyre;
use std::sync::Arc;
use sync::consumer::Consumer;
use tokio::sync::{Mutex, broadcast, mpsc};

#[tokio::test]
async fn test_consumer_applies_messages_in_order() -> eyre::Result<()> {
    let (tx, rx) = mpsc::channel(10);
    let (shutdown_tx, _) = broadcast::channel(1);
    let applied = Arc::new(Mutex::new(Vec::new()));

    let applied_clone = Arc::clone(&applied);
    let consumer_handle = Consumer::spawn(rx, shutdown_tx, move |n: u64| {
        let applied = Arc::clone(&applied_clone);
        async move {
            applied.lock().await.push(n);
            Ok(())
        }
    });

    for n in 0..5 {
        tx.send(n).await?;
    }
    drop(tx);

    consumer_handle.await??;
    assert_eq!(*applied.lock().await, vec![0, 1, 2, 3, 4]);
    Ok(())
}

#[tokio::test]
async fn test_consumer_failure_broadcasts_shutdown() -> eyre::Result<()> {
    let (tx, rx) = mpsc::channel(10);
    let (shutdown_tx, _) = broadcast::channel(1);
    let mut shutdown_rx = shutdown_tx.subscribe();
    let applied = Arc::new(Mutex::new(Vec::new()));

    let applied_clone = Arc::clone(&applied);
    let consumer_handle = Consumer::spawn(rx, shutdown_tx, move |n: u64| {
        let applied = Arc::clone(&applied_clone);
        async move {
            if n == 2 {
                return Err(eyre!("store rejected message {n}"));
            }
            applied.lock().await.push(n);
            Ok(())
        }
    });

    for n in 0..5 {
        tx.send(n).await?;
    }

    assert!(consumer_handle.await?.is_err());
    shutdown_rx.recv().await?;
    assert_eq!(*applied.lock().await, vec![0, 1]);
    Ok(())
}
