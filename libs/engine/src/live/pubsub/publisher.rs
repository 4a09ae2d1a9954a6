use crate::args::Args;
use crate::live::source::handle::{Source, SourceInput};
use crate::live::state::event::{Event, Events};
use crate::live::state::logic::State;
use eyre::Result;
use std::sync::Arc;
use sync::producer::Producer;
use tokio::sync::{Mutex, broadcast, mpsc};

/// Pulls the next confirmed range, if any, and rolls the state forward.
pub async fn roll_forward<T>(
    state: &Mutex<State>,
    source: &dyn Source<Item = T>,
    checkpoint_interval: u64,
) -> Result<Option<Events<T>>>
where
    T: SourceInput + Send + Sync,
{
    let mut state = state.lock().await;
    let confirmed_tip = source.confirmed_tip().await?;
    let Some(range) = state.next_range(confirmed_tip, checkpoint_interval) else {
        return Ok(None);
    };

    let elements = source.chunk(range.into()).await?;
    let checkpoint = if state.checkpoint_decision(&range, checkpoint_interval) {
        Some(source.block(range.to).await?)
    } else {
        None
    };
    state.on_chunk(&range, checkpoint.is_some());

    let mut events = Vec::with_capacity(2);
    if !elements.is_empty() {
        tracing::info!(
            "Producer pulled {} element(s) from blocks {}..={}",
            elements.len(),
            range.from,
            range.to
        );
        events.push(Event::Elements(elements));
    }
    if let Some(block) = checkpoint {
        events.push(Event::Checkpoint(Box::new(block)));
    }

    Ok(if events.is_empty() { None } else { Some(Events(events)) })
}

pub fn spawn_event_producer<T>(
    args: &Args,
    state: State,
    tx: mpsc::Sender<Events<T>>,
    shutdown_tx: broadcast::Sender<()>,
    source: Arc<dyn Source<Item = T>>,
) -> tokio::task::JoinHandle<()>
where
    T: SourceInput + Send + Sync + 'static,
{
    let checkpoint_interval = args.checkpoint_interval.max(1);
    let poll_interval = args.poll_interval;
    let shared_state = Arc::new(Mutex::new(state));

    // A closure that returns a future
    let producer_callback = move || {
        let state_for_producer = Arc::clone(&shared_state);
        let source_for_producer = Arc::clone(&source);
        async move {
            let produced =
                roll_forward(&state_for_producer, source_for_producer.as_ref(), checkpoint_interval)
                    .await;
            // Back off when idle or failing; keep draining while there is work.
            if !matches!(produced, Ok(Some(_))) {
                tokio::time::sleep(poll_interval).await;
            }
            produced
        }
    };

    // Spawn producer: polls newly confirmed blocks
    // and sends their events to tx (consumer)
    Producer::spawn(tx, shutdown_tx, producer_callback)
}
