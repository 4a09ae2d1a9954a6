use engine::reconciler::Reconciler;
use engine::retry::RetryPolicy;
use eyre::{Result, eyre};
use std::time::Duration;
use store::donation::model::DonationAnnotation;

use crate::cli::ingest::args::{Annotate, Record, SyncStatus};
use crate::cli::response::print_outcome;

pub async fn record(args: &Record) -> Result<()> {
    let ledger = args.node.client()?;
    let client = args.database.client().await?;
    let reconciler =
        Reconciler::new(client, args.tuning.min_confirmations, args.tuning.retry_policy());

    let outcome = reconciler
        .ingest_transaction(
            &ledger,
            args.tx_hash,
            Duration::from_secs(args.timeout),
            Duration::from_millis(args.poll_interval),
        )
        .await;
    print_outcome(outcome)
}

pub async fn annotate(args: &Annotate) -> Result<()> {
    let annotation = DonationAnnotation {
        is_anonymous: args.anonymous,
        donor_name: args.donor_name.clone(),
        donor_email: args.donor_email.clone(),
    };
    if annotation.is_empty() {
        return Err(eyre!("Nothing to annotate: pass --anonymous, --donor-name or --donor-email"));
    }

    let client = args.database.client().await?;
    let reconciler = Reconciler::new(client, 1, RetryPolicy::default());
    print_outcome(reconciler.annotate_donation(args.tx_hash, &annotation).await)
}

pub async fn sync_status(args: &SyncStatus) -> Result<()> {
    let ledger = args.node.client()?;
    let client = args.database.client().await?;
    let reconciler =
        Reconciler::new(client, args.tuning.min_confirmations, args.tuning.retry_policy());

    print_outcome(reconciler.toggle_campaign_status(&ledger, args.campaign_id).await)
}
