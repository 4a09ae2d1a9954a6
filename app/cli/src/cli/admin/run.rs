use engine::reconciler::Reconciler;
use eyre::Result;
use store::campaign::model::{CampaignMetadata, CampaignPatch, NewCampaignUpdate};

use crate::cli::admin::args::{Action, Admin, images};
use crate::cli::response::print_outcome;

pub async fn run(args: &Admin) -> Result<()> {
    let ledger = args.node.client()?;
    let client = args.database.client().await?;
    let reconciler =
        Reconciler::new(client, args.tuning.min_confirmations, args.tuning.retry_policy());

    let authorization = match reconciler.authorize(&ledger, args.caller).await {
        Ok(authorization) => authorization,
        Err(e) => return print_outcome::<()>(Err(e)),
    };

    match &args.action {
        Action::Mirror { campaign_id, title, description, category, location, images: urls } => {
            let metadata = CampaignMetadata {
                title: title.clone(),
                description: description.clone(),
                category: *category,
                location: location.clone(),
                images: images(urls),
            };
            let mirrored =
                reconciler.mirror_campaign(&ledger, authorization, *campaign_id, &metadata).await;
            print_outcome(mirrored)
        }
        Action::Update { campaign_id, title, description, category, location, images: urls } => {
            let patch = CampaignPatch {
                title: title.clone(),
                description: description.clone(),
                category: *category,
                location: location.clone(),
                images: if urls.is_empty() { None } else { Some(images(urls)) },
            };
            if patch.is_empty() {
                return Err(eyre::eyre!("Nothing to update"));
            }
            let outcome =
                reconciler.update_campaign_metadata(authorization, *campaign_id, &patch).await;
            print_outcome(outcome)
        }
        Action::PostUpdate { campaign_id, title, content } => {
            let update = NewCampaignUpdate { title: title.clone(), content: content.clone() };
            let outcome =
                reconciler.add_campaign_update(authorization, *campaign_id, &update).await;
            print_outcome(outcome)
        }
    }
}
