use galang_core::Actor;
use galang_server::{config::Config, error::ServerResult, open_platform};

pub async fn execute(config: Config, user: Option<i32>, campaign: Option<i32>) -> ServerResult<()> {
    let platform = open_platform(&config).await?;
    let system = Actor::system();

    // Campaign totals first; user funds are derived from them
    if let Some(campaign_id) = campaign {
        let recomputed = platform.funds.recompute_campaign(&system, campaign_id).await?;
        if recomputed.drifted() {
            println!(
                "Campaign {}: collected {} -> {}",
                campaign_id, recomputed.before, recomputed.after
            );
        } else {
            println!("Campaign {campaign_id}: collected {} (no drift)", recomputed.after);
        }
    }

    if let Some(user_id) = user {
        let recomputed = platform.funds.recompute_user(&system, user_id).await?;
        println!(
            "User {}: current {} -> {}, withdrawable {} -> {}{}",
            user_id,
            recomputed.before.current_funds,
            recomputed.after.current_funds,
            recomputed.before.withdrawable_funds,
            recomputed.after.withdrawable_funds,
            if recomputed.drifted() { "" } else { " (no drift)" }
        );
    }

    Ok(())
}
