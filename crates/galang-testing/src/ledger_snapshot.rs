use galang_entities::{donations, DonationStatus};
use sea_orm::{ColumnTrait as _, EntityTrait as _, PaginatorTrait as _, QueryFilter as _};

use crate::TestFixture;

/// Money-related state of the fixture campaign and its owner, for before/after comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub collected: i64,
    pub is_ended: bool,
    pub owner_current: i64,
    pub owner_withdrawable: i64,
    pub paid_donations: u64,
    pub pending_donations: u64,
}

impl LedgerSnapshot {
    pub async fn capture(test: &TestFixture) -> Self {
        let campaign = test.campaign().await;
        let owner = test.user(test.creator.user_id).await;

        Self {
            collected: campaign.collected,
            is_ended: campaign.is_ended,
            owner_current: owner.current_funds,
            owner_withdrawable: owner.withdrawable_funds,
            paid_donations: count_donations(test, campaign.id, DonationStatus::Paid).await,
            pending_donations: count_donations(test, campaign.id, DonationStatus::Pending).await,
        }
    }

    /// `withdrawable ≤ current` and neither is negative.
    pub fn assert_balances_sane(&self) {
        assert!(self.owner_withdrawable >= 0, "{self:?}");
        assert!(
            self.owner_withdrawable <= self.owner_current,
            "withdrawable exceeds current: {self:?}"
        );
    }
}

async fn count_donations(test: &TestFixture, campaign_id: i32, status: DonationStatus) -> u64 {
    donations::Entity::find()
        .filter(donations::Column::CampaignId.eq(campaign_id))
        .filter(donations::Column::Status.eq(status))
        .count(&test.db)
        .await
        .unwrap()
}
