use chrono::Utc;
use galang_entities::{campaigns, donations, users, withdrawals, DonationStatus, WithdrawalStatus};
use sea_orm::{
    ActiveModelTrait as _, ActiveValue::Set, ColumnTrait as _, ConnectionTrait,
    DatabaseConnection, EntityTrait as _, PaginatorTrait as _, QueryFilter as _,
    QueryOrder as _, TransactionTrait as _,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{campaigns::find as find_campaign, ledger, Actor, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundsSummary {
    pub current_funds: i64,
    pub withdrawable_funds: i64,
    /// Held by withdrawals awaiting review
    pub pending_withdrawals: i64,
    pub campaigns: u64,
    /// Collected across every campaign the user owns, open or ended
    pub total_raised: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWithdrawal {
    pub amount: i64,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    #[serde(default)]
    pub campaign_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub current_funds: i64,
    pub withdrawable_funds: i64,
}

impl From<&users::Model> for Balances {
    fn from(user: &users::Model) -> Self {
        Self {
            current_funds: user.current_funds,
            withdrawable_funds: user.withdrawable_funds,
        }
    }
}

/// Stored values before and after a rebuild from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recomputed<T> {
    pub id: i32,
    pub before: T,
    pub after: T,
}

impl<T: PartialEq> Recomputed<T> {
    pub fn drifted(&self) -> bool {
        self.before != self.after
    }
}

#[derive(Clone)]
pub struct Funds {
    db: DatabaseConnection,
}

impl Funds {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn summary(&self, actor: &Actor) -> Result<FundsSummary> {
        let user = find_user(&self.db, actor.user_id).await?;

        let pending_withdrawals = ledger::total(
            &self.db,
            withdrawals::Entity::find()
                .filter(withdrawals::Column::UserId.eq(user.id))
                .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending)),
            withdrawals::Column::Amount,
        )
        .await?;

        let owned = campaigns::Entity::find().filter(campaigns::Column::OwnerId.eq(user.id));
        let campaign_count = owned.clone().count(&self.db).await?;
        let total_raised = ledger::total(&self.db, owned, campaigns::Column::Collected).await?;

        Ok(FundsSummary {
            current_funds: user.current_funds,
            withdrawable_funds: user.withdrawable_funds,
            pending_withdrawals,
            campaigns: campaign_count,
            total_raised,
        })
    }

    /// Reserve funds and file a withdrawal for admin review.
    pub async fn request_withdrawal(
        &self,
        actor: &Actor,
        new: NewWithdrawal,
    ) -> Result<withdrawals::Model> {
        if new.amount <= 0 {
            return Err(Error::InvalidAmount(format!(
                "withdrawal amount must be positive, got {}",
                new.amount
            )));
        }
        let bank_name = required("bank name", &new.bank_name)?;
        let account_number = required("account number", &new.account_number)?;
        let account_holder = required("account holder", &new.account_holder)?;

        if let Some(campaign_id) = new.campaign_id {
            let campaign = find_campaign(&self.db, campaign_id).await?;
            if campaign.owner_id != actor.user_id {
                return Err(Error::forbidden("withdrawals may only name your own campaigns"));
            }
            if !campaign.is_ended {
                return Err(Error::InvalidState(format!(
                    "campaign {campaign_id} is still running"
                )));
            }
        }

        let txn = self.db.begin().await?;
        ledger::reserve(&txn, actor.user_id, new.amount).await?;
        let withdrawal = withdrawals::ActiveModel {
            user_id: Set(actor.user_id),
            campaign_id: Set(new.campaign_id),
            amount: Set(new.amount),
            status: Set(WithdrawalStatus::Pending),
            bank_name: Set(bank_name),
            account_number: Set(account_number),
            account_holder: Set(account_holder),
            note: Set(None),
            processed_at: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(
            withdrawal_id = withdrawal.id,
            user_id = actor.user_id,
            amount = withdrawal.amount,
            "Withdrawal requested"
        );
        Ok(withdrawal)
    }

    pub async fn list_withdrawals(&self, actor: &Actor) -> Result<Vec<withdrawals::Model>> {
        Ok(withdrawals::Entity::find()
            .filter(withdrawals::Column::UserId.eq(actor.user_id))
            .order_by_desc(withdrawals::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn list_all_withdrawals(
        &self,
        actor: &Actor,
        status: Option<WithdrawalStatus>,
    ) -> Result<Vec<withdrawals::Model>> {
        actor.require_admin()?;

        let mut query = withdrawals::Entity::find().order_by_desc(withdrawals::Column::Id);
        if let Some(status) = status {
            query = query.filter(withdrawals::Column::Status.eq(status));
        }
        Ok(query.all(&self.db).await?)
    }

    /// Mark a pending withdrawal paid out. The reserved amount leaves `current_funds`.
    pub async fn approve(&self, actor: &Actor, id: i32) -> Result<withdrawals::Model> {
        actor.require_admin()?;
        let withdrawal = self
            .process(id, WithdrawalStatus::Approved, None)
            .await?;

        info!(
            withdrawal_id = id,
            user_id = withdrawal.user_id,
            amount = withdrawal.amount,
            by = actor.user_id,
            "Withdrawal approved"
        );
        Ok(withdrawal)
    }

    /// Turn down a pending withdrawal and give the reservation back.
    pub async fn reject(
        &self,
        actor: &Actor,
        id: i32,
        note: Option<String>,
    ) -> Result<withdrawals::Model> {
        actor.require_admin()?;
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let withdrawal = self
            .process(id, WithdrawalStatus::Rejected, note)
            .await?;

        info!(
            withdrawal_id = id,
            user_id = withdrawal.user_id,
            amount = withdrawal.amount,
            by = actor.user_id,
            "Withdrawal rejected"
        );
        Ok(withdrawal)
    }

    /// Rebuild a user's balances from paid donations and withdrawals.
    pub async fn recompute_user(
        &self,
        actor: &Actor,
        user_id: i32,
    ) -> Result<Recomputed<Balances>> {
        actor.require_admin()?;

        // Hold the user row so no credit or reservation lands between the sums and the overwrite.
        let txn = self.db.begin().await?;
        ledger::lock_user(&txn, user_id).await?;
        let user = find_user(&txn, user_id).await?;

        let ended: Vec<i32> = campaigns::Entity::find()
            .filter(campaigns::Column::OwnerId.eq(user_id))
            .filter(campaigns::Column::IsEnded.eq(true))
            .all(&txn)
            .await?
            .into_iter()
            .map(|campaign| campaign.id)
            .collect();

        let raised = if ended.is_empty() {
            0
        } else {
            ledger::total(
                &txn,
                donations::Entity::find()
                    .filter(donations::Column::CampaignId.is_in(ended))
                    .filter(donations::Column::Status.eq(DonationStatus::Paid)),
                donations::Column::Amount,
            )
            .await?
        };
        let withdrawn = withdrawal_total(&txn, user_id, WithdrawalStatus::Approved).await?;
        let reserved = withdrawal_total(&txn, user_id, WithdrawalStatus::Pending).await?;

        let current = raised - withdrawn;
        let withdrawable = current - reserved;
        if current < 0 || withdrawable < 0 {
            warn!(
                user_id,
                raised,
                withdrawn,
                reserved,
                "History implies a negative balance, clamping to zero"
            );
        }
        let after = Balances {
            current_funds: current.max(0),
            withdrawable_funds: withdrawable.clamp(0, current.max(0)),
        };

        ledger::set_balances(&txn, user_id, after.current_funds, after.withdrawable_funds).await?;
        txn.commit().await?;

        let recomputed = Recomputed {
            id: user_id,
            before: Balances::from(&user),
            after,
        };
        if recomputed.drifted() {
            warn!(
                user_id,
                before = ?recomputed.before,
                after = ?recomputed.after,
                "Corrected balance drift"
            );
        } else {
            info!(user_id, "Balances already consistent");
        }
        Ok(recomputed)
    }

    /// Rebuild a campaign's `collected` from its paid donations.
    pub async fn recompute_campaign(
        &self,
        actor: &Actor,
        campaign_id: i32,
    ) -> Result<Recomputed<i64>> {
        actor.require_admin()?;

        let txn = self.db.begin().await?;
        ledger::lock_campaign(&txn, campaign_id).await?;
        let campaign = find_campaign(&txn, campaign_id).await?;

        let collected = ledger::total(
            &txn,
            donations::Entity::find()
                .filter(donations::Column::CampaignId.eq(campaign_id))
                .filter(donations::Column::Status.eq(DonationStatus::Paid)),
            donations::Column::Amount,
        )
        .await?;
        ledger::set_collected(&txn, campaign_id, collected).await?;
        txn.commit().await?;

        let recomputed = Recomputed {
            id: campaign_id,
            before: campaign.collected,
            after: collected,
        };
        if recomputed.drifted() {
            warn!(
                campaign_id,
                before = recomputed.before,
                after = collected,
                "Corrected collected drift"
            );
        }
        Ok(recomputed)
    }

    /// `PENDING → status` plus the matching ledger move, in one transaction.
    async fn process(
        &self,
        id: i32,
        status: WithdrawalStatus,
        note: Option<String>,
    ) -> Result<withdrawals::Model> {
        let withdrawal = withdrawals::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::not_found("Withdrawal", id))?;

        let txn = self.db.begin().await?;
        let result = withdrawals::Entity::update_many()
            .set(withdrawals::ActiveModel {
                status: Set(status),
                note: Set(note),
                processed_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(withdrawals::Column::Id.eq(id))
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(Error::InvalidState(format!(
                "withdrawal {id} is {:?}, not pending",
                withdrawal.status
            )));
        }

        match status {
            WithdrawalStatus::Approved => {
                ledger::settle(&txn, withdrawal.user_id, withdrawal.amount).await?
            }
            WithdrawalStatus::Rejected => {
                ledger::release(&txn, withdrawal.user_id, withdrawal.amount).await?
            }
            WithdrawalStatus::Pending => {}
        }
        let processed = withdrawals::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::not_found("Withdrawal", id))?;
        txn.commit().await?;
        Ok(processed)
    }
}

async fn withdrawal_total<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    status: WithdrawalStatus,
) -> Result<i64> {
    ledger::total(
        db,
        withdrawals::Entity::find()
            .filter(withdrawals::Column::UserId.eq(user_id))
            .filter(withdrawals::Column::Status.eq(status)),
        withdrawals::Column::Amount,
    )
    .await
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<users::Model> {
    users::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", id))
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}
