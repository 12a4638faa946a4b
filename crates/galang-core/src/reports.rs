use chrono::{DateTime, Utc};
use csv::Writer;
use galang_entities::{campaigns, donations, users, withdrawals, DonationStatus, WithdrawalStatus};
use sea_orm::{
    ColumnTrait as _, DatabaseConnection, EntityTrait as _, PaginatorTrait as _,
    QueryFilter as _, QueryOrder as _,
};
use serde::Serialize;
use std::{collections::HashMap, io::Write};
use tracing::info;

use crate::{ledger, Actor, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformStats {
    pub users: u64,
    pub campaigns: u64,
    pub open_campaigns: u64,
    pub ended_campaigns: u64,
    pub paid_donations: u64,
    pub paid_total: i64,
    pub pending_withdrawals: u64,
    pub pending_withdrawal_total: i64,
}

/// One line of the donations export.
#[derive(Debug, Serialize)]
struct DonationRow<'a> {
    donation_id: i32,
    campaign_id: i32,
    campaign_title: &'a str,
    donor_name: &'a str,
    donor_email: &'a str,
    anonymous: bool,
    amount: i64,
    method: &'a str,
    external_id: &'a str,
    paid_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct Reports {
    db: DatabaseConnection,
}

impl Reports {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn stats(&self, actor: &Actor) -> Result<PlatformStats> {
        actor.require_admin()?;

        let user_count = users::Entity::find().count(&self.db).await?;
        let campaign_count = campaigns::Entity::find().count(&self.db).await?;
        let ended_campaigns = campaigns::Entity::find()
            .filter(campaigns::Column::IsEnded.eq(true))
            .count(&self.db)
            .await?;

        let paid = donations::Entity::find()
            .filter(donations::Column::Status.eq(DonationStatus::Paid));
        let paid_donations = paid.clone().count(&self.db).await?;
        let paid_total = ledger::total(&self.db, paid, donations::Column::Amount).await?;

        let pending = withdrawals::Entity::find()
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending));
        let pending_withdrawals = pending.clone().count(&self.db).await?;
        let pending_withdrawal_total =
            ledger::total(&self.db, pending, withdrawals::Column::Amount).await?;

        Ok(PlatformStats {
            users: user_count,
            campaigns: campaign_count,
            open_campaigns: campaign_count - ended_campaigns,
            ended_campaigns,
            paid_donations,
            paid_total,
            pending_withdrawals,
            pending_withdrawal_total,
        })
    }

    /// Write paid donations as CSV, oldest first. Returns the number of rows written.
    pub async fn export_donations_csv<W: Write>(
        &self,
        actor: &Actor,
        campaign_id: Option<i32>,
        out: W,
    ) -> Result<usize> {
        actor.require_admin()?;

        let mut query = donations::Entity::find()
            .filter(donations::Column::Status.eq(DonationStatus::Paid))
            .order_by_asc(donations::Column::Id);
        if let Some(campaign_id) = campaign_id {
            query = query.filter(donations::Column::CampaignId.eq(campaign_id));
        }
        let rows = query.find_also_related(users::Entity).all(&self.db).await?;

        let titles: HashMap<i32, String> = campaigns::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|campaign| (campaign.id, campaign.title))
            .collect();

        let mut wtr = Writer::from_writer(out);
        for (donation, donor) in &rows {
            wtr.serialize(DonationRow {
                donation_id: donation.id,
                campaign_id: donation.campaign_id,
                campaign_title: titles
                    .get(&donation.campaign_id)
                    .map(String::as_str)
                    .unwrap_or_default(),
                donor_name: donor.as_ref().map(|d| d.name.as_str()).unwrap_or_default(),
                donor_email: donor.as_ref().map(|d| d.email.as_str()).unwrap_or_default(),
                anonymous: donation.is_anonymous,
                amount: donation.amount,
                method: &donation.method,
                external_id: &donation.external_id,
                paid_at: donation.paid_at,
            })?;
        }
        wtr.flush()?;

        info!(rows = rows.len(), campaign_id, "Exported donations");
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::new_scratch_db;
    use crate::testing::{seed_campaign, seed_donation, seed_user};
    use crate::Error;
    use galang_entities::Role;

    #[tokio::test]
    async fn test_stats() {
        let db = new_scratch_db().await.unwrap();
        let owner = seed_user(&db, "owner@example.com", Role::Creator).await;
        let donor = seed_user(&db, "donor@example.com", Role::User).await;
        let a = seed_campaign(&db, owner.id, 1_000).await;
        let b = seed_campaign(&db, owner.id, 1_000).await;
        ledger::close_campaign(&db, b.id, Utc::now()).await.unwrap();
        seed_donation(&db, a.id, donor.id, 10_000, DonationStatus::Paid).await;
        seed_donation(&db, b.id, donor.id, 25_000, DonationStatus::Paid).await;
        seed_donation(&db, b.id, donor.id, 50_000, DonationStatus::Pending).await;

        let reports = Reports::new(db);
        let stats = reports.stats(&Actor::system()).await.unwrap();
        assert_eq!(
            stats,
            PlatformStats {
                users: 2,
                campaigns: 2,
                open_campaigns: 1,
                ended_campaigns: 1,
                paid_donations: 2,
                paid_total: 35_000,
                pending_withdrawals: 0,
                pending_withdrawal_total: 0,
            }
        );

        assert!(matches!(
            reports.stats(&Actor::new(owner.id, owner.role)).await,
            Err(Error::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_export_donations_csv() {
        let db = new_scratch_db().await.unwrap();
        let owner = seed_user(&db, "owner@example.com", Role::Creator).await;
        let donor = seed_user(&db, "donor@example.com", Role::User).await;
        let a = seed_campaign(&db, owner.id, 1_000).await;
        let b = seed_campaign(&db, owner.id, 1_000).await;
        let paid = seed_donation(&db, a.id, donor.id, 10_000, DonationStatus::Paid).await;
        seed_donation(&db, a.id, donor.id, 20_000, DonationStatus::Expired).await;
        seed_donation(&db, b.id, donor.id, 30_000, DonationStatus::Paid).await;

        let reports = Reports::new(db);
        let mut out = Vec::new();
        let written = reports
            .export_donations_csv(&Actor::system(), Some(a.id), &mut out)
            .await
            .unwrap();
        assert_eq!(written, 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "donation_id,campaign_id,campaign_title,donor_name,donor_email,anonymous,amount,method,external_id,paid_at"
        );
        let row = lines.next().unwrap();
        let expected = format!(
            "{},{},Clean water for Sumba,donor,donor@example.com,false,10000,INVOICE,",
            paid.id, a.id
        );
        assert!(row.starts_with(&expected), "unexpected row {row}");
        assert!(lines.next().is_none());

        let mut all = Vec::new();
        let written = reports
            .export_donations_csv(&Actor::system(), None, &mut all)
            .await
            .unwrap();
        assert_eq!(written, 2);
    }
}
