/*!
# Donations

A donation is created `PENDING` together with a hosted Xendit invoice. It becomes
`PAID` when the invoice callback arrives or when the poller finds the invoice paid,
whichever comes first; the other observer sees a no-op.

```text
PENDING ──paid──▶ PAID      (credits campaign, and the owner if the campaign has ended)
   │
   ├──expired──▶ EXPIRED
   └──gateway error on create──▶ FAILED
```
*/

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt as _};
use galang_entities::{
    campaigns,
    donations::{self, METHOD_INVOICE},
    users, DonationStatus,
};
use galang_xendit::{verify_callback_token, CreateInvoice, Invoice, InvoiceStatus, PaymentGateway};
use sea_orm::{
    ActiveModelTrait as _, ActiveValue::Set, ColumnTrait as _, ConnectionTrait,
    DatabaseConnection, EntityTrait as _, QueryFilter as _, QueryOrder as _, QuerySelect as _,
    TransactionTrait as _,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{campaigns::find as find_campaign, ledger, password, Actor, Error, Result, Settings};

pub const ANONYMOUS_DONOR: &str = "Anonymous";

#[derive(Debug, Clone, Deserialize)]
pub struct NewDonation {
    pub campaign_id: i32,
    pub amount: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// A paid donation as shown on a campaign page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicDonation {
    pub id: i32,
    pub donor_name: String,
    pub amount: i64,
    pub message: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// What applying an invoice state did to the donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceOutcome {
    Credited,
    Expired,
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    pub checked: usize,
    pub credited: usize,
    pub expired: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Donations {
    db: DatabaseConnection,
    gateway: Arc<dyn PaymentGateway>,
    settings: Arc<Settings>,
}

impl Donations {
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn PaymentGateway>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            db,
            gateway,
            settings,
        }
    }

    /// Record a pending donation and open a hosted invoice for it.
    pub async fn create(&self, actor: &Actor, new: NewDonation) -> Result<donations::Model> {
        let campaign = find_campaign(&self.db, new.campaign_id).await?;
        let now = Utc::now();
        if campaign.is_ended || campaign.is_past_deadline(now) {
            return Err(Error::CampaignEnded(campaign.id));
        }
        if new.amount < self.settings.min_donation {
            return Err(Error::InvalidAmount(format!(
                "minimum donation is {}, got {}",
                self.settings.min_donation, new.amount
            )));
        }

        let donor = find_user(&self.db, actor.user_id).await?;
        let owner = find_user(&self.db, campaign.owner_id).await?;

        let external_id = format!("donation-{}-{}", campaign.id, password::new_reference());
        let donation = donations::ActiveModel {
            campaign_id: Set(campaign.id),
            user_id: Set(donor.id),
            amount: Set(new.amount),
            method: Set(METHOD_INVOICE.to_string()),
            status: Set(DonationStatus::Pending),
            external_id: Set(external_id.clone()),
            invoice_id: Set(None),
            invoice_url: Set(None),
            message: Set(new
                .message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())),
            is_anonymous: Set(new.is_anonymous),
            merchant_owned: Set(owner.xendit_secret_key.is_some()),
            paid_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|err| Error::from_insert(err, || format!("external id {external_id} is taken")))?;

        let request = CreateInvoice {
            external_id: donation.external_id.clone(),
            amount: donation.amount,
            payer_email: Some(donor.email.clone()),
            description: format!("Donation to {}", campaign.title),
            invoice_duration: None,
            success_redirect_url: self.settings.success_redirect_url.clone(),
            failure_redirect_url: self.settings.failure_redirect_url.clone(),
            currency: None,
        };

        let invoice = match self
            .gateway
            .create_invoice(owner.xendit_secret_key.as_deref(), &request)
            .await
        {
            Ok(invoice) => invoice,
            Err(err) => {
                warn!(donation_id = donation.id, error = %err, "Invoice creation failed");
                donations::Entity::update_many()
                    .set(donations::ActiveModel {
                        status: Set(DonationStatus::Failed),
                        updated_at: Set(Utc::now()),
                        ..Default::default()
                    })
                    .filter(donations::Column::Id.eq(donation.id))
                    .filter(donations::Column::Status.eq(DonationStatus::Pending))
                    .exec(&self.db)
                    .await?;
                return Err(Error::Gateway(err));
            }
        };

        let mut active: donations::ActiveModel = donation.into();
        active.invoice_id = Set(Some(invoice.id.clone()));
        active.invoice_url = Set(invoice.invoice_url.clone());
        active.updated_at = Set(Utc::now());
        let donation = active.update(&self.db).await?;

        info!(
            donation_id = donation.id,
            campaign_id = campaign.id,
            amount = donation.amount,
            invoice_id = %invoice.id,
            merchant_owned = donation.merchant_owned,
            "Created donation invoice"
        );
        Ok(donation)
    }

    /// Visible to the donor, the campaign owner and admins.
    pub async fn get(&self, actor: &Actor, id: i32) -> Result<donations::Model> {
        let donation = donations::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::not_found("Donation", id))?;

        if donation.user_id != actor.user_id {
            let campaign = find_campaign(&self.db, donation.campaign_id).await?;
            if !actor.can_manage(campaign.owner_id) {
                return Err(Error::forbidden("not your donation"));
            }
        }
        Ok(donation)
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<donations::Model>> {
        Ok(donations::Entity::find()
            .filter(donations::Column::UserId.eq(actor.user_id))
            .order_by_desc(donations::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Paid donations of one campaign, newest first, with anonymous donors masked.
    pub async fn list_for_campaign(&self, campaign_id: i32) -> Result<Vec<PublicDonation>> {
        find_campaign(&self.db, campaign_id).await?;

        let rows = donations::Entity::find()
            .filter(donations::Column::CampaignId.eq(campaign_id))
            .filter(donations::Column::Status.eq(DonationStatus::Paid))
            .order_by_desc(donations::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(donation, donor)| PublicDonation {
                id: donation.id,
                donor_name: donor_label(&donation, donor.as_ref()),
                amount: donation.amount,
                message: donation.message,
                paid_at: donation.paid_at,
            })
            .collect())
    }

    /// Handle an invoice callback posted by Xendit.
    pub async fn handle_callback(
        &self,
        presented_token: &str,
        callback: &Invoice,
    ) -> Result<InvoiceOutcome> {
        let donation = donations::Entity::find()
            .filter(donations::Column::ExternalId.eq(callback.external_id.as_str()))
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::not_found("Donation", &callback.external_id))?;

        // Trust the account that issued the invoice, not whatever keys the owner holds now.
        let owner_token = if donation.merchant_owned {
            self.campaign_owner(donation.campaign_id)
                .await?
                .and_then(|owner| owner.xendit_callback_token)
        } else {
            None
        };
        let expected = if donation.merchant_owned {
            owner_token.as_deref()
        } else {
            self.gateway.platform_callback_token()
        };
        let trusted =
            expected.is_some_and(|expected| verify_callback_token(expected, presented_token));
        if !trusted {
            warn!(donation_id = donation.id, "Callback token mismatch");
            return Err(Error::Unauthenticated);
        }

        if let Some(invoice_id) = &donation.invoice_id {
            if invoice_id != &callback.id {
                return Err(Error::validation(format!(
                    "invoice {} does not belong to donation {}",
                    callback.id, donation.id
                )));
            }
        }

        debug!(donation_id = donation.id, status = ?callback.status, "Invoice callback");
        self.apply_invoice(&donation, callback).await
    }

    /// Move a pending donation to the state the gateway reports.
    ///
    /// Only `PENDING` rows change, so a payment seen by both the callback and the
    /// poller is credited once.
    pub async fn apply_invoice(
        &self,
        donation: &donations::Model,
        invoice: &Invoice,
    ) -> Result<InvoiceOutcome> {
        if donation.status.is_final() {
            debug!(donation_id = donation.id, status = ?donation.status, "Already settled");
            return Ok(InvoiceOutcome::Unchanged);
        }
        match invoice.status {
            status if status.is_paid() => self.mark_paid(donation, invoice).await,
            InvoiceStatus::Expired => self.mark_expired(donation).await,
            _ => Ok(InvoiceOutcome::Unchanged),
        }
    }

    /// Ask the gateway about pending donations and apply what it says.
    pub async fn poll_pending(&self, limit: u64) -> Result<PollReport> {
        let pending = donations::Entity::find()
            .filter(donations::Column::Status.eq(DonationStatus::Pending))
            .filter(donations::Column::InvoiceId.is_not_null())
            .order_by_asc(donations::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        let mut report = PollReport {
            checked: pending.len(),
            ..Default::default()
        };

        let outcomes: Vec<(i32, Result<InvoiceOutcome>)> = stream::iter(pending)
            .map(|donation| async move {
                let id = donation.id;
                (id, self.poll_one(&donation).await)
            })
            .buffer_unordered(self.settings.poll_concurrency.max(1))
            .collect()
            .await;

        for (donation_id, outcome) in outcomes {
            match outcome {
                Ok(InvoiceOutcome::Credited) => report.credited += 1,
                Ok(InvoiceOutcome::Expired) => report.expired += 1,
                Ok(InvoiceOutcome::Unchanged) => {}
                Err(err) => {
                    warn!(donation_id, error = %err, "Polling donation failed");
                    report.failed += 1;
                }
            }
        }

        if report.checked > 0 {
            info!(
                checked = report.checked,
                credited = report.credited,
                expired = report.expired,
                failed = report.failed,
                "Polled pending donations"
            );
        }
        Ok(report)
    }

    async fn poll_one(&self, donation: &donations::Model) -> Result<InvoiceOutcome> {
        let Some(invoice_id) = donation.invoice_id.as_deref() else {
            return Ok(InvoiceOutcome::Unchanged);
        };
        let merchant_key = if donation.merchant_owned {
            let owner = self.campaign_owner(donation.campaign_id).await?;
            let key = owner.and_then(|o| o.xendit_secret_key).ok_or_else(|| {
                Error::InvalidState(format!(
                    "invoice {invoice_id} belongs to a Xendit account the owner has disconnected"
                ))
            })?;
            Some(key)
        } else {
            None
        };

        let invoice = self
            .gateway
            .get_invoice(merchant_key.as_deref(), invoice_id)
            .await?;
        if invoice.external_id != donation.external_id {
            return Err(Error::validation(format!(
                "invoice {invoice_id} reports external id {}",
                invoice.external_id
            )));
        }
        self.apply_invoice(donation, &invoice).await
    }

    async fn mark_paid(
        &self,
        donation: &donations::Model,
        invoice: &Invoice,
    ) -> Result<InvoiceOutcome> {
        let paid = invoice.amount_rupiah();
        if paid != Some(donation.amount) {
            warn!(
                donation_id = donation.id,
                expected = donation.amount,
                reported = %invoice.amount,
                "Paid amount mismatch"
            );
            return Err(Error::InvalidAmount(format!(
                "paid amount {} does not match donation amount {}",
                invoice.amount, donation.amount
            )));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let result = donations::Entity::update_many()
            .set(donations::ActiveModel {
                status: Set(DonationStatus::Paid),
                method: Set(invoice.channel().unwrap_or(METHOD_INVOICE).to_string()),
                invoice_id: Set(Some(invoice.id.clone())),
                paid_at: Set(Some(invoice.paid_at.unwrap_or(now))),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(donations::Column::Id.eq(donation.id))
            .filter(donations::Column::Status.eq(DonationStatus::Pending))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            debug!(donation_id = donation.id, "Already settled");
            return Ok(InvoiceOutcome::Unchanged);
        }

        // Bump collected before reading is_ended; see campaigns::end_and_credit.
        ledger::credit_campaign(&txn, donation.campaign_id, donation.amount).await?;
        let campaign = find_campaign(&txn, donation.campaign_id).await?;
        if campaign.is_ended {
            ledger::credit_owner(&txn, campaign.owner_id, donation.amount).await?;
        }
        txn.commit().await?;

        info!(
            donation_id = donation.id,
            campaign_id = campaign.id,
            amount = donation.amount,
            late = campaign.is_ended,
            "Donation paid"
        );
        Ok(InvoiceOutcome::Credited)
    }

    async fn mark_expired(&self, donation: &donations::Model) -> Result<InvoiceOutcome> {
        let result = donations::Entity::update_many()
            .set(donations::ActiveModel {
                status: Set(DonationStatus::Expired),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(donations::Column::Id.eq(donation.id))
            .filter(donations::Column::Status.eq(DonationStatus::Pending))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(InvoiceOutcome::Unchanged);
        }
        info!(donation_id = donation.id, "Donation expired");
        Ok(InvoiceOutcome::Expired)
    }

    async fn campaign_owner(&self, campaign_id: i32) -> Result<Option<users::Model>> {
        let found = campaigns::Entity::find_by_id(campaign_id)
            .find_also_related(users::Entity)
            .one(&self.db)
            .await?;
        Ok(found.and_then(|(_, owner)| owner))
    }
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<users::Model> {
    users::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", id))
}

fn donor_label(donation: &donations::Model, donor: Option<&users::Model>) -> String {
    match donor {
        Some(donor) if !donation.is_anonymous => donor.name.clone(),
        _ => ANONYMOUS_DONOR.to_string(),
    }
}
