/*!
# Galang Core

Domain services for the Galang donation platform. Each service wraps a pooled
`DatabaseConnection`; [`Platform`] bundles them for the server.

All balance mutations live in [`ledger`]. The accounting it maintains:

- `campaign.collected` = sum of the campaign's `PAID` donations
- `user.current_funds` = `PAID` donations to the user's ended campaigns, less `APPROVED` withdrawals
- `user.withdrawable_funds` = `current_funds` less `PENDING` withdrawals
*/

mod accounts;
mod actor;
mod campaigns;
mod database;
mod donations;
mod error;
mod funds;
mod pagination;
mod password;
mod proofs;
mod reports;
mod settings;

pub mod ledger;

#[cfg(test)]
mod testing;

pub use accounts::{Accounts, LoginSession, Registration, XenditKeys, MIN_PASSWORD_LEN};
pub use actor::Actor;
pub use campaigns::{CampaignFilter, CampaignPatch, Campaigns, NewCampaign};
pub use database::{connect, migrate, new_scratch_db};
pub use donations::{
    Donations, InvoiceOutcome, NewDonation, PollReport, PublicDonation, ANONYMOUS_DONOR,
};
pub use error::{Error, Result};
pub use funds::{Balances, Funds, FundsSummary, NewWithdrawal, Recomputed};
pub use pagination::{Page, PageRequest};
pub use proofs::{NewProof, Proofs};
pub use reports::{PlatformStats, Reports};
pub use settings::Settings;

pub use galang_entities as entities;

use galang_xendit::PaymentGateway;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Every service, sharing one connection pool and gateway.
#[derive(Clone)]
pub struct Platform {
    pub accounts: Accounts,
    pub campaigns: Campaigns,
    pub donations: Donations,
    pub funds: Funds,
    pub proofs: Proofs,
    pub reports: Reports,
}

impl Platform {
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn PaymentGateway>,
        settings: Settings,
    ) -> Self {
        let settings = Arc::new(settings);
        Self {
            accounts: Accounts::new(db.clone(), settings.clone()),
            campaigns: Campaigns::new(db.clone()),
            donations: Donations::new(db.clone(), gateway, settings),
            funds: Funds::new(db.clone()),
            proofs: Proofs::new(db.clone()),
            reports: Reports::new(db),
        }
    }
}
