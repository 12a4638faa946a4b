use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "USER")]
    User,
    #[sea_orm(string_value = "CREATOR")]
    Creator,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

impl Role {
    /// Creators and admins may open campaigns and receive funds.
    pub fn can_create_campaigns(self) -> bool {
        matches!(self, Role::Creator | Role::Admin)
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending, // Invoice issued, waiting for the payer
    #[sea_orm(string_value = "PAID")]
    Paid, // Credited to the campaign
    #[sea_orm(string_value = "EXPIRED")]
    Expired, // Invoice lapsed without payment
    #[sea_orm(string_value = "FAILED")]
    Failed, // Invoice could not be created
}

impl DonationStatus {
    pub fn is_final(self) -> bool {
        !matches!(self, DonationStatus::Pending)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}
