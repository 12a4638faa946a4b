use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::DonationStatus;

/// Method recorded before the gateway reports how the payer paid.
pub const METHOD_INVOICE: &str = "INVOICE";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "donations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub campaign_id: i32,
    pub user_id: i32,
    pub amount: i64,
    pub method: String,
    pub status: DonationStatus,
    /// Our reference sent to the gateway; callbacks are matched on it.
    #[sea_orm(unique)]
    pub external_id: String,
    pub invoice_id: Option<String>,
    pub invoice_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub is_anonymous: bool,
    /// Invoice was issued on the campaign owner's own Xendit account rather than the platform's.
    #[serde(skip_serializing)]
    pub merchant_owned: bool,
    pub paid_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::campaigns::Entity",
        from = "Column::CampaignId",
        to = "super::campaigns::Column::Id",
        on_delete = "Cascade"
    )]
    Campaign,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::campaigns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
