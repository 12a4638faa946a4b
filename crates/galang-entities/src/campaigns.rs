use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub image_url: Option<String>,
    pub goal_amount: i64,
    /// Sum of paid donations. Never reset when the campaign ends.
    pub collected: i64,
    pub is_ended: bool,
    pub is_implemented: bool,
    pub deadline: Option<DateTimeUtc>,
    pub ended_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::donations::Entity")]
    Donations,
    #[sea_orm(has_many = "super::proofs::Entity")]
    Proofs,
    #[sea_orm(has_many = "super::withdrawals::Entity")]
    Withdrawals,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::donations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donations.def()
    }
}

impl Related<super::proofs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Proofs.def()
    }
}

impl Related<super::withdrawals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Percentage of the goal reached, capped at 100.
    pub fn progress_percent(&self) -> u8 {
        if self.goal_amount <= 0 {
            return 0;
        }
        let pct = (self.collected.max(0) as i128 * 100) / self.goal_amount as i128;
        pct.min(100) as u8
    }

    pub fn is_past_deadline(&self, now: DateTimeUtc) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }
}
