use chrono::{DateTime, Utc};
use galang_entities::campaigns;
use sea_orm::{
    ActiveModelTrait as _, ActiveValue::Set, ColumnTrait as _, ConnectionTrait,
    DatabaseConnection, EntityTrait as _, IntoActiveModel as _, ModelTrait as _,
    PaginatorTrait as _, QueryFilter as _, QueryOrder as _, TransactionTrait as _,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{ledger, proofs::parse_image_url, Actor, Error, Page, PageRequest, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaign {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub goal_amount: i64,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

/// Fields to change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub goal_amount: Option<i64>,
    pub deadline: Option<DateTime<Utc>>,
}

impl CampaignPatch {
    fn touches_terms(&self) -> bool {
        self.goal_amount.is_some() || self.deadline.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignFilter {
    pub owner_id: Option<i32>,
    pub ended: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl CampaignFilter {
    fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        )
    }
}

#[derive(Clone)]
pub struct Campaigns {
    db: DatabaseConnection,
}

impl Campaigns {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, actor: &Actor, new: NewCampaign) -> Result<campaigns::Model> {
        actor.require_creator()?;

        let now = Utc::now();
        let title = validate_title(&new.title)?;
        validate_goal(new.goal_amount)?;
        if let Some(deadline) = new.deadline {
            validate_deadline(deadline, now)?;
        }
        let image_url = new.image_url.as_deref().map(parse_image_url).transpose()?;

        let campaign = campaigns::ActiveModel {
            owner_id: Set(actor.user_id),
            title: Set(title),
            description: Set(new.description.trim().to_string()),
            image_url: Set(image_url),
            goal_amount: Set(new.goal_amount),
            collected: Set(0),
            is_ended: Set(false),
            is_implemented: Set(false),
            deadline: Set(new.deadline),
            ended_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(
            campaign_id = campaign.id,
            owner_id = campaign.owner_id,
            goal = campaign.goal_amount,
            "Created campaign"
        );
        Ok(campaign)
    }

    /// Newest first.
    pub async fn list(&self, filter: &CampaignFilter) -> Result<Page<campaigns::Model>> {
        let mut query = campaigns::Entity::find().order_by_desc(campaigns::Column::Id);
        if let Some(owner_id) = filter.owner_id {
            query = query.filter(campaigns::Column::OwnerId.eq(owner_id));
        }
        if let Some(ended) = filter.ended {
            query = query.filter(campaigns::Column::IsEnded.eq(ended));
        }

        let page = filter.page_request();
        let paginator = query.paginate(&self.db, page.size());
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;

        Ok(Page {
            items,
            page: page.index() + 1,
            per_page: page.size(),
            total,
        })
    }

    pub async fn get(&self, id: i32) -> Result<campaigns::Model> {
        find(&self.db, id).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: i32,
        patch: CampaignPatch,
    ) -> Result<campaigns::Model> {
        let campaign = self.get(id).await?;
        actor.require_owner_or_admin(campaign.owner_id)?;
        if campaign.is_ended && patch.touches_terms() {
            return Err(Error::AlreadyEnded(id));
        }

        let now = Utc::now();
        let mut active = campaign.into_active_model();
        if let Some(title) = &patch.title {
            active.title = Set(validate_title(title)?);
        }
        if let Some(description) = &patch.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(image_url) = &patch.image_url {
            active.image_url = Set(Some(parse_image_url(image_url)?));
        }
        if let Some(goal_amount) = patch.goal_amount {
            validate_goal(goal_amount)?;
            active.goal_amount = Set(goal_amount);
        }
        if let Some(deadline) = patch.deadline {
            validate_deadline(deadline, now)?;
            active.deadline = Set(Some(deadline));
        }
        active.updated_at = Set(now);

        Ok(active.update(&self.db).await?)
    }

    /// Campaigns that have taken money stay on record.
    pub async fn delete(&self, actor: &Actor, id: i32) -> Result<()> {
        let campaign = self.get(id).await?;
        actor.require_owner_or_admin(campaign.owner_id)?;
        if campaign.collected > 0 {
            return Err(Error::Conflict(format!(
                "campaign {id} has received donations and cannot be deleted"
            )));
        }

        campaign.delete(&self.db).await?;
        info!(campaign_id = id, by = actor.user_id, "Deleted campaign");
        Ok(())
    }

    /// End the campaign and move what it collected to the owner's balance.
    pub async fn end(&self, actor: &Actor, id: i32) -> Result<campaigns::Model> {
        let campaign = self.get(id).await?;
        actor.require_owner_or_admin(campaign.owner_id)?;

        let txn = self.db.begin().await?;
        let ended = end_and_credit(&txn, id, Utc::now()).await?;
        txn.commit().await?;

        info!(
            campaign_id = id,
            owner_id = ended.owner_id,
            credited = ended.collected,
            by = actor.user_id,
            "Ended campaign"
        );
        Ok(ended)
    }

    /// End every open campaign whose deadline has passed. Returns the ids ended.
    pub async fn end_expired(&self, now: DateTime<Utc>) -> Result<Vec<i32>> {
        // Deadlines are compared here, not in SQL: SQLite keeps timestamps as text.
        let due: Vec<i32> = campaigns::Entity::find()
            .filter(campaigns::Column::IsEnded.eq(false))
            .filter(campaigns::Column::Deadline.is_not_null())
            .all(&self.db)
            .await?
            .into_iter()
            .filter(|campaign| campaign.is_past_deadline(now))
            .map(|campaign| campaign.id)
            .collect();

        let mut ended = Vec::with_capacity(due.len());
        for id in due {
            let txn = self.db.begin().await?;
            match end_and_credit(&txn, id, now).await {
                Ok(campaign) => {
                    txn.commit().await?;
                    info!(
                        campaign_id = id,
                        credited = campaign.collected,
                        "Deadline passed, campaign ended"
                    );
                    ended.push(id);
                }
                Err(Error::AlreadyEnded(_)) => {
                    txn.rollback().await?;
                }
                Err(err) => {
                    txn.rollback().await?;
                    warn!(campaign_id = id, error = %err, "Failed to end expired campaign");
                }
            }
        }
        Ok(ended)
    }

    pub async fn mark_implemented(&self, actor: &Actor, id: i32) -> Result<campaigns::Model> {
        let campaign = self.get(id).await?;
        actor.require_owner_or_admin(campaign.owner_id)?;
        if !campaign.is_ended {
            return Err(Error::InvalidState(format!(
                "campaign {id} must end before it is marked implemented"
            )));
        }
        if campaign.is_implemented {
            return Ok(campaign);
        }

        let mut active = campaign.into_active_model();
        active.is_implemented = Set(true);
        active.updated_at = Set(Utc::now());
        let campaign = active.update(&self.db).await?;

        info!(campaign_id = id, "Campaign marked implemented");
        Ok(campaign)
    }
}

pub(crate) async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<campaigns::Model> {
    campaigns::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Campaign", id))
}

/// Close the campaign, then credit whatever it holds once closed.
///
/// `collected` is read after the close so a payment racing the close is
/// counted either here or by the payment itself, never both.
async fn end_and_credit<C: ConnectionTrait>(
    db: &C,
    id: i32,
    now: DateTime<Utc>,
) -> Result<campaigns::Model> {
    if !ledger::close_campaign(db, id, now).await? {
        // Distinguish a missing campaign from an ended one
        find(db, id).await?;
        return Err(Error::AlreadyEnded(id));
    }

    let campaign = find(db, id).await?;
    ledger::credit_owner(db, campaign.owner_id, campaign.collected).await?;
    Ok(campaign)
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::validation("title is required"));
    }
    Ok(title.to_string())
}

fn validate_goal(goal_amount: i64) -> Result<()> {
    if goal_amount <= 0 {
        return Err(Error::InvalidAmount(format!(
            "goal amount must be positive, got {goal_amount}"
        )));
    }
    Ok(())
}

fn validate_deadline(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if deadline <= now {
        return Err(Error::validation("deadline must be in the future"));
    }
    Ok(())
}
